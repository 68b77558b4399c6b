//! Branch repository (pickup locations).

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use meridian_core::BranchId;

use super::RepositoryError;
use crate::models::Branch;

#[derive(Debug, FromRow)]
struct BranchRow {
    id: i32,
    name: String,
    city: String,
    street: String,
    created_at: DateTime<Utc>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Self {
            id: BranchId::new(row.id),
            name: row.name,
            city: row.city,
            street: row.street,
            created_at: row.created_at,
        }
    }
}

/// Repository for branch database operations.
pub struct BranchRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BranchRepository<'a> {
    /// Create a new branch repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all branches, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Branch>, RepositoryError> {
        let rows: Vec<BranchRow> =
            sqlx::query_as("SELECT id, name, city, street, created_at FROM branches ORDER BY id")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(Branch::from).collect())
    }

    /// Create a new branch.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the branch name already exists.
    pub async fn create(
        &self,
        name: &str,
        city: &str,
        street: &str,
    ) -> Result<Branch, RepositoryError> {
        let row: BranchRow = sqlx::query_as(
            "INSERT INTO branches (name, city, street) VALUES ($1, $2, $3) \
             RETURNING id, name, city, street, created_at",
        )
        .bind(name)
        .bind(city)
        .bind(street)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("branch name already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Ok(row.into())
    }

    /// Delete a branch.
    ///
    /// # Returns
    ///
    /// `true` if the branch was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: BranchId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM branches WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
