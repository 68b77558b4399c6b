//! Saved-address repository.
//!
//! Saved addresses are a convenience for the checkout form. They are wholly
//! separate from the snapshots stored on purchase records.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use meridian_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, ShippingAddress};

#[derive(Debug, FromRow)]
struct AddressRow {
    id: i32,
    user_id: i32,
    country: String,
    city: String,
    street: Option<String>,
    postal_code: Option<String>,
    phone: String,
    pickup_branch: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: AddressId::new(row.id),
            user_id: UserId::new(row.user_id),
            address: ShippingAddress {
                country: row.country,
                city: row.city,
                street: row.street,
                postal_code: row.postal_code,
                phone: row.phone,
                pickup_branch: row.pickup_branch,
            },
            created_at: row.created_at,
        }
    }
}

const ADDRESS_COLUMNS: &str =
    "id, user_id, country, city, street, postal_code, phone, pickup_branch, created_at";

/// Repository for saved-address database operations.
pub struct AddressRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> AddressRepository<'a> {
    /// Create a new address repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List a user's saved addresses, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Address>, RepositoryError> {
        let rows: Vec<AddressRow> = sqlx::query_as(&format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 ORDER BY id"
        ))
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Address::from).collect())
    }

    /// Save a new address for a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        address: &ShippingAddress,
    ) -> Result<Address, RepositoryError> {
        let row: AddressRow = sqlx::query_as(&format!(
            "INSERT INTO addresses \
             (user_id, country, city, street, postal_code, phone, pickup_branch) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(&address.country)
        .bind(&address.city)
        .bind(&address.street)
        .bind(&address.postal_code)
        .bind(&address.phone)
        .bind(&address.pickup_branch)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Replace a saved address. Scoped to the owning user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address doesn't exist or
    /// belongs to another user.
    pub async fn update(
        &self,
        user_id: UserId,
        id: AddressId,
        address: &ShippingAddress,
    ) -> Result<Address, RepositoryError> {
        let row: Option<AddressRow> = sqlx::query_as(&format!(
            "UPDATE addresses \
             SET country = $3, city = $4, street = $5, postal_code = $6, phone = $7, \
                 pickup_branch = $8 \
             WHERE id = $2 AND user_id = $1 \
             RETURNING {ADDRESS_COLUMNS}"
        ))
        .bind(user_id.as_i32())
        .bind(id.as_i32())
        .bind(&address.country)
        .bind(&address.city)
        .bind(&address.street)
        .bind(&address.postal_code)
        .bind(&address.phone)
        .bind(&address.pickup_branch)
        .fetch_optional(self.pool)
        .await?;

        row.map(Address::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a saved address. Scoped to the owning user.
    ///
    /// # Returns
    ///
    /// `true` if the address was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user_id: UserId, id: AddressId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM addresses WHERE id = $2 AND user_id = $1")
            .bind(user_id.as_i32())
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
