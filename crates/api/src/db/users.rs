//! User repository: account lookup and bearer-token resolution.
//!
//! Token *issuance* happens out-of-band (the auth service is a separate
//! system); this repository only resolves presented tokens.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use meridian_core::{Email, Sex, UserId};

use super::RepositoryError;
use crate::models::User;

#[derive(Debug, FromRow)]
struct UserRow {
    id: i32,
    email: String,
    name: String,
    sex: Option<String>,
    is_admin: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let sex = row
            .sex
            .as_deref()
            .map(|s| {
                Sex::parse(s).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!("invalid sex in database: {s}"))
                })
            })
            .transpose()?;

        Ok(Self {
            id: UserId::new(row.id),
            email,
            name: row.name,
            sex,
            is_admin: row.is_admin,
            created_at: row.created_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `DataCorruption` if stored user data is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, email, name, sex, is_admin, created_at FROM users WHERE id = $1",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Resolve a bearer token to the user it belongs to.
    ///
    /// Expired tokens resolve to `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT u.id, u.email, u.name, u.sex, u.is_admin, u.created_at \
             FROM users u \
             JOIN auth_tokens t ON t.user_id = u.id \
             WHERE t.token = $1 AND (t.expires_at IS NULL OR t.expires_at > now())",
        )
        .bind(token)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Create a new user. Used by the seeding tooling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    pub async fn create(
        &self,
        email: &Email,
        name: &str,
        sex: Option<Sex>,
        is_admin: bool,
    ) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(
            "INSERT INTO users (email, name, sex, is_admin) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, email, name, sex, is_admin, created_at",
        )
        .bind(email.as_str())
        .bind(name)
        .bind(sex.map(|s| s.as_str()))
        .bind(is_admin)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("email already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        User::try_from(row)
    }

    /// Store a bearer token for a user. Used by the seeding tooling.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the token already exists.
    pub async fn insert_token(
        &self,
        user_id: UserId,
        token: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO auth_tokens (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(token)
            .bind(user_id.as_i32())
            .bind(expires_at)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    return RepositoryError::Conflict("token already exists".to_owned());
                }
                RepositoryError::Database(e)
            })?;

        Ok(())
    }
}
