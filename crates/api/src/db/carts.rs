//! Cart repository.
//!
//! A user owns at most one cart, stored as `cart_lines` rows. The cart is
//! always replaced wholesale; there is no per-line mutation.

use sqlx::PgPool;

use meridian_core::{ProductId, UserId};

use super::RepositoryError;
use crate::models::{CartLine, ResolvedCartLine};

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the user's cart lines in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines(&self, user_id: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows: Vec<(i32, i32)> = sqlx::query_as(
            "SELECT product_id, quantity FROM cart_lines WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, quantity)| CartLine {
                product: ProductId::new(product_id),
                quantity,
            })
            .collect())
    }

    /// Fetch the user's cart joined against the current catalog.
    ///
    /// Lines whose product has since been deleted fall out of the join.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn resolved(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ResolvedCartLine>, RepositoryError> {
        let rows: Vec<(i32, String, rust_decimal::Decimal, i32, i32)> = sqlx::query_as(
            "SELECT c.product_id, p.name, p.price, p.inventory, c.quantity \
             FROM cart_lines c \
             JOIN products p ON p.id = c.product_id \
             WHERE c.user_id = $1 \
             ORDER BY c.id",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(product_id, name, price, inventory, quantity)| ResolvedCartLine {
                product: ProductId::new(product_id),
                name,
                price,
                inventory,
                quantity,
            })
            .collect())
    }

    /// Replace the user's entire cart with `lines` (no merge).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// replacement is transactional.
    pub async fn replace(
        &self,
        user_id: UserId,
        lines: &[CartLine],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(&mut *tx)
            .await?;

        for line in lines {
            sqlx::query("INSERT INTO cart_lines (user_id, product_id, quantity) VALUES ($1, $2, $3)")
                .bind(user_id.as_i32())
                .bind(line.product.as_i32())
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Delete every line in the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, user_id: UserId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_lines WHERE user_id = $1")
            .bind(user_id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
