//! Purchase repository.
//!
//! Purchase records are append-only: created by checkout, read by the
//! history and reporting paths, and removed only by the product-deletion
//! cleanup pass in [`super::ProductRepository::delete`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use meridian_core::{Category, ProductId, PurchaseId, Sex, UserId};

use super::RepositoryError;
use crate::models::{NewPurchase, PurchaseRecord, ShippingAddress};
use crate::services::sales::SalesLineItem;

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: i32,
    user_id: i32,
    product_id: i32,
    quantity: i32,
    total_price: Decimal,
    purchase_date: DateTime<Utc>,
    order_number: Uuid,
    shipping_address: Json<ShippingAddress>,
}

impl From<PurchaseRow> for PurchaseRecord {
    fn from(row: PurchaseRow) -> Self {
        Self {
            id: PurchaseId::new(row.id),
            user_id: UserId::new(row.user_id),
            product: ProductId::new(row.product_id),
            quantity: row.quantity,
            total_price: row.total_price,
            purchase_date: row.purchase_date,
            order_number: row.order_number,
            shipping_address: row.shipping_address.0,
        }
    }
}

/// Repository for purchase database operations.
pub struct PurchaseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PurchaseRepository<'a> {
    /// Create a new purchase repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Append one purchase record to a user's history.
    ///
    /// The shipping address is stored as a JSONB snapshot, by value; later
    /// edits to the user's saved addresses never touch it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn append(
        &self,
        user_id: UserId,
        purchase: &NewPurchase,
    ) -> Result<PurchaseRecord, RepositoryError> {
        let row: PurchaseRow = sqlx::query_as(
            "INSERT INTO purchases \
             (user_id, product_id, quantity, total_price, purchase_date, order_number, shipping_address) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, user_id, product_id, quantity, total_price, purchase_date, \
                       order_number, shipping_address",
        )
        .bind(user_id.as_i32())
        .bind(purchase.product.as_i32())
        .bind(purchase.quantity)
        .bind(purchase.total_price)
        .bind(purchase.purchase_date)
        .bind(purchase.order_number)
        .bind(Json(&purchase.shipping_address))
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// A user's purchase history, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<PurchaseRecord>, RepositoryError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(
            "SELECT id, user_id, product_id, quantity, total_price, purchase_date, \
                    order_number, shipping_address \
             FROM purchases WHERE user_id = $1 \
             ORDER BY purchase_date DESC, id DESC",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(PurchaseRecord::from).collect())
    }

    /// All purchase line items joined against current products and buyers,
    /// for the sales aggregates.
    ///
    /// Inner join: products deleted after purchase fall out, understating
    /// historical volume for delisted products.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `DataCorruption` if a stored category or sex value is invalid.
    pub async fn sales_line_items(&self) -> Result<Vec<SalesLineItem>, RepositoryError> {
        let rows: Vec<(i32, String, String, i32, Option<String>)> = sqlx::query_as(
            "SELECT pr.product_id, p.name, p.category, pr.quantity, u.sex \
             FROM purchases pr \
             JOIN products p ON p.id = pr.product_id \
             JOIN users u ON u.id = pr.user_id",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|(product_id, name, category, quantity, sex)| {
                let category = Category::parse(&category).ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "unknown category in database: {category}"
                    ))
                })?;
                let buyer_sex = sex
                    .as_deref()
                    .map(|s| {
                        Sex::parse(s).ok_or_else(|| {
                            RepositoryError::DataCorruption(format!("invalid sex in database: {s}"))
                        })
                    })
                    .transpose()?;

                Ok(SalesLineItem {
                    product: ProductId::new(product_id),
                    name,
                    category,
                    quantity,
                    buyer_sex,
                })
            })
            .collect()
    }
}
