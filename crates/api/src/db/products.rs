//! Product repository for catalog and inventory operations.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};

use meridian_core::{Category, ProductId, SpecialOffer};

use super::RepositoryError;
use crate::models::{NewProduct, Product, ProductUpdate};

/// Database row for a product. Offer fields are flattened nullable columns.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    image: Option<String>,
    price: Decimal,
    inventory: i32,
    category: String,
    discount_percentage: Option<i16>,
    offer_start: Option<DateTime<Utc>>,
    offer_end: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let category = Category::parse(&row.category).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("unknown category in database: {}", row.category))
        })?;

        let special_offer = row
            .discount_percentage
            .map(|pct| SpecialOffer::new(pct, row.offer_start, row.offer_end))
            .transpose()
            .map_err(|e| RepositoryError::DataCorruption(format!("invalid offer in database: {e}")))?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            image: row.image,
            price: row.price,
            inventory: row.inventory,
            category,
            special_offer,
            created_at: row.created_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, name, description, image, price, inventory, category, \
                               discount_percentage, offer_start, offer_end, created_at";

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the full catalog, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails, or
    /// `DataCorruption` if a stored category or offer is invalid.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id"))
                .fetch_all(self.pool)
                .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row: Option<ProductRow> =
            sqlx::query_as(&format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"))
                .bind(id.as_i32())
                .fetch_optional(self.pool)
                .await?;

        row.map(Product::try_from).transpose()
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if a product with the same name
    /// exists, `Database` for other failures.
    pub async fn create(&self, new: &NewProduct) -> Result<Product, RepositoryError> {
        let offer = new.special_offer.as_ref();
        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products \
             (name, description, image, price, inventory, category, \
              discount_percentage, offer_start, offer_end) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.image)
        .bind(new.price)
        .bind(new.inventory)
        .bind(new.category)
        .bind(offer.map(|o| o.discount_percentage))
        .bind(offer.and_then(|o| o.offer_start))
        .bind(offer.and_then(|o| o.offer_end))
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                return RepositoryError::Conflict("product name already exists".to_owned());
            }
            RepositoryError::Database(e)
        })?;

        Product::try_from(row)
    }

    /// Replace the mutable fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product doesn't exist.
    pub async fn update(
        &self,
        id: ProductId,
        update: &ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let offer = update.special_offer.as_ref();
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products \
             SET name = $2, description = $3, image = $4, price = $5, inventory = $6, \
                 category = $7, discount_percentage = $8, offer_start = $9, offer_end = $10 \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.image)
        .bind(update.price)
        .bind(update.inventory)
        .bind(update.category)
        .bind(offer.map(|o| o.discount_percentage))
        .bind(offer.and_then(|o| o.offer_start))
        .bind(offer.and_then(|o| o.offer_end))
        .fetch_optional(self.pool)
        .await?;

        row.map_or(Err(RepositoryError::NotFound), Product::try_from)
    }

    /// Delete a product and strip every reference to it.
    ///
    /// Historical purchase records referencing the product are removed (the
    /// one exception to the append-only purchase history), as are any cart
    /// lines still pointing at it.
    ///
    /// # Returns
    ///
    /// `true` if the product existed and was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM purchases WHERE product_id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM cart_lines WHERE product_id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }

    /// Atomically reserve stock: decrement inventory by `quantity` only if
    /// enough is available.
    ///
    /// The condition and the decrement are a single statement, so concurrent
    /// checkouts cannot both pass the stock check and over-sell. A no-op
    /// update is the out-of-stock signal.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn try_reserve_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET inventory = inventory - $2 \
             WHERE id = $1 AND inventory >= $2",
        )
        .bind(id.as_i32())
        .bind(quantity)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Of the given IDs, return the subset that exists in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn existing_ids(
        &self,
        ids: &[ProductId],
    ) -> Result<HashSet<ProductId>, RepositoryError> {
        let raw: Vec<i32> = ids.iter().map(ProductId::as_i32).collect();
        let rows: Vec<(i32,)> = sqlx::query_as("SELECT id FROM products WHERE id = ANY($1)")
            .bind(&raw)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| ProductId::new(id)).collect())
    }
}
