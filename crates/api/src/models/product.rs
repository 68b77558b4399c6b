//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use meridian_core::{Category, ProductId, SpecialOffer};

/// A catalog product (domain type).
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description.
    pub description: String,
    /// Image URL, if one has been uploaded.
    pub image: Option<String>,
    /// Unit price. Never negative.
    pub price: Decimal,
    /// Units in stock. Never negative.
    pub inventory: i32,
    /// One of the four fixed categories.
    pub category: Category,
    /// Optional time-bounded discount.
    pub special_offer: Option<SpecialOffer>,
    /// When the product was created.
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// The unit price with any active offer applied at `now`.
    ///
    /// Falls back to the base price when no offer is active. Checkout uses
    /// the base price; this is display pricing for the catalog.
    #[must_use]
    pub fn effective_price(&self, now: DateTime<Utc>) -> Decimal {
        self.special_offer
            .as_ref()
            .and_then(|offer| offer.discounted_price(self.price, now))
            .unwrap_or(self.price)
    }
}

/// Payload for creating a product.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub inventory: i32,
    pub category: Category,
    pub special_offer: Option<SpecialOffer>,
}

/// Payload for updating a product. Full replacement of the mutable fields.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    pub image: Option<String>,
    pub price: Decimal,
    pub inventory: i32,
    pub category: Category,
    pub special_offer: Option<SpecialOffer>,
}
