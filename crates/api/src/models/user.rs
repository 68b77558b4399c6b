//! User, cart, and purchase domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use meridian_core::{AddressId, Email, ProductId, PurchaseId, Sex, UserId};

/// A storefront user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address; receipts go here.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Self-reported sex, used only by sales reporting.
    pub sex: Option<Sex>,
    /// Whether the user may call the admin surface.
    pub is_admin: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

/// One entry in a user's persistent cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CartLine {
    /// The referenced product.
    pub product: ProductId,
    /// Positive quantity.
    pub quantity: i32,
}

/// A cart line joined against the current catalog state.
///
/// Price and inventory are the snapshot the checkout decision is made from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCartLine {
    pub product: ProductId,
    pub name: String,
    pub price: Decimal,
    pub inventory: i32,
    pub quantity: i32,
}

/// A shipping destination, stored on purchase records by value.
///
/// Either a delivery address or a branch pickup. Not validated server-side;
/// stored as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub country: String,
    pub city: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    pub phone: String,
    /// Branch name when the order is picked up in-store instead of shipped.
    #[serde(default)]
    pub pickup_branch: Option<String>,
}

/// A saved address on a user's profile.
///
/// Distinct from [`ShippingAddress`]: editing a saved address never touches
/// the snapshots stored on past purchases.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

/// An immutable receipt line created at checkout time.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseRecord {
    pub id: PurchaseId,
    pub user_id: UserId,
    pub product: ProductId,
    pub quantity: i32,
    /// `quantity * unit price` at purchase time; never re-derived.
    pub total_price: Decimal,
    pub purchase_date: DateTime<Utc>,
    /// Unique per purchase line.
    pub order_number: Uuid,
    /// Snapshot copied by value at checkout.
    pub shipping_address: ShippingAddress,
}

/// A purchase record before it has been assigned a database ID.
#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub product: ProductId,
    pub quantity: i32,
    pub total_price: Decimal,
    pub purchase_date: DateTime<Utc>,
    pub order_number: Uuid,
    pub shipping_address: ShippingAddress,
}
