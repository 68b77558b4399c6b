//! Domain types.
//!
//! These types represent validated domain objects separate from database row
//! types; the repositories in [`crate::db`] convert rows into them.

pub mod branch;
pub mod product;
pub mod user;

pub use branch::Branch;
pub use product::{NewProduct, Product, ProductUpdate};
pub use user::{
    Address, CartLine, NewPurchase, PurchaseRecord, ResolvedCartLine, ShippingAddress, User,
};
