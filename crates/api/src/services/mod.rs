//! Business services.
//!
//! - [`checkout`] - the cart-to-purchase transition
//! - [`cart`] - sanitizing client-submitted carts
//! - [`sales`] - read-only sales aggregates for the admin dashboard
//! - [`notify`] - receipt email delivery (fire-and-forget)

pub mod cart;
pub mod checkout;
pub mod notify;
pub mod sales;
