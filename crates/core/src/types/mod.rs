//! Core types for Meridian.
//!
//! Type-safe wrappers for the domain concepts shared between the API binary
//! and the CLI tools.

pub mod category;
pub mod email;
pub mod id;
pub mod offer;
pub mod sex;

pub use category::Category;
pub use email::{Email, EmailError};
pub use id::*;
pub use offer::{SpecialOffer, SpecialOfferError};
pub use sex::Sex;
