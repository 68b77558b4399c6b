//! Branch (pickup location) domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use meridian_core::BranchId;

/// A physical branch customers can pick orders up from.
#[derive(Debug, Clone, Serialize)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub city: String,
    pub street: String,
    pub created_at: DateTime<Utc>,
}
