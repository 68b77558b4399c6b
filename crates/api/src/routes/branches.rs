//! Public branch (pickup location) routes.

use axum::{Json, extract::State};

use crate::db::BranchRepository;
use crate::error::Result;
use crate::models::Branch;
use crate::state::AppState;

/// `GET /branches` - all pickup locations.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<Branch>>> {
    let branches = BranchRepository::new(state.pool()).list().await?;
    Ok(Json(branches))
}
