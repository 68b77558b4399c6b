//! Saved-address routes.

use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use meridian_core::AddressId;

use crate::db::AddressRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireUser;
use crate::models::{Address, ShippingAddress};
use crate::state::AppState;

/// `GET /addresses` - the caller's saved addresses.
pub async fn index(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Address>>> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(addresses))
}

/// `POST /addresses` - save a new address.
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(address): Json<ShippingAddress>,
) -> Result<Json<Address>> {
    let saved = AddressRepository::new(state.pool())
        .create(user.id, &address)
        .await?;
    Ok(Json(saved))
}

/// `PUT /addresses/{id}` - replace a saved address.
pub async fn update(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i32>,
    Json(address): Json<ShippingAddress>,
) -> Result<Json<Address>> {
    let id = AddressId::new(id);
    let saved = AddressRepository::new(state.pool())
        .update(user.id, id, &address)
        .await?;
    Ok(Json(saved))
}

/// `DELETE /addresses/{id}` - remove a saved address.
pub async fn delete(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let id = AddressId::new(id);
    let deleted = AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;
    if !deleted {
        return Err(AppError::NotFound(format!("address {id}")));
    }

    Ok(Json(json!({ "success": true, "message": "Address deleted" })))
}
