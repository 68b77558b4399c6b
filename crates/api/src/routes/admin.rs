//! Admin routes: catalog management, branches, and sales reporting.
//!
//! Every handler here requires an authenticated admin. Catalog writes
//! invalidate the product listing cache.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Serialize;
use serde_json::{Value, json};

use meridian_core::{BranchId, ProductId};

use crate::db::{BranchRepository, ProductRepository, PurchaseRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{Branch, NewProduct, Product, ProductUpdate};
use crate::services::sales::{
    CategorySales, ProductSales, SexSales, sales_by_category, sales_by_sex, top_sold,
};
use crate::state::AppState;

/// `POST /admin/products` - add a product to the catalog.
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(new): Json<NewProduct>,
) -> Result<Json<Product>> {
    if new.price.is_sign_negative() || new.inventory < 0 {
        return Err(AppError::BadRequest(
            "price and inventory must be non-negative".to_string(),
        ));
    }

    let product = ProductRepository::new(state.pool()).create(&new).await?;
    state.invalidate_catalog().await;

    tracing::info!(product = %product.id, name = %product.name, "Product created");
    Ok(Json(product))
}

/// `PUT /admin/products/{id}` - replace a product's mutable fields.
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    if update.price.is_sign_negative() || update.inventory < 0 {
        return Err(AppError::BadRequest(
            "price and inventory must be non-negative".to_string(),
        ));
    }

    let id = ProductId::new(id);
    let product = ProductRepository::new(state.pool()).update(id, &update).await?;
    state.invalidate_catalog().await;

    Ok(Json(product))
}

/// `DELETE /admin/products/{id}` - delist a product.
///
/// Also removes the product's cart lines and purchase records, so the sales
/// aggregates stop counting it.
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let id = ProductId::new(id);
    let deleted = ProductRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("product {id}")));
    }
    state.invalidate_catalog().await;

    tracing::info!(product = %id, "Product deleted");
    Ok(Json(json!({ "success": true, "message": "Product deleted" })))
}

/// `POST /admin/branches` - add a pickup location.
pub async fn create_branch(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(new): Json<NewBranch>,
) -> Result<Json<Branch>> {
    let branch = BranchRepository::new(state.pool())
        .create(&new.name, &new.city, &new.street)
        .await?;
    Ok(Json(branch))
}

/// Payload for creating a branch.
#[derive(Debug, serde::Deserialize)]
pub struct NewBranch {
    pub name: String,
    pub city: String,
    pub street: String,
}

/// `DELETE /admin/branches/{id}` - remove a pickup location.
pub async fn delete_branch(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<Value>> {
    let id = BranchId::new(id);
    let deleted = BranchRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound(format!("branch {id}")));
    }

    Ok(Json(json!({ "success": true, "message": "Branch deleted" })))
}

/// The three sales aggregates, computed together from one scan.
#[derive(Debug, Serialize)]
pub struct SalesStats {
    pub top_sold: Vec<ProductSales>,
    pub by_category: Vec<CategorySales>,
    pub by_sex: Vec<SexSales>,
}

/// `GET /admin/sales-stats` - read-only sales aggregates.
pub async fn sales_stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<SalesStats>> {
    let items = PurchaseRepository::new(state.pool())
        .sales_line_items()
        .await?;

    Ok(Json(SalesStats {
        top_sold: top_sold(&items),
        by_category: sales_by_category(&items),
        by_sex: sales_by_sex(&items),
    }))
}
