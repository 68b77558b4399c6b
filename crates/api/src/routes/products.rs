//! Public catalog routes.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use meridian_core::ProductId;

use crate::db::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;

/// A product as the storefront sees it: the stored fields plus the price
/// with any active offer applied.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub effective_price: Decimal,
}

impl ProductView {
    fn at(product: Product, now: DateTime<Utc>) -> Self {
        let effective_price = product.effective_price(now);
        Self {
            product,
            effective_price,
        }
    }
}

/// `GET /products` - the full catalog.
///
/// Served from the in-memory cache when warm; offer pricing is applied per
/// request so a cached listing still shows current discounts.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ProductView>>> {
    let products = match state.cached_catalog().await {
        Some(products) => products,
        None => {
            let products = Arc::new(ProductRepository::new(state.pool()).list().await?);
            state.cache_catalog(Arc::clone(&products)).await;
            products
        }
    };

    let now = Utc::now();
    Ok(Json(
        products
            .iter()
            .map(|p| ProductView::at(p.clone(), now))
            .collect(),
    ))
}

/// `GET /products/{id}` - one product.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductView>> {
    let id = ProductId::new(id);
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))?;

    Ok(Json(ProductView::at(product, Utc::now())))
}
