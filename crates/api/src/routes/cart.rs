//! Cart routes.
//!
//! The cart is replaced wholesale on every `POST /cart`; invalid lines are
//! dropped silently rather than failing the request.

use axum::{Json, extract::State};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{Value, json};

use meridian_core::ProductId;

use crate::db::{CartRepository, ProductRepository};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::ResolvedCartLine;
use crate::services::cart::{CartLineInput, sanitize_cart};
use crate::state::AppState;

/// One cart line joined against the current catalog, for display.
///
/// `inventory` is a stock hint for the client; the checkout makes its own
/// reservation decision.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product: ProductId,
    pub name: String,
    pub price: Decimal,
    pub inventory: i32,
    pub quantity: i32,
}

impl From<ResolvedCartLine> for CartLineView {
    fn from(line: ResolvedCartLine) -> Self {
        Self {
            product: line.product,
            name: line.name,
            price: line.price,
            inventory: line.inventory,
            quantity: line.quantity,
        }
    }
}

/// `GET /cart` - the caller's cart joined against the current catalog.
pub async fn show(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<CartLineView>>> {
    let lines = CartRepository::new(state.pool()).resolved(user.id).await?;
    Ok(Json(lines.into_iter().map(CartLineView::from).collect()))
}

/// `POST /cart` - replace the caller's cart.
///
/// Lines referencing unknown products, with malformed product references,
/// or with non-positive quantities are dropped without error; the response
/// reports how many survived.
#[tracing::instrument(skip_all)]
pub async fn replace(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(lines): Json<Vec<CartLineInput>>,
) -> Result<Json<Value>> {
    let referenced: Vec<ProductId> = lines.iter().filter_map(|l| l.product.id()).collect();
    let catalog = ProductRepository::new(state.pool())
        .existing_ids(&referenced)
        .await?;

    let (valid, dropped) = sanitize_cart(lines, &catalog);
    if dropped > 0 {
        tracing::debug!(user_id = %user.id, dropped, "Dropped invalid cart lines");
    }

    CartRepository::new(state.pool())
        .replace(user.id, &valid)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Cart updated",
        "saved": valid.len(),
        "dropped": dropped,
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_line_view_carries_stock_hint() {
        let view = CartLineView::from(ResolvedCartLine {
            product: ProductId::new(1),
            name: "Fieldmaster 38".to_string(),
            price: Decimal::from(249),
            inventory: 4,
            quantity: 2,
        });

        assert_eq!(view.inventory, 4);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["inventory"], 4);
        assert_eq!(json["quantity"], 2);
    }
}
