//! Checkout and purchase-history routes.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::db::PurchaseRepository;
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{PurchaseRecord, ShippingAddress};
use crate::services::checkout::{CheckoutProcessor, PgCheckoutStore};
use crate::services::notify::spawn_receipt;
use crate::state::AppState;

/// Checkout request body.
#[derive(Debug, Deserialize)]
pub struct PurchaseRequest {
    pub shipping_address: ShippingAddress,
}

/// `POST /purchase` - convert the caller's cart into purchase history.
///
/// Out-of-stock lines are skipped and reported in the message; the request
/// still succeeds as long as the cart was non-empty. The receipt email is
/// dispatched in the background and never delays the response.
#[tracing::instrument(skip_all)]
pub async fn purchase(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(request): Json<PurchaseRequest>,
) -> Result<Json<Value>> {
    let processor = CheckoutProcessor::new(PgCheckoutStore::new(state.pool().clone()));
    let outcome = processor.checkout(user.id, &request.shipping_address).await?;
    let message = outcome.message();

    spawn_receipt(
        state.mailer(),
        user.email.to_string(),
        outcome.receipt,
        outcome.order_total,
    );

    // The response carries the caller's full history, newest first, with
    // the just-created records at the front.
    let history = PurchaseRepository::new(state.pool()).history(user.id).await?;

    Ok(Json(json!({
        "success": true,
        "message": message,
        "order_total": outcome.order_total,
        "purchases": history,
    })))
}

/// `GET /purchase-history` - the caller's purchase records, newest first.
pub async fn history(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<PurchaseRecord>>> {
    let history = PurchaseRepository::new(state.pool()).history(user.id).await?;
    Ok(Json(history))
}
