//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                  - Liveness check
//! GET    /health/ready            - Readiness check (verifies database)
//!
//! # Catalog (public)
//! GET    /products                - Product listing (cached)
//! GET    /products/{id}           - Product detail
//! GET    /branches                - Pickup locations
//!
//! # Cart (requires auth)
//! GET    /cart                    - Current cart, joined against catalog
//! POST   /cart                    - Replace cart (invalid lines dropped)
//!
//! # Checkout (requires auth)
//! POST   /purchase                - Convert cart to purchase history
//! GET    /purchase-history        - Purchase records, newest first
//!
//! # Saved addresses (requires auth)
//! GET    /addresses               - List saved addresses
//! POST   /addresses               - Save a new address
//! PUT    /addresses/{id}          - Replace a saved address
//! DELETE /addresses/{id}          - Remove a saved address
//!
//! # Admin (requires admin auth)
//! POST   /admin/products          - Create product
//! PUT    /admin/products/{id}     - Update product
//! DELETE /admin/products/{id}     - Delete product (and its references)
//! POST   /admin/branches          - Create branch
//! DELETE /admin/branches/{id}     - Delete branch
//! GET    /admin/sales-stats       - Sales aggregates
//! ```

pub mod addresses;
pub mod admin;
pub mod branches;
pub mod cart;
pub mod checkout;
pub mod products;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the public catalog router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{id}", get(products::show))
        .route("/branches", get(branches::index))
}

/// Create the authenticated storefront router.
pub fn storefront_routes() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart::show).post(cart::replace))
        .route("/purchase", post(checkout::purchase))
        .route("/purchase-history", get(checkout::history))
        .route("/addresses", get(addresses::index).post(addresses::create))
        .route(
            "/addresses/{id}",
            put(addresses::update).delete(addresses::delete),
        )
}

/// Create the admin router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/products", post(admin::create_product))
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/branches", post(admin::create_branch))
        .route("/branches/{id}", delete(admin::delete_branch))
        .route("/sales-stats", get(admin::sales_stats))
}

/// Build the complete application router (health endpoints excluded).
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .merge(storefront_routes())
        .nest("/admin", admin_routes())
}
