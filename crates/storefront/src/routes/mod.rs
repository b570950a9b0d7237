//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page
//! GET  /health                 - Health check
//!
//! # Catalog
//! GET  /collections            - Catalog browsing with filters
//! GET  /products/{slug}        - Product detail
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/update            - Update quantity (returns cart_items fragment)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! GET  /cart/checkout          - Enter checkout (redirects back if empty)
//!
//! # Checkout
//! GET  /checkout               - Current step of the flow
//! POST /checkout/shipping      - Shipping option + address, then advance
//! POST /checkout/payment       - Payment method + email, then advance
//! POST /checkout/addons        - Update packaging/insurance/gift message
//! POST /checkout/back          - Step back
//! POST /checkout/submit        - Submit the order
//! ```

pub mod cart;
pub mod checkout;
pub mod collections;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new().route("/{slug}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/checkout", get(cart::begin_checkout))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/shipping", post(checkout::shipping))
        .route("/payment", post(checkout::payment))
        .route("/addons", post(checkout::add_ons))
        .route("/back", post(checkout::back))
        .route("/submit", post(checkout::submit_order))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        // Catalog
        .route("/collections", get(collections::index))
        .nest("/products", product_routes())
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout flow
        .nest("/checkout", checkout_routes())
}
