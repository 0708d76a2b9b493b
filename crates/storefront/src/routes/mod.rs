//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness
//! GET  /health/ready                 - Readiness (database)
//! GET  /sitemap.xml                  - Sitemap
//!
//! # Catalog
//! GET  /api/categories               - All categories
//! GET  /api/categories/{slug}        - Category with its active products
//! GET  /api/products?category=       - Active products
//! GET  /api/products/{slug}          - Product detail
//! GET  /api/deals                    - Live deals (no coupon codes)
//!
//! # Checkout (rate limited)
//! POST /api/checkout/session         - Start a checkout session
//! GET  /api/checkout/session         - Session summary (bearer token)
//! POST /api/checkout/quote           - Quote with optional coupon (bearer token)
//! POST /api/coupons/validate         - Check a coupon code
//! POST /api/orders                   - Place a COD order (bearer token)
//! GET  /api/orders/{order_number}    - Track an order (?email=)
//! POST /api/payment/create-order     - Start a prepaid order (bearer token)
//! POST /api/payment/verify           - Verify the widget's payment signature
//! POST /api/payment/webhook          - Razorpay webhook
//! POST /api/payment/spin-reward      - Reward spin for a completed order
//! POST /api/leads                    - Contact form
//! ```

pub mod catalog;
pub mod checkout;
pub mod coupons;
pub mod leads;
pub mod orders;
pub mod payment;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{api_rate_limiter, checkout_rate_limiter};
use crate::state::AppState;

/// Catalog reads.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/categories", get(catalog::list_categories))
        .route("/categories/{slug}", get(catalog::show_category))
        .route("/products", get(catalog::list_products))
        .route("/products/{slug}", get(catalog::show_product))
        .route("/deals", get(catalog::list_deals))
        .route("/orders/{order_number}", get(orders::show))
        .layer(api_rate_limiter())
}

/// Checkout, payment and contact writes.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/checkout/session",
            post(checkout::start_session).get(checkout::show_session),
        )
        .route("/checkout/quote", post(checkout::quote))
        .route("/coupons/validate", post(coupons::validate))
        .route("/orders", post(orders::create_cod))
        .route("/payment/create-order", post(payment::create_order))
        .route("/payment/verify", post(payment::verify))
        .route("/payment/spin-reward", post(payment::spin_reward))
        .route("/leads", post(leads::create))
        .layer(checkout_rate_limiter())
}

/// Create all routes for the storefront.
///
/// The webhook sits outside the rate limiters: Razorpay retries from a
/// small set of addresses.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(catalog_routes())
        .merge(checkout_routes())
        .route("/payment/webhook", post(payment::webhook));

    Router::new()
        .route("/sitemap.xml", get(catalog::sitemap))
        .nest("/api", api)
}
