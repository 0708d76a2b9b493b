//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                      - Liveness
//! GET    /health/ready                - Readiness (database)
//!
//! # Staff accounts
//! POST   /api/users/login             - Exchange credentials for a token
//! GET    /api/users/me                - Current user
//! GET    /api/users                   - List users (admin)
//! POST   /api/users                   - Create user (admin)
//! DELETE /api/users/{id}              - Delete user (admin)
//!
//! # Catalog (writes need editor)
//! GET    /api/categories              - List with product counts
//! POST   /api/categories              - Create
//! GET    /api/categories/{id}         - Show
//! PUT    /api/categories/{id}         - Replace
//! DELETE /api/categories/{id}         - Delete (409 while products remain)
//! GET    /api/products?category_id=&q=
//! POST   /api/products
//! GET    /api/products/{id}
//! PUT    /api/products/{id}
//! DELETE /api/products/{id}
//!
//! # Orders
//! GET    /api/orders?status=&payment_status=&page=&per_page=
//! GET    /api/orders/{id}
//! PUT    /api/orders/{id}/status      - Editor
//! DELETE /api/orders/{id}             - Admin
//!
//! # Leads and deals
//! GET    /api/leads?status=
//! GET    /api/leads/{id}
//! PUT    /api/leads/{id}/status
//! DELETE /api/leads/{id}
//! GET    /api/deals
//! POST   /api/deals
//! GET    /api/deals/{id}
//! PUT    /api/deals/{id}
//! DELETE /api/deals/{id}
//!
//! # Other
//! POST   /api/uploads                 - Image upload to Cloudinary (editor)
//! GET    /api/dashboard/summary       - Dashboard figures
//! ```

pub mod categories;
pub mod dashboard;
pub mod deals;
pub mod leads;
pub mod orders;
pub mod products;
pub mod uploads;
pub mod users;
mod validation;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::state::AppState;

fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/login", post(users::login))
        .route("/users/me", get(users::me))
        .route("/users", get(users::list).post(users::create))
        .route("/users/{id}", axum::routing::delete(users::delete))
}

fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/categories/{id}",
            get(categories::show)
                .put(categories::update)
                .delete(categories::delete),
        )
        .route("/products", get(products::list).post(products::create))
        .route(
            "/products/{id}",
            get(products::show)
                .put(products::update)
                .delete(products::delete),
        )
}

fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::show).delete(orders::delete))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/leads", get(leads::list))
        .route("/leads/{id}", get(leads::show).delete(leads::delete))
        .route("/leads/{id}/status", put(leads::update_status))
        .route("/deals", get(deals::list).post(deals::create))
        .route(
            "/deals/{id}",
            get(deals::show).put(deals::update).delete(deals::delete),
        )
}

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    let api = Router::new()
        .merge(user_routes())
        .merge(catalog_routes())
        .merge(sales_routes())
        .route(
            "/uploads",
            post(uploads::upload).layer(DefaultBodyLimit::max(uploads::UPLOAD_BODY_LIMIT)),
        )
        .route("/dashboard/summary", get(dashboard::summary));

    Router::new().nest("/api", api)
}
