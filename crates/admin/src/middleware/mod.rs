//! HTTP middleware stack for admin.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (added in `main.rs`)
//! 2. `TraceLayer` (`http_request` span)
//! 3. Request ID (recorded in the span and Sentry scope)
//! 4. CORS (admin frontend origin only)
//! 5. Security headers
//!
//! The upload route carries its own body limit. Authentication is not a layer: handlers take a role extractor from
//! [`auth`].

pub mod auth;
pub mod request_id;
pub mod security_headers;

pub use auth::{CurrentStaff, RequireAdmin, RequireEditor, RequireStaff};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
