//! HTTP middleware stack for storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transactions)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. CORS (frontend origin only)
//! 5. Security headers
//! 6. Rate limiting (governor, per route group)
//!
//! `CheckoutSession` is an extractor rather than a layer so that only the
//! checkout mutations pay for token verification.

pub mod checkout_session;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use checkout_session::CheckoutSession;
pub use rate_limit::{api_rate_limiter, checkout_rate_limiter};
pub use request_id::{RequestId, request_id_middleware};
pub use security_headers::security_headers_middleware;
