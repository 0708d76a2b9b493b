//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `catalog_cache` - In-memory cache for the category list and sitemap
//! - `checkout` - Server-side pricing of checkouts and orders
//! - `checkout_session` - Short-lived checkout tokens (JWT)
//! - `razorpay` - Payment gateway client and signature checks
//! - `sitemap` - Sitemap XML rendering

pub mod catalog_cache;
pub mod checkout;
pub mod checkout_session;
pub mod razorpay;
pub mod sitemap;

pub use catalog_cache::CatalogCache;
pub use checkout::{Checkout, CheckoutError};
pub use checkout_session::{CheckoutClaims, CheckoutSessions, SessionError};
pub use razorpay::{RazorpayClient, RazorpayError};
