//! Sonic Industries Core - Shared domain library.
//!
//! This crate provides the types and pure logic used across all Sonic
//! Industries components:
//! - `storefront` - Public JSON API (catalog, checkout, payments)
//! - `admin` - Back-office JSON API (staff CRUD, uploads, dashboard)
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and arithmetic - no I/O, no database
//! access, no HTTP clients. Checkout pricing, coupon evaluation and the
//! reward picker live here so both binaries (and their tests) agree on the
//! numbers.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, contact details, money and status enums
//! - [`pricing`] - GST, shipping tiers and prepaid/COD adjustment
//! - [`coupon`] - Deal-backed coupon evaluation
//! - [`reward`] - Weighted reward wheel

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod coupon;
pub mod pricing;
pub mod reward;
pub mod types;

pub use types::*;
