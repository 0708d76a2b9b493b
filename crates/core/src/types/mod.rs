//! Core types for Sonic Industries.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod contact;
pub mod id;
pub mod money;
pub mod slug;
pub mod status;

pub use address::{Address, AddressError};
pub use contact::{Email, EmailError, Phone, PhoneError};
pub use id::*;
pub use money::{CURRENCY, round_paise, to_paise};
pub use slug::{is_valid_slug, slugify};
pub use status::*;
