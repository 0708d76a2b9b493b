//! Database operations for the admin API.
//!
//! # Database: `sonic` (shared with the storefront)
//!
//! ## Tables
//!
//! - `users` - Staff accounts (argon2id password hashes, roles)
//! - `categories`, `products` - Catalog, written only from here
//! - `orders` - Created by the storefront, status managed from here
//! - `leads` - Contact form submissions
//! - `deals` - Promotions and their coupon codes
//!
//! # Migrations
//!
//! Migrations live in the workspace `migrations/` directory and run via:
//! ```bash
//! cargo run -p sonic-cli -- migrate
//! ```

pub mod catalog;
pub mod dashboard;
pub mod deals;
pub mod leads;
pub mod orders;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::{CategoryRepository, ProductRepository};
pub use dashboard::DashboardRepository;
pub use deals::DealRepository;
pub use leads::LeadRepository;
pub use orders::OrderRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug, category still in use).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a write error, turning unique and foreign-key violations into
    /// [`RepositoryError::Conflict`] with the given message.
    pub(crate) fn from_write(e: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = e
            && (db_err.is_unique_violation() || db_err.is_foreign_key_violation())
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(e)
    }
}

/// `Ok` if a delete or update touched a row, `NotFound` otherwise.
pub(crate) const fn expect_row(rows_affected: u64) -> Result<(), RepositoryError> {
    if rows_affected == 0 {
        Err(RepositoryError::NotFound)
    } else {
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
