//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use sonic_core::pricing::ShippingSchedule;
use sonic_core::reward::RewardTable;

use crate::config::StorefrontConfig;
use crate::services::{CatalogCache, CheckoutSessions, RazorpayClient, RazorpayError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    sessions: CheckoutSessions,
    razorpay: RazorpayClient,
    rewards: RewardTable,
    shipping: ShippingSchedule,
    catalog_cache: CatalogCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool
    ///
    /// # Errors
    ///
    /// Returns an error if the Razorpay HTTP client cannot be built.
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Result<Self, RazorpayError> {
        let sessions = CheckoutSessions::new(&config.jwt_secret, config.checkout_session_ttl);
        let razorpay = RazorpayClient::new(&config.razorpay)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                sessions,
                razorpay,
                rewards: RewardTable::default(),
                shipping: ShippingSchedule::default(),
                catalog_cache: CatalogCache::default(),
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Checkout token issuer/verifier.
    #[must_use]
    pub fn sessions(&self) -> &CheckoutSessions {
        &self.inner.sessions
    }

    /// Razorpay API client.
    #[must_use]
    pub fn razorpay(&self) -> &RazorpayClient {
        &self.inner.razorpay
    }

    /// Reward wheel segments.
    #[must_use]
    pub fn rewards(&self) -> &RewardTable {
        &self.inner.rewards
    }

    /// Shipping fee tiers.
    #[must_use]
    pub fn shipping(&self) -> &ShippingSchedule {
        &self.inner.shipping
    }

    #[must_use]
    pub fn catalog_cache(&self) -> &CatalogCache {
        &self.inner.catalog_cache
    }
}
