//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::AdminConfig;
use crate::services::{CloudinaryClient, CloudinaryError, StaffTokens};

/// Application state shared across all handlers.
///
/// Cheap to clone; everything lives behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    pool: PgPool,
    tokens: StaffTokens,
    cloudinary: Option<CloudinaryClient>,
}

impl AppState {
    /// Build the state from configuration and a database pool.
    ///
    /// # Errors
    ///
    /// Returns `CloudinaryError` if the upload HTTP client cannot be built.
    pub fn new(config: AdminConfig, pool: PgPool) -> Result<Self, CloudinaryError> {
        let tokens = StaffTokens::new(&config.jwt_secret, config.jwt_ttl);
        let cloudinary = config
            .cloudinary
            .clone()
            .map(CloudinaryClient::new)
            .transpose()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                cloudinary,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Staff token issuer and verifier.
    #[must_use]
    pub fn tokens(&self) -> &StaffTokens {
        &self.inner.tokens
    }

    /// Upload client, `None` when Cloudinary is not configured.
    #[must_use]
    pub fn cloudinary(&self) -> Option<&CloudinaryClient> {
        self.inner.cloudinary.as_ref()
    }
}
