//! Cached catalog reads.
//!
//! The category list and the rendered sitemap change only when staff edit
//! the catalog, so both are kept in memory via `moka` (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;
use tracing::{debug, instrument};

use crate::db::{CatalogRepository, RepositoryError};
use crate::models::Category;

use super::sitemap;

/// Cache keys.
const CATEGORIES_KEY: &str = "categories";
const SITEMAP_KEY: &str = "sitemap";

/// Values stored in the cache.
#[derive(Clone)]
enum CacheValue {
    Categories(Arc<Vec<Category>>),
    Sitemap(Arc<String>),
}

/// In-memory cache over catalog queries.
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<&'static str, CacheValue>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl CatalogCache {
    /// Create a cache whose entries live for `ttl`.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(16).time_to_live(ttl).build();
        Self { cache }
    }

    /// All categories, newest data at most one TTL old.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails on a miss.
    #[instrument(skip(self, pool))]
    pub async fn categories(&self, pool: &PgPool) -> Result<Arc<Vec<Category>>, RepositoryError> {
        if let Some(CacheValue::Categories(categories)) = self.cache.get(CATEGORIES_KEY).await {
            debug!("Cache hit for categories");
            return Ok(categories);
        }

        let categories = Arc::new(CatalogRepository::new(pool).list_categories().await?);
        self.cache
            .insert(CATEGORIES_KEY, CacheValue::Categories(Arc::clone(&categories)))
            .await;

        Ok(categories)
    }

    /// The sitemap XML for `site_url`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the database query fails on a miss.
    #[instrument(skip(self, pool))]
    pub async fn sitemap(&self, pool: &PgPool, site_url: &str) -> Result<Arc<String>, RepositoryError> {
        if let Some(CacheValue::Sitemap(xml)) = self.cache.get(SITEMAP_KEY).await {
            debug!("Cache hit for sitemap");
            return Ok(xml);
        }

        let repo = CatalogRepository::new(pool);
        let categories = repo.category_sitemap_rows().await?;
        let products = repo.product_sitemap_rows().await?;

        let xml = Arc::new(sitemap::render(site_url, &categories, &products));
        self.cache
            .insert(SITEMAP_KEY, CacheValue::Sitemap(Arc::clone(&xml)))
            .await;

        Ok(xml)
    }
}
