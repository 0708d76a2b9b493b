//! Read-only catalog queries: categories, products and deals.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sonic_core::ProductId;

use super::RepositoryError;
use crate::models::{Category, DealRow, Product, PublicDeal, SitemapRow};

const PRODUCT_COLUMNS: &str = r"
    p.id, p.category_id, c.slug AS category_slug, p.name, p.slug, p.description,
    p.price, p.mrp, p.image_urls, p.min_quantity, p.max_quantity, p.updated_at
";

/// Repository for catalog reads.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, slug, description, image_url, updated_at
            FROM categories
            ORDER BY name
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// A category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_category_by_slug(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(
            r"
            SELECT id, name, slug, description, image_url, updated_at
            FROM categories
            WHERE slug = $1
            ",
        )
        .bind(slug)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Active products, optionally limited to one category slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_products(&self, category_slug: Option<&str>) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.is_active AND ($1::TEXT IS NULL OR c.slug = $1)
            ORDER BY p.name
            "
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(category_slug)
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }

    /// An active product by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.is_active AND p.slug = $1
            "
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(product)
    }

    /// An active product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products p
            JOIN categories c ON c.id = p.category_id
            WHERE p.is_active AND p.id = $1
            "
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(product)
    }

    /// Deals that are active and inside their window at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_live_deals(&self, now: DateTime<Utc>) -> Result<Vec<PublicDeal>, RepositoryError> {
        let deals = sqlx::query_as::<_, PublicDeal>(
            r"
            SELECT d.id, d.title, d.description, d.product_id,
                   p.name AS product_name, p.slug AS product_slug, p.price AS product_price,
                   d.deal_price, d.expires_at
            FROM deals d
            LEFT JOIN products p ON p.id = d.product_id
            WHERE d.is_active
              AND (d.starts_at IS NULL OR d.starts_at <= $1)
              AND (d.expires_at IS NULL OR d.expires_at > $1)
              AND (d.product_id IS NULL OR p.is_active)
            ORDER BY d.expires_at NULLS LAST, d.id
            ",
        )
        .bind(now)
        .fetch_all(self.pool)
        .await?;

        Ok(deals)
    }

    /// The deal carrying a coupon code. `code` should already be normalised.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_deal_by_code(&self, code: &str) -> Result<Option<DealRow>, RepositoryError> {
        let deal = sqlx::query_as::<_, DealRow>(
            r"
            SELECT id, coupon_code::TEXT AS coupon_code, product_id, deal_price,
                   is_active, starts_at, expires_at
            FROM deals
            WHERE coupon_code = $1::CITEXT
            ",
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(deal)
    }

    /// Category slugs for the sitemap.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_sitemap_rows(&self) -> Result<Vec<SitemapRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, SitemapRow>(
            "SELECT slug, updated_at FROM categories ORDER BY slug",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Active product slugs for the sitemap.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_sitemap_rows(&self) -> Result<Vec<SitemapRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, SitemapRow>(
            "SELECT slug, updated_at FROM products WHERE is_active ORDER BY slug",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
