//! Catalog records as the storefront exposes them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use sonic_core::coupon::DealTerms;
use sonic_core::pricing::{PricingError, QuantityBounds};
use sonic_core::{CategoryId, DealId, ProductId};

/// A product category.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// An active product together with its category slug.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub category_slug: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub mrp: Option<Decimal>,
    pub image_urls: Vec<String>,
    pub min_quantity: i32,
    pub max_quantity: i32,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Quantity range this product can be ordered in.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::InvalidBounds`] if the stored range is unusable.
    pub fn bounds(&self) -> Result<QuantityBounds, PricingError> {
        let min = u32::try_from(self.min_quantity).unwrap_or(0);
        let max = u32::try_from(self.max_quantity).unwrap_or(0);
        QuantityBounds::new(min, max)
    }
}

/// A category with its active products, for category pages.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryWithProducts {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<Product>,
}

/// A deal as shown on the public deals page. The coupon code stays private.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PublicDeal {
    pub id: DealId,
    pub title: String,
    pub description: Option<String>,
    pub product_id: Option<ProductId>,
    pub product_name: Option<String>,
    pub product_slug: Option<String>,
    pub product_price: Option<Decimal>,
    pub deal_price: Decimal,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Deal row looked up by coupon code.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DealRow {
    pub id: DealId,
    pub coupon_code: String,
    pub product_id: Option<ProductId>,
    pub deal_price: Decimal,
    pub is_active: bool,
    pub starts_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&DealRow> for DealTerms {
    fn from(row: &DealRow) -> Self {
        Self {
            product_id: row.product_id,
            deal_price: row.deal_price,
            is_active: row.is_active,
            starts_at: row.starts_at,
            expires_at: row.expires_at,
        }
    }
}

/// Slug and last-modified time for one sitemap entry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SitemapRow {
    pub slug: String,
    pub updated_at: DateTime<Utc>,
}
