//! Categories and products as staff see them, inactive products included.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use sonic_core::{CategoryId, ProductId};

/// A category with the number of products filed under it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub product_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated category fields for insert and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// A product with its category name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub category_id: CategoryId,
    pub category_name: String,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub mrp: Option<Decimal>,
    pub image_urls: Vec<String>,
    pub min_quantity: i32,
    pub max_quantity: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated product fields for insert and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub category_id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub mrp: Option<Decimal>,
    pub image_urls: Vec<String>,
    pub min_quantity: i32,
    pub max_quantity: i32,
    pub is_active: bool,
}

/// Product list filters.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring of the name or slug.
    pub search: Option<String>,
}
