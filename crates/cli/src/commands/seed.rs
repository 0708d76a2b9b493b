//! Seed the catalog from a YAML file.
//!
//! The file is validated with the same rules as the admin API before any
//! connection is made. Rows are upserted (categories and products by slug,
//! deals by coupon code) inside one transaction, so re-running a seed file
//! updates in place.
//!
//! ```yaml
//! categories:
//!   - name: Submersible Pumps
//!     description: Borewell and open-well pumps
//!     products:
//!       - name: Sonic Aqua 1HP Submersible
//!         price: "8499.00"
//!         mrp: "9999.00"
//!         max_quantity: 5
//! deals:
//!   - title: Monsoon offer
//!     coupon_code: monsoon25
//!     product: sonic-aqua-1hp-submersible
//!     deal_price: "7499.00"
//!     expires_at: 2026-09-30T18:30:00Z
//! ```

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use sonic_admin::models::{CategoryInput, DealInput, ProductInput};
use sonic_admin::routes::categories::CategoryForm;
use sonic_admin::routes::deals::DealForm;
use sonic_admin::routes::products::ProductForm;
use sonic_core::{CategoryId, ProductId};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Failed to read seed file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{} validation error(s):\n  - {}", .0.len(), .0.join("\n  - "))]
    Invalid(Vec<String>),

    #[error("Deal {coupon_code} names unknown product '{slug}'")]
    UnknownProduct { coupon_code: String, slug: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    categories: Vec<SeedCategory>,
    #[serde(default)]
    deals: Vec<SeedDeal>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedCategory {
    name: String,
    slug: Option<String>,
    description: Option<String>,
    image_url: Option<String>,
    #[serde(default)]
    products: Vec<SeedProduct>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedProduct {
    name: String,
    slug: Option<String>,
    description: Option<String>,
    price: Decimal,
    mrp: Option<Decimal>,
    #[serde(default)]
    image_urls: Vec<String>,
    min_quantity: Option<u32>,
    max_quantity: Option<u32>,
    #[serde(default = "default_true")]
    is_active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedDeal {
    title: String,
    description: Option<String>,
    /// Product slug. Omit for a coupon valid on any product.
    product: Option<String>,
    coupon_code: String,
    deal_price: Decimal,
    starts_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    is_active: bool,
}

const fn default_true() -> bool {
    true
}

/// A validated seed file, ready to write.
#[derive(Debug)]
struct SeedPlan {
    categories: Vec<(CategoryInput, Vec<ProductInput>)>,
    /// Deals with the slug of their product, if any.
    deals: Vec<(DealInput, Option<String>)>,
}

impl SeedPlan {
    fn product_count(&self) -> usize {
        self.categories.iter().map(|(_, products)| products.len()).sum()
    }
}

/// Parse and validate a seed file, collecting every problem.
fn plan(content: &str) -> Result<SeedPlan, SeedError> {
    let file: SeedFile = serde_yaml::from_str(content)?;
    let mut errors = Vec::new();
    let mut categories = Vec::new();

    for category in file.categories {
        let label = category.name.clone();
        let form = CategoryForm {
            name: category.name,
            slug: category.slug,
            description: category.description,
            image_url: category.image_url,
        };
        let input = match form.into_input() {
            Ok(input) => input,
            Err(e) => {
                errors.push(format!("category '{label}': {e}"));
                continue;
            }
        };

        let mut products = Vec::new();
        for product in category.products {
            let label = product.name.clone();
            // The real category id is filled in once the category is written.
            let form = ProductForm {
                category_id: CategoryId::new(0),
                name: product.name,
                slug: product.slug,
                description: product.description,
                price: product.price,
                mrp: product.mrp,
                image_urls: product.image_urls,
                min_quantity: product.min_quantity.unwrap_or(1),
                max_quantity: product.max_quantity.unwrap_or(10),
                is_active: product.is_active,
            };
            match form.into_input() {
                Ok(input) => products.push(input),
                Err(e) => errors.push(format!("product '{label}': {e}")),
            }
        }
        categories.push((input, products));
    }

    let mut deals = Vec::new();
    for deal in file.deals {
        let label = deal.coupon_code.clone();
        let form = DealForm {
            title: deal.title,
            description: deal.description,
            product_id: None,
            coupon_code: deal.coupon_code,
            deal_price: deal.deal_price,
            starts_at: deal.starts_at,
            expires_at: deal.expires_at,
            is_active: deal.is_active,
        };
        match form.into_input() {
            Ok(input) => deals.push((input, deal.product)),
            Err(e) => errors.push(format!("deal '{label}': {e}")),
        }
    }

    if errors.is_empty() {
        Ok(SeedPlan { categories, deals })
    } else {
        Err(SeedError::Invalid(errors))
    }
}

/// Seed the database from `path`.
///
/// # Errors
///
/// Returns `SeedError` if the file cannot be read or fails validation, a
/// deal names an unknown product, or a database write fails. Nothing is
/// written unless every row succeeds.
pub async fn run(path: &Path, dry_run: bool) -> Result<(), SeedError> {
    tracing::info!(path = %path.display(), "Loading seed file");

    let content = tokio::fs::read_to_string(path).await?;
    let plan = plan(&content)?;

    tracing::info!(
        categories = plan.categories.len(),
        products = plan.product_count(),
        deals = plan.deals.len(),
        "Seed file validated"
    );

    if dry_run {
        tracing::info!("Dry run, database untouched");
        return Ok(());
    }

    let pool = super::connect()
        .await
        .ok_or(SeedError::MissingEnvVar("DATABASE_URL"))??;

    write(&pool, plan).await?;

    tracing::info!("Seeding complete!");
    Ok(())
}

async fn write(pool: &PgPool, plan: SeedPlan) -> Result<(), SeedError> {
    let mut tx = pool.begin().await?;

    for (category, products) in plan.categories {
        let category_id = upsert_category(&mut tx, &category).await?;
        tracing::info!("  category {} ({})", category.slug, category_id);

        for mut product in products {
            product.category_id = category_id;
            let product_id = upsert_product(&mut tx, &product).await?;
            tracing::info!("    product {} ({})", product.slug, product_id);
        }
    }

    for (mut deal, product_slug) in plan.deals {
        if let Some(slug) = product_slug {
            let product_id: Option<ProductId> =
                sqlx::query_scalar("SELECT id FROM products WHERE slug = $1")
                    .bind(&slug)
                    .fetch_optional(&mut *tx)
                    .await?;
            deal.product_id = Some(product_id.ok_or_else(|| SeedError::UnknownProduct {
                coupon_code: deal.coupon_code.clone(),
                slug,
            })?);
        }
        upsert_deal(&mut tx, &deal).await?;
        tracing::info!("  deal {}", deal.coupon_code);
    }

    tx.commit().await?;
    Ok(())
}

async fn upsert_category(conn: &mut PgConnection, input: &CategoryInput) -> Result<CategoryId, sqlx::Error> {
    sqlx::query_scalar(
        r"
        INSERT INTO categories (name, slug, description, image_url)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (slug) DO UPDATE
        SET name = EXCLUDED.name,
            description = EXCLUDED.description,
            image_url = EXCLUDED.image_url
        RETURNING id
        ",
    )
    .bind(&input.name)
    .bind(&input.slug)
    .bind(input.description.as_deref())
    .bind(input.image_url.as_deref())
    .fetch_one(conn)
    .await
}

async fn upsert_product(conn: &mut PgConnection, input: &ProductInput) -> Result<ProductId, sqlx::Error> {
    sqlx::query_scalar(
        r"
        INSERT INTO products (
            category_id, name, slug, description, price, mrp, image_urls,
            min_quantity, max_quantity, is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (slug) DO UPDATE
        SET category_id = EXCLUDED.category_id,
            name = EXCLUDED.name,
            description = EXCLUDED.description,
            price = EXCLUDED.price,
            mrp = EXCLUDED.mrp,
            image_urls = EXCLUDED.image_urls,
            min_quantity = EXCLUDED.min_quantity,
            max_quantity = EXCLUDED.max_quantity,
            is_active = EXCLUDED.is_active
        RETURNING id
        ",
    )
    .bind(input.category_id)
    .bind(&input.name)
    .bind(&input.slug)
    .bind(input.description.as_deref())
    .bind(input.price)
    .bind(input.mrp)
    .bind(&input.image_urls)
    .bind(input.min_quantity)
    .bind(input.max_quantity)
    .bind(input.is_active)
    .fetch_one(conn)
    .await
}

async fn upsert_deal(conn: &mut PgConnection, input: &DealInput) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        INSERT INTO deals (
            title, description, product_id, coupon_code, deal_price,
            starts_at, expires_at, is_active
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (coupon_code) DO UPDATE
        SET title = EXCLUDED.title,
            description = EXCLUDED.description,
            product_id = EXCLUDED.product_id,
            deal_price = EXCLUDED.deal_price,
            starts_at = EXCLUDED.starts_at,
            expires_at = EXCLUDED.expires_at,
            is_active = EXCLUDED.is_active
        ",
    )
    .bind(&input.title)
    .bind(input.description.as_deref())
    .bind(input.product_id)
    .bind(&input.coupon_code)
    .bind(input.deal_price)
    .bind(input.starts_at)
    .bind(input.expires_at)
    .bind(input.is_active)
    .execute(conn)
    .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
categories:
  - name: Submersible Pumps
    description: Borewell and open-well pumps
    products:
      - name: Sonic Aqua 1HP Submersible
        price: "8499.00"
        mrp: "9999.00"
        max_quantity: 5
      - name: Sonic Aqua 2HP Submersible
        slug: aqua-2hp
        price: 12999
  - name: Motors
deals:
  - title: Monsoon offer
    coupon_code: " monsoon25 "
    product: sonic-aqua-1hp-submersible
    deal_price: "7499.00"
    expires_at: 2026-09-30T18:30:00Z
"#;

    #[test]
    fn test_plan_valid_file() {
        let plan = plan(CATALOG).unwrap();

        assert_eq!(plan.categories.len(), 2);
        assert_eq!(plan.product_count(), 2);

        let (category, products) = &plan.categories[0];
        assert_eq!(category.slug, "submersible-pumps");
        assert_eq!(products[0].slug, "sonic-aqua-1hp-submersible");
        assert_eq!(products[0].max_quantity, 5);
        assert_eq!(products[1].slug, "aqua-2hp");
        assert_eq!(products[1].min_quantity, 1);

        let (deal, product) = &plan.deals[0];
        assert_eq!(deal.coupon_code, "MONSOON25");
        assert_eq!(product.as_deref(), Some("sonic-aqua-1hp-submersible"));
    }

    #[test]
    fn test_plan_collects_every_error() {
        let yaml = r#"
categories:
  - name: " "
  - name: Pumps
    products:
      - name: Free pump
        price: 0
deals:
  - title: Bad
    coupon_code: "has space"
    deal_price: 10
"#;
        let Err(SeedError::Invalid(errors)) = plan(yaml) else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 3);
        assert!(errors[1].contains("Free pump"));
    }

    #[test]
    fn test_plan_rejects_unknown_fields() {
        let yaml = "categories:\n  - name: Pumps\n    colour: blue\n";
        assert!(matches!(plan(yaml), Err(SeedError::Parse(_))));
    }

    #[test]
    fn test_empty_file() {
        let plan = plan("{}").unwrap();
        assert!(plan.categories.is_empty());
        assert!(plan.deals.is_empty());
    }
}
