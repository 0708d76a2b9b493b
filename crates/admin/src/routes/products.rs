//! Product management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use sonic_core::pricing::QuantityBounds;
use sonic_core::{CategoryId, ProductId};

use super::validation;
use crate::db::{CategoryRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireEditor, RequireStaff};
use crate::models::{Product, ProductFilter, ProductInput};
use crate::state::AppState;

const fn default_min_quantity() -> u32 {
    1
}

const fn default_max_quantity() -> u32 {
    10
}

const fn default_true() -> bool {
    true
}

/// Body of `POST /api/products` and `PUT /api/products/{id}`.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub category_id: CategoryId,
    pub name: String,
    /// Derived from the name when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default)]
    pub mrp: Option<Decimal>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default = "default_min_quantity")]
    pub min_quantity: u32,
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl ProductForm {
    /// Check the fields that need no database access.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a blank name, a bad slug, a price
    /// that is not positive, an unusable quantity range or a bad image URL.
    pub fn into_input(self) -> Result<ProductInput> {
        let name = validation::required("name", &self.name)?;
        let slug = validation::slug_for(&name, self.slug)?;
        let price = validation::amount("price", self.price, false)?;
        let mrp = self
            .mrp
            .map(|mrp| validation::amount("mrp", mrp, false))
            .transpose()?;

        let bounds = QuantityBounds::new(self.min_quantity, self.max_quantity)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        let to_column = |n: u32| {
            i32::try_from(n).map_err(|_| AppError::BadRequest(format!("quantity {n} is too large")))
        };

        let image_urls = self
            .image_urls
            .iter()
            .map(|url| validation::image_url(url))
            .collect::<Result<Vec<_>>>()?;

        Ok(ProductInput {
            category_id: self.category_id,
            name,
            slug,
            description: validation::optional(self.description),
            price,
            mrp,
            image_urls,
            min_quantity: to_column(bounds.min)?,
            max_quantity: to_column(bounds.max)?,
            is_active: self.is_active,
        })
    }
}

/// Reject inputs naming a category that does not exist.
async fn ensure_category(state: &AppState, id: CategoryId) -> Result<()> {
    if CategoryRepository::new(state.pool()).exists(id).await? {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("category {id} does not exist")))
    }
}

/// Query string of `GET /api/products`.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category_id: Option<CategoryId>,
    pub q: Option<String>,
}

/// `GET /api/products`
#[instrument(skip(_staff, state))]
pub async fn list(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = ProductFilter {
        category_id: query.category_id,
        search: validation::optional(query.q),
    };
    let products = ProductRepository::new(state.pool()).list(&filter).await?;
    Ok(Json(products))
}

/// `GET /api/products/{id}`
#[instrument(skip(_staff, state))]
pub async fn show(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product {id} not found")))
}

/// `POST /api/products`
#[instrument(skip_all, fields(user_id = %staff.id))]
pub async fn create(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Json(form): Json<ProductForm>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = form.into_input()?;
    ensure_category(&state, input.category_id).await?;

    let product = ProductRepository::new(state.pool()).create(&input).await?;

    tracing::info!(product_id = %product.id, slug = %product.slug, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// `PUT /api/products/{id}`
#[instrument(skip_all, fields(user_id = %staff.id, product_id = %id))]
pub async fn update(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(form): Json<ProductForm>,
) -> Result<Json<Product>> {
    let input = form.into_input()?;
    ensure_category(&state, input.category_id).await?;

    let product = ProductRepository::new(state.pool()).update(id, &input).await?;

    tracing::info!(is_active = product.is_active, "Product updated");
    Ok(Json(product))
}

/// `DELETE /api/products/{id}`
///
/// Refused with 409 once orders reference the product.
#[instrument(skip_all, fields(user_id = %staff.id, product_id = %id))]
pub async fn delete(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool()).delete(id).await?;

    tracing::info!("Product deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(json: serde_json::Value) -> ProductForm {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_defaults() {
        let input = form(serde_json::json!({
            "category_id": 2,
            "name": "Sonic Aqua 1HP Submersible",
            "price": "8499.00"
        }))
        .into_input()
        .unwrap();

        assert_eq!(input.slug, "sonic-aqua-1hp-submersible");
        assert_eq!(input.min_quantity, 1);
        assert_eq!(input.max_quantity, 10);
        assert!(input.is_active);
        assert!(input.image_urls.is_empty());
    }

    #[test]
    fn test_price_must_be_positive() {
        let result = form(serde_json::json!({
            "category_id": 2,
            "name": "Free pump",
            "price": "0"
        }))
        .into_input();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_quantity_bounds() {
        let result = form(serde_json::json!({
            "category_id": 2,
            "name": "Pump",
            "price": "100",
            "min_quantity": 5,
            "max_quantity": 2
        }))
        .into_input();
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        let result = form(serde_json::json!({
            "category_id": 2,
            "name": "Pump",
            "price": "100",
            "min_quantity": 0
        }))
        .into_input();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_image_urls_checked() {
        let result = form(serde_json::json!({
            "category_id": 2,
            "name": "Pump",
            "price": "100",
            "image_urls": ["https://res.cloudinary.com/a.jpg", "ftp://files/b.jpg"]
        }))
        .into_input();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
