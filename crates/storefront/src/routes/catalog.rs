//! Catalog route handlers.
//!
//! Read-only views over categories, products and live deals, plus the
//! sitemap. Only active products are ever returned.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use crate::db::CatalogRepository;
use crate::error::{AppError, Result};
use crate::models::{CategoryWithProducts, Product, PublicDeal};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub category: Option<String>,
}

/// `GET /api/categories`
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Response> {
    let categories = state.catalog_cache().categories(state.pool()).await?;
    Ok(Json(categories.as_slice()).into_response())
}

/// `GET /api/categories/{slug}`
#[instrument(skip(state))]
pub async fn show_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryWithProducts>> {
    let repo = CatalogRepository::new(state.pool());

    let category = repo
        .get_category_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category '{slug}' not found")))?;
    let products = repo.list_products(Some(&category.slug)).await?;

    Ok(Json(CategoryWithProducts { category, products }))
}

/// `GET /api/products?category={slug}`
#[instrument(skip(state))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<Vec<Product>>> {
    let category = query.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let products = CatalogRepository::new(state.pool())
        .list_products(category)
        .await?;
    Ok(Json(products))
}

/// `GET /api/products/{slug}`
#[instrument(skip(state))]
pub async fn show_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Product>> {
    CatalogRepository::new(state.pool())
        .get_product_by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Product '{slug}' not found")))
}

/// `GET /api/deals`
#[instrument(skip(state))]
pub async fn list_deals(State(state): State<AppState>) -> Result<Json<Vec<PublicDeal>>> {
    let deals = CatalogRepository::new(state.pool())
        .list_live_deals(Utc::now())
        .await?;
    Ok(Json(deals))
}

/// `GET /sitemap.xml`
#[instrument(skip(state))]
pub async fn sitemap(State(state): State<AppState>) -> Result<Response> {
    let xml = state
        .catalog_cache()
        .sitemap(state.pool(), &state.config().site_url)
        .await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/xml; charset=utf-8"),
            (header::CACHE_CONTROL, "public, max-age=300"),
        ],
        xml.as_str().to_owned(),
    )
        .into_response())
}
