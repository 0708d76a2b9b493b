//! Category management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use sonic_core::CategoryId;

use super::validation;
use crate::db::CategoryRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireEditor, RequireStaff};
use crate::models::{Category, CategoryInput};
use crate::state::AppState;

/// Body of `POST /api/categories` and `PUT /api/categories/{id}`.
#[derive(Debug, Deserialize)]
pub struct CategoryForm {
    pub name: String,
    /// Derived from the name when omitted.
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CategoryForm {
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a blank name, a malformed slug or
    /// a bad image URL.
    pub fn into_input(self) -> Result<CategoryInput> {
        let name = validation::required("name", &self.name)?;
        let slug = validation::slug_for(&name, self.slug)?;
        let image_url = validation::optional(self.image_url)
            .map(|url| validation::image_url(&url))
            .transpose()?;

        Ok(CategoryInput {
            name,
            slug,
            description: validation::optional(self.description),
            image_url,
        })
    }
}

/// `GET /api/categories`
#[instrument(skip_all)]
pub async fn list(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>> {
    let categories = CategoryRepository::new(state.pool()).list().await?;
    Ok(Json(categories))
}

/// `GET /api/categories/{id}`
#[instrument(skip(_staff, state))]
pub async fn show(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<Json<Category>> {
    CategoryRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Category {id} not found")))
}

/// `POST /api/categories`
#[instrument(skip_all, fields(user_id = %staff.id))]
pub async fn create(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Json(form): Json<CategoryForm>,
) -> Result<(StatusCode, Json<Category>)> {
    let input = form.into_input()?;
    let category = CategoryRepository::new(state.pool()).create(&input).await?;

    tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// `PUT /api/categories/{id}`
#[instrument(skip_all, fields(user_id = %staff.id, category_id = %id))]
pub async fn update(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
    Json(form): Json<CategoryForm>,
) -> Result<Json<Category>> {
    let input = form.into_input()?;
    let category = CategoryRepository::new(state.pool()).update(id, &input).await?;

    tracing::info!("Category updated");
    Ok(Json(category))
}

/// `DELETE /api/categories/{id}`
///
/// Refused with 409 while products still belong to the category.
#[instrument(skip_all, fields(user_id = %staff.id, category_id = %id))]
pub async fn delete(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<StatusCode> {
    CategoryRepository::new(state.pool()).delete(id).await?;

    tracing::info!("Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
