//! Deal and coupon code management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sonic_core::coupon::normalize_code;
use sonic_core::{DealId, ProductId};

use super::validation;
use crate::db::{DealRepository, ProductRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireEditor, RequireStaff};
use crate::models::{Deal, DealInput};
use crate::state::AppState;

const MAX_CODE_LENGTH: usize = 32;

const fn default_true() -> bool {
    true
}

/// A deal as the back office sees it, with its current liveness.
#[derive(Debug, Serialize)]
pub struct DealView {
    #[serde(flatten)]
    pub deal: Deal,
    pub is_live: bool,
}

impl DealView {
    fn at(deal: Deal, now: DateTime<Utc>) -> Self {
        let is_live = deal.is_live_at(now);
        Self { deal, is_live }
    }
}

/// Body of `POST /api/deals` and `PUT /api/deals/{id}`.
#[derive(Debug, Deserialize)]
pub struct DealForm {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `None` makes the coupon valid for any product.
    #[serde(default)]
    pub product_id: Option<ProductId>,
    pub coupon_code: String,
    pub deal_price: Decimal,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn coupon_code(raw: &str) -> Result<String> {
    let code = normalize_code(raw);
    if code.is_empty() {
        return Err(AppError::BadRequest("coupon_code is required".to_owned()));
    }
    if code.chars().count() > MAX_CODE_LENGTH {
        return Err(AppError::BadRequest(format!(
            "coupon_code must be at most {MAX_CODE_LENGTH} characters"
        )));
    }
    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::BadRequest(
            "coupon_code may only contain letters, digits, '-' and '_'".to_owned(),
        ));
    }
    Ok(code)
}

impl DealForm {
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a blank title, a malformed code,
    /// a negative price or a window that ends before it starts.
    pub fn into_input(self) -> Result<DealInput> {
        let title = validation::required("title", &self.title)?;
        let coupon_code = coupon_code(&self.coupon_code)?;
        let deal_price = validation::amount("deal_price", self.deal_price, true)?;

        if let (Some(start), Some(end)) = (self.starts_at, self.expires_at)
            && end <= start
        {
            return Err(AppError::BadRequest(
                "expires_at must be after starts_at".to_owned(),
            ));
        }

        Ok(DealInput {
            title,
            description: validation::optional(self.description),
            product_id: self.product_id,
            coupon_code,
            deal_price,
            starts_at: self.starts_at,
            expires_at: self.expires_at,
            is_active: self.is_active,
        })
    }
}

async fn ensure_product(state: &AppState, id: Option<ProductId>) -> Result<()> {
    let Some(id) = id else {
        return Ok(());
    };
    if ProductRepository::new(state.pool()).exists(id).await? {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("product {id} does not exist")))
    }
}

/// `GET /api/deals`
#[instrument(skip_all)]
pub async fn list(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<Vec<DealView>>> {
    let now = Utc::now();
    let deals = DealRepository::new(state.pool()).list().await?;
    Ok(Json(
        deals.into_iter().map(|deal| DealView::at(deal, now)).collect(),
    ))
}

/// `GET /api/deals/{id}`
#[instrument(skip(_staff, state))]
pub async fn show(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<DealId>,
) -> Result<Json<DealView>> {
    let deal = DealRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Deal {id} not found")))?;
    Ok(Json(DealView::at(deal, Utc::now())))
}

/// `POST /api/deals`
#[instrument(skip_all, fields(user_id = %staff.id))]
pub async fn create(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Json(form): Json<DealForm>,
) -> Result<(StatusCode, Json<DealView>)> {
    let input = form.into_input()?;
    ensure_product(&state, input.product_id).await?;

    let deal = DealRepository::new(state.pool()).create(&input).await?;

    tracing::info!(deal_id = %deal.id, coupon_code = %deal.coupon_code, "Deal created");
    Ok((StatusCode::CREATED, Json(DealView::at(deal, Utc::now()))))
}

/// `PUT /api/deals/{id}`
#[instrument(skip_all, fields(user_id = %staff.id, deal_id = %id))]
pub async fn update(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DealId>,
    Json(form): Json<DealForm>,
) -> Result<Json<DealView>> {
    let input = form.into_input()?;
    ensure_product(&state, input.product_id).await?;

    let deal = DealRepository::new(state.pool()).update(id, &input).await?;

    tracing::info!(coupon_code = %deal.coupon_code, "Deal updated");
    Ok(Json(DealView::at(deal, Utc::now())))
}

/// `DELETE /api/deals/{id}`
#[instrument(skip_all, fields(user_id = %staff.id, deal_id = %id))]
pub async fn delete(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<DealId>,
) -> Result<StatusCode> {
    DealRepository::new(state.pool()).delete(id).await?;

    tracing::info!("Deal deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn form(json: serde_json::Value) -> DealForm {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_code_normalised() {
        let input = form(serde_json::json!({
            "title": "Monsoon sale",
            "coupon_code": "  monsoon-25 ",
            "deal_price": "7499"
        }))
        .into_input()
        .unwrap();

        assert_eq!(input.coupon_code, "MONSOON-25");
        assert!(input.product_id.is_none());
        assert!(input.is_active);
    }

    #[test]
    fn test_code_rules() {
        assert!(coupon_code("   ").is_err());
        assert!(coupon_code("SAVE 10").is_err());
        assert!(coupon_code(&"X".repeat(33)).is_err());
        assert_eq!(coupon_code("diwali_24").unwrap(), "DIWALI_24");
    }

    #[test]
    fn test_window_order() {
        let result = form(serde_json::json!({
            "title": "Backwards",
            "coupon_code": "OOPS",
            "deal_price": "100",
            "starts_at": "2026-11-01T00:00:00Z",
            "expires_at": "2026-10-01T00:00:00Z"
        }))
        .into_input();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_negative_price_rejected() {
        let result = form(serde_json::json!({
            "title": "Refund",
            "coupon_code": "NEG",
            "deal_price": "-1"
        }))
        .into_input();
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_view_reports_liveness() {
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap();
        let deal = Deal {
            id: DealId::new(1),
            title: "Festive".to_owned(),
            description: None,
            product_id: Some(ProductId::new(4)),
            product_name: Some("Sonic Jet Pump".to_owned()),
            coupon_code: "FESTIVE".to_owned(),
            deal_price: Decimal::from(5999),
            starts_at: None,
            expires_at: Some(Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        let view = DealView::at(deal, now);
        assert!(!view.is_live);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["coupon_code"], "FESTIVE");
        assert_eq!(json["is_live"], false);
    }
}
