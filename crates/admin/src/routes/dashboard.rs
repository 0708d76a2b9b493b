//! Dashboard summary.

use axum::{Json, extract::State};
use tracing::instrument;

use crate::db::DashboardRepository;
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::models::DashboardSummary;
use crate::state::AppState;

/// `GET /api/dashboard/summary`
#[instrument(skip_all, fields(user_id = %staff.id))]
pub async fn summary(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>> {
    let summary = DashboardRepository::new(state.pool()).summary().await?;
    Ok(Json(summary))
}
