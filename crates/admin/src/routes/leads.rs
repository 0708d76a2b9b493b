//! Lead follow-up.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::instrument;

use sonic_core::{LeadId, LeadStatus};

use crate::db::LeadRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireEditor, RequireStaff};
use crate::models::Lead;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LeadsQuery {
    pub status: Option<LeadStatus>,
}

#[derive(Debug, Deserialize)]
pub struct LeadStatusUpdate {
    pub status: LeadStatus,
}

/// `GET /api/leads`
#[instrument(skip(_staff, state))]
pub async fn list(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Query(query): Query<LeadsQuery>,
) -> Result<Json<Vec<Lead>>> {
    let leads = LeadRepository::new(state.pool()).list(query.status).await?;
    Ok(Json(leads))
}

/// `GET /api/leads/{id}`
#[instrument(skip(_staff, state))]
pub async fn show(
    RequireStaff(_staff): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<LeadId>,
) -> Result<Json<Lead>> {
    LeadRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Lead {id} not found")))
}

/// `PUT /api/leads/{id}/status`
#[instrument(skip_all, fields(user_id = %staff.id, lead_id = %id, status = %body.status))]
pub async fn update_status(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<LeadId>,
    Json(body): Json<LeadStatusUpdate>,
) -> Result<Json<Lead>> {
    let lead = LeadRepository::new(state.pool())
        .set_status(id, body.status)
        .await?;

    tracing::info!("Lead status updated");
    Ok(Json(lead))
}

/// `DELETE /api/leads/{id}`
#[instrument(skip_all, fields(user_id = %staff.id, lead_id = %id))]
pub async fn delete(
    RequireEditor(staff): RequireEditor,
    State(state): State<AppState>,
    Path(id): Path<LeadId>,
) -> Result<StatusCode> {
    LeadRepository::new(state.pool()).delete(id).await?;

    tracing::info!("Lead deleted");
    Ok(StatusCode::NO_CONTENT)
}
