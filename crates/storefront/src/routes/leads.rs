//! Contact form handler.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sonic_core::{Email, Phone};

use crate::db::LeadRepository;
use crate::error::{AppError, Result};
use crate::models::NewLead;
use crate::state::AppState;

const MAX_MESSAGE_LEN: usize = 5000;

/// Request body for `POST /api/leads`.
#[derive(Debug, Deserialize)]
pub struct LeadForm {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    pub message: String,
    #[serde(default)]
    pub source: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LeadCreated {
    pub success: bool,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl LeadForm {
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for a blank name or message, a bad
    /// email, or a bad phone number when one is given.
    pub fn into_lead(self) -> Result<NewLead> {
        let name = self.name.trim().to_string();
        let message = self.message.trim().to_string();

        if name.is_empty() {
            return Err(AppError::BadRequest("name is required".to_string()));
        }
        if message.is_empty() {
            return Err(AppError::BadRequest("message is required".to_string()));
        }
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::BadRequest(format!(
                "message must be at most {MAX_MESSAGE_LEN} characters"
            )));
        }

        let email = Email::parse(&self.email).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let phone = non_empty(self.phone)
            .map(|p| Phone::parse(&p))
            .transpose()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        Ok(NewLead {
            name,
            email,
            phone,
            company: non_empty(self.company),
            message,
            source: non_empty(self.source),
        })
    }
}

/// `POST /api/leads`
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    Json(form): Json<LeadForm>,
) -> Result<(StatusCode, Json<LeadCreated>)> {
    let lead = form.into_lead()?;
    let id = LeadRepository::new(state.pool()).create(&lead).await?;

    tracing::info!(lead_id = %id, source = lead.source.as_deref().unwrap_or("website"), "Lead captured");

    Ok((StatusCode::CREATED, Json(LeadCreated { success: true })))
}
