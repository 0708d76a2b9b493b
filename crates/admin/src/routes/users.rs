//! Staff login and user management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use sonic_core::{UserId, UserRole};

use crate::db::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireStaff};
use crate::models::User;
use crate::services::AuthService;
use crate::services::auth::CreateUser;
use crate::state::AppState;

/// Body of `POST /api/users/login`.
#[derive(Deserialize)]
pub struct LoginRequest {
    /// Username or email.
    pub identifier: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// `POST /api/users/login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    let user = match AuthService::new(state.pool())
        .authenticate(&req.identifier, &req.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Failed login attempt");
            return Err(e.into());
        }
    };

    let issued = state.tokens().issue(&user, Utc::now())?;
    tracing::info!(user_id = %user.id, role = %user.role, "Staff login");

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user,
    }))
}

/// `GET /api/users/me`
#[instrument(skip_all, fields(user_id = %staff.id))]
pub async fn me(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
) -> Result<Json<User>> {
    let user = UserRepository::new(state.pool())
        .get(staff.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// `GET /api/users`
#[instrument(skip_all)]
pub async fn list(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<User>>> {
    let users = UserRepository::new(state.pool()).list().await?;
    Ok(Json(users))
}

/// Body of `POST /api/users`.
#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<UserRole>,
}

/// `POST /api/users`
///
/// New accounts are viewers unless a role is given.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .create_user(&CreateUser {
            username: &req.username,
            email: &req.email,
            password: &req.password,
            role: req.role.unwrap_or(UserRole::Viewer),
        })
        .await?;

    Ok((StatusCode::CREATED, Json(user)))
}

/// `DELETE /api/users/{id}`
#[instrument(skip_all, fields(admin_id = %admin.id, user_id = %id))]
pub async fn delete(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<StatusCode> {
    if id == admin.id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".to_string(),
        ));
    }

    UserRepository::new(state.pool()).delete(id).await?;
    tracing::info!("Staff user deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_debug_redacts_password() {
        let req: LoginRequest = serde_json::from_value(serde_json::json!({
            "identifier": "meera",
            "password": "pump-room-42"
        }))
        .unwrap();

        let debug_output = format!("{req:?}");
        assert!(debug_output.contains("meera"));
        assert!(!debug_output.contains("pump-room-42"));
    }

    #[test]
    fn test_create_request_role_optional() {
        let req: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "username": "ravi",
            "email": "ravi@sonicindustries.in",
            "password": "long-enough"
        }))
        .unwrap();
        assert!(req.role.is_none());

        let req: CreateUserRequest = serde_json::from_value(serde_json::json!({
            "username": "ravi",
            "email": "ravi@sonicindustries.in",
            "password": "long-enough",
            "role": "editor"
        }))
        .unwrap();
        assert_eq!(req.role, Some(UserRole::Editor));
    }
}
