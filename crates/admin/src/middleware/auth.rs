//! Authentication extractors for admin routes.
//!
//! Every `/api` route except login takes one of [`RequireStaff`],
//! [`RequireEditor`] or [`RequireAdmin`]. Each reads the `Authorization:
//! Bearer` token, verifies it, and reloads the user so that deleted
//! accounts and role changes take effect before the token expires.
//!
//! A missing or bad token is a 401. A valid token with too low a role is
//! a 403.
//!
//! # Example
//!
//! ```rust,ignore
//! async fn delete_order(
//!     RequireAdmin(staff): RequireAdmin,
//!     Path(id): Path<OrderId>,
//! ) -> Result<StatusCode> { ... }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use serde::Serialize;

use sonic_core::{UserId, UserRole};

use crate::db::UserRepository;
use crate::error::{AppError, set_sentry_user};
use crate::services::AuthError;
use crate::state::AppState;

/// The authenticated staff member behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrentStaff {
    pub id: UserId,
    pub username: String,
    pub role: UserRole,
}

/// Token from an `Authorization: Bearer <token>` header, if present.
pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verify the bearer token, reload the user and check the role.
async fn authorize(parts: &Parts, state: &AppState, required: UserRole) -> Result<CurrentStaff, AppError> {
    let token = bearer_token(parts)
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))?;

    let claims = state.tokens().verify(token)?;
    let user_id = claims.user_id()?;

    let user = UserRepository::new(state.pool())
        .get(user_id)
        .await?
        .ok_or_else(|| AppError::Auth(AuthError::InvalidToken("account no longer exists".to_string())))?;

    set_sentry_user(user.id, &user.username);

    if !user.role.satisfies(required) {
        tracing::warn!(
            user_id = %user.id,
            role = %user.role,
            required = %required,
            path = %parts.uri.path(),
            "Insufficient role"
        );
        return Err(AppError::Forbidden(format!("Requires the {required} role")));
    }

    Ok(CurrentStaff {
        id: user.id,
        username: user.username,
        role: user.role,
    })
}

macro_rules! role_extractor {
    ($(#[$meta:meta])* $name:ident => $role:expr) => {
        $(#[$meta])*
        pub struct $name(pub CurrentStaff);

        impl FromRequestParts<AppState> for $name {
            type Rejection = AppError;

            async fn from_request_parts(
                parts: &mut Parts,
                state: &AppState,
            ) -> Result<Self, Self::Rejection> {
                authorize(parts, state, $role).await.map(Self)
            }
        }
    };
}

role_extractor!(
    /// Any signed-in staff member (viewer and up).
    RequireStaff => UserRole::Viewer
);

role_extractor!(
    /// Staff allowed to change records (editor or admin).
    RequireEditor => UserRole::Editor
);

role_extractor!(
    /// Admins only.
    RequireAdmin => UserRole::Admin
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/orders");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts(Some("Basic dXNlcjpwYXNz"))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer   "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
