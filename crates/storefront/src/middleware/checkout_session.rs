//! Checkout session extractor.
//!
//! Checkout mutations take a `CheckoutSession` argument, which verifies the
//! `Authorization: Bearer <token>` header against the server clock before the
//! handler body runs.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;
use crate::services::{CheckoutClaims, SessionError};
use crate::state::AppState;

/// Extractor that requires a live checkout session.
///
/// # Example
///
/// ```rust,ignore
/// async fn quote(
///     State(state): State<AppState>,
///     CheckoutSession(claims): CheckoutSession,
/// ) -> Result<Json<Quote>> {
///     // claims.product_id and claims.quantity are trusted here
/// }
/// ```
pub struct CheckoutSession(pub CheckoutClaims);

/// Token from an `Authorization: Bearer` header.
pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for CheckoutSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| SessionError::Invalid("missing bearer token".to_string()))?;

        let claims = state.sessions().verify(token).inspect_err(|e| {
            tracing::debug!(error = %e, "Rejected checkout session");
        })?;

        Ok(Self(claims))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/checkout/quote");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(&parts(Some("Bearer abc.def.ghi"))), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&parts(Some("Basic Zm9vOmJhcg=="))), None);
        assert_eq!(bearer_token(&parts(Some("Bearer "))), None);
        assert_eq!(bearer_token(&parts(None)), None);
    }
}
