//! Staff authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during staff authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown identifier or wrong password. Deliberately one variant.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] sonic_core::EmailError),

    /// Username is empty or malformed.
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    /// Password does not meet requirements.
    #[error("password too weak: {0}")]
    WeakPassword(String),

    /// Argon2 hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Bearer token `exp` has passed.
    #[error("token expired")]
    TokenExpired,

    /// Bearer token is malformed, tampered with or not a staff token.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token signing failed.
    #[error("failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}
