//! Staff authentication service.
//!
//! Passwords are stored as Argon2id PHC strings. A successful login issues
//! an HS256 bearer token carrying the user's id, username and role. The
//! route extractors reload the user, so the stored role wins over the
//! token's.

mod error;
mod tokens;

pub use error::AuthError;
pub use tokens::{IssuedToken, StaffClaims, StaffTokens};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use std::sync::LazyLock;

use sqlx::PgPool;

use sonic_core::{Email, UserRole};

use crate::db::UserRepository;
use crate::models::{NewUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Longest accepted username.
const MAX_USERNAME_LENGTH: usize = 64;

/// Verified when the identifier matches no account, so a miss costs the
/// same Argon2id work as a wrong password.
static UNKNOWN_USER_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("no-such-staff-account").ok());

/// Unvalidated fields for a new staff account.
#[derive(Debug, Clone)]
pub struct CreateUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub role: UserRole,
}

/// Authentication service for staff users.
pub struct AuthService<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Check a username-or-email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown user or a wrong
    /// password, without saying which.
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> Result<User, AuthError> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(user) = UserRepository::new(self.pool)
            .find_by_identifier(identifier)
            .await?
        else {
            return Err(reject_unknown_user(password));
        };

        verify_password(password, &user.password_hash)?;

        Ok(user)
    }

    /// Validate and store a new staff account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername`, `AuthError::InvalidEmail` or
    /// `AuthError::WeakPassword` for bad input.
    /// Returns `AuthError::Repository` with a conflict if the username or
    /// email is taken.
    pub async fn create_user(&self, input: &CreateUser<'_>) -> Result<User, AuthError> {
        let username = validate_username(input.username)?;
        let email = Email::parse(input.email)?;
        validate_password(input.password)?;

        let user = NewUser {
            username,
            email,
            password_hash: hash_password(input.password)?,
            role: input.role,
        };

        let created = UserRepository::new(self.pool).create(&user).await?;
        tracing::info!(user_id = %created.id, role = %created.role, "Staff user created");
        Ok(created)
    }
}

/// Trim a username and check its shape.
fn validate_username(username: &str) -> Result<String, AuthError> {
    let username = username.trim();

    if username.is_empty() {
        return Err(AuthError::InvalidUsername("username is required".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(AuthError::InvalidUsername(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    // No '@', so a login identifier is never both a username and an email
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(AuthError::InvalidUsername(
            "username may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }

    Ok(username.to_string())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Burn one Argon2id verify for an identifier with no account.
fn reject_unknown_user(password: &str) -> AuthError {
    if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
        let _ = verify_password(password, hash);
    }
    AuthError::InvalidCredentials
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("pump-room-42").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("pump-room-42", &hash).is_ok());
        assert!(matches!(
            verify_password("pump-room-43", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_unknown_user_verifies_with_same_params() {
        let params = |hash: &str| hash.split('$').take(4).collect::<Vec<_>>().join("$");

        let dummy = UNKNOWN_USER_HASH.as_deref().unwrap();
        let real = hash_password("pump-room-42").unwrap();
        assert_eq!(params(dummy), params(&real));

        assert!(matches!(
            reject_unknown_user("pump-room-42"),
            AuthError::InvalidCredentials
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("same-password").unwrap(), hash_password("same-password").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_length() {
        assert!(matches!(validate_password("short"), Err(AuthError::WeakPassword(_))));
        assert!(validate_password("eightchr").is_ok());
    }

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username("  meera.k ").unwrap(), "meera.k");
        assert!(validate_username("").is_err());
        assert!(validate_username("meera@sonic").is_err());
        assert!(validate_username(&"a".repeat(65)).is_err());
    }
}
