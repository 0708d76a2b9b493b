//! Staff bearer tokens.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use sonic_core::{UserId, UserRole};

use super::AuthError;
use crate::models::User;

/// Claims carried by a staff token. `sub` is the user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffClaims {
    pub sub: String,
    pub username: String,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl StaffClaims {
    /// The user id in `sub`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if `sub` is not a user id.
    pub fn user_id(&self) -> Result<UserId, AuthError> {
        self.sub
            .parse()
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))
    }
}

/// A signed token and when it expires.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues and verifies staff tokens.
#[derive(Clone)]
pub struct StaffTokens {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl StaffTokens {
    /// Create a token service with an HMAC secret.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::default();
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation,
            ttl,
        }
    }

    /// Issue a token for `user`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signing` if the token cannot be encoded.
    pub fn issue(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let iat = now.timestamp();
        let claims = StaffClaims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            role: user.role,
            iat,
            exp: iat.saturating_add(ttl_secs),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(AuthError::Signing)?;

        Ok(IssuedToken {
            token,
            expires_at: DateTime::from_timestamp(claims.exp, 0).unwrap_or(DateTime::UNIX_EPOCH),
        })
    }

    /// Verify a token and return its claims.
    ///
    /// Checkout tokens signed with the same secret fail here: they carry
    /// neither a username nor a role, and their subject is not a user id.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` once `exp` has passed and
    /// `AuthError::InvalidToken` for anything else wrong with the token.
    pub fn verify(&self, token: &str) -> Result<StaffClaims, AuthError> {
        let claims = jsonwebtoken::decode::<StaffClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        claims.user_id()?;
        Ok(claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use sonic_core::Email;

    use super::*;
    use crate::config::tests::TEST_JWT_SECRET;

    fn tokens(ttl_secs: u64) -> StaffTokens {
        StaffTokens::new(&SecretString::from(TEST_JWT_SECRET), Duration::from_secs(ttl_secs))
    }

    fn user(role: UserRole) -> User {
        User {
            id: UserId::new(7),
            username: "meera".to_owned(),
            email: Email::parse("meera@sonicindustries.in").unwrap(),
            password_hash: String::new(),
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let svc = tokens(3600);
        let issued = svc.issue(&user(UserRole::Editor), Utc::now()).unwrap();
        let claims = svc.verify(&issued.token).unwrap();

        assert_eq!(claims.user_id().unwrap(), UserId::new(7));
        assert_eq!(claims.username, "meera");
        assert_eq!(claims.role, UserRole::Editor);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token() {
        let svc = tokens(60);
        let issued = svc
            .issue(&user(UserRole::Admin), Utc::now() - chrono::Duration::hours(1))
            .unwrap();
        assert!(matches!(svc.verify(&issued.token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issued = tokens(3600).issue(&user(UserRole::Admin), Utc::now()).unwrap();
        let verifier = StaffTokens::new(
            &SecretString::from("another$Secret!With#Enough&Bits42"),
            Duration::from_secs(3600),
        );
        assert!(matches!(verifier.verify(&issued.token), Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_checkout_token_rejected() {
        #[derive(Serialize)]
        struct CheckoutLike {
            sub: &'static str,
            product_id: i32,
            quantity: u32,
            exp: i64,
        }

        let token = jsonwebtoken::encode(
            &Header::default(),
            &CheckoutLike {
                sub: "checkout",
                product_id: 3,
                quantity: 1,
                exp: Utc::now().timestamp() + 600,
            },
            &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
        )
        .unwrap();

        assert!(matches!(tokens(3600).verify(&token), Err(AuthError::InvalidToken(_))));
    }
}
