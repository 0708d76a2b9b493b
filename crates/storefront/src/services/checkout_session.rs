//! Checkout session tokens.
//!
//! Starting checkout issues a short-lived HS256 JWT naming the product and
//! quantity. Every later checkout call (quote, COD order, payment order)
//! presents it as a bearer token and the server rejects it once `exp` has
//! passed. The client only uses `exp` to drive its countdown.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use sonic_core::ProductId;

/// `sub` claim of every checkout token.
pub const CHECKOUT_SUBJECT: &str = "checkout";

/// Errors from issuing or verifying checkout tokens.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `exp` has passed.
    #[error("checkout session expired")]
    Expired,

    /// Bad signature, wrong subject or malformed token.
    #[error("invalid checkout session: {0}")]
    Invalid(String),

    /// Signing failed.
    #[error("failed to sign checkout session: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Claims carried by a checkout token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutClaims {
    pub sub: String,
    pub product_id: ProductId,
    pub quantity: u32,
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl CheckoutClaims {
    /// Seconds left before the token expires, never negative.
    #[must_use]
    pub fn expires_in_secs(&self, now: DateTime<Utc>) -> i64 {
        (self.exp - now.timestamp()).max(0)
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::UNIX_EPOCH)
    }
}

/// A freshly issued token and when it stops working.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedSession {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub expires_in_secs: i64,
}

/// Issues and verifies checkout tokens.
#[derive(Clone)]
pub struct CheckoutSessions {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl CheckoutSessions {
    /// Create a token service with an HMAC secret.
    #[must_use]
    pub fn new(secret: &secrecy::SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.sub = Some(CHECKOUT_SUBJECT.to_owned());

        Self {
            encoding_key: EncodingKey::from_secret(bytes),
            decoding_key: DecodingKey::from_secret(bytes),
            validation,
            ttl,
        }
    }

    /// Issue a token for `quantity` units of a product.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Signing` if the token cannot be encoded.
    pub fn issue(
        &self,
        product_id: ProductId,
        quantity: u32,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, SessionError> {
        let ttl_secs = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let iat = now.timestamp();
        let claims = CheckoutClaims {
            sub: CHECKOUT_SUBJECT.to_owned(),
            product_id,
            quantity,
            jti: Uuid::new_v4(),
            iat,
            exp: iat.saturating_add(ttl_secs),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(SessionError::Signing)?;

        Ok(IssuedSession {
            token,
            expires_at: claims.expires_at(),
            expires_in_secs: claims.expires_in_secs(now),
        })
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Expired` once `exp` has passed and
    /// `SessionError::Invalid` for anything else wrong with the token.
    pub fn verify(&self, token: &str) -> Result<CheckoutClaims, SessionError> {
        jsonwebtoken::decode::<CheckoutClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(e.to_string()),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn sessions(ttl_secs: u64) -> CheckoutSessions {
        CheckoutSessions::new(
            &SecretString::from("k9$Qv2!xLm7@Rt4#Zp8&Wn3^Hs6*Jd1%"),
            Duration::from_secs(ttl_secs),
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let svc = sessions(900);
        let now = Utc::now();
        let issued = svc.issue(ProductId::new(12), 3, now).unwrap();
        assert_eq!(issued.expires_in_secs, 900);

        let claims = svc.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, CHECKOUT_SUBJECT);
        assert_eq!(claims.product_id, ProductId::new(12));
        assert_eq!(claims.quantity, 3);
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_expired_token() {
        let svc = sessions(60);
        let issued = svc
            .issue(ProductId::new(1), 1, Utc::now() - chrono::Duration::minutes(5))
            .unwrap();
        assert!(matches!(svc.verify(&issued.token), Err(SessionError::Expired)));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let issuer = sessions(900);
        let verifier = CheckoutSessions::new(
            &SecretString::from("another$Secret!With#Enough&Bits42"),
            Duration::from_secs(900),
        );
        let issued = issuer.issue(ProductId::new(1), 1, Utc::now()).unwrap();
        assert!(matches!(verifier.verify(&issued.token), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let svc = sessions(900);
        let issued = svc.issue(ProductId::new(1), 1, Utc::now()).unwrap();
        let mut token = issued.token;
        token.push('x');
        assert!(matches!(svc.verify(&token), Err(SessionError::Invalid(_))));
        assert!(matches!(svc.verify("not.a.token"), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_foreign_subject_rejected() {
        #[derive(Serialize)]
        struct StaffLike {
            sub: String,
            exp: i64,
        }

        let secret = "k9$Qv2!xLm7@Rt4#Zp8&Wn3^Hs6*Jd1%";
        let token = jsonwebtoken::encode(
            &Header::default(),
            &StaffLike {
                sub: "7".to_owned(),
                exp: Utc::now().timestamp() + 600,
            },
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(sessions(900).verify(&token), Err(SessionError::Invalid(_))));
    }

    #[test]
    fn test_expires_in_never_negative() {
        let claims = CheckoutClaims {
            sub: CHECKOUT_SUBJECT.to_owned(),
            product_id: ProductId::new(1),
            quantity: 1,
            jti: Uuid::nil(),
            iat: 0,
            exp: 10,
        };
        assert_eq!(claims.expires_in_secs(Utc::now()), 0);
    }
}
