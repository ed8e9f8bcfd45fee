//! HS256 bearer tokens whose subject is the username.

use super::AuthError;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

/// Claims carried by every issued token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the authenticated user.
    pub sub: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
    /// Issue time, seconds since the Unix epoch.
    pub iat: u64,
}

/// Issues and validates bearer tokens.
pub trait TokenIssuer {
    fn issue(&self, subject: &str) -> Result<String, AuthError>;
    /// Returns the claims of a valid, unexpired token.
    fn validate(&self, token: &str) -> Result<Claims, AuthError>;
}

#[derive(Clone)]
pub struct JwtTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtTokenIssuer {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a token as if the current time were `issued_at` (epoch seconds).
    pub fn issue_at(&self, subject: &str, issued_at: u64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: subject.to_string(),
            exp: issued_at.saturating_add(self.ttl.as_secs()),
            iat: issued_at,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Token(err.to_string()))
    }
}

impl TokenIssuer for JwtTokenIssuer {
    fn issue(&self, subject: &str) -> Result<String, AuthError> {
        self.issue_at(subject, now_secs())
    }

    fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|err| AuthError::InvalidToken(err.to_string()))?;
        if data.claims.sub.is_empty() {
            return Err(AuthError::InvalidToken("empty subject".to_string()));
        }
        Ok(data.claims)
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::{now_secs, JwtTokenIssuer, TokenIssuer, DEFAULT_TOKEN_TTL};
    use crate::auth::AuthError;
    use std::time::Duration;

    #[test]
    fn issued_token_verifies_with_subject_and_ttl() {
        let issuer = JwtTokenIssuer::new(b"secret", DEFAULT_TOKEN_TTL);
        let token = issuer.issue("test-username").unwrap();
        let claims = issuer.validate(&token).unwrap();
        assert_eq!(claims.sub, "test-username");
        assert_eq!(claims.exp - claims.iat, 30 * 60);
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = JwtTokenIssuer::new(b"secret", Duration::from_secs(60));
        let token = issuer.issue_at("someone", now_secs() - 3600).unwrap();
        assert!(matches!(
            issuer.validate(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let token = JwtTokenIssuer::new(b"one", DEFAULT_TOKEN_TTL)
            .issue("someone")
            .unwrap();
        let err = JwtTokenIssuer::new(b"two", DEFAULT_TOKEN_TTL)
            .validate(&token)
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn garbage_is_rejected() {
        let issuer = JwtTokenIssuer::new(b"secret", DEFAULT_TOKEN_TTL);
        assert!(issuer.validate("not-a-token").is_err());
    }
}
