//! Stateless HS256 bearer tokens carrying the user id.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::ServiceError;

/// Signing configuration, read once at startup and never mutated.
#[derive(Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub ttl: Duration,
}

impl TokenConfig {
    pub fn new(secret: impl Into<String>, ttl_hours: i64) -> Self {
        Self { secret: secret.into(), ttl: Duration::hours(ttl_hours) }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: usize,
    exp: usize,
}

#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(cfg: &TokenConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: cfg.ttl,
        }
    }

    pub fn issue(&self, user_id: Uuid) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("token error: {}", e)))
    }

    /// Bad signature, expiry and malformed input all collapse to `Unauthenticated`.
    pub fn verify(&self, token: &str) -> Result<Uuid, ServiceError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())
            .map_err(|_| ServiceError::Unauthenticated("invalid or expired token".into()))?;
        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServiceError::Unauthenticated("invalid or expired token".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issue_then_verify() {
        let issuer = TokenIssuer::new(&TokenConfig::new("secret", 1));
        let id = Uuid::new_v4();
        let token = issuer.issue(id).unwrap();
        assert_eq!(issuer.verify(&token).unwrap(), id);
    }

    #[test]
    fn wrong_key_is_unauthenticated() {
        let a = TokenIssuer::new(&TokenConfig::new("key-a", 1));
        let b = TokenIssuer::new(&TokenConfig::new("key-b", 1));
        let token = a.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(b.verify(&token), Err(ServiceError::Unauthenticated(_))));
    }

    #[test]
    fn expired_token_is_rejected() {
        // past the default 60s leeway
        let issuer = TokenIssuer::new(&TokenConfig { secret: "s".into(), ttl: Duration::minutes(-5) });
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(issuer.verify(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let issuer = TokenIssuer::new(&TokenConfig::new("s", 1));
        assert!(matches!(issuer.verify("not.a.jwt"), Err(ServiceError::Unauthenticated(_))));
    }
}
