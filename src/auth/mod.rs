use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub tenant_id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(tenant_id: Uuid, user_id: Uuid, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            tenant_id,
            iat: now.timestamp(),
            exp,
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT secret")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims, secret: &str) -> Result<String, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, AuthError> {
    if secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::Expired,
            _ => AuthError::InvalidToken(e.to_string()),
        })
}

/// Pull the token out of an `Authorization: Bearer ...` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let value = header.ok_or(AuthError::MissingToken)?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::InvalidToken("expected 'Bearer <token>'".to_string()))?;
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn round_trips_claims() {
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), 1);
        let token = generate_jwt(&claims, SECRET).unwrap();
        assert_eq!(validate_jwt(&token, SECRET).unwrap(), claims);
    }

    #[test]
    fn rejects_wrong_secret_and_expired_tokens() {
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), 1);
        let token = generate_jwt(&claims, SECRET).unwrap();
        assert!(matches!(validate_jwt(&token, "other"), Err(AuthError::InvalidToken(_))));

        let mut old = claims.clone();
        old.iat -= 7200;
        old.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt(&old, SECRET).unwrap();
        assert!(matches!(validate_jwt(&token, SECRET), Err(AuthError::Expired)));
    }

    #[test]
    fn empty_secret_is_refused() {
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), 1);
        assert!(matches!(generate_jwt(&claims, ""), Err(AuthError::InvalidSecret)));
    }

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert!(matches!(bearer_token(None), Err(AuthError::MissingToken)));
        assert!(matches!(bearer_token(Some("Basic xyz")), Err(AuthError::InvalidToken(_))));
    }
}
