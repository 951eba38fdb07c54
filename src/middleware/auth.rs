use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::api::AppState;
use crate::auth::{bearer_token, validate_jwt, AuthError, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from JWT
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            tenant_id: claims.tenant_id,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = authenticate(&headers, &state.config.security.jwt_secret)?;
    request.extensions_mut().insert(auth_user);
    Ok(next.run(request).await)
}

fn authenticate(headers: &HeaderMap, secret: &str) -> Result<AuthUser, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .map(|v| v.to_str().map_err(|_| AuthError::InvalidToken("Invalid Authorization header format".to_string())))
        .transpose()?;
    let token = bearer_token(header)?;
    let claims = validate_jwt(token, secret)?;
    Ok(AuthUser::from(claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::generate_jwt;
    use axum::http::HeaderValue;

    #[test]
    fn authenticates_valid_bearer() {
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), 1);
        let token = generate_jwt(&claims, "s3cret").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token)).unwrap());

        let user = authenticate(&headers, "s3cret").unwrap();
        assert_eq!(user.tenant_id, claims.tenant_id);
        assert_eq!(user.user_id, claims.sub);
    }

    #[test]
    fn missing_header_is_rejected() {
        assert!(matches!(authenticate(&HeaderMap::new(), "s3cret"), Err(AuthError::MissingToken)));
    }
}
