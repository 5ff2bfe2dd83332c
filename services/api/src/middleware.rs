//! Authentication middleware for session tokens
//!
//! A token is read from the `session` cookie first and the
//! `Authorization: Bearer` header second. Authenticated requests carry the
//! loaded [`User`] in their extensions.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use common::models::User;
use tracing::error;

use crate::{error::ApiError, settings::SESSION_COOKIE, state::AppState};

/// Pull the session token out of the request headers
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Resolve a token to its user
pub async fn authenticate(state: &AppState, token: &str) -> Result<User, ApiError> {
    let claims = state.jwt_service.validate_token(token).map_err(|_| {
        ApiError::Unauthorized("Session expired, please log in again".to_string())
    })?;

    let is_blacklisted = state
        .jwt_service
        .is_token_blacklisted(&state.redis_pool, token)
        .await
        .map_err(|e| {
            error!("Failed to check if token is blacklisted: {}", e);
            ApiError::internal()
        })?;

    if is_blacklisted {
        return Err(ApiError::Unauthorized(
            "Session expired, please log in again".to_string(),
        ));
    }

    state
        .user_repository
        .find_by_id(claims.sub)
        .await
        .map_err(|e| {
            error!("Failed to load user {}: {}", claims.sub, e);
            ApiError::internal()
        })?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))
}

/// Reject requests without a valid session
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(req.headers()).ok_or_else(ApiError::unauthorized)?;
    let user = authenticate(&state, &token).await?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, header::COOKIE};

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; session=abc.def.ghi"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_token_from_bearer_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("session=from-cookie"));
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(extract_token(&headers).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_no_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_token(&headers), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(extract_token(&headers), None);
    }
}
