//! Registration, login and session handlers

use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use common::models::{NewUser, User};
use tracing::{error, info, warn};

use crate::{
    error::{ApiError, ApiResult},
    middleware::{authenticate, extract_token},
    models::{
        AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RegisterRequest,
        UserResponse, non_empty,
    },
    repositories::{hash_password, is_unique_violation, verify_password},
    settings::SESSION_COOKIE,
    state::AppState,
    validation::{validate_email, validate_password, validate_username},
};

const BAD_CREDENTIALS: &str = "Invalid username or password";

fn session_cookie(state: &AppState, token: String) -> Cookie<'static> {
    let max_age = i64::try_from(state.jwt_service.expiry()).unwrap_or(i64::MAX);

    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.cookie_secure)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

fn issue_session(state: &AppState, jar: CookieJar, user: &User) -> ApiResult<CookieJar> {
    let token = state.jwt_service.generate_token(user).map_err(|e| {
        error!("Failed to generate token: {}", e);
        ApiError::internal()
    })?;

    Ok(jar.add(session_cookie(state, token)))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    validate_username(&payload.username).map_err(ApiError::BadRequest)?;
    validate_password(&payload.password).map_err(ApiError::BadRequest)?;
    let email = non_empty(payload.email);
    if let Some(email) = &email {
        validate_email(email).map_err(ApiError::BadRequest)?;
    }

    let existing = state
        .user_repository
        .find_by_username(&payload.username)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::internal()
        })?;
    if existing.is_some() {
        return Err(ApiError::Conflict("Username is already taken".to_string()));
    }

    let password_hash = hash_password(&payload.password).map_err(|e| {
        error!("{}", e);
        ApiError::internal()
    })?;

    let new_user = NewUser {
        username: payload.username,
        email,
        password_hash,
    };
    let user = state
        .user_repository
        .create(&new_user)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("Username is already taken".to_string())
            } else {
                error!("Failed to create user: {}", e);
                ApiError::internal()
            }
        })?;

    let jar = issue_session(&state, jar, &user)?;
    info!("Registered user: {}", user.username);

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            success: true,
            user: UserResponse::from(&user),
        }),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<AuthResponse>)> {
    if payload.username.is_empty() {
        return Err(ApiError::BadRequest("Username is required".to_string()));
    }
    if payload.password.is_empty() {
        return Err(ApiError::BadRequest("Password is required".to_string()));
    }

    info!("Login attempt for user: {}", payload.username);

    if !state.rate_limiter.is_allowed(&payload.username).await {
        warn!("Too many login attempts for user: {}", payload.username);
        return Err(ApiError::TooManyRequests);
    }

    let user = state
        .user_repository
        .find_by_username(&payload.username)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            ApiError::internal()
        })?
        .ok_or_else(|| ApiError::Unauthorized(BAD_CREDENTIALS.to_string()))?;

    let valid = verify_password(&user.password_hash, &payload.password).map_err(|e| {
        error!("Failed to verify password for {}: {}", user.username, e);
        ApiError::internal()
    })?;
    if !valid {
        return Err(ApiError::Unauthorized(BAD_CREDENTIALS.to_string()));
    }

    state.rate_limiter.reset(&payload.username).await;
    let jar = issue_session(&state, jar, &user)?;

    Ok((
        jar,
        Json(AuthResponse {
            success: true,
            user: UserResponse::from(&user),
        }),
    ))
}

/// Current user, or `null` without a valid session
pub async fn me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Option<UserResponse>>> {
    let Some(token) = extract_token(&headers) else {
        return Ok(Json(None));
    };

    match authenticate(&state, &token).await {
        Ok(user) => Ok(Json(Some(UserResponse::from(&user)))),
        Err(ApiError::Unauthorized(_)) => Ok(Json(None)),
        Err(e) => Err(e),
    }
}

/// Blacklist a still-valid token for the rest of its lifetime
async fn revoke(state: &AppState, token: &str) -> anyhow::Result<()> {
    let Ok(claims) = state.jwt_service.validate_token(token) else {
        return Ok(());
    };

    let expiry = claims.remaining_lifetime()?;
    state
        .jwt_service
        .blacklist_token(&state.redis_pool, token, expiry)
        .await?;
    info!("Logged out user: {}", claims.username);
    Ok(())
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    if let Some(token) = extract_token(&headers) {
        if let Err(e) = revoke(&state, &token).await {
            error!("Failed to blacklist token: {}", e);
        }
    }

    // Always emit the removal, even when the token came from a header
    let mut expired = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    expired.make_removal();
    let jar = jar.add(expired);
    (jar, Json(MessageResponse::ok("Logged out successfully")))
}

/// Change the current user's password
pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let valid = verify_password(&user.password_hash, &payload.current_password).map_err(|e| {
        error!("Failed to verify password for {}: {}", user.username, e);
        ApiError::internal()
    })?;
    if !valid {
        return Err(ApiError::BadRequest("Current password is incorrect".to_string()));
    }

    validate_password(&payload.new_password).map_err(ApiError::BadRequest)?;
    if payload.new_password != payload.confirm_password {
        return Err(ApiError::BadRequest("Passwords do not match".to_string()));
    }

    let password_hash = hash_password(&payload.new_password).map_err(|e| {
        error!("{}", e);
        ApiError::internal()
    })?;

    let updated = state
        .user_repository
        .update_password(user.id, &password_hash)
        .await
        .map_err(|e| {
            error!("Failed to update password: {}", e);
            ApiError::internal()
        })?;
    if !updated {
        return Err(ApiError::unauthorized());
    }

    Ok(Json(MessageResponse::ok("Password updated")))
}
