//! API service routes

use axum::{
    Json, Router,
    extract::State,
    middleware,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::json;

use crate::{middleware::auth_middleware, state::AppState};

mod auth;
mod check_ins;
mod contacts;
mod email;
mod reminder;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/password", post(auth::change_password))
        .route("/check-ins", post(check_ins::check_in))
        .route("/check-ins/status", get(check_ins::status))
        .route(
            "/contacts",
            get(contacts::list_contacts).post(contacts::create_contact),
        )
        .route("/contacts/:id", delete(contacts::delete_contact))
        .route(
            "/reminder",
            get(reminder::get_settings).put(reminder::update_settings),
        )
        .route("/email/test", post(email::send_test_email))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);
    let redis = state.redis_pool.health_check().await.unwrap_or(false);

    Json(json!({
        "status": if database && redis { "ok" } else { "degraded" },
        "service": "api",
        "database": database,
        "redis": redis,
    }))
}
