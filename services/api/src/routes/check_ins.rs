//! Daily check-in handlers

use axum::{Extension, Json, extract::State, http::StatusCode};
use common::models::{CheckInStatus, User};
use tracing::info;

use crate::{error::ApiResult, models::CheckInResponse, state::AppState};

/// Record today's check-in and return the updated streak
pub async fn check_in(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<(StatusCode, Json<CheckInResponse>)> {
    let check_in = state.engine.record_check_in(user.id).await?;
    let streak_days = state.engine.compute_streak(user.id).await?;

    info!(
        "User {} checked in for {} (streak: {})",
        user.username, check_in.check_in_date, streak_days
    );

    Ok((
        StatusCode::CREATED,
        Json(CheckInResponse {
            success: true,
            check_in,
            streak_days,
        }),
    ))
}

pub async fn status(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> ApiResult<Json<CheckInStatus>> {
    Ok(Json(state.engine.status(user.id).await?))
}
