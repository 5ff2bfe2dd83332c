//! Email delivery check

use axum::{Extension, Json, extract::State};
use common::models::User;
use mailer::templates;
use tracing::{error, info};

use crate::{
    error::{ApiError, ApiResult},
    models::{MessageResponse, TestEmailRequest},
    state::AppState,
    validation::validate_email,
};

/// Send a test message to confirm SMTP works
pub async fn send_test_email(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<TestEmailRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let address = payload.email.trim();
    validate_email(address).map_err(ApiError::BadRequest)?;

    info!("User {} requested a test email to {}", user.username, address);

    state
        .email_sender
        .send(&templates::test_email(address))
        .await
        .map_err(|e| {
            error!("Test email to {} failed: {}", address, e);
            ApiError::InternalServerError(
                "Failed to send email, check the SMTP settings or try again later".to_string(),
            )
        })?;

    Ok(Json(MessageResponse::ok(format!("Test email sent to {}", address))))
}
