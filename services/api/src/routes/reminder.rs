//! Reminder settings handlers

use axum::{Extension, Json, extract::State};
use common::models::{DEFAULT_REMINDER_HOUR, ReminderSettings, User};
use tracing::error;

use crate::{
    error::{ApiError, ApiResult},
    models::{ReminderUpdateResponse, UpdateReminderRequest, non_empty},
    state::AppState,
    validation::{validate_email, validate_reminder_hour},
};

pub async fn get_settings(Extension(user): Extension<User>) -> Json<ReminderSettings> {
    Json(user.reminder_settings())
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<UpdateReminderRequest>,
) -> ApiResult<Json<ReminderUpdateResponse>> {
    let settings = reminder_settings_from(payload)?;

    let updated = state
        .user_repository
        .update_reminder(user.id, &settings)
        .await
        .map_err(|e| {
            error!("Failed to update reminder settings: {}", e);
            ApiError::internal()
        })?
        .ok_or_else(|| ApiError::InternalServerError("Failed to update settings".to_string()))?;

    let message = if updated.reminder_enabled {
        "Check-in reminders enabled"
    } else {
        "Check-in reminders disabled"
    };

    Ok(Json(ReminderUpdateResponse {
        success: true,
        message: message.to_string(),
        settings: updated.reminder_settings(),
    }))
}

/// Validate a request into the settings to store
fn reminder_settings_from(payload: UpdateReminderRequest) -> ApiResult<ReminderSettings> {
    let reminder_email = non_empty(payload.reminder_email);
    if let Some(email) = &reminder_email {
        validate_email(email).map_err(ApiError::BadRequest)?;
    }
    if payload.reminder_enabled && reminder_email.is_none() {
        return Err(ApiError::BadRequest(
            "An email address is required to enable reminders".to_string(),
        ));
    }

    let reminder_hour = payload.reminder_hour.unwrap_or(DEFAULT_REMINDER_HOUR);
    validate_reminder_hour(reminder_hour).map_err(ApiError::BadRequest)?;

    Ok(ReminderSettings {
        reminder_enabled: payload.reminder_enabled,
        reminder_email,
        reminder_hour,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(enabled: bool, email: Option<&str>, hour: Option<u8>) -> UpdateReminderRequest {
        UpdateReminderRequest {
            reminder_enabled: enabled,
            reminder_email: email.map(str::to_string),
            reminder_hour: hour,
        }
    }

    #[test]
    fn test_enabling_requires_email() {
        assert!(matches!(
            reminder_settings_from(request(true, None, Some(9))),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            reminder_settings_from(request(true, Some("  "), Some(9))),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_hour_defaults_to_eight() {
        let settings = reminder_settings_from(request(true, Some("me@example.com"), None)).unwrap();
        assert_eq!(settings.reminder_hour, 8);
        assert_eq!(settings.reminder_email.as_deref(), Some("me@example.com"));
    }

    #[test]
    fn test_out_of_range_hour_is_rejected() {
        assert!(reminder_settings_from(request(false, None, Some(24))).is_err());
    }

    #[test]
    fn test_disabling_keeps_address() {
        let settings = reminder_settings_from(request(false, Some("me@example.com"), Some(20))).unwrap();
        assert!(!settings.reminder_enabled);
        assert_eq!(settings.reminder_email.as_deref(), Some("me@example.com"));
        assert_eq!(settings.reminder_hour, 20);
    }

    #[test]
    fn test_invalid_address_is_rejected() {
        assert!(reminder_settings_from(request(false, Some("nope"), None)).is_err());
    }
}
