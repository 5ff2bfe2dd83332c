//! API models for request and response payloads

use chrono::{DateTime, Utc};
use common::models::{CheckIn, EmergencyContact, ReminderSettings, Role, User};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    /// Optional; an empty string counts as absent
    #[serde(default)]
    pub email: Option<String>,
}

/// Request for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

/// Public view of a user
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub user: UserResponse,
}

/// Generic acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub success: bool,
    pub check_in: CheckIn,
    pub streak_days: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub contacts: Vec<EmergencyContact>,
    pub max_contacts: usize,
    pub can_add_more: bool,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub contact: EmergencyContact,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReminderRequest {
    pub reminder_enabled: bool,
    #[serde(default)]
    pub reminder_email: Option<String>,
    /// UTC hour; defaults to 8 when omitted
    #[serde(default)]
    pub reminder_hour: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct ReminderUpdateResponse {
    pub success: bool,
    pub message: String,
    pub settings: ReminderSettings,
}

#[derive(Debug, Deserialize)]
pub struct TestEmailRequest {
    pub email: String,
}

/// Treat blank optional strings as absent
pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
