//! User model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Row, postgres::PgRow};
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Default UTC hour for reminder emails
pub const DEFAULT_REMINDER_HOUR: u8 = 8;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub reminder_enabled: bool,
    pub reminder_email: Option<String>,
    /// UTC hour, 0-23
    pub reminder_hour: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn reminder_settings(&self) -> ReminderSettings {
        ReminderSettings {
            reminder_enabled: self.reminder_enabled,
            reminder_email: self.reminder_email.clone(),
            reminder_hour: self.reminder_hour,
        }
    }
}

impl<'r> FromRow<'r, PgRow> for User {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let role: String = row.try_get("role")?;
        let role = role
            .parse()
            .map_err(|e: String| sqlx::Error::ColumnDecode {
                index: "role".to_string(),
                source: e.into(),
            })?;

        let reminder_hour: i16 = row.try_get("reminder_hour")?;
        let reminder_hour =
            u8::try_from(reminder_hour).map_err(|e| sqlx::Error::ColumnDecode {
                index: "reminder_hour".to_string(),
                source: Box::new(e),
            })?;

        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            role,
            reminder_enabled: row.try_get("reminder_enabled")?,
            reminder_email: row.try_get("reminder_email")?,
            reminder_hour,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// New user creation payload
///
/// `password_hash` is already hashed by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
}

/// Per-user reminder preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    pub reminder_enabled: bool,
    pub reminder_email: Option<String>,
    pub reminder_hour: u8,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            reminder_enabled: false,
            reminder_email: None,
            reminder_hour: DEFAULT_REMINDER_HOUR,
        }
    }
}
