//! Emergency contact model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::User;

/// Upper bound on emergency contacts per user
pub const MAX_CONTACTS: usize = 3;

/// Emergency contact entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct EmergencyContact {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New contact creation payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewContact {
    pub name: String,
    pub email: String,
}

/// A user who did not check in on the scanned day, with the contacts to alert
#[derive(Debug, Clone)]
pub struct MissedCheckIn {
    pub user: User,
    pub contacts: Vec<EmergencyContact>,
}
