//! Check-in model

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One check-in for one UTC calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Serialized as `YYYY-MM-DD`
    pub check_in_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Attendance summary shown to a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckInStatus {
    pub has_checked_in_today: bool,
    pub last_check_in: Option<CheckIn>,
    pub streak_days: u32,
}
