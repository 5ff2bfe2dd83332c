//! Storage seam for the attendance engine
//!
//! The engine only ever needs point lookups keyed by (user, day) and two
//! set-returning scans, so the trait stays narrow. `PgAttendanceStore` backs
//! the services; `MemoryStore` backs tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::DatabaseResult,
    models::{CheckIn, MissedCheckIn, User},
};

#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod postgres;

#[cfg(any(test, feature = "test-util"))]
pub use memory::MemoryStore;
pub use postgres::{PgAttendanceStore, USER_COLUMNS};

/// Check-in, user and contact lookups needed by the attendance engine
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Whether `user_id` has a check-in on `date`
    async fn check_in_exists(&self, user_id: Uuid, date: NaiveDate) -> DatabaseResult<bool>;

    /// Insert the check-in for (`user_id`, `date`)
    ///
    /// Returns `None` when the uniqueness constraint rejected the row because
    /// one already exists.
    async fn insert_check_in(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> DatabaseResult<Option<CheckIn>>;

    /// All check-in dates of a user, most recent first
    async fn check_in_dates(&self, user_id: Uuid) -> DatabaseResult<Vec<NaiveDate>>;

    /// Most recent check-in of a user
    async fn last_check_in(&self, user_id: Uuid) -> DatabaseResult<Option<CheckIn>>;

    /// Users with at least one emergency contact and no check-in on `date`
    async fn users_missing_check_in(&self, date: NaiveDate) -> DatabaseResult<Vec<MissedCheckIn>>;

    /// Users whose reminder is due at `hour` and who have not checked in on `date`
    async fn reminder_candidates(&self, hour: u8, date: NaiveDate) -> DatabaseResult<Vec<User>>;
}
