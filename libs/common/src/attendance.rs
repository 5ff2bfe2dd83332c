//! Attendance engine
//!
//! Derives every attendance fact (checked in today, streak length, who
//! lapsed yesterday, who is due a reminder) from a user's check-in days. All
//! days are UTC calendar days taken from the injected [`Clock`].

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    clock::Clock,
    error::{AttendanceError, AttendanceResult},
    models::{CheckIn, CheckInStatus, MissedCheckIn, User},
    store::AttendanceStore,
};

/// Length of the run of consecutive check-in days ending today
///
/// `dates` must be sorted most recent first without duplicates. When today
/// has no check-in yet, a run ending yesterday still counts: the streak only
/// drops to zero once a full UTC day has passed without a check-in.
/// Dates after `today` are ignored.
pub fn streak_from_dates(dates: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut expected = today;
    let mut streak = 0;

    for &date in dates.iter().filter(|&&d| d <= today) {
        let counted = if date == expected {
            true
        } else {
            streak == 0 && expected.pred_opt() == Some(date)
        };

        if !counted {
            break;
        }

        streak += 1;
        match date.pred_opt() {
            Some(previous) => expected = previous,
            None => break,
        }
    }

    streak
}

/// Attendance queries and the check-in command
#[derive(Clone)]
pub struct AttendanceEngine {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
}

impl AttendanceEngine {
    pub fn new(store: Arc<dyn AttendanceStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Current UTC day
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// The UTC day before today
    pub fn yesterday(&self) -> NaiveDate {
        let today = self.today();
        today.pred_opt().unwrap_or(today)
    }

    /// Current UTC hour
    pub fn current_hour(&self) -> u8 {
        self.clock.current_hour()
    }

    pub async fn has_checked_in_today(&self, user_id: Uuid) -> AttendanceResult<bool> {
        Ok(self.store.check_in_exists(user_id, self.today()).await?)
    }

    /// Record today's check-in for `user_id`
    ///
    /// # Errors
    ///
    /// [`AttendanceError::AlreadyCheckedIn`] when a check-in for today exists,
    /// whether found by the pre-check or rejected by the store's uniqueness
    /// constraint after a concurrent insert.
    pub async fn record_check_in(&self, user_id: Uuid) -> AttendanceResult<CheckIn> {
        let today = self.today();

        if self.store.check_in_exists(user_id, today).await? {
            return Err(AttendanceError::AlreadyCheckedIn);
        }

        match self.store.insert_check_in(user_id, today).await? {
            Some(check_in) => {
                info!("User {} checked in for {}", user_id, today);
                Ok(check_in)
            }
            None => {
                warn!(
                    "Concurrent check-in for user {} on {} rejected by unique index",
                    user_id, today
                );
                Err(AttendanceError::AlreadyCheckedIn)
            }
        }
    }

    /// Consecutive check-in days, see [`streak_from_dates`]
    pub async fn compute_streak(&self, user_id: Uuid) -> AttendanceResult<u32> {
        let dates = self.store.check_in_dates(user_id).await?;
        Ok(streak_from_dates(&dates, self.today()))
    }

    pub async fn last_check_in(&self, user_id: Uuid) -> AttendanceResult<Option<CheckIn>> {
        Ok(self.store.last_check_in(user_id).await?)
    }

    /// Everything the dashboard shows about a user's attendance
    pub async fn status(&self, user_id: Uuid) -> AttendanceResult<CheckInStatus> {
        let today = self.today();
        let dates = self.store.check_in_dates(user_id).await?;
        let last_check_in = self.store.last_check_in(user_id).await?;

        Ok(CheckInStatus {
            has_checked_in_today: dates.first() == Some(&today),
            last_check_in,
            streak_days: streak_from_dates(&dates, today),
        })
    }

    /// Users with emergency contacts who have no check-in for yesterday
    pub async fn list_users_who_missed_yesterday(&self) -> AttendanceResult<Vec<MissedCheckIn>> {
        self.list_users_who_missed(self.yesterday()).await
    }

    /// Users with contacts and no check-in on `date`
    pub async fn list_users_who_missed(
        &self,
        date: NaiveDate,
    ) -> AttendanceResult<Vec<MissedCheckIn>> {
        let missed = self.store.users_missing_check_in(date).await?;
        info!("{} users missed check-in on {}", missed.len(), date);
        Ok(missed)
    }

    /// Users whose reminder hour is `hour` and who have not checked in today
    pub async fn list_users_needing_reminder(&self, hour: u8) -> AttendanceResult<Vec<User>> {
        if hour > 23 {
            return Ok(Vec::new());
        }

        let users = self.store.reminder_candidates(hour, self.today()).await?;
        info!("{} users need a reminder at {:02}:00 UTC", users.len(), hour);
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        clock::FixedClock,
        error::DatabaseResult,
        models::User,
        store::MemoryStore,
    };
    use async_trait::async_trait;
    use chrono::{Days, Duration};

    /// Store whose pre-check never sees the competing row, as when two
    /// requests pass the existence check before either inserts
    struct RacingStore(MemoryStore);

    #[async_trait]
    impl AttendanceStore for RacingStore {
        async fn check_in_exists(&self, _user_id: Uuid, _date: NaiveDate) -> DatabaseResult<bool> {
            Ok(false)
        }

        async fn insert_check_in(
            &self,
            user_id: Uuid,
            date: NaiveDate,
        ) -> DatabaseResult<Option<CheckIn>> {
            self.0.insert_check_in(user_id, date).await
        }

        async fn check_in_dates(&self, user_id: Uuid) -> DatabaseResult<Vec<NaiveDate>> {
            self.0.check_in_dates(user_id).await
        }

        async fn last_check_in(&self, user_id: Uuid) -> DatabaseResult<Option<CheckIn>> {
            self.0.last_check_in(user_id).await
        }

        async fn users_missing_check_in(
            &self,
            date: NaiveDate,
        ) -> DatabaseResult<Vec<MissedCheckIn>> {
            self.0.users_missing_check_in(date).await
        }

        async fn reminder_candidates(&self, hour: u8, date: NaiveDate) -> DatabaseResult<Vec<User>> {
            self.0.reminder_candidates(hour, date).await
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn setup(today: NaiveDate) -> (Arc<MemoryStore>, Arc<FixedClock>, AttendanceEngine) {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(FixedClock::at(today, 12));
        let engine = AttendanceEngine::new(store.clone(), clock.clone());
        (store, clock, engine)
    }

    #[test]
    fn test_streak_from_dates_counts_run_ending_today() {
        let today = day(2024, 1, 15);
        let dates = [day(2024, 1, 15), day(2024, 1, 14), day(2024, 1, 13)];
        assert_eq!(streak_from_dates(&dates, today), 3);
    }

    #[test]
    fn test_streak_from_dates_stops_at_gap() {
        let today = day(2024, 1, 15);
        let dates = [
            day(2024, 1, 15),
            day(2024, 1, 14),
            day(2024, 1, 12),
            day(2024, 1, 11),
        ];
        assert_eq!(streak_from_dates(&dates, today), 2);
    }

    #[test]
    fn test_streak_from_dates_grace_day_only_applies_first() {
        let today = day(2024, 1, 15);
        // yesterday counts while today is open, but a second skipped day does not
        let dates = [day(2024, 1, 14), day(2024, 1, 12)];
        assert_eq!(streak_from_dates(&dates, today), 1);
    }

    #[test]
    fn test_streak_from_dates_ignores_future_days() {
        let today = day(2024, 1, 15);
        let dates = [day(2024, 1, 16), day(2024, 1, 15), day(2024, 1, 14)];
        assert_eq!(streak_from_dates(&dates, today), 2);
    }

    #[test]
    fn test_streak_across_month_and_year_boundaries() {
        let today = day(2024, 1, 1);
        let dates = [day(2024, 1, 1), day(2023, 12, 31), day(2023, 12, 30)];
        assert_eq!(streak_from_dates(&dates, today), 3);

        let leap = day(2024, 3, 1);
        let dates = [day(2024, 3, 1), day(2024, 2, 29), day(2024, 2, 28)];
        assert_eq!(streak_from_dates(&dates, leap), 3);
    }

    #[tokio::test]
    async fn test_new_user_has_no_attendance() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");

        assert_eq!(engine.compute_streak(user.id).await.unwrap(), 0);
        assert!(!engine.has_checked_in_today(user.id).await.unwrap());
        assert!(engine.last_check_in(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_three_consecutive_days_ending_today() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");
        for d in [13, 14, 15] {
            store.add_check_in(user.id, day(2024, 1, d));
        }

        assert_eq!(engine.compute_streak(user.id).await.unwrap(), 3);
        assert!(engine.has_checked_in_today(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_streak_survives_until_today_is_over() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");
        for d in [12, 13, 14] {
            store.add_check_in(user.id, day(2024, 1, d));
        }

        assert!(!engine.has_checked_in_today(user.id).await.unwrap());
        assert_eq!(engine.compute_streak(user.id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_gap_of_two_days_resets_streak() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");
        for d in [5, 6, 7, 8, 9, 10, 11, 12, 13] {
            store.add_check_in(user.id, day(2024, 1, d));
        }

        assert_eq!(engine.compute_streak(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_grace_window_expires_at_next_utc_midnight() {
        let (store, clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");
        store.add_check_in(user.id, day(2024, 1, 13));
        store.add_check_in(user.id, day(2024, 1, 14));

        clock.set(day(2024, 1, 15).and_hms_opt(23, 59, 59).unwrap().and_utc());
        assert_eq!(engine.compute_streak(user.id).await.unwrap(), 2);

        clock.advance(Duration::seconds(1));
        assert_eq!(engine.today(), day(2024, 1, 16));
        assert_eq!(engine.compute_streak(user.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_check_in_extends_streak_from_grace_window() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");
        store.add_check_in(user.id, day(2024, 1, 14));

        assert_eq!(engine.compute_streak(user.id).await.unwrap(), 1);
        engine.record_check_in(user.id).await.unwrap();
        assert_eq!(engine.compute_streak(user.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_second_check_in_same_day_is_rejected() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");

        let first = engine.record_check_in(user.id).await.unwrap();
        assert_eq!(first.check_in_date, day(2024, 1, 15));
        assert_eq!(first.user_id, user.id);

        let second = engine.record_check_in(user.id).await;
        assert!(matches!(second, Err(AttendanceError::AlreadyCheckedIn)));
        assert_eq!(store.check_in_count(user.id), 1);
    }

    #[tokio::test]
    async fn test_concurrent_check_ins_record_exactly_one_row() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");

        let (a, b) = tokio::join!(
            engine.record_check_in(user.id),
            engine.record_check_in(user.id)
        );

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert_eq!(store.check_in_count(user.id), 1);
    }

    #[tokio::test]
    async fn test_unique_index_backstops_lost_race() {
        let inner = MemoryStore::new();
        let user = inner.add_user("alice");
        inner.add_check_in(user.id, day(2024, 1, 15));

        let store = Arc::new(RacingStore(inner));
        let clock = Arc::new(FixedClock::at(day(2024, 1, 15), 9));
        let engine = AttendanceEngine::new(store.clone(), clock);

        let result = engine.record_check_in(user.id).await;
        assert!(matches!(result, Err(AttendanceError::AlreadyCheckedIn)));
        assert_eq!(store.0.check_in_count(user.id), 1);
    }

    #[tokio::test]
    async fn test_check_in_on_next_day_is_allowed() {
        let (store, clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");

        engine.record_check_in(user.id).await.unwrap();
        clock.advance(Duration::days(1));
        engine.record_check_in(user.id).await.unwrap();

        assert_eq!(store.check_in_count(user.id), 2);
        assert_eq!(engine.compute_streak(user.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_status_reports_last_check_in() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");
        store.add_check_in(user.id, day(2024, 1, 10));
        store.add_check_in(user.id, day(2024, 1, 14));

        let status = engine.status(user.id).await.unwrap();
        assert!(!status.has_checked_in_today);
        assert_eq!(status.streak_days, 1);
        assert_eq!(
            status.last_check_in.map(|c| c.check_in_date),
            Some(day(2024, 1, 14))
        );
    }

    #[tokio::test]
    async fn test_missed_yesterday_requires_contacts() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let lonely = store.add_user("lonely");
        let covered = store.add_user("covered");
        let diligent = store.add_user("diligent");
        store.add_contact(covered.id, "Mum", "mum@example.com");
        store.add_contact(covered.id, "Dad", "dad@example.com");
        store.add_contact(diligent.id, "Sis", "sis@example.com");
        store.add_check_in(diligent.id, day(2024, 1, 14));

        let missed = engine.list_users_who_missed_yesterday().await.unwrap();

        assert_eq!(missed.len(), 1);
        assert_eq!(missed[0].user.id, covered.id);
        assert_eq!(missed[0].contacts.len(), 2);
        assert!(missed.iter().all(|m| m.user.id != lonely.id));
    }

    #[tokio::test]
    async fn test_check_in_today_does_not_cover_yesterday() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");
        store.add_contact(user.id, "Mum", "mum@example.com");
        engine.record_check_in(user.id).await.unwrap();

        let missed = engine.list_users_who_missed_yesterday().await.unwrap();
        assert_eq!(missed.len(), 1);
        assert_eq!(engine.yesterday(), day(2024, 1, 14));
    }

    #[tokio::test]
    async fn test_reminder_candidates() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let due = store.add_user("due");
        let done = store.add_user("done");
        let disabled = store.add_user("disabled");
        let other_hour = store.add_user("other_hour");
        let no_email = store.add_user("no_email");

        store.set_reminder(due.id, true, Some("due@example.com"), 8);
        store.set_reminder(done.id, true, Some("done@example.com"), 8);
        store.set_reminder(disabled.id, false, Some("disabled@example.com"), 8);
        store.set_reminder(other_hour.id, true, Some("other@example.com"), 9);
        store.set_reminder(no_email.id, true, None, 8);
        store.add_check_in(done.id, day(2024, 1, 15));

        let users = engine.list_users_needing_reminder(8).await.unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, vec!["due"]);
    }

    #[tokio::test]
    async fn test_reminder_hour_out_of_range_is_empty() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");
        store.set_reminder(user.id, true, Some("alice@example.com"), 8);

        assert!(engine.list_users_needing_reminder(24).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_yesterday_check_in_counts_for_missed_scan_only() {
        let (store, _clock, engine) = setup(day(2024, 1, 15));
        let user = store.add_user("alice");
        store.add_contact(user.id, "Mum", "mum@example.com");
        store.set_reminder(user.id, true, Some("alice@example.com"), 12);
        store.add_check_in(user.id, day(2024, 1, 15).checked_sub_days(Days::new(1)).unwrap());

        assert!(engine.list_users_who_missed_yesterday().await.unwrap().is_empty());
        assert_eq!(engine.list_users_needing_reminder(12).await.unwrap().len(), 1);
    }
}
