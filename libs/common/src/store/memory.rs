//! In-memory attendance store for tests
//!
//! Mirrors the rules the SQL side enforces: one check-in per (user, day),
//! one contact per (user, email) and at most [`MAX_CONTACTS`] per user.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::AttendanceStore;
use crate::{
    error::DatabaseResult,
    models::{
        CheckIn, DEFAULT_REMINDER_HOUR, EmergencyContact, MAX_CONTACTS, MissedCheckIn, Role,
        User,
    },
};

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    contacts: Vec<EmergencyContact>,
    check_ins: Vec<CheckIn>,
}

/// Attendance store holding everything in process memory
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a user with default settings
    pub fn add_user(&self, username: &str) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: None,
            password_hash: String::new(),
            role: Role::User,
            reminder_enabled: false,
            reminder_email: None,
            reminder_hour: DEFAULT_REMINDER_HOUR,
            created_at: now,
            updated_at: now,
        };
        self.lock().users.push(user.clone());
        user
    }

    /// Overwrite a user's reminder preferences
    pub fn set_reminder(&self, user_id: Uuid, enabled: bool, email: Option<&str>, hour: u8) {
        let mut inner = self.lock();
        if let Some(user) = inner.users.iter_mut().find(|u| u.id == user_id) {
            user.reminder_enabled = enabled;
            user.reminder_email = email.map(str::to_string);
            user.reminder_hour = hour;
        }
    }

    /// Add an emergency contact
    ///
    /// `None` if the email is already listed for the user or the user is at
    /// the contact limit.
    pub fn add_contact(&self, user_id: Uuid, name: &str, email: &str) -> Option<EmergencyContact> {
        let mut inner = self.lock();
        let owned = inner.contacts.iter().filter(|c| c.user_id == user_id);
        if owned.clone().count() >= MAX_CONTACTS || owned.clone().any(|c| c.email == email) {
            return None;
        }

        let now = Utc::now();
        let contact = EmergencyContact {
            id: Uuid::new_v4(),
            user_id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.contacts.push(contact.clone());
        Some(contact)
    }

    /// Seed a check-in for an arbitrary day
    pub fn add_check_in(&self, user_id: Uuid, date: NaiveDate) -> Option<CheckIn> {
        insert(&mut self.lock(), user_id, date)
    }

    /// Number of stored check-ins for a user
    pub fn check_in_count(&self, user_id: Uuid) -> usize {
        self.lock()
            .check_ins
            .iter()
            .filter(|c| c.user_id == user_id)
            .count()
    }
}

fn insert(inner: &mut Inner, user_id: Uuid, date: NaiveDate) -> Option<CheckIn> {
    if inner
        .check_ins
        .iter()
        .any(|c| c.user_id == user_id && c.check_in_date == date)
    {
        return None;
    }

    let check_in = CheckIn {
        id: Uuid::new_v4(),
        user_id,
        check_in_date: date,
        created_at: Utc::now(),
    };
    inner.check_ins.push(check_in.clone());
    Some(check_in)
}

fn has_check_in(inner: &Inner, user_id: Uuid, date: NaiveDate) -> bool {
    inner
        .check_ins
        .iter()
        .any(|c| c.user_id == user_id && c.check_in_date == date)
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn check_in_exists(&self, user_id: Uuid, date: NaiveDate) -> DatabaseResult<bool> {
        Ok(has_check_in(&self.lock(), user_id, date))
    }

    async fn insert_check_in(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> DatabaseResult<Option<CheckIn>> {
        Ok(insert(&mut self.lock(), user_id, date))
    }

    async fn check_in_dates(&self, user_id: Uuid) -> DatabaseResult<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self
            .lock()
            .check_ins
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.check_in_date)
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }

    async fn last_check_in(&self, user_id: Uuid) -> DatabaseResult<Option<CheckIn>> {
        Ok(self
            .lock()
            .check_ins
            .iter()
            .filter(|c| c.user_id == user_id)
            .max_by_key(|c| c.check_in_date)
            .cloned())
    }

    async fn users_missing_check_in(&self, date: NaiveDate) -> DatabaseResult<Vec<MissedCheckIn>> {
        let inner = self.lock();
        let mut missed: Vec<MissedCheckIn> = inner
            .users
            .iter()
            .filter(|user| !has_check_in(&inner, user.id, date))
            .filter_map(|user| {
                let contacts: Vec<EmergencyContact> = inner
                    .contacts
                    .iter()
                    .filter(|c| c.user_id == user.id)
                    .cloned()
                    .collect();
                (!contacts.is_empty()).then(|| MissedCheckIn {
                    user: user.clone(),
                    contacts,
                })
            })
            .collect();
        missed.sort_by(|a, b| a.user.username.cmp(&b.user.username));
        Ok(missed)
    }

    async fn reminder_candidates(&self, hour: u8, date: NaiveDate) -> DatabaseResult<Vec<User>> {
        let inner = self.lock();
        let mut users: Vec<User> = inner
            .users
            .iter()
            .filter(|u| u.reminder_enabled && u.reminder_hour == hour)
            .filter(|u| u.reminder_email.as_deref().is_some_and(|e| !e.is_empty()))
            .filter(|u| !has_check_in(&inner, u.id, date))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}
