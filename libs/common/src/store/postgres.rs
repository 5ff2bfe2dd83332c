//! PostgreSQL implementation of the attendance store

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{FromRow, PgPool, Row};
use uuid::Uuid;

use super::AttendanceStore;
use crate::{
    error::DatabaseResult,
    models::{CheckIn, EmergencyContact, MissedCheckIn, User},
};

/// Columns selected for a `users` row, qualified with the `u` alias
pub const USER_COLUMNS: &str = "u.id, u.username, u.email, u.password_hash, u.role, \
     u.reminder_enabled, u.reminder_email, u.reminder_hour, u.created_at, u.updated_at";

/// Attendance store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgAttendanceStore {
    pool: PgPool,
}

impl PgAttendanceStore {
    /// Create a new store over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for PgAttendanceStore {
    async fn check_in_exists(&self, user_id: Uuid, date: NaiveDate) -> DatabaseResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM check_ins WHERE user_id = $1 AND check_in_date = $2
            )
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn insert_check_in(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> DatabaseResult<Option<CheckIn>> {
        let check_in = sqlx::query_as::<_, CheckIn>(
            r#"
            INSERT INTO check_ins (user_id, check_in_date)
            VALUES ($1, $2)
            ON CONFLICT (user_id, check_in_date) DO NOTHING
            RETURNING id, user_id, check_in_date, created_at
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(check_in)
    }

    async fn check_in_dates(&self, user_id: Uuid) -> DatabaseResult<Vec<NaiveDate>> {
        let dates = sqlx::query_scalar(
            r#"
            SELECT check_in_date
            FROM check_ins
            WHERE user_id = $1
            ORDER BY check_in_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(dates)
    }

    async fn last_check_in(&self, user_id: Uuid) -> DatabaseResult<Option<CheckIn>> {
        let check_in = sqlx::query_as::<_, CheckIn>(
            r#"
            SELECT id, user_id, check_in_date, created_at
            FROM check_ins
            WHERE user_id = $1
            ORDER BY check_in_date DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(check_in)
    }

    async fn users_missing_check_in(&self, date: NaiveDate) -> DatabaseResult<Vec<MissedCheckIn>> {
        // One pass over users joined to their contacts; the unique index on
        // (user_id, check_in_date) serves the NOT EXISTS lookup.
        let query = format!(
            r#"
            SELECT {USER_COLUMNS},
                   c.id AS contact_id,
                   c.name AS contact_name,
                   c.email AS contact_email,
                   c.created_at AS contact_created_at,
                   c.updated_at AS contact_updated_at
            FROM users u
            JOIN emergency_contacts c ON c.user_id = u.id
            WHERE NOT EXISTS (
                SELECT 1 FROM check_ins ci
                WHERE ci.user_id = u.id AND ci.check_in_date = $1
            )
            ORDER BY u.username, u.id, c.created_at
            "#
        );

        let rows = sqlx::query(&query).bind(date).fetch_all(&self.pool).await?;

        let mut missed: Vec<MissedCheckIn> = Vec::new();
        for row in rows {
            let user_id: Uuid = row.try_get("id")?;
            let contact = EmergencyContact {
                id: row.try_get("contact_id")?,
                user_id,
                name: row.try_get("contact_name")?,
                email: row.try_get("contact_email")?,
                created_at: row.try_get("contact_created_at")?,
                updated_at: row.try_get("contact_updated_at")?,
            };

            match missed.last_mut() {
                Some(entry) if entry.user.id == user_id => entry.contacts.push(contact),
                _ => missed.push(MissedCheckIn {
                    user: User::from_row(&row)?,
                    contacts: vec![contact],
                }),
            }
        }

        Ok(missed)
    }

    async fn reminder_candidates(&self, hour: u8, date: NaiveDate) -> DatabaseResult<Vec<User>> {
        let query = format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users u
            WHERE u.reminder_enabled
              AND u.reminder_hour = $1
              AND u.reminder_email IS NOT NULL
              AND u.reminder_email <> ''
              AND NOT EXISTS (
                  SELECT 1 FROM check_ins ci
                  WHERE ci.user_id = u.id AND ci.check_in_date = $2
              )
            ORDER BY u.username
            "#
        );

        let users = sqlx::query_as::<_, User>(&query)
            .bind(i16::from(hour))
            .bind(date)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}
