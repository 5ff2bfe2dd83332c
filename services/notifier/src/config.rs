//! Notifier settings

use serde::Deserialize;

/// Schedules and pacing for the notification jobs
///
/// Cron expressions have a leading seconds field and are evaluated in UTC.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifierConfig {
    /// When to alert emergency contacts about yesterday's lapses
    pub missed_schedule: String,
    /// When to send personal reminders
    pub reminder_schedule: String,
    /// Pause between two sends, to stay under SMTP rate limits
    pub send_delay_ms: u64,
    /// Expiry of a held job lock, bounding how long a crashed run blocks the next
    pub lock_ttl_secs: u64,
}

impl NotifierConfig {
    /// Load settings from `NOTIFIER_*` environment variables
    ///
    /// # Environment Variables
    /// - `NOTIFIER_MISSED_SCHEDULE` (default: "0 0 1 * * *", daily at 01:00 UTC)
    /// - `NOTIFIER_REMINDER_SCHEDULE` (default: "0 0 * * * *", hourly)
    /// - `NOTIFIER_SEND_DELAY_MS` (default: 100)
    /// - `NOTIFIER_LOCK_TTL_SECS` (default: 3600)
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .set_default("missed_schedule", "0 0 1 * * *")?
            .set_default("reminder_schedule", "0 0 * * * *")?
            .set_default("send_delay_ms", 100_i64)?
            .set_default("lock_ttl_secs", 3600_i64)?
            .add_source(config::Environment::with_prefix("NOTIFIER"))
            .build()?
            .try_deserialize()
    }
}
