//! Notification scanner
//!
//! Turns the attendance engine's scans into emails. Each recipient is
//! attempted once per run; a failed send is counted and the batch moves on.

use std::{sync::Arc, time::Duration};

use chrono::NaiveDate;
use common::{attendance::AttendanceEngine, error::AttendanceResult};
use mailer::{EmailSender, OutgoingEmail, templates};
use tokio::time::sleep;
use tracing::{info, warn};

/// Outcome of one scan
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    pub sent: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct NotificationScanner {
    engine: AttendanceEngine,
    sender: Arc<dyn EmailSender>,
    send_delay: Duration,
}

impl NotificationScanner {
    pub fn new(engine: AttendanceEngine, sender: Arc<dyn EmailSender>, send_delay: Duration) -> Self {
        Self {
            engine,
            sender,
            send_delay,
        }
    }

    pub fn current_hour(&self) -> u8 {
        self.engine.current_hour()
    }

    /// Alert the emergency contacts of everyone who missed yesterday
    pub async fn notify_missed_check_ins(&self) -> AttendanceResult<ScanReport> {
        self.notify_missed_check_ins_on(self.engine.yesterday()).await
    }

    /// Alert the emergency contacts of everyone who missed `missed_date`
    ///
    /// The same date drives the scan and the alert text.
    pub async fn notify_missed_check_ins_on(
        &self,
        missed_date: NaiveDate,
    ) -> AttendanceResult<ScanReport> {
        info!("Starting missed check-in scan for {}", missed_date);

        let missed = self.engine.list_users_who_missed(missed_date).await?;
        let mut report = ScanReport::default();

        if missed.is_empty() {
            info!("No users missed check-in on {}", missed_date);
            return Ok(report);
        }

        for entry in &missed {
            info!(
                "Processing user: {} ({} contacts)",
                entry.user.username,
                entry.contacts.len()
            );

            for contact in &entry.contacts {
                let email = templates::missed_check_in_alert(
                    &contact.email,
                    &contact.name,
                    &entry.user.username,
                    missed_date,
                );
                self.deliver(&email, &mut report).await;
            }
        }

        info!(
            "Missed check-in scan completed. Sent: {}, Failed: {}",
            report.sent, report.failed
        );
        Ok(report)
    }

    /// Remind users whose reminder hour is `hour` and who have not checked in today
    pub async fn send_reminders(&self, hour: u8) -> AttendanceResult<ScanReport> {
        info!("Starting reminder scan for {:02}:00 UTC", hour);

        let users = self.engine.list_users_needing_reminder(hour).await?;
        let today = self.engine.today();
        let mut report = ScanReport::default();

        for user in &users {
            let Some(address) = user.reminder_email.as_deref() else {
                continue;
            };
            let email = templates::check_in_reminder(address, &user.username, today);
            self.deliver(&email, &mut report).await;
        }

        info!(
            "Reminder scan completed. Sent: {}, Failed: {}",
            report.sent, report.failed
        );
        Ok(report)
    }

    async fn deliver(&self, email: &OutgoingEmail, report: &mut ScanReport) {
        match self.sender.send(email).await {
            Ok(()) => report.sent += 1,
            Err(e) => {
                warn!("Failed to send \"{}\" to {}: {}", email.subject, email.to, e);
                report.failed += 1;
            }
        }

        if !self.send_delay.is_zero() {
            sleep(self.send_delay).await;
        }
    }
}
