use std::sync::Arc;

use anyhow::Result;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::{
    config::NotifierConfig,
    job_lock::{JobLock, run_exclusive},
    scanner::{NotificationScanner, ScanReport},
};

pub const MISSED_CHECK_IN_JOB: &str = "missed_check_ins";
pub const REMINDER_JOB: &str = "reminders";

/// One locked run of the missed check-in scan; `None` if another run held the lock
pub async fn run_missed_check_in_job(
    scanner: &NotificationScanner,
    lock: &dyn JobLock,
) -> Result<Option<ScanReport>> {
    let outcome = run_exclusive(lock, MISSED_CHECK_IN_JOB, scanner.notify_missed_check_ins()).await?;
    Ok(outcome.transpose()?)
}

/// One locked run of the reminder scan for `hour`
pub async fn run_reminder_job(
    scanner: &NotificationScanner,
    lock: &dyn JobLock,
    hour: u8,
) -> Result<Option<ScanReport>> {
    let outcome = run_exclusive(lock, REMINDER_JOB, scanner.send_reminders(hour)).await?;
    Ok(outcome.transpose()?)
}

/// Register both jobs and start the scheduler
pub async fn start(
    scanner: NotificationScanner,
    lock: Arc<dyn JobLock>,
    config: &NotifierConfig,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let missed_job = {
        let scanner = scanner.clone();
        let lock = lock.clone();
        Job::new_async(config.missed_schedule.as_str(), move |_, _| {
            let scanner = scanner.clone();
            let lock = lock.clone();
            Box::pin(async move {
                info!("Missed check-in job triggered");
                if let Err(e) = run_missed_check_in_job(&scanner, lock.as_ref()).await {
                    error!("Missed check-in job failed: {}", e);
                }
            })
        })?
    };

    let reminder_job = Job::new_async(config.reminder_schedule.as_str(), move |_, _| {
        let scanner = scanner.clone();
        let lock = lock.clone();
        Box::pin(async move {
            let hour = scanner.current_hour();
            info!("Reminder job triggered for hour {}", hour);
            if let Err(e) = run_reminder_job(&scanner, lock.as_ref(), hour).await {
                error!("Reminder job failed: {}", e);
            }
        })
    })?;

    scheduler.add(missed_job).await?;
    scheduler.add(reminder_job).await?;
    scheduler.start().await?;

    info!(
        "Scheduler started: missed check-ins at '{}', reminders at '{}'",
        config.missed_schedule, config.reminder_schedule
    );
    Ok(scheduler)
}
