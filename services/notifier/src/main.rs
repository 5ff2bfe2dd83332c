use std::{sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use common::{
    attendance::AttendanceEngine,
    cache::{RedisConfig, RedisPool},
    clock::SystemClock,
    database::{DatabaseConfig, init_pool, run_migrations},
    store::PgAttendanceStore,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod job_lock;
mod scanner;
mod scheduler;

use config::NotifierConfig;
use job_lock::{JobLock, LocalJobLock, RedisJobLock};
use scanner::NotificationScanner;

#[derive(Parser, Debug)]
#[command(name = "notifier", version, about = "Check-in reminders and missed check-in alerts")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run both jobs on their schedules until interrupted (default)
    Serve,
    /// Run a single job once and exit
    Run {
        #[arg(value_enum)]
        job: JobKind,
        /// Reminder hour to process instead of the current UTC hour
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
        hour: Option<u8>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum JobKind {
    Missed,
    Reminders,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    info!("Starting notifier");

    let config = NotifierConfig::from_env().context("invalid NOTIFIER_* settings")?;

    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    run_migrations(&pool).await?;

    let engine = AttendanceEngine::new(
        Arc::new(PgAttendanceStore::new(pool)),
        Arc::new(SystemClock),
    );
    let sender = mailer::sender_from_env()?;
    let scanner = NotificationScanner::new(
        engine,
        sender,
        Duration::from_millis(config.send_delay_ms),
    );

    let lock: Arc<dyn JobLock> = match RedisConfig::from_env_optional() {
        Some(redis_config) => {
            info!("Using Redis job lock");
            Arc::new(RedisJobLock::new(
                RedisPool::new(&redis_config)?,
                config.lock_ttl_secs,
            ))
        }
        None => {
            warn!("REDIS_URL not set, job lock is local to this process");
            Arc::new(LocalJobLock::new())
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let mut jobs = scheduler::start(scanner, lock, &config).await?;
            info!("Notifier started successfully");

            tokio::signal::ctrl_c().await?;
            info!("Shutting down notifier");
            jobs.shutdown().await?;
        }
        Command::Run { job, hour } => {
            let report = match job {
                JobKind::Missed => scheduler::run_missed_check_in_job(&scanner, lock.as_ref()).await?,
                JobKind::Reminders => {
                    let hour = hour.unwrap_or_else(|| scanner.current_hour());
                    scheduler::run_reminder_job(&scanner, lock.as_ref(), hour).await?
                }
            };

            match report {
                Some(report) => info!("Done. Sent: {}, Failed: {}", report.sent, report.failed),
                None => warn!("Job is already running elsewhere, nothing done"),
            }
        }
    }

    Ok(())
}
