//! Mutual exclusion for scheduled jobs
//!
//! A trigger that fires while the previous run of the same job still holds
//! the lock is skipped. The local lock covers a single notifier process; the
//! Redis lock covers every replica sharing the Redis instance.

use std::{
    collections::HashSet,
    future::Future,
    panic::{AssertUnwindSafe, resume_unwind},
    sync::Mutex,
};

use anyhow::Result;
use async_trait::async_trait;
use common::cache::RedisPool;
use futures::FutureExt;
use tracing::{error, warn};
use uuid::Uuid;

/// Lock keyed by job name
#[async_trait]
pub trait JobLock: Send + Sync {
    /// Take the lock for `job`; `false` if it is already held
    async fn try_acquire(&self, job: &str) -> Result<bool>;

    /// Give the lock for `job` back
    async fn release(&self, job: &str) -> Result<()>;
}

/// In-process job lock
#[derive(Debug, Default)]
pub struct LocalJobLock {
    running: Mutex<HashSet<String>>,
}

impl LocalJobLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobLock for LocalJobLock {
    async fn try_acquire(&self, job: &str) -> Result<bool> {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        Ok(running.insert(job.to_string()))
    }

    async fn release(&self, job: &str) -> Result<()> {
        let mut running = self.running.lock().unwrap_or_else(|e| e.into_inner());
        running.remove(job);
        Ok(())
    }
}

/// Job lock stored in Redis with `SET NX EX`
///
/// The TTL frees the lock if the holder dies mid-run.
#[derive(Clone)]
pub struct RedisJobLock {
    redis: RedisPool,
    ttl_secs: u64,
    /// Identifies this process as the holder
    owner: String,
}

impl RedisJobLock {
    pub fn new(redis: RedisPool, ttl_secs: u64) -> Self {
        Self {
            redis,
            ttl_secs,
            owner: Uuid::new_v4().to_string(),
        }
    }

    fn key(job: &str) -> String {
        format!("job_lock:{}", job)
    }
}

#[async_trait]
impl JobLock for RedisJobLock {
    async fn try_acquire(&self, job: &str) -> Result<bool> {
        self.redis
            .set_if_absent(&Self::key(job), &self.owner, self.ttl_secs)
            .await
    }

    async fn release(&self, job: &str) -> Result<()> {
        // The lock may have expired and been taken by another replica
        if !self.redis.delete_if_equals(&Self::key(job), &self.owner).await? {
            warn!("Lock for {} was no longer held by this process", job);
        }
        Ok(())
    }
}

/// Run `task` while holding the lock for `job`
///
/// Returns `Ok(None)` without running `task` when the lock is held elsewhere.
/// The lock is released even if `task` panics; the panic is then resumed.
pub async fn run_exclusive<T, F>(lock: &dyn JobLock, job: &str, task: F) -> Result<Option<T>>
where
    F: Future<Output = T>,
{
    if !lock.try_acquire(job).await? {
        warn!("Skipping {}: previous run still in progress", job);
        return Ok(None);
    }

    let output = AssertUnwindSafe(task).catch_unwind().await;

    if let Err(e) = lock.release(job).await {
        error!("Failed to release lock for {}: {}", job, e);
    }

    match output {
        Ok(output) => Ok(Some(output)),
        Err(panic) => {
            error!("Job {} panicked", job);
            resume_unwind(panic)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_local_lock_is_exclusive_per_job() {
        let lock = LocalJobLock::new();

        assert!(lock.try_acquire("a").await.unwrap());
        assert!(!lock.try_acquire("a").await.unwrap());
        assert!(lock.try_acquire("b").await.unwrap());

        lock.release("a").await.unwrap();
        assert!(lock.try_acquire("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_overlapping_run_is_skipped() {
        let lock = Arc::new(LocalJobLock::new());
        let (started_tx, started_rx) = oneshot::channel();
        let (finish_tx, finish_rx) = oneshot::channel::<()>();

        let first = {
            let lock = lock.clone();
            tokio::spawn(async move {
                run_exclusive(lock.as_ref(), "scan", async move {
                    let _ = started_tx.send(());
                    let _ = finish_rx.await;
                    1
                })
                .await
            })
        };

        started_rx.await.unwrap();
        let second = run_exclusive(lock.as_ref(), "scan", async { 2 }).await.unwrap();
        assert_eq!(second, None);

        finish_tx.send(()).unwrap();
        assert_eq!(first.await.unwrap().unwrap(), Some(1));

        let third = run_exclusive(lock.as_ref(), "scan", async { 3 }).await.unwrap();
        assert_eq!(third, Some(3));
    }

    #[tokio::test]
    async fn test_panicking_run_releases_lock() {
        let lock = Arc::new(LocalJobLock::new());

        let crashed = {
            let lock = lock.clone();
            tokio::spawn(async move {
                run_exclusive(lock.as_ref(), "scan", async {
                    panic!("scan blew up");
                })
                .await
            })
        };
        assert!(crashed.await.unwrap_err().is_panic());

        let next = run_exclusive(lock.as_ref(), "scan", async { 1 }).await.unwrap();
        assert_eq!(next, Some(1));
    }

    #[tokio::test]
    #[ignore = "requires a running Redis instance"]
    async fn test_redis_release_leaves_foreign_lock() -> Result<()> {
        let redis = RedisPool::new(&common::cache::RedisConfig::from_env())?;
        let holder = RedisJobLock::new(redis.clone(), 30);
        let other = RedisJobLock::new(redis, 30);
        let job = format!("test_{}", Uuid::new_v4());

        assert!(holder.try_acquire(&job).await?);
        other.release(&job).await?;
        assert!(!other.try_acquire(&job).await?);

        holder.release(&job).await?;
        assert!(other.try_acquire(&job).await?);
        other.release(&job).await?;
        Ok(())
    }
}
