//! Bounded worker pool implementation

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::config::PoolConfig;

/// Result of one job, reported in input order
#[derive(Debug)]
pub struct JobOutcome<T> {
    pub key: String,
    /// `Err` carries the reason a job panicked or was cancelled
    pub result: Result<T, String>,
}

/// Pool statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    #[serde(rename = "total-started")]
    pub total_started: usize,
    /// Jobs that returned normally
    #[serde(rename = "total-completed")]
    pub total_completed: usize,
    #[serde(rename = "total-panicked")]
    pub total_panicked: usize,
    #[serde(rename = "peak-concurrent")]
    pub peak_concurrent: usize,
}

#[derive(Debug)]
pub struct PoolReport<T> {
    pub outcomes: Vec<JobOutcome<T>>,
    pub stats: PoolStats,
}

impl<T> PoolReport<T> {
    /// Keys of jobs that did not return normally
    pub fn failed_keys(&self) -> impl Iterator<Item = &str> {
        self.outcomes
            .iter()
            .filter(|o| o.result.is_err())
            .map(|o| o.key.as_str())
    }
}

#[derive(Debug, Default)]
struct Occupancy {
    running: AtomicUsize,
    peak: AtomicUsize,
}

/// Marks one pool slot as busy for as long as it lives
struct SlotGuard {
    occupancy: Arc<Occupancy>,
}

impl SlotGuard {
    fn enter(occupancy: Arc<Occupancy>) -> Self {
        let now = occupancy.running.fetch_add(1, Ordering::SeqCst) + 1;
        occupancy.peak.fetch_max(now, Ordering::SeqCst);
        Self { occupancy }
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.occupancy.running.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Runs keyed jobs with at most `concurrency` in flight
///
/// Jobs start strictly in input order, each as soon as a slot frees up. Every
/// job runs in its own tokio task, so a panic is confined to that job and
/// reported as a failed outcome.
pub struct WorkerPool {
    concurrency: usize,
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(config: PoolConfig) -> Self {
        debug!(?config, "WorkerPool::new: called");
        let concurrency = if config.concurrency == 0 {
            warn!("Concurrency of 0 requested, using 1");
            1
        } else {
            config.concurrency
        };
        Self {
            concurrency,
            semaphore: Arc::new(Semaphore::new(concurrency)),
        }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `work` once per key and wait for all of them
    pub async fn run<T, F, Fut>(&self, keys: Vec<String>, work: F) -> Result<PoolReport<T>>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        debug!(jobs = keys.len(), concurrency = self.concurrency, "WorkerPool::run: called");
        let occupancy = Arc::new(Occupancy::default());
        let mut stats = PoolStats::default();
        let mut handles: Vec<(String, JoinHandle<T>)> = Vec::with_capacity(keys.len());

        for key in keys {
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .context("Worker pool semaphore closed")?;

            let job = work(key.clone());
            let occupancy = occupancy.clone();
            debug!(%key, "WorkerPool::run: starting job");
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let _slot = SlotGuard::enter(occupancy);
                job.await
            });
            stats.total_started += 1;
            handles.push((key, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (key, handle) in handles {
            let result = match handle.await {
                Ok(value) => {
                    stats.total_completed += 1;
                    Ok(value)
                }
                Err(e) => {
                    warn!(%key, error = %e, "Job did not complete");
                    stats.total_panicked += 1;
                    Err(join_error_reason(e))
                }
            };
            outcomes.push(JobOutcome { key, result });
        }

        stats.peak_concurrent = occupancy.peak.load(Ordering::SeqCst);
        info!(
            started = stats.total_started,
            completed = stats.total_completed,
            panicked = stats.total_panicked,
            peak = stats.peak_concurrent,
            "Worker pool drained"
        );
        Ok(PoolReport { outcomes, stats })
    }
}

/// Human-readable reason a spawned task did not return
pub(crate) fn join_error_reason(err: tokio::task::JoinError) -> String {
    if err.is_cancelled() {
        return "job was cancelled".to_string();
    }
    match err.try_into_panic() {
        Ok(payload) => {
            if let Some(msg) = payload.downcast_ref::<&str>() {
                format!("job panicked: {}", msg)
            } else if let Some(msg) = payload.downcast_ref::<String>() {
                format!("job panicked: {}", msg)
            } else {
                "job panicked".to_string()
            }
        }
        Err(_) => "job failed".to_string(),
    }
}
