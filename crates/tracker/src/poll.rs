//! Per-job status polling (PRD-04).
//!
//! One watcher task per submitted job asks the backend for the job's
//! status at a fixed interval and merges what it sees into the store,
//! until the job reaches a terminal status or a retry budget runs out.
//! Failures never escape the task -- they only advance counters.

use std::sync::Arc;
use std::time::Duration;

use sift_core::status::JobStatus;
use sift_core::types::JobId;
use sift_screener::ScreeningService;
use tokio_util::sync::CancellationToken;

use crate::store::JobStoreHandle;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Default delay between status requests.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
/// Default total budget: 150 polls, about five minutes at the default
/// interval.
const DEFAULT_MAX_POLLS: u32 = 150;
/// Default consecutive-failure budget.
const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 3;

/// Tunable budgets for one poll task.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between status requests.
    pub interval: Duration,
    /// Total number of requests before the task gives up.  Successful
    /// responses count against this budget too.
    pub max_polls: u32,
    /// Consecutive failed requests before the task gives up.  Any
    /// successful response resets this counter.
    pub max_consecutive_failures: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
            max_consecutive_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// Why a poll task stopped.  Every variant is final -- a stopped task is
/// never resumed or retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job reached a terminal status and was merged into the store.
    Terminal(JobStatus),
    /// Too many consecutive request failures; the record keeps its last
    /// known non-terminal status and reads as still pending.
    FailuresExhausted,
    /// The total poll budget ran out before the job settled.
    BudgetExhausted,
    /// The job was deleted, the store shut down, or the session was
    /// cancelled.
    Cancelled,
}

// ---------------------------------------------------------------------------
// Poll loop
// ---------------------------------------------------------------------------

/// Spawn the watcher task for one job.
pub fn spawn_poll_task(
    store: JobStoreHandle,
    service: Arc<dyn ScreeningService>,
    id: JobId,
    config: PollConfig,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<PollOutcome> {
    tokio::spawn(async move {
        let outcome = poll_job(&store, service.as_ref(), &id, &config, &cancel).await;
        match outcome {
            PollOutcome::Terminal(status) => {
                tracing::info!(job_id = %id, %status, "Job settled");
            }
            PollOutcome::FailuresExhausted => {
                tracing::warn!(
                    job_id = %id,
                    max_consecutive_failures = config.max_consecutive_failures,
                    "Gave up polling after repeated request failures",
                );
            }
            PollOutcome::BudgetExhausted => {
                tracing::warn!(
                    job_id = %id,
                    max_polls = config.max_polls,
                    "Poll budget exhausted before the job settled",
                );
            }
            PollOutcome::Cancelled => {
                tracing::debug!(job_id = %id, "Poll task cancelled");
            }
        }
        outcome
    })
}

/// Drive the poll loop for one job until it stops.
///
/// Deletion is detected lazily: the task checks the store at each tick
/// and stops once its id is gone.  A response that is already in flight
/// when the job is deleted gets dropped by the store's no-op-merge rule
/// instead of resurrecting the record.
pub async fn poll_job(
    store: &JobStoreHandle,
    service: &dyn ScreeningService,
    id: &JobId,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> PollOutcome {
    // First tick fires one full interval after submission, like every
    // later one.
    let start = tokio::time::Instant::now() + config.interval;
    let mut ticker = tokio::time::interval_at(start, config.interval);

    let mut polls: u32 = 0;
    let mut consecutive_failures: u32 = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return PollOutcome::Cancelled,
            _ = ticker.tick() => {}
        }

        match store.contains(id).await {
            Ok(true) => {}
            // Deleted since the last tick, or the store shut down.
            Ok(false) | Err(_) => return PollOutcome::Cancelled,
        }

        polls += 1;
        match service.fetch_status(id).await {
            Ok(update) => {
                consecutive_failures = 0;
                let status = update.status;

                if store.merge(update).await.is_err() {
                    return PollOutcome::Cancelled;
                }
                if let Some(status) = status.filter(|s| s.is_terminal()) {
                    return PollOutcome::Terminal(status);
                }
            }
            Err(err) => {
                consecutive_failures += 1;
                tracing::warn!(
                    job_id = %id,
                    consecutive_failures,
                    error = %err,
                    "Status request failed",
                );
                if consecutive_failures >= config.max_consecutive_failures {
                    return PollOutcome::FailuresExhausted;
                }
            }
        }

        if polls >= config.max_polls {
            return PollOutcome::BudgetExhausted;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
