//! Session facade tying the pieces together (PRD-02, PRD-04).
//!
//! [`ScreeningTracker`] owns the store actor, the screening service
//! handle, and the poll tasks of one session.  Submission inserts the
//! accepted records and spawns one watcher per record; deletion goes to
//! the backend first and only mutates the store on success; shutdown
//! cancels every watcher and waits for a clean exit.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use sift_core::record::JobRecord;
use sift_core::types::JobId;
use sift_core::view::{
    derived_view, BatchProgress, FilterTag, RankTable, ScreeningStats, SortOrder,
};
use sift_screener::messages::{DocumentUpload, SubmitOutcome};
use sift_screener::{ScreeningError, ScreeningService};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::compare::CompareCoordinator;
use crate::poll::{spawn_poll_task, PollConfig, PollOutcome};
use crate::store::{JobStoreHandle, StoreClosed, StoreEvent};

/// How long shutdown waits for each poll task after cancellation.
const SHUTDOWN_TASK_TIMEOUT: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The screening backend rejected or failed an operation.  The
    /// store is left unchanged.
    #[error(transparent)]
    Service(#[from] ScreeningError),

    #[error(transparent)]
    Store(#[from] StoreClosed),
}

// ---------------------------------------------------------------------------
// ScreeningTracker
// ---------------------------------------------------------------------------

/// One session of batch tracking against a screening backend.
pub struct ScreeningTracker {
    store: JobStoreHandle,
    service: Arc<dyn ScreeningService>,
    poll_config: PollConfig,
    /// Master cancellation token for every spawned poll task.
    cancel: CancellationToken,
    /// Live watcher handles, joined on [`wait_settled`](Self::wait_settled)
    /// and [`shutdown`](Self::shutdown).
    tasks: Mutex<HashMap<JobId, tokio::task::JoinHandle<PollOutcome>>>,
}

impl ScreeningTracker {
    /// Create a tracker with the default poll budgets.
    pub fn new(service: Arc<dyn ScreeningService>) -> Self {
        Self::with_config(service, PollConfig::default())
    }

    pub fn with_config(service: Arc<dyn ScreeningService>, poll_config: PollConfig) -> Self {
        Self {
            store: JobStoreHandle::spawn(),
            service,
            poll_config,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    /// Handle to the underlying store.
    pub fn store(&self) -> &JobStoreHandle {
        &self.store
    }

    /// Subscribe to store change events, e.g. to re-render views.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    /// Start a new comparison session over this tracker's store.
    pub fn compare(&self) -> CompareCoordinator {
        CompareCoordinator::new(self.store.clone(), Arc::clone(&self.service))
    }

    // -- submission ---------------------------------------------------------

    /// Submit a batch of documents and start tracking every accepted one.
    ///
    /// On backend failure the whole batch is rejected and the store is
    /// untouched.  Documents the backend turned away individually are
    /// reported in the outcome but never tracked.
    pub async fn submit_batch(
        &self,
        jd_text: &str,
        documents: &[DocumentUpload],
    ) -> Result<SubmitOutcome, TrackerError> {
        let outcome = self.service.submit_batch(jd_text, documents).await?;

        self.store.insert(outcome.accepted.clone()).await?;
        for record in &outcome.accepted {
            self.spawn_watcher(record.id.clone()).await;
        }

        tracing::info!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "Tracking submitted batch",
        );
        Ok(outcome)
    }

    /// Adopt jobs already known to the backend (e.g. from an earlier
    /// session) and resume watching the ones that have not settled.
    ///
    /// Returns how many records were newly adopted.
    pub async fn adopt_existing(&self) -> Result<usize, TrackerError> {
        let records = self.service.list_jobs().await?;
        let pending: Vec<JobId> = records
            .iter()
            .filter(|r| !r.status.is_terminal())
            .map(|r| r.id.clone())
            .collect();

        let adopted = self.store.insert(records).await?;
        for id in pending {
            self.spawn_watcher(id).await;
        }
        Ok(adopted)
    }

    // -- deletion -----------------------------------------------------------

    /// Delete one job.  The backend is asked first; on failure the
    /// store keeps the record and the error is returned to the caller.
    /// The job's watcher notices the removal on its next tick.
    pub async fn delete_job(&self, id: &JobId) -> Result<(), TrackerError> {
        self.service.delete_job(id).await?;
        self.store.delete(id).await?;
        tracing::info!(job_id = %id, "Job deleted");
        Ok(())
    }

    /// Delete every job, backend first.  Watchers notice on their next
    /// tick.
    pub async fn clear_all(&self) -> Result<(), TrackerError> {
        self.service.clear_all().await?;
        let removed = self.store.clear().await?;
        tracing::info!(removed, "All jobs cleared");
        Ok(())
    }

    // -- views --------------------------------------------------------------

    /// Current store snapshot in insertion order.
    pub async fn snapshot(&self) -> Result<Vec<JobRecord>, TrackerError> {
        Ok(self.store.snapshot().await?)
    }

    /// Filtered and sorted list for display, from the latest snapshot.
    pub async fn view(
        &self,
        filter: FilterTag,
        sort: SortOrder,
    ) -> Result<Vec<JobRecord>, TrackerError> {
        let snapshot = self.store.snapshot().await?;
        Ok(derived_view(&snapshot, filter, sort))
    }

    /// Rank table over the processed jobs of the latest snapshot.
    pub async fn ranks(&self) -> Result<RankTable, TrackerError> {
        let snapshot = self.store.snapshot().await?;
        Ok(RankTable::compute(&snapshot))
    }

    /// Aggregate statistics over the latest snapshot.
    pub async fn stats(&self) -> Result<ScreeningStats, TrackerError> {
        let snapshot = self.store.snapshot().await?;
        Ok(ScreeningStats::compute(&snapshot))
    }

    /// Batch completion over the latest snapshot.  Never cached, so a
    /// batch submitted mid-flight simply widens the denominator.
    pub async fn progress(&self) -> Result<BatchProgress, TrackerError> {
        let snapshot = self.store.snapshot().await?;
        Ok(BatchProgress::compute(&snapshot))
    }

    // -- lifecycle ----------------------------------------------------------

    /// Wait until every live watcher has stopped -- because its job
    /// settled, stalled, or was deleted.
    pub async fn wait_settled(&self) {
        let handles: Vec<_> = {
            let mut tasks = self.tasks.lock().await;
            tasks.drain().collect()
        };
        for (id, handle) in handles {
            if let Err(e) = handle.await {
                tracing::error!(job_id = %id, error = %e, "Poll task panicked");
            }
        }
    }

    /// Cancel every watcher and wait briefly for a clean exit.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down screening tracker");
        self.cancel.cancel();

        let mut tasks = self.tasks.lock().await;
        for (id, handle) in tasks.drain() {
            if tokio::time::timeout(SHUTDOWN_TASK_TIMEOUT, handle)
                .await
                .is_err()
            {
                tracing::warn!(job_id = %id, "Poll task did not stop in time");
            }
        }
    }

    // -- private helpers ----------------------------------------------------

    async fn spawn_watcher(&self, id: JobId) {
        let handle = spawn_poll_task(
            self.store.clone(),
            Arc::clone(&self.service),
            id.clone(),
            self.poll_config.clone(),
            self.cancel.child_token(),
        );

        let mut tasks = self.tasks.lock().await;
        // Reap handles of watchers that already finished.
        tasks.retain(|_, h| !h.is_finished());
        tasks.insert(id, handle);
    }
}
