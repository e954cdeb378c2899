//! Side-by-side comparison coordinator (PRD-05).
//!
//! Wraps the pure membership rules of [`sift_core::compare`] with the
//! store lookups and detail fetching they need: toggling resolves the
//! candidate's fingerprint from the store, and building the view pulls
//! per-engine detail from the backend for every member concurrently.
//! Detail is transient -- cached per id while the comparison lasts and
//! discarded on exit, never written back into the job store.

use std::collections::HashMap;
use std::sync::Arc;

use sift_core::compare::{CompareError, CompareSet, CompareToggle};
use sift_core::record::JobRecord;
use sift_core::types::JobId;
use sift_screener::messages::ResultDetail;
use sift_screener::ScreeningService;

use crate::store::{JobStoreHandle, StoreClosed};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a compare toggle failed.  The store is never touched either way.
#[derive(Debug, thiserror::Error)]
pub enum CompareSelectError {
    /// The membership rules rejected the candidate.
    #[error(transparent)]
    Constraint(#[from] CompareError),

    /// The id is not (or no longer) in the job store.
    #[error("Job {0} is not being tracked")]
    UnknownJob(JobId),

    #[error(transparent)]
    Store(#[from] StoreClosed),
}

// ---------------------------------------------------------------------------
// Transient view
// ---------------------------------------------------------------------------

/// Detail fetch result for one compared job.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loaded(ResultDetail),
    /// The fetch failed for this member only; siblings are unaffected.
    Unavailable(String),
}

/// One column of the comparison view.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareEntry {
    pub record: JobRecord,
    pub detail: DetailState,
}

/// The transient comparison view, one entry per member in selection
/// order.  Rebuilt on demand and never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompareView {
    pub entries: Vec<CompareEntry>,
}

impl CompareView {
    /// Engine names appearing in any loaded detail, in first-seen order.
    ///
    /// Gives the view a stable row set even when members carry
    /// different engine lists.
    pub fn engine_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for entry in &self.entries {
            if let DetailState::Loaded(detail) = &entry.detail {
                for engine in &detail.engine_scores {
                    if !names.contains(&engine.engine) {
                        names.push(engine.engine.clone());
                    }
                }
            }
        }
        names
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Manages the compare set and its transient detail for one comparison
/// session.
pub struct CompareCoordinator {
    store: JobStoreHandle,
    service: Arc<dyn ScreeningService>,
    set: CompareSet,
    /// Successful fetches, kept for the lifetime of the set.  Failed
    /// fetches are not cached, so the next view retries them.
    details: HashMap<JobId, ResultDetail>,
}

impl CompareCoordinator {
    pub fn new(store: JobStoreHandle, service: Arc<dyn ScreeningService>) -> Self {
        Self {
            store,
            service,
            set: CompareSet::new(),
            details: HashMap::new(),
        }
    }

    /// Member ids in selection order.
    pub fn members(&self) -> &[JobId] {
        self.set.members()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.set.contains(id)
    }

    /// Add or remove a job from the comparison.
    ///
    /// The candidate's fingerprint comes from its store record; adding
    /// is rejected when the set is full or the fingerprint differs from
    /// the members' shared one.
    pub async fn toggle(&mut self, id: &str) -> Result<CompareToggle, CompareSelectError> {
        // Removal needs no lookup and must work even if the job was
        // deleted while selected.
        if self.set.contains(id) {
            return Ok(self.set.toggle(id, "")?);
        }

        let snapshot = self.store.snapshot().await?;
        let record = snapshot
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CompareSelectError::UnknownJob(id.to_string()))?;

        let toggled = self.set.toggle(id, &record.fingerprint)?;
        tracing::debug!(job_id = id, "Added to comparison");
        Ok(toggled)
    }

    /// Build the current comparison view.
    ///
    /// Detail for members without a cached fetch is requested from the
    /// backend concurrently; a failed fetch marks only that member as
    /// unavailable.  Members whose record was deleted from the store
    /// while selected are dropped from the set.
    pub async fn view(&mut self) -> Result<CompareView, StoreClosed> {
        let snapshot = self.store.snapshot().await?;
        let by_id: HashMap<&str, &JobRecord> =
            snapshot.iter().map(|r| (r.id.as_str(), r)).collect();

        // Prune members deleted from the store since selection.
        for id in self.members().to_vec() {
            if !by_id.contains_key(id.as_str()) {
                tracing::debug!(job_id = %id, "Dropping deleted job from comparison");
                let _ = self.set.toggle(&id, "");
            }
        }

        let missing: Vec<JobId> = self
            .members()
            .iter()
            .filter(|id| !self.details.contains_key(*id))
            .cloned()
            .collect();

        let fetches = missing.iter().map(|id| {
            let service = Arc::clone(&self.service);
            async move { (id.clone(), service.fetch_detail(id).await) }
        });
        let mut failures: HashMap<JobId, String> = HashMap::new();
        for (id, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(detail) => {
                    self.details.insert(id, detail);
                }
                Err(err) => {
                    tracing::warn!(job_id = %id, error = %err, "Detail fetch failed");
                    failures.insert(id, err.to_string());
                }
            }
        }

        let entries = self
            .members()
            .iter()
            .filter_map(|id| by_id.get(id.as_str()).map(|record| (id, record)))
            .map(|(id, record)| CompareEntry {
                record: (*record).clone(),
                detail: match self.details.get(id) {
                    Some(detail) => DetailState::Loaded(detail.clone()),
                    None => DetailState::Unavailable(
                        failures
                            .remove(id)
                            .unwrap_or_else(|| "Detail not available".into()),
                    ),
                },
            })
            .collect();

        Ok(CompareView { entries })
    }

    /// Leave comparison mode: clear the set and drop all cached detail.
    /// The job store is not touched.
    pub fn exit(&mut self) {
        self.set.clear();
        self.details.clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
