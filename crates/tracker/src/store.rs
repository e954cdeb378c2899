//! Single-owner job store actor (PRD-02).
//!
//! The session's job collection is owned by exactly one Tokio task;
//! poll tasks and user actions mutate it by sending commands through a
//! [`JobStoreHandle`], never by touching shared memory.  This keeps
//! merge/delete/clear strictly serialized without any locking, also
//! under the multi-threaded runtime.
//!
//! Effective mutations are announced on a broadcast channel so the
//! presentation layer can recompute its derived views.

use sift_core::record::{JobRecord, JobUpdate};
use sift_core::types::JobId;
use tokio::sync::{broadcast, mpsc, oneshot};

/// Command backlog before senders are backpressured.
const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Broadcast capacity for store change events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A change that actually altered the store.
///
/// No-op merges (absent id, or an update that changed nothing) emit no
/// event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// New records were appended by a submission.
    Inserted(Vec<JobId>),
    /// An update changed the record with this id.
    Merged(JobId),
    /// The record with this id was removed.
    Deleted(JobId),
    /// The store was emptied.
    Cleared,
}

/// The store task has stopped and can no longer accept commands.
///
/// Only happens during shutdown; every in-flight operation surfaces it
/// instead of panicking.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Job store task stopped")]
pub struct StoreClosed;

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

enum StoreCommand {
    Insert(Vec<JobRecord>, oneshot::Sender<usize>),
    Merge(JobUpdate),
    Delete(JobId, oneshot::Sender<bool>),
    Clear(oneshot::Sender<usize>),
    Snapshot(oneshot::Sender<Vec<JobRecord>>),
    Contains(JobId, oneshot::Sender<bool>),
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cloneable handle to the store actor.
///
/// All methods are async because they round-trip through the actor's
/// command channel; reads return a snapshot that is consistent at the
/// moment the actor processed the request.
#[derive(Clone)]
pub struct JobStoreHandle {
    tx: mpsc::Sender<StoreCommand>,
    events: broadcast::Sender<StoreEvent>,
}

impl JobStoreHandle {
    /// Spawn the store actor and return a handle to it.
    ///
    /// The actor runs until the last handle is dropped.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let actor = StoreActor {
            records: Vec::new(),
            events: events.clone(),
        };
        tokio::spawn(actor.run(rx));

        Self { tx, events }
    }

    /// Subscribe to store change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Append records that are not yet present.
    ///
    /// First insertion wins the position: ids already in the store are
    /// skipped, existing records are left untouched.  Returns how many
    /// records were actually inserted.
    pub async fn insert(&self, records: Vec<JobRecord>) -> Result<usize, StoreClosed> {
        self.request(|reply| StoreCommand::Insert(records, reply))
            .await
    }

    /// Merge a partial update into the record with the update's id.
    ///
    /// A merge against an absent id is a no-op -- a deleted job is never
    /// resurrected by a late poll response.
    pub async fn merge(&self, update: JobUpdate) -> Result<(), StoreClosed> {
        self.tx
            .send(StoreCommand::Merge(update))
            .await
            .map_err(|_| StoreClosed)
    }

    /// Remove one record outright.  Returns whether it was present.
    pub async fn delete(&self, id: &str) -> Result<bool, StoreClosed> {
        self.request(|reply| StoreCommand::Delete(id.to_string(), reply))
            .await
    }

    /// Empty the store.  Returns how many records were removed.
    pub async fn clear(&self) -> Result<usize, StoreClosed> {
        self.request(StoreCommand::Clear).await
    }

    /// Copy of all records in insertion order.
    pub async fn snapshot(&self) -> Result<Vec<JobRecord>, StoreClosed> {
        self.request(StoreCommand::Snapshot).await
    }

    /// Whether a record with this id currently exists.
    pub async fn contains(&self, id: &str) -> Result<bool, StoreClosed> {
        self.request(|reply| StoreCommand::Contains(id.to_string(), reply))
            .await
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> StoreCommand,
    ) -> Result<T, StoreClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(make(reply_tx))
            .await
            .map_err(|_| StoreClosed)?;
        reply_rx.await.map_err(|_| StoreClosed)
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

struct StoreActor {
    /// Records in insertion order.  Sessions track one batch upload at
    /// a time, so linear id lookups are fine here.
    records: Vec<JobRecord>,
    events: broadcast::Sender<StoreEvent>,
}

impl StoreActor {
    async fn run(mut self, mut rx: mpsc::Receiver<StoreCommand>) {
        tracing::debug!("Job store actor started");
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }
        tracing::debug!("Job store actor stopped");
    }

    fn handle(&mut self, command: StoreCommand) {
        match command {
            StoreCommand::Insert(records, reply) => {
                let mut inserted = Vec::new();
                for record in records {
                    if self.position(&record.id).is_none() {
                        inserted.push(record.id.clone());
                        self.records.push(record);
                    }
                }
                let count = inserted.len();
                if !inserted.is_empty() {
                    self.publish(StoreEvent::Inserted(inserted));
                }
                let _ = reply.send(count);
            }

            StoreCommand::Merge(update) => {
                match self.position(&update.id) {
                    Some(pos) => {
                        if self.records[pos].apply(&update) {
                            self.publish(StoreEvent::Merged(update.id));
                        }
                    }
                    // Absent target: the job was deleted while the
                    // update was in flight.  Drop it.
                    None => {
                        tracing::debug!(job_id = %update.id, "Dropping update for absent job");
                    }
                }
            }

            StoreCommand::Delete(id, reply) => {
                let existed = match self.position(&id) {
                    Some(pos) => {
                        self.records.remove(pos);
                        self.publish(StoreEvent::Deleted(id));
                        true
                    }
                    None => false,
                };
                let _ = reply.send(existed);
            }

            StoreCommand::Clear(reply) => {
                let count = self.records.len();
                self.records.clear();
                if count > 0 {
                    self.publish(StoreEvent::Cleared);
                }
                let _ = reply.send(count);
            }

            StoreCommand::Snapshot(reply) => {
                let _ = reply.send(self.records.clone());
            }

            StoreCommand::Contains(id, reply) => {
                let _ = reply.send(self.position(&id).is_some());
            }
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|r| r.id == id)
    }

    fn publish(&self, event: StoreEvent) {
        // SendError only means there are no subscribers right now.
        let _ = self.events.send(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::status::{Decision, JobStatus};

    fn record(id: &str) -> JobRecord {
        JobRecord::submitted(id, None, "jd-1", chrono::Utc::now())
    }

    #[tokio::test]
    async fn insert_preserves_order_and_first_insertion_wins() {
        let store = JobStoreHandle::spawn();

        store
            .insert(vec![record("RES_A"), record("RES_B")])
            .await
            .unwrap();

        // Re-inserting RES_A must not move it or replace it.
        let mut renamed = record("RES_A");
        renamed.candidate_name = Some("Impostor".into());
        let inserted = store.insert(vec![renamed, record("RES_C")]).await.unwrap();
        assert_eq!(inserted, 1);

        let snap = store.snapshot().await.unwrap();
        let ids: Vec<_> = snap.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["RES_A", "RES_B", "RES_C"]);
        assert_eq!(snap[0].candidate_name, None);
    }

    #[tokio::test]
    async fn merge_updates_in_place_without_reordering() {
        let store = JobStoreHandle::spawn();
        store
            .insert(vec![record("RES_A"), record("RES_B")])
            .await
            .unwrap();

        store
            .merge(JobUpdate::processed("RES_A", 75.0, Decision::Shortlisted))
            .await
            .unwrap();

        let snap = store.snapshot().await.unwrap();
        assert_eq!(snap[0].id, "RES_A");
        assert_eq!(snap[0].status, JobStatus::Processed);
        assert_eq!(snap[0].final_score, Some(75.0));
        assert_eq!(snap[1].status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn merge_against_absent_id_is_a_noop() {
        let store = JobStoreHandle::spawn();
        store.insert(vec![record("RES_A")]).await.unwrap();

        store
            .merge(JobUpdate::processed("RES_GHOST", 90.0, Decision::Shortlisted))
            .await
            .unwrap();

        let snap = store.snapshot().await.unwrap();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].id, "RES_A");
    }

    #[tokio::test]
    async fn delete_then_late_merge_does_not_resurrect() {
        let store = JobStoreHandle::spawn();
        store.insert(vec![record("RES_C")]).await.unwrap();

        assert!(store.delete("RES_C").await.unwrap());
        // The in-flight poll response arrives after the deletion.
        store
            .merge(JobUpdate::processed("RES_C", 88.0, Decision::Shortlisted))
            .await
            .unwrap();

        assert!(!store.contains("RES_C").await.unwrap());
        assert!(store.snapshot().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_empties_the_store() {
        let store = JobStoreHandle::spawn();
        store
            .insert(vec![record("RES_A"), record("RES_B")])
            .await
            .unwrap();

        assert_eq!(store.clear().await.unwrap(), 2);
        assert!(store.snapshot().await.unwrap().is_empty());
        assert!(!store.delete("RES_A").await.unwrap());
    }

    #[tokio::test]
    async fn effective_changes_are_broadcast() {
        let store = JobStoreHandle::spawn();
        let mut events = store.subscribe();

        store.insert(vec![record("RES_A")]).await.unwrap();
        store
            .merge(JobUpdate::status("RES_A", JobStatus::Uploaded))
            .await
            .unwrap();
        // No-op merge: same status again.
        store
            .merge(JobUpdate::status("RES_A", JobStatus::Uploaded))
            .await
            .unwrap();
        store.delete("RES_A").await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::Inserted(vec!["RES_A".into()])
        );
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Merged("RES_A".into()));
        // The no-op merge emitted nothing, so the next event is the delete.
        assert_eq!(events.recv().await.unwrap(), StoreEvent::Deleted("RES_A".into()));
    }

    #[tokio::test]
    async fn interleaved_merges_from_many_tasks_all_land() {
        let store = JobStoreHandle::spawn();
        store
            .insert((0..10).map(|i| record(&format!("RES_{i}"))).collect())
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("RES_{i}");
                let score = i as f64 * 10.0;
                store
                    .merge(JobUpdate::processed(&id, score, Decision::for_score(score)))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let snap = store.snapshot().await.unwrap();
        assert!(snap.iter().all(|r| r.status == JobStatus::Processed));
        // Insertion order survives concurrent merging.
        let ids: Vec<_> = snap.iter().map(|r| r.id.clone()).collect();
        let expected: Vec<_> = (0..10).map(|i| format!("RES_{i}")).collect();
        assert_eq!(ids, expected);
    }
}
