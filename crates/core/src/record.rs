//! Job records and the field-level merge (PRD-02).
//!
//! A [`JobRecord`] is the latest known state of one submitted document.
//! Poll tasks produce partial [`JobUpdate`]s; [`JobRecord::apply`] folds
//! them in field by field.  The merge is idempotent and keeps two
//! invariants: a terminal status never changes again, and
//! `final_score`/`decision` are present only on `PROCESSED` records.

use serde::{Deserialize, Serialize};

use crate::status::{Decision, JobStatus};
use crate::types::{Fingerprint, JobId, Timestamp};

// ---------------------------------------------------------------------------
// JobRecord
// ---------------------------------------------------------------------------

/// One submitted document and its tracked evaluation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Backend-assigned identifier, stable for the session.
    pub id: JobId,
    /// Candidate name extracted by the backend, if any.
    pub candidate_name: Option<String>,
    /// Hash of the job description this document was scored against.
    pub fingerprint: Fingerprint,
    /// Latest known evaluation status.
    pub status: JobStatus,
    /// Document quality gate score in [0, 1], from the backend.
    pub quality_score: Option<f64>,
    /// Final match score in [0, 100]; present iff `status == Processed`.
    pub final_score: Option<f64>,
    /// Backend hiring recommendation; present iff `status == Processed`.
    pub decision: Option<Decision>,
    /// Human-readable reason for a terminal failure status.
    pub error_message: Option<String>,
    /// When the document was accepted for tracking (UTC).
    pub submitted_at: Timestamp,
}

impl JobRecord {
    /// Create the initial record for a freshly submitted document.
    ///
    /// Submission responses are always non-terminal; scores arrive later
    /// through status merges.
    pub fn submitted(
        id: impl Into<JobId>,
        candidate_name: Option<String>,
        fingerprint: impl Into<Fingerprint>,
        submitted_at: Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            candidate_name,
            fingerprint: fingerprint.into(),
            status: JobStatus::Processing,
            quality_score: None,
            final_score: None,
            decision: None,
            error_message: None,
            submitted_at,
        }
    }

    /// Merge a partial update into this record.
    ///
    /// Present fields in `update` overwrite, absent fields are preserved.
    /// A terminal status is never downgraded and never switched to a
    /// different terminal value; such status changes are ignored while the
    /// remaining fields still merge.  After merging, score and decision
    /// are dropped unless the record is `PROCESSED`.
    ///
    /// Returns `true` if the record changed.
    pub fn apply(&mut self, update: &JobUpdate) -> bool {
        debug_assert_eq!(self.id, update.id, "merge keyed by id");

        let before = self.clone();

        if let Some(status) = update.status {
            if !self.status.is_terminal() {
                self.status = status;
            }
        }
        if let Some(name) = &update.candidate_name {
            self.candidate_name = Some(name.clone());
        }
        if update.quality_score.is_some() {
            self.quality_score = update.quality_score;
        }
        if update.final_score.is_some() {
            self.final_score = update.final_score;
        }
        if let Some(decision) = update.decision {
            self.decision = Some(decision);
        }
        if let Some(message) = &update.error_message {
            self.error_message = Some(message.clone());
        }

        // Score and decision only make sense on a successful terminal
        // record; strip them for every other status.
        if self.status != JobStatus::Processed {
            self.final_score = None;
            self.decision = None;
        }

        *self != before
    }
}

// ---------------------------------------------------------------------------
// JobUpdate
// ---------------------------------------------------------------------------

/// Partial job state observed from the status endpoint, keyed by `id`.
///
/// `None` means "not reported", never "clear the field".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobUpdate {
    pub id: JobId,
    pub candidate_name: Option<String>,
    pub status: Option<JobStatus>,
    pub quality_score: Option<f64>,
    pub final_score: Option<f64>,
    pub decision: Option<Decision>,
    pub error_message: Option<String>,
}

impl JobUpdate {
    /// Update carrying only a status change.
    pub fn status(id: impl Into<JobId>, status: JobStatus) -> Self {
        Self {
            id: id.into(),
            status: Some(status),
            ..Default::default()
        }
    }

    /// Update for a successful terminal result.
    pub fn processed(id: impl Into<JobId>, final_score: f64, decision: Decision) -> Self {
        Self {
            id: id.into(),
            status: Some(JobStatus::Processed),
            final_score: Some(final_score),
            decision: Some(decision),
            ..Default::default()
        }
    }

    /// Update for a terminal failure with a reason.
    pub fn failed(id: impl Into<JobId>, status: JobStatus, message: impl Into<String>) -> Self {
        debug_assert!(status.is_failure());
        Self {
            id: id.into(),
            status: Some(status),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::Decision;

    fn record(id: &str) -> JobRecord {
        JobRecord::submitted(id, None, "jd-1", chrono::Utc::now())
    }

    // -- field-level merge ---------------------------------------------------

    #[test]
    fn present_fields_overwrite_absent_fields_preserved() {
        let mut r = record("RES_1");
        r.candidate_name = Some("Ada".into());

        let changed = r.apply(&JobUpdate {
            id: "RES_1".into(),
            quality_score: Some(0.9),
            ..Default::default()
        });

        assert!(changed);
        assert_eq!(r.quality_score, Some(0.9));
        assert_eq!(r.candidate_name.as_deref(), Some("Ada"));
        assert_eq!(r.status, JobStatus::Processing);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut r = record("RES_1");
        let update = JobUpdate::processed("RES_1", 75.0, Decision::Shortlisted);

        assert!(r.apply(&update));
        let after_once = r.clone();
        assert!(!r.apply(&update));
        assert_eq!(r, after_once);
    }

    // -- status monotonicity -------------------------------------------------

    #[test]
    fn non_terminal_to_terminal_allowed() {
        let mut r = record("RES_1");
        r.apply(&JobUpdate::processed("RES_1", 82.5, Decision::Shortlisted));
        assert_eq!(r.status, JobStatus::Processed);
        assert_eq!(r.final_score, Some(82.5));
    }

    #[test]
    fn terminal_status_never_reverts() {
        let mut r = record("RES_1");
        r.apply(&JobUpdate::processed("RES_1", 75.0, Decision::Shortlisted));

        r.apply(&JobUpdate::status("RES_1", JobStatus::Processing));
        assert_eq!(r.status, JobStatus::Processed);
        assert_eq!(r.final_score, Some(75.0));
    }

    #[test]
    fn terminal_status_never_switches_terminal_value() {
        let mut r = record("RES_1");
        r.apply(&JobUpdate::failed("RES_1", JobStatus::Failed, "corrupt file"));

        r.apply(&JobUpdate::status("RES_1", JobStatus::Processed));
        assert_eq!(r.status, JobStatus::Failed);
        assert_eq!(r.error_message.as_deref(), Some("corrupt file"));
    }

    // -- score/decision invariant --------------------------------------------

    #[test]
    fn score_and_decision_only_on_processed() {
        let mut r = record("RES_1");

        // A confused update carrying a score alongside a failure status
        // must not leave the score behind.
        r.apply(&JobUpdate {
            id: "RES_1".into(),
            status: Some(JobStatus::Error),
            final_score: Some(12.0),
            decision: Some(Decision::Rejected),
            error_message: Some("pipeline crashed".into()),
            ..Default::default()
        });

        assert_eq!(r.status, JobStatus::Error);
        assert_eq!(r.final_score, None);
        assert_eq!(r.decision, None);
        assert_eq!(r.error_message.as_deref(), Some("pipeline crashed"));
    }

    #[test]
    fn score_on_non_terminal_record_is_stripped() {
        let mut r = record("RES_1");
        r.apply(&JobUpdate {
            id: "RES_1".into(),
            final_score: Some(50.0),
            ..Default::default()
        });
        assert_eq!(r.final_score, None);
    }
}
