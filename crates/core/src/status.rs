//! Job status and decision enums (PRD-02).
//!
//! Wire names match the screening backend exactly -- the backend reports
//! `INVALID_RESUME` for documents that parsed but failed validation, and
//! `FAILED` for pipeline failures with a reason attached.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Decision thresholds
// ---------------------------------------------------------------------------

/// Minimum final score for a `SHORTLISTED` decision.
pub const SHORTLIST_THRESHOLD: f64 = 60.0;
/// Minimum final score for a `REVIEW` decision; below this is `REJECTED`.
pub const REVIEW_THRESHOLD: f64 = 40.0;

// ---------------------------------------------------------------------------
// JobStatus
// ---------------------------------------------------------------------------

/// Evaluation status of one submitted document.
///
/// `Uploaded` and `Processing` are non-terminal; everything else is
/// terminal and final -- a terminal status never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Accepted by the backend, not yet picked up by the pipeline.
    Uploaded,
    /// The scoring pipeline is working on the document.
    Processing,
    /// Scored successfully; `final_score` and `decision` are set.
    Processed,
    /// The pipeline failed; `error_message` carries the reason.
    Failed,
    /// The document was readable but is not a usable resume.
    InvalidResume,
    /// Unexpected backend error during processing.
    Error,
}

impl JobStatus {
    /// Whether this status is terminal (no further automatic transition).
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Processed | JobStatus::Failed | JobStatus::InvalidResume | JobStatus::Error
        )
    }

    /// Whether this status is a terminal failure (carries an error message,
    /// never a score).
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            JobStatus::Failed | JobStatus::InvalidResume | JobStatus::Error
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Uploaded => "UPLOADED",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Processed => "PROCESSED",
            JobStatus::Failed => "FAILED",
            JobStatus::InvalidResume => "INVALID_RESUME",
            JobStatus::Error => "ERROR",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Hiring recommendation derived by the backend from the final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Shortlisted,
    Review,
    Rejected,
}

impl Decision {
    /// Derive the decision for a final score, using the same cutoffs as
    /// the backend (>= 60 shortlist, >= 40 review, else reject).
    pub fn for_score(score: f64) -> Self {
        if score >= SHORTLIST_THRESHOLD {
            Decision::Shortlisted
        } else if score >= REVIEW_THRESHOLD {
            Decision::Review
        } else {
            Decision::Rejected
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Decision::Shortlisted => "SHORTLISTED",
            Decision::Review => "REVIEW",
            Decision::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::Uploaded.is_terminal());
        assert!(!JobStatus::Processing.is_terminal());
        assert!(JobStatus::Processed.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(JobStatus::InvalidResume.is_terminal());
        assert!(JobStatus::Error.is_terminal());
    }

    #[test]
    fn failure_statuses_exclude_processed() {
        assert!(!JobStatus::Processed.is_failure());
        assert!(JobStatus::Failed.is_failure());
        assert!(JobStatus::InvalidResume.is_failure());
        assert!(JobStatus::Error.is_failure());
    }

    #[test]
    fn wire_names_round_trip() {
        let parsed: JobStatus = serde_json::from_str("\"INVALID_RESUME\"").unwrap();
        assert_eq!(parsed, JobStatus::InvalidResume);
        assert_eq!(
            serde_json::to_string(&JobStatus::Processing).unwrap(),
            "\"PROCESSING\""
        );
        assert_eq!(
            serde_json::to_string(&Decision::Shortlisted).unwrap(),
            "\"SHORTLISTED\""
        );
    }

    #[test]
    fn decision_cutoffs() {
        assert_eq!(Decision::for_score(60.0), Decision::Shortlisted);
        assert_eq!(Decision::for_score(59.99), Decision::Review);
        assert_eq!(Decision::for_score(40.0), Decision::Review);
        assert_eq!(Decision::for_score(39.99), Decision::Rejected);
    }
}
