//! Wire types for the screening backend's REST endpoints.
//!
//! Shapes mirror the backend responses exactly; conversions into the
//! domain types of `sift-core` live here so that the rest of the
//! workspace never sees raw JSON.

use serde::Deserialize;
use sift_core::record::{JobRecord, JobUpdate};
use sift_core::status::{Decision, JobStatus};
use sift_core::types::{Fingerprint, JobId, Timestamp};

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// One document handed to `submit_batch`, already read into memory.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    /// Original file name, including extension.
    pub file_name: String,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Response of `POST /analyze`.
#[derive(Debug, Deserialize)]
pub struct SubmitBatchResponse {
    pub message: String,
    pub resumes: Vec<SubmitEntry>,
}

/// One per-document entry of the submission response.
///
/// Accepted documents carry `resume_id`/`jd_hash`; documents the backend
/// turned away carry `filename`/`reason` instead.
#[derive(Debug, Deserialize)]
pub struct SubmitEntry {
    pub resume_id: Option<JobId>,
    pub candidate_name: Option<String>,
    pub jd_hash: Option<Fingerprint>,
    /// Raw backend status string -- `PROCESSING` for accepted documents,
    /// `REJECTED`/`ERROR` otherwise.  Not a [`JobStatus`]: rejection
    /// statuses never enter the store.
    pub status: Option<String>,
    pub filename: Option<String>,
    pub reason: Option<String>,
}

/// A document the backend refused to queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedDocument {
    pub file_name: String,
    pub reason: String,
}

/// Result of a successful batch submission: the records now being
/// tracked plus any documents the backend turned away.
#[derive(Debug, Default)]
pub struct SubmitOutcome {
    pub accepted: Vec<JobRecord>,
    pub rejected: Vec<RejectedDocument>,
}

impl SubmitOutcome {
    /// Split the raw submission entries into tracked records and
    /// rejections.  `submitted_at` stamps every accepted record.
    pub fn from_entries(entries: Vec<SubmitEntry>, submitted_at: Timestamp) -> Self {
        let mut outcome = Self::default();
        for entry in entries {
            match (entry.resume_id, entry.jd_hash) {
                (Some(id), Some(fingerprint)) => {
                    outcome.accepted.push(JobRecord::submitted(
                        id,
                        entry.candidate_name,
                        fingerprint,
                        submitted_at,
                    ));
                }
                _ => outcome.rejected.push(RejectedDocument {
                    file_name: entry.filename.unwrap_or_else(|| "<unnamed>".into()),
                    reason: entry
                        .reason
                        .unwrap_or_else(|| "Rejected by the backend".into()),
                }),
            }
        }
        outcome
    }
}

// ---------------------------------------------------------------------------
// Status polling
// ---------------------------------------------------------------------------

/// Response of `GET /resumes/status/{id}`.
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    pub resume_id: JobId,
    pub candidate_name: Option<String>,
    pub status: JobStatus,
    pub quality_score: Option<f64>,
    pub final_score: Option<f64>,
    pub decision: Option<Decision>,
    pub error_message: Option<String>,
}

impl From<StatusResponse> for JobUpdate {
    fn from(resp: StatusResponse) -> Self {
        JobUpdate {
            id: resp.resume_id,
            candidate_name: resp.candidate_name,
            status: Some(resp.status),
            quality_score: resp.quality_score,
            final_score: resp.final_score,
            decision: resp.decision,
            error_message: resp.error_message,
        }
    }
}

// ---------------------------------------------------------------------------
// Result detail
// ---------------------------------------------------------------------------

/// Response of `GET /resumes/results/{id}` -- the supplementary detail
/// used by comparison and drill-down views, never merged into the store.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ResultDetail {
    pub resume_id: JobId,
    #[serde(default)]
    pub engine_scores: Vec<EngineScore>,
    #[serde(default)]
    pub explanations: Vec<String>,
    pub skill_data: Option<SkillData>,
}

/// Sub-score from one scoring engine (skill match, experience, ...).
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct EngineScore {
    pub engine: String,
    pub score: f64,
}

/// Matched/missing skill lists from the skill-gap analysis.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct SkillData {
    #[serde(default)]
    pub matched: Vec<String>,
    #[serde(default)]
    pub missing: Vec<String>,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Response of `GET /resumes`.
#[derive(Debug, Deserialize)]
pub struct ListResponse {
    pub resumes: Vec<ListedJob>,
}

/// One row of the job listing, used to adopt previously submitted jobs
/// into a fresh session.
#[derive(Debug, Deserialize)]
pub struct ListedJob {
    pub resume_id: JobId,
    pub candidate_name: Option<String>,
    pub jd_hash: Option<Fingerprint>,
    pub status: JobStatus,
    pub quality_score: Option<f64>,
    pub final_score: Option<f64>,
    pub decision: Option<Decision>,
    pub error_message: Option<String>,
    pub upload_time: Option<Timestamp>,
}

impl ListedJob {
    /// Rebuild a tracked record from a listing row.
    pub fn into_record(self, fallback_time: Timestamp) -> JobRecord {
        let mut record = JobRecord::submitted(
            self.resume_id.clone(),
            self.candidate_name.clone(),
            self.jd_hash.unwrap_or_default(),
            self.upload_time.unwrap_or(fallback_time),
        );
        record.apply(&JobUpdate {
            id: self.resume_id,
            candidate_name: self.candidate_name,
            status: Some(self.status),
            quality_score: self.quality_score,
            final_score: self.final_score,
            decision: self.decision,
            error_message: self.error_message,
        });
        record
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
