//! The screening-service seam consumed by the tracker.
//!
//! [`ScreeningService`] abstracts the backend so that poll tasks, the
//! compare coordinator, and tests all talk to the same interface.  The
//! production implementation is [`ScreenerApi`]; tests use scripted
//! in-memory mocks.

use async_trait::async_trait;
use sift_core::record::{JobRecord, JobUpdate};
use sift_core::types::JobId;

use crate::api::ScreenerApi;
use crate::error::ScreeningError;
use crate::messages::{DocumentUpload, ResultDetail, SubmitOutcome};

/// Boundary to the external scoring service, in domain terms.
#[async_trait]
pub trait ScreeningService: Send + Sync {
    /// Submit a batch of documents against a job description.
    ///
    /// On success the returned records are non-terminal and ready to be
    /// tracked; on failure the whole batch is rejected and nothing is
    /// tracked.
    async fn submit_batch(
        &self,
        jd_text: &str,
        documents: &[DocumentUpload],
    ) -> Result<SubmitOutcome, ScreeningError>;

    /// Fetch the latest known state of one job.
    async fn fetch_status(&self, id: &JobId) -> Result<JobUpdate, ScreeningError>;

    /// Fetch the supplementary result detail for one job.
    async fn fetch_detail(&self, id: &JobId) -> Result<ResultDetail, ScreeningError>;

    /// List every job known to the backend.
    async fn list_jobs(&self) -> Result<Vec<JobRecord>, ScreeningError>;

    /// Delete one job on the backend.
    async fn delete_job(&self, id: &JobId) -> Result<(), ScreeningError>;

    /// Delete every job on the backend.
    async fn clear_all(&self) -> Result<(), ScreeningError>;
}

#[async_trait]
impl ScreeningService for ScreenerApi {
    async fn submit_batch(
        &self,
        jd_text: &str,
        documents: &[DocumentUpload],
    ) -> Result<SubmitOutcome, ScreeningError> {
        let response = ScreenerApi::submit_batch(self, jd_text, documents).await?;
        let outcome = SubmitOutcome::from_entries(response.resumes, chrono::Utc::now());

        tracing::info!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "Batch submitted",
        );
        Ok(outcome)
    }

    async fn fetch_status(&self, id: &JobId) -> Result<JobUpdate, ScreeningError> {
        let response = self.get_status(id).await?;
        Ok(response.into())
    }

    async fn fetch_detail(&self, id: &JobId) -> Result<ResultDetail, ScreeningError> {
        self.get_result_detail(id).await
    }

    async fn list_jobs(&self) -> Result<Vec<JobRecord>, ScreeningError> {
        let response = ScreenerApi::list_jobs(self).await?;
        let now = chrono::Utc::now();
        Ok(response
            .resumes
            .into_iter()
            .map(|job| job.into_record(now))
            .collect())
    }

    async fn delete_job(&self, id: &JobId) -> Result<(), ScreeningError> {
        ScreenerApi::delete_job(self, id).await
    }

    async fn clear_all(&self) -> Result<(), ScreeningError> {
        ScreenerApi::clear_all(self).await
    }
}
