//! REST API client for the screening backend's HTTP endpoints.
//!
//! Wraps batch submission, status polling, result detail, listing, and
//! deletion using [`reqwest`].  Documents are validated client-side
//! before anything is sent -- an invalid batch is rejected as a whole,
//! without a request and without partial submission.

use crate::config::ScreenerConfig;
use crate::error::ScreeningError;
use crate::messages::{
    DocumentUpload, ListResponse, ResultDetail, StatusResponse, SubmitBatchResponse,
};

// ---------------------------------------------------------------------------
// Submission limits
// ---------------------------------------------------------------------------

/// Maximum size the backend accepts per document.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

/// File extensions the backend's ingestion pipeline can read.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".docx"];

/// Validate a single document against the backend's upload limits.
pub fn validate_document(doc: &DocumentUpload) -> Result<(), ScreeningError> {
    let name = doc.file_name.to_lowercase();
    if !ALLOWED_EXTENSIONS.iter().any(|ext| name.ends_with(ext)) {
        return Err(ScreeningError::InvalidSubmission(format!(
            "Unsupported file type: '{}'. Allowed: {}",
            doc.file_name,
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }
    if doc.bytes.is_empty() {
        return Err(ScreeningError::InvalidSubmission(format!(
            "Empty file: '{}'",
            doc.file_name
        )));
    }
    if doc.bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(ScreeningError::InvalidSubmission(format!(
            "File too large: '{}' ({:.2}MB, max 10MB)",
            doc.file_name,
            doc.bytes.len() as f64 / 1024.0 / 1024.0
        )));
    }
    Ok(())
}

/// Validate a whole batch before submission.
///
/// Any invalid input rejects the entire batch -- nothing is sent and no
/// job is tracked.
pub fn validate_batch(jd_text: &str, documents: &[DocumentUpload]) -> Result<(), ScreeningError> {
    if jd_text.trim().is_empty() {
        return Err(ScreeningError::InvalidSubmission(
            "Job description must not be empty".into(),
        ));
    }
    if documents.is_empty() {
        return Err(ScreeningError::InvalidSubmission(
            "At least one document is required".into(),
        ));
    }
    for doc in documents {
        validate_document(doc)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ScreenerApi
// ---------------------------------------------------------------------------

/// HTTP client for one screening backend.
pub struct ScreenerApi {
    client: reqwest::Client,
    api_url: String,
}

impl ScreenerApi {
    /// Create a new API client from configuration.
    pub fn new(config: &ScreenerConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .expect("reqwest client construction only fails on invalid TLS config");
        Self {
            client,
            api_url: config.api_url.clone(),
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: String) -> Self {
        Self { client, api_url }
    }

    /// Base API URL this client talks to.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Submit a batch of documents against a job description.
    ///
    /// Sends a `POST /analyze` multipart request with the `jd_text`
    /// field and one `files` part per document.  The backend answers
    /// with one entry per document; rejected documents carry a reason
    /// instead of an id.
    pub async fn submit_batch(
        &self,
        jd_text: &str,
        documents: &[DocumentUpload],
    ) -> Result<SubmitBatchResponse, ScreeningError> {
        validate_batch(jd_text, documents)?;

        let mut form = reqwest::multipart::Form::new().text("jd_text", jd_text.to_string());
        for doc in documents {
            let part = reqwest::multipart::Part::bytes(doc.bytes.clone())
                .file_name(doc.file_name.clone());
            form = form.part("files", part);
        }

        let response = self
            .client
            .post(format!("{}/analyze", self.api_url))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current status of one job.
    ///
    /// Sends a `GET /resumes/status/{id}` request.
    pub async fn get_status(&self, id: &str) -> Result<StatusResponse, ScreeningError> {
        let response = self
            .client
            .get(format!("{}/resumes/status/{}", self.api_url, id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the per-engine result detail for one job.
    ///
    /// Sends a `GET /resumes/results/{id}` request.
    pub async fn get_result_detail(&self, id: &str) -> Result<ResultDetail, ScreeningError> {
        let response = self
            .client
            .get(format!("{}/resumes/results/{}", self.api_url, id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// List all jobs known to the backend.
    ///
    /// Sends a `GET /resumes` request.
    pub async fn list_jobs(&self) -> Result<ListResponse, ScreeningError> {
        let response = self
            .client
            .get(format!("{}/resumes", self.api_url))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Delete one job and its stored results on the backend.
    ///
    /// Sends a `DELETE /resumes/{id}` request.
    pub async fn delete_job(&self, id: &str) -> Result<(), ScreeningError> {
        let response = self
            .client
            .delete(format!("{}/resumes/{}", self.api_url, id))
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Delete every job on the backend.
    ///
    /// Sends a `DELETE /resumes` request.
    pub async fn clear_all(&self) -> Result<(), ScreeningError> {
        let response = self
            .client
            .delete(format!("{}/resumes", self.api_url))
            .send()
            .await?;

        Self::check_status(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or [`ScreeningError::Api`] with
    /// the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ScreeningError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ScreeningError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ScreeningError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), ScreeningError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn doc(name: &str, len: usize) -> DocumentUpload {
        DocumentUpload {
            file_name: name.into(),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn accepts_pdf_and_docx() {
        assert!(validate_document(&doc("resume.pdf", 128)).is_ok());
        assert!(validate_document(&doc("Resume.DOCX", 128)).is_ok());
    }

    #[test]
    fn rejects_unsupported_extension() {
        assert_matches!(
            validate_document(&doc("resume.txt", 128)),
            Err(ScreeningError::InvalidSubmission(_))
        );
    }

    #[test]
    fn rejects_empty_and_oversized_files() {
        assert_matches!(
            validate_document(&doc("resume.pdf", 0)),
            Err(ScreeningError::InvalidSubmission(_))
        );
        assert_matches!(
            validate_document(&doc("resume.pdf", MAX_DOCUMENT_BYTES + 1)),
            Err(ScreeningError::InvalidSubmission(_))
        );
    }

    #[test]
    fn batch_rejected_as_a_whole() {
        let docs = vec![doc("ok.pdf", 128), doc("bad.txt", 128)];
        assert_matches!(
            validate_batch("Backend engineer, Rust", &docs),
            Err(ScreeningError::InvalidSubmission(_))
        );

        assert_matches!(
            validate_batch("   ", &[doc("ok.pdf", 128)]),
            Err(ScreeningError::InvalidSubmission(_))
        );
        assert_matches!(
            validate_batch("Backend engineer", &[]),
            Err(ScreeningError::InvalidSubmission(_))
        );
    }
}
