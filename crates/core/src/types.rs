/// Job identifiers are opaque strings assigned by the screening backend
/// (e.g. `RES_1A2B3C4D`), unique within a session.
pub type JobId = String;

/// Hash of the job-description text a batch was submitted against.
/// Jobs sharing a fingerprint were scored against the same description.
pub type Fingerprint = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
