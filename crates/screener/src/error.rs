/// Errors from the screening backend boundary.
///
/// `Transport` covers everything that prevented a response from being
/// read (connect, DNS, TLS, timeout); `Api` is a non-2xx response;
/// `Decode` is a response body that did not match the expected shape.
/// The poll task counts all three as one failed attempt.
#[derive(Debug, thiserror::Error)]
pub enum ScreeningError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("Request failed: {0}")]
    Transport(String),

    /// The backend returned a non-2xx status code.
    #[error("Screening API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Unexpected response shape: {0}")]
    Decode(String),

    /// The batch was rejected before any request was sent.
    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),
}

impl From<reqwest::Error> for ScreeningError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ScreeningError::Decode(err.to_string())
        } else {
            ScreeningError::Transport(err.to_string())
        }
    }
}
