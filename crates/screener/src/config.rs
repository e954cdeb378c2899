use std::time::Duration;

/// Screening backend connection settings loaded from environment
/// variables.
///
/// All fields have defaults suitable for a local backend; override via
/// environment variables in other setups.
#[derive(Debug, Clone)]
pub struct ScreenerConfig {
    /// Base API URL (default: `http://localhost:8000/api`).
    pub api_url: String,
    /// Per-request timeout (default: 30 seconds).
    pub request_timeout: Duration,
}

impl ScreenerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                     |
    /// |------------------------|-----------------------------|
    /// | `SCREENER_API_URL`     | `http://localhost:8000/api` |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                        |
    pub fn from_env() -> Self {
        let api_url = std::env::var("SCREENER_API_URL")
            .unwrap_or_else(|_| "http://localhost:8000/api".into());
        // Trailing slashes would produce `//` when joining paths.
        let api_url = api_url.trim_end_matches('/').to_string();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            api_url,
            request_timeout: Duration::from_secs(request_timeout_secs),
        }
    }
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8000/api".into(),
            request_timeout: Duration::from_secs(30),
        }
    }
}
