use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::retry::DEFAULT_MAX_RETRIES;

/// Default mofumofu API base URL
pub const MOFU_DEFAULT_BASE: &str = "http://localhost:8000";
/// Default public app URL used for OAuth redirects
pub const MOFU_DEFAULT_APP_URL: &str = "http://localhost:5173";
/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Helper to read and normalize an env var (trim + filter empty).
fn env_trimmed(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration for the mofumofu client
#[derive(Clone, Debug)]
pub struct MofuConfig {
    api_base: String,
    app_url: String,
    timeout: Duration,
    max_retries: usize,
    token_file: Option<PathBuf>,
    google_client_id: String,
    github_client_id: String,
}

impl Default for MofuConfig {
    fn default() -> Self {
        let timeout = env_trimmed("MOFU_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs);

        Self {
            api_base: env_trimmed("MOFU_API_URL").unwrap_or_else(|| MOFU_DEFAULT_BASE.into()),
            app_url: env_trimmed("MOFU_APP_URL").unwrap_or_else(|| MOFU_DEFAULT_APP_URL.into()),
            timeout,
            max_retries: DEFAULT_MAX_RETRIES,
            token_file: env_trimmed("MOFU_TOKEN_FILE").map(PathBuf::from),
            google_client_id: env_trimmed("MOFU_GOOGLE_CLIENT_ID").unwrap_or_default(),
            github_client_id: env_trimmed("MOFU_GITHUB_CLIENT_ID").unwrap_or_default(),
        }
    }
}

impl MofuConfig {
    /// Creates a new configuration with default settings
    ///
    /// Attempts to read from environment variables:
    /// - `MOFU_API_URL` for the API base URL (defaults to `http://localhost:8000`)
    /// - `MOFU_TIMEOUT_SECS` for the request timeout (defaults to 10)
    /// - `MOFU_TOKEN_FILE` for persisting the access token between runs
    /// - `MOFU_APP_URL`, `MOFU_GOOGLE_CLIENT_ID`, `MOFU_GITHUB_CLIENT_ID` for OAuth URLs
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API base URL
    #[must_use]
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Sets the public app URL
    #[must_use]
    pub fn with_app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = url.into();
        self
    }

    /// Sets the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the transport retry budget
    #[must_use]
    pub const fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Persists the access token to the given file
    #[must_use]
    pub fn with_token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_file = Some(path.into());
        self
    }

    /// Sets the Google OAuth client id
    #[must_use]
    pub fn with_google_client_id(mut self, id: impl Into<String>) -> Self {
        self.google_client_id = id.into();
        self
    }

    /// Sets the GitHub OAuth client id
    #[must_use]
    pub fn with_github_client_id(mut self, id: impl Into<String>) -> Self {
        self.github_client_id = id.into();
        self
    }

    /// Returns the configured API base URL
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Returns the configured app URL
    #[must_use]
    pub fn app_url(&self) -> &str {
        &self.app_url
    }

    /// Returns the Google OAuth client id
    #[must_use]
    pub fn google_client_id(&self) -> &str {
        &self.google_client_id
    }

    /// Returns the GitHub OAuth client id
    #[must_use]
    pub fn github_client_id(&self) -> &str {
        &self.github_client_id
    }
}

/// Configuration trait for the mofumofu client
///
/// Implement this trait to point the client at a different deployment or to add
/// static headers. Credentials are not part of the configuration; they live in
/// [`crate::CredentialStore`].
pub trait Config: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Returns static HTTP headers included in every request
    ///
    /// # Errors
    ///
    /// Returns an error if header values contain invalid characters.
    fn headers(&self) -> Result<HeaderMap, crate::error::MofuError>;

    /// Constructs the full URL for an API endpoint
    fn url(&self, path: &str) -> String;

    /// Returns query parameters to include in requests
    fn query(&self) -> Vec<(&str, &str)>;

    /// Per-request timeout
    fn timeout(&self) -> Duration;

    /// Transport-level retry budget
    fn max_retries(&self) -> usize;

    /// File the access token is persisted to; `None` keeps it in memory only
    fn token_file(&self) -> Option<&Path> {
        None
    }
}

impl Config for MofuConfig {
    fn headers(&self) -> Result<HeaderMap, crate::error::MofuError> {
        let mut h = HeaderMap::new();
        h.insert(ACCEPT, HeaderValue::from_static("application/json"));
        h.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(h)
    }

    fn url(&self, path: &str) -> String {
        let base = self.api_base.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    fn query(&self) -> Vec<(&str, &str)> {
        vec![]
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn max_retries(&self) -> usize {
        self.max_retries
    }

    fn token_file(&self) -> Option<&Path> {
        self.token_file.as_deref()
    }
}
