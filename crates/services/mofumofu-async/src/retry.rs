use backon::ExponentialBuilder;
use reqwest::Method;
use std::time::Duration;

/// Number of automatic transport-level retries after the first attempt
pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Creates the default exponential backoff builder for mofumofu API requests
///
/// Configured with:
/// - Initial interval: 300ms
/// - Max interval: 3s
/// - Max times: [`DEFAULT_MAX_RETRIES`]
/// - Factor: 2.0
/// - Jitter enabled
#[must_use]
pub fn default_backoff_builder() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_millis(300))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(DEFAULT_MAX_RETRIES)
        .with_factor(2.0)
        .with_jitter()
}

/// Determines if an HTTP status code should trigger a retry
///
/// Retries on: 408, 413, 429, 500, 502, 503, 504
#[must_use]
pub const fn is_retryable_status(code: u16) -> bool {
    matches!(code, 408 | 413 | 429 | 500 | 502 | 503 | 504)
}

/// Only idempotent methods are replayed by the transport layer
#[must_use]
pub fn is_retryable_method(method: &Method) -> bool {
    [
        Method::GET,
        Method::PUT,
        Method::DELETE,
        Method::HEAD,
        Method::OPTIONS,
    ]
    .contains(method)
}
