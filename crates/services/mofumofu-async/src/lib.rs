#![deny(warnings)]
#![deny(clippy::all)]
#![deny(missing_docs)]

//! Async mofumofu API client with a shared credential store, single-flight token
//! refresh, retries, and wiremock tests.

/// HTTP client implementation
pub mod client;
/// Configuration types for the client
pub mod config;
/// Access credential storage
pub mod credential;
/// Error types and server error classification
pub mod error;
/// OAuth authorization URLs
pub mod oauth;
/// Signed-in user profile cache
pub mod profile;
/// Expired-credential recovery
pub mod refresh;
/// Request descriptions
pub mod request;
/// API resource implementations
pub mod resources;
/// Retry logic utilities
pub mod retry;
/// Test support utilities (for use in tests)
#[doc(hidden)]
pub mod test_support;
mod transport;
/// Request and response types
pub mod types;

pub use crate::client::{Client, ClientBuilder, PublicChannel};
pub use crate::config::{Config, MofuConfig};
pub use crate::credential::{Credential, CredentialEvent, CredentialStore, Generation};
pub use crate::error::{ApiError, ErrorBody, ErrorKind, MofuError, classify};
pub use crate::refresh::{RefreshCoordinator, RefreshOutcome, RefreshState, SessionExchange};
pub use crate::request::{ApiRequest, MultipartBody, RequestBody};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::types::*;
    pub use crate::{Client, CredentialStore, ErrorKind, MofuConfig, MofuError};
}
