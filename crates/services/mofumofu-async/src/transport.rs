use backon::{ExponentialBuilder, Retryable};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    credential::{Credential, CredentialStore},
    error::MofuError,
    request::ApiRequest,
    retry,
};

/// Source of the bearer attached to each attempt
#[derive(Debug, Clone, Copy)]
pub(crate) enum Bearer<'a> {
    /// No `Authorization` header
    Anonymous,
    /// Whatever the store holds when the attempt is built
    Session(&'a CredentialStore),
}

impl Bearer<'_> {
    fn current(self) -> Credential {
        match self {
            Self::Anonymous => Credential::empty(),
            Self::Session(store) => store.get(),
        }
    }
}

/// One configured HTTP channel: a reqwest client plus the retry policy
///
/// Knows nothing about refresh; a non-success response comes back as a classified
/// [`MofuError::Api`] once the retry budget is spent.
#[derive(Debug, Clone)]
pub(crate) struct Transport<C: Config> {
    http: reqwest::Client,
    config: C,
    backoff: ExponentialBuilder,
}

impl<C: Config> Transport<C> {
    pub(crate) const fn new(http: reqwest::Client, config: C, backoff: ExponentialBuilder) -> Self {
        Self {
            http,
            config,
            backoff,
        }
    }

    pub(crate) const fn config(&self) -> &C {
        &self.config
    }

    /// Sends `request`, retrying transient failures, and returns the success body
    ///
    /// The bearer is read again for every attempt, so a retry after a sign-out
    /// goes out without one.
    pub(crate) async fn execute(
        &self,
        request: &ApiRequest,
        bearer: Bearer<'_>,
    ) -> Result<Bytes, MofuError> {
        let idempotent = retry::is_retryable_method(request.method());

        (|| async {
            let built = request.build(&self.http, &self.config, &bearer.current())?;
            let response = self.http.execute(built).await?;

            let status = response.status();
            let bytes = response.bytes().await?;

            if status.is_success() {
                return Ok(bytes);
            }

            Err(crate::error::deserialize_api_error(status, &bytes))
        })
        .retry(self.backoff)
        .when(|e: &MofuError| is_connect_failure(e) || (idempotent && e.is_retryable()))
        .notify(|e: &MofuError, delay| {
            tracing::debug!(
                method = %request.method(),
                path = request.path(),
                error = %e,
                ?delay,
                "Retrying request"
            );
        })
        .await
    }
}

/// The request never reached the server, so replaying it is safe for any method
fn is_connect_failure(e: &MofuError) -> bool {
    matches!(e, MofuError::Transport(inner) if inner.is_connect())
}

/// Decodes a success body; an empty body decodes as JSON `null`
pub(crate) fn decode<O: DeserializeOwned>(bytes: &[u8]) -> Result<O, MofuError> {
    let raw: &[u8] = if bytes.is_empty() { b"null" } else { bytes };
    serde_json::from_slice(raw).map_err(|e| crate::error::map_deser(&e, raw))
}
