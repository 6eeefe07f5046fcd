use backon::ExponentialBuilder;
use bytes::Bytes;
use reqwest::cookie::Jar;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::{Config, MofuConfig},
    credential::{CredentialStore, FilePersistence},
    error::MofuError,
    refresh::{HttpSessionExchange, RefreshCoordinator, RefreshOutcome, SessionExchange},
    request::{ApiRequest, MultipartBody},
    retry,
    transport::{Bearer, Transport, decode},
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// mofumofu API client
///
/// Cloning is cheap; clones share the credential store, the cookie jar and the
/// refresh coordinator.
///
/// Requests made through the client attach the current access token, and a
/// `user:token_expired` or `user:unauthorized` failure triggers a single shared
/// refresh followed by one replay of the failed request. Calls through
/// [`Client::public`] skip all of that.
pub struct Client<C: Config = MofuConfig> {
    inner: Arc<ClientInner<C>>,
}

struct ClientInner<C: Config> {
    private: Transport<C>,
    public: Transport<C>,
    store: Arc<CredentialStore>,
    refresh: RefreshCoordinator,
    cookies: Arc<Jar>,
}

impl<C: Config> Clone for Client<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Config> std::fmt::Debug for Client<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", self.config())
            .field("store", &self.inner.store)
            .field("refresh", &self.inner.refresh)
            .finish_non_exhaustive()
    }
}

impl Client<MofuConfig> {
    /// Creates a client from environment configuration
    ///
    /// See [`MofuConfig::new`] for the variables read.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be built or a persisted token
    /// cannot be read.
    pub fn new() -> Result<Self, MofuError> {
        Self::builder().build()
    }

    /// Starts a builder with environment configuration
    #[must_use]
    pub fn builder() -> ClientBuilder<MofuConfig> {
        ClientBuilder::new(MofuConfig::new())
    }
}

impl<C: Config> Client<C> {
    /// Starts a builder for a custom configuration
    #[must_use]
    pub fn with_config(config: C) -> ClientBuilder<C> {
        ClientBuilder::new(config)
    }

    /// Returns a reference to the client's configuration
    #[must_use]
    pub fn config(&self) -> &C {
        self.inner.private.config()
    }

    /// Credential store shared by every clone of this client
    #[must_use]
    pub fn store(&self) -> &Arc<CredentialStore> {
        &self.inner.store
    }

    /// Refresh coordinator, for observing recovery state
    #[must_use]
    pub fn refresh_coordinator(&self) -> &RefreshCoordinator {
        &self.inner.refresh
    }

    /// Cookie jar of the authenticated channel
    ///
    /// Holds the refresh cookie set by the server at sign-in.
    #[must_use]
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.inner.cookies
    }

    /// Unauthenticated channel: no bearer, no cookies, no refresh
    #[must_use]
    pub fn public(&self) -> PublicChannel<'_, C> {
        PublicChannel {
            transport: &self.inner.public,
        }
    }

    pub(crate) fn private_transport(&self) -> &Transport<C> {
        &self.inner.private
    }

    /// Sends `request` on the authenticated channel and decodes the response
    ///
    /// # Errors
    ///
    /// Returns the classified API error, a transport error once retries are
    /// exhausted, or a decode error.
    pub async fn send<O: DeserializeOwned>(&self, request: ApiRequest) -> Result<O, MofuError> {
        let bytes = self.dispatch(&request).await?;
        decode(&bytes)
    }

    /// `GET path`
    ///
    /// # Errors
    ///
    /// See [`Client::send`].
    pub async fn get<O: DeserializeOwned>(&self, path: &str) -> Result<O, MofuError> {
        self.send(ApiRequest::get(path)).await
    }

    /// `GET path?query`
    ///
    /// # Errors
    ///
    /// See [`Client::send`]; also fails if `query` is not a flat object.
    pub async fn get_with_query<Q, O>(&self, path: &str, query: &Q) -> Result<O, MofuError>
    where
        Q: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.send(ApiRequest::get(path).with_query(query)?).await
    }

    /// `POST path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`Client::send`].
    pub async fn post<I, O>(&self, path: &str, body: &I) -> Result<O, MofuError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).with_json(body)?).await
    }

    /// `PUT path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`Client::send`].
    pub async fn put<I, O>(&self, path: &str, body: &I) -> Result<O, MofuError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.send(ApiRequest::put(path).with_json(body)?).await
    }

    /// `PATCH path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`Client::send`].
    pub async fn patch<I, O>(&self, path: &str, body: &I) -> Result<O, MofuError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.send(ApiRequest::patch(path).with_json(body)?).await
    }

    /// `DELETE path`
    ///
    /// # Errors
    ///
    /// See [`Client::send`].
    pub async fn delete<O: DeserializeOwned>(&self, path: &str) -> Result<O, MofuError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// `POST path` with a multipart body
    ///
    /// # Errors
    ///
    /// See [`Client::send`].
    pub async fn post_multipart<O: DeserializeOwned>(
        &self,
        path: &str,
        form: MultipartBody,
    ) -> Result<O, MofuError> {
        self.send(ApiRequest::post(path).with_multipart(form)).await
    }

    async fn dispatch(&self, request: &ApiRequest) -> Result<Bytes, MofuError> {
        let inner = &self.inner;
        let seen = inner.store.generation();

        let err = match inner.private.execute(request, Bearer::Session(&inner.store)).await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => e,
        };

        let Some(kind) = err.api_kind() else {
            return Err(err);
        };

        if kind.is_terminal() {
            tracing::info!(code = kind.as_str(), "No refresh token; ending session");
            inner.store.clear();
            return Err(err);
        }
        if !kind.is_recoverable() {
            return Err(err);
        }

        match inner.refresh.recover(seen).await {
            RefreshOutcome::Refreshed(_) => {
                // A sign-out may have landed after the refresh finished
                if !inner.store.is_authenticated() {
                    return Err(err);
                }
                tracing::debug!(
                    method = %request.method(),
                    path = request.path(),
                    "Replaying request with refreshed credential"
                );
                inner.private.execute(request, Bearer::Session(&inner.store)).await
            }
            RefreshOutcome::LoggedOut => Err(err),
        }
    }
}

/// Unauthenticated view of a [`Client`]
///
/// Requests never carry credentials or cookies and are never intercepted.
#[derive(Debug, Clone)]
pub struct PublicChannel<'c, C: Config> {
    transport: &'c Transport<C>,
}

impl<C: Config> PublicChannel<'_, C> {
    /// Sends `request` and decodes the response
    ///
    /// # Errors
    ///
    /// Returns the classified API error, a transport error once retries are
    /// exhausted, or a decode error.
    pub async fn send<O: DeserializeOwned>(&self, request: ApiRequest) -> Result<O, MofuError> {
        let bytes = self.transport.execute(&request, Bearer::Anonymous).await?;
        decode(&bytes)
    }

    /// `GET path`
    ///
    /// # Errors
    ///
    /// See [`PublicChannel::send`].
    pub async fn get<O: DeserializeOwned>(&self, path: &str) -> Result<O, MofuError> {
        self.send(ApiRequest::get(path)).await
    }

    /// `POST path` with a JSON body
    ///
    /// # Errors
    ///
    /// See [`PublicChannel::send`].
    pub async fn post<I, O>(&self, path: &str, body: &I) -> Result<O, MofuError>
    where
        I: Serialize + ?Sized,
        O: DeserializeOwned,
    {
        self.send(ApiRequest::post(path).with_json(body)?).await
    }
}

/// Builder for [`Client`]
pub struct ClientBuilder<C: Config = MofuConfig> {
    config: C,
    store: Option<Arc<CredentialStore>>,
    backoff: Option<ExponentialBuilder>,
    exchange: Option<Arc<dyn SessionExchange>>,
}

impl<C: Config> std::fmt::Debug for ClientBuilder<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("backoff", &self.backoff)
            .field("custom_exchange", &self.exchange.is_some())
            .finish()
    }
}

impl<C: Config> ClientBuilder<C> {
    fn new(config: C) -> Self {
        Self {
            config,
            store: None,
            backoff: None,
            exchange: None,
        }
    }

    /// Shares an existing credential store
    ///
    /// Without this, the store is created from [`Config::token_file`].
    #[must_use]
    pub fn store(mut self, store: Arc<CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Replaces the backoff configuration for transport retries
    #[must_use]
    pub fn backoff(mut self, backoff: ExponentialBuilder) -> Self {
        self.backoff = Some(backoff);
        self
    }

    /// Replaces the refresh and sign-out calls used by the refresh coordinator
    #[must_use]
    pub fn session_exchange(mut self, exchange: Arc<dyn SessionExchange>) -> Self {
        self.exchange = Some(exchange);
        self
    }

    /// Builds the client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP clients cannot be built or a persisted token
    /// cannot be read.
    pub fn build(self) -> Result<Client<C>, MofuError> {
        let cookies = Arc::new(Jar::default());

        let private_http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(self.config.timeout())
            .cookie_provider(Arc::clone(&cookies))
            .build()?;
        let public_http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(self.config.timeout())
            .build()?;

        let backoff = self.backoff.unwrap_or_else(|| {
            retry::default_backoff_builder().with_max_times(self.config.max_retries())
        });

        let store = match self.store {
            Some(store) => store,
            None => match self.config.token_file() {
                Some(path) => Arc::new(CredentialStore::with_persistence(Arc::new(
                    FilePersistence::new(path),
                ))?),
                None => Arc::new(CredentialStore::new()),
            },
        };

        let private = Transport::new(private_http, self.config.clone(), backoff);
        let public = Transport::new(public_http, self.config, backoff);

        let exchange: Arc<dyn SessionExchange> = match self.exchange {
            Some(exchange) => exchange,
            None => Arc::new(HttpSessionExchange::new(private.clone(), Arc::clone(&store))),
        };
        let refresh = RefreshCoordinator::new(Arc::clone(&store), exchange);

        Ok(Client {
            inner: Arc::new(ClientInner {
                private,
                public,
                store,
                refresh,
                cookies,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::MemoryPersistence;

    fn config() -> MofuConfig {
        MofuConfig::new().with_api_base("http://127.0.0.1:9")
    }

    #[test]
    fn clones_share_state() {
        let client = Client::with_config(config()).build().unwrap();
        let other = client.clone();

        client.store().set("tokA");
        assert_eq!(other.store().get().expose(), Some("tokA"));
        assert!(Arc::ptr_eq(client.cookie_jar(), other.cookie_jar()));
    }

    #[test]
    fn injected_store_is_used() {
        let store = Arc::new(
            CredentialStore::with_persistence(Arc::new(MemoryPersistence::with_token("saved")))
                .unwrap(),
        );
        let client = Client::with_config(config())
            .store(Arc::clone(&store))
            .build()
            .unwrap();
        assert!(client.store().is_authenticated());
    }

    #[test]
    fn token_file_restores_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("access_token");
        std::fs::write(&path, "persisted").unwrap();

        let client = Client::with_config(config().with_token_file(&path))
            .build()
            .unwrap();
        assert_eq!(client.store().get().expose(), Some("persisted"));
    }

    #[test]
    fn debug_does_not_leak_token() {
        let client = Client::with_config(config()).build().unwrap();
        client.store().set("very-secret");
        assert!(!format!("{client:?}").contains("very-secret"));
    }
}
