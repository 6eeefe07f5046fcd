//! Expired-credential recovery.
//!
//! At most one refresh exchange runs per [`RefreshCoordinator`]. Requests that fail
//! with a recoverable auth error while an exchange is running await the same shared
//! future instead of starting their own; requests whose credential was already
//! replaced (or cleared) by an earlier episode reuse the store state as-is.

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::{
    config::Config,
    credential::{Credential, CredentialStore, Generation},
    error::MofuError,
    request::ApiRequest,
    transport::{Bearer, Transport, decode},
    types::auth::AccessTokenResponse,
};

/// Path of the refresh exchange
pub const REFRESH_PATH: &str = "v0/auth/refresh";
/// Path of the remote sign-out
pub const SIGN_OUT_PATH: &str = "v0/auth/sign_out";

/// Where the coordinator currently is in a recovery episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    /// No exchange running
    Idle,
    /// Exchange in flight
    Refreshing,
    /// Exchange succeeded; a new credential is stored
    Recovered,
    /// Exchange failed; the session was torn down
    LoggedOut,
}

/// Result of a recovery episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new credential is stored
    Refreshed(Credential),
    /// The session ended
    LoggedOut,
}

/// Server calls the coordinator needs to recover or end a session
#[async_trait]
pub trait SessionExchange: Send + Sync {
    /// Trades the out-of-band refresh credential for a new access token
    async fn refresh(&self) -> Result<String, MofuError>;

    /// Ends the session on the server
    async fn sign_out(&self) -> Result<(), MofuError>;
}

/// [`SessionExchange`] over the client's private channel
///
/// Calls here never go through refresh interception.
pub(crate) struct HttpSessionExchange<C: Config> {
    transport: Transport<C>,
    store: Arc<CredentialStore>,
}

impl<C: Config> HttpSessionExchange<C> {
    pub(crate) const fn new(transport: Transport<C>, store: Arc<CredentialStore>) -> Self {
        Self { transport, store }
    }
}

#[async_trait]
impl<C: Config> SessionExchange for HttpSessionExchange<C> {
    async fn refresh(&self) -> Result<String, MofuError> {
        // Bearer intentionally absent; the refresh cookie authenticates this call
        let request = ApiRequest::post(REFRESH_PATH).with_json(&json!({}))?;
        let bytes = self.transport.execute(&request, Bearer::Anonymous).await?;
        let resp: AccessTokenResponse = decode(&bytes)?;
        Ok(resp.access_token)
    }

    async fn sign_out(&self) -> Result<(), MofuError> {
        remote_sign_out(&self.transport, &self.store).await
    }
}

/// `POST v0/auth/sign_out` with the current bearer; leaves the store untouched
pub(crate) async fn remote_sign_out<C: Config>(
    transport: &Transport<C>,
    store: &CredentialStore,
) -> Result<(), MofuError> {
    let request = ApiRequest::post(SIGN_OUT_PATH).with_json(&json!({}))?;
    transport.execute(&request, Bearer::Session(store)).await?;
    Ok(())
}

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;

struct Inner {
    store: Arc<CredentialStore>,
    exchange: Arc<dyn SessionExchange>,
    in_flight: Mutex<Option<InFlight>>,
    state: watch::Sender<RefreshState>,
}

/// Single-flight refresh state machine
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl RefreshCoordinator {
    /// Creates a coordinator that writes recovered credentials to `store`
    #[must_use]
    pub fn new(store: Arc<CredentialStore>, exchange: Arc<dyn SessionExchange>) -> Self {
        let (state, _) = watch::channel(RefreshState::Idle);
        Self {
            inner: Arc::new(Inner {
                store,
                exchange,
                in_flight: Mutex::new(None),
                state,
            }),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> RefreshState {
        *self.inner.state.borrow()
    }

    /// Watches state transitions
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<RefreshState> {
        self.inner.state.subscribe()
    }

    /// True while an exchange is in flight
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Recovers from a recoverable auth failure
    ///
    /// `seen` is the credential generation the failed request was sent with. If the
    /// store has moved on since then, no exchange is started and the current store
    /// state is reported instead.
    pub async fn recover(&self, seen: Generation) -> RefreshOutcome {
        let in_flight = {
            let mut slot = self
                .inner
                .in_flight
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            if let Some(running) = slot.as_ref() {
                running.clone()
            } else {
                let (credential, current) = self.inner.store.snapshot();
                if current != seen {
                    return if credential.is_empty() {
                        RefreshOutcome::LoggedOut
                    } else {
                        RefreshOutcome::Refreshed(credential)
                    };
                }

                let task = tokio::spawn(run_exchange(Arc::clone(&self.inner), current));
                let shared = async move {
                    task.await.unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Refresh task failed");
                        RefreshOutcome::LoggedOut
                    })
                }
                .boxed()
                .shared();
                *slot = Some(shared.clone());
                shared
            }
        };

        in_flight.await
    }
}

/// One exchange episode. Runs as its own task so a cancelled caller cannot leave
/// the episode half-finished.
async fn run_exchange(inner: Arc<Inner>, started: Generation) -> RefreshOutcome {
    inner.state.send_replace(RefreshState::Refreshing);
    tracing::info!("Attempting to refresh access token");

    let outcome = match inner.exchange.refresh().await {
        Ok(token) if !token.trim().is_empty() => {
            if inner.store.set_if_current(&token, started) {
                tracing::info!("Access token refreshed");
                inner.state.send_replace(RefreshState::Recovered);
                RefreshOutcome::Refreshed(inner.store.get())
            } else {
                // A sign-in or sign-out landed while the exchange was running; it wins
                let current = inner.store.get();
                if current.is_empty() {
                    inner.state.send_replace(RefreshState::LoggedOut);
                    RefreshOutcome::LoggedOut
                } else {
                    inner.state.send_replace(RefreshState::Recovered);
                    RefreshOutcome::Refreshed(current)
                }
            }
        }
        Ok(_) => {
            tracing::warn!("Refresh returned an empty access token");
            tear_down(&inner).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to refresh access token");
            tear_down(&inner).await
        }
    };

    inner
        .in_flight
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    inner.state.send_replace(RefreshState::Idle);
    outcome
}

async fn tear_down(inner: &Inner) -> RefreshOutcome {
    if let Err(e) = inner.exchange.sign_out().await {
        tracing::warn!(error = %e, "Logout API failed");
    }
    inner.store.clear();
    inner.state.send_replace(RefreshState::LoggedOut);
    tracing::info!("Session ended after failed refresh");
    RefreshOutcome::LoggedOut
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeExchange {
        token: Option<&'static str>,
        refreshes: AtomicUsize,
        sign_outs: AtomicUsize,
        delay: Duration,
    }

    impl FakeExchange {
        fn new(token: Option<&'static str>) -> Self {
            Self {
                token,
                refreshes: AtomicUsize::new(0),
                sign_outs: AtomicUsize::new(0),
                delay: Duration::from_millis(20),
            }
        }
    }

    #[async_trait]
    impl SessionExchange for FakeExchange {
        async fn refresh(&self) -> Result<String, MofuError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.token
                .map(str::to_string)
                .ok_or_else(|| MofuError::Config("refresh rejected".into()))
        }

        async fn sign_out(&self) -> Result<(), MofuError> {
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            Err(MofuError::Config("sign out unavailable".into()))
        }
    }

    fn setup(
        token: Option<&'static str>,
    ) -> (Arc<CredentialStore>, Arc<FakeExchange>, RefreshCoordinator) {
        let store = Arc::new(CredentialStore::new());
        store.set("tokA");
        let exchange = Arc::new(FakeExchange::new(token));
        let coordinator = RefreshCoordinator::new(
            Arc::clone(&store),
            Arc::clone(&exchange) as Arc<dyn SessionExchange>,
        );
        (store, exchange, coordinator)
    }

    #[tokio::test]
    async fn success_stores_new_token() {
        let (store, exchange, coordinator) = setup(Some("tokB"));

        let outcome = coordinator.recover(store.generation()).await;

        assert_eq!(outcome, RefreshOutcome::Refreshed(store.get()));
        assert_eq!(store.get().expose(), Some("tokB"));
        assert_eq!(exchange.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(coordinator.state(), RefreshState::Idle);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn failure_signs_out_and_clears() {
        let (store, exchange, coordinator) = setup(None);

        let outcome = coordinator.recover(store.generation()).await;

        assert_eq!(outcome, RefreshOutcome::LoggedOut);
        assert!(!store.is_authenticated());
        assert_eq!(exchange.sign_outs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_failures_share_one_exchange() {
        let (store, exchange, coordinator) = setup(Some("tokB"));
        let seen = store.generation();

        let outcomes =
            futures::future::join_all((0..8).map(|_| coordinator.recover(seen))).await;

        assert_eq!(exchange.refreshes.load(Ordering::SeqCst), 1);
        for outcome in outcomes {
            let RefreshOutcome::Refreshed(credential) = outcome else {
                panic!("expected refreshed");
            };
            assert_eq!(credential.expose(), Some("tokB"));
        }
    }

    #[tokio::test]
    async fn late_joiner_reuses_finished_refresh() {
        let (store, exchange, coordinator) = setup(Some("tokB"));
        let seen = store.generation();

        coordinator.recover(seen).await;
        // Same stale generation, arriving after the episode ended
        let outcome = coordinator.recover(seen).await;

        assert_eq!(exchange.refreshes.load(Ordering::SeqCst), 1);
        let RefreshOutcome::Refreshed(credential) = outcome else {
            panic!("expected refreshed");
        };
        assert_eq!(credential.expose(), Some("tokB"));
    }

    #[tokio::test]
    async fn late_joiner_after_logout_stays_logged_out() {
        let (store, exchange, coordinator) = setup(None);
        let seen = store.generation();

        coordinator.recover(seen).await;
        let outcome = coordinator.recover(seen).await;

        assert_eq!(outcome, RefreshOutcome::LoggedOut);
        assert_eq!(exchange.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(exchange.sign_outs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn logout_during_refresh_is_not_undone() {
        let (store, _exchange, coordinator) = setup(Some("tokB"));
        let seen = store.generation();

        let pending = tokio::spawn({
            let coordinator = coordinator.clone();
            async move { coordinator.recover(seen).await }
        });
        tokio::time::sleep(Duration::from_millis(5)).await;
        store.clear();

        assert_eq!(pending.await.unwrap(), RefreshOutcome::LoggedOut);
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn state_transitions_are_observable() {
        let (store, _exchange, coordinator) = setup(Some("tokB"));
        let mut rx = coordinator.subscribe();

        let pending = tokio::spawn({
            let coordinator = coordinator.clone();
            let seen = store.generation();
            async move { coordinator.recover(seen).await }
        });

        rx.wait_for(|s| *s == RefreshState::Refreshing).await.unwrap();
        pending.await.unwrap();
        assert_eq!(coordinator.state(), RefreshState::Idle);
    }
}
