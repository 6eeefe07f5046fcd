//! Cached profile of the signed-in user, kept in step with the credential store.

use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;

use crate::{client::Client, config::Config, credential::CredentialEvent, types::UserInfoResponse};

/// Background task that reloads `my_profile` whenever a credential is stored and
/// drops the cached profile when the credential is cleared
///
/// Load failures are logged and leave no profile cached. The task stops when the
/// `ProfileSync` is dropped.
#[derive(Debug)]
pub struct ProfileSync {
    profile: watch::Receiver<Option<UserInfoResponse>>,
    task: JoinHandle<()>,
}

impl ProfileSync {
    /// Starts syncing; loads the profile right away if `client` is signed in
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn<C: Config>(client: Client<C>) -> Self {
        let (tx, profile) = watch::channel(None);
        let mut events = client.store().subscribe();

        let task = tokio::spawn(async move {
            if client.store().is_authenticated() {
                reload(&client, &tx).await;
            }
            loop {
                match events.recv().await {
                    Ok(CredentialEvent::Set) => reload(&client, &tx).await,
                    Ok(CredentialEvent::Cleared) => {
                        tx.send_replace(None);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Credential events lagged; resyncing profile");
                        if client.store().is_authenticated() {
                            reload(&client, &tx).await;
                        } else {
                            tx.send_replace(None);
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self { profile, task }
    }

    /// Cached profile, `None` when signed out or not loaded yet
    #[must_use]
    pub fn current(&self) -> Option<UserInfoResponse> {
        self.profile.borrow().clone()
    }

    /// Watches the cached profile
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<UserInfoResponse>> {
        self.profile.clone()
    }
}

impl Drop for ProfileSync {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn reload<C: Config>(client: &Client<C>, tx: &watch::Sender<Option<UserInfoResponse>>) {
    match client.users().my_profile().await {
        Ok(user) => {
            tracing::debug!(handle = %user.handle, "Profile loaded");
            tx.send_replace(Some(user));
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load profile");
            tx.send_replace(None);
        }
    }
}
