//! Access credential lifecycle.
//!
//! [`CredentialStore`] is the only shared mutable state of a session. Writes are
//! last-write-wins; every `set`/`clear` bumps a [`Generation`] so the request
//! pipeline can tell whether the credential changed while a request was in flight.

mod persist;

pub use persist::{FilePersistence, MemoryPersistence, TokenPersistence};

use secrecy::{ExposeSecret, SecretString};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 16;

/// Bearer credential. An empty credential means "absent".
///
/// Debug output is redacted.
#[derive(Clone, Debug, Default)]
pub struct Credential(Option<SecretString>);

impl Credential {
    /// The absent credential
    #[must_use]
    pub const fn empty() -> Self {
        Self(None)
    }

    fn from_token(token: &str) -> Self {
        let token = token.trim();
        if token.is_empty() {
            Self(None)
        } else {
            Self(Some(SecretString::from(token.to_string())))
        }
    }

    /// True when no credential is held
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// Raw token value, `None` when absent
    #[must_use]
    pub fn expose(&self) -> Option<&str> {
        self.0.as_ref().map(|s| s.expose_secret())
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

/// Monotonic counter of credential changes
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Notification emitted after the credential changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialEvent {
    /// A new credential was stored
    Set,
    /// The credential was removed
    Cleared,
}

struct Slot {
    credential: Credential,
    generation: Generation,
}

/// Session-wide holder of the current access credential
pub struct CredentialStore {
    slot: RwLock<Slot>,
    persistence: Option<Arc<dyn TokenPersistence>>,
    events: broadcast::Sender<CredentialEvent>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (credential, generation) = self.snapshot();
        f.debug_struct("CredentialStore")
            .field("authenticated", &!credential.is_empty())
            .field("generation", &generation)
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore {
    /// Creates an empty, memory-only store
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            slot: RwLock::new(Slot {
                credential: Credential::empty(),
                generation: Generation(0),
            }),
            persistence: None,
            events,
        }
    }

    /// Creates a store backed by `persistence`, restoring any saved token
    ///
    /// # Errors
    ///
    /// Returns an error if the saved token cannot be read.
    pub fn with_persistence(
        persistence: Arc<dyn TokenPersistence>,
    ) -> Result<Self, crate::error::MofuError> {
        let saved = persistence.load()?;
        let mut store = Self::new();
        if let Some(token) = saved {
            store.slot_mut().credential = Credential::from_token(&token);
        }
        store.persistence = Some(persistence);
        Ok(store)
    }

    fn slot_mut(&mut self) -> &mut Slot {
        self.slot.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current credential, or the empty credential when signed out
    #[must_use]
    pub fn get(&self) -> Credential {
        self.snapshot().0
    }

    /// True iff a non-empty credential is held
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.get().is_empty()
    }

    /// Credential together with the generation it belongs to
    #[must_use]
    pub fn snapshot(&self) -> (Credential, Generation) {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        (slot.credential.clone(), slot.generation)
    }

    /// Current generation
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.snapshot().1
    }

    /// Replaces the current credential
    ///
    /// An empty or whitespace-only token is treated as [`CredentialStore::clear`].
    /// Persistence failures are logged and do not fail the call.
    pub fn set(&self, token: &str) {
        self.commit(Credential::from_token(token), None);
    }

    /// Stores `token` only if no other write happened since `expected`
    ///
    /// Returns `false` (and changes nothing) when the store has moved on, so a slow
    /// refresh cannot resurrect a session that was signed out in the meantime.
    pub fn set_if_current(&self, token: &str, expected: Generation) -> bool {
        let credential = Credential::from_token(token);
        if credential.is_empty() {
            return false;
        }
        self.commit(credential, Some(expected))
    }

    /// Removes the current credential
    pub fn clear(&self) {
        self.commit(Credential::empty(), None);
    }

    /// Subscribes to credential change notifications
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CredentialEvent> {
        self.events.subscribe()
    }

    fn commit(&self, credential: Credential, expected: Option<Generation>) -> bool {
        let event = {
            let mut slot = self.slot.write().unwrap_or_else(PoisonError::into_inner);
            if expected.is_some_and(|g| g != slot.generation) {
                return false;
            }
            // Disk is written under the lock so it never lags behind memory
            self.persist(&credential);
            let event = if credential.is_empty() {
                CredentialEvent::Cleared
            } else {
                CredentialEvent::Set
            };
            slot.credential = credential;
            slot.generation = slot.generation.next();
            event
        };
        self.notify(event);
        true
    }

    fn persist(&self, credential: &Credential) {
        let Some(p) = &self.persistence else {
            return;
        };
        let result = match credential.expose() {
            Some(token) => p.save(token),
            None => p.remove(),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to persist access token");
        }
    }

    fn notify(&self, event: CredentialEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
