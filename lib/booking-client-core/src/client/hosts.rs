//! Collaborators the client talks to besides the network.
//!
//! The response interpreter never touches global state: it clears credentials
//! through a [`CredentialStore`], redirects through a [`NavigationHost`] and
//! shows messages through a [`NoticeHost`]. Each is injected, so embedding
//! applications plug in their own host and tests plug in a [`Recorder`].

use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use super::auth::SecureString;
use super::error::StorageError;
use super::storage::MemoryStore;

/// Key-value storage for session credentials.
///
/// Implementations must be safe to call concurrently. `clear` is idempotent.
pub trait CredentialStore: Send + Sync {
    /// Reads a stored value.
    fn get(&self, key: &str) -> Result<Option<SecureString>, StorageError>;

    /// Stores a value, replacing any previous one.
    fn set(&self, key: &str, value: SecureString) -> Result<(), StorageError>;

    /// Removes a value. Removing a missing key succeeds.
    fn clear(&self, key: &str) -> Result<(), StorageError>;

    /// Removes every stored value.
    fn clear_all(&self) -> Result<(), StorageError>;
}

/// Page navigation, fire-and-forget.
pub trait NavigationHost: Send + Sync {
    /// Requests navigation to `path`.
    fn go(&self, path: &str);
}

/// User-visible notices (toasts), fire-and-forget.
pub trait NoticeHost: Send + Sync {
    /// Shows `message` to the user.
    fn show(&self, message: &str);
}

impl<F> NavigationHost for F
where
    F: Fn(&str) + Send + Sync,
{
    fn go(&self, path: &str) {
        self(path);
    }
}

impl<F> NoticeHost for F
where
    F: Fn(&str) + Send + Sync,
{
    fn show(&self, message: &str) {
        self(message);
    }
}

/// Logs navigation requests; the default when no host is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNavigator;

impl NavigationHost for TracingNavigator {
    fn go(&self, path: &str) {
        info!(%path, "navigation requested");
    }
}

/// Logs notices; the default when no host is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotices;

impl NoticeHost for TracingNotices {
    fn show(&self, message: &str) {
        info!(%message, "notice");
    }
}

/// A side effect observed by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    /// `CredentialStore::clear(key)`.
    Cleared(String),
    /// `NavigationHost::go(path)`.
    Navigated(String),
    /// `NoticeHost::show(message)`.
    Notice(String),
}

/// Stand-in for all three hosts that records every side effect.
///
/// Reads and writes go to an inner [`MemoryStore`]; only `clear` calls are recorded.
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    store: Arc<MemoryStore>,
    effects: Arc<Mutex<Vec<SideEffect>>>,
}

impl Recorder {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the side effects recorded so far, in call order.
    pub fn effects(&self) -> Vec<SideEffect> {
        self.effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the recorded notices.
    pub fn notices(&self) -> Vec<String> {
        self.effects()
            .into_iter()
            .filter_map(|effect| match effect {
                SideEffect::Notice(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn record(&self, effect: SideEffect) {
        self.effects
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(effect);
    }
}

impl CredentialStore for Recorder {
    fn get(&self, key: &str) -> Result<Option<SecureString>, StorageError> {
        self.store.get(key)
    }

    fn set(&self, key: &str, value: SecureString) -> Result<(), StorageError> {
        self.store.set(key, value)
    }

    fn clear(&self, key: &str) -> Result<(), StorageError> {
        self.record(SideEffect::Cleared(key.to_string()));
        self.store.clear(key)
    }

    fn clear_all(&self) -> Result<(), StorageError> {
        self.store.clear_all()
    }
}

impl NavigationHost for Recorder {
    fn go(&self, path: &str) {
        self.record(SideEffect::Navigated(path.to_string()));
    }
}

impl NoticeHost for Recorder {
    fn show(&self, message: &str) {
        self.record(SideEffect::Notice(message.to_string()));
    }
}
