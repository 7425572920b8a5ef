//! Session Manager: authenticated/unauthenticated status derived from the
//! Credential Store.
//!
//! # Design
//! Status has two sources. The store-derived value follows the store's
//! change stream through a background task. The override is set by
//! `set_authenticated` right after a login/registration so callers see the
//! new status before that task has observed the store write. Once the store
//! reports the same status the override is dropped and the store is the only
//! source again.
//!
//! The observer task is aborted when the manager is dropped.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio_util::task::AbortOnDropHandle;

use crate::store::{CredentialStore, Credentials};

/// Session status as seen by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    /// The store has not been observed yet.
    Loading,
    Authenticated,
    Unauthenticated,
}

impl AuthState {
    fn from_flag(authenticated: bool) -> Self {
        if authenticated {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }
}

#[derive(Debug, Default)]
struct Sources {
    stored: Option<bool>,
    overridden: Option<bool>,
}

#[derive(Debug)]
struct Shared {
    status: watch::Sender<AuthState>,
    sources: Mutex<Sources>,
}

impl Shared {
    fn sources(&self) -> MutexGuard<'_, Sources> {
        // The guarded data is two flags; a panic elsewhere cannot leave it torn.
        self.sources.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn apply_store(&self, authenticated: bool) {
        let mut sources = self.sources();
        sources.stored = Some(authenticated);
        if sources.overridden == Some(authenticated) {
            sources.overridden = None;
        }
        self.publish(&sources);
    }

    fn publish(&self, sources: &Sources) {
        let status = sources
            .overridden
            .or(sources.stored)
            .map(AuthState::from_flag)
            .unwrap_or(AuthState::Loading);
        self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            tracing::debug!(from = ?*current, to = ?status, "session status changed");
            *current = status;
            true
        });
    }
}

pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    shared: Arc<Shared>,
    _observer: AbortOnDropHandle<()>,
}

impl SessionManager {
    /// Start observing `store`. Must be called inside a tokio runtime.
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        let shared = Arc::new(Shared {
            status: watch::Sender::new(AuthState::Loading),
            sources: Mutex::new(Sources::default()),
        });
        let observer = tokio::spawn(observe(shared.clone(), store.subscribe()));
        Self {
            store,
            shared,
            _observer: AbortOnDropHandle::new(observer),
        }
    }

    pub fn status(&self) -> AuthState {
        *self.shared.status.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.shared.status.subscribe()
    }

    /// Force the status immediately, ahead of the store observation.
    pub fn set_authenticated(&self, authenticated: bool) {
        let mut sources = self.shared.sources();
        sources.overridden = if sources.stored == Some(authenticated) {
            None
        } else {
            Some(authenticated)
        };
        self.shared.publish(&sources);
    }

    /// Clear the store, then report `Unauthenticated`.
    pub async fn logout(&self) {
        if let Err(err) = self.store.clear().await {
            tracing::warn!(error = %err, "failed to clear credential store on logout");
        }
        let mut sources = self.shared.sources();
        sources.overridden = None;
        sources.stored = Some(false);
        self.shared.publish(&sources);
        tracing::info!("logged out");
    }
}

async fn observe(shared: Arc<Shared>, mut changes: watch::Receiver<Option<Credentials>>) {
    loop {
        let authenticated = changes.borrow_and_update().is_some();
        shared.apply_store(authenticated);
        if changes.changed().await.is_err() {
            tracing::debug!("credential store dropped, stopping session observer");
            return;
        }
    }
}
