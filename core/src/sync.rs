//! Todo Synchronizer: the session's in-memory todo list kept in step with
//! the remote collection.
//!
//! # Design
//! State lives in a `watch` channel so observers get every transition. Each
//! operation flips `loading` on and clears `error` at entry, and a scope
//! guard flips `loading` off on every exit path. Failures never escape:
//! they are rendered to text and stored in `error`.
//!
//! Credentials are read from the store at the start of every operation, so
//! a logout between two calls is seen by the second one.
//!
//! Concurrent operations are not serialized. Each one mutates the shared
//! state when it completes, so the last completion wins for `loading` and
//! `error`.

use std::sync::Arc;

use scopeguard::ScopeGuard;
use tokio::sync::watch;

use crate::api::ApiClient;
use crate::error::SyncError;
use crate::store::CredentialStore;
use crate::types::TodoItem;

/// Observable state of the synchronizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoState {
    pub items: Vec<TodoItem>,
    pub loading: bool,
    pub error: Option<String>,
}

type LoadingGuard<'a> = ScopeGuard<&'a watch::Sender<TodoState>, fn(&'a watch::Sender<TodoState>)>;

pub struct TodoSync {
    api: ApiClient,
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<TodoState>,
}

impl TodoSync {
    pub fn new(api: ApiClient, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            api,
            store,
            state: watch::Sender::new(TodoState::default()),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> TodoState {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<TodoItem> {
        self.state.borrow().items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TodoState> {
        self.state.subscribe()
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|s| s.error.take().is_some());
    }

    /// Replace the list with the server's collection for the current user.
    pub async fn refresh(&self) {
        let _loading = self.begin();
        let result = self.try_refresh().await;
        self.record("Failed to fetch todos", result);
    }

    /// Create an item. `text` is sent as given.
    pub async fn add(&self, text: &str) {
        let _loading = self.begin();
        let result = self.try_add(text).await;
        self.record("Failed to add todo", result);
    }

    /// Flip `completed` on the item with `id`.
    pub async fn toggle_completion(&self, id: &str) {
        let _loading = self.begin();
        let result = self.try_toggle(id).await;
        self.record("Failed to update todo", result);
    }

    pub async fn delete(&self, id: &str) {
        let _loading = self.begin();
        let result = self.try_delete(id).await;
        self.record("Failed to delete todo", result);
    }

    fn begin(&self) -> LoadingGuard<'_> {
        self.state.send_modify(|s| {
            s.loading = true;
            s.error = None;
        });
        scopeguard::guard(&self.state, finish_loading as fn(&watch::Sender<TodoState>))
    }

    fn record(&self, context: &str, result: Result<(), SyncError>) {
        let Err(err) = result else { return };
        let message = if err.is_missing_credential() {
            err.to_string()
        } else {
            format!("{context}: {err}")
        };
        tracing::warn!(error = %message, "todo operation failed");
        self.state.send_modify(|s| s.error = Some(message));
    }

    async fn token(&self) -> Result<String, SyncError> {
        self.store.token().await.ok_or(SyncError::MissingToken)
    }

    async fn try_refresh(&self) -> Result<(), SyncError> {
        let token = self.token().await?;
        let Some(user_id) = self.store.user_id().await else {
            tracing::debug!("no user id stored, skipping refresh");
            return Ok(());
        };
        let items = self.api.list_todos(&user_id, &token).await?;
        tracing::debug!(count = items.len(), "fetched todos");
        self.state.send_modify(|s| s.items = items);
        Ok(())
    }

    async fn try_add(&self, text: &str) -> Result<(), SyncError> {
        let token = self.token().await?;
        let user_id = self.store.user_id().await.ok_or(SyncError::MissingUserId)?;
        let created = self
            .api
            .create_todo(&user_id, &token, &TodoItem::draft(text))
            .await?;
        tracing::debug!(id = %created.id, "created todo");
        self.state.send_modify(|s| {
            // Ids are unique in the list even if the server repeats one.
            match s.items.iter_mut().find(|item| item.id == created.id) {
                Some(existing) => *existing = created,
                None => s.items.push(created),
            }
        });
        Ok(())
    }

    async fn try_toggle(&self, id: &str) -> Result<(), SyncError> {
        let token = self.token().await?;
        let user_id = self.store.user_id().await.ok_or(SyncError::MissingUserId)?;
        let current = self
            .state
            .borrow()
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| SyncError::NotFound(id.to_string()))?;

        let flipped = TodoItem {
            completed: !current.completed,
            ..current
        };
        let updated = self.api.update_todo(&user_id, id, &token, &flipped).await?;
        tracing::debug!(id = %updated.id, completed = updated.completed, "updated todo");
        self.state.send_modify(|s| {
            for item in s.items.iter_mut().filter(|item| item.id == updated.id) {
                *item = updated.clone();
            }
        });
        Ok(())
    }

    async fn try_delete(&self, id: &str) -> Result<(), SyncError> {
        let token = self.token().await?;
        let user_id = self.store.user_id().await.ok_or(SyncError::MissingUserId)?;
        self.api.delete_todo(&user_id, id, &token).await?;
        tracing::debug!(id, "deleted todo");
        self.state.send_modify(|s| s.items.retain(|item| item.id != id));
        Ok(())
    }
}

fn finish_loading(state: &watch::Sender<TodoState>) {
    state.send_modify(|s| s.loading = false);
}
