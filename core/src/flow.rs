//! Login and registration flows.
//!
//! Each flow owns one `RequestState` and runs the same machine:
//!
//! ```text
//! Idle --invoke--> Loading --ok--> Success
//!                  Loading --fail--> Error(message)
//! Success | Error --clear_state--> Idle
//! ```
//!
//! A successful call stores the returned token and user id in the
//! Credential Store before reporting `Success`.

use std::sync::Arc;

use tokio::sync::watch;

use crate::api::ApiClient;
use crate::error::AuthError;
use crate::store::CredentialStore;
use crate::sync::TodoSync;
use crate::types::{AuthResponse, Login, Registration};

/// Progress of a single login or registration request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestState {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl RequestState {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestState::Success)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RequestState::Error(message) => Some(message),
            _ => None,
        }
    }
}

/// Shared machinery of both flows.
struct FlowCore {
    api: ApiClient,
    store: Arc<dyn CredentialStore>,
    state: watch::Sender<RequestState>,
}

impl FlowCore {
    fn new(api: ApiClient, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            api,
            store,
            state: watch::Sender::new(RequestState::Idle),
        }
    }

    fn set(&self, state: RequestState) -> RequestState {
        self.state.send_replace(state.clone());
        state
    }

    async fn establish(&self, response: Result<AuthResponse, AuthError>) -> Result<(), AuthError> {
        let response = response?;
        self.store.save(&response.token, &response.id).await?;
        tracing::info!(user_id = %response.id, "session established");
        Ok(())
    }

    fn finish(&self, label: &str, result: Result<(), AuthError>) -> RequestState {
        match result {
            Ok(()) => self.set(RequestState::Success),
            Err(err) => {
                tracing::warn!(error = %err, "{label} failed");
                self.set(RequestState::Error(format!("{label} failed: {err}")))
            }
        }
    }
}

pub struct LoginFlow {
    core: FlowCore,
}

impl LoginFlow {
    pub fn new(api: ApiClient, store: Arc<dyn CredentialStore>) -> Self {
        Self {
            core: FlowCore::new(api, store),
        }
    }

    pub fn state(&self) -> RequestState {
        self.core.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.core.state.subscribe()
    }

    /// Returns the state the flow ended in.
    pub async fn login(&self, email: &str, password: &str) -> RequestState {
        self.core.set(RequestState::Loading);
        let input = Login {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.core.api.login(&input).await.map_err(AuthError::from);
        let result = self.core.establish(response).await;
        self.core.finish("Login", result)
    }

    pub fn clear_state(&self) {
        self.core.set(RequestState::Idle);
    }
}

pub struct RegistrationFlow {
    core: FlowCore,
    todos: Arc<TodoSync>,
}

impl RegistrationFlow {
    pub fn new(api: ApiClient, store: Arc<dyn CredentialStore>, todos: Arc<TodoSync>) -> Self {
        Self {
            core: FlowCore::new(api, store),
            todos,
        }
    }

    pub fn state(&self) -> RequestState {
        self.core.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.core.state.subscribe()
    }

    /// Returns the state the flow ended in. On success the todo list is
    /// refreshed for the new account.
    pub async fn create_account(&self, name: &str, email: &str, password: &str) -> RequestState {
        let state = self.register(name, email, password).await;
        if state.is_success() {
            self.todos.refresh().await;
        }
        state
    }

    /// The registration call alone, without the follow-up refresh.
    pub(crate) async fn register(&self, name: &str, email: &str, password: &str) -> RequestState {
        self.core.set(RequestState::Loading);
        let input = Registration {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = self.core.api.register(&input).await.map_err(AuthError::from);
        let result = self.core.establish(response).await;
        self.core.finish("Registration", result)
    }

    pub fn clear_state(&self) {
        self.core.set(RequestState::Idle);
    }
}
