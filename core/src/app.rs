//! Composition root: one store, one API client, and the components built on
//! them for a single session scope.

use std::sync::Arc;

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::StoreError;
use crate::flow::{LoginFlow, RegistrationFlow, RequestState};
use crate::session::SessionManager;
use crate::store::{CredentialStore, FileCredentialStore};
use crate::sync::TodoSync;

pub struct App {
    store: Arc<dyn CredentialStore>,
    session: SessionManager,
    todos: Arc<TodoSync>,
    login: LoginFlow,
    registration: RegistrationFlow,
}

impl App {
    /// Must be called inside a tokio runtime.
    pub fn new(api: ApiClient, store: Arc<dyn CredentialStore>) -> Self {
        let todos = Arc::new(TodoSync::new(api.clone(), store.clone()));
        Self {
            session: SessionManager::new(store.clone()),
            login: LoginFlow::new(api.clone(), store.clone()),
            registration: RegistrationFlow::new(api, store.clone(), todos.clone()),
            todos,
            store,
        }
    }

    /// HTTP client plus a file-backed store, both taken from `config`.
    pub async fn from_config(config: &Config) -> Result<Self, StoreError> {
        let store = FileCredentialStore::open(&config.credentials_path).await?;
        let api = ApiClient::over_http(&config.base_url, &config.api_key);
        Ok(Self::new(api, Arc::new(store)))
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn todos(&self) -> &TodoSync {
        &self.todos
    }

    pub fn login_flow(&self) -> &LoginFlow {
        &self.login
    }

    pub fn registration_flow(&self) -> &RegistrationFlow {
        &self.registration
    }

    /// Log in, mark the session authenticated, and load the user's todos.
    pub async fn login(&self, email: &str, password: &str) -> RequestState {
        let state = self.login.login(email, password).await;
        if state.is_success() {
            self.session.set_authenticated(true);
            self.todos.refresh().await;
        }
        state
    }

    /// Create an account, mark the session authenticated, then load the
    /// new account's todos. The status flips before the refresh starts.
    pub async fn register(&self, name: &str, email: &str, password: &str) -> RequestState {
        let state = self.registration.register(name, email, password).await;
        if state.is_success() {
            self.session.set_authenticated(true);
            self.todos.refresh().await;
        }
        state
    }

    pub async fn logout(&self) {
        self.session.logout().await;
    }
}
