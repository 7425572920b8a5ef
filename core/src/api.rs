//! Typed async API client: `TodoClient` plus a `Transport`.

use std::sync::Arc;

use crate::client::TodoClient;
use crate::error::ApiError;
use crate::http::{ReqwestTransport, Transport};
use crate::types::{AuthResponse, Login, Registration, TodoItem};

/// Sends requests built by `TodoClient` through a `Transport` and parses the
/// responses into typed values.
#[derive(Clone)]
pub struct ApiClient {
    client: TodoClient,
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(client: TodoClient, transport: Arc<dyn Transport>) -> Self {
        Self { client, transport }
    }

    /// Client over the default `reqwest` transport.
    pub fn over_http(base_url: &str, api_key: &str) -> Self {
        Self::new(
            TodoClient::new(base_url, api_key),
            Arc::new(ReqwestTransport::new()),
        )
    }

    pub async fn register(&self, input: &Registration) -> Result<AuthResponse, ApiError> {
        let req = self.client.build_register(input)?;
        self.client.parse_auth(self.transport.execute(req).await?)
    }

    pub async fn login(&self, input: &Login) -> Result<AuthResponse, ApiError> {
        let req = self.client.build_login(input)?;
        self.client.parse_auth(self.transport.execute(req).await?)
    }

    pub async fn list_todos(&self, user_id: &str, token: &str) -> Result<Vec<TodoItem>, ApiError> {
        let req = self.client.build_list_todos(user_id, token);
        self.client.parse_list_todos(self.transport.execute(req).await?)
    }

    pub async fn create_todo(
        &self,
        user_id: &str,
        token: &str,
        item: &TodoItem,
    ) -> Result<TodoItem, ApiError> {
        let req = self.client.build_create_todo(user_id, token, item)?;
        self.client.parse_todo(self.transport.execute(req).await?)
    }

    pub async fn update_todo(
        &self,
        user_id: &str,
        todo_id: &str,
        token: &str,
        item: &TodoItem,
    ) -> Result<TodoItem, ApiError> {
        let req = self.client.build_update_todo(user_id, todo_id, token, item)?;
        self.client.parse_todo(self.transport.execute(req).await?)
    }

    pub async fn delete_todo(&self, user_id: &str, todo_id: &str, token: &str) -> Result<(), ApiError> {
        let req = self.client.build_delete_todo(user_id, todo_id, token);
        self.client.parse_delete_todo(self.transport.execute(req).await?)
    }
}
