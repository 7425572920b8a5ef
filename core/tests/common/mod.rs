//! Scripted in-memory transport shared by the flow and synchronizer tests.
//!
//! `FakeTransport` behaves like a tiny single-user todo server and records
//! every request it sees, so tests can assert both on state and on whether
//! the network was touched at all.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use todo_core::{
    ApiClient, ApiError, HttpMethod, HttpRequest, HttpResponse, TodoClient, TodoItem, Transport,
};

pub const BASE_URL: &str = "http://fake.local";
pub const API_KEY: &str = "test-key";

enum Scripted {
    Response(HttpResponse),
    TransportError(String),
}

#[derive(Default)]
struct FakeState {
    todos: Vec<TodoItem>,
    next_id: u32,
    scripted: VecDeque<Scripted>,
    requests: Vec<HttpRequest>,
    auth: Option<(String, String)>,
}

#[derive(Default, Clone)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        let fake = Self::default();
        fake.set_auth_response("T", "U");
        fake
    }

    pub fn api(&self) -> ApiClient {
        ApiClient::new(TodoClient::new(BASE_URL, API_KEY), Arc::new(self.clone()))
    }

    /// Replace the server-side collection.
    pub fn set_todos(&self, todos: Vec<TodoItem>) {
        let mut state = self.state.lock().unwrap();
        state.next_id = todos.len() as u32;
        state.todos = todos;
    }

    pub fn set_auth_response(&self, token: &str, id: &str) {
        self.state.lock().unwrap().auth = Some((token.to_string(), id.to_string()));
    }

    /// The next request gets this response instead of the simulated one.
    pub fn fail_next(&self, status: u16, body: &str) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .push_back(Scripted::Response(HttpResponse {
                status,
                headers: Vec::new(),
                body: body.to_string(),
            }));
    }

    pub fn drop_next(&self, reason: &str) {
        self.state
            .lock()
            .unwrap()
            .scripted
            .push_back(Scripted::TransportError(reason.to_string()));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn server_todos(&self) -> Vec<TodoItem> {
        self.state.lock().unwrap().todos.clone()
    }
}

fn respond(status: u16, body: impl Into<String>) -> HttpResponse {
    HttpResponse {
        status,
        headers: Vec::new(),
        body: body.into(),
    }
}

fn simulate(state: &mut FakeState, request: &HttpRequest) -> HttpResponse {
    let path = request.url.strip_prefix(BASE_URL).unwrap_or(&request.url);
    let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();

    match (request.method, segments.as_slice()) {
        (HttpMethod::Post, ["api", "users", "register" | "login"]) => match &state.auth {
            Some((token, id)) => respond(
                200,
                serde_json::json!({ "token": token, "id": id }).to_string(),
            ),
            None => respond(401, r#"{"message":"Invalid credentials"}"#),
        },
        (HttpMethod::Get, ["api", "users", _, "todos"]) => {
            respond(200, serde_json::to_string(&state.todos).unwrap())
        }
        (HttpMethod::Post, ["api", "users", _, "todos"]) => {
            let mut item: TodoItem =
                serde_json::from_str(request.body.as_deref().unwrap_or_default()).unwrap();
            state.next_id += 1;
            item.id = format!("t{}", state.next_id);
            state.todos.push(item.clone());
            respond(201, serde_json::to_string(&item).unwrap())
        }
        (HttpMethod::Put, ["api", "users", _, "todos", id]) => {
            let mut item: TodoItem =
                serde_json::from_str(request.body.as_deref().unwrap_or_default()).unwrap();
            item.id = id.to_string();
            match state.todos.iter_mut().find(|t| t.id == *id) {
                Some(existing) => {
                    *existing = item.clone();
                    respond(200, serde_json::to_string(&item).unwrap())
                }
                None => respond(404, r#"{"message":"Todo not found"}"#),
            }
        }
        (HttpMethod::Delete, ["api", "users", _, "todos", id]) => {
            let before = state.todos.len();
            state.todos.retain(|t| t.id != *id);
            if state.todos.len() == before {
                respond(404, r#"{"message":"Todo not found"}"#)
            } else {
                respond(204, "")
            }
        }
        _ => respond(404, ""),
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        match state.scripted.pop_front() {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::TransportError(reason)) => Err(ApiError::Transport(reason)),
            None => Ok(simulate(&mut state, &request)),
        }
    }
}

/// Holds each request until the test releases it, so in-flight state can be
/// observed.
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
    inner: FakeTransport,
}

impl Gate {
    pub fn new(inner: FakeTransport) -> Arc<Self> {
        Arc::new(Self {
            entered: Notify::new(),
            release: Notify::new(),
            inner,
        })
    }

    pub fn api(self: &Arc<Self>) -> ApiClient {
        ApiClient::new(TodoClient::new(BASE_URL, API_KEY), self.clone())
    }
}

#[async_trait]
impl Transport for Gate {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.entered.notify_one();
        self.release.notified().await;
        self.inner.execute(request).await
    }
}

pub fn item(id: &str, text: &str, completed: bool) -> TodoItem {
    TodoItem {
        id: id.to_string(),
        text: text.to_string(),
        completed,
    }
}
