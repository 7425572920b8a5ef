//! Stateless HTTP request builder and response parser for the todo API.
//!
//! # Design
//! `TodoClient` holds only `base_url` and the static API key and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`. Session credentials are passed per call, never stored,
//! so a request is always built from whatever the caller read last.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{AuthResponse, Login, Registration, TodoItem};

/// Bytes escaped inside a single path segment. Ids are opaque, so anything
/// that would end or split the segment is encoded.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'\\')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Synchronous, stateless client for the todo API.
#[derive(Clone)]
pub struct TodoClient {
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for TodoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"••••••••")
            .finish()
    }
}

impl TodoClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn build_register(&self, input: &Registration) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, self.users_url("register"), None, input)
    }

    pub fn build_login(&self, input: &Login) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, self.users_url("login"), None, input)
    }

    pub fn build_list_todos(&self, user_id: &str, token: &str) -> HttpRequest {
        self.bare_request(HttpMethod::Get, self.todos_url(user_id, None), token)
    }

    pub fn build_create_todo(
        &self,
        user_id: &str,
        token: &str,
        item: &TodoItem,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, self.todos_url(user_id, None), Some(token), item)
    }

    pub fn build_update_todo(
        &self,
        user_id: &str,
        todo_id: &str,
        token: &str,
        item: &TodoItem,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(
            HttpMethod::Put,
            self.todos_url(user_id, Some(todo_id)),
            Some(token),
            item,
        )
    }

    pub fn build_delete_todo(&self, user_id: &str, todo_id: &str, token: &str) -> HttpRequest {
        self.bare_request(HttpMethod::Delete, self.todos_url(user_id, Some(todo_id)), token)
    }

    pub fn parse_auth(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        parse_json(response)
    }

    pub fn parse_list_todos(&self, response: HttpResponse) -> Result<Vec<TodoItem>, ApiError> {
        parse_json(response)
    }

    pub fn parse_todo(&self, response: HttpResponse) -> Result<TodoItem, ApiError> {
        parse_json(response)
    }

    pub fn parse_delete_todo(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    fn users_url(&self, action: &str) -> String {
        format!("{}/api/users/{action}", self.base_url)
    }

    fn todos_url(&self, user_id: &str, todo_id: Option<&str>) -> String {
        let user_id = segment(user_id);
        match todo_id {
            Some(id) => format!("{}/api/users/{user_id}/todos/{}", self.base_url, segment(id)),
            None => format!("{}/api/users/{user_id}/todos", self.base_url),
        }
    }

    fn api_key_query(&self) -> Vec<(String, String)> {
        vec![("apikey".to_string(), self.api_key.clone())]
    }

    fn bare_request(&self, method: HttpMethod, url: String, token: &str) -> HttpRequest {
        HttpRequest {
            method,
            url,
            query: self.api_key_query(),
            headers: vec![bearer(token)],
            body: None,
        }
    }

    fn json_request<T: Serialize>(
        &self,
        method: HttpMethod,
        url: String,
        token: Option<&str>,
        payload: &T,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut headers = vec![("content-type".to_string(), "application/json".to_string())];
        if let Some(token) = token {
            headers.push(bearer(token));
        }
        Ok(HttpRequest {
            method,
            url,
            query: self.api_key_query(),
            headers,
            body: Some(body),
        })
    }
}

fn segment(raw: &str) -> String {
    utf8_percent_encode(raw, PATH_SEGMENT_ENCODE_SET).to_string()
}

fn bearer(token: &str) -> (String, String) {
    ("authorization".to_string(), format!("Bearer {token}"))
}

fn parse_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    check_status(&response)?;
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Any 2xx is success; everything else becomes `ApiError::Http`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if (200..300).contains(&response.status) {
        return Ok(());
    }
    Err(ApiError::Http {
        status: response.status,
        body: response.body.clone(),
    })
}
