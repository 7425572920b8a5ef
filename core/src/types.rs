//! Wire DTOs for the todo API.
//!
//! # Design
//! These mirror the mock-server's schema but are defined independently so
//! the client never depends on server internals. Integration tests catch any
//! drift between the two crates.

use serde::{Deserialize, Serialize};

/// A single todo item. `id` is assigned by the server; a locally created
/// item is submitted with an empty id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TodoItem {
    #[serde(default)]
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoItem {
    /// An item not yet known to the server.
    pub fn draft(text: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            text: text.into(),
            completed: false,
        }
    }
}

/// Request payload for `POST /api/users/register`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request payload for `POST /api/users/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

/// Response of both register and login: the session token and the user id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub id: String,
}
