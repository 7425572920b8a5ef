//! Session-scoped todo synchronization over the todo REST API.
//!
//! # Overview
//! A user logs in or registers through an auth flow, the returned token and
//! user id land in a Credential Store, the Session Manager derives an
//! authenticated status from that store, and the Todo Synchronizer keeps an
//! in-memory todo list consistent with the server.
//!
//! # Design
//! - `TodoClient` is stateless: it builds `HttpRequest`s and parses
//!   `HttpResponse`s without touching the network.
//! - A `Transport` executes the round-trip; `ReqwestTransport` is the real
//!   one, tests plug in scripted ones.
//! - `ApiClient` glues the two into typed async calls.
//! - Every observable piece of state is a `tokio::sync::watch` channel, so
//!   any front end can subscribe without a UI framework in the core.
//! - Failures inside the synchronizer and the flows end up as state, never
//!   as a returned error.

pub mod api;
pub mod app;
pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod http;
pub mod session;
pub mod store;
pub mod sync;
pub mod types;

pub use api::ApiClient;
pub use app::App;
pub use client::TodoClient;
pub use config::{Config, ConfigError, ConfigOverrides};
pub use error::{ApiError, AuthError, StoreError, SyncError};
pub use flow::{LoginFlow, RegistrationFlow, RequestState};
pub use http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, Transport};
pub use session::{AuthState, SessionManager};
pub use store::{CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore};
pub use sync::{TodoState, TodoSync};
pub use types::{AuthResponse, Login, Registration, TodoItem};
