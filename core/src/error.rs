//! Error types for the todo API client and the session-scoped flows.
//!
//! # Design
//! `ApiError` covers everything that can go wrong between building a request
//! and holding a typed response. Non-2xx responses land in `Http` with the
//! raw status code and body so the flows can surface both to the user.
//! `SyncError` is the operation-boundary taxonomy the synchronizer converts
//! into its `error` field; it never escapes to callers as a `Result`.

use thiserror::Error;

/// Errors returned by `TodoClient` parse methods and `Transport`s.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response (connect, TLS, IO).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Status code of a structured error response, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures of a single synchronizer operation.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No authentication token found")]
    MissingToken,

    #[error("No user id found")]
    MissingUserId,

    /// The id is not present in the in-memory list.
    #[error("Todo not found")]
    NotFound(String),

    #[error(transparent)]
    Remote(#[from] ApiError),
}

impl SyncError {
    /// Missing credentials are reported verbatim; everything else gets the
    /// operation's prefix.
    pub(crate) fn is_missing_credential(&self) -> bool {
        matches!(self, SyncError::MissingToken | SyncError::MissingUserId)
    }
}

/// Failures of a login or registration attempt.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Remote(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from a `CredentialStore` backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access credential file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse credential file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize credentials for '{path}': {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
