//! Credential Store: the durable home of the session token and user id.
//!
//! # Design
//! Both backends keep the current value in a `tokio::sync::watch` channel,
//! so readers get the latest pair without touching the backend and
//! observers are woken on every `save`/`clear`. Token and user id are only
//! ever written together.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;

use crate::error::StoreError;

/// The active session's token and user id.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub user_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"••••••••")
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Async key-value store for session credentials.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current credentials, if a session is stored.
    async fn credentials(&self) -> Option<Credentials>;

    async fn token(&self) -> Option<String> {
        self.credentials().await.map(|c| c.token)
    }

    async fn user_id(&self) -> Option<String> {
        self.credentials().await.map(|c| c.user_id)
    }

    async fn save(&self, token: &str, user_id: &str) -> Result<(), StoreError>;

    async fn clear(&self) -> Result<(), StoreError>;

    /// Change stream. The receiver starts at the current value.
    fn subscribe(&self) -> watch::Receiver<Option<Credentials>>;
}

/// In-process store; contents are lost when dropped.
#[derive(Debug)]
pub struct MemoryCredentialStore {
    current: watch::Sender<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            current: watch::Sender::new(None),
        }
    }

    pub fn with_credentials(token: &str, user_id: &str) -> Self {
        Self {
            current: watch::Sender::new(Some(Credentials {
                token: token.to_string(),
                user_id: user_id.to_string(),
            })),
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn credentials(&self) -> Option<Credentials> {
        self.current.borrow().clone()
    }

    async fn save(&self, token: &str, user_id: &str) -> Result<(), StoreError> {
        self.current.send_replace(Some(Credentials {
            token: token.to_string(),
            user_id: user_id.to_string(),
        }));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Credentials>> {
        self.current.subscribe()
    }
}

/// Store persisted as a small JSON file. A missing file means no session.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    current: watch::Sender<Option<Credentials>>,
}

impl FileCredentialStore {
    /// Load the file at `path` if it exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let initial = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => Some(serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
                path: path.display().to_string(),
                source,
            })?),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        tracing::debug!(path = %path.display(), present = initial.is_some(), "opened credential store");
        Ok(Self {
            path,
            current: watch::Sender::new(initial),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn credentials(&self) -> Option<Credentials> {
        self.current.borrow().clone()
    }

    async fn save(&self, token: &str, user_id: &str) -> Result<(), StoreError> {
        let credentials = Credentials {
            token: token.to_string(),
            user_id: user_id.to_string(),
        };
        let raw =
            serde_json::to_string_pretty(&credentials).map_err(|source| StoreError::Serialize {
                path: self.path.display().to_string(),
                source,
            })?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.io_error(e))?;
        }
        // Write-then-rename so a crash never leaves half a file behind.
        let tmp = self.path.with_extension("tmp");
        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(0o600);
        let mut file = options.open(&tmp).await.map_err(|e| self.io_error(e))?;
        file.write_all(raw.as_bytes())
            .await
            .map_err(|e| self.io_error(e))?;
        file.sync_all().await.map_err(|e| self.io_error(e))?;
        drop(file);

        // Owner read/write only; a stale tmp file keeps its old mode otherwise.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| self.io_error(e))?;
        }
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| self.io_error(e))?;

        self.current.send_replace(Some(credentials));
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_error(e)),
        }
        self.current.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Credentials>> {
        self.current.subscribe()
    }
}
