//! Runtime configuration: where the API lives, the API key, and where the
//! session is persisted.
//!
//! Values are resolved in order: explicit overrides, environment variables,
//! then defaults. The API key has no default.

use std::path::PathBuf;

use thiserror::Error;

pub const ENV_API_URL: &str = "TODO_API_URL";
pub const ENV_API_KEY: &str = "TODO_API_KEY";
pub const ENV_CREDENTIALS_PATH: &str = "TODO_CREDENTIALS_PATH";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key is not set (pass --api-key or set TODO_API_KEY)")]
    MissingApiKey,

    #[error("could not determine a config directory; set TODO_CREDENTIALS_PATH")]
    NoConfigDir,
}

/// Values supplied explicitly, e.g. from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub credentials_path: Option<PathBuf>,
}

#[derive(Clone)]
pub struct Config {
    pub base_url: String,
    pub api_key: String,
    pub credentials_path: PathBuf,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("api_key", &"••••••••")
            .field("credentials_path", &self.credentials_path)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(ConfigOverrides::default())
    }

    pub fn load(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        Self::resolve(overrides, |name| std::env::var(name).ok())
    }

    fn resolve(
        overrides: ConfigOverrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let non_empty = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let base_url = overrides
            .base_url
            .or_else(|| non_empty(ENV_API_URL))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_key = overrides
            .api_key
            .or_else(|| non_empty(ENV_API_KEY))
            .ok_or(ConfigError::MissingApiKey)?;
        let credentials_path = match overrides
            .credentials_path
            .or_else(|| non_empty(ENV_CREDENTIALS_PATH).map(PathBuf::from))
        {
            Some(path) => path,
            None => default_credentials_path().ok_or(ConfigError::NoConfigDir)?,
        };

        Ok(Self {
            base_url,
            api_key,
            credentials_path,
        })
    }
}

/// `<config_dir>/todo-sync/credentials.json`
pub fn default_credentials_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("todo-sync").join("credentials.json"))
}
