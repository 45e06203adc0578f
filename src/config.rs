//! Service configuration.
//!
//! Settings are read from a YAML file (default `config/config.yaml`, or the
//! path in `TODO_LIST_CONFIG`) and then overridden by environment variables:
//!
//! - `TODO_LIST_HOST`, `TODO_LIST_PORT`: listen address
//! - `TODO_LIST_STORAGE`: `postgres` | `in_memory`
//! - `DATABASE_URL`: `PostgreSQL` connection URL
//!
//! The log level in the file is only a default; `RUST_LOG` wins when set.
//! Variables may also come from a `.env` file, see [`load_env_file`].

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Config file used when `TODO_LIST_CONFIG` is unset.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Errors returned while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`Config`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// An environment override holds an unusable value.
    #[error("invalid value '{value}' for {key}")]
    InvalidOverride {
        /// Environment variable name.
        key: &'static str,
        /// Rejected value.
        value: String,
    },

    /// `PostgreSQL` storage was selected without a connection URL.
    #[error("storage backend is postgres but no database url is configured")]
    MissingDatabaseUrl,
}

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Diesel-backed `PostgreSQL` storage.
    Postgres,
    /// Process-local storage, lost on exit.
    InMemory,
}

impl StorageBackend {
    fn from_name(value: &str) -> Option<Self> {
        match value {
            "postgres" => Some(Self::Postgres),
            "in_memory" => Some(Self::InMemory),
            _ => None,
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen host.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Deadline for each storage call; `0` disables it.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: 8080,
            request_timeout_secs: 5,
        }
    }
}

impl ServerConfig {
    /// Returns the storage deadline, or `None` when disabled.
    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.request_timeout_secs))
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Selected backend.
    pub backend: StorageBackend,
    /// `PostgreSQL` connection URL.
    pub url: Option<String>,
    /// Maximum pooled connections.
    pub pool_size: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::InMemory,
            url: None,
            pool_size: 8,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default `tracing` filter directive.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Storage settings.
    pub storage: StorageConfig,
    /// Logging settings.
    pub log: LogConfig,
}

impl Config {
    /// Loads the file named by `TODO_LIST_CONFIG` (or the default path) and
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read or parsed, or an
    /// override is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var_os("TODO_LIST_CONFIG")
            .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
        Self::load(&path)?.with_overrides(|key| std::env::var(key).ok())
    }

    /// Reads and parses a YAML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    /// Parses YAML config text. Missing sections take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed YAML or unknown values.
    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    /// Applies overrides looked up by environment variable name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOverride`] for an unparsable port or
    /// backend name.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(host) = lookup("TODO_LIST_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("TODO_LIST_PORT") {
            self.server.port = port.parse().map_err(|_| ConfigError::InvalidOverride {
                key: "TODO_LIST_PORT",
                value: port.clone(),
            })?;
        }
        if let Some(backend) = lookup("TODO_LIST_STORAGE") {
            self.storage.backend = StorageBackend::from_name(&backend).ok_or_else(|| {
                ConfigError::InvalidOverride {
                    key: "TODO_LIST_STORAGE",
                    value: backend.clone(),
                }
            })?;
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.storage.url = Some(url);
        }
        Ok(self)
    }

    /// Returns the database URL required by the `PostgreSQL` backend.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingDatabaseUrl`] when none is configured.
    pub fn database_url(&self) -> Result<&str, ConfigError> {
        self.storage
            .url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingDatabaseUrl)
    }
}

/// Loads a `.env` file from the working directory or one of its parents
/// into the process environment.
///
/// Returns the path that was loaded, or `None` when there is no such file.
///
/// # Errors
///
/// Returns the [`dotenvy::Error`] for a `.env` file that exists but cannot
/// be read or parsed.
pub fn load_env_file() -> Result<Option<PathBuf>, dotenvy::Error> {
    env_file_outcome(dotenvy::dotenv())
}

fn env_file_outcome(
    loaded: Result<PathBuf, dotenvy::Error>,
) -> Result<Option<PathBuf>, dotenvy::Error> {
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(err),
    }
}
