//! Configuration for the catalogue service
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! environment variables. The store connection profile comes from the
//! environment only; without one the service refuses to start.

mod logging;
mod service;
mod store;

pub use logging::*;
pub use service::*;
pub use store::*;

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Environment variable names
pub mod env {
    /// `true` selects the plain local profile
    pub const MONGO: &str = "MONGO";
    /// `true` selects the secured cluster profile
    pub const DOCUMENTDB: &str = "DOCUMENTDB";
    /// Connection URL override for either profile
    pub const MONGO_URL: &str = "MONGO_URL";
    /// Artificial by-SKU delay in milliseconds
    pub const GO_SLOW: &str = "GO_SLOW";
    pub const SERVER_PORT: &str = "CATALOGUE_SERVER_PORT";
    pub const RETRY_INTERVAL_MS: &str = "CATALOGUE_RETRY_INTERVAL_MS";
    pub const PING_INTERVAL_MS: &str = "CATALOGUE_PING_INTERVAL_MS";
    pub const LOG_FORMAT: &str = "CATALOGUE_LOG_FORMAT";
    pub const LOG_LEVEL: &str = "CATALOGUE_LOG_LEVEL";
}

/// Errors raised while resolving configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No database configuration set: set {}=true or {}=true", env::MONGO, env::DOCUMENTDB)]
    NoConnectionProfile,

    #[error("Invalid value '{value}' for {name}: {reason}")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file '{}': {source}", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}': {source}", .path.display())]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration:\n  - {}", .0.join("\n  - "))]
    Invalid(Vec<String>),
}

/// Settings that may come from a TOML file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub http: HttpConfig,
    pub supervisor: SupervisorConfig,
    pub logging: LoggingConfig,
}

impl FileConfig {
    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved service configuration, immutable after startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Store connection profile
    pub store: StoreConfig,
    /// HTTP API server
    pub http: HttpConfig,
    /// Connection supervisor
    pub supervisor: SupervisorConfig,
    /// Logging
    pub logging: LoggingConfig,
}

impl Config {
    /// Resolve configuration from an optional TOML file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path.map(FileConfig::load).transpose()?;
        Self::resolve(file.unwrap_or_default(), |name| std::env::var(name).ok())
    }

    /// Resolve configuration from file settings and an environment lookup.
    ///
    /// The lookup is injected so resolution can be exercised without touching
    /// the real process environment.
    pub fn resolve<F>(file: FileConfig, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let store = resolve_store(&lookup)?;

        let FileConfig {
            mut http,
            mut supervisor,
            mut logging,
        } = file;

        if let Some(port) = parse_var::<_, u16>(&lookup, env::SERVER_PORT)? {
            http.port = port;
        }
        if let Some(delay) = parse_var::<_, u64>(&lookup, env::GO_SLOW)? {
            http.sku_delay_ms = delay;
        }
        if let Some(retry) = parse_var::<_, u64>(&lookup, env::RETRY_INTERVAL_MS)? {
            supervisor.retry_interval_ms = retry;
        }
        if let Some(ping) = parse_var::<_, u64>(&lookup, env::PING_INTERVAL_MS)? {
            supervisor.ping_interval_ms = ping;
        }
        if let Some(format) = parse_var::<_, LogFormat>(&lookup, env::LOG_FORMAT)? {
            logging.format = format;
        }
        if let Some(level) = parse_var::<_, LogLevel>(&lookup, env::LOG_LEVEL)? {
            logging.level = level;
        }

        let config = Self {
            store,
            http,
            supervisor,
            logging,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration fields, reporting every problem at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if !self.store.url.starts_with("mongodb://") && !self.store.url.starts_with("mongodb+srv://") {
            errors.push(format!(
                "connection URL must use the mongodb:// or mongodb+srv:// scheme, got '{}'",
                self.store.redacted_url()
            ));
        }
        if self.http.port == 0 {
            errors.push("HTTP listen port must be between 1 and 65535, got 0".to_string());
        }
        if self.http.listen_host.trim().is_empty() {
            errors.push("HTTP listen host must not be empty".to_string());
        }
        if self.supervisor.retry_interval_ms == 0 {
            errors.push("retry_interval_ms must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errors))
        }
    }
}

/// Pick the connection profile from the two mode toggles.
fn toggle_enabled<F>(lookup: &F, name: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).is_some_and(|value| value == "true")
}

/// True when both connection profile toggles are set. The plain profile wins.
pub fn profiles_conflict<F>(lookup: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    toggle_enabled(&lookup, env::MONGO) && toggle_enabled(&lookup, env::DOCUMENTDB)
}

fn resolve_store<F>(lookup: &F) -> Result<StoreConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let enabled = |name: &str| toggle_enabled(lookup, name);

    // The plain toggle is checked first, so it wins when both are set.
    let mode = if enabled(env::MONGO) {
        ConnectionMode::Plain
    } else if enabled(env::DOCUMENTDB) {
        ConnectionMode::Secured
    } else {
        return Err(ConfigError::NoConnectionProfile);
    };

    let store = StoreConfig::new(mode);
    Ok(match lookup(env::MONGO_URL) {
        Some(url) => store.with_url(url),
        None => store,
    })
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(name)
        .map(|value| {
            value.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
                name: name.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })
        })
        .transpose()
}
