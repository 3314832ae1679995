//! Server configuration.
//!
//! Values come from defaults, then an optional TOML file, then `SCOREKEEP_*`
//! environment variables, then command-line flags.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use strum::{Display as StrumDisplay, EnumString};
use tracing::{debug, info, instrument};

use crate::db::DEFAULT_BUSY_TIMEOUT_MS;

/// Which backend the server runs with.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, StrumDisplay, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ServerMode {
    /// Players, sessions and high scores in SQLite.
    #[default]
    Persistent,
    /// Last reported score per username, in memory only.
    Legacy,
}

/// Configuration for the HTTP server and its store.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind to.
    #[serde(default = "default_port")]
    port: u16,

    /// SQLite database file.
    #[serde(default = "default_db_path")]
    db_path: String,

    /// How long a write waits for a locked database, in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    busy_timeout_ms: u64,

    /// Backend to serve from.
    #[serde(default)]
    mode: ServerMode,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_db_path() -> String {
    "scorekeep.db".to_string()
}

fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
            mode: ServerMode::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        let config = Self::from_toml(&content)?;
        info!(db_path = %config.db_path, mode = %config.mode, "Config loaded successfully");
        Ok(config)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))
    }

    /// Applies overrides read through `lookup` (normally the process
    /// environment): `SCOREKEEP_HOST`, `SCOREKEEP_PORT`, `SCOREKEEP_DB_PATH`,
    /// `SCOREKEEP_BUSY_TIMEOUT_MS` and `SCOREKEEP_MODE`.
    #[instrument(skip(self, lookup))]
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SCOREKEEP_HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("SCOREKEEP_PORT") {
            self.port = parse_var("SCOREKEEP_PORT", &port)?;
        }
        if let Some(db_path) = lookup("SCOREKEEP_DB_PATH") {
            self.db_path = db_path;
        }
        if let Some(timeout) = lookup("SCOREKEEP_BUSY_TIMEOUT_MS") {
            self.busy_timeout_ms = parse_var("SCOREKEEP_BUSY_TIMEOUT_MS", &timeout)?;
        }
        if let Some(mode) = lookup("SCOREKEEP_MODE") {
            self.mode = parse_var("SCOREKEEP_MODE", &mode)?;
        }
        debug!(config = ?self, "Environment overrides applied");
        Ok(self)
    }

    /// Overrides the bind host.
    pub fn with_host(mut self, host: String) -> Self {
        self.host = host;
        self
    }

    /// Overrides the bind port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the database path.
    pub fn with_db_path(mut self, db_path: String) -> Self {
        self.db_path = db_path;
        self
    }

    /// Overrides the backend.
    pub fn with_mode(mut self, mode: ServerMode) -> Self {
        self.mode = mode;
        self
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::new(format!("Invalid {} '{}': {}", name, value, e)))
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = ServerConfig::from_toml("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port(), &5000);
        assert_eq!(config.mode(), &ServerMode::Persistent);
    }

    #[test]
    fn toml_overrides_fields() {
        let config = ServerConfig::from_toml(
            r#"
            port = 8080
            db_path = "/tmp/scores.db"
            mode = "legacy"
            "#,
        )
        .unwrap();
        assert_eq!(config.port(), &8080);
        assert_eq!(config.db_path(), "/tmp/scores.db");
        assert_eq!(config.mode(), &ServerMode::Legacy);
        assert_eq!(config.host(), "127.0.0.1");
    }

    #[test]
    fn bad_toml_is_an_error() {
        assert!(ServerConfig::from_toml("port = \"eighty\"").is_err());
        assert!(ServerConfig::from_toml("mode = \"cloud\"").is_err());
    }

    #[test]
    fn env_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            ("SCOREKEEP_PORT", "9000"),
            ("SCOREKEEP_MODE", "Legacy"),
            ("SCOREKEEP_DB_PATH", "env.db"),
        ]
        .into_iter()
        .collect();
        let config = ServerConfig::default()
            .apply_env(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.port(), &9000);
        assert_eq!(config.mode(), &ServerMode::Legacy);
        assert_eq!(config.db_path(), "env.db");
        assert_eq!(config.busy_timeout_ms(), &DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn bad_env_value_is_an_error() {
        let result = ServerConfig::default()
            .apply_env(|k| (k == "SCOREKEEP_PORT").then(|| "not-a-port".to_string()));
        let err = result.unwrap_err();
        assert!(err.message.contains("SCOREKEEP_PORT"));
    }

    #[test]
    fn mode_names() {
        assert_eq!(ServerMode::Legacy.to_string(), "legacy");
        assert_eq!("PERSISTENT".parse::<ServerMode>().unwrap(), ServerMode::Persistent);
    }
}
