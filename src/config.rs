//! Driver configuration.
//!
//! Configuration is loaded in the following order (later overrides earlier):
//! 1. Default values
//! 2. YAML config file (if specified via --config or TICKETFLOW_CONFIG)
//! 3. Environment variables

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use ticketflow_core::TicketPriority;

/// Driver configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Defaults for new tickets.
    pub tickets: TicketDefaults,
    /// REPL configuration.
    pub repl: ReplConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Config {
    /// Loads configuration from `path` (if any), then applies environment
    /// variable overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Applies overrides from a variable lookup (the process environment in
    /// production). A value that cannot be parsed is an error.
    fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        self.tickets.apply_overrides(&var)?;
        self.repl.apply_overrides(&var);
        self.logging.apply_overrides(&var);
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tickets.id_prefix.trim().is_empty() {
            return Err(ConfigError::Validation(
                "tickets.id_prefix must not be empty".to_string(),
            ));
        }
        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::Validation(
                "logging.filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Defaults applied when creating tickets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TicketDefaults {
    /// Prefix for generated ticket IDs.
    pub id_prefix: String,
    /// Priority used when none is given.
    pub default_priority: TicketPriority,
}

impl Default for TicketDefaults {
    fn default() -> Self {
        Self {
            id_prefix: "TICKET".to_string(),
            default_priority: TicketPriority::Medium,
        }
    }
}

impl TicketDefaults {
    fn apply_overrides(
        &mut self,
        var: &impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(prefix) = var("TICKETFLOW_ID_PREFIX") {
            self.id_prefix = prefix;
        }

        if let Some(priority) = var("TICKETFLOW_DEFAULT_PRIORITY") {
            self.default_priority = priority.parse().map_err(|e| {
                ConfigError::Validation(format!("TICKETFLOW_DEFAULT_PRIORITY: {e}"))
            })?;
        }

        Ok(())
    }

    /// Generates a fresh ticket ID, e.g. `TICKET-1f3a9c2e`.
    pub fn generate_id(&self) -> String {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.id_prefix, &uuid[..8])
    }

    /// The fixed ID used for the guided session's ticket, e.g. `TICKET-001`.
    pub fn session_id(&self) -> String {
        format!("{}-001", self.id_prefix)
    }
}

/// REPL configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplConfig {
    /// Line-history file. Defaults to `~/.ticketflow_history`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_file: Option<PathBuf>,
}

impl ReplConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(path) = var("TICKETFLOW_HISTORY_FILE") {
            self.history_file = Some(PathBuf::from(path));
        }
    }

    /// Returns the line-history path.
    pub fn history_path(&self) -> PathBuf {
        self.history_file.clone().unwrap_or_else(|| {
            home::home_dir()
                .map(|h| h.join(".ticketflow_history"))
                .unwrap_or_else(|| PathBuf::from(".ticketflow_history"))
        })
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is not set.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl LoggingConfig {
    fn apply_overrides(&mut self, var: &impl Fn(&str) -> Option<String>) {
        if let Some(filter) = var("TICKETFLOW_LOG") {
            self.filter = filter;
        }
    }
}

/// Configuration error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("configuration validation failed: {0}")]
    Validation(String),
}
