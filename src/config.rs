//! Configuration management for smb-pilot.
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Command-line arguments
//! 2. Environment variables
//! 3. Configuration file (JSON)
//! 4. Default values

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cli::Args;
use crate::session::{Credentials, SessionConfig};

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Connection settings.
    pub session: SessionConfig,
    /// Logging configuration.
    pub logging: LoggingSection,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Log level (error, warn, info, debug, trace) or a full filter.
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Json)
    }

    /// Apply environment variable overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_env_from<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = var("SMB_PILOT_HOST") {
            self.session.host = host;
        }

        if let Some(share) = var("SMB_PILOT_SHARE") {
            self.session.share = share;
        }

        if let Some(user) = var("SMB_PILOT_USER") {
            self.session.user = user;
        }

        if let Some(password) = var("SMB_PILOT_PASSWORD") {
            if !password.is_empty() {
                self.session.credentials = Credentials::Password(password);
            }
        }

        if let Some(level) = var("SMB_PILOT_LOG_LEVEL") {
            self.logging.level = level;
        } else if let Some(level) = var("RUST_LOG") {
            self.logging.level = level;
        }
    }

    /// Apply CLI argument overrides.
    pub fn apply_args(&mut self, args: &Args) {
        let session = &mut self.session;

        if let Some(ref host) = args.host {
            session.host = host.clone();
        }
        if let Some(ref share) = args.share {
            session.share = share.clone();
        }
        if let Some(port) = args.port {
            session.port = port;
        }
        if let Some(ref user) = args.user {
            session.user = user.clone();
        }
        if let Some(ref domain) = args.domain {
            session.domain = domain.clone();
        }
        if let Some(ref credentials) = args.credentials {
            session.credentials = credentials.clone();
        }
        if let Some(ref protocol) = args.max_protocol {
            session.max_protocol = Some(protocol.clone());
        }
        if args.encrypt {
            session.encrypt = true;
        }
        if let Some(secs) = args.timeout {
            session.timeout_secs = secs;
        }

        if let Some(ref level) = args.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Load configuration with full priority chain.
    ///
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let mut config = Config::default();

        if let Some(ref path) = args.config {
            config = Config::from_file(path)?;
        }

        config.apply_env();
        config.apply_args(args);
        config.validate()?;

        Ok(config)
    }

    /// Reject settings `smbclient` can't be started with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.host.trim().is_empty() {
            return Err(ConfigError::MissingHost);
        }
        if self.session.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// Get the log level filter string.
    pub fn log_filter(&self) -> &str {
        &self.logging.level
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    /// IO error reading config file.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// No server host configured.
    MissingHost,
    /// Zero command timeout.
    InvalidTimeout,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read config file: {}", e),
            Self::Json(e) => write!(f, "failed to parse config file: {}", e),
            Self::MissingHost => write!(f, "no server host configured"),
            Self::InvalidTimeout => write!(f, "timeout must be at least one second"),
        }
    }
}

impl std::error::Error for ConfigError {}
