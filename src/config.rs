//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration for the sighting board, supporting a TOML file,
//! environment variable overrides, and validated defaults suitable for running
//! with no configuration at all.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration file (TOML), environment variables, CLI arguments
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Type checking and range validation with detailed error messages
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Command line arguments (highest priority)
//! 2. Environment variables (`PORT`, `PET_SCOUT_HOST`, `PET_SCOUT_PORT`, `PET_SCOUT_LOG`)
//! 3. Configuration file
//! 4. Default values (lowest priority)
//!
//! `PORT` is honored because the usual deployment platforms inject the listen
//! port that way; `PET_SCOUT_PORT` wins over it when both are set.

use crate::errors::{Result, ScoutError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server and API configuration
    pub server: ServerConfig,
    /// Background expiry sweeper behavior
    pub sweeper: SweeperConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server and API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
    /// Enable permissive CORS (game clients call from foreign origins)
    pub enable_cors: bool,
}

/// Background expiry sweeper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweeperConfig {
    /// Enable the periodic sweep task
    pub enabled: bool,
    /// Sweep interval in seconds
    pub interval_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Emit JSON-formatted log lines
    pub json_format: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            enable_cors: true,
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 120,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ScoutError::Config {
                message: format!("Failed to read config file {:?}: {}", path, e),
            })?;

            toml::from_str(&content).map_err(|e| ScoutError::Config {
                message: format!("Failed to parse config file {:?}: {}", path, e),
            })?
        } else {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port.parse().map_err(|_| ScoutError::Config {
                message: "Invalid port number in PORT".to_string(),
            })?;
        }
        if let Ok(host) = std::env::var("PET_SCOUT_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PET_SCOUT_PORT") {
            self.server.port = port.parse().map_err(|_| ScoutError::Config {
                message: "Invalid port number in PET_SCOUT_PORT".to_string(),
            })?;
        }
        if let Ok(level) = std::env::var("PET_SCOUT_LOG") {
            self.logging.level = level;
        }

        Ok(())
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ScoutError::validation("server.port", "Port cannot be zero"));
        }

        if self.sweeper.enabled && self.sweeper.interval_seconds == 0 {
            return Err(ScoutError::validation(
                "sweeper.interval_seconds",
                "Sweep interval cannot be zero when the sweeper is enabled",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 10000);
        assert!(config.server.enable_cors);
        assert!(config.sweeper.enabled);
        assert_eq!(config.sweeper.interval_seconds, 120);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_file_overrides_defaults() {
        for var in ["PORT", "PET_SCOUT_HOST", "PET_SCOUT_PORT", "PET_SCOUT_LOG"] {
            std::env::remove_var(var);
        }
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 8080\n\n[sweeper]\ninterval_seconds = 30").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.sweeper.interval_seconds, 30);
        // untouched sections keep defaults
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn zero_port_is_rejected() {
        let config = Config {
            server: ServerConfig {
                port: 0,
                ..ServerConfig::default()
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_sweep_interval_is_rejected_when_enabled() {
        let config = Config {
            sweeper: SweeperConfig {
                enabled: true,
                interval_seconds: 0,
            },
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
