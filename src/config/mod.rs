//! Configuration module
//!
//! Handles loading and parsing of YAML configuration files with support for
//! environment variable expansion and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

mod loader;

pub use loader::ConfigLoader;

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in a string.
///
/// Supports two syntaxes:
/// - `${VAR_NAME}` - Simple expansion, keeps placeholder if var not found
/// - `${VAR_NAME:-default}` - Expansion with default value
///
/// Variable names must start with a letter or underscore and contain only
/// uppercase letters, digits, and underscores.
///
/// # Examples
///
/// ```ignore
/// std::env::set_var("MY_VAR", "value");
/// let result = expand_env_vars("prefix-${MY_VAR}-suffix");
/// assert_eq!(result, "prefix-value-suffix");
///
/// let result = expand_env_vars("${MISSING:-default}");
/// assert_eq!(result, "default");
/// ```
pub(crate) fn expand_env_vars(s: &str) -> String {
    let re = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
        .expect("env var pattern is valid");
    let mut last_match = 0;
    let mut result = String::with_capacity(s.len());

    for cap in re.captures_iter(s) {
        let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        result.push_str(&s[last_match..full_match.start()]);

        let value = match std::env::var(var_name.as_str()) {
            Ok(val) => val,
            Err(_) => match cap.get(2) {
                Some(default) => default.as_str().to_string(),
                None => full_match.as_str().to_string(),
            },
        };
        result.push_str(&value);

        last_match = full_match.end();
    }

    result.push_str(&s[last_match..]);

    result
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    pub apm: ApmConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        ConfigLoader::load(path)
    }

    /// Validate the configuration
    ///
    /// APM credentials are checked separately when the
    /// [`Application`](crate::transaction::Application) is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.address.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Server address cannot be empty".into(),
            ));
        }

        match self.telemetry.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level '{}': must be 'trace', 'debug', 'info', 'warn', or 'error'",
                    other
                )))
            }
        }

        if self.telemetry.otel_enabled && self.telemetry.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "Service name cannot be empty when OpenTelemetry export is enabled".into(),
            ));
        }

        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_address")]
    pub address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_server_address(),
        }
    }
}

fn default_server_address() -> String {
    "0.0.0.0:8080".to_string()
}

/// APM application configuration
///
/// # Example
///
/// ```yaml
/// apm:
///   app_name: "${APM_APP_NAME:-orders-api}"
///   license_key: "${APM_LICENSE_KEY}"
///   enabled: true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApmConfig {
    /// Application name; up to three names separated by `;`
    pub app_name: String,

    /// 40-character license key. Only checked when `enabled`.
    #[serde(default)]
    pub license_key: String,

    /// When false, requests pass through untraced. Default: true
    #[serde(default = "default_apm_enabled")]
    pub enabled: bool,
}

fn default_apm_enabled() -> bool {
    true
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging and span export configuration.
///
/// # Example
///
/// ```yaml
/// telemetry:
///   service_name: "orders-api"
///   log_level: "info"
///   log_format: "json"
///   otel_enabled: false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Service name attached to exported spans. Default: "apm-segments"
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Fallback level when RUST_LOG is not set. Default: "info"
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Default: text
    #[serde(default)]
    pub log_format: LogFormat,

    /// Export spans through OpenTelemetry (requires the `otel` feature)
    #[serde(default)]
    pub otel_enabled: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: default_service_name(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            otel_enabled: false,
        }
    }
}

fn default_service_name() -> String {
    "apm-segments".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
