//! Configuration loader with environment variable expansion

use super::{expand_env_vars, Config, ConfigError};
use std::path::Path;
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "read configuration file");
        Self::parse(&content)
    }

    /// Parse configuration from YAML text
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        let expanded = expand_env_vars(content);
        let config: Config = serde_yaml::from_str(&expanded)?;
        config.validate()?;
        Ok(config)
    }
}
