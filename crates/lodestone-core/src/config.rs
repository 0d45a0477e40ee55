use crate::error::{LodestoneError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered client configuration.
///
/// Values resolve with the precedence Default < File < Environment < CLI.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, without a trailing slash
    pub api_base: ConfigValue<String>,
    /// Bearer API key
    pub api_key: ConfigValue<Option<String>>,
    /// Handle of the default workspace
    pub space: ConfigValue<Option<String>>,
    /// Request timeout in seconds
    pub timeout_secs: ConfigValue<u64>,
}

impl ClientConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            api_base: ConfigValue::new(
                "https://api.lodestone.run/api/v1".to_string(),
                ConfigSource::Default,
            ),
            api_key: ConfigValue::new(None, ConfigSource::Default),
            space: ConfigValue::new(None, ConfigSource::Default),
            timeout_secs: ConfigValue::new(30, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| LodestoneError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| LodestoneError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        // Update values from file
        if let Some(api_base) = file_config.api_base {
            self.api_base.update(api_base, ConfigSource::File);
        }

        if let Some(api_key) = file_config.api_key {
            self.api_key.update(Some(api_key), ConfigSource::File);
        }

        if let Some(space) = file_config.space {
            self.space.update(Some(space), ConfigSource::File);
        }

        if let Some(timeout_secs) = file_config.timeout_secs {
            self.timeout_secs.update(timeout_secs, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // LODESTONE_API_BASE
        if let Ok(api_base) = env::var("LODESTONE_API_BASE") {
            self.api_base.update(api_base, ConfigSource::Environment);
        }

        // LODESTONE_API_KEY
        if let Ok(api_key) = env::var("LODESTONE_API_KEY") {
            self.api_key.update(Some(api_key), ConfigSource::Environment);
        }

        // LODESTONE_SPACE
        if let Ok(space) = env::var("LODESTONE_SPACE") {
            self.space.update(Some(space), ConfigSource::Environment);
        }

        // LODESTONE_TIMEOUT_SECS
        if let Ok(timeout_str) = env::var("LODESTONE_TIMEOUT_SECS") {
            match timeout_str.parse::<u64>() {
                Ok(timeout) => self.timeout_secs.update(timeout, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid LODESTONE_TIMEOUT_SECS value '{}': expected integer seconds",
                    timeout_str
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(api_base) = overrides.api_base {
            self.api_base.update(api_base, ConfigSource::Cli);
        }

        if let Some(api_key) = overrides.api_key {
            self.api_key.update(Some(api_key), ConfigSource::Cli);
        }

        if let Some(space) = overrides.space {
            self.space.update(Some(space), ConfigSource::Cli);
        }

        if let Some(timeout_secs) = overrides.timeout_secs {
            self.timeout_secs.update(timeout_secs, ConfigSource::Cli);
        }
    }

    /// The API key, or a configuration error naming the missing key
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .value
            .as_deref()
            .ok_or_else(|| LodestoneError::ConfigMissing {
                key: "api_key".to_string(),
            })
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert(
            "api_base".to_string(),
            (self.api_base.value.clone(), self.api_base.source),
        );

        map.insert(
            "api_key".to_string(),
            (
                self.api_key
                    .value
                    .as_ref()
                    .map(|_| "(set)".to_string())
                    .unwrap_or_else(|| "(unset)".to_string()),
                self.api_key.source,
            ),
        );

        map.insert(
            "space".to_string(),
            (
                self.space.value.clone().unwrap_or_else(|| "(default)".to_string()),
                self.space.source,
            ),
        );

        map.insert(
            "timeout_secs".to_string(),
            (self.timeout_secs.value.to_string(), self.timeout_secs.source),
        );

        map
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    api_base: Option<String>,
    api_key: Option<String>,
    space: Option<String>,
    timeout_secs: Option<u64>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub api_base: Option<String>,
    pub api_key: Option<String>,
    pub space: Option<String>,
    pub timeout_secs: Option<u64>,
}
