//! Configuration for motions clients
//!
//! This module provides the configuration types and TOML loading used to
//! connect a coordinator to an organization.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::common::Address;

/// Error types for configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Parsing error
    #[error("Parsing error: {0}")]
    ParseError(String),

    /// Key not found
    #[error("Configuration key not found: {0}")]
    KeyNotFound(String),

    /// Value error
    #[error("Invalid value for key {0}: {1}")]
    InvalidValue(String, String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Addresses of the organization the client talks to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Address of the organization (colony) contract
    pub colony_address: Address,
    /// Address of the organization's native token
    pub token_address: Address,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            colony_address: Address::zero(),
            token_address: Address::zero(),
        }
    }
}

/// Expected motions extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionConfig {
    /// Name the extension is registered under
    pub name: String,
    /// The only extension version this client speaks
    pub supported_version: u32,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            name: "VotingReputation".to_string(),
            supported_version: 4,
        }
    }
}

/// Main configuration for a motions client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotionsConfig {
    /// Environment (e.g., "development", "production")
    #[serde(default = "default_environment")]
    pub environment: String,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Organization addresses
    pub network: NetworkConfig,
    /// Motions extension expectations
    #[serde(default)]
    pub extension: ExtensionConfig,
    /// Additional custom configuration
    #[serde(default)]
    pub custom: HashMap<String, serde_json::Value>,
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for MotionsConfig {
    fn default() -> Self {
        Self {
            environment: default_environment(),
            log_level: default_log_level(),
            network: NetworkConfig::default(),
            extension: ExtensionConfig::default(),
            custom: HashMap::new(),
        }
    }
}

impl MotionsConfig {
    /// Load configuration from a TOML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!("Loading motions config from {}", path.display());
        let content = fs::read_to_string(path).await?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub async fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content).await?;
        Ok(())
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> ConfigResult<()> {
        if self.network.colony_address == Address::zero() {
            return Err(ConfigError::InvalidValue(
                "network.colony_address".to_string(),
                "must not be the zero address".to_string(),
            ));
        }
        if self.network.token_address == Address::zero() {
            return Err(ConfigError::InvalidValue(
                "network.token_address".to_string(),
                "must not be the zero address".to_string(),
            ));
        }
        if self.extension.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "extension.name".to_string(),
                "must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get a custom value by key
    pub fn get_custom<T: for<'de> Deserialize<'de>>(&self, key: &str) -> ConfigResult<T> {
        let value = self.custom.get(key)
            .ok_or_else(|| ConfigError::KeyNotFound(key.to_string()))?;

        serde_json::from_value(value.clone())
            .map_err(|e| ConfigError::InvalidValue(
                key.to_string(),
                format!("Failed to deserialize value: {}", e)
            ))
    }

    /// Set a custom value by key
    pub fn set_custom<T: Serialize>(&mut self, key: &str, value: T) -> ConfigResult<()> {
        let json_value = serde_json::to_value(value)
            .map_err(|e| ConfigError::InvalidValue(
                key.to_string(),
                format!("Failed to serialize value: {}", e)
            ))?;

        self.custom.insert(key.to_string(), json_value);
        Ok(())
    }
}

pub mod env;

pub use env::EnvOverrides;
