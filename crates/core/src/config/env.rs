//! Environment variable overrides for motions configuration
//!
//! Values read from `MOTIONS_`-prefixed variables replace the matching fields
//! of a base configuration.

use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use tracing::warn;

use crate::common::Address;
use super::{MotionsConfig, ConfigResult, ConfigError};

/// Environment variable prefix for motions configuration
pub const ENV_PREFIX: &str = "MOTIONS_";

/// Applies environment variables on top of a base configuration
pub struct EnvOverrides {
    /// Variables to read from; the process environment by default
    vars: HashMap<String, String>,
}

impl EnvOverrides {
    /// Read overrides from the process environment
    pub fn from_process() -> Self {
        Self {
            vars: env::vars().filter(|(k, _)| k.starts_with(ENV_PREFIX)).collect(),
        }
    }

    /// Read overrides from an explicit set of variables
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    fn lookup(&self, key: &str) -> Option<&str> {
        self.vars.get(&format!("{}{}", ENV_PREFIX, key)).map(String::as_str)
    }

    fn parse_address(&self, key: &str) -> ConfigResult<Option<Address>> {
        match self.lookup(key) {
            Some(value) => Address::parse(value)
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue(format!("{}{}", ENV_PREFIX, key), e.to_string())),
            None => Ok(None),
        }
    }

    fn parse_env<T: FromStr>(&self, key: &str, default: T) -> T
    where
        T::Err: std::fmt::Display,
    {
        match self.lookup(key) {
            Some(value) => match value.parse::<T>() {
                Ok(parsed) => parsed,
                Err(e) => {
                    warn!("Failed to parse env variable {}{}: {}", ENV_PREFIX, key, e);
                    default
                }
            },
            None => default,
        }
    }

    /// Apply the overrides to `base`
    ///
    /// Malformed addresses are an error; other malformed values keep the base
    /// value and log a warning.
    pub fn apply(&self, mut base: MotionsConfig) -> ConfigResult<MotionsConfig> {
        if let Some(colony) = self.parse_address("COLONY_ADDRESS")? {
            base.network.colony_address = colony;
        }
        if let Some(token) = self.parse_address("TOKEN_ADDRESS")? {
            base.network.token_address = token;
        }
        if let Some(name) = self.lookup("EXTENSION_NAME") {
            base.extension.name = name.to_string();
        }
        base.extension.supported_version =
            self.parse_env("EXTENSION_VERSION", base.extension.supported_version);
        if let Some(level) = self.lookup("LOG_LEVEL") {
            base.log_level = level.to_string();
        }
        if let Some(environment) = self.lookup("ENVIRONMENT") {
            base.environment = environment.to_string();
        }
        Ok(base)
    }
}
