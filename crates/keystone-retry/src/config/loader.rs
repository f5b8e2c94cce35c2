//! Retry configuration loader with precedence
//!
//! Loads retry policies from multiple sources with the following precedence (low to high):
//! 1. Built-in defaults
//! 2. Config file (~/.keystone/retry.yaml)
//! 3. Environment variables (KEYSTONE_RETRY_* prefix), applied to the default policy

use crate::error::{Error, Result};
use crate::types::RetryPoliciesConfig;
use camino::{Utf8Path, Utf8PathBuf};
use std::env;
use std::fs;
use std::str::FromStr;

/// Name of the retry configuration file inside the config directory
pub const RETRY_CONFIG_FILE: &str = "retry.yaml";

/// Prefix shared by all environment overrides
pub const ENV_PREFIX: &str = "KEYSTONE_RETRY_";

/// Retry configuration loader
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Directory holding `retry.yaml`
    config_dir: Utf8PathBuf,
}

impl ConfigLoader {
    /// Create a loader rooted at the standard config directory (~/.keystone)
    pub fn new() -> Result<Self> {
        let config_dir = Self::get_config_dir()?;
        Ok(Self { config_dir })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: impl Into<Utf8PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// The directory this loader reads from
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }

    fn get_config_dir() -> Result<Utf8PathBuf> {
        // HOME first so container overrides win over the passwd entry
        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .ok()
            .map(Utf8PathBuf::from)
            .or_else(|| dirs::home_dir().and_then(|p| Utf8PathBuf::from_path_buf(p).ok()))
            .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;

        Ok(home.join(".keystone"))
    }

    /// Load retry policies with full precedence, reading the process environment
    pub fn load(&self) -> Result<RetryPoliciesConfig> {
        self.load_with_env(|key| env::var(key).ok())
    }

    /// Load retry policies, resolving overrides through `lookup`
    pub fn load_with_env<F>(&self, lookup: F) -> Result<RetryPoliciesConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = RetryPoliciesConfig::default();

        let config_path = self.config_dir.join(RETRY_CONFIG_FILE);
        if config_path.exists() {
            let file_config = Self::load_yaml_file(&config_path)?;
            config = Self::merge(config, file_config);
        } else {
            tracing::debug!(path = %config_path, "no retry config file, using defaults");
        }

        config = Self::apply_overrides(config, lookup)?;
        config.validate()?;

        Ok(config)
    }

    /// Load a specific config file on top of the built-in defaults
    ///
    /// Unlike [`ConfigLoader::load`], a missing file is an error.
    pub fn load_file(path: &Utf8Path) -> Result<RetryPoliciesConfig> {
        if !path.exists() {
            return Err(Error::config_not_found(path.as_str()));
        }

        let config = Self::merge(RetryPoliciesConfig::default(), Self::load_yaml_file(path)?);
        config.validate()?;
        Ok(config)
    }

    fn load_yaml_file(path: &Utf8Path) -> Result<RetryPoliciesConfig> {
        let content = fs::read_to_string(path)?;
        let config = serde_yaml_ng::from_str(&content)?;
        tracing::debug!(path = %path, "loaded retry config file");
        Ok(config)
    }

    /// Merge two configs (base is overridden by overlay)
    fn merge(mut base: RetryPoliciesConfig, overlay: RetryPoliciesConfig) -> RetryPoliciesConfig {
        for (key, policy) in overlay.operations {
            base.operations.insert(key, policy);
        }
        base.default = overlay.default;
        base
    }

    /// Apply environment overrides to the default policy
    fn apply_overrides<F>(mut config: RetryPoliciesConfig, lookup: F) -> Result<RetryPoliciesConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let policy = &mut config.default;
        Self::apply_override(&lookup, "MAX_ATTEMPTS", &mut policy.max_attempts)?;
        Self::apply_override(&lookup, "BASE_DELAY_MS", &mut policy.base_delay_ms)?;
        Self::apply_override(&lookup, "MAX_DELAY_MS", &mut policy.max_delay_ms)?;
        Self::apply_override(&lookup, "BACKOFF_FACTOR", &mut policy.backoff_factor)?;

        Ok(config)
    }

    /// Parse `{ENV_PREFIX}{suffix}` into `field` when the variable is set
    fn apply_override<F, T>(lookup: &F, suffix: &str, field: &mut T) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
        T: FromStr,
    {
        let key = format!("{}{}", ENV_PREFIX, suffix);
        if let Some(val) = lookup(&key) {
            *field = val
                .trim()
                .parse()
                .map_err(|_| Error::invalid_config(format!("{} must be a valid number", key)))?;
        }
        Ok(())
    }
}
