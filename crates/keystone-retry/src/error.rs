//! Error types for keystone-retry
//!
//! These cover configuration loading and policy validation. Failures of the
//! operations being retried are never converted into this type; they are
//! carried unchanged inside [`crate::RetryOutcome`].

use thiserror::Error;

/// Result type alias using keystone-retry's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration and validation errors
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Invalid configuration value or format
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A retry policy violates its constraints
    #[error("Invalid retry policy '{name}': {message}")]
    InvalidPolicy { name: String, message: String },

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create an invalid config error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an invalid policy error
    pub fn invalid_policy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPolicy {
            name: name.into(),
            message: message.into(),
        }
    }
}
