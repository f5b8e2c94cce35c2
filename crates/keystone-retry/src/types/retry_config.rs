//! Retry policy configuration types
//!
//! These types are deserialized from `retry.yaml` and control how many times
//! an operation is attempted and how long the executor waits between attempts.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Operation name for general backend API calls
pub const OPERATION_API: &str = "api";

/// Operation name for the messaging widget's polling requests
pub const OPERATION_MESSAGING_POLL: &str = "messaging-poll";

/// Operation name for newsletter subscription requests
pub const OPERATION_NEWSLETTER: &str = "newsletter";

/// Retry policy configurations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPoliciesConfig {
    /// Policy used for operations without a dedicated entry
    #[serde(default)]
    pub default: RetryPolicy,

    /// Per-operation retry policies
    #[serde(default)]
    pub operations: HashMap<String, RetryPolicy>,
}

impl Default for RetryPoliciesConfig {
    fn default() -> Self {
        let mut operations = HashMap::new();

        operations.insert(OPERATION_API.to_string(), RetryPolicy::default());

        // Polling runs on a short cycle, so keep the backoff tight
        operations.insert(
            OPERATION_MESSAGING_POLL.to_string(),
            RetryPolicy {
                max_attempts: 5,
                base_delay_ms: 500,
                max_delay_ms: 5000,
                backoff_factor: 2.0,
            },
        );

        operations.insert(
            OPERATION_NEWSLETTER.to_string(),
            RetryPolicy {
                max_attempts: 2,
                ..RetryPolicy::default()
            },
        );

        Self {
            default: RetryPolicy::default(),
            operations,
        }
    }
}

impl RetryPoliciesConfig {
    /// Get the policy for an operation, falling back to the default policy
    pub fn policy_for(&self, operation: &str) -> &RetryPolicy {
        self.operations.get(operation).unwrap_or(&self.default)
    }

    /// Validate the default policy and every operation policy
    pub fn validate(&self) -> Result<()> {
        self.default.validate_named("default")?;
        for (name, policy) in &self.operations {
            policy.validate_named(name)?;
        }
        Ok(())
    }
}

/// Retry policy for an operation
///
/// `max_attempts` counts every execution, so a value of 1 means the
/// operation runs once and is never retried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry in milliseconds
    #[serde(default = "default_base_delay")]
    pub base_delay_ms: u64,

    /// Upper bound on any single delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Multiplier applied per additional attempt
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay(),
            max_delay_ms: default_max_delay(),
            backoff_factor: default_backoff_factor(),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given attempt budget and default timings
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Set the delay before the first retry
    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Set the delay ceiling
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    /// Set the backoff multiplier
    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        self.backoff_factor = backoff_factor;
        self
    }

    /// Delay before the first retry
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Upper bound on any single delay
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Check the policy constraints
    ///
    /// A ceiling below the base delay is accepted; every delay is then
    /// clamped to the ceiling.
    pub fn validate(&self) -> Result<()> {
        self.validate_named("policy")
    }

    pub(crate) fn validate_named(&self, name: &str) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(Error::invalid_policy(
                name,
                "max-attempts must be at least 1",
            ));
        }

        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(Error::invalid_policy(
                name,
                format!(
                    "backoff-factor must be a finite number >= 1, got {}",
                    self.backoff_factor
                ),
            ));
        }

        if self.max_delay_ms < self.base_delay_ms {
            tracing::warn!(
                policy = name,
                base_delay_ms = self.base_delay_ms,
                max_delay_ms = self.max_delay_ms,
                "max-delay-ms is below base-delay-ms, every delay will be clamped"
            );
        }

        Ok(())
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    10000
}
fn default_backoff_factor() -> f64 {
    2.0
}
