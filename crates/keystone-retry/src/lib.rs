//! # keystone-retry
//!
//! Retry execution engine for the Keystone marketplace client providing:
//! - Jittered exponential backoff with a configurable ceiling
//! - Error classification (transport failures, HTTP statuses) and retry predicates
//! - Observable retry attempts with a built-in `tracing` observer
//! - Unwrapping adapters for plain async functions and HTTP fetches
//! - Policy configuration from YAML files and environment variables

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

pub use config::ConfigLoader;
pub use error::{Error, Result};
pub use retry::{
    retry_fn, retry_with_policy, DefaultClassifier, FailureKind, RetryExecutor, RetryOutcome,
    Termination,
};
pub use types::{RetryPoliciesConfig, RetryPolicy};
