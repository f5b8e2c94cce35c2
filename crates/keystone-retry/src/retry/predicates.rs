//! Retry predicates
//!
//! A predicate decides, from a failure and the attempt that produced it,
//! whether the executor should try again. Predicates are consulted once per
//! failure and only while attempts remain.

use super::classify::{Classify, FailureKind};
use std::fmt::Display;

/// A predicate that determines whether an error should be retried
///
/// # Example
///
/// ```rust
/// use keystone_retry::retry::RetryPredicate;
/// use std::io::{Error, ErrorKind};
///
/// struct IoRetryPredicate;
///
/// impl RetryPredicate<Error> for IoRetryPredicate {
///     fn should_retry(&self, error: &Error, _attempt: u32) -> bool {
///         !matches!(
///             error.kind(),
///             ErrorKind::NotFound | ErrorKind::PermissionDenied | ErrorKind::InvalidInput
///         )
///     }
/// }
/// ```
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    /// Determine whether the failure of `attempt` (1-indexed) should be retried
    fn should_retry(&self, error: &E, attempt: u32) -> bool;
}

/// A predicate that always returns true (all errors are retryable)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E, _attempt: u32) -> bool {
        true
    }
}

/// A predicate that never retries (no errors are retryable)
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverRetry;

impl<E: ?Sized> RetryPredicate<E> for NeverRetry {
    fn should_retry(&self, _error: &E, _attempt: u32) -> bool {
        false
    }
}

/// A predicate that uses a closure to determine retryability
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    /// Create a new closure-based predicate
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    E: ?Sized,
    F: Fn(&E, u32) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E, attempt: u32) -> bool {
        (self.predicate)(error, attempt)
    }
}

/// A predicate over classified HTTP failures with an explicit status list
///
/// Transport failures and errors without status information are always
/// retried. Statuses are retried when listed, or when they are 5xx and
/// server errors are enabled.
#[derive(Debug, Clone)]
pub struct HttpStatusPredicate {
    /// Status codes that should be retried
    retryable_codes: Vec<u16>,
    /// Whether every status >= 500 is retried
    retry_server_errors: bool,
}

impl HttpStatusPredicate {
    /// Retry 5xx, 408 and 429; equivalent to `DefaultClassifier`
    pub fn default_http() -> Self {
        Self {
            retryable_codes: vec![408, 429],
            retry_server_errors: true,
        }
    }

    /// Retry 5xx and never any 4xx, 408 and 429 included
    ///
    /// This is the older "no client error retries" rule. It differs from the
    /// default classifier on 408 and 429 and must be chosen explicitly.
    pub fn strict() -> Self {
        Self {
            retryable_codes: Vec::new(),
            retry_server_errors: true,
        }
    }

    /// Retry exactly the given status codes
    pub fn with_codes(codes: Vec<u16>) -> Self {
        Self {
            retryable_codes: codes,
            retry_server_errors: false,
        }
    }

    /// Check if a status code is retryable
    pub fn is_retryable_code(&self, code: u16) -> bool {
        (self.retry_server_errors && code >= 500) || self.retryable_codes.contains(&code)
    }
}

impl<E: Classify + ?Sized> RetryPredicate<E> for HttpStatusPredicate {
    fn should_retry(&self, error: &E, _attempt: u32) -> bool {
        match error.failure_kind() {
            FailureKind::HttpStatus(code) => self.is_retryable_code(code),
            FailureKind::Transport | FailureKind::Unknown => true,
        }
    }
}

/// A predicate that retries only on specific error messages
#[derive(Debug, Clone)]
pub struct MessagePredicate {
    /// Lowercased patterns that indicate retryable errors
    retryable_patterns: Vec<String>,
}

impl MessagePredicate {
    /// Create a new message predicate with the given patterns
    pub fn new(patterns: Vec<String>) -> Self {
        Self {
            retryable_patterns: patterns.into_iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Create a predicate for common network errors
    pub fn network_errors() -> Self {
        Self::new(vec![
            "timeout".to_string(),
            "timed out".to_string(),
            "connection reset".to_string(),
            "connection refused".to_string(),
            "network unreachable".to_string(),
            "temporary failure".to_string(),
        ])
    }
}

impl<E: Display + ?Sized> RetryPredicate<E> for MessagePredicate {
    fn should_retry(&self, error: &E, _attempt: u32) -> bool {
        let error_msg = error.to_string().to_lowercase();
        self.retryable_patterns
            .iter()
            .any(|pattern| error_msg.contains(pattern.as_str()))
    }
}
