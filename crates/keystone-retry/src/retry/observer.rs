//! Retry observation and logging
//!
//! This module provides the `RetryObserver` trait for monitoring retry attempts
//! and a `TracingObserver` implementation that logs using the `tracing` crate.
//!
//! Observers are advisory. Their return values are ignored and a panic inside
//! an observer is not caught: it unwinds through the executor and ends that
//! retry sequence. Executors share no state, so other sequences are unaffected.

use std::fmt::Display;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Observer trait for retry attempt events
///
/// # Example
///
/// ```rust
/// use keystone_retry::retry::RetryObserver;
/// use std::time::Duration;
///
/// struct MetricsObserver;
///
/// impl<E: ?Sized> RetryObserver<E> for MetricsObserver {
///     fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {}
///     fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {}
///     fn on_success(&self, attempt: u32, elapsed: Duration) {}
///     fn on_exhausted(&self, attempts: u32, error: &E) {}
/// }
/// ```
pub trait RetryObserver<E: ?Sized>: Send + Sync {
    /// Called when an attempt is about to start
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1-indexed)
    /// * `max_attempts` - The maximum number of attempts configured
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32);

    /// Called after a retryable failure, before the executor sleeps
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number that failed (1-indexed)
    /// * `error` - The error that caused the failure
    /// * `delay` - The delay before the next attempt
    fn on_retry(&self, attempt: u32, error: &E, delay: Duration);

    /// Called when the operation succeeds
    fn on_success(&self, attempt: u32, elapsed: Duration);

    /// Called when the final permitted attempt fails
    fn on_exhausted(&self, attempts: u32, error: &E);

    /// Called when the retry predicate declines to retry a failure
    fn on_rejected(&self, attempt: u32, error: &E) {
        let _ = (attempt, error);
    }

    /// Called when the caller cancels the sequence during backoff
    fn on_cancelled(&self, attempts: u32, error: &E) {
        let _ = (attempts, error);
    }
}

/// A no-op observer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl<E: ?Sized> RetryObserver<E> for NoOpObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_retry(&self, _attempt: u32, _error: &E, _delay: Duration) {}

    fn on_success(&self, _attempt: u32, _elapsed: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _error: &E) {}
}

/// An observer that logs retry events using the `tracing` crate
///
/// # Log Levels
///
/// - `on_attempt_start`: DEBUG
/// - `on_retry`: WARN
/// - `on_success`: INFO (if > 1 attempt) or DEBUG (first attempt)
/// - `on_exhausted`: ERROR
/// - `on_rejected`: WARN
/// - `on_cancelled`: INFO
#[derive(Debug, Clone)]
pub struct TracingObserver {
    /// Name of the operation being retried (for log context)
    operation: String,
}

impl TracingObserver {
    /// Create a new tracing observer
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    /// Get the operation name
    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl<E: Display + ?Sized> RetryObserver<E> for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        tracing::debug!(
            operation = %self.operation,
            attempt = attempt,
            max_attempts = max_attempts,
            "starting attempt"
        );
    }

    fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "attempt failed, will retry"
        );
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        if attempt > 1 {
            tracing::info!(
                operation = %self.operation,
                attempt = attempt,
                total_duration_ms = elapsed.as_millis() as u64,
                "succeeded after retry"
            );
        } else {
            tracing::debug!(
                operation = %self.operation,
                duration_ms = elapsed.as_millis() as u64,
                "succeeded on first attempt"
            );
        }
    }

    fn on_exhausted(&self, attempts: u32, error: &E) {
        tracing::error!(
            operation = %self.operation,
            attempts = attempts,
            error = %error,
            "all retry attempts exhausted"
        );
    }

    fn on_rejected(&self, attempt: u32, error: &E) {
        tracing::warn!(
            operation = %self.operation,
            attempt = attempt,
            error = %error,
            "not retrying non-retryable error"
        );
    }

    fn on_cancelled(&self, attempts: u32, error: &E) {
        tracing::info!(
            operation = %self.operation,
            attempts = attempts,
            error = %error,
            "retry cancelled by caller"
        );
    }
}

/// An observer that collects statistics about retry attempts
///
/// Counters are per instance. Useful for testing and metrics collection.
#[derive(Debug, Default)]
pub struct StatsObserver {
    attempt_starts: AtomicU32,
    retries: AtomicU32,
    successes: AtomicU32,
    exhaustions: AtomicU32,
    rejections: AtomicU32,
    cancellations: AtomicU32,
    delays: Mutex<Vec<Duration>>,
}

impl StatsObserver {
    /// Create a new stats observer
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of attempt starts
    pub fn attempt_starts(&self) -> u32 {
        self.attempt_starts.load(Ordering::SeqCst)
    }

    /// Get the number of retried failures
    pub fn retries(&self) -> u32 {
        self.retries.load(Ordering::SeqCst)
    }

    /// Get the number of successes
    pub fn successes(&self) -> u32 {
        self.successes.load(Ordering::SeqCst)
    }

    /// Get the number of exhaustions
    pub fn exhaustions(&self) -> u32 {
        self.exhaustions.load(Ordering::SeqCst)
    }

    /// Get the number of predicate rejections
    pub fn rejections(&self) -> u32 {
        self.rejections.load(Ordering::SeqCst)
    }

    /// Get the number of cancellations
    pub fn cancellations(&self) -> u32 {
        self.cancellations.load(Ordering::SeqCst)
    }

    /// Delays reported by `on_retry`, in order
    pub fn delays(&self) -> Vec<Duration> {
        self.delays
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<E: ?Sized> RetryObserver<E> for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        self.attempt_starts.fetch_add(1, Ordering::SeqCst);
    }

    fn on_retry(&self, _attempt: u32, _error: &E, delay: Duration) {
        self.retries.fetch_add(1, Ordering::SeqCst);
        self.delays
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(delay);
    }

    fn on_success(&self, _attempt: u32, _elapsed: Duration) {
        self.successes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_exhausted(&self, _attempts: u32, _error: &E) {
        self.exhaustions.fetch_add(1, Ordering::SeqCst);
    }

    fn on_rejected(&self, _attempt: u32, _error: &E) {
        self.rejections.fetch_add(1, Ordering::SeqCst);
    }

    fn on_cancelled(&self, _attempts: u32, _error: &E) {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
    }
}

/// Adapts a plain `on_retry` callback into an observer
///
/// Only retry events reach the callback; all other events are ignored.
pub struct OnRetry<F> {
    callback: F,
}

impl<F> OnRetry<F> {
    /// Wrap a callback taking `(attempt, error, delay)`
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<E, F> RetryObserver<E> for OnRetry<F>
where
    E: ?Sized,
    F: Fn(u32, &E, Duration) + Send + Sync,
{
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {}

    fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {
        (self.callback)(attempt, error, delay)
    }

    fn on_success(&self, _attempt: u32, _elapsed: Duration) {}

    fn on_exhausted(&self, _attempts: u32, _error: &E) {}
}

/// Fan every event out to two observers, first then second
impl<E, A, B> RetryObserver<E> for (A, B)
where
    E: ?Sized,
    A: RetryObserver<E>,
    B: RetryObserver<E>,
{
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        self.0.on_attempt_start(attempt, max_attempts);
        self.1.on_attempt_start(attempt, max_attempts);
    }

    fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {
        self.0.on_retry(attempt, error, delay);
        self.1.on_retry(attempt, error, delay);
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        self.0.on_success(attempt, elapsed);
        self.1.on_success(attempt, elapsed);
    }

    fn on_exhausted(&self, attempts: u32, error: &E) {
        self.0.on_exhausted(attempts, error);
        self.1.on_exhausted(attempts, error);
    }

    fn on_rejected(&self, attempt: u32, error: &E) {
        self.0.on_rejected(attempt, error);
        self.1.on_rejected(attempt, error);
    }

    fn on_cancelled(&self, attempts: u32, error: &E) {
        self.0.on_cancelled(attempts, error);
        self.1.on_cancelled(attempts, error);
    }
}

impl<E: ?Sized, T: RetryObserver<E> + ?Sized> RetryObserver<E> for Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {
        (**self).on_retry(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        (**self).on_success(attempt, elapsed)
    }

    fn on_exhausted(&self, attempts: u32, error: &E) {
        (**self).on_exhausted(attempts, error)
    }

    fn on_rejected(&self, attempt: u32, error: &E) {
        (**self).on_rejected(attempt, error)
    }

    fn on_cancelled(&self, attempts: u32, error: &E) {
        (**self).on_cancelled(attempts, error)
    }
}

impl<E: ?Sized, T: RetryObserver<E> + ?Sized> RetryObserver<E> for Box<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_retry(&self, attempt: u32, error: &E, delay: Duration) {
        (**self).on_retry(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        (**self).on_success(attempt, elapsed)
    }

    fn on_exhausted(&self, attempts: u32, error: &E) {
        (**self).on_exhausted(attempts, error)
    }

    fn on_rejected(&self, attempt: u32, error: &E) {
        (**self).on_rejected(attempt, error)
    }

    fn on_cancelled(&self, attempts: u32, error: &E) {
        (**self).on_cancelled(attempts, error)
    }
}
