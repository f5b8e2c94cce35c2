//! Retry execution engine
//!
//! This module provides the core retry execution logic with configurable
//! policies, predicates, and observers.

use std::future::Future;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::types::RetryPolicy;

use super::adapters::Retrying;
use super::backoff::calculate_delay;
use super::classify::{Classify, DefaultClassifier};
use super::observer::{NoOpObserver, RetryObserver};
use super::outcome::{RetryOutcome, Termination};
use super::predicates::RetryPredicate;

/// Execute an async operation with the default classifier and no observer
///
/// This is a convenience function for simple retry scenarios. For more
/// control, use `RetryExecutorBuilder`.
///
/// # Example
///
/// ```rust,no_run
/// use keystone_retry::retry::retry_with_policy;
/// use keystone_retry::types::RetryPolicy;
///
/// async fn example() {
///     let policy = RetryPolicy::default();
///
///     let outcome = retry_with_policy(&policy, || async {
///         Ok::<_, std::io::Error>("saved properties")
///     })
///     .await;
///
///     assert!(outcome.succeeded());
/// }
/// ```
pub async fn retry_with_policy<F, Fut, T, E>(policy: &RetryPolicy, op: F) -> RetryOutcome<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify,
{
    RetryExecutor::new(policy.clone()).execute(op).await
}

/// Builder for configuring a `RetryExecutor`
///
/// # Example
///
/// ```rust
/// use keystone_retry::retry::{RetryExecutorBuilder, TracingObserver};
/// use keystone_retry::types::RetryPolicy;
///
/// let executor = RetryExecutorBuilder::new()
///     .with_policy(RetryPolicy::default())
///     .with_observer(TracingObserver::new("newsletter"))
///     .with_jitter(true)
///     .build();
/// ```
pub struct RetryExecutorBuilder<P = DefaultClassifier, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    jitter: bool,
}

impl Default for RetryExecutorBuilder<DefaultClassifier, NoOpObserver> {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryExecutorBuilder<DefaultClassifier, NoOpObserver> {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self {
            policy: RetryPolicy::default(),
            predicate: DefaultClassifier,
            observer: NoOpObserver,
            jitter: true,
        }
    }
}

impl<P, O> RetryExecutorBuilder<P, O> {
    /// Set the retry policy
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the retry predicate
    ///
    /// The predicate determines whether an error should be retried.
    pub fn with_predicate<P2>(self, predicate: P2) -> RetryExecutorBuilder<P2, O> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate,
            observer: self.observer,
            jitter: self.jitter,
        }
    }

    /// Set the observer
    ///
    /// The observer receives callbacks during retry execution.
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutorBuilder<P, O2> {
        RetryExecutorBuilder {
            policy: self.policy,
            predicate: self.predicate,
            observer,
            jitter: self.jitter,
        }
    }

    /// Enable or disable jitter
    ///
    /// Jitter adds up to 10% to each delay so independent clients do not
    /// retry in lockstep. Enabled by default.
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Build the executor
    pub fn build(self) -> RetryExecutor<P, O> {
        RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer: self.observer,
            jitter: self.jitter,
        }
    }
}

/// A retry executor with configurable policy, predicate, and observer
///
/// An executor holds no per-invocation state, so one instance can drive any
/// number of concurrent `execute` calls independently.
#[derive(Debug, Clone)]
pub struct RetryExecutor<P = DefaultClassifier, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    jitter: bool,
}

impl RetryExecutor<DefaultClassifier, NoOpObserver> {
    /// Create an executor with the default classifier, no observer and jitter on
    pub fn new(policy: RetryPolicy) -> Self {
        RetryExecutorBuilder::new().with_policy(policy).build()
    }
}

impl<P, O> RetryExecutor<P, O> {
    /// The policy this executor applies
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Whether delays receive random jitter
    pub fn jitter_enabled(&self) -> bool {
        self.jitter
    }

    /// Wrap a function so every call runs through this executor
    pub fn wrap<F>(self, func: F) -> Retrying<F, P, O> {
        Retrying::new(self, func)
    }

    /// Execute an operation with retry logic
    ///
    /// Never fails: exhaustion and predicate rejection are reported through
    /// the returned `RetryOutcome`.
    pub async fn execute<F, Fut, T, E>(&self, op: F) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: RetryPredicate<E>,
        O: RetryObserver<E>,
    {
        self.run(op, None).await
    }

    /// Execute an operation, abandoning the backoff sleep when `cancel` fires
    ///
    /// The first attempt always runs and an in-flight attempt is never
    /// interrupted. If the token fires while the executor is waiting to
    /// retry, the outcome is `Termination::Cancelled` carrying the last error.
    pub async fn execute_with_cancel<F, Fut, T, E>(
        &self,
        op: F,
        cancel: &CancellationToken,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: RetryPredicate<E>,
        O: RetryObserver<E>,
    {
        self.run(op, Some(cancel)).await
    }

    async fn run<F, Fut, T, E>(
        &self,
        mut op: F,
        cancel: Option<&CancellationToken>,
    ) -> RetryOutcome<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: RetryPredicate<E>,
        O: RetryObserver<E>,
    {
        let start = Instant::now();

        // An unvalidated zero budget still runs the operation once
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            <O as RetryObserver<E>>::on_attempt_start(&self.observer, attempt, max_attempts);

            let error = match op().await {
                Ok(value) => {
                    <O as RetryObserver<E>>::on_success(&self.observer, attempt, start.elapsed());
                    return RetryOutcome::success(value, attempt, start.elapsed());
                }
                Err(error) => error,
            };

            if attempt >= max_attempts {
                self.observer.on_exhausted(attempt, &error);
                return RetryOutcome::failure(
                    error,
                    Termination::Exhausted,
                    attempt,
                    start.elapsed(),
                );
            }

            if !self.predicate.should_retry(&error, attempt) {
                self.observer.on_rejected(attempt, &error);
                return RetryOutcome::failure(
                    error,
                    Termination::Rejected,
                    attempt,
                    start.elapsed(),
                );
            }

            let delay = calculate_delay(&self.policy, attempt, self.jitter);
            self.observer.on_retry(attempt, &error, delay);

            tracing::trace!(
                attempt = attempt,
                max_attempts = max_attempts,
                delay_ms = delay.as_millis() as u64,
                "backing off before next attempt"
            );

            match cancel {
                Some(token) => {
                    let cancelled = tokio::select! {
                        biased;
                        () = token.cancelled() => true,
                        () = tokio::time::sleep(delay) => false,
                    };

                    if cancelled {
                        self.observer.on_cancelled(attempt, &error);
                        return RetryOutcome::failure(
                            error,
                            Termination::Cancelled,
                            attempt,
                            start.elapsed(),
                        );
                    }
                }
                None => {
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }

            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::observer::StatsObserver;
    use crate::retry::predicates::{AlwaysRetry, ClosurePredicate};
    use std::io;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn test_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 10,
            max_delay_ms: 100,
            backoff_factor: 2.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_success() {
        let observer = Arc::new(StatsObserver::new());

        let outcome: RetryOutcome<&str, io::Error> = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_observer(observer.clone())
            .build()
            .execute(|| async { Ok("success") })
            .await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.attempts_used(), 1);
        assert_eq!(outcome.elapsed(), Duration::ZERO);
        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.successes(), 1);
        assert_eq!(observer.retries(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_retry() {
        let observer = Arc::new(StatsObserver::new());
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let outcome: RetryOutcome<&str, io::Error> = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_observer(observer.clone())
            .with_jitter(false)
            .build()
            .execute(|| {
                let attempts = attempts_clone.clone();
                async move {
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                    if attempt < 2 {
                        Err(io::Error::new(io::ErrorKind::TimedOut, "timeout"))
                    } else {
                        Ok("success")
                    }
                }
            })
            .await;

        assert_eq!(outcome.value(), Some(&"success"));
        assert_eq!(outcome.attempts_used(), 2);
        assert_eq!(observer.retries(), 1);
        assert_eq!(observer.delays(), vec![Duration::from_millis(10)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_attempts_exhausted() {
        let observer = Arc::new(StatsObserver::new());

        let outcome: RetryOutcome<(), io::Error> = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_observer(observer.clone())
            .with_jitter(false)
            .build()
            .execute(|| async { Err(io::Error::new(io::ErrorKind::TimedOut, "always fails")) })
            .await;

        assert!(outcome.is_exhausted());
        assert_eq!(outcome.attempts_used(), 3);
        assert_eq!(observer.attempt_starts(), 3);
        assert_eq!(observer.retries(), 2); // No retry is announced after the last attempt
        assert_eq!(observer.exhaustions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_error() {
        let observer = Arc::new(StatsObserver::new());

        let predicate = ClosurePredicate::new(|err: &io::Error, _attempt: u32| {
            err.kind() != io::ErrorKind::NotFound
        });

        let outcome: RetryOutcome<(), io::Error> = RetryExecutorBuilder::new()
            .with_policy(test_policy())
            .with_predicate(predicate)
            .with_observer(observer.clone())
            .build()
            .execute(|| async { Err(io::Error::new(io::ErrorKind::NotFound, "not found")) })
            .await;

        assert!(outcome.is_rejected());
        assert_eq!(outcome.attempts_used(), 1);
        assert_eq!(outcome.elapsed(), Duration::ZERO);
        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.rejections(), 1);
        assert!(observer.delays().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_with_policy_convenience() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = attempts.clone();

        let outcome = retry_with_policy(&test_policy(), || {
            let attempts = attempts_clone.clone();
            async move {
                let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 2 {
                    Err(io::Error::new(io::ErrorKind::TimedOut, "timeout"))
                } else {
                    Ok("success")
                }
            }
        })
        .await;

        assert_eq!(outcome.into_result().unwrap(), "success");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_max_attempts_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..test_policy()
        };
        let calls = AtomicU32::new(0);

        let outcome: RetryOutcome<(), io::Error> = RetryExecutorBuilder::new()
            .with_policy(policy)
            .with_predicate(AlwaysRetry)
            .build()
            .execute(|| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(io::Error::other("error")) }
            })
            .await;

        assert!(outcome.is_exhausted());
        assert_eq!(outcome.attempts_used(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_ignores_predicate() {
        let policy = RetryPolicy {
            max_attempts: 1,
            ..test_policy()
        };
        let observer = Arc::new(StatsObserver::new());

        let outcome: RetryOutcome<(), io::Error> = RetryExecutorBuilder::new()
            .with_policy(policy)
            .with_predicate(AlwaysRetry)
            .with_observer(observer.clone())
            .build()
            .execute(|| async { Err(io::Error::other("error")) })
            .await;

        assert!(outcome.is_exhausted());
        assert_eq!(outcome.attempts_used(), 1);
        assert_eq!(observer.attempt_starts(), 1);
        assert_eq!(observer.exhaustions(), 1);
        assert_eq!(observer.retries(), 0);
    }
}
