//! Unwrapping adapters
//!
//! `Retrying` hides the executor behind an ordinary `Result`-returning call:
//! the value on success, the last attempt's error unchanged on failure.

use std::future::Future;

use crate::types::RetryPolicy;

use super::classify::DefaultClassifier;
use super::executor::RetryExecutor;
use super::observer::{NoOpObserver, RetryObserver};
use super::predicates::RetryPredicate;

/// Wrap an async function with a fixed policy, the default classifier and jitter
///
/// # Example
///
/// ```rust,no_run
/// use keystone_retry::retry::retry_fn;
/// use keystone_retry::types::RetryPolicy;
///
/// async fn subscribe(email: String) -> Result<(), std::io::Error> {
///     Ok(())
/// }
///
/// async fn example() -> Result<(), std::io::Error> {
///     let subscribe = retry_fn(RetryPolicy::new(2), subscribe);
///     subscribe.call_with("buyer@example.com".to_string()).await
/// }
/// ```
pub fn retry_fn<F>(policy: RetryPolicy, func: F) -> Retrying<F> {
    RetryExecutor::new(policy).wrap(func)
}

/// A function bound to a retry executor
pub struct Retrying<F, P = DefaultClassifier, O = NoOpObserver> {
    executor: RetryExecutor<P, O>,
    func: F,
}

impl<F, P, O> Retrying<F, P, O> {
    /// Bind `func` to `executor`
    pub fn new(executor: RetryExecutor<P, O>, func: F) -> Self {
        Self { executor, func }
    }

    /// The executor every call runs through
    pub fn executor(&self) -> &RetryExecutor<P, O> {
        &self.executor
    }

    /// Call a zero-argument function with retries
    pub async fn call<Fut, T, E>(&self) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: RetryPredicate<E>,
        O: RetryObserver<E>,
    {
        let outcome = self.executor.execute(|| (self.func)()).await;
        if !outcome.succeeded() {
            tracing::debug!(
                attempts = outcome.attempts_used(),
                termination = %outcome.termination(),
                "retried call failed"
            );
        }
        outcome.into_result()
    }

    /// Call a single-argument function with retries, cloning `arg` per attempt
    pub async fn call_with<A, Fut, T, E>(&self, arg: A) -> Result<T, E>
    where
        F: Fn(A) -> Fut,
        A: Clone,
        Fut: Future<Output = Result<T, E>>,
        P: RetryPredicate<E>,
        O: RetryObserver<E>,
    {
        let outcome = self.executor.execute(|| (self.func)(arg.clone())).await;
        if !outcome.succeeded() {
            tracing::debug!(
                attempts = outcome.attempts_used(),
                termination = %outcome.termination(),
                "retried call failed"
            );
        }
        outcome.into_result()
    }
}
