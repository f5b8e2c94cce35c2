//! Terminal result of a retry sequence
//!
//! A `RetryOutcome` is produced once per executor invocation. Exhaustion and
//! predicate rejection are ordinary outcomes rather than errors; the error
//! from the last attempt is kept exactly as the operation returned it.

use std::fmt;
use std::time::Duration;

/// Why a retry sequence stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    /// An attempt returned successfully
    Succeeded,

    /// The final permitted attempt failed
    Exhausted,

    /// The retry predicate declined to retry a failure
    Rejected,

    /// The caller's cancellation token fired between attempts
    Cancelled,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Termination::Succeeded => "succeeded",
            Termination::Exhausted => "exhausted",
            Termination::Rejected => "rejected",
            Termination::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// The result of running an operation through a `RetryExecutor`
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    result: Result<T, E>,
    termination: Termination,
    attempts_used: u32,
    elapsed: Duration,
}

impl<T, E> RetryOutcome<T, E> {
    pub(crate) fn success(value: T, attempts_used: u32, elapsed: Duration) -> Self {
        Self {
            result: Ok(value),
            termination: Termination::Succeeded,
            attempts_used,
            elapsed,
        }
    }

    pub(crate) fn failure(
        error: E,
        termination: Termination,
        attempts_used: u32,
        elapsed: Duration,
    ) -> Self {
        debug_assert!(termination != Termination::Succeeded);
        Self {
            result: Err(error),
            termination,
            attempts_used,
            elapsed,
        }
    }

    /// Whether an attempt succeeded
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }

    /// The successful value, if any
    pub fn value(&self) -> Option<&T> {
        self.result.as_ref().ok()
    }

    /// The error from the last attempt, if the sequence failed
    pub fn error(&self) -> Option<&E> {
        self.result.as_ref().err()
    }

    /// Number of attempts actually performed
    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    /// Why the sequence stopped
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Time spent across all attempts and delays
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Check if all permitted attempts failed
    pub fn is_exhausted(&self) -> bool {
        self.termination == Termination::Exhausted
    }

    /// Check if the predicate stopped the sequence
    pub fn is_rejected(&self) -> bool {
        self.termination == Termination::Rejected
    }

    /// Check if the sequence was cancelled
    pub fn is_cancelled(&self) -> bool {
        self.termination == Termination::Cancelled
    }

    /// Convert into a plain result, discarding the bookkeeping
    ///
    /// The error is returned exactly as the operation produced it.
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }

    /// Take the successful value, if any
    pub fn into_value(self) -> Option<T> {
        self.result.ok()
    }

    /// Take the final error, if any
    pub fn into_error(self) -> Option<E> {
        self.result.err()
    }

    /// Map the error type using a closure
    pub fn map_err<F, E2>(self, f: F) -> RetryOutcome<T, E2>
    where
        F: FnOnce(E) -> E2,
    {
        RetryOutcome {
            result: self.result.map_err(f),
            termination: self.termination,
            attempts_used: self.attempts_used,
            elapsed: self.elapsed,
        }
    }
}

impl<T, E> From<RetryOutcome<T, E>> for Result<T, E> {
    fn from(outcome: RetryOutcome<T, E>) -> Self {
        outcome.into_result()
    }
}
