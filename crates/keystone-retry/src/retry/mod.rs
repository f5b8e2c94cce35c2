//! Retry execution engine with policy-based configuration
//!
//! Every backend call the client makes (listing search, saved properties,
//! newsletter sign-up, message polling) can run through one retry engine
//! instead of ad-hoc loops at each call site.
//!
//! # Features
//!
//! - Jittered exponential backoff: `min(base * factor^(attempt-1) * [1.0, 1.1), max)`
//! - Error classification into transport failures and HTTP statuses
//! - Default classifier retrying transport failures, 5xx, 408 and 429
//! - Observable retry attempts via the `RetryObserver` trait
//! - Non-throwing `RetryOutcome`; unwrapping adapters return the original error
//! - Cooperative cancellation of the backoff sleep
//!
//! # Example
//!
//! ```rust,no_run
//! use keystone_retry::retry::retry_with_policy;
//! use keystone_retry::types::RetryPolicy;
//!
//! async fn example() -> Result<String, std::io::Error> {
//!     let policy = RetryPolicy::default();
//!
//!     retry_with_policy(&policy, || async {
//!         // Your fallible operation here
//!         Ok("listing".to_string())
//!     })
//!     .await
//!     .into_result()
//! }
//! ```

mod adapters;
mod backoff;
mod classify;
mod executor;
mod http;
mod observer;
mod outcome;
mod predicates;

pub use adapters::{retry_fn, Retrying};
pub use backoff::{calculate_delay, scaled_delay, unjittered_delay, MAX_JITTER};
pub use classify::{Classify, DefaultClassifier, FailureKind};
pub use executor::{retry_with_policy, RetryExecutor, RetryExecutorBuilder};
pub use http::{HttpError, HttpRetry};
pub use observer::{NoOpObserver, OnRetry, RetryObserver, StatsObserver, TracingObserver};
pub use outcome::{RetryOutcome, Termination};
pub use predicates::{
    AlwaysRetry, ClosurePredicate, HttpStatusPredicate, MessagePredicate, NeverRetry,
    RetryPredicate,
};
