//! Retry delay computation
//!
//! Delays grow exponentially from the policy's base delay, receive up to 10%
//! of added jitter, and are clamped to the policy's ceiling last.

use crate::types::RetryPolicy;
use rand::Rng;
use std::time::Duration;

/// Largest fraction of the unjittered delay that jitter may add
pub const MAX_JITTER: f64 = 0.1;

/// Calculate the delay to wait after a failed attempt
///
/// # Arguments
///
/// * `policy` - The retry policy containing timing parameters
/// * `attempt` - The attempt that just failed (1-indexed)
/// * `jitter` - Whether to add random jitter in `[0%, 10%)`
///
/// # Example
///
/// ```rust
/// use keystone_retry::retry::calculate_delay;
/// use keystone_retry::types::RetryPolicy;
///
/// let policy = RetryPolicy::default()
///     .with_base_delay_ms(1000)
///     .with_max_delay_ms(30000);
///
/// assert_eq!(calculate_delay(&policy, 1, false).as_millis(), 1000);
/// assert_eq!(calculate_delay(&policy, 2, false).as_millis(), 2000);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, attempt: u32, jitter: bool) -> Duration {
    let jitter_factor = if jitter {
        1.0 + rand::rng().random_range(0.0..MAX_JITTER)
    } else {
        1.0
    };

    scaled_delay(policy, attempt, jitter_factor)
}

/// The delay before clamping and jitter, `base * factor^(attempt-1)`
pub fn unjittered_delay(policy: &RetryPolicy, attempt: u32) -> Duration {
    if policy.base_delay_ms == 0 {
        return Duration::ZERO;
    }
    millis_to_duration(exponential_ms(policy, attempt))
}

/// Calculate a delay with an explicit jitter multiplier
///
/// The multiplier is applied to the exponential delay and the result is then
/// clamped to `max_delay_ms`, so the ceiling holds even with jitter.
pub fn scaled_delay(policy: &RetryPolicy, attempt: u32, jitter_factor: f64) -> Duration {
    if policy.base_delay_ms == 0 {
        return Duration::ZERO;
    }

    let jittered_ms = exponential_ms(policy, attempt) * jitter_factor;
    millis_to_duration(jittered_ms.min(policy.max_delay_ms as f64))
}

fn exponential_ms(policy: &RetryPolicy, attempt: u32) -> f64 {
    // Attempt is 1-indexed; the first retry uses factor^0
    let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
    policy.base_delay_ms as f64 * policy.backoff_factor.powi(exponent)
}

fn millis_to_duration(ms: f64) -> Duration {
    // Float-to-int casts saturate, so overflow lands on u64::MAX
    Duration::from_micros((ms * 1000.0).round() as u64)
}
