//! Retry utilities for transient transfer failures.
//!
//! Provides exponential backoff for copy attempts.

use std::time::Duration;

/// Upper bound for a single backoff delay.
pub const MAX_BACKOFF_MS: u64 = 16_000;

/// Calculate exponential backoff duration for a given attempt.
///
/// Uses `base_delay * 2^attempt` with a cap at 16 seconds.
pub fn backoff_duration(attempt: u32, base_delay_ms: u64) -> Duration {
    let delay = base_delay_ms.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_millis(delay.min(MAX_BACKOFF_MS))
}
