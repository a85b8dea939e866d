//! Retry classification and capped exponential backoff with jitter.

// crates.io
use rand::Rng;
// self
use crate::_prelude::*;

const MAX_JITTER_RATIO: f64 = 0.30;
// 2^32 already dwarfs any sane delay cap; clamping the shift keeps the
// arithmetic well-defined for absurd attempt numbers.
const MAX_BACKOFF_SHIFT: u32 = 32;

/// Decides which failures are retried and how long to wait between attempts.
///
/// Only transport and 5xx failures ([`Error::Network`]) are retryable;
/// validation, rate-limit, lockout, token-expiry, decode, and 4xx rejections
/// always surface to the caller on the first occurrence.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
	max_attempts: u32,
	base_delay: Duration,
	max_delay: Duration,
}
impl RetryPolicy {
	/// Creates a policy allowing `max_attempts` retries with delays growing
	/// from `base_delay` up to `max_delay`.
	pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
		Self { max_attempts, base_delay, max_delay }
	}

	/// Returns `true` when `error` is retryable and retries remain after
	/// zero-based attempt number `attempt`.
	pub fn should_retry(&self, error: &Error, attempt: u32) -> bool {
		attempt < self.max_attempts && matches!(error, Error::Network(_))
	}

	/// Deterministic schedule before jitter: `min(base * 2^attempt, max)`.
	pub fn exponential_delay(&self, attempt: u32) -> Duration {
		let base = self.base_delay.whole_milliseconds().max(0);
		let scaled = base.saturating_mul(1_i128 << attempt.min(MAX_BACKOFF_SHIFT));
		let capped = scaled.min(self.max_delay.whole_milliseconds().max(0));

		Duration::milliseconds(capped as i64)
	}

	/// Full backoff delay: the exponential schedule plus up to 30% uniform
	/// random jitter.
	pub fn backoff_delay(&self, attempt: u32) -> Duration {
		let delay = self.exponential_delay(attempt);
		let jitter_ms =
			delay.whole_milliseconds() as f64 * rand::rng().random_range(0.0..=MAX_JITTER_RATIO);

		delay + Duration::milliseconds(jitter_ms as i64)
	}
}
