//! Sliding-window request budgets tracked per logical endpoint.

// self
use crate::_prelude::*;

/// In-memory sliding-window rate limiter.
///
/// Each endpoint owns an ordered window of admission timestamps. Admission
/// prunes entries older than the window, denies when the pruned window is
/// full, and appends the current instant only when the call is admitted, so a
/// denied call never consumes budget.
#[derive(Clone, Debug)]
pub struct RateLimiter {
	window: Duration,
	max_requests: usize,
	history: Arc<Mutex<HashMap<String, VecDeque<OffsetDateTime>>>>,
}
impl RateLimiter {
	/// Creates a limiter admitting `max_requests` per `window` per endpoint.
	pub fn new(window: Duration, max_requests: usize) -> Self {
		Self { window, max_requests, history: Default::default() }
	}

	/// Admits or denies a call against the endpoint's window at the current
	/// instant.
	pub fn admit(&self, endpoint: &str) -> Result<()> {
		self.admit_at(endpoint, OffsetDateTime::now_utc())
	}

	/// Admits or denies a call at the provided instant.
	///
	/// Denials carry a positive whole-second wait derived from the oldest
	/// timestamp still in the window.
	pub fn admit_at(&self, endpoint: &str, instant: OffsetDateTime) -> Result<()> {
		let mut history = self.history.lock();
		let window = history.entry(endpoint.to_owned()).or_default();
		let horizon = instant - self.window;

		while window.front().is_some_and(|stamp| *stamp <= horizon) {
			window.pop_front();
		}

		if window.len() >= self.max_requests {
			let oldest = window.front().copied().unwrap_or(instant);
			let wait = (oldest + self.window) - instant;

			return Err(Error::RateLimited { retry_after_secs: ceil_secs(wait) });
		}

		window.push_back(instant);

		Ok(())
	}
}

pub(crate) fn ceil_secs(wait: Duration) -> u64 {
	(wait.whole_milliseconds().max(1) as u64).div_ceil(1_000)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn denies_once_the_window_is_full() {
		let limiter = RateLimiter::new(Duration::seconds(60), 3);
		let start = macros::datetime!(2025-06-01 12:00 UTC);

		for i in 0..3 {
			limiter
				.admit_at("/auth/login", start + Duration::seconds(i))
				.expect("Admissions within budget should succeed.");
		}

		let err = limiter
			.admit_at("/auth/login", start + Duration::seconds(3))
			.expect_err("Fourth admission should be denied.");

		assert!(matches!(err, Error::RateLimited { .. }));
	}

	#[test]
	fn wait_hint_is_positive_and_tracks_the_oldest_entry() {
		let limiter = RateLimiter::new(Duration::seconds(60), 1);
		let start = macros::datetime!(2025-06-01 12:00 UTC);

		limiter.admit_at("/auth/login", start).expect("First admission should succeed.");

		// 10s into the window: the slot frees up 50s from now.
		let Err(Error::RateLimited { retry_after_secs }) =
			limiter.admit_at("/auth/login", start + Duration::seconds(10))
		else {
			panic!("Second admission should be denied.");
		};

		assert_eq!(retry_after_secs, 50);

		// Just shy of expiry the hint still rounds up to a full second.
		let Err(Error::RateLimited { retry_after_secs }) =
			limiter.admit_at("/auth/login", start + Duration::milliseconds(59_999))
		else {
			panic!("Admission just before expiry should be denied.");
		};

		assert_eq!(retry_after_secs, 1);
	}

	#[test]
	fn expired_entries_free_their_slots() {
		let limiter = RateLimiter::new(Duration::seconds(60), 1);
		let start = macros::datetime!(2025-06-01 12:00 UTC);

		limiter.admit_at("/auth/login", start).expect("First admission should succeed.");
		limiter
			.admit_at("/auth/login", start + Duration::seconds(60))
			.expect("Admission after the window elapses should succeed.");
	}

	#[test]
	fn denied_calls_do_not_consume_budget() {
		let limiter = RateLimiter::new(Duration::seconds(60), 1);
		let start = macros::datetime!(2025-06-01 12:00 UTC);

		limiter.admit_at("/auth/login", start).expect("First admission should succeed.");

		for i in 1..10 {
			assert!(limiter.admit_at("/auth/login", start + Duration::seconds(i)).is_err());
		}

		// Denials appended nothing, so the original slot frees on schedule.
		limiter
			.admit_at("/auth/login", start + Duration::seconds(60))
			.expect("Slot should free exactly one window after the only admission.");
	}

	#[test]
	fn endpoints_track_independent_windows() {
		let limiter = RateLimiter::new(Duration::seconds(60), 1);
		let start = macros::datetime!(2025-06-01 12:00 UTC);

		limiter.admit_at("/auth/login", start).expect("Login admission should succeed.");
		limiter
			.admit_at("/profile", start)
			.expect("A different endpoint should have its own budget.");
		assert!(limiter.admit_at("/auth/login", start + Duration::seconds(1)).is_err());
	}
}
