//! Failed-login lockout records keyed by hashed identifiers.

// self
use crate::{
	_prelude::*,
	auth::IdentifierHash,
	store::{self, StateEntry, StateStore, keys},
};

/// Persisted tally of consecutive failed login attempts for one identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LockoutRecord {
	/// Digest of the login identifier; the raw identifier is never stored.
	pub identifier_hash: IdentifierHash,
	/// Number of failed attempts inside the current window.
	pub count: u32,
	/// Instant of the first failure that opened the window.
	pub first_attempt_at: OffsetDateTime,
	/// Instant of the most recent failure.
	pub last_attempt_at: OffsetDateTime,
}

/// Guards login and registration attempts behind a failure budget.
///
/// The failure count only resets through [`clear`](Self::clear) (successful
/// login) or window expiry, which deletes the record during the next check.
#[derive(Clone)]
pub struct LockoutGuard {
	store: Arc<dyn StateStore>,
	window: Duration,
	max_attempts: u32,
}
impl LockoutGuard {
	/// Creates a guard allowing `max_attempts` failures per `window`.
	pub fn new(store: Arc<dyn StateStore>, window: Duration, max_attempts: u32) -> Self {
		Self { store, window, max_attempts }
	}

	/// Rejects the attempt when the identifier is locked out at the current
	/// instant.
	pub async fn check(&self, hash: &IdentifierHash) -> Result<()> {
		self.check_at(hash, OffsetDateTime::now_utc()).await
	}

	/// Rejects the attempt when the identifier is locked out at `instant`.
	///
	/// Expired records are deleted on sight, so a stale lockout never blocks a
	/// login.
	pub async fn check_at(&self, hash: &IdentifierHash, instant: OffsetDateTime) -> Result<()> {
		let key = keys::lockout(hash);
		let Some(record) = self.load(&key).await? else {
			return Ok(());
		};
		let elapsed = instant - record.first_attempt_at;

		if elapsed > self.window {
			self.store.remove(&[key.as_str()]).await?;

			return Ok(());
		}
		if record.count >= self.max_attempts {
			return Err(Error::LockedOut { remaining_minutes: ceil_minutes(self.window - elapsed) });
		}

		Ok(())
	}

	/// Records one failed attempt at the current instant.
	pub async fn record_failure(&self, hash: &IdentifierHash) -> Result<()> {
		self.record_failure_at(hash, OffsetDateTime::now_utc()).await
	}

	/// Records one failed attempt at `instant`, creating the record on the
	/// first failure.
	pub async fn record_failure_at(
		&self,
		hash: &IdentifierHash,
		instant: OffsetDateTime,
	) -> Result<()> {
		let key = keys::lockout(hash);
		let record = match self.load(&key).await? {
			Some(mut record) => {
				record.count += 1;
				record.last_attempt_at = instant;

				record
			},
			None => LockoutRecord {
				identifier_hash: hash.clone(),
				count: 1,
				first_attempt_at: instant,
				last_attempt_at: instant,
			},
		};

		self.store.persist(vec![StateEntry::encode(key, &record)?]).await?;

		Ok(())
	}

	/// Deletes the identifier's record after a successful login.
	pub async fn clear(&self, hash: &IdentifierHash) -> Result<()> {
		let key = keys::lockout(hash);

		self.store.remove(&[key.as_str()]).await?;

		Ok(())
	}

	async fn load(&self, key: &str) -> Result<Option<LockoutRecord>> {
		Ok(store::decode_entry(self.store.fetch(key).await?)?)
	}
}
impl Debug for LockoutGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LockoutGuard")
			.field("window", &self.window)
			.field("max_attempts", &self.max_attempts)
			.finish_non_exhaustive()
	}
}

fn ceil_minutes(remaining: Duration) -> u64 {
	(remaining.whole_milliseconds().max(1) as u64).div_ceil(60_000)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::store::MemoryStore;

	fn guard_fixture() -> (LockoutGuard, Arc<MemoryStore>) {
		let backend = Arc::new(MemoryStore::default());
		let guard = LockoutGuard::new(backend.clone(), Duration::minutes(15), 5);

		(guard, backend)
	}

	#[tokio::test]
	async fn five_failures_lock_the_sixth_attempt() {
		let (guard, _backend) = guard_fixture();
		let hash = IdentifierHash::digest("user@example.com");
		let start = macros::datetime!(2025-06-01 12:00 UTC);

		for i in 0..5 {
			guard
				.check_at(&hash, start + Duration::seconds(i))
				.await
				.expect("Attempts below the budget should pass the check.");
			guard
				.record_failure_at(&hash, start + Duration::seconds(i))
				.await
				.expect("Failure should be recorded.");
		}

		let err = guard
			.check_at(&hash, start + Duration::minutes(1))
			.await
			.expect_err("Sixth attempt should be locked out.");

		assert!(matches!(err, Error::LockedOut { .. }));
	}

	#[tokio::test]
	async fn remaining_minutes_round_up_from_the_first_failure() {
		let (guard, _backend) = guard_fixture();
		let hash = IdentifierHash::digest("user@example.com");
		let start = macros::datetime!(2025-06-01 12:00 UTC);

		for _ in 0..5 {
			guard.record_failure_at(&hash, start).await.expect("Failure should be recorded.");
		}

		// 14m30s of the 15m window remain; the hint rounds up to 15.
		let Err(Error::LockedOut { remaining_minutes }) =
			guard.check_at(&hash, start + Duration::seconds(30)).await
		else {
			panic!("Locked identifier should be rejected.");
		};

		assert_eq!(remaining_minutes, 15);

		let Err(Error::LockedOut { remaining_minutes }) =
			guard.check_at(&hash, start + Duration::minutes(14)).await
		else {
			panic!("Locked identifier should still be rejected inside the window.");
		};

		assert_eq!(remaining_minutes, 1);
	}

	#[tokio::test]
	async fn window_expiry_deletes_the_record() {
		let (guard, backend) = guard_fixture();
		let hash = IdentifierHash::digest("user@example.com");
		let start = macros::datetime!(2025-06-01 12:00 UTC);

		for _ in 0..5 {
			guard.record_failure_at(&hash, start).await.expect("Failure should be recorded.");
		}

		guard
			.check_at(&hash, start + Duration::minutes(15) + Duration::seconds(1))
			.await
			.expect("Expired lockout should admit the attempt.");
		assert!(backend.is_empty(), "Expired record should be deleted on check.");
	}

	#[tokio::test]
	async fn clear_resets_the_budget() {
		let (guard, backend) = guard_fixture();
		let hash = IdentifierHash::digest("user@example.com");
		let start = macros::datetime!(2025-06-01 12:00 UTC);

		for _ in 0..4 {
			guard.record_failure_at(&hash, start).await.expect("Failure should be recorded.");
		}

		guard.clear(&hash).await.expect("Clear should succeed.");
		assert!(backend.is_empty());
		guard
			.check_at(&hash, start + Duration::seconds(1))
			.await
			.expect("Cleared identifier should pass the check.");
	}

	#[tokio::test]
	async fn identifiers_lock_independently() {
		let (guard, _backend) = guard_fixture();
		let first = IdentifierHash::digest("first@example.com");
		let second = IdentifierHash::digest("second@example.com");
		let start = macros::datetime!(2025-06-01 12:00 UTC);

		for _ in 0..5 {
			guard.record_failure_at(&first, start).await.expect("Failure should be recorded.");
		}

		assert!(guard.check_at(&first, start + Duration::minutes(1)).await.is_err());
		guard
			.check_at(&second, start + Duration::minutes(1))
			.await
			.expect("Unrelated identifier should remain unlocked.");
	}
}
