//! Typed owner of the persisted credential state.
//!
//! All credential writes funnel through [`CredentialVault`] so the access
//! token, refresh secret, and login-state snapshot always change together in
//! one atomic store write and can never disagree.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthSnapshot, TokenSecret, UserRecord},
	store::{self, StateEntry, StateStore, keys},
};

/// Typed read/write facade over the three credential keys.
#[derive(Clone)]
pub struct CredentialVault {
	store: Arc<dyn StateStore>,
}
impl CredentialVault {
	/// Wraps the provided state store.
	pub fn new(store: Arc<dyn StateStore>) -> Self {
		Self { store }
	}

	/// Fetches the stored access token, if any.
	pub async fn access_token(&self) -> Result<Option<AccessToken>> {
		Ok(store::decode_entry(self.store.fetch(keys::ACCESS_TOKEN).await?)?)
	}

	/// Fetches the stored refresh secret, if any.
	pub async fn refresh_secret(&self) -> Result<Option<TokenSecret>> {
		Ok(store::decode_entry(self.store.fetch(keys::REFRESH_TOKEN).await?)?)
	}

	/// Fetches the stored login-state snapshot, if any.
	pub async fn snapshot(&self) -> Result<Option<AuthSnapshot>> {
		Ok(store::decode_entry(self.store.fetch(keys::SNAPSHOT).await?)?)
	}

	/// Persists a freshly issued session: token, refresh secret, and snapshot
	/// land in one atomic write.
	pub async fn store_session(
		&self,
		user: &UserRecord,
		token: &AccessToken,
		refresh: &TokenSecret,
		instant: OffsetDateTime,
	) -> Result<()> {
		let snapshot = AuthSnapshot::for_user(user.clone(), instant);
		let entries = vec![
			StateEntry::encode(keys::ACCESS_TOKEN, token)?,
			StateEntry::encode(keys::REFRESH_TOKEN, refresh)?,
			StateEntry::encode(keys::SNAPSHOT, &snapshot)?,
		];

		Ok(self.store.persist(entries).await?)
	}

	/// Persists a token rotation, carrying the cached profile forward into the
	/// rewritten snapshot.
	pub async fn store_rotation(
		&self,
		token: &AccessToken,
		refresh: &TokenSecret,
		instant: OffsetDateTime,
	) -> Result<()> {
		let user = self.snapshot().await?.and_then(|snapshot| snapshot.user);
		let snapshot = AuthSnapshot { logged_in: true, user, last_update: instant };
		let entries = vec![
			StateEntry::encode(keys::ACCESS_TOKEN, token)?,
			StateEntry::encode(keys::REFRESH_TOKEN, refresh)?,
			StateEntry::encode(keys::SNAPSHOT, &snapshot)?,
		];

		Ok(self.store.persist(entries).await?)
	}

	/// Removes the token, refresh secret, and snapshot in one atomic write.
	///
	/// A missing snapshot reads back as signed-out, so callers observe a
	/// consistent logged-out state immediately after this returns.
	pub async fn clear(&self) -> Result<()> {
		Ok(self.store.remove(&[keys::ACCESS_TOKEN, keys::REFRESH_TOKEN, keys::SNAPSHOT]).await?)
	}
}
impl Debug for CredentialVault {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialVault").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::store::MemoryStore;

	fn vault_fixture() -> (CredentialVault, Arc<MemoryStore>) {
		let backend = Arc::new(MemoryStore::default());
		let vault = CredentialVault::new(backend.clone());

		(vault, backend)
	}

	fn token_fixture(expires_at: OffsetDateTime) -> AccessToken {
		AccessToken {
			secret: TokenSecret::new("header.claims.sig"),
			issued_at: expires_at - Duration::hours(1),
			expires_at,
		}
	}

	fn user_fixture() -> UserRecord {
		UserRecord { id: "user-1".into(), identifier: "user@example.com".into(), display_name: None }
	}

	#[tokio::test]
	async fn session_writes_are_atomic_and_read_back() {
		let (vault, _backend) = vault_fixture();
		let instant = macros::datetime!(2025-06-01 12:00 UTC);
		let token = token_fixture(instant + Duration::hours(1));

		vault
			.store_session(&user_fixture(), &token, &TokenSecret::new("refresh-1"), instant)
			.await
			.expect("Session fixture should persist.");

		let stored = vault
			.access_token()
			.await
			.expect("Stored token should decode.")
			.expect("Token should be present after store_session.");
		let snapshot = vault
			.snapshot()
			.await
			.expect("Stored snapshot should decode.")
			.expect("Snapshot should be present after store_session.");

		assert_eq!(stored.secret, token.secret);
		assert_eq!(stored.expires_at, token.expires_at);
		assert!(snapshot.logged_in);
		assert_eq!(snapshot.user.map(|u| u.id), Some("user-1".into()));
		assert_eq!(snapshot.last_update, instant);
	}

	#[tokio::test]
	async fn rotation_carries_the_cached_profile_forward() {
		let (vault, _backend) = vault_fixture();
		let first = macros::datetime!(2025-06-01 12:00 UTC);
		let later = first + Duration::minutes(30);

		vault
			.store_session(
				&user_fixture(),
				&token_fixture(first + Duration::hours(1)),
				&TokenSecret::new("refresh-1"),
				first,
			)
			.await
			.expect("Initial session fixture should persist.");
		vault
			.store_rotation(
				&token_fixture(later + Duration::hours(1)),
				&TokenSecret::new("refresh-2"),
				later,
			)
			.await
			.expect("Rotation fixture should persist.");

		let snapshot = vault
			.snapshot()
			.await
			.expect("Rotated snapshot should decode.")
			.expect("Snapshot should survive rotation.");
		let refresh = vault
			.refresh_secret()
			.await
			.expect("Rotated refresh secret should decode.")
			.expect("Refresh secret should survive rotation.");

		assert!(snapshot.logged_in);
		assert_eq!(snapshot.user.map(|u| u.id), Some("user-1".into()));
		assert_eq!(snapshot.last_update, later);
		assert_eq!(refresh.expose(), "refresh-2");
	}

	#[tokio::test]
	async fn clear_removes_all_three_keys() {
		let (vault, backend) = vault_fixture();
		let instant = macros::datetime!(2025-06-01 12:00 UTC);

		vault
			.store_session(
				&user_fixture(),
				&token_fixture(instant + Duration::hours(1)),
				&TokenSecret::new("refresh-1"),
				instant,
			)
			.await
			.expect("Session fixture should persist.");
		vault.clear().await.expect("Clear should succeed.");

		assert!(vault.access_token().await.expect("Read should succeed.").is_none());
		assert!(vault.refresh_secret().await.expect("Read should succeed.").is_none());
		assert!(vault.snapshot().await.expect("Read should succeed.").is_none());
		assert!(backend.is_empty());
	}
}
