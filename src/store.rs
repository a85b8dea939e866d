//! Storage contracts and built-in key-value stores for pipeline state.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::_prelude::*;

/// Boxed future returned by [`StateStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Well-known keys under which the pipeline persists its state.
pub mod keys {
	// self
	use crate::auth::IdentifierHash;

	/// Current access token record.
	pub const ACCESS_TOKEN: &str = "auth.access_token";
	/// Opaque refresh secret paired with the access token.
	pub const REFRESH_TOKEN: &str = "auth.refresh_token";
	/// Denormalized login-state snapshot for fast status reads.
	pub const SNAPSHOT: &str = "auth.state";

	/// Lockout record key for a hashed login identifier. The raw identifier
	/// never reaches storage.
	pub fn lockout(hash: &IdentifierHash) -> String {
		format!("auth.lockout.{hash}")
	}
}

/// Storage backend contract implemented by pipeline state stores.
///
/// Values are stored as JSON so backends stay schema-agnostic; typed access
/// lives in [`CredentialVault`](crate::vault::CredentialVault).
pub trait StateStore
where
	Self: Send + Sync,
{
	/// Fetches the value stored under `key`, if present.
	fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<serde_json::Value>>;

	/// Persists every entry in a single atomic write; either all entries land
	/// or none do.
	fn persist(&self, entries: Vec<StateEntry>) -> StoreFuture<'_, ()>;

	/// Removes the provided keys in a single atomic write; absent keys are
	/// ignored.
	fn remove<'a>(&'a self, keys: &'a [&'a str]) -> StoreFuture<'a, ()>;
}

/// Single key/value pair accepted by [`StateStore::persist`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateEntry {
	/// Storage key, usually one of [`keys`].
	pub key: String,
	/// JSON value to store.
	pub value: serde_json::Value,
}
impl StateEntry {
	/// Builds an entry from an already-serialized value.
	pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
		Self { key: key.into(), value }
	}

	/// Serializes a typed record into an entry.
	pub fn encode<T>(key: impl Into<String>, record: &T) -> Result<Self, StoreError>
	where
		T: Serialize,
	{
		let value = serde_json::to_value(record)
			.map_err(|e| StoreError::Serialization { message: e.to_string() })?;

		Ok(Self::new(key, value))
	}
}

/// Decodes a fetched JSON value into a typed record.
///
/// Corrupt stored data surfaces as [`StoreError::Serialization`] rather than a
/// decode failure; it is a storage-layer concern, not a wire one.
pub fn decode_entry<T>(value: Option<serde_json::Value>) -> Result<Option<T>, StoreError>
where
	T: serde::de::DeserializeOwned,
{
	value
		.map(|v| {
			serde_json::from_value(v)
				.map_err(|e| StoreError::Serialization { message: e.to_string() })
		})
		.transpose()
}

/// Error type produced by [`StateStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
