//! Thread-safe in-memory [`StateStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	store::{StateEntry, StateStore, StoreError, StoreFuture},
};

type StateMap = Arc<RwLock<HashMap<String, serde_json::Value>>>;

/// Thread-safe storage backend that keeps pipeline state in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StateMap);
impl MemoryStore {
	/// Returns the number of stored entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Reports whether the store holds no entries.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn fetch_now(map: StateMap, key: String) -> Option<serde_json::Value> {
		map.read().get(&key).cloned()
	}

	fn persist_now(map: StateMap, entries: Vec<StateEntry>) -> Result<(), StoreError> {
		let mut guard = map.write();

		for entry in entries {
			guard.insert(entry.key, entry.value);
		}

		Ok(())
	}

	fn remove_now(map: StateMap, keys: Vec<String>) {
		let mut guard = map.write();

		for key in keys {
			guard.remove(&key);
		}
	}
}
impl StateStore for MemoryStore {
	fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<serde_json::Value>> {
		let map = self.0.clone();
		let key = key.to_owned();

		Box::pin(async move { Ok(Self::fetch_now(map, key)) })
	}

	fn persist(&self, entries: Vec<StateEntry>) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::persist_now(map, entries) })
	}

	fn remove<'a>(&'a self, keys: &'a [&'a str]) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let keys = keys.iter().map(|k| (*k).to_owned()).collect();

		Box::pin(async move {
			Self::remove_now(map, keys);

			Ok(())
		})
	}
}
