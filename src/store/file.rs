//! Simple file-backed [`StateStore`] for lightweight deployments and CLIs.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	store::{StateEntry, StateStore, StoreError, StoreFuture},
};

/// Persists pipeline state to a JSON file after each mutation.
///
/// Writes go through a temporary sibling file followed by a rename, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::prepare_parent(&path)?;

		let snapshot = Self::read_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	fn read_snapshot(path: &Path) -> Result<HashMap<String, serde_json::Value>, StoreError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
			Err(e) => return Err(Self::backend_error("read", path, e)),
		};

		if bytes.is_empty() {
			return Ok(HashMap::new());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse state file {}: {e}", path.display()),
		})
	}

	fn prepare_parent(path: &Path) -> Result<(), StoreError> {
		match path.parent().filter(|p| !p.as_os_str().is_empty()) {
			Some(parent) =>
				fs::create_dir_all(parent).map_err(|e| Self::backend_error("create", parent, e)),
			None => Ok(()),
		}
	}

	fn flush_locked(&self, contents: &HashMap<String, serde_json::Value>) -> Result<(), StoreError> {
		Self::prepare_parent(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize state snapshot: {e}"),
			})?;
		let staging = self.path.with_extension("tmp");

		{
			let mut file =
				File::create(&staging).map_err(|e| Self::backend_error("create", &staging, e))?;

			file.write_all(&serialized).map_err(|e| Self::backend_error("write", &staging, e))?;
			file.sync_all().map_err(|e| Self::backend_error("sync", &staging, e))?;
		}

		fs::rename(&staging, &self.path).map_err(|e| Self::backend_error("replace", &self.path, e))
	}

	fn backend_error(action: &str, path: &Path, e: impl Display) -> StoreError {
		StoreError::Backend { message: format!("Failed to {action} {}: {e}", path.display()) }
	}
}
impl StateStore for FileStore {
	fn fetch<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<serde_json::Value>> {
		Box::pin(async move { Ok(self.inner.read().get(key).cloned()) })
	}

	fn persist(&self, entries: Vec<StateEntry>) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			for entry in entries {
				guard.insert(entry.key, entry.value);
			}

			self.flush_locked(&guard)
		})
	}

	fn remove<'a>(&'a self, keys: &'a [&'a str]) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			for key in keys {
				guard.remove(*key);
			}

			self.flush_locked(&guard)
		})
	}
}
