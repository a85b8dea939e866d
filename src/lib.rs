//! Client-side authentication pipeline for token-based HTTP services: rate-limited
//! admission, lockout-guarded logins, single-flight token refresh, and classified
//! responses with retry over a pluggable transport and store.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod limits;
pub mod obs;
pub mod pipeline;
pub mod retry;
pub mod service;
pub mod store;
pub mod vault;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	// crates.io
	use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
	use serde_json::json;

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::InstallId,
		http::ReqwestTransport,
		pipeline::Pipeline,
		service::ServiceDescriptor,
		store::{MemoryStore, StateStore},
	};

	/// Pipeline type alias used by reqwest-backed integration tests.
	pub type ReqwestTestPipeline = Pipeline<ReqwestTransport>;

	/// Builds a reqwest transport that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs a [`Pipeline`] backed by an in-memory store, a fresh install identifier, and
	/// the insecure reqwest transport used across integration tests.
	pub fn build_reqwest_test_pipeline(
		descriptor: ServiceDescriptor,
	) -> (ReqwestTestPipeline, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn StateStore> = store_backend.clone();
		let pipeline = Pipeline::with_transport(
			store,
			descriptor,
			InstallId::generate(),
			test_reqwest_transport(),
		);

		(pipeline, store_backend)
	}

	/// Mints a structurally valid signed credential expiring `expires_in` from now.
	///
	/// Only the claims segment matters to the pipeline; the signature is a fixture.
	pub fn signed_test_credential(expires_in: Duration) -> String {
		let now = OffsetDateTime::now_utc();
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
		let claims = URL_SAFE_NO_PAD.encode(
			serde_json::to_vec(&json!({
				"exp": (now + expires_in).unix_timestamp(),
				"iat": now.unix_timestamp(),
			}))
			.expect("Failed to serialize test credential claims."),
		);

		format!("{header}.{claims}.test-signature")
	}
}

mod _prelude {
	pub use std::{
		collections::{HashMap, VecDeque, hash_map::DefaultHasher},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::{Hash, Hasher},
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
// The self dev-dependency only exists to switch the `test` feature on for test builds.
#[cfg(test)] use auth_pipeline as _;
#[cfg(all(test, feature = "reqwest"))] use httpmock as _;
