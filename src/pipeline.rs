//! Root orchestrator wiring admission control, credentials, transport, and retries.

pub mod account;
pub mod send;

pub use account::*;
pub use send::*;

// self
use crate::{
	_prelude::*,
	auth::InstallId,
	http::Transport,
	lifecycle::TokenManager,
	limits::{LockoutGuard, RateLimiter},
	retry::RetryPolicy,
	service::ServiceDescriptor,
	store::StateStore,
	vault::CredentialVault,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Pipeline specialized for the crate's default reqwest transport.
pub type ReqwestPipeline = Pipeline<ReqwestTransport>;

/// Coordinates every outbound call to one authentication service.
///
/// The pipeline owns the transport, state store, and descriptor so the
/// account operations and the request path share one set of collaborators:
/// a sliding-window rate limiter, a lockout guard for login attempts, a
/// single-flight token manager, and a retry policy. Instances hold no global
/// state; two pipelines over different stores are fully independent.
#[derive(Clone)]
pub struct Pipeline<T>
where
	T: ?Sized + Transport,
{
	/// Transport used for every outbound service call.
	pub transport: Arc<T>,
	/// Storage backend holding credential and lockout state.
	pub store: Arc<dyn StateStore>,
	/// Validated descriptor of the remote service.
	pub descriptor: ServiceDescriptor,
	/// Stable per-install identifier feeding the freshness tag.
	pub install_id: InstallId,
	/// Token lifecycle manager, exposed for metrics and explicit refreshes.
	pub tokens: TokenManager<T>,
	vault: CredentialVault,
	limiter: RateLimiter,
	lockout: LockoutGuard,
	retry: RetryPolicy,
}
impl<T> Pipeline<T>
where
	T: ?Sized + Transport,
{
	/// Creates a pipeline that reuses the caller-provided transport.
	pub fn with_transport(
		store: Arc<dyn StateStore>,
		descriptor: ServiceDescriptor,
		install_id: InstallId,
		transport: impl Into<Arc<T>>,
	) -> Self {
		let transport = transport.into();
		let vault = CredentialVault::new(store.clone());
		let limits = descriptor.limits.clone();

		Self {
			tokens: TokenManager::new(vault.clone(), transport.clone(), descriptor.clone()),
			limiter: RateLimiter::new(limits.rate_window, limits.max_requests_per_window),
			lockout: LockoutGuard::new(
				store.clone(),
				limits.lockout_window,
				limits.max_login_attempts,
			),
			retry: RetryPolicy::new(
				limits.max_retry_attempts,
				limits.retry_base_delay,
				limits.retry_max_delay,
			),
			transport,
			store,
			descriptor,
			install_id,
			vault,
		}
	}
}
#[cfg(feature = "reqwest")]
impl Pipeline<ReqwestTransport> {
	/// Creates a new pipeline for the provided store, descriptor, and install.
	///
	/// The pipeline provisions its own reqwest-backed transport so callers do
	/// not need to pass HTTP handles explicitly. Use
	/// [`Pipeline::with_transport`] to supply a custom client, for example one
	/// with a request timeout.
	pub fn new(
		store: Arc<dyn StateStore>,
		descriptor: ServiceDescriptor,
		install_id: InstallId,
	) -> Self {
		Self::with_transport(store, descriptor, install_id, ReqwestTransport::default())
	}
}
impl<T> Debug for Pipeline<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Pipeline")
			.field("descriptor", &self.descriptor)
			.field("install_id", &self.install_id)
			.finish()
	}
}
