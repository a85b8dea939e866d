//! Token lifecycle management: freshness checks and single-flight refresh.
//!
//! [`TokenManager`] owns the credential vault and serializes refreshes behind
//! one async guard, so N concurrent callers needing a fresh token produce
//! exactly one network refresh; the rest coalesce onto the rotated record.
//! A failed refresh clears the vault before surfacing, which both signs the
//! installation out and lets waiting callers fail fast without issuing
//! refresh calls of their own.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, RotationPayload, TokenSecret},
	error::{DecodeError, NetworkError},
	http::{Method, Transport, WireRequest},
	obs::{self, OpKind, OpOutcome, OpSpan},
	service::ServiceDescriptor,
	vault::CredentialVault,
};

/// Manages access-token freshness for one credential set.
#[derive(Clone)]
pub struct TokenManager<T>
where
	T: ?Sized + Transport,
{
	/// Shared metrics recorder for refresh outcomes.
	pub metrics: Arc<RefreshMetrics>,
	vault: CredentialVault,
	transport: Arc<T>,
	descriptor: ServiceDescriptor,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<T> TokenManager<T>
where
	T: ?Sized + Transport,
{
	/// Creates a manager over the provided vault, transport, and descriptor.
	pub fn new(
		vault: CredentialVault,
		transport: impl Into<Arc<T>>,
		descriptor: ServiceDescriptor,
	) -> Self {
		Self {
			metrics: Default::default(),
			vault,
			transport: transport.into(),
			descriptor,
			refresh_guard: Default::default(),
		}
	}

	/// Returns a token valid past the refresh buffer, refreshing when needed.
	///
	/// Never fails: internal errors degrade to `None`, and unreadable
	/// credential state is cleared so later calls start from a clean
	/// signed-out baseline.
	pub async fn valid_token(&self) -> Option<AccessToken> {
		let now = OffsetDateTime::now_utc();

		match self.vault.access_token().await {
			Ok(Some(token)) if !token.is_expired_at(now, self.refresh_buffer()) => Some(token),
			Ok(_) => self.refresh_if_needed().await.ok(),
			Err(_) => {
				let _ = self.vault.clear().await;

				None
			},
		}
	}

	/// Rotates the stored credentials through the refresh route, coalescing
	/// concurrent callers onto a single network call.
	///
	/// Any refresh failure (missing refresh secret, transport error, rejected
	/// rotation, undecodable payload) clears the vault and surfaces as
	/// [`Error::TokenExpired`]; the caller must sign in again.
	pub async fn refresh_if_needed(&self) -> Result<AccessToken> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "refresh_if_needed");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;
				let now = OffsetDateTime::now_utc();

				// A rotation may have landed while this caller waited on the
				// guard; reuse it instead of refreshing again.
				if let Ok(Some(token)) = self.vault.access_token().await {
					if !token.is_expired_at(now, self.refresh_buffer()) {
						self.metrics.record_coalesced();

						return Ok(token);
					}
				}

				self.metrics.record_attempt();

				match self.rotate(now).await {
					Ok(token) => {
						self.metrics.record_success();

						Ok(token)
					},
					Err(_) => {
						self.metrics.record_failure();

						// Waiters behind the guard observe the cleared vault,
						// fail their own recheck cheaply, and never dispatch
						// a second refresh call.
						let _ = self.vault.clear().await;

						Err(Error::TokenExpired)
					},
				}
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn rotate(&self, now: OffsetDateTime) -> Result<AccessToken> {
		let refresh = self.vault.refresh_secret().await?.ok_or(Error::TokenExpired)?;
		let url = self.descriptor.resolve(&self.descriptor.routes.refresh)?;
		// The expiring access token must not ride along as this call's
		// credential; the refresh secret in the body is the whole proof.
		let request = WireRequest::new(Method::Post, url)
			.with_body(serde_json::json!({ "refreshToken": refresh.expose() }));
		let response = self.transport.dispatch(request).await.map_err(NetworkError::Transport)?;

		if !response.is_success() {
			return Err(Error::Rejected {
				status: response.status,
				message: response.error_message(),
			});
		}

		let payload: RotationPayload = response.decode_json()?;
		let token = AccessToken::from_signed(payload.token, now).map_err(DecodeError::Credential)?;
		let next_refresh = payload.refresh_token.map(TokenSecret::new).unwrap_or(refresh);

		self.vault.store_rotation(&token, &next_refresh, now).await?;

		Ok(token)
	}

	fn refresh_buffer(&self) -> Duration {
		self.descriptor.limits.refresh_buffer
	}
}
impl<T> Debug for TokenManager<T>
where
	T: ?Sized + Transport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenManager").field("descriptor", &self.descriptor.id).finish()
	}
}
