//! Access-token record and its freshness helpers.

// self
use crate::{
	_prelude::*,
	auth::token::{claims::TokenClaims, claims::TokenParseError, secret::TokenSecret},
};

/// Persisted access token plus the instants that govern its freshness.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
	/// Raw signed credential; callers must avoid logging it.
	pub secret: TokenSecret,
	/// Issued-at instant from the credential claims, or the receive instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant from the credential claims.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Builds a record from a signed credential, reading expiry from its claims.
	///
	/// `received_at` stands in for the issued-at instant when the credential
	/// carries no `iat` claim.
	pub fn from_signed(
		credential: impl Into<String>,
		received_at: OffsetDateTime,
	) -> Result<Self, TokenParseError> {
		let credential = credential.into();
		let claims = TokenClaims::decode(&credential)?;
		let expires_at = claims.expires_at()?;
		let issued_at = claims.issued_at()?.unwrap_or(received_at);

		Ok(Self { secret: TokenSecret::new(credential), issued_at, expires_at })
	}

	/// Returns `true` when the token is expired at `instant`, treating anything
	/// within `refresh_buffer` of the expiry as already expired.
	pub fn is_expired_at(&self, instant: OffsetDateTime, refresh_buffer: Duration) -> bool {
		instant >= self.expires_at - refresh_buffer
	}

	/// Convenience helper that checks expiry against the current UTC instant.
	pub fn is_expired(&self, refresh_buffer: Duration) -> bool {
		self.is_expired_at(OffsetDateTime::now_utc(), refresh_buffer)
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("secret", &"<redacted>")
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
