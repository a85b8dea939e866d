//! Claims decoding for the three-segment signed credentials the service issues.
//!
//! The pipeline never verifies signatures; it only reads the claims segment to
//! learn the expiry instant. Verification stays server-side.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
// self
use crate::_prelude::*;

/// Errors produced while decoding a signed credential.
#[derive(Debug, ThisError)]
pub enum TokenParseError {
	/// Credential is not a three-segment signed token.
	#[error("Credential is not a three-segment signed token.")]
	MalformedCredential,
	/// Claims segment is not valid unpadded base64url.
	#[error("Credential claims segment is not valid base64url.")]
	ClaimsEncoding(#[from] base64::DecodeError),
	/// Claims segment is not the expected JSON shape.
	#[error("Credential claims segment is not valid JSON.")]
	ClaimsJson(#[from] serde_json::Error),
	/// Expiry claim is outside the representable instant range.
	#[error("Credential expiry claim is out of range.")]
	ExpiryOutOfRange(#[from] time::error::ComponentRange),
}

/// Claims the pipeline reads from a signed credential.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenClaims {
	/// Expiry instant as unix seconds (`exp`).
	pub exp: i64,
	/// Issued-at instant as unix seconds (`iat`), when present.
	#[serde(default)]
	pub iat: Option<i64>,
	/// Subject identifier (`sub`), when present.
	#[serde(default)]
	pub sub: Option<String>,
}
impl TokenClaims {
	/// Decodes the claims segment of a `header.claims.signature` credential.
	pub fn decode(credential: &str) -> Result<Self, TokenParseError> {
		let mut segments = credential.split('.');
		let (Some(_header), Some(claims), Some(_signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(TokenParseError::MalformedCredential);
		};
		let bytes = URL_SAFE_NO_PAD.decode(claims)?;

		Ok(serde_json::from_slice(&bytes)?)
	}

	/// Expiry instant of the credential.
	pub fn expires_at(&self) -> Result<OffsetDateTime, TokenParseError> {
		Ok(OffsetDateTime::from_unix_timestamp(self.exp)?)
	}

	/// Issued-at instant of the credential, when the claim is present.
	pub fn issued_at(&self) -> Result<Option<OffsetDateTime>, TokenParseError> {
		self.iat.map(|iat| OffsetDateTime::from_unix_timestamp(iat).map_err(Into::into)).transpose()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros;
	// self
	use super::*;

	fn encode_credential(claims: serde_json::Value) -> String {
		let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
		let body = URL_SAFE_NO_PAD.encode(claims.to_string().as_bytes());

		format!("{header}.{body}.fixture-signature")
	}

	#[test]
	fn decodes_expiry_and_subject_claims() {
		let expires = macros::datetime!(2025-06-01 12:00 UTC);
		let credential =
			encode_credential(json!({ "exp": expires.unix_timestamp(), "sub": "user-1" }));
		let claims = TokenClaims::decode(&credential)
			.expect("Well-formed credential fixture should decode.");

		assert_eq!(claims.expires_at().expect("Expiry should be representable."), expires);
		assert_eq!(claims.sub.as_deref(), Some("user-1"));
		assert!(claims.issued_at().expect("Absent iat should decode as None.").is_none());
	}

	#[test]
	fn rejects_credentials_without_three_segments() {
		let err = TokenClaims::decode("only-one-segment")
			.expect_err("Single-segment credential must be rejected.");

		assert!(matches!(err, TokenParseError::MalformedCredential));
		assert!(TokenClaims::decode("a.b").is_err());
		assert!(TokenClaims::decode("a.b.c.d").is_err());
	}

	#[test]
	fn rejects_claims_that_are_not_json() {
		let garbage = format!("header.{}.sig", URL_SAFE_NO_PAD.encode(b"not json"));
		let err = TokenClaims::decode(&garbage)
			.expect_err("Non-JSON claims segment must be rejected.");

		assert!(matches!(err, TokenParseError::ClaimsJson(_)));
	}

	#[test]
	fn rejects_missing_expiry_claim() {
		let credential = encode_credential(json!({ "sub": "user-1" }));

		assert!(matches!(
			TokenClaims::decode(&credential),
			Err(TokenParseError::ClaimsJson(_)),
		));
	}
}
