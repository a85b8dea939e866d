//! Session models: account profiles, login-state snapshots, and wire payloads.

// self
use crate::_prelude::*;

/// Account profile returned by the service and cached locally.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
	/// Service-assigned account identifier.
	pub id: String,
	/// Login identifier (usually an email address or username).
	pub identifier: String,
	/// Optional human-readable display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub display_name: Option<String>,
}

/// Denormalized login-state projection kept alongside the token records.
///
/// Rewritten atomically with the token records so the snapshot and the
/// credentials never disagree; reads are cheap and never trigger network
/// activity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSnapshot {
	/// Whether this installation currently holds a session.
	pub logged_in: bool,
	/// Cached profile of the signed-in account, if any.
	pub user: Option<UserRecord>,
	/// Instant of the last snapshot rewrite.
	pub last_update: OffsetDateTime,
}
impl AuthSnapshot {
	/// Snapshot representing a signed-in account.
	pub fn for_user(user: UserRecord, instant: OffsetDateTime) -> Self {
		Self { logged_in: true, user: Some(user), last_update: instant }
	}

	/// Snapshot representing a signed-out installation.
	pub fn logged_out(instant: OffsetDateTime) -> Self {
		Self { logged_in: false, user: None, last_update: instant }
	}
}

/// Caller-facing result of a successful login or registration.
#[derive(Clone, Debug)]
pub struct AuthSession {
	/// Profile of the account that signed in.
	pub user: UserRecord,
	/// Expiry instant of the issued access token.
	pub expires_at: OffsetDateTime,
}

/// Wire shape of the service's session-issuing responses (login, register).
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SessionPayload {
	pub token: String,
	pub refresh_token: String,
	pub user: UserRecord,
}

/// Wire shape of the service's refresh responses; the rotated refresh secret
/// is optional and the stored one is carried forward when absent.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RotationPayload {
	pub token: String,
	#[serde(default)]
	pub refresh_token: Option<String>,
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	use time::macros;
	// self
	use super::*;

	fn user_fixture() -> UserRecord {
		UserRecord {
			id: "user-1".into(),
			identifier: "user@example.com".into(),
			display_name: Some("User One".into()),
		}
	}

	#[test]
	fn snapshots_track_login_state() {
		let instant = macros::datetime!(2025-06-01 12:00 UTC);
		let signed_in = AuthSnapshot::for_user(user_fixture(), instant);
		let signed_out = AuthSnapshot::logged_out(instant);

		assert!(signed_in.logged_in);
		assert_eq!(signed_in.user.as_ref().map(|u| u.id.as_str()), Some("user-1"));
		assert!(!signed_out.logged_in);
		assert!(signed_out.user.is_none());
	}

	#[test]
	fn session_payload_uses_camel_case_wire_names() {
		let payload: SessionPayload = serde_json::from_value(json!({
			"token": "header.claims.sig",
			"refreshToken": "refresh-1",
			"user": { "id": "user-1", "identifier": "user@example.com" },
		}))
		.expect("Session payload fixture should deserialize.");

		assert_eq!(payload.refresh_token, "refresh-1");
		assert_eq!(payload.user.identifier, "user@example.com");
		assert!(payload.user.display_name.is_none());
	}

	#[test]
	fn rotation_payload_tolerates_missing_refresh_secret() {
		let payload: RotationPayload =
			serde_json::from_value(json!({ "token": "header.claims.sig" }))
				.expect("Rotation payload fixture should deserialize.");

		assert!(payload.refresh_token.is_none());
	}
}
