//! Caller-facing account operations: login, registration, logout, and status.
//!
//! Login and registration layer the per-identifier lockout guard beneath the
//! shared request path: the guard is consulted before any network activity,
//! only service rejections consume its budget, and a committed session clears
//! it. Logout notifies the service on a best-effort basis and always clears
//! local credentials.

// crates.io
use serde_json::json;
// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthSession, AuthSnapshot, IdentifierHash, SessionPayload, TokenSecret},
	error::{DecodeError, ValidationError},
	http::Transport,
	obs::{self, OpKind, OpOutcome, OpSpan},
	pipeline::{ParsedResponse, Pipeline, RequestOptions},
};

/// Minimum accepted password length for new accounts.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Caller-supplied details for a registration request.
#[derive(Clone)]
pub struct NewAccount {
	/// Login identifier (usually an email address or username).
	pub identifier: String,
	/// Plaintext password, forwarded to the service over HTTPS.
	pub password: String,
	/// Optional human-readable display name.
	pub display_name: Option<String>,
}
impl NewAccount {
	/// Creates a registration request with no display name.
	pub fn new(identifier: impl Into<String>, password: impl Into<String>) -> Self {
		Self { identifier: identifier.into(), password: password.into(), display_name: None }
	}

	/// Sets the display name.
	pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
		self.display_name = Some(name.into());

		self
	}
}
impl Debug for NewAccount {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("NewAccount")
			.field("identifier", &self.identifier)
			.field("password", &"<redacted>")
			.field("display_name", &self.display_name)
			.finish()
	}
}

impl<T> Pipeline<T>
where
	T: ?Sized + Transport,
{
	/// Authenticates the identifier/password pair and commits the issued
	/// session.
	///
	/// The lockout guard is consulted before any network activity; a locked
	/// identifier fails with [`Error::LockedOut`] without touching the
	/// service. Service rejections record one lockout failure, while local
	/// denials and transport errors leave the budget untouched. A committed
	/// session clears the identifier's lockout record.
	pub async fn login(&self, identifier: &str, password: &str) -> Result<AuthSession> {
		const KIND: OpKind = OpKind::Login;

		let span = OpSpan::new(KIND, "login");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				require_field("identifier", identifier)?;
				require_field("password", password)?;

				let hash = IdentifierHash::digest(identifier);
				let body = json!({
					"identifier": identifier.trim(),
					"password": password,
				});

				self.submit_credentials(&self.descriptor.routes.login, body, &hash).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Registers a new account and commits the issued session.
	///
	/// Shares the login lockout guard: repeatedly rejected registrations for
	/// one identifier lock it out the same way failed logins do.
	pub async fn register(&self, account: NewAccount) -> Result<AuthSession> {
		const KIND: OpKind = OpKind::Register;

		let span = OpSpan::new(KIND, "register");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				validate_new_account(&account)?;

				let hash = IdentifierHash::digest(&account.identifier);
				let mut body = json!({
					"identifier": account.identifier.trim(),
					"password": account.password,
				});

				if let Some(name) = &account.display_name {
					body["displayName"] = json!(name);
				}

				self.submit_credentials(&self.descriptor.routes.register, body, &hash).await
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Signs out: notifies the service on a best-effort basis, then clears
	/// local credentials unconditionally.
	///
	/// A failed server notify is logged and never surfaces; the returned
	/// error, if any, comes from clearing local state.
	pub async fn logout(&self) -> Result<()> {
		const KIND: OpKind = OpKind::Logout;

		let span = OpSpan::new(KIND, "logout");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Err(error) = self
					.send(&self.descriptor.routes.logout, RequestOptions::post(json!({})))
					.await
				{
					// The local sign-out below must land either way.
					obs::record_detached_failure("logout_notify", &error);
				}

				self.vault.clear().await?;

				Ok(())
			})
			.await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	/// Reads the cached login-state snapshot; no network activity.
	///
	/// A missing snapshot reads as signed out with the current instant as its
	/// last update.
	pub async fn check_auth_status(&self) -> Result<AuthSnapshot> {
		let span = OpSpan::new(OpKind::Status, "check_auth_status");

		span.instrument(async move {
			let snapshot = self.vault.snapshot().await?;

			Ok(snapshot.unwrap_or_else(|| AuthSnapshot::logged_out(OffsetDateTime::now_utc())))
		})
		.await
	}

	/// Sends an authenticated request under the standard pipeline treatment.
	///
	/// This is the observed entry point for arbitrary service endpoints; the
	/// admission, credential, freshness, classification, and retry behavior
	/// all come from [`Pipeline::send`].
	pub async fn secure_request(
		&self,
		endpoint: &str,
		options: RequestOptions,
	) -> Result<ParsedResponse> {
		const KIND: OpKind = OpKind::Request;

		let span = OpSpan::new(KIND, "secure_request");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.send(endpoint, options)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn submit_credentials(
		&self,
		route: &str,
		body: serde_json::Value,
		hash: &IdentifierHash,
	) -> Result<AuthSession> {
		self.lockout.check(hash).await?;

		match self.send(route, RequestOptions::post(body).skip_auth()).await {
			Ok(response) => {
				let session = self.commit_session(&response).await?;

				self.lockout.clear(hash).await?;

				Ok(session)
			},
			Err(error) => {
				if matches!(error, Error::Rejected { .. }) {
					// Only service rejections consume lockout budget; local
					// denials and transport blips do not.
					let _ = self.lockout.record_failure(hash).await;
				}

				Err(error)
			},
		}
	}

	async fn commit_session(&self, response: &ParsedResponse) -> Result<AuthSession> {
		let now = OffsetDateTime::now_utc();
		let payload: SessionPayload = response.decode()?;
		let token = AccessToken::from_signed(payload.token, now).map_err(DecodeError::Credential)?;
		let refresh = TokenSecret::new(payload.refresh_token);

		self.vault.store_session(&payload.user, &token, &refresh, now).await?;

		Ok(AuthSession { user: payload.user, expires_at: token.expires_at })
	}
}

fn require_field(field: &'static str, value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		return Err(ValidationError::MissingField { field });
	}

	Ok(())
}

fn validate_new_account(account: &NewAccount) -> Result<(), ValidationError> {
	require_field("identifier", &account.identifier)?;
	require_field("password", &account.password)?;

	if account.identifier.trim().chars().any(char::is_whitespace) {
		return Err(ValidationError::InvalidField {
			field: "identifier",
			reason: "contains whitespace",
		});
	}
	if account.password.len() < MIN_PASSWORD_LEN {
		return Err(ValidationError::InvalidField {
			field: "password",
			reason: "below the minimum length",
		});
	}

	Ok(())
}
