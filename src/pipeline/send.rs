//! Shared request path: admission, credential injection, dispatch,
//! classification, and retries.
//!
//! Every outbound call, including the account operations and the token
//! refresh, funnels through [`Pipeline::send`]. The path is fixed: per-endpoint
//! admission, bearer-token injection unless the request opts out, a freshness
//! tag on state-changing methods, one transport dispatch, response
//! classification, and transparent retries for transient failures.

// crates.io
use serde::de::DeserializeOwned;
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::FreshnessTag,
	error::{DecodeError, NetworkError},
	http::{Method, Transport, WireRequest, WireResponse, header},
	limits::rate,
	pipeline::Pipeline,
};

/// Options for a single pipeline request.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// HTTP method to dispatch with.
	pub method: Method,
	/// Optional JSON body.
	pub body: Option<Value>,
	/// Extra headers appended after the pipeline's own.
	pub headers: Vec<(String, String)>,
	/// Skips bearer-token injection; a 401 then surfaces as a plain rejection
	/// instead of clearing stored credentials.
	pub skip_auth: bool,
}
impl RequestOptions {
	/// Options for an authenticated GET.
	pub fn get() -> Self {
		Default::default()
	}

	/// Options for an authenticated POST carrying a JSON body.
	pub fn post(body: Value) -> Self {
		Self { method: Method::Post, body: Some(body), ..Default::default() }
	}

	/// Overrides the HTTP method.
	pub fn with_method(mut self, method: Method) -> Self {
		self.method = method;

		self
	}

	/// Appends one caller-supplied header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets the JSON body.
	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Marks the request as unauthenticated.
	pub fn skip_auth(mut self) -> Self {
		self.skip_auth = true;

		self
	}
}

/// Decoded body of a successful response.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
	/// Body declared and parsed as JSON.
	Json(Value),
	/// Non-JSON body returned verbatim.
	Text(String),
	/// Empty body.
	Empty,
}
impl Payload {
	/// Borrows the JSON value, if this payload is JSON.
	pub fn as_json(&self) -> Option<&Value> {
		match self {
			Self::Json(value) => Some(value),
			_ => None,
		}
	}

	/// Borrows the raw text, if this payload is text.
	pub fn as_text(&self) -> Option<&str> {
		match self {
			Self::Text(text) => Some(text),
			_ => None,
		}
	}
}

/// Successful response with its payload already classified.
#[derive(Clone, Debug)]
pub struct ParsedResponse {
	/// HTTP status code, always in the 2xx range.
	pub status: u16,
	/// Classified body.
	pub payload: Payload,
}
impl ParsedResponse {
	/// Deserializes the payload into `T`, reporting the failing path on
	/// mismatch.
	///
	/// Text payloads decode as JSON strings and empty payloads as `null`, so a
	/// shape mismatch always surfaces as a [`DecodeError`].
	pub fn decode<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let value = match &self.payload {
			Payload::Json(value) => value.clone(),
			Payload::Text(text) => Value::String(text.clone()),
			Payload::Empty => Value::Null,
		};

		Ok(serde_path_to_error::deserialize(value)
			.map_err(|source| DecodeError::Payload { source })?)
	}
}

impl<T> Pipeline<T>
where
	T: ?Sized + Transport,
{
	/// Sends one request through the full pipeline.
	///
	/// Transient transport and 5xx failures are retried with capped exponential
	/// backoff per the descriptor's policy; every other failure surfaces
	/// immediately. Each retry pays for admission again, so retries cannot
	/// sidestep the endpoint budget.
	pub async fn send(&self, endpoint: &str, options: RequestOptions) -> Result<ParsedResponse> {
		let url = self.descriptor.resolve(endpoint)?;
		let mut attempt = 0;

		loop {
			match self.attempt_once(endpoint, &url, &options).await {
				Ok(response) => return Ok(response),
				Err(error) if self.retry.should_retry(&error, attempt) => {
					let delay = self.retry.backoff_delay(attempt);

					tokio::time::sleep(delay.unsigned_abs()).await;

					attempt += 1;
				},
				Err(error) => return Err(error),
			}
		}
	}

	async fn attempt_once(
		&self,
		endpoint: &str,
		url: &Url,
		options: &RequestOptions,
	) -> Result<ParsedResponse> {
		self.limiter.admit(endpoint)?;

		let mut request = WireRequest::new(options.method, url.clone());

		if !options.skip_auth {
			let token = self.tokens.valid_token().await.ok_or(Error::TokenExpired)?;

			request = request.with_header(header::AUTHORIZATION, token.secret.bearer());
		}
		if options.method.is_mutating() {
			let tag = FreshnessTag::mint(&self.install_id, OffsetDateTime::now_utc());

			request = request.with_header(header::CSRF_TOKEN, tag.as_str());
		}
		for (name, value) in &options.headers {
			request = request.with_header(name.clone(), value.clone());
		}
		if let Some(body) = &options.body {
			request = request.with_body(body.clone());
		}

		let response = self.transport.dispatch(request).await.map_err(NetworkError::Transport)?;

		self.classify(response, options).await
	}

	async fn classify(
		&self,
		response: WireResponse,
		options: &RequestOptions,
	) -> Result<ParsedResponse> {
		match response.status {
			429 => {
				let wait =
					response.retry_after().unwrap_or(self.descriptor.limits.default_retry_after);

				Err(Error::RateLimited { retry_after_secs: rate::ceil_secs(wait) })
			},
			401 if !options.skip_auth => {
				// The service no longer honors these credentials; keeping them
				// would wedge every subsequent call behind the same 401.
				self.vault.clear().await?;

				Err(Error::TokenExpired)
			},
			status if status >= 500 =>
				Err(NetworkError::Status { status, message: response.error_message() }.into()),
			status if !response.is_success() =>
				Err(Error::Rejected { status, message: response.error_message() }),
			_ => parse_success(response),
		}
	}
}

fn parse_success(response: WireResponse) -> Result<ParsedResponse> {
	let status = response.status;
	let payload = if response.body.trim().is_empty() {
		Payload::Empty
	} else if response.is_json() {
		Payload::Json(response.decode_json()?)
	} else {
		Payload::Text(response.body)
	};

	Ok(ParsedResponse { status, payload })
}
