//! Wire-level request/response primitives and the transport seam.
//!
//! The pipeline's only dependency on an HTTP stack is the [`Transport`] trait.
//! Implementations execute exactly one request per [`dispatch`](Transport::dispatch)
//! call: retries, credential injection, and response classification all live in
//! the pipeline, never in the transport.

// std
use std::ops::Deref;
// crates.io
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

const BODY_PREVIEW_LIMIT: usize = 256;

/// Well-known header names used by the pipeline.
pub mod header {
	/// Bearer credential header.
	pub const AUTHORIZATION: &str = "authorization";
	/// Media type of the request or response body.
	pub const CONTENT_TYPE: &str = "content-type";
	/// Freshness tag attached to state-changing requests.
	pub const CSRF_TOKEN: &str = "x-csrf-token";
	/// Server-advised wait before retrying, in seconds or as an HTTP date.
	pub const RETRY_AFTER: &str = "retry-after";
}

/// HTTP methods the pipeline issues.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// Read-only request.
	#[default]
	Get,
	/// State-changing create/submit request.
	Post,
	/// State-changing replace request.
	Put,
	/// State-changing partial-update request.
	Patch,
	/// State-changing removal request.
	Delete,
}
impl Method {
	/// Canonical uppercase method name.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
		}
	}

	/// State-changing methods carry the freshness tag.
	pub const fn is_mutating(self) -> bool {
		!matches!(self, Method::Get)
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
#[cfg(feature = "reqwest")]
impl From<Method> for reqwest::Method {
	fn from(method: Method) -> Self {
		match method {
			Method::Get => reqwest::Method::GET,
			Method::Post => reqwest::Method::POST,
			Method::Put => reqwest::Method::PUT,
			Method::Patch => reqwest::Method::PATCH,
			Method::Delete => reqwest::Method::DELETE,
		}
	}
}

/// Outbound request handed to the transport.
#[derive(Clone, Debug)]
pub struct WireRequest {
	/// HTTP method.
	pub method: Method,
	/// Fully resolved request URL.
	pub url: Url,
	/// Headers in insertion order; names are matched case-insensitively.
	pub headers: Vec<(String, String)>,
	/// JSON body, serialized by the transport when present.
	pub body: Option<serde_json::Value>,
}
impl WireRequest {
	/// Creates a request with no headers or body.
	pub fn new(method: Method, url: Url) -> Self {
		Self { method, url, headers: Vec::new(), body: None }
	}

	/// Appends a header.
	pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}

	/// Sets the JSON body.
	pub fn with_body(mut self, body: serde_json::Value) -> Self {
		self.body = Some(body);

		self
	}

	/// Returns the first header whose name matches case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}
}

/// Response surfaced by the transport before classification.
#[derive(Clone, Debug)]
pub struct WireResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers; names are matched case-insensitively.
	pub headers: Vec<(String, String)>,
	/// Raw response body.
	pub body: String,
}
impl WireResponse {
	/// Returns the first header whose name matches case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		find_header(&self.headers, name)
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` when the response declares a JSON body.
	pub fn is_json(&self) -> bool {
		self.header(header::CONTENT_TYPE).is_some_and(|value| value.contains("json"))
	}

	/// Parses the `Retry-After` header as integer seconds or an RFC 2822 date.
	pub fn retry_after(&self) -> Option<Duration> {
		let raw = self.header(header::RETRY_AFTER)?.trim();

		if let Ok(secs) = raw.parse::<u64>() {
			return Some(Duration::seconds(secs as i64));
		}
		if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
			let delta = moment - OffsetDateTime::now_utc();

			if delta.is_positive() {
				return Some(delta);
			}
		}

		None
	}

	/// Pulls the service-supplied error text out of a failure body.
	///
	/// JSON bodies are probed for `error` then `message` string fields; other
	/// bodies fall back to a trimmed preview capped at a fixed length.
	pub fn error_message(&self) -> String {
		if self.is_json() {
			if let Ok(value) = serde_json::from_str::<serde_json::Value>(&self.body) {
				for field in ["error", "message"] {
					if let Some(text) = value.get(field).and_then(serde_json::Value::as_str) {
						return text.to_owned();
					}
				}
			}
		}

		let preview: String = self.body.trim().chars().take(BODY_PREVIEW_LIMIT).collect();

		if preview.is_empty() { format!("HTTP {}", self.status) } else { preview }
	}

	/// Decodes the body as JSON into `T`, reporting the failing path on error.
	pub fn decode_json<T>(&self) -> Result<T>
	where
		T: serde::de::DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_str(&self.body);

		serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
			crate::error::DecodeError::Body { source, status: self.status }.into()
		})
	}
}

/// Boxed future returned by [`Transport::dispatch`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<WireResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to carry pipeline traffic.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared
/// behind `Arc` across tasks. They perform no retries and inject no
/// credentials of their own; timeouts are their responsibility and surface as
/// [`TransportError::Timeout`].
pub trait Transport
where
	Self: 'static + Send + Sync,
{
	/// Executes one HTTP request and returns the raw response.
	///
	/// Non-2xx statuses are not errors at this layer; they come back as
	/// [`WireResponse`] values for the pipeline to classify.
	fn dispatch(&self, request: WireRequest) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] implementing [`Transport`].
///
/// The pipeline owns all retry behavior, so configure custom clients without
/// automatic retries. Request timeouts belong on the client builder and show
/// up as [`TransportError::Timeout`].
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Wraps an existing [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Transport for ReqwestTransport {
	fn dispatch(&self, request: WireRequest) -> TransportFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let mut builder = client.request(request.method.into(), request.url.clone());

			for (name, value) in &request.headers {
				builder = builder.header(name, value);
			}
			if let Some(body) = &request.body {
				let serialized =
					serde_json::to_vec(body).map_err(TransportError::network)?;

				builder = builder
					.header(header::CONTENT_TYPE, "application/json")
					.body(serialized);
			}

			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let headers = response
				.headers()
				.iter()
				.filter_map(|(name, value)| {
					value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
				})
				.collect();
			let body = response.text().await.map_err(TransportError::from)?;

			Ok(WireResponse { status, headers, body })
		})
	}
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
	headers
		.iter()
		.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
		.map(|(_, value)| value.as_str())
}
