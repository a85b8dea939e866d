//! Pipeline-level error types shared across limits, lifecycle, and transport layers.
//!
//! Every failure surfaced to callers is one of the tagged [`Error`] kinds below;
//! callers dispatch on the tag, never on source-type chains. Wait-bearing kinds
//! ([`Error::RateLimited`], [`Error::LockedOut`]) expose their countdown values
//! as plain fields so callers can render them directly.

// self
use crate::_prelude::*;

/// Pipeline-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical pipeline error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Bad caller input; never retried.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Transport or server failure; retried with backoff per policy.
	#[error(transparent)]
	Network(#[from] NetworkError),
	/// Response payload could not be decoded; never retried.
	#[error(transparent)]
	Decode(#[from] DecodeError),

	/// Sliding-window admission rejected the call.
	#[error("Rate limit exceeded; retry in {retry_after_secs} seconds.")]
	RateLimited {
		/// Whole seconds the caller should wait before retrying.
		retry_after_secs: u64,
	},
	/// Too many failed login attempts for this identifier.
	#[error("Login locked out; retry in {remaining_minutes} minutes.")]
	LockedOut {
		/// Whole minutes remaining in the lockout window.
		remaining_minutes: u64,
	},
	/// Stored credentials are missing, expired, or failed to refresh; the local
	/// session has been cleared and the caller must sign in again.
	#[error("Session credentials expired; sign in again.")]
	TokenExpired,
	/// Service rejected the request with a non-2xx status below 500.
	#[error("Service rejected the request ({status}): {message}.")]
	Rejected {
		/// HTTP status code returned by the service.
		status: u16,
		/// Service-supplied error text, or a trimmed body preview.
		message: String,
	},
}

/// Caller-input validation failures, tagged with the offending field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum ValidationError {
	/// A required field was empty or absent.
	#[error("The {field} field is required.")]
	MissingField {
		/// Name of the missing field.
		field: &'static str,
	},
	/// A field was present but malformed.
	#[error("The {field} field is invalid: {reason}.")]
	InvalidField {
		/// Name of the rejected field.
		field: &'static str,
		/// Why the value was rejected.
		reason: &'static str,
	},
}

/// Transport and server failures; the only kinds the retry policy re-attempts.
#[derive(Debug, ThisError)]
pub enum NetworkError {
	/// Service responded with a 5xx status.
	#[error("Service returned {status}: {message}.")]
	Status {
		/// HTTP status code (500 and above).
		status: u16,
		/// Service-supplied error text, or a trimmed body preview.
		message: String,
	},
	/// Transport-level failure while reaching the service.
	#[error(transparent)]
	Transport(#[from] TransportError),
}

/// Transport-level failures (network, timeout, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the service.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The transport gave up waiting for the service.
	#[error("Request timed out while calling the service.")]
	Timeout,
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the service.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::network(e) }
	}
}

/// Payload decoding failures for response bodies and signed credentials.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Response declared JSON content but the body failed to parse.
	#[error("Response declared JSON but the body failed to parse.")]
	Body {
		/// Structured parsing failure with path context.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code of the offending response.
		status: u16,
	},
	/// A decoded JSON payload did not match the expected shape.
	#[error("Response payload is missing required fields.")]
	Payload {
		/// Structured parsing failure with path context.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
	},
	/// A signed credential returned by the service could not be decoded.
	#[error(transparent)]
	Credential(#[from] crate::auth::TokenParseError),
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "storage unreachable".into() };
		let error = Error::from(store_error);

		assert!(matches!(error, Error::Storage(_)));
		assert!(error.to_string().contains("storage unreachable"));
		assert!(StdError::source(&error).is_some());
	}

	#[test]
	fn wait_bearing_errors_render_their_countdown() {
		let rate = Error::RateLimited { retry_after_secs: 30 };
		let lockout = Error::LockedOut { remaining_minutes: 12 };

		assert!(rate.to_string().contains("30 seconds"));
		assert!(lockout.to_string().contains("12 minutes"));
	}

	#[test]
	fn validation_errors_carry_their_field_tag() {
		let missing = ValidationError::MissingField { field: "identifier" };
		let invalid = ValidationError::InvalidField { field: "password", reason: "too short" };

		assert!(missing.to_string().contains("identifier"));
		assert!(invalid.to_string().contains("password"));
		assert!(invalid.to_string().contains("too short"));
	}
}
