//! Strongly typed identifiers and identifier-derived values used across the pipeline.

// std
use std::{borrow::Borrow, ops::Deref};
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

macro_rules! def_id {
	($name:ident, $doc:literal, $kind:literal) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new identifier after validation.
			pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
				let view = value.as_ref();

				validate_view($kind, view)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = IdentifierError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = IdentifierError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const IDENTIFIER_MAX_LEN: usize = 128;
const INSTALL_ID_LEN: usize = 16;

/// Error returned when identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("{kind} identifier cannot be empty.")]
	Empty {
		/// Kind of identifier (install, service).
		kind: &'static str,
	},
	/// The identifier contains whitespace characters.
	#[error("{kind} identifier contains whitespace.")]
	ContainsWhitespace {
		/// Kind of identifier (install, service).
		kind: &'static str,
	},
	/// The identifier exceeded the allowed character count.
	#[error("{kind} identifier exceeds {max} characters.")]
	TooLong {
		/// Kind of identifier (install, service).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_id! { InstallId, "Stable identifier for one installation of the client.", "Install" }
def_id! { ServiceId, "Identifier for a remote authentication service descriptor.", "Service" }

impl InstallId {
	/// Generates a fresh random install identifier.
	///
	/// Callers should persist the result; the freshness tag attached to
	/// state-changing requests is derived from it.
	pub fn generate() -> Self {
		Self(random_string(INSTALL_ID_LEN))
	}
}

fn validate_view(kind: &'static str, view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty { kind });
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace { kind });
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { kind, max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

/// One-way digest of a login identifier.
///
/// Lockout records are keyed by this digest so the raw identifier never
/// reaches storage. Identifiers are normalized (trimmed, lowercased) before
/// hashing so differently-cased logins share one record. The digest is a
/// base64 (no padding) SHA-256 of the normalized identifier.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdentifierHash(String);
impl IdentifierHash {
	/// Digests a raw login identifier.
	pub fn digest(identifier: &str) -> Self {
		let normalized = identifier.trim().to_lowercase();
		let mut hasher = Sha256::new();

		hasher.update(normalized.as_bytes());

		Self(STANDARD_NO_PAD.encode(hasher.finalize()))
	}

	/// Returns the digest string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for IdentifierHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("IdentifierHash").field(&self.0).finish()
	}
}
impl Display for IdentifierHash {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Best-effort freshness marker attached to state-changing requests.
///
/// Derived from a non-cryptographic hash of the install identifier and the
/// current instant. It only marks a request as freshly minted by this
/// installation; it is not a server-verified anti-forgery credential and
/// carries no security guarantee.
#[derive(Clone, PartialEq, Eq)]
pub struct FreshnessTag(String);
impl FreshnessTag {
	/// Mints a tag for the provided install at the provided instant.
	pub fn mint(install: &InstallId, instant: OffsetDateTime) -> Self {
		let mut hasher = DefaultHasher::new();

		install.as_ref().hash(&mut hasher);
		instant.unix_timestamp_nanos().hash(&mut hasher);

		Self(format!("{:016x}", hasher.finish()))
	}

	/// Returns the tag string.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for FreshnessTag {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("FreshnessTag").field(&self.0).finish()
	}
}
impl Display for FreshnessTag {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
