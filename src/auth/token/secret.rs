//! Redacting wrappers for issued token strings and signing key material.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, auth::TokenKind, error::ConfigError};

/// Prefix marking key material that should be base64-decoded before use.
pub const BASE64_SECRET_PREFIX: &str = "base64:";

/// Redacted token string wrapper keeping issued credentials out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new token string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// HMAC key bytes for one token kind.
///
/// Built once at start-up and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Arc<[u8]>);
impl SigningKey {
	/// Interprets raw configuration material as key bytes.
	///
	/// Values starting with [`BASE64_SECRET_PREFIX`] are decoded as standard base64; anything else
	/// is used verbatim. Empty material (before or after decoding) is rejected.
	pub fn from_material(kind: TokenKind, material: &str) -> Result<Self, ConfigError> {
		let bytes = match material.strip_prefix(BASE64_SECRET_PREFIX) {
			Some(encoded) => STANDARD
				.decode(encoded.trim())
				.map_err(|source| ConfigError::InvalidSecretEncoding { kind, source })?,
			None => material.as_bytes().to_vec(),
		};

		Self::from_bytes(kind, bytes)
	}

	/// Wraps raw key bytes, rejecting empty input.
	pub fn from_bytes(kind: TokenKind, bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
		let bytes = bytes.into();

		if bytes.is_empty() {
			return Err(ConfigError::MissingSecret { kind });
		}

		Ok(Self(bytes.into()))
	}

	/// Returns the key bytes. Callers must avoid logging them.
	pub fn expose(&self) -> &[u8] {
		&self.0
	}
}
impl Debug for SigningKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningKey").field(&"<redacted>").finish()
	}
}
