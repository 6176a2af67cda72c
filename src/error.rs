//! Crate-level error types shared by the token authority, limiter, and configuration loaders.

// self
use crate::{_prelude::*, auth::TokenKind};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by public APIs that can fail for more than one reason.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; fatal at start-up.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Presented token was rejected.
	#[error(transparent)]
	Token(#[from] TokenError),
}

/// Configuration and start-up failures.
///
/// None of these are per-request conditions: a process that hits one should refuse to boot.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A signing secret is absent or empty.
	#[error("The {kind} token signing secret is missing or empty.")]
	MissingSecret {
		/// Token kind whose secret is missing.
		kind: TokenKind,
	},
	/// Access and refresh tokens would be signed with the same key.
	#[error("Access and refresh tokens must be signed with distinct secrets.")]
	SharedSecret,
	/// A `base64:` prefixed secret could not be decoded.
	#[error("The {kind} token signing secret is not valid base64.")]
	InvalidSecretEncoding {
		/// Token kind whose secret failed to decode.
		kind: TokenKind,
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Token lifetime must be strictly positive.
	#[error("The {kind} token lifetime must be positive.")]
	NonPositiveTtl {
		/// Token kind with the offending lifetime.
		kind: TokenKind,
	},
	/// Token lifetime exceeds [`TokenKind::MAX_TTL`].
	#[error("The {kind} token lifetime exceeds the supported maximum.")]
	TtlOutOfRange {
		/// Token kind with the offending lifetime.
		kind: TokenKind,
	},
	/// Limiter capacity of zero would reject every request.
	#[error("Admission capacity must be at least one request.")]
	ZeroCapacity,
	/// Limiter window must be non-zero.
	#[error("Admission window must be longer than zero.")]
	ZeroWindow,
	/// Background sweep period must be non-zero when enabled.
	#[error("Admission sweep interval must be longer than zero.")]
	ZeroSweepInterval,
	/// The limiter was built outside an async runtime and cannot schedule releases.
	#[error("Admission limiter requires a running tokio runtime.")]
	MissingRuntime {
		/// Underlying runtime lookup failure.
		#[source]
		source: tokio::runtime::TryCurrentError,
	},
	/// A required environment variable is absent or not unicode.
	#[error("Environment variable `{name}` is missing or invalid.")]
	Env {
		/// Variable name.
		name: &'static str,
		/// Underlying lookup failure.
		#[source]
		source: std::env::VarError,
	},
	/// An environment variable holds a value that cannot be parsed.
	#[error("Environment variable `{name}` holds an unparsable value: {value}.")]
	EnvValue {
		/// Variable name.
		name: &'static str,
		/// Raw value as read from the environment.
		value: String,
	},
	/// Settings document is not valid JSON or does not match the expected shape.
	#[error("Settings document is invalid.")]
	Settings(#[from] serde_path_to_error::Error<serde_json::Error>),
	/// Claims could not be signed.
	#[error("Unable to sign {kind} token claims.")]
	Signing {
		/// Token kind being signed.
		kind: TokenKind,
		/// Underlying encoder failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}

/// Reasons a presented token is not accepted.
///
/// All variants mean "unauthenticated" to the caller; [`TokenError::Expired`] is kept apart so
/// clients can be told to refresh rather than to log in again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ThisError)]
pub enum TokenError {
	/// Token does not parse into header, claims, and signature segments.
	#[error("Token is malformed.")]
	Malformed,
	/// Signature does not match the verifier's secret.
	#[error("Token signature is invalid.")]
	InvalidSignature,
	/// Token is authentic but past its expiry instant.
	#[error("Token has expired.")]
	Expired,
	/// Token is authentic but its subject is not a valid identity.
	#[error("Token subject is not a valid identity.")]
	IdentityMalformed,
}
impl TokenError {
	/// Returns `true` when the client should refresh rather than re-authenticate.
	pub fn is_expired(self) -> bool {
		matches!(self, Self::Expired)
	}

	/// Stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Malformed => "malformed",
			Self::InvalidSignature => "invalid_signature",
			Self::Expired => "expired",
			Self::IdentityMalformed => "identity_malformed",
		}
	}
}
impl From<jsonwebtoken::errors::Error> for TokenError {
	fn from(e: jsonwebtoken::errors::Error) -> Self {
		// crates.io
		use jsonwebtoken::errors::ErrorKind;

		match e.kind() {
			ErrorKind::InvalidSignature
			| ErrorKind::InvalidAlgorithm
			| ErrorKind::InvalidAlgorithmName
			| ErrorKind::InvalidKeyFormat => Self::InvalidSignature,
			ErrorKind::ExpiredSignature => Self::Expired,
			_ => Self::Malformed,
		}
	}
}
