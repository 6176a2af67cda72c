//! Request gate composing admission limiting and access-token verification.
//!
//! The gate is framework-agnostic: the HTTP layer copies the few request attributes it needs
//! into a [`RequestMeta`] and maps a [`GateRejection`] onto its own response type using
//! [`GateRejection::status_code`] and [`GateRejection::message`].

// std
use std::net::{IpAddr, SocketAddr};
// self
use crate::{
	_prelude::*,
	auth::{AuthorityConfig, Claims, TokenAuthority},
	config::Settings,
	error::{ConfigError, TokenError},
	limit::{Admission, AdmissionLimiter, LimiterConfig},
};

/// Bearer scheme expected in the `Authorization` header.
pub const BEARER_SCHEME: &str = "Bearer";

/// Request attributes the gate inspects.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestMeta {
	/// Raw `X-Forwarded-For` header value, if present.
	pub forwarded_for: Option<String>,
	/// Raw `X-Real-IP` header value, if present.
	pub real_ip: Option<String>,
	/// Peer address of the connection, if known.
	pub remote_addr: Option<String>,
	/// Raw `Authorization` header value, if present.
	pub authorization: Option<String>,
}
impl RequestMeta {
	/// Creates metadata for a direct connection from `remote_addr`.
	pub fn from_remote(remote_addr: impl Into<String>) -> Self {
		Self { remote_addr: Some(remote_addr.into()), ..Default::default() }
	}

	/// Sets the `X-Forwarded-For` header value.
	pub fn with_forwarded_for(mut self, value: impl Into<String>) -> Self {
		self.forwarded_for = Some(value.into());

		self
	}

	/// Sets the `X-Real-IP` header value.
	pub fn with_real_ip(mut self, value: impl Into<String>) -> Self {
		self.real_ip = Some(value.into());

		self
	}

	/// Sets the `Authorization` header value.
	pub fn with_authorization(mut self, value: impl Into<String>) -> Self {
		self.authorization = Some(value.into());

		self
	}

	/// Sets `Authorization: Bearer <token>`.
	pub fn with_bearer(self, token: impl AsRef<str>) -> Self {
		let header = format!("{BEARER_SCHEME} {}", token.as_ref());

		self.with_authorization(header)
	}

	/// Client key used for admission limiting.
	pub fn client_key(&self) -> String {
		client_key(
			self.forwarded_for.as_deref(),
			self.real_ip.as_deref(),
			self.remote_addr.as_deref(),
		)
	}
}

/// Why the gate refused a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
pub enum GateRejection {
	/// The client exceeded its admission capacity.
	#[error("Too many requests, slow down.")]
	TooManyRequests,
	/// No `Authorization` header was supplied.
	#[error("Missing token.")]
	MissingToken,
	/// The `Authorization` header is not `Bearer <token>`.
	#[error("Invalid token format.")]
	InvalidFormat,
	/// The bearer token failed verification.
	#[error("Invalid token.")]
	Unauthenticated(#[source] TokenError),
}
impl GateRejection {
	/// HTTP status code the caller should answer with.
	pub fn status_code(self) -> u16 {
		match self {
			Self::TooManyRequests => 429,
			Self::MissingToken | Self::InvalidFormat | Self::Unauthenticated(_) => 401,
		}
	}

	/// Client-facing message; never reveals which verification step failed beyond expiry.
	pub fn message(self) -> &'static str {
		match self {
			Self::TooManyRequests => "Too many requests, slow down",
			Self::MissingToken => "Missing token",
			Self::InvalidFormat => "Invalid token format",
			Self::Unauthenticated(TokenError::Expired) => "Token expired",
			Self::Unauthenticated(_) => "Invalid token",
		}
	}
}
impl From<TokenError> for GateRejection {
	fn from(e: TokenError) -> Self {
		Self::Unauthenticated(e)
	}
}

/// Limiter plus authority, built once at start-up and shared with request handlers.
#[derive(Clone, Debug)]
pub struct Gate {
	/// Admission limiter consulted for every request.
	pub limiter: AdmissionLimiter,
	/// Token authority used for protected routes and token endpoints.
	pub authority: Arc<TokenAuthority>,
}
impl Gate {
	/// Wraps already-built components.
	pub fn new(limiter: AdmissionLimiter, authority: impl Into<Arc<TokenAuthority>>) -> Self {
		Self { limiter, authority: authority.into() }
	}

	/// Builds both components from their configurations.
	///
	/// Must be called inside a tokio runtime.
	pub fn from_configs(
		authority: AuthorityConfig,
		limiter: LimiterConfig,
	) -> Result<Self, ConfigError> {
		Ok(Self::new(AdmissionLimiter::new(limiter)?, TokenAuthority::new(authority)?))
	}

	/// Builds both components from a settings document.
	pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
		Self::from_configs(settings.authority_config(), settings.limiter_config())
	}

	/// Admission check for public endpoints (register, login, token refresh).
	pub fn admit_public(&self, request: &RequestMeta) -> Result<(), GateRejection> {
		match self.limiter.admit(&request.client_key()) {
			Admission::Accepted => Ok(()),
			Admission::Rejected => Err(GateRejection::TooManyRequests),
		}
	}

	/// Admission check plus access-token verification for protected endpoints.
	pub fn admit_request(&self, request: &RequestMeta) -> Result<Claims, GateRejection> {
		self.admit_request_at(request, OffsetDateTime::now_utc())
	}

	/// Same as [`Gate::admit_request`] with an explicit verification instant.
	pub fn admit_request_at(
		&self,
		request: &RequestMeta,
		now: OffsetDateTime,
	) -> Result<Claims, GateRejection> {
		self.admit_public(request)?;

		let token = bearer_token(request.authorization.as_deref())?;

		Ok(self.authority.verify_access_at(token, now)?)
	}
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, GateRejection> {
	let header = header.map(str::trim).filter(|value| !value.is_empty());
	let Some(header) = header else {
		return Err(GateRejection::MissingToken);
	};
	let mut parts = header.split(' ');

	match (parts.next(), parts.next(), parts.next()) {
		(Some(BEARER_SCHEME), Some(token), None) if !token.is_empty() => Ok(token),
		_ => Err(GateRejection::InvalidFormat),
	}
}

/// Derives the admission key for a request.
///
/// Preference order: first entry of `X-Forwarded-For`, then `X-Real-IP`, then the peer address
/// with its port stripped. Unparsable peer addresses are used verbatim; a request with no
/// address at all shares the `"unknown"` key.
pub fn client_key(
	forwarded_for: Option<&str>,
	real_ip: Option<&str>,
	remote_addr: Option<&str>,
) -> String {
	let forwarded = forwarded_for
		.and_then(|value| value.split(',').next())
		.map(str::trim)
		.filter(|value| !value.is_empty());

	if let Some(ip) = forwarded {
		return ip.to_owned();
	}
	if let Some(ip) = real_ip.map(str::trim).filter(|value| !value.is_empty()) {
		return ip.to_owned();
	}

	match remote_addr.map(str::trim).filter(|value| !value.is_empty()) {
		Some(addr) => match addr.parse::<SocketAddr>() {
			Ok(socket) => socket.ip().to_string(),
			Err(_) => addr.parse::<IpAddr>().map_or_else(|_| addr.to_owned(), |ip| ip.to_string()),
		},
		None => "unknown".to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::_preludet::*;

	fn test_gate() -> Gate {
		Gate::new(test_limiter(), test_authority())
	}

	#[test]
	fn client_key_prefers_proxy_headers() {
		assert_eq!(
			client_key(Some("203.0.113.7, 10.0.0.1"), Some("198.51.100.2"), Some("10.0.0.1:443")),
			"203.0.113.7"
		);
		assert_eq!(
			client_key(Some("  "), Some("198.51.100.2"), Some("10.0.0.1:443")),
			"198.51.100.2"
		);
		assert_eq!(client_key(None, None, Some("10.0.0.1:443")), "10.0.0.1");
		assert_eq!(client_key(None, None, Some("[2001:db8::1]:8080")), "2001:db8::1");
		assert_eq!(client_key(None, None, Some("unix-socket")), "unix-socket");
		assert_eq!(client_key(None, None, None), "unknown");
	}

	#[test]
	fn bearer_token_requires_the_exact_scheme() {
		assert_eq!(bearer_token(Some("Bearer abc.def.ghi")), Ok("abc.def.ghi"));
		assert_eq!(bearer_token(None), Err(GateRejection::MissingToken));
		assert_eq!(bearer_token(Some("")), Err(GateRejection::MissingToken));
		assert_eq!(bearer_token(Some("Basic dXNlcjpwYXNz")), Err(GateRejection::InvalidFormat));
		assert_eq!(bearer_token(Some("Bearer")), Err(GateRejection::InvalidFormat));
		assert_eq!(bearer_token(Some("Bearer a b")), Err(GateRejection::InvalidFormat));
		assert_eq!(bearer_token(Some("bearer abc")), Err(GateRejection::InvalidFormat));
	}

	#[test]
	fn rejections_map_to_status_codes() {
		assert_eq!(GateRejection::TooManyRequests.status_code(), 429);
		assert_eq!(GateRejection::MissingToken.status_code(), 401);
		assert_eq!(GateRejection::from(TokenError::Expired).status_code(), 401);
		assert_eq!(GateRejection::from(TokenError::Expired).message(), "Token expired");
		assert_eq!(GateRejection::from(TokenError::InvalidSignature).message(), "Invalid token");
	}

	#[tokio::test(start_paused = true)]
	async fn protected_requests_need_a_valid_access_token() {
		let gate = test_gate();
		let now = macros::datetime!(2025-03-01 12:00 UTC);
		let pair =
			gate.authority.issue_pair_at(&test_identity(), now).expect("Issuing should succeed.");
		let request =
			RequestMeta::from_remote("10.1.1.1:5000").with_bearer(pair.access_token.expose());
		let claims =
			gate.admit_request_at(&request, now).expect("Valid token should pass the gate.");

		assert_eq!(claims.subject, test_identity());
		assert_eq!(
			gate.admit_request_at(&RequestMeta::from_remote("10.1.1.2:5000"), now),
			Err(GateRejection::MissingToken)
		);

		let refresh_as_access =
			RequestMeta::from_remote("10.1.1.3:5000").with_bearer(pair.refresh_token.expose());

		assert_eq!(
			gate.admit_request_at(&refresh_as_access, now),
			Err(GateRejection::Unauthenticated(TokenError::InvalidSignature))
		);
	}

	#[tokio::test(start_paused = true)]
	async fn limiter_runs_before_verification() {
		let gate = test_gate();
		let request = RequestMeta::from_remote("10.2.2.2:6000").with_authorization("garbage");

		for _ in 0..5 {
			assert_eq!(gate.admit_request(&request), Err(GateRejection::InvalidFormat));
		}

		assert_eq!(gate.admit_request(&request), Err(GateRejection::TooManyRequests));
		assert_eq!(gate.admit_public(&RequestMeta::from_remote("10.2.2.3:6000")), Ok(()));
	}
}
