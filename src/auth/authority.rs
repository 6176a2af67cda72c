//! Dual-secret token authority: issues, verifies, and rotates access/refresh pairs.
//!
//! The authority is built once at start-up from an [`AuthorityConfig`] and shared by reference
//! (or behind an `Arc`) with request handlers. It holds no mutable state, so every operation is
//! safe to call concurrently without locking. Access and refresh tokens are HS256 compact tokens
//! signed with two distinct secrets; a token of one kind never verifies as the other.
//!
//! Each operation has an `_at` variant that takes the current instant explicitly. The plain
//! variants read the UTC wall clock.

// crates.io
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
// self
use crate::{
	_prelude::*,
	auth::{Claims, Identity, SigningKey, TokenKind, TokenSecret, token::claims::WireClaims},
	error::{ConfigError, TokenError},
	obs::{self, OpKind, OpOutcome, OpSpan},
};

/// Secrets and lifetimes used to build a [`TokenAuthority`].
#[derive(Clone)]
pub struct AuthorityConfig {
	/// Key material for access tokens; plain text or `base64:` prefixed.
	pub access_secret: String,
	/// Key material for refresh tokens; plain text or `base64:` prefixed.
	pub refresh_secret: String,
	/// Access-token lifetime.
	pub access_ttl: Duration,
	/// Refresh-token lifetime.
	pub refresh_ttl: Duration,
}
impl AuthorityConfig {
	/// Creates a configuration with the default 15 minute / 7 day lifetimes.
	pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
		Self {
			access_secret: access_secret.into(),
			refresh_secret: refresh_secret.into(),
			access_ttl: TokenKind::ACCESS_TTL,
			refresh_ttl: TokenKind::REFRESH_TTL,
		}
	}

	/// Overrides the access-token lifetime.
	pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
		self.access_ttl = ttl;

		self
	}

	/// Overrides the refresh-token lifetime.
	pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
		self.refresh_ttl = ttl;

		self
	}
}
impl Debug for AuthorityConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorityConfig")
			.field("access_secret", &"<redacted>")
			.field("refresh_secret", &"<redacted>")
			.field("access_ttl", &self.access_ttl)
			.field("refresh_ttl", &self.refresh_ttl)
			.finish()
	}
}

/// Freshly minted access/refresh tokens plus their claims.
#[derive(Clone)]
pub struct TokenPair {
	/// Signed access token.
	pub access_token: TokenSecret,
	/// Signed refresh token.
	pub refresh_token: TokenSecret,
	/// Claims embedded in the access token.
	pub access_claims: Claims,
	/// Claims embedded in the refresh token.
	pub refresh_claims: Claims,
}
impl TokenPair {
	/// Principal both tokens were issued to.
	pub fn subject(&self) -> Identity {
		self.access_claims.subject
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("access_claims", &self.access_claims)
			.field("refresh_claims", &self.refresh_claims)
			.finish()
	}
}

#[derive(Clone)]
struct Signer {
	kind: TokenKind,
	ttl: Duration,
	encoding: EncodingKey,
	decoding: DecodingKey,
}
impl Signer {
	fn new(
		kind: TokenKind,
		material: &str,
		ttl: Duration,
	) -> Result<(Self, SigningKey), ConfigError> {
		if !ttl.is_positive() {
			return Err(ConfigError::NonPositiveTtl { kind });
		}
		if ttl > TokenKind::MAX_TTL {
			return Err(ConfigError::TtlOutOfRange { kind });
		}

		let key = SigningKey::from_material(kind, material)?;
		let signer = Self {
			kind,
			ttl,
			encoding: EncodingKey::from_secret(key.expose()),
			decoding: DecodingKey::from_secret(key.expose()),
		};

		Ok((signer, key))
	}
}

/// Issues and verifies access/refresh token pairs bound to an [`Identity`].
#[derive(Clone)]
pub struct TokenAuthority {
	access: Signer,
	refresh: Signer,
	header: Header,
	validation: Validation,
}
impl TokenAuthority {
	/// Validates the configuration and prepares both signing keys.
	pub fn new(config: AuthorityConfig) -> Result<Self, ConfigError> {
		let (access, access_key) =
			Signer::new(TokenKind::Access, &config.access_secret, config.access_ttl)?;
		let (refresh, refresh_key) =
			Signer::new(TokenKind::Refresh, &config.refresh_secret, config.refresh_ttl)?;

		if access_key == refresh_key {
			return Err(ConfigError::SharedSecret);
		}

		let mut validation = Validation::new(Algorithm::HS256);

		// Expiry is checked against the caller's instant, without leeway.
		validation.validate_exp = false;
		validation.validate_aud = false;
		validation.leeway = 0;
		validation.set_required_spec_claims(&["exp"]);

		Ok(Self { access, refresh, header: Header::new(Algorithm::HS256), validation })
	}

	/// Lifetime configured for the given token kind.
	pub fn ttl(&self, kind: TokenKind) -> Duration {
		self.signer(kind).ttl
	}

	/// Mints a new pair for `identity` stamped with the current UTC instant.
	pub fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, ConfigError> {
		self.issue_pair_at(identity, OffsetDateTime::now_utc())
	}

	/// Mints a new pair for `identity` as if issued at `now`.
	pub fn issue_pair_at(
		&self,
		identity: &Identity,
		now: OffsetDateTime,
	) -> Result<TokenPair, ConfigError> {
		const KIND: OpKind = OpKind::IssuePair;

		let _span = OpSpan::new(KIND, "issue_pair").entered();
		let result = self.mint(*identity, now);

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	/// Verifies an access token against the current UTC instant.
	pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
		self.verify_access_at(token, OffsetDateTime::now_utc())
	}

	/// Verifies an access token as of `now`.
	pub fn verify_access_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
		self.verify_at(TokenKind::Access, token, now)
	}

	/// Verifies a refresh token against the current UTC instant.
	pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
		self.verify_refresh_at(token, OffsetDateTime::now_utc())
	}

	/// Verifies a refresh token as of `now`.
	pub fn verify_refresh_at(
		&self,
		token: &str,
		now: OffsetDateTime,
	) -> Result<Claims, TokenError> {
		self.verify_at(TokenKind::Refresh, token, now)
	}

	/// Verifies a token of the given kind as of `now`.
	pub fn verify_at(
		&self,
		kind: TokenKind,
		token: &str,
		now: OffsetDateTime,
	) -> Result<Claims, TokenError> {
		let op = match kind {
			TokenKind::Access => OpKind::VerifyAccess,
			TokenKind::Refresh => OpKind::VerifyRefresh,
		};
		let _span = OpSpan::new(op, "verify").entered();
		let result = self.decode(self.signer(kind), token, now);

		obs::record_op_outcome(op, OpOutcome::of(&result));

		result
	}

	/// Exchanges a refresh token for a brand-new pair using the current UTC instant.
	///
	/// The presented refresh token stays valid until its own expiry; nothing is revoked.
	pub fn refresh_pair(&self, refresh_token: &str) -> Result<TokenPair> {
		self.refresh_pair_at(refresh_token, OffsetDateTime::now_utc())
	}

	/// Exchanges a refresh token for a brand-new pair as of `now`.
	pub fn refresh_pair_at(&self, refresh_token: &str, now: OffsetDateTime) -> Result<TokenPair> {
		const KIND: OpKind = OpKind::RefreshPair;

		let _span = OpSpan::new(KIND, "refresh_pair").entered();
		let result = self
			.decode(&self.refresh, refresh_token, now)
			.map_err(Error::from)
			.and_then(|claims| self.mint(claims.subject, now).map_err(Error::from));

		obs::record_op_outcome(KIND, OpOutcome::of(&result));

		result
	}

	fn signer(&self, kind: TokenKind) -> &Signer {
		match kind {
			TokenKind::Access => &self.access,
			TokenKind::Refresh => &self.refresh,
		}
	}

	fn mint(&self, subject: Identity, now: OffsetDateTime) -> Result<TokenPair, ConfigError> {
		let access_claims = Claims::issue(subject, TokenKind::Access, now, self.access.ttl);
		let refresh_claims = Claims::issue(subject, TokenKind::Refresh, now, self.refresh.ttl);
		let access_token = self.sign(&self.access, &access_claims)?;
		let refresh_token = self.sign(&self.refresh, &refresh_claims)?;

		Ok(TokenPair { access_token, refresh_token, access_claims, refresh_claims })
	}

	fn sign(&self, signer: &Signer, claims: &Claims) -> Result<TokenSecret, ConfigError> {
		jsonwebtoken::encode(&self.header, &claims.to_wire(), &signer.encoding)
			.map(TokenSecret::new)
			.map_err(|source| ConfigError::Signing { kind: signer.kind, source })
	}

	fn decode(
		&self,
		signer: &Signer,
		token: &str,
		now: OffsetDateTime,
	) -> Result<Claims, TokenError> {
		let data = jsonwebtoken::decode::<WireClaims>(token, &signer.decoding, &self.validation)?;
		let claims = Claims::from_wire(data.claims, signer.kind)?;

		if claims.is_expired_at(now) {
			return Err(TokenError::Expired);
		}

		Ok(claims)
	}
}
impl Debug for TokenAuthority {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenAuthority")
			.field("access_ttl", &self.access.ttl)
			.field("refresh_ttl", &self.refresh.ttl)
			.finish()
	}
}
