//! Start-up settings for the token authority and admission limiter.
//!
//! Settings come from a JSON document ([`Settings::from_json_str`]) or from the process
//! environment ([`Settings::from_env`]). Both paths are meant to run once at boot; every failure
//! is a [`ConfigError`] and should stop the process.

// std
use std::env::VarError;
// self
use crate::{
	_prelude::*,
	auth::{AuthorityConfig, TokenKind},
	error::ConfigError,
	limit::LimiterConfig,
};

/// Environment variable holding the access-token secret.
pub const ENV_ACCESS_SECRET: &str = "JWT_SECRET";
/// Environment variable holding the refresh-token secret.
pub const ENV_REFRESH_SECRET: &str = "REFRESH_SECRET";
/// Optional environment override for the access-token lifetime in seconds.
pub const ENV_ACCESS_TTL_SECS: &str = "ACCESS_TTL_SECS";
/// Optional environment override for the refresh-token lifetime in seconds.
pub const ENV_REFRESH_TTL_SECS: &str = "REFRESH_TTL_SECS";
/// Optional environment override for the per-key burst capacity.
pub const ENV_RATE_LIMIT_CAPACITY: &str = "RATE_LIMIT_CAPACITY";
/// Optional environment override for the admission window in milliseconds.
pub const ENV_RATE_LIMIT_WINDOW_MS: &str = "RATE_LIMIT_WINDOW_MS";

/// Complete settings document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
	/// Token signing settings.
	pub tokens: TokenSettings,
	/// Admission limiter settings; defaults apply when omitted.
	#[serde(default)]
	pub limiter: LimiterSettings,
}
impl Settings {
	/// Parses a JSON settings document, reporting the path of the first offending field.
	pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
		let mut deserializer = serde_json::Deserializer::from_str(document);

		Ok(serde_path_to_error::deserialize(&mut deserializer)?)
	}

	/// Reads settings from the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| std::env::var(name))
	}

	/// Reads settings through `lookup`, which behaves like [`std::env::var`].
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&'static str) -> Result<String, VarError>,
	{
		let required =
			|name: &'static str| lookup(name).map_err(|source| ConfigError::Env { name, source });
		let defaults_tokens = TokenSettings::defaults();
		let defaults_limiter = LimiterSettings::default();
		let tokens = TokenSettings {
			access_secret: required(ENV_ACCESS_SECRET)?,
			refresh_secret: required(ENV_REFRESH_SECRET)?,
			access_ttl_secs: optional(&lookup, ENV_ACCESS_TTL_SECS)?
				.unwrap_or(defaults_tokens.access_ttl_secs),
			refresh_ttl_secs: optional(&lookup, ENV_REFRESH_TTL_SECS)?
				.unwrap_or(defaults_tokens.refresh_ttl_secs),
		};
		let limiter = LimiterSettings {
			capacity: optional(&lookup, ENV_RATE_LIMIT_CAPACITY)?
				.unwrap_or(defaults_limiter.capacity),
			window_ms: optional(&lookup, ENV_RATE_LIMIT_WINDOW_MS)?
				.unwrap_or(defaults_limiter.window_ms),
			..defaults_limiter
		};

		Ok(Self { tokens, limiter })
	}

	/// Token authority configuration described by these settings.
	pub fn authority_config(&self) -> AuthorityConfig {
		self.tokens.authority_config()
	}

	/// Limiter configuration described by these settings.
	pub fn limiter_config(&self) -> LimiterConfig {
		self.limiter.limiter_config()
	}
}

/// Token signing settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenSettings {
	/// Access-token key material; plain text or `base64:` prefixed.
	pub access_secret: String,
	/// Refresh-token key material; plain text or `base64:` prefixed.
	pub refresh_secret: String,
	/// Access-token lifetime in seconds.
	#[serde(default = "default_access_ttl_secs")]
	pub access_ttl_secs: i64,
	/// Refresh-token lifetime in seconds.
	#[serde(default = "default_refresh_ttl_secs")]
	pub refresh_ttl_secs: i64,
}
impl TokenSettings {
	fn defaults() -> Self {
		Self {
			access_secret: String::new(),
			refresh_secret: String::new(),
			access_ttl_secs: default_access_ttl_secs(),
			refresh_ttl_secs: default_refresh_ttl_secs(),
		}
	}

	/// Converts into an [`AuthorityConfig`]; secrets are validated when the authority is built.
	pub fn authority_config(&self) -> AuthorityConfig {
		AuthorityConfig::new(self.access_secret.clone(), self.refresh_secret.clone())
			.with_access_ttl(Duration::seconds(self.access_ttl_secs))
			.with_refresh_ttl(Duration::seconds(self.refresh_ttl_secs))
	}
}
impl Debug for TokenSettings {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSettings")
			.field("access_secret", &"<redacted>")
			.field("refresh_secret", &"<redacted>")
			.field("access_ttl_secs", &self.access_ttl_secs)
			.field("refresh_ttl_secs", &self.refresh_ttl_secs)
			.finish()
	}
}

/// Admission limiter settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimiterSettings {
	/// Burst capacity per client key.
	pub capacity: u32,
	/// Admission window in milliseconds.
	pub window_ms: u64,
	/// Idle time in seconds before a settled record is evicted.
	pub idle_ttl_secs: u64,
	/// Background sweep period in seconds; `null` disables the sweeper.
	pub sweep_interval_secs: Option<u64>,
}
impl LimiterSettings {
	/// Converts into a [`LimiterConfig`]; values are validated when the limiter is built.
	pub fn limiter_config(&self) -> LimiterConfig {
		LimiterConfig {
			capacity: self.capacity,
			window: StdDuration::from_millis(self.window_ms),
			idle_ttl: StdDuration::from_secs(self.idle_ttl_secs),
			sweep_interval: self.sweep_interval_secs.map(StdDuration::from_secs),
		}
	}
}
impl Default for LimiterSettings {
	fn default() -> Self {
		let defaults = LimiterConfig::default();

		Self {
			capacity: defaults.capacity,
			window_ms: u64::try_from(defaults.window.as_millis()).unwrap_or(u64::MAX),
			idle_ttl_secs: defaults.idle_ttl.as_secs(),
			sweep_interval_secs: defaults.sweep_interval.map(|interval| interval.as_secs()),
		}
	}
}

fn default_access_ttl_secs() -> i64 {
	TokenKind::ACCESS_TTL.whole_seconds()
}

fn default_refresh_ttl_secs() -> i64 {
	TokenKind::REFRESH_TTL.whole_seconds()
}

fn optional<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
	F: Fn(&'static str) -> Result<String, VarError>,
	T: FromStr,
{
	match lookup(name) {
		Ok(value) => value
			.trim()
			.parse()
			.map(Some)
			.map_err(|_| ConfigError::EnvValue { name, value }),
		Err(VarError::NotPresent) => Ok(None),
		Err(source) => Err(ConfigError::Env { name, source }),
	}
}
