//! Credential and access-control core for the marketplace backend: dual-secret session tokens,
//! per-client admission limiting, and the gate that composes them in front of protected routes.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod limit;
pub mod obs;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and fixtures for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{AuthorityConfig, Identity, TokenAuthority},
		limit::{AdmissionLimiter, LimiterConfig},
	};

	/// Access-token signing secret shared by test fixtures.
	pub const TEST_ACCESS_SECRET: &str = "test-access-secret-0123456789abcdef";
	/// Refresh-token signing secret shared by test fixtures.
	pub const TEST_REFRESH_SECRET: &str = "test-refresh-secret-fedcba9876543210";

	/// Builds an authority with the fixture secrets and default TTLs.
	pub fn test_authority() -> TokenAuthority {
		TokenAuthority::new(AuthorityConfig::new(TEST_ACCESS_SECRET, TEST_REFRESH_SECRET))
			.expect("Fixture authority configuration should be valid.")
	}

	/// Parses a fixed identity fixture.
	pub fn test_identity() -> Identity {
		Identity::from_str("5f0c6a2e-3b7d-4c1a-9e8f-1d2c3b4a5e6f")
			.expect("Identity fixture should parse.")
	}

	/// Builds a limiter with default capacity/window and no background sweeper.
	///
	/// Must be called from inside a tokio runtime.
	pub fn test_limiter() -> AdmissionLimiter {
		AdmissionLimiter::new(LimiterConfig::default().without_sweeper())
			.expect("Fixture limiter should build inside a runtime.")
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		str::FromStr,
		sync::{Arc, Weak},
		time::Duration as StdDuration,
	};

	pub use parking_lot::Mutex;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use uuid::Uuid;

	pub use crate::error::{Error, Result};
}

pub use jsonwebtoken;
#[cfg(test)] use color_eyre as _;
