//! Typed token claims, lifecycle helpers, and the compact wire payload.

// self
use crate::{
	_prelude::*,
	auth::{Identity, TokenKind},
	error::TokenError,
};

/// Lifecycle status of a token at a given instant.
///
/// Tokens are never tracked server-side, so there is no revoked state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Token is inside its lifetime.
	Valid,
	/// Token reached or passed its expiry instant.
	Expired,
}

/// Verified, strongly typed content of a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
	/// Principal the token was issued to.
	pub subject: Identity,
	/// Token kind, known from the secret that verified it.
	pub kind: TokenKind,
	/// Issued-at instant, truncated to whole seconds.
	pub issued_at: OffsetDateTime,
	/// Expiry instant, truncated to whole seconds.
	pub expires_at: OffsetDateTime,
}
impl Claims {
	/// Builds claims for `subject` issued at `issued_at` and living for `ttl`.
	///
	/// Both instants are truncated to whole seconds so the claims survive the wire format
	/// unchanged.
	pub fn issue(
		subject: Identity,
		kind: TokenKind,
		issued_at: OffsetDateTime,
		ttl: Duration,
	) -> Self {
		let issued_at = truncate_to_seconds(issued_at);

		Self { subject, kind, issued_at, expires_at: issued_at.saturating_add(ttl) }
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if instant >= self.expires_at {
			return TokenStatus::Expired;
		}

		TokenStatus::Valid
	}

	/// Convenience helper that checks the status using the current UTC instant.
	pub fn status(&self) -> TokenStatus {
		self.status_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), TokenStatus::Expired)
	}

	/// Returns `true` if the token is expired relative to the current clock.
	pub fn is_expired(&self) -> bool {
		matches!(self.status(), TokenStatus::Expired)
	}

	/// Remaining lifetime at `instant`, clamped at zero.
	pub fn remaining_at(&self, instant: OffsetDateTime) -> Duration {
		(self.expires_at - instant).max(Duration::ZERO)
	}

	pub(crate) fn to_wire(&self) -> WireClaims {
		WireClaims {
			user_id: self.subject.to_string().into(),
			iat: self.issued_at.unix_timestamp(),
			exp: self.expires_at.unix_timestamp(),
		}
	}

	pub(crate) fn from_wire(wire: WireClaims, kind: TokenKind) -> Result<Self, TokenError> {
		let issued_at =
			OffsetDateTime::from_unix_timestamp(wire.iat).map_err(|_| TokenError::Malformed)?;
		let expires_at =
			OffsetDateTime::from_unix_timestamp(wire.exp).map_err(|_| TokenError::Malformed)?;
		let subject = wire
			.user_id
			.as_str()
			.and_then(|user_id| user_id.parse().ok())
			.ok_or(TokenError::IdentityMalformed)?;

		Ok(Self { subject, kind, issued_at, expires_at })
	}
}

/// JSON payload carried in the middle segment of a token.
///
/// `user_id` is kept loosely typed so an authentic token with an unusable subject is reported as
/// such rather than as a parse failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct WireClaims {
	#[serde(default)]
	pub(crate) user_id: serde_json::Value,
	pub(crate) iat: i64,
	pub(crate) exp: i64,
}

fn truncate_to_seconds(instant: OffsetDateTime) -> OffsetDateTime {
	instant - Duration::nanoseconds(i64::from(instant.nanosecond()))
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn subject() -> Identity {
		Identity::from_str("5f0c6a2e-3b7d-4c1a-9e8f-1d2c3b4a5e6f")
			.expect("Identity fixture should parse.")
	}

	#[test]
	fn status_flips_at_expiry_instant() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let claims = Claims::issue(subject(), TokenKind::Access, issued, TokenKind::ACCESS_TTL);

		assert_eq!(claims.expires_at, macros::datetime!(2025-01-01 00:15 UTC));
		assert_eq!(
			claims.status_at(macros::datetime!(2025-01-01 00:14:59 UTC)),
			TokenStatus::Valid
		);
		assert_eq!(
			claims.status_at(macros::datetime!(2025-01-01 00:15 UTC)),
			TokenStatus::Expired
		);
		assert!(claims.is_expired_at(macros::datetime!(2025-01-01 00:15:01 UTC)));
	}

	#[test]
	fn issue_truncates_subsecond_precision() {
		let issued = macros::datetime!(2025-01-01 00:00:00.750 UTC);
		let claims = Claims::issue(subject(), TokenKind::Refresh, issued, TokenKind::REFRESH_TTL);

		assert_eq!(claims.issued_at, macros::datetime!(2025-01-01 00:00 UTC));
		assert_eq!(claims.expires_at, macros::datetime!(2025-01-08 00:00 UTC));
	}

	#[test]
	fn expiry_saturates_instead_of_overflowing() {
		let issued = macros::datetime!(9999-12-31 23:00 UTC);
		let claims = Claims::issue(subject(), TokenKind::Refresh, issued, TokenKind::REFRESH_TTL);

		assert_eq!(claims.expires_at, macros::datetime!(9999-12-31 23:59:59.999999999 UTC));
	}

	#[test]
	fn wire_payload_uses_unix_seconds() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let claims = Claims::issue(subject(), TokenKind::Access, issued, TokenKind::ACCESS_TTL);
		let payload =
			serde_json::to_value(claims.to_wire()).expect("Wire claims should serialize.");

		assert_eq!(
			payload,
			serde_json::json!({
				"user_id": "5f0c6a2e-3b7d-4c1a-9e8f-1d2c3b4a5e6f",
				"iat": 1_735_689_600_i64,
				"exp": 1_735_690_500_i64,
			})
		);
		assert_eq!(Claims::from_wire(claims.to_wire(), TokenKind::Access), Ok(claims));
	}

	#[test]
	fn from_wire_rejects_bad_subjects() {
		let subjects = [serde_json::json!("admin"), serde_json::json!(42), serde_json::Value::Null];

		for user_id in subjects {
			let wire = WireClaims { user_id, iat: 0, exp: 900 };

			assert_eq!(
				Claims::from_wire(wire, TokenKind::Access),
				Err(TokenError::IdentityMalformed)
			);
		}
	}

	#[test]
	fn remaining_lifetime_clamps_at_zero() {
		let issued = macros::datetime!(2025-01-01 00:00 UTC);
		let claims = Claims::issue(subject(), TokenKind::Access, issued, TokenKind::ACCESS_TTL);

		assert_eq!(
			claims.remaining_at(macros::datetime!(2025-01-01 00:10 UTC)),
			Duration::minutes(5)
		);
		assert_eq!(claims.remaining_at(macros::datetime!(2025-01-02 00:00 UTC)), Duration::ZERO);
	}
}
