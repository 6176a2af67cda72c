//! Token kind classification and default lifetimes.

// self
use crate::_prelude::*;

/// Which of the two token families a token belongs to.
///
/// Each kind is signed with its own secret, so a token of one kind never verifies as the other.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
	/// Short-lived credential presented on every protected request.
	Access,
	/// Long-lived credential used only to mint a new pair.
	Refresh,
}
impl TokenKind {
	/// Default access-token lifetime.
	pub const ACCESS_TTL: Duration = Duration::minutes(15);
	/// Default refresh-token lifetime.
	pub const REFRESH_TTL: Duration = Duration::days(7);

	/// Longest lifetime the authority accepts for either kind.
	pub const MAX_TTL: Duration = Duration::days(3_660);

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			TokenKind::Access => "access",
			TokenKind::Refresh => "refresh",
		}
	}
}
impl Display for TokenKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
