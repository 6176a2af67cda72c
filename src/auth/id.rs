//! Strongly typed principal identity embedded in issued tokens.

// std
use std::ops::Deref;
// self
use crate::_prelude::*;

/// Error returned when an identity value fails validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum IdentifierError {
	/// The value is not a hyphenated or simple UUID.
	#[error("Identity `{value}` is not a valid UUID.")]
	Unparsable {
		/// Rejected input.
		value: String,
	},
	/// The nil UUID never names a principal.
	#[error("Identity cannot be the nil UUID.")]
	Nil,
}

/// Opaque 128-bit identifier of an authenticated principal.
///
/// Owned by the user store; the token layer only embeds it into claims and reads it back.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identity(Uuid);
impl Identity {
	/// Wraps an existing UUID after validation.
	pub fn new(value: Uuid) -> Result<Self, IdentifierError> {
		if value.is_nil() {
			return Err(IdentifierError::Nil);
		}

		Ok(Self(value))
	}

	/// Generates a fresh random identity.
	pub fn generate() -> Self {
		Self(Uuid::new_v4())
	}
}
impl Deref for Identity {
	type Target = Uuid;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl From<Identity> for String {
	fn from(value: Identity) -> Self {
		value.0.to_string()
	}
}
impl TryFrom<String> for Identity {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}
impl Debug for Identity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Identity({})", self.0)
	}
}
impl Display for Identity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0, f)
	}
}
impl FromStr for Identity {
	type Err = IdentifierError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let uuid =
			Uuid::parse_str(s).map_err(|_| IdentifierError::Unparsable { value: s.to_owned() })?;

		Self::new(uuid)
	}
}
