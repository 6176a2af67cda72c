//! Token kinds, typed claims, and redacting secret wrappers.

pub mod claims;
pub mod kind;
pub mod secret;
