//! Auth-domain identifiers, token models, and the token authority.

pub mod authority;
pub mod id;
pub mod token;

pub use authority::*;
pub use id::*;
pub use token::{claims::*, kind::*, secret::*};
