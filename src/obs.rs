//! Optional observability helpers for token and admission operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `marketgate.op` with the `op` (operation)
//!   and `stage` (call site) fields.
//! - Enable `metrics` to increment the `marketgate_op_total` counter once per completed
//!   operation, labeled by `op` and `outcome` (`success`/`failure` for token operations,
//!   `accepted`/`rejected` for admissions).

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
	/// Minting an access/refresh pair.
	IssuePair,
	/// Verifying an access token.
	VerifyAccess,
	/// Verifying a refresh token.
	VerifyRefresh,
	/// Rotating a pair from a refresh token.
	RefreshPair,
	/// Admission decision for one request.
	Admit,
	/// Idle-record eviction pass.
	Sweep,
}
impl OpKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpKind::IssuePair => "issue_pair",
			OpKind::VerifyAccess => "verify_access",
			OpKind::VerifyRefresh => "verify_refresh",
			OpKind::RefreshPair => "refresh_pair",
			OpKind::Admit => "admit",
			OpKind::Sweep => "sweep",
		}
	}
}
impl Display for OpKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Successful completion.
	Success,
	/// Failure returned to the caller.
	Failure,
	/// Request admitted by the limiter.
	Accepted,
	/// Request refused by the limiter.
	Rejected,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
			OpOutcome::Accepted => "accepted",
			OpOutcome::Rejected => "rejected",
		}
	}

	/// Maps a result onto [`OpOutcome::Success`] or [`OpOutcome::Failure`].
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		match result {
			Ok(_) => OpOutcome::Success,
			Err(_) => OpOutcome::Failure,
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn labels_are_stable() {
		assert_eq!(OpKind::RefreshPair.to_string(), "refresh_pair");
		assert_eq!(
			[OpOutcome::Success, OpOutcome::Failure, OpOutcome::Accepted, OpOutcome::Rejected]
				.map(OpOutcome::as_str),
			["success", "failure", "accepted", "rejected"]
		);
		assert_eq!(OpOutcome::of::<(), ()>(&Ok(())), OpOutcome::Success);
		assert_eq!(OpOutcome::of::<(), ()>(&Err(())), OpOutcome::Failure);
	}
}
