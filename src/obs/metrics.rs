// self
use crate::obs::{OpKind, OpOutcome};

/// Counter incremented once per completed operation.
pub const OP_TOTAL: &str = "marketgate_op_total";
/// Counter of idle client records evicted by sweeps.
pub const EVICTED_TOTAL: &str = "marketgate_admission_evicted_total";

/// Counts one completed operation under `op` and `outcome` labels.
pub fn record_op_outcome(kind: OpKind, outcome: OpOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(OP_TOTAL, "op" => kind.as_str(), "outcome" => outcome.as_str())
			.increment(1);
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Adds the records removed by one sweep pass.
pub fn record_evictions(evicted: usize) {
	#[cfg(feature = "metrics")]
	{
		if evicted > 0 {
			metrics::counter!(EVICTED_TOTAL).increment(evicted as u64);
		}
	}
	#[cfg(not(feature = "metrics"))]
	{
		let _ = evicted;
	}
}
