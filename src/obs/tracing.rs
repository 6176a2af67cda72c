// self
use crate::{_prelude::*, obs::OpKind};

/// Future returned by [`OpSpan::instrument`]; the bare future when tracing is compiled out.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`OpSpan::instrument`]; the bare future when tracing is compiled out.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// `marketgate.op` span covering one token or admission operation.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Opens a span for `kind`; `stage` names the entry point that opened it.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self { span: tracing::debug_span!("marketgate.op", op = kind.as_str(), stage) }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Enters the span until the returned guard drops.
	///
	/// Token operations and admission decisions are synchronous, so they hold the guard for
	/// their whole body.
	pub fn entered(self) -> OpSpanGuard {
		#[cfg(feature = "tracing")]
		{
			OpSpanGuard { _entered: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			OpSpanGuard {}
		}
	}

	/// Attaches the span to a long-lived task such as the idle sweeper.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Guard returned by [`OpSpan::entered`].
pub struct OpSpanGuard {
	#[cfg(feature = "tracing")]
	_entered: tracing::span::EnteredSpan,
}
impl Debug for OpSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("OpSpanGuard(..)")
	}
}

/// Logs a sweep pass that evicted at least one idle client record.
pub fn trace_sweep(evicted: usize, retained: usize) {
	#[cfg(feature = "tracing")]
	{
		if evicted > 0 {
			tracing::debug!(evicted, retained, "Admission limiter evicted idle client records.");
		}
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (evicted, retained);
	}
}
