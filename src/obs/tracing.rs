// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span wrapper used by authority operations.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	kind: FlowKind,
	stage: &'static str,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth2_authority.flow", flow = kind.as_str(), stage);

			Self { kind, stage, span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			Self { kind, stage }
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Emits a warning carrying the error's reason code; secrets never reach the event.
	pub fn reject(&self, error: &Error) {
		#[cfg(feature = "tracing")]
		{
			let _guard = self.span.enter();

			tracing::warn!(
				flow = self.kind.as_str(),
				stage = self.stage,
				reason = error.reason_code(),
				retryable = error.is_retryable(),
				"{error}"
			);
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (self.kind, self.stage, error);
		}
	}

	/// Emits an error-level event for a partial failure the caller cannot observe.
	pub fn degraded(&self, message: &'static str, error: &Error) {
		#[cfg(feature = "tracing")]
		{
			let _guard = self.span.enter();

			tracing::error!(flow = self.kind.as_str(), stage = self.stage, %error, "{message}");
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (message, error);
		}
	}
}
