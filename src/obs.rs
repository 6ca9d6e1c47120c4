//! Observability helpers for authority flows.
//!
//! # Feature Flags
//!
//! - `tracing` (default) emits structured spans named `oauth2_authority.flow` with the `flow`
//!   (endpoint) and `stage` (call site) fields, plus a warning event for every rejection.
//! - `metrics` increments the `oauth2_authority_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Authority operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization request, including the login resume step.
	Authorize,
	/// Consent approval or rejection.
	Consent,
	/// Authorization code redemption at the token endpoint.
	TokenExchange,
	/// Bearer validation and userinfo projection.
	Userinfo,
	/// Client registration and administrative updates.
	Registration,
	/// Explicit access-token revocation.
	Revocation,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Authorize => "authorize",
			FlowKind::Consent => "consent",
			FlowKind::TokenExchange => "token_exchange",
			FlowKind::Userinfo => "userinfo",
			FlowKind::Registration => "registration",
			FlowKind::Revocation => "revocation",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an authority operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
