//! Shared helpers for flow implementations (deadlines, client lookup, observation).

// self
use crate::{
	_prelude::*,
	auth::{Client, ClientId},
	flows::Authority,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::StoreError,
};

/// Authorization codes carry ~256 bits of entropy.
pub(crate) const CODE_LEN: usize = 43;
pub(crate) const REFRESH_TOKEN_LEN: usize = 64;
pub(crate) const TOKEN_ID_LEN: usize = 22;
pub(crate) const CLIENT_ID_LEN: usize = 24;
pub(crate) const CLIENT_SECRET_LEN: usize = 48;

impl Authority {
	/// Current instant according to the injected clock.
	pub fn now(&self) -> OffsetDateTime {
		self.clock.now()
	}

	/// Awaits a collaborator call under the configured deadline.
	pub(crate) async fn bounded<T, F>(&self, fut: F) -> Result<T>
	where
		F: Future<Output = Result<T, StoreError>>,
	{
		let Some(limit) = self.config.collaborator_timeout() else {
			return Ok(fut.await?);
		};

		match tokio::time::timeout(limit.unsigned_abs(), fut).await {
			Ok(result) => Ok(result?),
			Err(_) => Err(StoreError::Timeout {
				millis: u64::try_from(limit.whole_milliseconds()).unwrap_or(u64::MAX),
			}
			.into()),
		}
	}

	/// Resolves a wire client identifier; malformed or unknown ids are `InvalidClient`.
	pub(crate) async fn find_client(&self, raw: &str) -> Result<Client> {
		let id = ClientId::new(raw).map_err(|_| Error::InvalidClient)?;

		self.bounded(self.directory.find(&id)).await?.ok_or(Error::InvalidClient)
	}
}

/// Runs a flow inside its span, recording attempt/outcome metrics and logging rejections.
///
/// The flow receives a handle to the span so it can report partial failures that do not fail
/// the call.
pub(crate) async fn observe<T, F, Fut>(kind: FlowKind, stage: &'static str, flow: F) -> Result<T>
where
	F: FnOnce(FlowSpan) -> Fut,
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(kind, stage);

	obs::record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(flow(span.clone())).await;

	match &result {
		Ok(_) => obs::record_flow_outcome(kind, FlowOutcome::Success),
		Err(e) => {
			span.reject(e);
			obs::record_flow_outcome(kind, FlowOutcome::Failure);
		},
	}

	result
}
