//! Consent ledger: the durable record of every approval or rejection a user gave a client.
//!
//! The ledger is written after the decision has taken effect. For approvals that means after
//! the authorization code is stored, so a ledger outage can leave a redeemable code without
//! a matching entry but never an entry without a code.

pub mod memory;

pub use memory::MemoryConsentLedger;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, UserId},
	store::StoreFuture,
};

/// One consent decision.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRecord {
	/// Client that asked.
	pub client_id: ClientId,
	/// User who answered.
	pub user_id: UserId,
	/// Scope shown on the prompt (or granted without one for auto-approved clients).
	pub scope: ScopeSet,
	/// `true` for approvals, including auto-approvals.
	pub approved: bool,
	/// Decision instant.
	pub created_at: OffsetDateTime,
}

/// Append-only store of [`AuthorizationRecord`]s.
pub trait ConsentLedger
where
	Self: Send + Sync,
{
	/// Appends a decision.
	fn record(&self, record: AuthorizationRecord) -> StoreFuture<'_, ()>;

	/// Returns the decisions a user made for a client, oldest first.
	fn history<'a>(
		&'a self,
		client_id: &'a ClientId,
		user_id: &'a UserId,
	) -> StoreFuture<'a, Vec<AuthorizationRecord>>;
}
