//! In-memory [`ConsentLedger`].

// self
use crate::{
	_prelude::*,
	auth::{ClientId, UserId},
	consent::{AuthorizationRecord, ConsentLedger},
	store::StoreFuture,
};

/// Ledger that appends decisions to a process-local list.
#[derive(Clone, Debug, Default)]
pub struct MemoryConsentLedger(Arc<RwLock<Vec<AuthorizationRecord>>>);
impl MemoryConsentLedger {
	/// Number of recorded decisions.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing was recorded.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn history_now(&self, client_id: &ClientId, user_id: &UserId) -> Vec<AuthorizationRecord> {
		let mut records = self
			.0
			.read()
			.iter()
			.filter(|r| &r.client_id == client_id && &r.user_id == user_id)
			.cloned()
			.collect::<Vec<_>>();

		// Stable, so decisions sharing an instant keep insertion order.
		records.sort_by_key(|r| r.created_at);

		records
	}
}
impl ConsentLedger for MemoryConsentLedger {
	fn record(&self, record: AuthorizationRecord) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().push(record);

			Ok(())
		})
	}

	fn history<'a>(
		&'a self,
		client_id: &'a ClientId,
		user_id: &'a UserId,
	) -> StoreFuture<'a, Vec<AuthorizationRecord>> {
		Box::pin(async move { Ok(self.history_now(client_id, user_id)) })
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;
	use crate::auth::ScopeSet;

	fn record(client: &str, approved: bool, created_at: OffsetDateTime) -> AuthorizationRecord {
		AuthorizationRecord {
			client_id: ClientId::new(client).expect("Client fixture should be valid."),
			user_id: UserId::new("test_user").expect("User fixture should be valid."),
			scope: ScopeSet::new(["userid"]),
			approved,
			created_at,
		}
	}

	#[tokio::test]
	async fn history_is_filtered_and_ordered() {
		let ledger = MemoryConsentLedger::default();

		for entry in [
			record("client-1", false, macros::datetime!(2025-01-02 00:00 UTC)),
			record("client-2", true, macros::datetime!(2025-01-01 00:00 UTC)),
			record("client-1", true, macros::datetime!(2025-01-01 00:00 UTC)),
		] {
			ledger.record(entry).await.expect("Record should succeed.");
		}

		let client = ClientId::new("client-1").expect("Client fixture should be valid.");
		let user = UserId::new("test_user").expect("User fixture should be valid.");
		let history = ledger.history(&client, &user).await.expect("History should load.");

		assert_eq!(ledger.len(), 3);
		assert_eq!(history.iter().map(|r| r.approved).collect::<Vec<_>>(), vec![true, false]);
	}
}
