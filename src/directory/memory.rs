//! In-memory [`ClientDirectory`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{Client, ClientId},
	directory::ClientDirectory,
	store::{StoreError, StoreFuture},
};

/// Directory that keeps clients in a process-local map.
#[derive(Clone, Debug, Default)]
pub struct MemoryDirectory(Arc<RwLock<HashMap<ClientId, Client>>>);
impl MemoryDirectory {
	fn insert_now(&self, client: Client) -> Result<(), StoreError> {
		let mut guard = self.0.write();

		if guard.contains_key(&client.id) {
			return Err(StoreError::Conflict { key: client.id.to_string() });
		}

		guard.insert(client.id.clone(), client);

		Ok(())
	}

	fn set_auto_approve_now(
		&self,
		id: &ClientId,
		auto_approve: bool,
		updated_at: OffsetDateTime,
	) -> Option<Client> {
		let mut guard = self.0.write();
		let client = guard.get_mut(id)?;

		client.auto_approve = auto_approve;
		client.updated_at = updated_at;

		Some(client.clone())
	}

	fn list_now(&self) -> Vec<Client> {
		let mut clients = self.0.read().values().cloned().collect::<Vec<_>>();

		clients.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

		clients
	}
}
impl ClientDirectory for MemoryDirectory {
	fn find<'a>(&'a self, id: &'a ClientId) -> StoreFuture<'a, Option<Client>> {
		Box::pin(async move { Ok(self.0.read().get(id).cloned()) })
	}

	fn insert(&self, client: Client) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.insert_now(client) })
	}

	fn set_auto_approve<'a>(
		&'a self,
		id: &'a ClientId,
		auto_approve: bool,
		updated_at: OffsetDateTime,
	) -> StoreFuture<'a, Option<Client>> {
		Box::pin(async move { Ok(self.set_auto_approve_now(id, auto_approve, updated_at)) })
	}

	fn list(&self) -> StoreFuture<'_, Vec<Client>> {
		Box::pin(async move { Ok(self.list_now()) })
	}
}
