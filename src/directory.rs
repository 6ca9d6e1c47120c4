//! Client Directory collaborator: lookup and registration of OAuth clients.

pub mod memory;

pub use memory::MemoryDirectory;

// self
use crate::{
	_prelude::*,
	auth::{Client, ClientId},
	store::StoreFuture,
};

/// Persistent lookup of registered clients.
///
/// Failures surface as [`StoreError`](crate::store::StoreError) so the authority can report
/// them as retryable, just like ephemeral-store failures.
pub trait ClientDirectory
where
	Self: Send + Sync,
{
	/// Fetches a client by identifier.
	fn find<'a>(&'a self, id: &'a ClientId) -> StoreFuture<'a, Option<Client>>;

	/// Registers a new client; fails with `Conflict` when the identifier is taken.
	fn insert(&self, client: Client) -> StoreFuture<'_, ()>;

	/// Flips the auto-approve flag; returns the updated client or `None` when unknown.
	fn set_auto_approve<'a>(
		&'a self,
		id: &'a ClientId,
		auto_approve: bool,
		updated_at: OffsetDateTime,
	) -> StoreFuture<'a, Option<Client>>;

	/// Returns every registered client ordered by registration instant.
	fn list(&self) -> StoreFuture<'_, Vec<Client>>;
}
