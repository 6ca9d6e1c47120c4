//! In-memory [`SessionStore`].

// self
use crate::{
	_prelude::*,
	auth::SessionId,
	session::{Session, SessionStore},
	store::StoreFuture,
};

/// Session store backed by a process-local map.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(Arc<RwLock<HashMap<SessionId, Session>>>);
impl SessionStore for MemorySessionStore {
	fn load<'a>(&'a self, id: &'a SessionId) -> StoreFuture<'a, Option<Session>> {
		Box::pin(async move { Ok(self.0.read().get(id).cloned()) })
	}

	fn save(&self, session: Session) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.0.write().insert(session.id().clone(), session);

			Ok(())
		})
	}

	fn remove<'a>(&'a self, id: &'a SessionId) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.0.write().remove(id).is_some()) })
	}
}
