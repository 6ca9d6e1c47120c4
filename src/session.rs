//! Session collaborator: per-browser state threaded explicitly through the authorize flow.

pub mod memory;

pub use memory::MemorySessionStore;

// self
use crate::{
	_prelude::*,
	auth::{SessionId, UserId},
	http::AuthorizeRequest,
	store::StoreFuture,
};

const SESSION_ID_LEN: usize = 32;

/// Authorization parked in a session between interactive steps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PendingAuthorization {
	/// Request saved verbatim until the user logs in.
	AwaitingLogin {
		/// Original authorize parameters.
		request: AuthorizeRequest,
	},
	/// Request waiting for the user's consent decision.
	AwaitingConsent {
		/// Original authorize parameters.
		request: AuthorizeRequest,
		/// User the consent prompt was shown to.
		user: UserId,
	},
}

/// Per-browser state: the logged-in user and at most one pending authorization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
	id: SessionId,
	user: Option<UserId>,
	pending: Option<PendingAuthorization>,
}
impl Session {
	/// Creates an empty session with the provided identifier.
	pub fn new(id: SessionId) -> Self {
		Self { id, user: None, pending: None }
	}

	/// Creates an empty session with a random identifier.
	pub fn generate() -> Self {
		Self::new(SessionId::random(SESSION_ID_LEN))
	}

	/// Session identifier.
	pub fn id(&self) -> &SessionId {
		&self.id
	}

	/// Logged-in user, if any.
	pub fn user(&self) -> Option<&UserId> {
		self.user.as_ref()
	}

	/// Records a successful login.
	pub fn log_in(&mut self, user: UserId) {
		self.user = Some(user);
	}

	/// Forgets the logged-in user and any pending authorization.
	pub fn log_out(&mut self) {
		self.user = None;
		self.pending = None;
	}

	/// Pending authorization, if any.
	pub fn pending(&self) -> Option<&PendingAuthorization> {
		self.pending.as_ref()
	}

	/// Replaces the pending authorization; a session holds at most one.
	pub fn set_pending(&mut self, pending: PendingAuthorization) {
		self.pending = Some(pending);
	}

	/// Removes and returns the pending authorization.
	pub fn take_pending(&mut self) -> Option<PendingAuthorization> {
		self.pending.take()
	}
}

/// Storage for sessions keyed by [`SessionId`]; concurrent writers resolve last-write-wins.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Loads a session.
	fn load<'a>(&'a self, id: &'a SessionId) -> StoreFuture<'a, Option<Session>>;

	/// Saves (inserts or replaces) a session.
	fn save(&self, session: Session) -> StoreFuture<'_, ()>;

	/// Removes a session; returns `true` when one existed.
	fn remove<'a>(&'a self, id: &'a SessionId) -> StoreFuture<'a, bool>;
}
