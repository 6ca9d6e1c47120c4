//! Ephemeral code/token store contract, key layout, and the built-in in-memory backend.
//!
//! Backends only see opaque string keys and JSON payloads with a time-to-live. The typed
//! helpers at the bottom of this module are what flows use: they serialize the protocol
//! records from [`crate::auth`] and map backend failures into [`StoreError`].

pub mod memory;

pub use memory::MemoryStore;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::_prelude::*;

/// Boxed future returned by collaborator contracts.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key-value backend with per-key time-to-live.
///
/// [`take`](EphemeralStore::take) must be atomic: two concurrent callers racing on the same
/// key must never both observe the value. That primitive is the only thing enforcing
/// single-use authorization codes.
pub trait EphemeralStore
where
	Self: Send + Sync,
{
	/// Writes `value` under `key`, replacing any previous value, expiring after `ttl`.
	fn set<'a>(&'a self, key: &'a StoreKey, value: String, ttl: Duration) -> StoreFuture<'a, ()>;

	/// Reads the live value under `key`, if any.
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>>;

	/// Deletes `key`; returns `true` when a live value was removed.
	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool>;

	/// Atomically reads and deletes the live value under `key`.
	fn take<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>>;
}

/// Error type produced by collaborator backends.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced while encoding or decoding a record.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// A record with the same key already exists.
	#[error("Record `{key}` already exists.")]
	Conflict {
		/// Conflicting key.
		key: String,
	},
	/// The collaborator did not answer within the caller's deadline.
	#[error("Backend did not respond within {millis} ms.")]
	Timeout {
		/// Deadline that elapsed, in milliseconds.
		millis: u64,
	},
}
impl StoreError {
	pub(crate) fn serialization(e: serde_json::Error) -> Self {
		Self::Serialization { message: e.to_string() }
	}
}

/// Namespaced key for one stored protocol record.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum StoreKey {
	/// `code:{code}` holding an [`AuthorizationCode`](crate::auth::AuthorizationCode).
	Code(String),
	/// `token:{access_token}` holding an [`AccessTokenRecord`](crate::auth::AccessTokenRecord).
	AccessToken(String),
	/// `refresh:{refresh_token}` holding a [`RefreshTokenRecord`](crate::auth::RefreshTokenRecord).
	RefreshToken(String),
}
impl StoreKey {
	/// Namespace prefix for the key.
	pub fn prefix(&self) -> &'static str {
		match self {
			Self::Code(_) => "code",
			Self::AccessToken(_) => "token",
			Self::RefreshToken(_) => "refresh",
		}
	}

	/// Wire form used by backends (`{prefix}:{value}`).
	pub fn render(&self) -> String {
		let value = match self {
			Self::Code(v) | Self::AccessToken(v) | Self::RefreshToken(v) => v,
		};

		format!("{}:{value}", self.prefix())
	}
}
impl Debug for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		// Key values are bearer secrets.
		write!(f, "StoreKey({}:<redacted>)", self.prefix())
	}
}

pub(crate) async fn put_record<T>(
	store: &dyn EphemeralStore,
	key: &StoreKey,
	record: &T,
	ttl: Duration,
) -> Result<(), StoreError>
where
	T: Serialize,
{
	let payload = serde_json::to_string(record).map_err(StoreError::serialization)?;

	store.set(key, payload, ttl).await
}

pub(crate) async fn get_record<T>(
	store: &dyn EphemeralStore,
	key: &StoreKey,
) -> Result<Option<T>, StoreError>
where
	T: DeserializeOwned,
{
	store.get(key).await?.map(|raw| decode(&raw)).transpose()
}

pub(crate) async fn take_record<T>(
	store: &dyn EphemeralStore,
	key: &StoreKey,
) -> Result<Option<T>, StoreError>
where
	T: DeserializeOwned,
{
	store.take(key).await?.map(|raw| decode(&raw)).transpose()
}

fn decode<T>(raw: &str) -> Result<T, StoreError>
where
	T: DeserializeOwned,
{
	serde_json::from_str(raw).map_err(StoreError::serialization)
}
