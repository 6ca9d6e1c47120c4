//! Thread-safe in-memory [`EphemeralStore`] implementation for local development and tests.

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use crate::{
	_prelude::*,
	clock::{Clock, SystemClock},
	store::{EphemeralStore, StoreError, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<String, Entry>>>;

/// Every this many writes, `set` sweeps expired entries before inserting.
pub const SWEEP_INTERVAL: usize = 128;

#[derive(Clone, Debug)]
struct Entry {
	value: String,
	expires_at: OffsetDateTime,
}
impl Entry {
	fn is_live_at(&self, instant: OffsetDateTime) -> bool {
		instant < self.expires_at
	}
}

/// Storage backend that keeps entries in-process; expiry is evaluated lazily against the
/// injected [`Clock`].
///
/// Reads skip expired entries but leave them in place. Writes sweep them every
/// [`SWEEP_INTERVAL`] calls, and [`MemoryStore::purge_expired`] sweeps on demand.
#[derive(Clone)]
pub struct MemoryStore {
	map: StoreMap,
	writes: Arc<AtomicUsize>,
	clock: Arc<dyn Clock>,
}
impl MemoryStore {
	/// Creates an empty store driven by the provided clock.
	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { map: Default::default(), writes: Default::default(), clock }
	}

	/// Number of entries still held, including expired ones not yet purged.
	pub fn len(&self) -> usize {
		self.map.read().len()
	}

	/// Returns `true` when no entries are held.
	pub fn is_empty(&self) -> bool {
		self.map.read().is_empty()
	}

	/// Drops every expired entry and returns how many were removed.
	pub fn purge_expired(&self) -> usize {
		let now = self.clock.now();
		let mut guard = self.map.write();
		let before = guard.len();

		guard.retain(|_, entry| entry.is_live_at(now));

		before - guard.len()
	}

	fn set_now(&self, key: &StoreKey, value: String, ttl: Duration) -> Result<(), StoreError> {
		// Only the namespace goes into messages; the key value is a bearer secret.
		let prefix = key.prefix();

		if !ttl.is_positive() {
			return Err(StoreError::Backend {
				message: format!("TTL for a `{prefix}` entry must be positive"),
			});
		}

		let now = self.clock.now();
		let expires_at = now.checked_add(ttl).ok_or_else(|| StoreError::Backend {
			message: format!("TTL for a `{prefix}` entry is out of range"),
		})?;
		let sweep = self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL
			== SWEEP_INTERVAL - 1;
		let mut guard = self.map.write();

		if sweep {
			guard.retain(|_, entry| entry.is_live_at(now));
		}

		guard.insert(key.render(), Entry { value, expires_at });

		Ok(())
	}

	fn get_now(&self, key: &str) -> Option<String> {
		let now = self.clock.now();

		self.map.read().get(key).filter(|entry| entry.is_live_at(now)).map(|e| e.value.clone())
	}

	fn delete_now(&self, key: &str) -> bool {
		let now = self.clock.now();

		self.map.write().remove(key).is_some_and(|entry| entry.is_live_at(now))
	}

	fn take_now(&self, key: &str) -> Option<String> {
		let now = self.clock.now();
		// Remove under a single write guard so racing callers cannot both win.
		let removed = self.map.write().remove(key);

		removed.filter(|entry| entry.is_live_at(now)).map(|entry| entry.value)
	}
}
impl Default for MemoryStore {
	fn default() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}
}
impl Debug for MemoryStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryStore").field("entries", &self.len()).finish()
	}
}
impl EphemeralStore for MemoryStore {
	fn set<'a>(&'a self, key: &'a StoreKey, value: String, ttl: Duration) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.set_now(key, value, ttl) })
	}

	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>> {
		let key = key.render();

		Box::pin(async move { Ok(self.get_now(&key)) })
	}

	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool> {
		let key = key.render();

		Box::pin(async move { Ok(self.delete_now(&key)) })
	}

	fn take<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>> {
		let key = key.render();

		Box::pin(async move { Ok(self.take_now(&key)) })
	}
}
