//! Protocol flows powered by the [`Authority`] facade.

pub mod authorize;
pub mod common;

mod exchange;
mod register;
mod revoke;
mod userinfo;

pub use authorize::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSigner,
	clock::{Clock, SystemClock},
	config::AuthorityConfig,
	consent::{ConsentLedger, MemoryConsentLedger},
	directory::ClientDirectory,
	error::ConfigError,
	profile::{DemoProfiles, ProfileSource},
	store::EphemeralStore,
};

/// Authorization server core: issues codes, redeems them for tokens, and validates bearers.
///
/// The authority owns shared handles to its collaborators (ephemeral store, client
/// directory, consent ledger, profile source, clock) plus the signer derived from the
/// configuration, so every flow implementation only deals with protocol rules. Sessions are
/// not owned; callers thread them through [`Authority::authorize`] and friends explicitly.
///
/// Collaborator calls are bounded with `tokio::time::timeout`, so the flows must run inside a
/// Tokio runtime with the time driver enabled.
#[derive(Clone)]
pub struct Authority {
	/// Validated configuration.
	pub config: AuthorityConfig,
	/// Code/token store.
	pub store: Arc<dyn EphemeralStore>,
	/// Registered clients.
	pub directory: Arc<dyn ClientDirectory>,
	/// Record of consent decisions.
	pub consents: Arc<dyn ConsentLedger>,
	/// Profile lookup for the `profile` scope.
	pub profiles: Arc<dyn ProfileSource>,
	/// Time source for issuance and expiry.
	pub clock: Arc<dyn Clock>,
	signer: TokenSigner,
}
impl Authority {
	/// Creates an authority over the provided collaborators.
	///
	/// Consent decisions default to a [`MemoryConsentLedger`], profiles to [`DemoProfiles`],
	/// and time to [`SystemClock`].
	pub fn new(
		config: AuthorityConfig,
		store: Arc<dyn EphemeralStore>,
		directory: Arc<dyn ClientDirectory>,
	) -> Result<Self, ConfigError> {
		config.validate()?;

		let signer =
			TokenSigner::new(&config.signing_secret, config.signing_algorithm, config.leeway())?;

		Ok(Self {
			config,
			store,
			directory,
			consents: Arc::new(MemoryConsentLedger::default()),
			profiles: Arc::new(DemoProfiles),
			clock: Arc::new(SystemClock),
			signer,
		})
	}

	/// Replaces the consent ledger.
	pub fn with_consents(mut self, consents: Arc<dyn ConsentLedger>) -> Self {
		self.consents = consents;

		self
	}

	/// Replaces the profile source.
	pub fn with_profiles(mut self, profiles: Arc<dyn ProfileSource>) -> Self {
		self.profiles = profiles;

		self
	}

	/// Replaces the clock; share it with the store so both agree on expiry.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Signer used for access tokens.
	pub fn signer(&self) -> &TokenSigner {
		&self.signer
	}
}
impl Debug for Authority {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authority")
			.field("config", &self.config)
			.field("signer", &self.signer)
			.finish_non_exhaustive()
	}
}
