//! OAuth 2.0 authorization-code authority: consent-gated code issuance, single-use code
//! redemption with PKCE, HMAC-signed bearer tokens, and scope-filtered userinfo, all running
//! against pluggable store, directory, and session collaborators.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod config;
pub mod consent;
pub mod directory;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod profile;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test`
	//! crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::UserId,
		clock::ManualClock,
		config::AuthorityConfig,
		consent::MemoryConsentLedger,
		directory::MemoryDirectory,
		flows::Authority,
		http::RegistrationRequest,
		profile::DemoProfiles,
		session::Session,
		store::MemoryStore,
	};

	/// Signing secret shared by every test authority.
	pub const TEST_SIGNING_SECRET: &str = "test-signing-secret-with-enough-entropy";

	/// Collaborators backing a test [`Authority`], exposed so tests can poke at them.
	#[derive(Clone, Debug)]
	pub struct TestHarness {
		/// Authority under test.
		pub authority: Authority,
		/// In-memory code/token store.
		pub store: Arc<MemoryStore>,
		/// In-memory client directory.
		pub directory: Arc<MemoryDirectory>,
		/// In-memory consent ledger.
		pub consents: Arc<MemoryConsentLedger>,
		/// Clock shared by the authority and the store.
		pub clock: Arc<ManualClock>,
	}

	/// Builds an [`Authority`] over in-memory collaborators and a manual clock pinned to the
	/// current instant.
	pub fn build_test_authority() -> TestHarness {
		let clock = Arc::new(ManualClock::new(OffsetDateTime::now_utc()));
		let store = Arc::new(MemoryStore::with_clock(clock.clone()));
		let directory = Arc::new(MemoryDirectory::default());
		let consents = Arc::new(MemoryConsentLedger::default());
		let config = AuthorityConfig::builder(TEST_SIGNING_SECRET)
			.build()
			.expect("Test authority config should be valid.");
		let authority = Authority::new(config, store.clone(), directory.clone())
			.expect("Test authority should build.")
			.with_profiles(Arc::new(DemoProfiles))
			.with_consents(consents.clone())
			.with_clock(clock.clone());

		TestHarness { authority, store, directory, consents, clock }
	}

	/// Registration payload used across tests.
	pub fn registration(scope: &str) -> RegistrationRequest {
		RegistrationRequest {
			name: "App".into(),
			redirect_url: "http://localhost:3000/cb".into(),
			grant_type: "authorization_code".into(),
			scope: scope.into(),
		}
	}

	/// Returns a fresh session with `test_user` already logged in.
	pub fn logged_in_session() -> Session {
		let mut session = Session::generate();

		session.log_in(UserId::new("test_user").expect("Test user id should be valid."));

		session
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use color_eyre as _;
