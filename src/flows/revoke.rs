//! Explicit access-token revocation.

// self
use crate::{
	_prelude::*,
	flows::{Authority, common},
	obs::FlowKind,
	store::StoreKey,
};

impl Authority {
	/// Deletes the store record backing `access_token`; returns `true` when one was live.
	///
	/// The signed token stays cryptographically valid until `exp`, but bearer validation
	/// rejects it with [`Error::TokenRevokedOrUnknown`] from now on.
	pub async fn revoke_token(&self, access_token: &str) -> Result<bool> {
		common::observe(FlowKind::Revocation, "revoke_token", move |_| async move {
			self.bounded(self.store.delete(&StoreKey::AccessToken(access_token.to_owned()))).await
		})
		.await
	}
}
