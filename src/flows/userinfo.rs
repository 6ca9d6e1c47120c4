//! Token validator and userinfo projector.

// self
use crate::{
	_prelude::*,
	auth::{AccessTokenClaims, AccessTokenRecord, KnownScope, RecordStatus},
	flows::{Authority, common},
	http::{self, UserInfo},
	obs::FlowKind,
	store::{self, StoreKey},
};

impl Authority {
	/// Validates an `Authorization` header value and returns the token's claims.
	///
	/// The signature and time claims are checked first; the token must then still have a live
	/// store record whose own validity window covers the current instant, so deleting that
	/// record revokes the token before its natural expiry.
	pub async fn validate_bearer(&self, header: Option<&str>) -> Result<AccessTokenClaims> {
		common::observe(FlowKind::Userinfo, "validate_bearer", |_| {
			self.validate_bearer_inner(header)
		})
		.await
	}

	/// Projects identity claims according to the token's scope.
	///
	/// `userid` releases the subject; `profile` releases username and phone from the profile
	/// source. Unrecognized scope tokens are ignored.
	pub async fn userinfo(&self, header: Option<&str>) -> Result<UserInfo> {
		common::observe(FlowKind::Userinfo, "userinfo", move |_| async move {
			let claims = self.validate_bearer_inner(header).await?;
			let mut info = UserInfo::default();

			for scope in claims.scope.known() {
				match scope {
					KnownScope::UserId => info.userid = Some(claims.sub.to_string()),
					KnownScope::Profile => {
						let profile = self.bounded(self.profiles.profile(&claims.sub)).await?;

						if let Some(profile) = profile {
							info.username = Some(profile.username);
							info.phone = Some(profile.phone);
						}
					},
				}
			}

			Ok(info)
		})
		.await
	}

	async fn validate_bearer_inner(&self, header: Option<&str>) -> Result<AccessTokenClaims> {
		let token = http::parse_bearer(header)?;
		let claims = self.signer().verify(token, self.now())?;
		let record = self
			.bounded(store::get_record::<AccessTokenRecord>(
				self.store.as_ref(),
				&StoreKey::AccessToken(token.to_owned()),
			))
			.await?
			.ok_or(Error::TokenRevokedOrUnknown)?;

		if record.user_id != claims.sub || record.client_id != claims.aud {
			return Err(Error::InvalidToken);
		}

		// The record's own window is authoritative; backends may keep entries past their TTL.
		match record.status_at(self.now()) {
			RecordStatus::Active => Ok(claims),
			RecordStatus::Pending => Err(Error::TokenNotYetValid),
			RecordStatus::Expired => Err(Error::TokenExpired),
		}
	}
}
