//! Token issuer: redeems an authorization code for an access/refresh token pair.
//!
//! Each step is a hard gate evaluated in order. The code is consumed with the store's atomic
//! `take` before any binding check runs, so a code presented with the wrong redirect URI or
//! verifier is burned as well; that matches RFC 6749 §10.5 guidance for suspected
//! interception. Token persistence happens last and is not compensated: if it fails after the
//! code was consumed, the client must restart the authorization.

// self
use crate::{
	_prelude::*,
	auth::{
		AccessTokenClaims, AccessTokenRecord, AuthorizationCode, GrantType, RefreshTokenRecord,
		id::random_alphanumeric, verify_pkce,
	},
	flows::{
		Authority,
		common::{self, REFRESH_TOKEN_LEN, TOKEN_ID_LEN},
	},
	http::{TokenRequest, TokenResponse},
	obs::{FlowKind, FlowSpan},
	store::{self, StoreKey},
};

const TOKEN_TYPE: &str = "Bearer";

impl Authority {
	/// Exchanges an authorization code at the token endpoint.
	pub async fn exchange_code(&self, request: TokenRequest) -> Result<TokenResponse> {
		common::observe(FlowKind::TokenExchange, "exchange_code", move |span| {
			self.exchange_code_inner(span, request)
		})
		.await
	}

	async fn exchange_code_inner(
		&self,
		span: FlowSpan,
		request: TokenRequest,
	) -> Result<TokenResponse> {
		match request.grant_type.parse::<GrantType>()? {
			GrantType::AuthorizationCode => (),
		}

		let client = self.find_client(&request.client_id).await?;

		if !client.verify_secret(&request.client_secret) {
			return Err(Error::ClientSecretMismatch);
		}

		let now = self.now();
		let code = self
			.bounded(store::take_record::<AuthorizationCode>(
				self.store.as_ref(),
				&StoreKey::Code(request.code),
			))
			.await?
			// Backends with coarse TTL granularity may still hand back a stale code.
			.filter(|code| code.is_active_at(now))
			.ok_or(Error::InvalidOrExpiredCode)?;

		if code.client_id != client.id {
			return Err(Error::ClientIdMismatch);
		}
		if code.redirect_uri != request.redirect_uri {
			return Err(Error::RedirectUriMismatch);
		}

		verify_pkce(code.pkce.as_ref(), request.code_verifier.as_deref())?;

		let access_ttl = self.config.access_token_ttl();
		let refresh_ttl = self.config.refresh_token_ttl();
		let claims = AccessTokenClaims::new(
			code.user_id.clone(),
			code.client_id.clone(),
			code.scope.clone(),
			now,
			access_ttl,
			random_alphanumeric(TOKEN_ID_LEN),
		);
		let access_token = self.signer().sign(&claims)?;
		let refresh_token = random_alphanumeric(REFRESH_TOKEN_LEN);
		let access_record = AccessTokenRecord {
			client_id: code.client_id.clone(),
			user_id: code.user_id.clone(),
			scope: code.scope.clone(),
			issued_at: now,
			expires_at: now + access_ttl,
		};
		let refresh_record = RefreshTokenRecord {
			client_id: code.client_id,
			user_id: code.user_id,
			scope: code.scope.clone(),
			issued_at: now,
			expires_at: now + refresh_ttl,
		};

		if let Err(e) = self
			.persist_tokens(&access_token, &access_record, &refresh_token, &refresh_record)
			.await
		{
			span.degraded("authorization code consumed but token persistence failed", &e);

			return Err(e);
		}

		Ok(TokenResponse {
			access_token,
			token_type: TOKEN_TYPE.into(),
			expires_in: access_ttl.whole_seconds(),
			refresh_token,
			scope: code.scope,
		})
	}

	async fn persist_tokens(
		&self,
		access_token: &str,
		access_record: &AccessTokenRecord,
		refresh_token: &str,
		refresh_record: &RefreshTokenRecord,
	) -> Result<()> {
		self.bounded(store::put_record(
			self.store.as_ref(),
			&StoreKey::AccessToken(access_token.to_owned()),
			access_record,
			self.config.access_token_ttl(),
		))
		.await?;
		self.bounded(store::put_record(
			self.store.as_ref(),
			&StoreKey::RefreshToken(refresh_token.to_owned()),
			refresh_record,
			self.config.refresh_token_ttl(),
		))
		.await
	}
}
