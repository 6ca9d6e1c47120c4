//! Access-token claims, stored token records, and the HMAC signer that mints bearer tokens.

// crates.io
use jsonwebtoken::{
	Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
// self
use crate::{
	_prelude::*,
	auth::{
		ClientId, ScopeSet, Secret, UserId,
		code::{RecordStatus, status_between},
	},
	error::ConfigError,
};

/// HMAC algorithms accepted for access-token signing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningAlgorithm {
	/// HMAC with SHA-256.
	#[default]
	HS256,
	/// HMAC with SHA-384.
	HS384,
	/// HMAC with SHA-512.
	HS512,
}
impl SigningAlgorithm {
	fn jwt(self) -> Algorithm {
		match self {
			SigningAlgorithm::HS256 => Algorithm::HS256,
			SigningAlgorithm::HS384 => Algorithm::HS384,
			SigningAlgorithm::HS512 => Algorithm::HS512,
		}
	}
}

/// Claims carried by every access token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
	/// Resource owner.
	pub sub: UserId,
	/// Client the token was issued to.
	pub aud: ClientId,
	/// Granted scope, space-delimited on the wire.
	pub scope: ScopeSet,
	/// Issue instant, seconds since the epoch.
	pub iat: i64,
	/// Not-before instant, seconds since the epoch.
	pub nbf: i64,
	/// Expiry instant, seconds since the epoch.
	pub exp: i64,
	/// Unique token identifier.
	pub jti: String,
}
impl AccessTokenClaims {
	/// Builds claims valid from `issued_at` for `ttl`.
	pub fn new(
		user_id: UserId,
		client_id: ClientId,
		scope: ScopeSet,
		issued_at: OffsetDateTime,
		ttl: Duration,
		jti: String,
	) -> Self {
		let iat = issued_at.unix_timestamp();

		Self {
			sub: user_id,
			aud: client_id,
			scope,
			iat,
			nbf: iat,
			exp: (issued_at + ttl).unix_timestamp(),
			jti,
		}
	}
}

/// Server-side record under `token:{access_token}`; its presence is what keeps a token alive.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenRecord {
	/// Client the token was issued to.
	pub client_id: ClientId,
	/// Resource owner.
	pub user_id: UserId,
	/// Granted scope.
	pub scope: ScopeSet,
	/// Issue instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
}
impl AccessTokenRecord {
	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> RecordStatus {
		status_between(self.issued_at, self.expires_at, instant)
	}
}

/// Record under `refresh:{refresh_token}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTokenRecord {
	/// Client the token was issued to.
	pub client_id: ClientId,
	/// Resource owner.
	pub user_id: UserId,
	/// Granted scope.
	pub scope: ScopeSet,
	/// Issue instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
}

/// Signs and verifies access tokens with a shared HMAC secret.
///
/// Time-based claims are checked against the instant the caller passes in rather than the
/// wall clock, so the authority's injected clock governs expiry everywhere.
#[derive(Clone)]
pub struct TokenSigner {
	encoding: EncodingKey,
	decoding: DecodingKey,
	algorithm: SigningAlgorithm,
	leeway: Duration,
}
impl TokenSigner {
	/// Creates a signer; rejects empty secrets.
	pub fn new(
		secret: &Secret,
		algorithm: SigningAlgorithm,
		leeway: Duration,
	) -> Result<Self, ConfigError> {
		if secret.expose().is_empty() {
			return Err(ConfigError::EmptySigningSecret);
		}

		let bytes = secret.expose().as_bytes();

		Ok(Self {
			encoding: EncodingKey::from_secret(bytes),
			decoding: DecodingKey::from_secret(bytes),
			algorithm,
			leeway,
		})
	}

	/// Produces the compact JWS for `claims`.
	pub fn sign(&self, claims: &AccessTokenClaims) -> Result<String, ConfigError> {
		jsonwebtoken::encode(&Header::new(self.algorithm.jwt()), claims, &self.encoding)
			.map_err(ConfigError::Signing)
	}

	/// Verifies signature, algorithm, and time claims at `now`.
	pub fn verify(&self, token: &str, now: OffsetDateTime) -> Result<AccessTokenClaims> {
		let mut validation = Validation::new(self.algorithm.jwt());

		validation.validate_exp = false;
		validation.validate_nbf = false;
		validation.validate_aud = false;
		validation.set_required_spec_claims(&["exp", "nbf", "sub"]);

		let claims = jsonwebtoken::decode::<AccessTokenClaims>(token, &self.decoding, &validation)
			.map_err(|e| match e.kind() {
				ErrorKind::ExpiredSignature => Error::TokenExpired,
				ErrorKind::ImmatureSignature => Error::TokenNotYetValid,
				_ => Error::InvalidToken,
			})?
			.claims;
		let now = now.unix_timestamp();
		let leeway = self.leeway.whole_seconds();

		if now > claims.exp.saturating_add(leeway) {
			return Err(Error::TokenExpired);
		}
		if claims.nbf > now.saturating_add(leeway) {
			return Err(Error::TokenNotYetValid);
		}

		Ok(claims)
	}
}
impl Debug for TokenSigner {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenSigner")
			.field("algorithm", &self.algorithm)
			.field("leeway", &self.leeway)
			.finish_non_exhaustive()
	}
}
