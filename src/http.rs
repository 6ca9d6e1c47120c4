//! Transport-agnostic wire types for the authorize, token, userinfo, and registration
//! endpoints.
//!
//! Routing is left to the embedding server: it decodes requests into these types, hands them
//! to [`Authority`](crate::flows::Authority), and encodes the results (or an
//! [`ErrorResponse`] built from the returned [`Error`]) back onto the wire.

// self
use crate::{
	_prelude::*,
	auth::{Client, ClientId, GrantType, ScopeSet},
};

/// Parameters accepted by the authorize endpoint (query string or form body).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizeRequest {
	/// Must be `code`.
	pub response_type: String,
	/// Requesting client.
	pub client_id: String,
	/// Must equal the client's registered redirect URI.
	pub redirect_uri: String,
	/// Space-delimited scope; omitted means the client's registered scope.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Opaque value echoed back on the redirect.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	/// PKCE challenge.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code_challenge: Option<String>,
	/// PKCE challenge method; only `S256` is accepted.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code_challenge_method: Option<String>,
}

/// The user's answer on the consent prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsentDecision {
	/// Issue a code.
	Approve,
	/// Deny the client.
	Reject,
}

/// Redirect back to the client carrying either a code or an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationRedirect {
	/// Fully assembled `Location` value.
	pub location: Url,
}
impl AuthorizationRedirect {
	/// `redirect_uri?code=...&state=...`.
	pub fn code(redirect_uri: &str, code: &str, state: Option<&str>) -> Result<Self> {
		Self::build(redirect_uri, [("code", code)], state)
	}

	/// `redirect_uri?error=...&state=...`.
	pub fn error(redirect_uri: &str, error: &Error, state: Option<&str>) -> Result<Self> {
		Self::build(redirect_uri, [("error", error.reason_code())], state)
	}

	/// Returns the value of a query parameter on the location.
	pub fn param(&self, name: &str) -> Option<String> {
		self.location.query_pairs().find(|(k, _)| k == name).map(|(_, v)| v.into_owned())
	}

	fn build<const N: usize>(
		redirect_uri: &str,
		pairs: [(&str, &str); N],
		state: Option<&str>,
	) -> Result<Self> {
		let mut location = Url::parse(redirect_uri).map_err(|_| Error::InvalidRedirectUri)?;

		{
			let mut query = location.query_pairs_mut();

			query.extend_pairs(pairs);

			if let Some(state) = state {
				query.append_pair("state", state);
			}
		}

		Ok(Self { location })
	}
}

/// Form body accepted by the token endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenRequest {
	/// Must be `authorization_code`.
	pub grant_type: String,
	/// Code issued by the authorize endpoint.
	pub code: String,
	/// Must equal the redirect URI used on the authorize request.
	pub redirect_uri: String,
	/// Client identifier.
	pub client_id: String,
	/// Client secret.
	pub client_secret: String,
	/// PKCE verifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub code_verifier: Option<String>,
}
impl Debug for TokenRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRequest")
			.field("grant_type", &self.grant_type)
			.field("redirect_uri", &self.redirect_uri)
			.field("client_id", &self.client_id)
			.field("code_verifier_set", &self.code_verifier.is_some())
			.finish_non_exhaustive()
	}
}

/// JSON body returned by a successful exchange.
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenResponse {
	/// Signed bearer token.
	pub access_token: String,
	/// Always `Bearer`.
	pub token_type: String,
	/// Access-token lifetime in seconds.
	pub expires_in: i64,
	/// Opaque refresh token.
	pub refresh_token: String,
	/// Scope recorded on the code.
	pub scope: ScopeSet,
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("scope", &self.scope)
			.finish_non_exhaustive()
	}
}

/// Scope-filtered identity claims.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Present with the `userid` scope.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub userid: Option<String>,
	/// Present with the `profile` scope.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub username: Option<String>,
	/// Present with the `profile` scope.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub phone: Option<String>,
}

/// JSON body accepted by the registration endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
	/// Display name.
	pub name: String,
	/// Absolute redirect URI.
	pub redirect_url: String,
	/// Must be `authorization_code`.
	pub grant_type: String,
	/// Space-delimited scope drawn from `userid` and `profile`.
	pub scope: String,
}

/// Credentials returned once at registration.
#[derive(Clone, Serialize, Deserialize)]
pub struct RegistrationResponse {
	/// Generated client identifier.
	pub client_id: ClientId,
	/// Generated client secret; not retrievable afterwards.
	pub client_secret: String,
}
impl Debug for RegistrationResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegistrationResponse")
			.field("client_id", &self.client_id)
			.finish_non_exhaustive()
	}
}

/// Admin request flipping a client's auto-approve flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoApproveRequest {
	/// Target client.
	pub client_id: String,
	/// New flag value.
	pub auto_approve: bool,
}

/// Client listing entry with the secret stripped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSummary {
	/// Client identifier.
	pub id: ClientId,
	/// Display name.
	pub name: String,
	/// Registered redirect URI.
	pub redirect_url: String,
	/// Registered grant types.
	pub grant_types: Vec<GrantType>,
	/// Registered scope.
	pub scope: ScopeSet,
	/// Whether consent is skipped.
	pub auto_approve: bool,
	/// Registration instant.
	pub created_at: OffsetDateTime,
	/// Last administrative update.
	pub updated_at: OffsetDateTime,
}
impl From<&Client> for ClientSummary {
	fn from(client: &Client) -> Self {
		Self {
			id: client.id.clone(),
			name: client.name.clone(),
			redirect_url: client.redirect_uri.clone(),
			grant_types: client.grant_types.clone(),
			scope: client.scope.clone(),
			auto_approve: client.auto_approve,
			created_at: client.created_at,
			updated_at: client.updated_at,
		}
	}
}

/// RFC 6749 §5.2 error body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Machine-readable reason code.
	pub error: String,
	/// Human-readable detail.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
}
impl From<&Error> for ErrorResponse {
	fn from(e: &Error) -> Self {
		let description = match e {
			// Internal failures stay opaque to callers.
			Error::Config(_) => None,
			Error::Storage(_) =>
				Some("The authorization server is temporarily unavailable.".into()),
			other => Some(other.to_string()),
		};

		Self { error: e.reason_code().into(), error_description: description }
	}
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(header: Option<&str>) -> Result<&str> {
	let header = header.ok_or(Error::MissingAuthHeader)?;
	let (scheme, token) = header.split_once(' ').ok_or(Error::MalformedAuthHeader)?;
	let token = token.trim();

	if !scheme.eq_ignore_ascii_case("bearer")
		|| token.is_empty()
		|| token.contains(char::is_whitespace)
	{
		return Err(Error::MalformedAuthHeader);
	}

	Ok(token)
}
