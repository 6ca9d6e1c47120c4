//! Registered client records and the grant types they may use.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, Secret},
};

/// OAuth 2.0 grant types understood by the authority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code grant (PKCE optional).
	AuthorizationCode,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for GrantType {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"authorization_code" => Ok(GrantType::AuthorizationCode),
			other => Err(Error::UnsupportedGrantType { grant_type: other.to_owned() }),
		}
	}
}

/// Client record as held by the [`ClientDirectory`](crate::directory::ClientDirectory).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Client {
	/// Unique client identifier.
	pub id: ClientId,
	/// Shared secret presented at the token endpoint.
	pub secret: Secret,
	/// Display name shown on the consent prompt.
	pub name: String,
	/// Registered redirect URI; authorization requests must match it exactly.
	pub redirect_uri: String,
	/// Grants the client may use.
	pub grant_types: Vec<GrantType>,
	/// Scope the client registered for; requests may ask for a subset.
	pub scope: ScopeSet,
	/// Skips the interactive consent step when set.
	pub auto_approve: bool,
	/// Registration instant.
	pub created_at: OffsetDateTime,
	/// Last administrative update.
	pub updated_at: OffsetDateTime,
}
impl Client {
	/// Returns true if the client registered the provided grant.
	pub fn supports(&self, grant: GrantType) -> bool {
		self.grant_types.contains(&grant)
	}

	/// Byte-exact, constant-time secret comparison.
	pub fn verify_secret(&self, presented: &str) -> bool {
		self.secret.verify(presented)
	}

	/// Byte-exact redirect URI comparison.
	pub fn redirect_matches(&self, presented: &str) -> bool {
		self.redirect_uri == presented
	}
}
