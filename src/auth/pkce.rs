//! PKCE (RFC 7636) challenge storage and verifier checks.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
// self
use crate::_prelude::*;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}
impl FromStr for PkceCodeChallengeMethod {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"S256" => Ok(PkceCodeChallengeMethod::S256),
			other => Err(Error::invalid_request(format!(
				"code_challenge_method `{other}` is not supported"
			))),
		}
	}
}

/// Challenge captured from the authorization request and stored with the code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkceChallenge {
	/// Base64url (no padding) challenge value.
	pub challenge: String,
	/// Method used to derive the challenge.
	pub method: PkceCodeChallengeMethod,
}
impl PkceChallenge {
	/// Builds a challenge from raw authorization-request parameters.
	///
	/// Returns `Ok(None)` when neither parameter is present (plain, non-PKCE flow). A
	/// challenge without a method, or a method without a challenge, is rejected.
	pub fn from_request(challenge: Option<&str>, method: Option<&str>) -> Result<Option<Self>> {
		match (challenge.filter(|c| !c.is_empty()), method.filter(|m| !m.is_empty())) {
			(None, None) => Ok(None),
			(Some(challenge), Some(method)) =>
				Ok(Some(Self { challenge: challenge.to_owned(), method: method.parse()? })),
			(Some(_), None) => Err(Error::invalid_request("code_challenge_method is required")),
			(None, Some(_)) => Err(Error::invalid_request("code_challenge is required")),
		}
	}

	/// Derives the S256 challenge for a verifier.
	pub fn s256(verifier: &str) -> Self {
		Self { challenge: compute_pkce_challenge(verifier), method: PkceCodeChallengeMethod::S256 }
	}

	/// Returns true if `verifier` hashes to this challenge.
	pub fn matches(&self, verifier: &str) -> bool {
		let derived = match self.method {
			PkceCodeChallengeMethod::S256 => compute_pkce_challenge(verifier),
		};

		derived.as_bytes().ct_eq(self.challenge.as_bytes()).into()
	}
}

/// Applies the exchange-time PKCE rule.
///
/// No stored challenge means PKCE is not enforced, unless the caller sent a verifier
/// anyway. Otherwise the verifier must be present and hash to the stored challenge.
pub fn verify_pkce(stored: Option<&PkceChallenge>, verifier: Option<&str>) -> Result<()> {
	match (stored, verifier.filter(|v| !v.is_empty())) {
		(None, None) => Ok(()),
		(Some(challenge), Some(verifier)) if challenge.matches(verifier) => Ok(()),
		_ => Err(Error::PkceVerificationFailed),
	}
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	let digest = hasher.finalize();

	URL_SAFE_NO_PAD.encode(digest)
}
