//! Scope modeling helpers used across the authority.

// std
use std::slice::Iter;
// crates.io
use serde::{Deserializer, Serializer, de::Error as DeError};
// self
use crate::_prelude::*;

/// Errors emitted when validating scopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ScopeValidationError {
	/// Scope string contained only whitespace.
	#[error("Scope entries cannot be empty.")]
	Empty,
	/// Scope token is outside the recognized set.
	#[error("Scope `{scope}` is not recognized.")]
	Unknown {
		/// The offending scope token.
		scope: String,
	},
}

/// Scope tokens the authority knows how to project into userinfo claims.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KnownScope {
	/// Grants the `userid` claim.
	UserId,
	/// Grants the `username` and `phone` claims.
	Profile,
}
impl KnownScope {
	/// Every recognized scope, in canonical order.
	pub const ALL: [KnownScope; 2] = [KnownScope::UserId, KnownScope::Profile];

	/// Returns the wire token for the scope.
	pub const fn as_str(self) -> &'static str {
		match self {
			KnownScope::UserId => "userid",
			KnownScope::Profile => "profile",
		}
	}
}
impl Display for KnownScope {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for KnownScope {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"userid" => Ok(KnownScope::UserId),
			"profile" => Ok(KnownScope::Profile),
			other => Err(ScopeValidationError::Unknown { scope: other.to_owned() }),
		}
	}
}

/// De-duplicated scope list that keeps the order the caller supplied.
///
/// The wire form (see [`Display`] and the serde impls) is the space-delimited string, so a
/// scope requested as `"userid profile"` is echoed back verbatim in token responses.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ScopeSet(Vec<String>);
impl ScopeSet {
	/// Builds a set from individual tokens, dropping duplicates and empty tokens.
	pub fn new<I, S>(scopes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut tokens = Vec::new();

		for scope in scopes {
			let owned: String = scope.into();

			if !owned.is_empty() && !tokens.contains(&owned) {
				tokens.push(owned);
			}
		}

		Self(tokens)
	}

	/// Parses a space-delimited scope string and requires every token to be a [`KnownScope`].
	pub fn parse_known(raw: &str) -> Result<Self, ScopeValidationError> {
		let set: Self = raw.parse()?;

		if let Some(unknown) = set.iter().find(|scope| KnownScope::from_str(scope).is_err()) {
			return Err(ScopeValidationError::Unknown { scope: unknown.to_owned() });
		}

		Ok(set)
	}

	/// Number of distinct scopes.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no scopes are defined.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Returns true if the set contains the provided scope.
	pub fn contains(&self, scope: &str) -> bool {
		self.0.iter().any(|candidate| candidate == scope)
	}

	/// Returns true if every scope in `self` also appears in `other`.
	pub fn is_subset_of(&self, other: &ScopeSet) -> bool {
		self.iter().all(|scope| other.contains(scope))
	}

	/// Iterator over scope tokens.
	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(|s| s.as_str())
	}

	/// Recognized scopes in the set; unrecognized tokens are skipped.
	pub fn known(&self) -> impl Iterator<Item = KnownScope> + '_ {
		self.iter().filter_map(|scope| scope.parse().ok())
	}

	/// Returns the space-delimited representation.
	pub fn normalized(&self) -> String {
		self.0.join(" ")
	}
}
impl Debug for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("ScopeSet").field(&self.0).finish()
	}
}
impl Display for ScopeSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.normalized())
	}
}

/// Iterator over scope strings.
pub struct ScopeIter<'a> {
	inner: Iter<'a, String>,
}
impl<'a> Iterator for ScopeIter<'a> {
	type Item = &'a str;

	fn next(&mut self) -> Option<Self::Item> {
		self.inner.next().map(|s| s.as_str())
	}
}
impl<'a> IntoIterator for &'a ScopeSet {
	type IntoIter = ScopeIter<'a>;
	type Item = &'a str;

	fn into_iter(self) -> Self::IntoIter {
		ScopeIter { inner: self.0.iter() }
	}
}
impl FromStr for ScopeSet {
	type Err = ScopeValidationError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Ok(Self::default());
		}
		if s.chars().all(char::is_whitespace) {
			return Err(ScopeValidationError::Empty);
		}

		Ok(Self::new(s.split_whitespace()))
	}
}
impl Serialize for ScopeSet {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&self.normalized())
	}
}
impl<'de> Deserialize<'de> for ScopeSet {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let raw = String::deserialize(deserializer)?;

		raw.parse().map_err(DeError::custom)
	}
}
