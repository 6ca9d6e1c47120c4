//! Authority-level error types shared across flows, collaborators, and wire responses.

// self
use crate::_prelude::*;

/// Authority-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical authority error exposed by public APIs.
///
/// Every variant except [`Error::Storage`] and [`Error::Config`] is a client-facing
/// validation failure detected while handling a single request.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Collaborator failure (store, directory, session store); retry with backoff.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or signing problem.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// Client identifier is unknown to the directory.
	#[error("Client is not registered.")]
	InvalidClient,
	/// Client secret does not match the registered secret.
	#[error("Client secret does not match.")]
	ClientSecretMismatch,
	/// Redirect URI does not match the client's registered redirect URI.
	#[error("Redirect URI does not match the registered redirect URI.")]
	InvalidRedirectUri,
	/// Redirect URI on the exchange differs from the one used at authorization time.
	#[error("Redirect URI differs from the one used at authorization time.")]
	RedirectUriMismatch,
	/// Client on the exchange differs from the one the code was issued to.
	#[error("Authorization code was issued to a different client.")]
	ClientIdMismatch,
	/// `response_type` other than `code`.
	#[error("Response type `{response_type}` is not supported.")]
	UnsupportedResponseType {
		/// Response type supplied by the caller.
		response_type: String,
	},
	/// `grant_type` other than `authorization_code`.
	#[error("Grant type `{grant_type}` is not supported.")]
	UnsupportedGrantType {
		/// Grant type supplied by the caller.
		grant_type: String,
	},
	/// Code never existed, was already consumed, or expired.
	#[error("Authorization code is invalid, expired, or already used.")]
	InvalidOrExpiredCode,
	/// PKCE verifier does not match the stored challenge, or one side is missing.
	#[error("PKCE verification failed.")]
	PkceVerificationFailed,
	/// Requested scope is unknown or exceeds what the client registered.
	#[error("Requested scope is invalid: {reason}.")]
	InvalidScope {
		/// Human-readable reason.
		reason: String,
	},
	/// Request is missing a parameter or carries a malformed one.
	#[error("Request is invalid: {reason}.")]
	InvalidRequest {
		/// Human-readable reason.
		reason: String,
	},
	/// Session holds no authorization awaiting the requested step.
	#[error("Session has no pending authorization for this step.")]
	NoPendingAuthorization,
	/// User rejected the consent prompt.
	#[error("User denied the authorization request.")]
	AccessDenied,

	/// No `Authorization` header was supplied.
	#[error("Authorization header is missing.")]
	MissingAuthHeader,
	/// `Authorization` header does not use the `Bearer <token>` form.
	#[error("Authorization header is malformed.")]
	MalformedAuthHeader,
	/// Token signature, algorithm, or structure is invalid.
	#[error("Bearer token is invalid.")]
	InvalidToken,
	/// Token expiry has passed.
	#[error("Bearer token has expired.")]
	TokenExpired,
	/// Token not-before instant is still in the future.
	#[error("Bearer token is not valid yet.")]
	TokenNotYetValid,
	/// Token verifies but its store record is gone (revoked or unknown).
	#[error("Bearer token has been revoked or is unknown.")]
	TokenRevokedOrUnknown,
}
impl Error {
	/// Builds an [`Error::InvalidRequest`] from any message.
	pub fn invalid_request(reason: impl Into<String>) -> Self {
		Self::InvalidRequest { reason: bare_reason(reason.into()) }
	}

	/// Builds an [`Error::InvalidScope`] from any message.
	pub fn invalid_scope(reason: impl Into<String>) -> Self {
		Self::InvalidScope { reason: bare_reason(reason.into()) }
	}

	/// Machine-readable OAuth 2.0 error code (RFC 6749 §4.1.2.1, §5.2; RFC 6750 §3.1).
	pub fn reason_code(&self) -> &'static str {
		match self {
			Self::Storage(_) => "temporarily_unavailable",
			Self::Config(_) => "server_error",
			Self::InvalidClient | Self::ClientSecretMismatch => "invalid_client",
			Self::InvalidOrExpiredCode
			| Self::RedirectUriMismatch
			| Self::ClientIdMismatch
			| Self::PkceVerificationFailed => "invalid_grant",
			Self::UnsupportedResponseType { .. } => "unsupported_response_type",
			Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
			Self::InvalidScope { .. } => "invalid_scope",
			Self::AccessDenied => "access_denied",
			Self::InvalidRedirectUri
			| Self::InvalidRequest { .. }
			| Self::NoPendingAuthorization
			| Self::MissingAuthHeader
			| Self::MalformedAuthHeader => "invalid_request",
			Self::InvalidToken
			| Self::TokenExpired
			| Self::TokenNotYetValid
			| Self::TokenRevokedOrUnknown => "invalid_token",
		}
	}

	/// HTTP status class a transport layer should answer with.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Storage(_) => 503,
			Self::Config(_) => 500,
			Self::AccessDenied => 403,
			Self::InvalidClient
			| Self::ClientSecretMismatch
			| Self::MissingAuthHeader
			| Self::InvalidToken
			| Self::TokenExpired
			| Self::TokenNotYetValid
			| Self::TokenRevokedOrUnknown => 401,
			_ => 400,
		}
	}

	/// Returns `true` when the caller may retry with backoff.
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Storage(_))
	}
}

/// Configuration and signing failures raised by the authority.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// The signing secret is empty.
	#[error("Signing secret cannot be empty.")]
	EmptySigningSecret,
	/// A lifetime setting is zero or negative.
	#[error("The {field} lifetime must be positive.")]
	NonPositiveLifetime {
		/// Offending configuration field.
		field: &'static str,
	},
	/// A lifetime setting exceeds the supported maximum.
	#[error("The {field} lifetime must not exceed {max_secs} seconds.")]
	LifetimeOutOfRange {
		/// Offending configuration field.
		field: &'static str,
		/// Largest accepted value, in seconds.
		max_secs: i64,
	},
	/// Configuration document could not be parsed.
	#[error("Configuration is invalid at `{path}`.")]
	Parse {
		/// Path to the offending field.
		path: String,
		/// Structured parsing failure.
		#[source]
		source: serde_json::Error,
	},
	/// Configured URI cannot be parsed.
	#[error("The {field} URI is invalid.")]
	InvalidUri {
		/// Offending configuration field.
		field: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token could not be signed.
	#[error("Access token could not be signed.")]
	Signing(#[source] jsonwebtoken::errors::Error),
}
impl From<serde_path_to_error::Error<serde_json::Error>> for ConfigError {
	fn from(e: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Parse { path: e.path().to_string(), source: e.into_inner() }
	}
}

// Nested error messages already end in a period; the outer message adds its own.
fn bare_reason(mut reason: String) -> String {
	while reason.ends_with('.') {
		reason.pop();
	}

	reason
}
