//! Authority configuration: signing material, lifetimes, and interactive-step locations.

// self
use crate::{
	_prelude::*,
	auth::{Secret, SigningAlgorithm},
	error::ConfigError,
};

const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3_600;
const DEFAULT_CODE_TTL_SECS: i64 = 600;
const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 3_600;
const DEFAULT_LEEWAY_SECS: i64 = 30;
const DEFAULT_COLLABORATOR_TIMEOUT_MS: i64 = 5_000;
// Keeps `issued_at + ttl` far inside the representable date range.
const MAX_LIFETIME_SECS: i64 = 10 * 366 * 24 * 3_600;
const DEFAULT_LOGIN_URI: &str = "/login";
const DEFAULT_CONSENT_URI: &str = "/auth";

/// Validated authority configuration.
///
/// Lifetimes are plain seconds (milliseconds for the collaborator timeout) on the wire so a
/// JSON document such as `{"signing_secret":"...","access_token_ttl_secs":900}` is enough.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorityConfig {
	/// HMAC secret used to sign access tokens.
	pub signing_secret: Secret,
	/// HMAC variant.
	pub signing_algorithm: SigningAlgorithm,
	/// Access-token lifetime in seconds.
	pub access_token_ttl_secs: i64,
	/// Authorization-code lifetime in seconds.
	pub code_ttl_secs: i64,
	/// Refresh-token lifetime in seconds.
	pub refresh_token_ttl_secs: i64,
	/// Clock-skew tolerance applied to `exp`/`nbf` checks, in seconds.
	pub leeway_secs: i64,
	/// Upper bound for each store or directory call, in milliseconds; `None` disables it.
	pub collaborator_timeout_ms: Option<i64>,
	/// Where a transport sends users that must log in first.
	pub login_uri: String,
	/// Where a transport renders the consent prompt.
	pub consent_uri: String,
}
impl AuthorityConfig {
	/// Starts a builder seeded with defaults and the given signing secret.
	pub fn builder(signing_secret: impl Into<String>) -> AuthorityConfigBuilder {
		AuthorityConfigBuilder::new(signing_secret)
	}

	/// Parses and validates a JSON document, reporting the failing field path.
	pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
		let de = &mut serde_json::Deserializer::from_slice(bytes);
		let config: Self = serde_path_to_error::deserialize(de)?;

		config.validate()?;

		Ok(config)
	}

	/// Checks secrets, lifetimes, and locations.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.signing_secret.expose().is_empty() {
			return Err(ConfigError::EmptySigningSecret);
		}

		for (field, value) in [
			("access_token", self.access_token_ttl_secs),
			("code", self.code_ttl_secs),
			("refresh_token", self.refresh_token_ttl_secs),
		] {
			if value <= 0 {
				return Err(ConfigError::NonPositiveLifetime { field });
			}

			check_upper_bound(field, value)?;
		}

		if self.leeway_secs < 0 {
			return Err(ConfigError::NonPositiveLifetime { field: "leeway" });
		}

		check_upper_bound("leeway", self.leeway_secs)?;

		if let Some(ms) = self.collaborator_timeout_ms {
			if ms <= 0 {
				return Err(ConfigError::NonPositiveLifetime { field: "collaborator_timeout" });
			}

			check_upper_bound("collaborator_timeout", ms / 1_000)?;
		}

		validate_location("login", &self.login_uri)?;
		validate_location("consent", &self.consent_uri)?;

		Ok(())
	}

	/// Access-token lifetime.
	pub fn access_token_ttl(&self) -> Duration {
		Duration::seconds(self.access_token_ttl_secs)
	}

	/// Authorization-code lifetime.
	pub fn code_ttl(&self) -> Duration {
		Duration::seconds(self.code_ttl_secs)
	}

	/// Refresh-token lifetime.
	pub fn refresh_token_ttl(&self) -> Duration {
		Duration::seconds(self.refresh_token_ttl_secs)
	}

	/// Clock-skew tolerance for token validation.
	pub fn leeway(&self) -> Duration {
		Duration::seconds(self.leeway_secs)
	}

	/// Deadline for a single collaborator call.
	pub fn collaborator_timeout(&self) -> Option<Duration> {
		self.collaborator_timeout_ms.map(Duration::milliseconds)
	}
}
impl Default for AuthorityConfig {
	fn default() -> Self {
		Self {
			signing_secret: Secret::new(""),
			signing_algorithm: SigningAlgorithm::default(),
			access_token_ttl_secs: DEFAULT_ACCESS_TOKEN_TTL_SECS,
			code_ttl_secs: DEFAULT_CODE_TTL_SECS,
			refresh_token_ttl_secs: DEFAULT_REFRESH_TOKEN_TTL_SECS,
			leeway_secs: DEFAULT_LEEWAY_SECS,
			collaborator_timeout_ms: Some(DEFAULT_COLLABORATOR_TIMEOUT_MS),
			login_uri: DEFAULT_LOGIN_URI.into(),
			consent_uri: DEFAULT_CONSENT_URI.into(),
		}
	}
}

/// Builder for [`AuthorityConfig`] values.
#[derive(Debug)]
pub struct AuthorityConfigBuilder {
	config: AuthorityConfig,
}
impl AuthorityConfigBuilder {
	/// Creates a builder with defaults and the provided secret.
	pub fn new(signing_secret: impl Into<String>) -> Self {
		Self {
			config: AuthorityConfig {
				signing_secret: Secret::new(signing_secret),
				..Default::default()
			},
		}
	}

	/// Overrides the HMAC variant.
	pub fn signing_algorithm(mut self, algorithm: SigningAlgorithm) -> Self {
		self.config.signing_algorithm = algorithm;

		self
	}

	/// Overrides the access-token lifetime.
	pub fn access_token_ttl(mut self, ttl: Duration) -> Self {
		self.config.access_token_ttl_secs = ttl.whole_seconds();

		self
	}

	/// Overrides the authorization-code lifetime.
	pub fn code_ttl(mut self, ttl: Duration) -> Self {
		self.config.code_ttl_secs = ttl.whole_seconds();

		self
	}

	/// Overrides the refresh-token lifetime.
	pub fn refresh_token_ttl(mut self, ttl: Duration) -> Self {
		self.config.refresh_token_ttl_secs = ttl.whole_seconds();

		self
	}

	/// Overrides the clock-skew tolerance.
	pub fn leeway(mut self, leeway: Duration) -> Self {
		self.config.leeway_secs = leeway.whole_seconds();

		self
	}

	/// Overrides or disables the collaborator deadline.
	pub fn collaborator_timeout(mut self, timeout: Option<Duration>) -> Self {
		self.config.collaborator_timeout_ms = timeout.map(|t| t.whole_milliseconds() as i64);

		self
	}

	/// Overrides the login location.
	pub fn login_uri(mut self, uri: impl Into<String>) -> Self {
		self.config.login_uri = uri.into();

		self
	}

	/// Overrides the consent location.
	pub fn consent_uri(mut self, uri: impl Into<String>) -> Self {
		self.config.consent_uri = uri.into();

		self
	}

	/// Consumes the builder and validates the configuration.
	pub fn build(self) -> Result<AuthorityConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

fn check_upper_bound(field: &'static str, secs: i64) -> Result<(), ConfigError> {
	if secs > MAX_LIFETIME_SECS {
		return Err(ConfigError::LifetimeOutOfRange { field, max_secs: MAX_LIFETIME_SECS });
	}

	Ok(())
}

// Locations may be absolute or relative to the authority's own origin.
fn validate_location(field: &'static str, value: &str) -> Result<(), ConfigError> {
	let base = Url::parse("http://authority.invalid/")
		.map_err(|source| ConfigError::InvalidUri { field, source })?;

	if value.trim().is_empty() {
		return Err(ConfigError::InvalidUri { field, source: url::ParseError::EmptyHost });
	}

	base.join(value).map(|_| ()).map_err(|source| ConfigError::InvalidUri { field, source })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn builder_applies_defaults() {
		let config = AuthorityConfig::builder("secret").build().expect("Defaults should be valid.");

		assert_eq!(config.access_token_ttl(), Duration::hours(1));
		assert_eq!(config.code_ttl(), Duration::minutes(10));
		assert_eq!(config.refresh_token_ttl(), Duration::days(30));
		assert_eq!(config.leeway(), Duration::seconds(30));
		assert_eq!(config.collaborator_timeout(), Some(Duration::seconds(5)));
		assert_eq!(config.signing_algorithm, SigningAlgorithm::HS256);
		assert_eq!(config.login_uri, "/login");
		assert_eq!(config.consent_uri, "/auth");
	}

	#[test]
	fn builder_rejects_invalid_values() {
		assert!(matches!(
			AuthorityConfig::builder("").build(),
			Err(ConfigError::EmptySigningSecret)
		));
		assert!(matches!(
			AuthorityConfig::builder("secret").access_token_ttl(Duration::ZERO).build(),
			Err(ConfigError::NonPositiveLifetime { field: "access_token" })
		));
		assert!(matches!(
			AuthorityConfig::builder("secret").leeway(Duration::days(5_000)).build(),
			Err(ConfigError::LifetimeOutOfRange { field: "leeway", .. })
		));
		assert!(matches!(
			AuthorityConfig::builder("secret")
				.collaborator_timeout(Some(Duration::days(5_000)))
				.build(),
			Err(ConfigError::LifetimeOutOfRange { field: "collaborator_timeout", .. })
		));
		assert!(matches!(
			AuthorityConfig::builder("secret").login_uri("http://[::1").build(),
			Err(ConfigError::InvalidUri { field: "login", .. })
		));
	}

	#[test]
	fn json_errors_report_field_paths() {
		let config = AuthorityConfig::from_json_slice(
			br#"{"signing_secret":"secret","access_token_ttl_secs":900,"signing_algorithm":"HS512"}"#,
		)
		.expect("Partial config should fill defaults.");

		assert_eq!(config.access_token_ttl(), Duration::minutes(15));
		assert_eq!(config.signing_algorithm, SigningAlgorithm::HS512);
		assert_eq!(config.code_ttl(), Duration::minutes(10));

		let err = AuthorityConfig::from_json_slice(
			br#"{"signing_secret":"secret","code_ttl_secs":"ten minutes"}"#,
		)
		.expect_err("String lifetimes must be rejected.");

		assert!(matches!(err, ConfigError::Parse { ref path, .. } if path == "code_ttl_secs"));
	}

	#[test]
	fn oversized_lifetimes_are_rejected_before_use() {
		let err = AuthorityConfig::from_json_slice(
			br#"{"signing_secret":"secret","access_token_ttl_secs":1000000000000}"#,
		)
		.expect_err("An unrepresentable lifetime must be rejected.");

		assert!(matches!(err, ConfigError::LifetimeOutOfRange { field: "access_token", .. }));

		let config = AuthorityConfig::builder("secret")
			.refresh_token_ttl(Duration::days(3_650))
			.build()
			.expect("Ten years is within range.");

		assert_eq!(config.refresh_token_ttl(), Duration::days(3_650));
	}

	#[test]
	fn debug_output_redacts_secret() {
		let config = AuthorityConfig::builder("very-secret").build().expect("Config should build.");

		assert!(!format!("{config:?}").contains("very-secret"));
	}
}
