//! Authorization flow controller: login, consent, and code issuance.
//!
//! A request moves through `Start → AwaitingLogin → AwaitingConsent → Approved | Rejected`.
//! The session carries the parked request between steps, so the login resume and the consent
//! decision always replay the original parameters rather than trusting a fresh request. The
//! client record is re-read from the directory at every step, and every decision (including
//! auto-approval) is appended to the consent ledger once it has taken effect.

// self
use crate::{
	_prelude::*,
	auth::{
		AuthorizationCode, Client, ClientId, GrantType, PkceChallenge, ScopeSet, UserId,
		id::random_alphanumeric,
	},
	consent::AuthorizationRecord,
	flows::{
		Authority,
		common::{self, CODE_LEN},
	},
	http::{AuthorizationRedirect, AuthorizeRequest, ConsentDecision},
	obs::{FlowKind, FlowSpan},
	session::{PendingAuthorization, Session},
	store::{self, StoreKey},
};

/// Result of an authorize or login-resume step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthorizeOutcome {
	/// The session has no user; send the browser to the login location.
	LoginRequired {
		/// Configured login location.
		login_uri: String,
	},
	/// The user must approve or reject the client.
	ConsentRequired(ConsentPrompt),
	/// The flow finished; redirect back to the client.
	Redirect(AuthorizationRedirect),
}

/// Data a transport needs to render the consent page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsentPrompt {
	/// Requesting client.
	pub client_id: ClientId,
	/// Client display name.
	pub client_name: String,
	/// Scope the client asks for.
	pub scope: ScopeSet,
	/// Configured consent location.
	pub consent_uri: String,
}

struct ValidatedRequest {
	client: Client,
	scope: ScopeSet,
	pkce: Option<PkceChallenge>,
}

impl Authority {
	/// Entry point of the authorize endpoint.
	///
	/// Validation failures are returned as errors and leave the session untouched; the caller
	/// renders them directly instead of redirecting, since the redirect URI itself may be the
	/// thing that failed.
	pub async fn authorize(
		&self,
		session: &mut Session,
		request: AuthorizeRequest,
	) -> Result<AuthorizeOutcome> {
		common::observe(FlowKind::Authorize, "authorize", move |span| async move {
			let validated = self.validate_request(&request).await?;

			match session.user().cloned() {
				Some(user) => self.advance(&span, session, request, validated, user).await,
				None => {
					session.set_pending(PendingAuthorization::AwaitingLogin { request });

					Ok(AuthorizeOutcome::LoginRequired { login_uri: self.config.login_uri.clone() })
				},
			}
		})
		.await
	}

	/// Records a successful login and resumes the request parked by [`Authority::authorize`].
	///
	/// A retryable failure puts the parked request back so the browser can simply retry.
	pub async fn complete_login(
		&self,
		session: &mut Session,
		user: UserId,
	) -> Result<AuthorizeOutcome> {
		common::observe(FlowKind::Authorize, "complete_login", move |span| async move {
			session.log_in(user.clone());

			let request = match session.take_pending() {
				Some(PendingAuthorization::AwaitingLogin { request }) => request,
				other => {
					if let Some(pending) = other {
						session.set_pending(pending);
					}

					return Err(Error::NoPendingAuthorization);
				},
			};
			let result = match self.validate_request(&request).await {
				Ok(validated) =>
					self.advance(&span, session, request.clone(), validated, user).await,
				Err(e) => Err(e),
			};

			if result.as_ref().is_err_and(Error::is_retryable) {
				session.set_pending(PendingAuthorization::AwaitingLogin { request });
			}

			result
		})
		.await
	}

	/// Applies the user's answer to the consent prompt.
	///
	/// Approval issues a code; rejection yields an `access_denied` redirect. Either way the
	/// pending slot is cleared and the decision lands in the consent ledger, unless a
	/// retryable failure occurs first, in which case the prompt stays pending.
	pub async fn decide_consent(
		&self,
		session: &mut Session,
		decision: ConsentDecision,
	) -> Result<AuthorizationRedirect> {
		common::observe(FlowKind::Consent, "decide_consent", move |span| async move {
			let (request, user) = match session.take_pending() {
				Some(PendingAuthorization::AwaitingConsent { request, user })
					if session.user() == Some(&user) =>
					(request, user),
				other => {
					if let Some(pending) = other {
						session.set_pending(pending);
					}

					return Err(Error::NoPendingAuthorization);
				},
			};
			let result = self.apply_decision(&span, &request, user.clone(), decision).await;

			if result.as_ref().is_err_and(Error::is_retryable) {
				session.set_pending(PendingAuthorization::AwaitingConsent { request, user });
			}

			result
		})
		.await
	}

	async fn apply_decision(
		&self,
		span: &FlowSpan,
		request: &AuthorizeRequest,
		user: UserId,
		decision: ConsentDecision,
	) -> Result<AuthorizationRedirect> {
		let validated = self.validate_request(request).await?;

		match decision {
			ConsentDecision::Approve => self.issue_code(span, request, validated, user).await,
			ConsentDecision::Reject => {
				let redirect = AuthorizationRedirect::error(
					&validated.client.redirect_uri,
					&Error::AccessDenied,
					request.state.as_deref(),
				)?;

				self.record_decision(span, &validated, user, false).await;

				Ok(redirect)
			},
		}
	}

	async fn advance(
		&self,
		span: &FlowSpan,
		session: &mut Session,
		request: AuthorizeRequest,
		validated: ValidatedRequest,
		user: UserId,
	) -> Result<AuthorizeOutcome> {
		if validated.client.auto_approve {
			let redirect = self.issue_code(span, &request, validated, user).await?;

			session.take_pending();

			return Ok(AuthorizeOutcome::Redirect(redirect));
		}

		let prompt = ConsentPrompt {
			client_id: validated.client.id.clone(),
			client_name: validated.client.name.clone(),
			scope: validated.scope,
			consent_uri: self.config.consent_uri.clone(),
		};

		session.set_pending(PendingAuthorization::AwaitingConsent { request, user });

		Ok(AuthorizeOutcome::ConsentRequired(prompt))
	}

	async fn issue_code(
		&self,
		span: &FlowSpan,
		request: &AuthorizeRequest,
		validated: ValidatedRequest,
		user: UserId,
	) -> Result<AuthorizationRedirect> {
		let code = random_alphanumeric(CODE_LEN);
		let issued_at = self.now();
		let record = AuthorizationCode {
			client_id: validated.client.id.clone(),
			user_id: user.clone(),
			scope: validated.scope.clone(),
			redirect_uri: request.redirect_uri.clone(),
			pkce: validated.pkce.clone(),
			issued_at,
			expires_at: issued_at + self.config.code_ttl(),
		};

		// Build the redirect first so a malformed URI never leaves a redeemable code behind.
		let redirect =
			AuthorizationRedirect::code(&request.redirect_uri, &code, request.state.as_deref())?;

		self.bounded(store::put_record(
			self.store.as_ref(),
			&StoreKey::Code(code),
			&record,
			self.config.code_ttl(),
		))
		.await?;
		self.record_decision(span, &validated, user, true).await;

		Ok(redirect)
	}

	// The decision already took effect; a ledger outage is logged rather than surfaced.
	async fn record_decision(
		&self,
		span: &FlowSpan,
		validated: &ValidatedRequest,
		user: UserId,
		approved: bool,
	) {
		let record = AuthorizationRecord {
			client_id: validated.client.id.clone(),
			user_id: user,
			scope: validated.scope.clone(),
			approved,
			created_at: self.now(),
		};

		if let Err(e) = self.bounded(self.consents.record(record)).await {
			span.degraded("consent decision applied but not recorded", &e);
		}
	}

	async fn validate_request(&self, request: &AuthorizeRequest) -> Result<ValidatedRequest> {
		let client = self.find_client(&request.client_id).await?;

		if request.response_type != "code" {
			return Err(Error::UnsupportedResponseType {
				response_type: request.response_type.clone(),
			});
		}
		if !client.redirect_matches(&request.redirect_uri) {
			return Err(Error::InvalidRedirectUri);
		}
		if !client.supports(GrantType::AuthorizationCode) {
			return Err(Error::UnsupportedGrantType {
				grant_type: GrantType::AuthorizationCode.to_string(),
			});
		}

		let scope = match request.scope.as_deref().map(str::trim) {
			None | Some("") => client.scope.clone(),
			Some(raw) => {
				let requested =
					ScopeSet::parse_known(raw).map_err(|e| Error::invalid_scope(e.to_string()))?;

				if !requested.is_subset_of(&client.scope) {
					return Err(Error::invalid_scope(format!(
						"`{requested}` exceeds the registered scope `{}`",
						client.scope
					)));
				}

				requested
			},
		};
		let pkce = PkceChallenge::from_request(
			request.code_challenge.as_deref(),
			request.code_challenge_method.as_deref(),
		)?;

		Ok(ValidatedRequest { client, scope, pkce })
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicBool, Ordering};
	// self
	use super::*;
	use crate::{
		_preludet::*,
		auth::Client,
		config::AuthorityConfig,
		consent::ConsentLedger,
		directory::{ClientDirectory, MemoryDirectory},
		http::RegistrationResponse,
		store::{MemoryStore, StoreError, StoreFuture},
	};

	// Directory that fails every call while `down` is set.
	#[derive(Default)]
	struct FlakyDirectory {
		inner: MemoryDirectory,
		down: AtomicBool,
	}
	impl FlakyDirectory {
		fn check(&self) -> Result<(), StoreError> {
			if self.down.load(Ordering::SeqCst) {
				return Err(StoreError::Backend { message: "directory offline".into() });
			}

			Ok(())
		}
	}
	impl ClientDirectory for FlakyDirectory {
		fn find<'a>(&'a self, id: &'a ClientId) -> StoreFuture<'a, Option<Client>> {
			Box::pin(async move {
				self.check()?;
				self.inner.find(id).await
			})
		}

		fn insert(&self, client: Client) -> StoreFuture<'_, ()> {
			Box::pin(async move {
				self.check()?;
				self.inner.insert(client).await
			})
		}

		fn set_auto_approve<'a>(
			&'a self,
			id: &'a ClientId,
			auto_approve: bool,
			updated_at: OffsetDateTime,
		) -> StoreFuture<'a, Option<Client>> {
			Box::pin(async move {
				self.check()?;
				self.inner.set_auto_approve(id, auto_approve, updated_at).await
			})
		}

		fn list(&self) -> StoreFuture<'_, Vec<Client>> {
			Box::pin(async move {
				self.check()?;
				self.inner.list().await
			})
		}
	}

	async fn decisions(harness: &TestHarness, client_id: &ClientId) -> Vec<bool> {
		let user = UserId::new("test_user").expect("User fixture should be valid.");

		harness
			.consents
			.history(client_id, &user)
			.await
			.expect("Ledger read should succeed.")
			.into_iter()
			.map(|r| r.approved)
			.collect()
	}

	async fn register(harness: &TestHarness, auto_approve: bool) -> RegistrationResponse {
		let registered = harness
			.authority
			.register_client(registration("userid profile"))
			.await
			.expect("Registration should succeed.");

		if auto_approve {
			harness
				.directory
				.set_auto_approve(&registered.client_id, true, harness.authority.now())
				.await
				.expect("Toggle should succeed.");
		}

		registered
	}

	fn request(client_id: &ClientId) -> AuthorizeRequest {
		AuthorizeRequest {
			response_type: "code".into(),
			client_id: client_id.to_string(),
			redirect_uri: "http://localhost:3000/cb".into(),
			scope: Some("userid".into()),
			state: Some("test_state".into()),
			code_challenge: None,
			code_challenge_method: None,
		}
	}

	#[tokio::test]
	async fn validation_order_is_client_then_response_type_then_redirect() {
		let harness = build_test_authority();
		let registered = register(&harness, false).await;
		let mut session = logged_in_session();
		let mut bad = request(&registered.client_id);

		bad.client_id = "unknown".into();
		bad.response_type = "token".into();

		assert!(matches!(
			harness.authority.authorize(&mut session, bad.clone()).await,
			Err(Error::InvalidClient)
		));

		bad.client_id = registered.client_id.to_string();
		bad.redirect_uri = "http://evil.example/cb".into();

		assert!(matches!(
			harness.authority.authorize(&mut session, bad.clone()).await,
			Err(Error::UnsupportedResponseType { .. })
		));

		bad.response_type = "code".into();

		assert!(matches!(
			harness.authority.authorize(&mut session, bad).await,
			Err(Error::InvalidRedirectUri)
		));
		assert!(session.pending().is_none());
	}

	#[tokio::test]
	async fn scope_must_be_known_and_registered() {
		let harness = build_test_authority();
		let registered = harness
			.authority
			.register_client(registration("userid"))
			.await
			.expect("Registration should succeed.");
		let mut session = logged_in_session();
		let mut req = request(&registered.client_id);

		req.scope = Some("profile".into());

		assert!(matches!(
			harness.authority.authorize(&mut session, req.clone()).await,
			Err(Error::InvalidScope { .. })
		));

		req.scope = Some("userid email".into());

		assert!(matches!(
			harness.authority.authorize(&mut session, req.clone()).await,
			Err(Error::InvalidScope { .. })
		));

		req.scope = None;

		let AuthorizeOutcome::ConsentRequired(prompt) = harness
			.authority
			.authorize(&mut session, req)
			.await
			.expect("Missing scope should default to the registered scope.")
		else {
			panic!("Expected a consent prompt.");
		};

		assert_eq!(prompt.scope.normalized(), "userid");
	}

	#[tokio::test]
	async fn login_resumes_saved_request() {
		let harness = build_test_authority();
		let registered = register(&harness, false).await;
		let mut session = Session::generate();
		let outcome = harness
			.authority
			.authorize(&mut session, request(&registered.client_id))
			.await
			.expect("Authorize should succeed.");

		assert_eq!(outcome, AuthorizeOutcome::LoginRequired { login_uri: "/login".into() });
		assert!(matches!(session.pending(), Some(PendingAuthorization::AwaitingLogin { .. })));

		let outcome = harness
			.authority
			.complete_login(&mut session, UserId::new("test_user").expect("User should be valid."))
			.await
			.expect("Login should resume the flow.");
		let AuthorizeOutcome::ConsentRequired(prompt) = outcome else {
			panic!("Expected a consent prompt.");
		};

		assert_eq!(prompt.client_id, registered.client_id);
		assert_eq!(prompt.client_name, "App");
		assert_eq!(prompt.consent_uri, "/auth");
		assert!(matches!(session.pending(), Some(PendingAuthorization::AwaitingConsent { .. })));
	}

	#[tokio::test]
	async fn login_without_pending_request_is_rejected() {
		let harness = build_test_authority();
		let mut session = Session::generate();

		assert!(matches!(
			harness
				.authority
				.complete_login(&mut session, UserId::new("test_user").expect("User should be valid."))
				.await,
			Err(Error::NoPendingAuthorization)
		));
		assert!(session.user().is_some());
	}

	#[tokio::test]
	async fn consent_approval_issues_code_with_state() {
		let harness = build_test_authority();
		let registered = register(&harness, false).await;
		let mut session = logged_in_session();

		harness
			.authority
			.authorize(&mut session, request(&registered.client_id))
			.await
			.expect("Authorize should succeed.");

		let redirect = harness
			.authority
			.decide_consent(&mut session, ConsentDecision::Approve)
			.await
			.expect("Approval should issue a code.");
		let code = redirect.param("code").expect("Redirect should carry a code.");

		assert_eq!(code.len(), CODE_LEN);
		assert_eq!(redirect.param("state").as_deref(), Some("test_state"));
		assert!(redirect.location.as_str().starts_with("http://localhost:3000/cb?"));
		assert!(session.pending().is_none());
		assert!(session.user().is_some());
		assert_eq!(harness.store.len(), 1);
		assert_eq!(decisions(&harness, &registered.client_id).await, vec![true]);
	}

	#[tokio::test]
	async fn consent_rejection_redirects_with_access_denied() {
		let harness = build_test_authority();
		let registered = register(&harness, false).await;
		let mut session = logged_in_session();

		harness
			.authority
			.authorize(&mut session, request(&registered.client_id))
			.await
			.expect("Authorize should succeed.");

		let redirect = harness
			.authority
			.decide_consent(&mut session, ConsentDecision::Reject)
			.await
			.expect("Rejection should still redirect.");

		assert_eq!(redirect.param("error").as_deref(), Some("access_denied"));
		assert_eq!(redirect.param("state").as_deref(), Some("test_state"));
		assert_eq!(redirect.param("code"), None);
		assert!(harness.store.is_empty());
		assert_eq!(decisions(&harness, &registered.client_id).await, vec![false]);
		assert!(matches!(
			harness.authority.decide_consent(&mut session, ConsentDecision::Approve).await,
			Err(Error::NoPendingAuthorization)
		));
	}

	#[tokio::test]
	async fn auto_approve_skips_consent() {
		let harness = build_test_authority();
		let registered = register(&harness, true).await;
		let mut session = logged_in_session();
		let outcome = harness
			.authority
			.authorize(&mut session, request(&registered.client_id))
			.await
			.expect("Authorize should succeed.");
		let AuthorizeOutcome::Redirect(redirect) = outcome else {
			panic!("Expected an immediate redirect.");
		};

		assert!(redirect.param("code").is_some());
		assert!(session.pending().is_none());
		assert_eq!(decisions(&harness, &registered.client_id).await, vec![true]);
	}

	#[tokio::test]
	async fn pkce_parameters_are_validated_up_front() {
		let harness = build_test_authority();
		let registered = register(&harness, true).await;
		let mut session = logged_in_session();
		let mut req = request(&registered.client_id);

		req.code_challenge = Some("abc".into());

		assert!(matches!(
			harness.authority.authorize(&mut session, req.clone()).await,
			Err(Error::InvalidRequest { .. })
		));

		req.code_challenge_method = Some("plain".into());

		assert!(matches!(
			harness.authority.authorize(&mut session, req).await,
			Err(Error::InvalidRequest { .. })
		));
	}

	#[tokio::test]
	async fn prompts_are_not_recorded_until_decided() {
		let harness = build_test_authority();
		let registered = register(&harness, false).await;
		let mut session = logged_in_session();

		harness
			.authority
			.authorize(&mut session, request(&registered.client_id))
			.await
			.expect("Authorize should succeed.");

		assert!(harness.consents.is_empty());
	}

	#[tokio::test]
	async fn transient_failures_keep_the_pending_request() {
		let directory = Arc::new(FlakyDirectory::default());
		let config =
			AuthorityConfig::builder(TEST_SIGNING_SECRET).build().expect("Config should build.");
		let authority =
			Authority::new(config, Arc::new(MemoryStore::default()), directory.clone())
				.expect("Authority should build.");
		let registered = authority
			.register_client(registration("userid"))
			.await
			.expect("Registration should succeed.");
		let user = UserId::new("test_user").expect("User fixture should be valid.");
		let mut session = Session::generate();

		authority
			.authorize(&mut session, request(&registered.client_id))
			.await
			.expect("Authorize should succeed.");
		directory.down.store(true, Ordering::SeqCst);

		let err = authority
			.complete_login(&mut session, user.clone())
			.await
			.expect_err("Login resume must fail while the directory is down.");

		assert!(err.is_retryable());
		assert!(matches!(session.pending(), Some(PendingAuthorization::AwaitingLogin { .. })));

		directory.down.store(false, Ordering::SeqCst);

		let outcome = authority
			.complete_login(&mut session, user)
			.await
			.expect("Retrying the login resume should succeed.");

		assert!(matches!(outcome, AuthorizeOutcome::ConsentRequired(_)));

		directory.down.store(true, Ordering::SeqCst);

		assert!(
			authority
				.decide_consent(&mut session, ConsentDecision::Approve)
				.await
				.expect_err("Approval must fail while the directory is down.")
				.is_retryable()
		);
		assert!(matches!(session.pending(), Some(PendingAuthorization::AwaitingConsent { .. })));

		directory.down.store(false, Ordering::SeqCst);

		let redirect = authority
			.decide_consent(&mut session, ConsentDecision::Approve)
			.await
			.expect("Retrying the approval should succeed.");

		assert!(redirect.param("code").is_some());
		assert!(session.pending().is_none());
	}
}
