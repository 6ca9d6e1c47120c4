// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use time::{Duration, OffsetDateTime};
// self
use oauth2_authority::{
	auth::{PkceChallenge, SessionId, UserId},
	clock::ManualClock,
	config::AuthorityConfig,
	directory::MemoryDirectory,
	error::Error,
	flows::{Authority, AuthorizeOutcome},
	http::{
		AuthorizeRequest, AutoApproveRequest, ConsentDecision, RegistrationRequest,
		RegistrationResponse, TokenRequest,
	},
	profile::DemoProfiles,
	session::{MemorySessionStore, Session, SessionStore},
	store::MemoryStore,
};

const REDIRECT_URI: &str = "http://localhost:3000/cb";
const PKCE_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";

struct Fixture {
	authority: Authority,
	clock: Arc<ManualClock>,
}

fn build_fixture() -> Fixture {
	let clock = Arc::new(ManualClock::new(OffsetDateTime::now_utc()));
	let store = Arc::new(MemoryStore::with_clock(clock.clone()));
	let config = AuthorityConfig::builder("integration-signing-secret")
		.build()
		.expect("Integration config should be valid.");
	let authority = Authority::new(config, store, Arc::new(MemoryDirectory::default()))
		.expect("Integration authority should build.")
		.with_profiles(Arc::new(DemoProfiles))
		.with_clock(clock.clone());

	Fixture { authority, clock }
}

async fn register(fixture: &Fixture, auto_approve: bool) -> RegistrationResponse {
	let registered = fixture
		.authority
		.register_client(RegistrationRequest {
			name: "App".into(),
			redirect_url: REDIRECT_URI.into(),
			grant_type: "authorization_code".into(),
			scope: "userid profile".into(),
		})
		.await
		.expect("Registration should succeed.");

	fixture
		.authority
		.set_auto_approve(AutoApproveRequest {
			client_id: registered.client_id.to_string(),
			auto_approve,
		})
		.await
		.expect("Auto-approve toggle should succeed.");

	registered
}

fn logged_in_session() -> Session {
	let mut session = Session::generate();

	session.log_in(UserId::new("test_user").expect("Test user should be valid."));

	session
}

fn authorize_request(registered: &RegistrationResponse) -> AuthorizeRequest {
	AuthorizeRequest {
		response_type: "code".into(),
		client_id: registered.client_id.to_string(),
		redirect_uri: REDIRECT_URI.into(),
		scope: Some("userid profile".into()),
		state: Some("test_state".into()),
		code_challenge: None,
		code_challenge_method: None,
	}
}

fn token_request(registered: &RegistrationResponse, code: &str) -> TokenRequest {
	TokenRequest {
		grant_type: "authorization_code".into(),
		code: code.into(),
		redirect_uri: REDIRECT_URI.into(),
		client_id: registered.client_id.to_string(),
		client_secret: registered.client_secret.clone(),
		code_verifier: None,
	}
}

async fn issue_code(fixture: &Fixture, request: AuthorizeRequest) -> String {
	let mut session = logged_in_session();
	let outcome =
		fixture.authority.authorize(&mut session, request).await.expect("Authorize should succeed.");
	let AuthorizeOutcome::Redirect(redirect) = outcome else {
		panic!("Auto-approved clients should redirect immediately.");
	};

	redirect.param("code").expect("Redirect should carry a code.")
}

#[tokio::test]
async fn register_authorize_exchange_userinfo_end_to_end() -> Result<()> {
	let fixture = build_fixture();
	let registered = register(&fixture, true).await;
	let mut session = logged_in_session();
	let outcome = fixture.authority.authorize(&mut session, authorize_request(&registered)).await?;
	let AuthorizeOutcome::Redirect(redirect) = outcome else {
		panic!("Auto-approved clients should redirect immediately.");
	};
	let code = redirect.param("code").expect("Redirect should carry a code.");

	assert_eq!(redirect.param("state").as_deref(), Some("test_state"));

	let tokens = fixture.authority.exchange_code(token_request(&registered, &code)).await?;
	let body = serde_json::to_value(&tokens)?;

	assert_eq!(body["token_type"], "Bearer");
	assert_eq!(body["expires_in"], 3_600);
	assert_eq!(body["scope"], "userid profile");
	assert!(body["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));

	let header = format!("Bearer {}", tokens.access_token);
	let info = fixture.authority.userinfo(Some(&header)).await?;

	assert_eq!(
		serde_json::to_value(&info)?,
		serde_json::json!({
			"userid": "test_user",
			"username": "test_user",
			"phone": "13800138000"
		})
	);

	let replay = fixture.authority.exchange_code(token_request(&registered, &code)).await;

	assert!(matches!(replay, Err(Error::InvalidOrExpiredCode)));

	Ok(())
}

#[tokio::test]
async fn interactive_login_and_consent_through_session_store() -> Result<()> {
	let fixture = build_fixture();
	let registered = register(&fixture, false).await;
	let sessions = MemorySessionStore::default();
	let session_id = SessionId::random(32);
	let mut session = Session::new(session_id.clone());
	let outcome = fixture.authority.authorize(&mut session, authorize_request(&registered)).await?;

	assert!(matches!(outcome, AuthorizeOutcome::LoginRequired { .. }));

	sessions.save(session).await?;

	// The login form posts back on a later request.
	let mut session = sessions.load(&session_id).await?.expect("Session should persist.");
	let outcome =
		fixture.authority.complete_login(&mut session, UserId::new("test_user")?).await?;
	let AuthorizeOutcome::ConsentRequired(prompt) = outcome else {
		panic!("Non-trusted clients should ask for consent.");
	};

	assert_eq!(prompt.scope.normalized(), "userid profile");

	sessions.save(session).await?;

	let mut session = sessions.load(&session_id).await?.expect("Session should persist.");
	let redirect = fixture.authority.decide_consent(&mut session, ConsentDecision::Approve).await?;
	let code = redirect.param("code").expect("Approval should carry a code.");

	assert_eq!(redirect.param("state").as_deref(), Some("test_state"));
	assert!(session.pending().is_none());

	fixture.authority.exchange_code(token_request(&registered, &code)).await?;

	Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_exchanges_have_a_single_winner() {
	let fixture = build_fixture();
	let registered = register(&fixture, true).await;
	let code = issue_code(&fixture, authorize_request(&registered)).await;
	let authority = Arc::new(fixture.authority);
	let handles = (0..16)
		.map(|_| {
			let authority = authority.clone();
			let request = token_request(&registered, &code);

			tokio::spawn(async move { authority.exchange_code(request).await })
		})
		.collect::<Vec<_>>();
	let mut winners = 0;
	let mut losers = 0;

	for handle in handles {
		match handle.await.expect("Exchange task should not panic.") {
			Ok(_) => winners += 1,
			Err(Error::InvalidOrExpiredCode) => losers += 1,
			Err(other) => panic!("Unexpected exchange error: {other}."),
		}
	}

	assert_eq!(winners, 1);
	assert_eq!(losers, 15);
}

#[tokio::test]
async fn codes_expire_after_ten_minutes() {
	let fixture = build_fixture();
	let registered = register(&fixture, true).await;
	let code = issue_code(&fixture, authorize_request(&registered)).await;

	fixture.clock.advance(Duration::minutes(10));

	assert!(matches!(
		fixture.authority.exchange_code(token_request(&registered, &code)).await,
		Err(Error::InvalidOrExpiredCode)
	));
}

#[tokio::test]
async fn codes_within_their_lifetime_still_redeem() {
	let fixture = build_fixture();
	let registered = register(&fixture, true).await;
	let code = issue_code(&fixture, authorize_request(&registered)).await;

	fixture.clock.advance(Duration::minutes(9));

	assert!(fixture.authority.exchange_code(token_request(&registered, &code)).await.is_ok());
}

#[tokio::test]
async fn redirect_uri_is_bound_to_the_code() {
	let fixture = build_fixture();
	let registered = register(&fixture, true).await;
	let code = issue_code(&fixture, authorize_request(&registered)).await;
	let mut request = token_request(&registered, &code);

	request.redirect_uri = "http://localhost:3000/other".into();

	assert!(matches!(
		fixture.authority.exchange_code(request).await,
		Err(Error::RedirectUriMismatch)
	));
}

#[tokio::test]
async fn pkce_round_trip_requires_matching_verifier() {
	let fixture = build_fixture();
	let registered = register(&fixture, true).await;
	let challenge = PkceChallenge::s256(PKCE_VERIFIER);
	let mut authorize = authorize_request(&registered);

	authorize.code_challenge = Some(challenge.challenge.clone());
	authorize.code_challenge_method = Some("S256".into());

	let wrong = issue_code(&fixture, authorize.clone()).await;
	let mut request = token_request(&registered, &wrong);

	request.code_verifier = Some("a-different-verifier-of-sufficient-length-000".into());

	assert!(matches!(
		fixture.authority.exchange_code(request).await,
		Err(Error::PkceVerificationFailed)
	));

	let right = issue_code(&fixture, authorize).await;
	let mut request = token_request(&registered, &right);

	request.code_verifier = Some(PKCE_VERIFIER.into());

	assert!(fixture.authority.exchange_code(request).await.is_ok());
}

#[tokio::test]
async fn scope_projection_follows_the_granted_scope() {
	let fixture = build_fixture();
	let registered = register(&fixture, true).await;
	let mut authorize = authorize_request(&registered);

	authorize.scope = Some("profile".into());

	let code = issue_code(&fixture, authorize).await;
	let tokens = fixture
		.authority
		.exchange_code(token_request(&registered, &code))
		.await
		.expect("Exchange should succeed.");
	let info = fixture
		.authority
		.userinfo(Some(&format!("Bearer {}", tokens.access_token)))
		.await
		.expect("Userinfo should succeed.");

	assert_eq!(info.userid, None);
	assert_eq!(info.username.as_deref(), Some("test_user"));
	assert_eq!(info.phone.as_deref(), Some("13800138000"));
}

#[tokio::test]
async fn revoked_and_expired_tokens_are_refused() {
	let fixture = build_fixture();
	let registered = register(&fixture, true).await;
	let first = issue_code(&fixture, authorize_request(&registered)).await;
	let second = issue_code(&fixture, authorize_request(&registered)).await;
	let revoked = fixture
		.authority
		.exchange_code(token_request(&registered, &first))
		.await
		.expect("Exchange should succeed.");
	let expiring = fixture
		.authority
		.exchange_code(token_request(&registered, &second))
		.await
		.expect("Exchange should succeed.");

	assert!(
		fixture.authority.revoke_token(&revoked.access_token).await.expect("Revoke should succeed.")
	);
	assert!(matches!(
		fixture.authority.userinfo(Some(&format!("Bearer {}", revoked.access_token))).await,
		Err(Error::TokenRevokedOrUnknown)
	));

	fixture.clock.advance(Duration::hours(2));

	assert!(matches!(
		fixture.authority.userinfo(Some(&format!("Bearer {}", expiring.access_token))).await,
		Err(Error::TokenExpired)
	));
}
