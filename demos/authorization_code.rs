//! Walks a confidential client through registration, an auto-approved authorization, the
//! code exchange, and a userinfo call against in-memory collaborators.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
// self
use oauth2_authority::{
	auth::{PkceChallenge, UserId},
	config::AuthorityConfig,
	directory::MemoryDirectory,
	flows::{Authority, AuthorizeOutcome},
	http::{AuthorizeRequest, AutoApproveRequest, RegistrationRequest, TokenRequest},
	session::Session,
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = AuthorityConfig::from_json_slice(
		br#"{"signing_secret":"demo-signing-secret","access_token_ttl_secs":900}"#,
	)?;
	let authority = Authority::new(
		config,
		Arc::new(MemoryStore::default()),
		Arc::new(MemoryDirectory::default()),
	)?;
	let redirect_uri = "http://localhost:3000/cb";
	let registered = authority
		.register_client(RegistrationRequest {
			name: "Demo App".into(),
			redirect_url: redirect_uri.into(),
			grant_type: "authorization_code".into(),
			scope: "userid profile".into(),
		})
		.await?;

	authority
		.set_auto_approve(AutoApproveRequest {
			client_id: registered.client_id.to_string(),
			auto_approve: true,
		})
		.await?;

	println!("Registered client {}.", registered.client_id);

	let verifier = "demo-verifier-with-at-least-forty-three-characters-0123";
	let challenge = PkceChallenge::s256(verifier);
	let mut session = Session::generate();

	session.log_in(UserId::new("test_user")?);

	let outcome = authority
		.authorize(
			&mut session,
			AuthorizeRequest {
				response_type: "code".into(),
				client_id: registered.client_id.to_string(),
				redirect_uri: redirect_uri.into(),
				scope: Some("userid profile".into()),
				state: Some("demo_state".into()),
				code_challenge: Some(challenge.challenge),
				code_challenge_method: Some("S256".into()),
			},
		)
		.await?;
	let AuthorizeOutcome::Redirect(redirect) = outcome else {
		eprintln!("Expected an immediate redirect, got {outcome:?}.");

		return Ok(());
	};

	println!("Redirecting to {}.", redirect.location);

	let Some(code) = redirect.param("code") else {
		eprintln!("Redirect did not carry a code.");

		return Ok(());
	};
	let tokens = authority
		.exchange_code(TokenRequest {
			grant_type: "authorization_code".into(),
			code,
			redirect_uri: redirect_uri.into(),
			client_id: registered.client_id.to_string(),
			client_secret: registered.client_secret.clone(),
			code_verifier: Some(verifier.into()),
		})
		.await?;

	println!("Issued {} token valid for {}s.", tokens.token_type, tokens.expires_in);

	let info = authority.userinfo(Some(&format!("Bearer {}", tokens.access_token))).await?;

	println!("Userinfo: {}.", serde_json::to_string(&info)?);

	Ok(())
}
