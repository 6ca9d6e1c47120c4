//! Client registration plus the administrative toggle and listing.

// self
use crate::{
	_prelude::*,
	auth::{Client, ClientId, GrantType, ScopeSet, Secret, id::random_alphanumeric},
	flows::{
		Authority,
		common::{self, CLIENT_ID_LEN, CLIENT_SECRET_LEN},
	},
	http::{AutoApproveRequest, ClientSummary, RegistrationRequest, RegistrationResponse},
	obs::FlowKind,
};

impl Authority {
	/// Registers a client and returns its freshly generated credentials.
	///
	/// Only the `authorization_code` grant and the `userid`/`profile` scopes are accepted. New
	/// clients start with `auto_approve` off.
	pub async fn register_client(
		&self,
		request: RegistrationRequest,
	) -> Result<RegistrationResponse> {
		common::observe(FlowKind::Registration, "register_client", move |_| async move {
			let name = request.name.trim();

			if name.is_empty() {
				return Err(Error::invalid_request("name is required"));
			}

			Url::parse(&request.redirect_url).map_err(|_| Error::InvalidRedirectUri)?;

			let grant_type = request.grant_type.parse::<GrantType>()?;
			let scope = ScopeSet::parse_known(&request.scope)
				.map_err(|e| Error::invalid_scope(e.to_string()))?;

			if scope.is_empty() {
				return Err(Error::invalid_scope("scope is required"));
			}

			let now = self.now();
			let secret = random_alphanumeric(CLIENT_SECRET_LEN);
			let client = Client {
				id: ClientId::random(CLIENT_ID_LEN),
				secret: Secret::new(secret.clone()),
				name: name.to_owned(),
				redirect_uri: request.redirect_url,
				grant_types: vec![grant_type],
				scope,
				auto_approve: false,
				created_at: now,
				updated_at: now,
			};
			let client_id = client.id.clone();

			self.bounded(self.directory.insert(client)).await?;

			Ok(RegistrationResponse { client_id, client_secret: secret })
		})
		.await
	}

	/// Flips a client's auto-approve flag.
	pub async fn set_auto_approve(&self, request: AutoApproveRequest) -> Result<ClientSummary> {
		common::observe(FlowKind::Registration, "set_auto_approve", move |_| async move {
			let id = ClientId::new(&request.client_id).map_err(|_| Error::InvalidClient)?;
			let client = self
				.bounded(self.directory.set_auto_approve(&id, request.auto_approve, self.now()))
				.await?
				.ok_or(Error::InvalidClient)?;

			Ok(ClientSummary::from(&client))
		})
		.await
	}

	/// Lists registered clients without their secrets.
	pub async fn list_clients(&self) -> Result<Vec<ClientSummary>> {
		common::observe(FlowKind::Registration, "list_clients", move |_| async move {
			let clients = self.bounded(self.directory.list()).await?;

			Ok(clients.iter().map(ClientSummary::from).collect())
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{_preludet::*, directory::ClientDirectory};

	#[tokio::test]
	async fn registration_stores_client_with_generated_credentials() {
		let harness = build_test_authority();
		let registered = harness
			.authority
			.register_client(registration("userid profile"))
			.await
			.expect("Registration should succeed.");

		assert_eq!(registered.client_id.len(), CLIENT_ID_LEN);
		assert_eq!(registered.client_secret.len(), CLIENT_SECRET_LEN);

		let stored = harness
			.directory
			.find(&registered.client_id)
			.await
			.expect("Lookup should succeed.")
			.expect("Client should be stored.");

		assert!(stored.verify_secret(&registered.client_secret));
		assert_eq!(stored.scope.normalized(), "userid profile");
		assert_eq!(stored.grant_types, vec![GrantType::AuthorizationCode]);
		assert!(!stored.auto_approve);
	}

	#[tokio::test]
	async fn registration_rejects_unsupported_input() {
		let harness = build_test_authority();
		let mut request = registration("userid");

		request.grant_type = "client_credentials".into();

		assert!(matches!(
			harness.authority.register_client(request).await,
			Err(Error::UnsupportedGrantType { .. })
		));

		let mut request = registration("userid email");

		assert!(matches!(
			harness.authority.register_client(request.clone()).await,
			Err(Error::InvalidScope { .. })
		));

		request.scope = String::new();

		assert!(matches!(
			harness.authority.register_client(request.clone()).await,
			Err(Error::InvalidScope { .. })
		));

		request.scope = "userid".into();
		request.redirect_url = "/relative/cb".into();

		assert!(matches!(
			harness.authority.register_client(request.clone()).await,
			Err(Error::InvalidRedirectUri)
		));

		request.name = "  ".into();

		assert!(matches!(
			harness.authority.register_client(request).await,
			Err(Error::InvalidRequest { .. })
		));
		assert!(harness.authority.list_clients().await.expect("Listing should succeed.").is_empty());
	}

	#[tokio::test]
	async fn admin_toggle_and_listing() {
		let harness = build_test_authority();
		let registered = harness
			.authority
			.register_client(registration("userid"))
			.await
			.expect("Registration should succeed.");

		harness.clock.advance(Duration::minutes(1));

		let summary = harness
			.authority
			.set_auto_approve(AutoApproveRequest {
				client_id: registered.client_id.to_string(),
				auto_approve: true,
			})
			.await
			.expect("Toggle should succeed.");

		assert!(summary.auto_approve);
		assert_eq!(summary.updated_at - summary.created_at, Duration::minutes(1));
		assert!(matches!(
			harness
				.authority
				.set_auto_approve(AutoApproveRequest {
					client_id: "missing".into(),
					auto_approve: true
				})
				.await,
			Err(Error::InvalidClient)
		));

		let listed = harness.authority.list_clients().await.expect("Listing should succeed.");

		assert_eq!(listed, vec![summary.clone()]);
		assert!(
			!serde_json::to_string(&listed)
				.expect("Listing should serialize.")
				.contains(&registered.client_secret)
		);
	}
}
