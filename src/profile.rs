//! User-profile collaborator feeding the `profile` scope of userinfo responses.

// self
use crate::{_prelude::*, auth::UserId, store::StoreFuture};

/// Profile attributes released under the `profile` scope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
	/// Display username.
	pub username: String,
	/// Phone number.
	pub phone: String,
}

/// Looks up profile attributes for a user.
pub trait ProfileSource
where
	Self: Send + Sync,
{
	/// Returns the user's profile, or `None` when the user has none.
	fn profile<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<Profile>>;
}

/// Fixed demo profile returned for every user.
#[derive(Clone, Copy, Debug, Default)]
pub struct DemoProfiles;
impl DemoProfiles {
	/// Demo username.
	pub const USERNAME: &'static str = "test_user";
	/// Demo phone number.
	pub const PHONE: &'static str = "13800138000";
}
impl ProfileSource for DemoProfiles {
	fn profile<'a>(&'a self, _: &'a UserId) -> StoreFuture<'a, Option<Profile>> {
		Box::pin(async move {
			Ok(Some(Profile { username: Self::USERNAME.into(), phone: Self::PHONE.into() }))
		})
	}
}
