//! Authorization code records persisted between consent and exchange.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, PkceChallenge, ScopeSet, UserId},
};

/// Lifecycle status for any TTL-bound record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
	/// Issued-at instant is in the future.
	Pending,
	/// Currently valid.
	Active,
	/// Expiry instant has passed.
	Expired,
}

/// Code issued on consent approval; consumed exactly once by the token exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationCode {
	/// Client the code was issued to.
	pub client_id: ClientId,
	/// Resource owner who approved the request.
	pub user_id: UserId,
	/// Approved scope.
	pub scope: ScopeSet,
	/// Redirect URI used on the authorization request.
	pub redirect_uri: String,
	/// PKCE challenge, when the client sent one.
	pub pkce: Option<PkceChallenge>,
	/// Issue instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant (issue instant plus the code TTL).
	pub expires_at: OffsetDateTime,
}
impl AuthorizationCode {
	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> RecordStatus {
		status_between(self.issued_at, self.expires_at, instant)
	}

	/// Returns `true` if the code can still be redeemed at `instant`.
	pub fn is_active_at(&self, instant: OffsetDateTime) -> bool {
		matches!(self.status_at(instant), RecordStatus::Active)
	}
}

pub(crate) fn status_between(
	issued_at: OffsetDateTime,
	expires_at: OffsetDateTime,
	instant: OffsetDateTime,
) -> RecordStatus {
	if instant < issued_at {
		return RecordStatus::Pending;
	}
	if instant >= expires_at {
		return RecordStatus::Expired;
	}

	RecordStatus::Active
}
