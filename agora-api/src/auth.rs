use uuid::Uuid;

use crate::{UserId, STUB_UUID};

/// Bearer token presented on every authenticated request.
///
/// For regular users this is the user's own id, as sessions are handled by
/// the identity collaborator in front of this service. The admin token is a
/// separate secret configured on the server.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct AuthToken(pub Uuid);

impl AuthToken {
    pub fn stub() -> AuthToken {
        AuthToken(STUB_UUID)
    }

    pub fn for_user(user: UserId) -> AuthToken {
        AuthToken(user.0)
    }
}
