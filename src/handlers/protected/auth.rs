use serde::Serialize;

use crate::access::{MembershipLookup, ResolvedSession, SessionUser};
use crate::database::models::Membership;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, CurrentSession};

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user: SessionUser,
    pub membership: Option<Membership>,
    pub membership_lookup_failed: bool,
}

/// GET /api/auth/whoami
pub async fn whoami(CurrentSession(session): CurrentSession) -> ApiResult<WhoAmI> {
    match session {
        ResolvedSession::Anonymous => Err(ApiError::unauthorized("Authentication required")),
        ResolvedSession::Authenticated { user, membership } => {
            let membership_lookup_failed = membership == MembershipLookup::Failed;
            let membership = match membership {
                MembershipLookup::Found(m) => Some(m),
                MembershipLookup::NotFound | MembershipLookup::Failed => None,
            };
            Ok(ApiResponse::success(WhoAmI {
                user,
                membership,
                membership_lookup_failed,
            }))
        }
    }
}
