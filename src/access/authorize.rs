use serde::Serialize;
use uuid::Uuid;

use super::session::{MembershipLookup, ResolvedSession};
use crate::error::ApiError;
use crate::types::Role;

/// Minimum role an endpoint needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any active member of the organization
    Member,
    /// Owner or admin
    Manager,
    Owner,
}

impl Requirement {
    pub fn allows(&self, role: Role) -> bool {
        match self {
            Requirement::Member => true,
            Requirement::Manager => role.can_manage(),
            Requirement::Owner => role.is_owner(),
        }
    }
}

/// Outcome of a successful authorization check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authorization {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub organization_id: Uuid,
    pub role: Role,
}

impl Authorization {
    pub fn is_manager(&self) -> bool {
        self.role.can_manage()
    }
}

/// The one membership/role check every API endpoint goes through.
pub fn authorize(session: &ResolvedSession, requirement: Requirement) -> Result<Authorization, ApiError> {
    let (user, lookup) = match session {
        ResolvedSession::Anonymous => return Err(ApiError::unauthorized("Authentication required")),
        ResolvedSession::Authenticated { user, membership } => (user, membership),
    };

    let membership = match lookup {
        MembershipLookup::Found(m) => m,
        MembershipLookup::NotFound => {
            return Err(ApiError::forbidden("You are not a member of any organization"));
        }
        MembershipLookup::Failed => {
            return Err(ApiError::service_unavailable("Unable to verify organization membership"));
        }
    };

    let Some(role) = membership.active_role() else {
        return Err(ApiError::forbidden("Your organization membership is inactive"));
    };

    if !requirement.allows(role) {
        tracing::debug!(
            "Denied {:?} access to user {} with role {}",
            requirement,
            user.id,
            role
        );
        return Err(ApiError::forbidden("Insufficient permissions"));
    }

    Ok(Authorization {
        user_id: user.id,
        email: user.email.clone(),
        organization_id: membership.organization_id,
        role,
    })
}
