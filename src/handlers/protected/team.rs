use axum::extract::State;
use uuid::Uuid;

use crate::access::Authorization;
use crate::app::AppState;
use crate::database::models::TeamMember;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Json, ManagerAccess, Path};
use crate::services::membership_service::{MemberUpdate, NewMember};
use crate::services::MembershipService;
use crate::types::{MembershipStatus, Role};

// Team management reads and writes other users' membership rows, so it runs
// on the service-role pool with the organization check done here.

/// GET /api/team
pub async fn list(State(state): State<AppState>, ManagerAccess(auth): ManagerAccess) -> ApiResult<Vec<TeamMember>> {
    let team = MembershipService::list_team(state.db.admin_pool(), auth.organization_id).await?;
    Ok(ApiResponse::success(team))
}

/// POST /api/team - add an existing user by email
pub async fn add(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Json(input): Json<NewMember>,
) -> ApiResult<TeamMember> {
    input.validate()?;
    if input.role() == Role::Admin && !auth.role.is_owner() {
        return Err(ApiError::forbidden("Only the owner can add admins"));
    }

    let member = MembershipService::add_member(state.db.admin_pool(), auth.organization_id, &input).await?;
    Ok(ApiResponse::created(member))
}

/// PATCH /api/team/:user_id
pub async fn update(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(user_id): Path<Uuid>,
    Json(changes): Json<MemberUpdate>,
) -> ApiResult<TeamMember> {
    changes.validate()?;
    let pool = state.db.admin_pool();
    let target = MembershipService::get_member(pool, auth.organization_id, user_id).await?;

    check_can_modify(&auth, &target, changes.role)?;
    if target.user_id == auth.user_id && changes.status == Some(MembershipStatus::Inactive) {
        return Err(ApiError::forbidden("You cannot deactivate yourself"));
    }

    let member = MembershipService::update_member(pool, auth.organization_id, user_id, &changes).await?;
    tracing::info!("Membership of {} in {} updated by {}", user_id, auth.organization_id, auth.user_id);
    Ok(ApiResponse::success(member))
}

/// DELETE /api/team/:user_id - deactivates the membership
pub async fn remove(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(user_id): Path<Uuid>,
) -> ApiResult<TeamMember> {
    if user_id == auth.user_id {
        return Err(ApiError::forbidden("You cannot remove yourself"));
    }

    let pool = state.db.admin_pool();
    let target = MembershipService::get_member(pool, auth.organization_id, user_id).await?;
    check_can_modify(&auth, &target, None)?;

    let changes = MemberUpdate {
        role: None,
        status: Some(MembershipStatus::Inactive),
    };
    let member = MembershipService::update_member(pool, auth.organization_id, user_id, &changes).await?;
    tracing::info!("Deactivated {} in {} by {}", user_id, auth.organization_id, auth.user_id);
    Ok(ApiResponse::success(member))
}

/// The owner's membership is fixed; only the owner manages admins.
fn check_can_modify(auth: &Authorization, target: &TeamMember, new_role: Option<Role>) -> Result<(), ApiError> {
    if target.role.is_owner() {
        return Err(ApiError::forbidden("The owner's membership cannot be changed"));
    }
    let touches_admin = target.role == Role::Admin || new_role == Some(Role::Admin);
    if touches_admin && !auth.role.is_owner() {
        return Err(ApiError::forbidden("Only the owner can manage admins"));
    }
    Ok(())
}
