//! JSON view models for the routed pages. The access middleware has already
//! run by the time these execute, so each handler only shapes its data.

use axum::extract::State;
use serde::Serialize;

use super::protected::{commit, scoped};
use crate::access::{RedirectTarget, ResolvedSession};
use crate::app::AppState;
use crate::database::models::Organization;
use crate::middleware::{ApiResponse, ApiResult, CurrentSession, ManagerAccess, MemberAccess};
use crate::services::dashboard_service::{MemberSummary, OwnerSummary};
use crate::services::{DashboardService, OrganizationService};

#[derive(Debug, Serialize)]
pub struct Landing {
    pub signed_in: bool,
    /// Where the "continue" link should go
    pub continue_to: String,
}

#[derive(Debug, Serialize)]
pub struct LoginPage {
    pub audience: &'static str,
    /// The other audience's sign-in page
    pub switch_to: String,
}

#[derive(Debug, Serialize)]
pub struct OwnerDashboard {
    pub organization: Organization,
    pub summary: OwnerSummary,
}

#[derive(Debug, Serialize)]
pub struct TeamDashboard {
    pub organization: Organization,
    #[serde(flatten)]
    pub summary: MemberSummary,
}

/// GET /
pub async fn landing(State(state): State<AppState>, CurrentSession(session): CurrentSession) -> ApiResult<Landing> {
    let routes = state.policy.routes();
    let target = match &session {
        ResolvedSession::Anonymous => RedirectTarget::OwnerLogin,
        authenticated => match authenticated.membership().and_then(|m| m.active_role()) {
            Some(role) if role.is_owner() => RedirectTarget::OwnerHome,
            Some(_) => RedirectTarget::TeamHome,
            None => RedirectTarget::OwnerLogin,
        },
    };

    Ok(ApiResponse::success(Landing {
        signed_in: session.user().is_some(),
        continue_to: routes.url(target).to_string(),
    }))
}

/// GET /login
pub async fn login(State(state): State<AppState>) -> ApiResult<LoginPage> {
    Ok(ApiResponse::success(LoginPage {
        audience: "owner",
        switch_to: state.policy.routes().url(RedirectTarget::TeamLogin).to_string(),
    }))
}

/// GET /team-login
pub async fn team_login(State(state): State<AppState>) -> ApiResult<LoginPage> {
    Ok(ApiResponse::success(LoginPage {
        audience: "team",
        switch_to: state.policy.routes().url(RedirectTarget::OwnerLogin).to_string(),
    }))
}

/// GET /dashboard
pub async fn owner_dashboard(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
) -> ApiResult<OwnerDashboard> {
    let mut tx = scoped(&state, &auth).await?;
    let organization = OrganizationService::get(&mut tx, auth.organization_id).await?;
    let summary = DashboardService::owner_summary(&mut tx, auth.organization_id).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(OwnerDashboard { organization, summary }))
}

/// GET /team-dashboard
pub async fn team_dashboard(
    State(state): State<AppState>,
    MemberAccess(auth): MemberAccess,
) -> ApiResult<TeamDashboard> {
    let mut tx = scoped(&state, &auth).await?;
    let organization = OrganizationService::get(&mut tx, auth.organization_id).await?;
    let summary = DashboardService::member_summary(&mut tx, auth.organization_id, auth.user_id).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(TeamDashboard { organization, summary }))
}
