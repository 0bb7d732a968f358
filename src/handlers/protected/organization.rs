use axum::extract::State;
use serde::Deserialize;

use super::{commit, scoped};
use crate::app::AppState;
use crate::database::models::Organization;
use crate::middleware::{ApiResponse, ApiResult, Json, MemberAccess, OwnerAccess};
use crate::services::OrganizationService;
use crate::validation::FieldErrors;

#[derive(Debug, Deserialize)]
pub struct RenameOrganization {
    pub name: String,
}

/// GET /api/organization
pub async fn show(State(state): State<AppState>, MemberAccess(auth): MemberAccess) -> ApiResult<Organization> {
    let mut tx = scoped(&state, &auth).await?;
    let organization = OrganizationService::get(&mut tx, auth.organization_id).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(organization))
}

/// PATCH /api/organization
pub async fn update(
    State(state): State<AppState>,
    OwnerAccess(auth): OwnerAccess,
    Json(body): Json<RenameOrganization>,
) -> ApiResult<Organization> {
    let mut errors = FieldErrors::new();
    errors.name("name", &body.name);
    errors.finish()?;

    let mut tx = scoped(&state, &auth).await?;
    let organization = OrganizationService::rename(&mut tx, auth.organization_id, &body.name).await?;
    commit(tx).await?;

    tracing::info!("Organization {} renamed by {}", auth.organization_id, auth.user_id);
    Ok(ApiResponse::success(organization))
}
