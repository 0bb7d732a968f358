use axum::extract::State;
use uuid::Uuid;

use super::{commit, ensure_client, scoped};
use crate::app::AppState;
use crate::database::models::Project;
use crate::middleware::{ApiResponse, ApiResult, Json, ManagerAccess, MemberAccess, Path, Query};
use crate::services::project_service::{NewProject, ProjectFilter, ProjectUpdate};
use crate::services::ProjectService;

/// GET /api/projects - managers see every project, members the ones they
/// have tasks on.
pub async fn list(
    State(state): State<AppState>,
    MemberAccess(auth): MemberAccess,
    Query(filter): Query<ProjectFilter>,
) -> ApiResult<Vec<Project>> {
    let mut tx = scoped(&state, &auth).await?;
    let projects = if auth.is_manager() {
        ProjectService::list(&mut tx, auth.organization_id, &filter).await?
    } else {
        ProjectService::list_for_assignee(&mut tx, auth.organization_id, auth.user_id).await?
    };
    commit(tx).await?;
    Ok(ApiResponse::success(projects))
}

/// GET /api/projects/:id
pub async fn show(
    State(state): State<AppState>,
    MemberAccess(auth): MemberAccess,
    Path(id): Path<Uuid>,
) -> ApiResult<Project> {
    let mut tx = scoped(&state, &auth).await?;
    let project = if auth.is_manager() {
        ProjectService::get(&mut tx, auth.organization_id, id).await?
    } else {
        ProjectService::get_for_assignee(&mut tx, auth.organization_id, id, auth.user_id).await?
    };
    commit(tx).await?;
    Ok(ApiResponse::success(project))
}

/// POST /api/projects
pub async fn create(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Json(input): Json<NewProject>,
) -> ApiResult<Project> {
    input.validate()?;
    let mut tx = scoped(&state, &auth).await?;
    ensure_client(&mut tx, &auth, input.client_id).await?;
    let project = ProjectService::create(&mut tx, auth.organization_id, &input).await?;
    commit(tx).await?;
    Ok(ApiResponse::created(project))
}

/// PATCH /api/projects/:id
pub async fn update(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(id): Path<Uuid>,
    Json(changes): Json<ProjectUpdate>,
) -> ApiResult<Project> {
    changes.validate()?;
    let mut tx = scoped(&state, &auth).await?;
    let current = ProjectService::get(&mut tx, auth.organization_id, id).await?;
    changes.validate_against(&current)?;
    ensure_client(&mut tx, &auth, changes.client_id).await?;
    let project = ProjectService::update(&mut tx, auth.organization_id, id, &changes).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(project))
}

/// DELETE /api/projects/:id
pub async fn delete(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let mut tx = scoped(&state, &auth).await?;
    ProjectService::delete(&mut tx, auth.organization_id, id).await?;
    commit(tx).await?;
    Ok(ApiResponse::no_content())
}
