use axum::extract::State;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{commit, ensure_project, scoped};
use crate::access::Authorization;
use crate::app::AppState;
use crate::database::models::Task;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Json, ManagerAccess, MemberAccess, Path, Query};
use crate::services::task_service::{NewTask, TaskFilter, TaskUpdate};
use crate::services::{MembershipService, TaskService};

/// GET /api/tasks - members only ever see their own tasks
pub async fn list(
    State(state): State<AppState>,
    MemberAccess(auth): MemberAccess,
    Query(filter): Query<TaskFilter>,
) -> ApiResult<Vec<Task>> {
    let mut tx = scoped(&state, &auth).await?;
    let tasks = if auth.is_manager() {
        TaskService::list(&mut tx, auth.organization_id, &filter).await?
    } else {
        TaskService::list_for_assignee(&mut tx, auth.organization_id, auth.user_id, filter.status).await?
    };
    commit(tx).await?;
    Ok(ApiResponse::success(tasks))
}

/// GET /api/tasks/:id
pub async fn show(
    State(state): State<AppState>,
    MemberAccess(auth): MemberAccess,
    Path(id): Path<Uuid>,
) -> ApiResult<Task> {
    let mut tx = scoped(&state, &auth).await?;
    let task = TaskService::get(&mut tx, auth.organization_id, id).await?;
    commit(tx).await?;

    if !auth.is_manager() && task.assignee_id != Some(auth.user_id) {
        return Err(ApiError::not_found("Task not found"));
    }
    Ok(ApiResponse::success(task))
}

/// POST /api/tasks
pub async fn create(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Json(input): Json<NewTask>,
) -> ApiResult<Task> {
    input.validate()?;
    let mut tx = scoped(&state, &auth).await?;
    ensure_project(&mut tx, &auth, Some(input.project_id)).await?;
    ensure_assignee(&mut tx, &auth, input.assignee_id).await?;
    let task = TaskService::create(&mut tx, auth.organization_id, &input).await?;
    commit(tx).await?;
    Ok(ApiResponse::created(task))
}

/// PATCH /api/tasks/:id - managers may change anything; a team member may
/// only move the status of a task assigned to them.
pub async fn update(
    State(state): State<AppState>,
    MemberAccess(auth): MemberAccess,
    Path(id): Path<Uuid>,
    Json(changes): Json<TaskUpdate>,
) -> ApiResult<Task> {
    changes.validate()?;
    let member_status = match (auth.is_manager(), changes.status) {
        (true, _) => None,
        (false, Some(status)) if changes.is_status_only() => Some(status),
        (false, _) => return Err(ApiError::forbidden("Team members may only update task status")),
    };

    let mut tx = scoped(&state, &auth).await?;
    let task = match member_status {
        None => {
            ensure_project(&mut tx, &auth, changes.project_id).await?;
            ensure_assignee(&mut tx, &auth, changes.assignee_id).await?;
            TaskService::update(&mut tx, auth.organization_id, id, &changes).await?
        }
        Some(status) => {
            let current = TaskService::get(&mut tx, auth.organization_id, id).await?;
            if current.assignee_id != Some(auth.user_id) {
                return Err(ApiError::forbidden("Task is not assigned to you"));
            }
            TaskService::update_status(&mut tx, auth.organization_id, id, status).await?
        }
    };

    commit(tx).await?;
    Ok(ApiResponse::success(task))
}

/// DELETE /api/tasks/:id
pub async fn delete(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let mut tx = scoped(&state, &auth).await?;
    TaskService::delete(&mut tx, auth.organization_id, id).await?;
    commit(tx).await?;
    Ok(ApiResponse::no_content())
}

async fn ensure_assignee(conn: &mut PgConnection, auth: &Authorization, assignee_id: Option<Uuid>) -> Result<(), ApiError> {
    if let Some(assignee_id) = assignee_id {
        if !MembershipService::is_active_member(conn, auth.organization_id, assignee_id).await? {
            return Err(ApiError::invalid_field("assignee_id", "Assignee is not an active team member"));
        }
    }
    Ok(())
}
