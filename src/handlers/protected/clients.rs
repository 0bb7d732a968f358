use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use super::{commit, scoped};
use crate::app::AppState;
use crate::database::models::Client;
use crate::middleware::{ApiResponse, ApiResult, Json, ManagerAccess, Path, Query};
use crate::services::client_service::{ClientUpdate, NewClient};
use crate::services::ClientService;
use crate::types::ClientStatus;

#[derive(Debug, Default, Deserialize)]
pub struct ClientQuery {
    pub status: Option<ClientStatus>,
}

/// GET /api/clients
pub async fn list(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Query(query): Query<ClientQuery>,
) -> ApiResult<Vec<Client>> {
    let mut tx = scoped(&state, &auth).await?;
    let clients = ClientService::list(&mut tx, auth.organization_id, query.status).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(clients))
}

/// POST /api/clients
pub async fn create(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Json(input): Json<NewClient>,
) -> ApiResult<Client> {
    input.validate()?;
    let mut tx = scoped(&state, &auth).await?;
    let client = ClientService::create(&mut tx, auth.organization_id, &input).await?;
    commit(tx).await?;
    Ok(ApiResponse::created(client))
}

/// GET /api/clients/:id
pub async fn show(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(id): Path<Uuid>,
) -> ApiResult<Client> {
    let mut tx = scoped(&state, &auth).await?;
    let client = ClientService::get(&mut tx, auth.organization_id, id).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(client))
}

/// PATCH /api/clients/:id
pub async fn update(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(id): Path<Uuid>,
    Json(changes): Json<ClientUpdate>,
) -> ApiResult<Client> {
    changes.validate()?;
    let mut tx = scoped(&state, &auth).await?;
    let client = ClientService::update(&mut tx, auth.organization_id, id, &changes).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(client))
}

/// DELETE /api/clients/:id
pub async fn delete(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let mut tx = scoped(&state, &auth).await?;
    ClientService::delete(&mut tx, auth.organization_id, id).await?;
    commit(tx).await?;
    Ok(ApiResponse::no_content())
}
