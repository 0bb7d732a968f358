pub mod auth;
pub mod clients;
pub mod organization;
pub mod payments;
pub mod projects;
pub mod tasks;
pub mod team;

use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use crate::access::Authorization;
use crate::app::AppState;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::services::{ClientService, ProjectService};

/// Transaction on the restricted pool carrying the caller's identity
pub(crate) async fn scoped(state: &AppState, auth: &Authorization) -> Result<Transaction<'static, Postgres>, ApiError> {
    Ok(state.db.begin_scoped(auth.user_id).await?)
}

pub(crate) async fn commit(tx: Transaction<'static, Postgres>) -> Result<(), ApiError> {
    tx.commit().await.map_err(DatabaseError::from)?;
    Ok(())
}

pub(crate) async fn ensure_client(
    conn: &mut PgConnection,
    auth: &Authorization,
    client_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(client_id) = client_id {
        if !ClientService::exists(conn, auth.organization_id, client_id).await? {
            return Err(ApiError::invalid_field("client_id", "Client does not belong to this organization"));
        }
    }
    Ok(())
}

pub(crate) async fn ensure_project(
    conn: &mut PgConnection,
    auth: &Authorization,
    project_id: Option<Uuid>,
) -> Result<(), ApiError> {
    if let Some(project_id) = project_id {
        if !ProjectService::exists(conn, auth.organization_id, project_id).await? {
            return Err(ApiError::invalid_field("project_id", "Project does not belong to this organization"));
        }
    }
    Ok(())
}
