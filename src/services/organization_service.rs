use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Organization;

pub struct OrganizationService;

impl OrganizationService {
    pub async fn get(conn: &mut PgConnection, organization_id: Uuid) -> Result<Organization, DatabaseError> {
        sqlx::query_as::<_, Organization>(
            "SELECT id, name, created_at, updated_at FROM organizations WHERE id = $1",
        )
        .bind(organization_id)
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Organization not found".to_string()))
    }

    pub async fn rename(
        conn: &mut PgConnection,
        organization_id: Uuid,
        name: &str,
    ) -> Result<Organization, DatabaseError> {
        sqlx::query_as::<_, Organization>(
            "UPDATE organizations SET name = $2, updated_at = now()
             WHERE id = $1
             RETURNING id, name, created_at, updated_at",
        )
        .bind(organization_id)
        .bind(name.trim())
        .fetch_optional(conn)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Organization not found".to_string()))
    }
}
