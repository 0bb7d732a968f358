use serde::Deserialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Client;
use crate::error::ApiError;
use crate::types::ClientStatus;
use crate::validation::FieldErrors;

const CLIENT_COLUMNS: &str =
    "id, organization_id, name, email, phone, company, status, notes, created_at, updated_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: Option<ClientStatus>,
    pub notes: Option<String>,
}

impl NewClient {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.name("name", &self.name);
        errors.optional_email("email", self.email.as_deref());
        errors.optional_name("company", self.company.as_deref());
        errors.finish()
    }
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub status: Option<ClientStatus>,
    pub notes: Option<String>,
}

impl ClientUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional_name("name", self.name.as_deref());
        errors.optional_email("email", self.email.as_deref());
        errors.optional_name("company", self.company.as_deref());
        errors.finish()
    }
}

pub struct ClientService;

impl ClientService {
    pub async fn list(
        conn: &mut PgConnection,
        organization_id: Uuid,
        status: Option<ClientStatus>,
    ) -> Result<Vec<Client>, DatabaseError> {
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients
             WHERE organization_id = $1 AND ($2::text IS NULL OR status = $2)
             ORDER BY name"
        );
        Ok(sqlx::query_as::<_, Client>(&sql)
            .bind(organization_id)
            .bind(status.map(|s| s.as_str()))
            .fetch_all(conn)
            .await?)
    }

    pub async fn get(conn: &mut PgConnection, organization_id: Uuid, id: Uuid) -> Result<Client, DatabaseError> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE organization_id = $1 AND id = $2");
        sqlx::query_as::<_, Client>(&sql)
            .bind(organization_id)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Client not found".to_string()))
    }

    pub async fn exists(conn: &mut PgConnection, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM clients WHERE organization_id = $1 AND id = $2)")
                .bind(organization_id)
                .bind(id)
                .fetch_one(conn)
                .await?;
        Ok(exists)
    }

    pub async fn create(
        conn: &mut PgConnection,
        organization_id: Uuid,
        input: &NewClient,
    ) -> Result<Client, DatabaseError> {
        let sql = format!(
            "INSERT INTO clients (organization_id, name, email, phone, company, status, notes)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {CLIENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Client>(&sql)
            .bind(organization_id)
            .bind(input.name.trim())
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.company)
            .bind(input.status.unwrap_or(ClientStatus::Active).as_str())
            .bind(&input.notes)
            .fetch_one(conn)
            .await?)
    }

    pub async fn update(
        conn: &mut PgConnection,
        organization_id: Uuid,
        id: Uuid,
        changes: &ClientUpdate,
    ) -> Result<Client, DatabaseError> {
        let sql = format!(
            "UPDATE clients SET
                name = COALESCE($3, name),
                email = COALESCE($4, email),
                phone = COALESCE($5, phone),
                company = COALESCE($6, company),
                status = COALESCE($7, status),
                notes = COALESCE($8, notes),
                updated_at = now()
             WHERE organization_id = $1 AND id = $2
             RETURNING {CLIENT_COLUMNS}"
        );
        sqlx::query_as::<_, Client>(&sql)
            .bind(organization_id)
            .bind(id)
            .bind(changes.name.as_deref().map(str::trim))
            .bind(&changes.email)
            .bind(&changes.phone)
            .bind(&changes.company)
            .bind(changes.status.map(|s| s.as_str()))
            .bind(&changes.notes)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Client not found".to_string()))
    }

    pub async fn delete(conn: &mut PgConnection, organization_id: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM clients WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Client not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_requires_name_and_valid_email() {
        let input = NewClient {
            name: " ".to_string(),
            email: Some("nope".to_string()),
            phone: None,
            company: None,
            status: None,
            notes: None,
        };
        let body = input.validate().unwrap_err().to_json();
        assert!(body["field_errors"]["name"].is_string());
        assert!(body["field_errors"]["email"].is_string());
    }

    #[test]
    fn empty_update_is_valid() {
        assert!(ClientUpdate::default().validate().is_ok());
    }
}
