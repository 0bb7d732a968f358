use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Project;
use crate::error::ApiError;
use crate::types::ProjectStatus;
use crate::validation::FieldErrors;

const PROJECT_COLUMNS: &str = "p.id, p.organization_id, p.client_id, p.name, p.description, p.status,
     p.budget, p.start_date, p.due_date, p.created_at, p.updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub client_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl NewProject {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.name("name", &self.name);
        errors.optional_positive("budget", self.budget);
        errors.date_order(self.start_date, "due_date", self.due_date);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub client_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub budget: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl ProjectUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional_name("name", self.name.as_deref());
        errors.optional_positive("budget", self.budget);
        errors.date_order(self.start_date, "due_date", self.due_date);
        errors.finish()
    }

    /// Date order against the stored project, for updates that move only one end
    pub fn validate_against(&self, current: &Project) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.date_order(
            self.start_date.or(current.start_date),
            "due_date",
            self.due_date.or(current.due_date),
        );
        errors.finish()
    }
}

pub struct ProjectService;

impl ProjectService {
    pub async fn list(
        conn: &mut PgConnection,
        organization_id: Uuid,
        filter: &ProjectFilter,
    ) -> Result<Vec<Project>, DatabaseError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p
             WHERE p.organization_id = $1
               AND ($2::text IS NULL OR p.status = $2)
               AND ($3::uuid IS NULL OR p.client_id = $3)
             ORDER BY p.created_at DESC"
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(organization_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.client_id)
            .fetch_all(conn)
            .await?)
    }

    /// Projects with at least one task assigned to `assignee_id`
    pub async fn list_for_assignee(
        conn: &mut PgConnection,
        organization_id: Uuid,
        assignee_id: Uuid,
    ) -> Result<Vec<Project>, DatabaseError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p
             WHERE p.organization_id = $1
               AND EXISTS (SELECT 1 FROM tasks t WHERE t.project_id = p.id AND t.assignee_id = $2)
             ORDER BY p.created_at DESC"
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(organization_id)
            .bind(assignee_id)
            .fetch_all(conn)
            .await?)
    }

    pub async fn get(conn: &mut PgConnection, organization_id: Uuid, id: Uuid) -> Result<Project, DatabaseError> {
        let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects p WHERE p.organization_id = $1 AND p.id = $2");
        sqlx::query_as::<_, Project>(&sql)
            .bind(organization_id)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Project not found".to_string()))
    }

    /// Like [`ProjectService::get`], but a project with no task assigned to
    /// the member is reported as missing.
    pub async fn get_for_assignee(
        conn: &mut PgConnection,
        organization_id: Uuid,
        id: Uuid,
        assignee_id: Uuid,
    ) -> Result<Project, DatabaseError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p
             WHERE p.organization_id = $1 AND p.id = $2
               AND EXISTS (SELECT 1 FROM tasks t WHERE t.project_id = p.id AND t.assignee_id = $3)"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(organization_id)
            .bind(id)
            .bind(assignee_id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Project not found".to_string()))
    }

    pub async fn exists(conn: &mut PgConnection, organization_id: Uuid, id: Uuid) -> Result<bool, DatabaseError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM projects WHERE organization_id = $1 AND id = $2)")
                .bind(organization_id)
                .bind(id)
                .fetch_one(conn)
                .await?;
        Ok(exists)
    }

    pub async fn create(
        conn: &mut PgConnection,
        organization_id: Uuid,
        input: &NewProject,
    ) -> Result<Project, DatabaseError> {
        let sql = format!(
            "INSERT INTO projects AS p
                (organization_id, client_id, name, description, status, budget, start_date, due_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {PROJECT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(organization_id)
            .bind(input.client_id)
            .bind(input.name.trim())
            .bind(&input.description)
            .bind(input.status.unwrap_or(ProjectStatus::Planning).as_str())
            .bind(input.budget)
            .bind(input.start_date)
            .bind(input.due_date)
            .fetch_one(conn)
            .await?)
    }

    pub async fn update(
        conn: &mut PgConnection,
        organization_id: Uuid,
        id: Uuid,
        changes: &ProjectUpdate,
    ) -> Result<Project, DatabaseError> {
        let sql = format!(
            "UPDATE projects AS p SET
                client_id = COALESCE($3, p.client_id),
                name = COALESCE($4, p.name),
                description = COALESCE($5, p.description),
                status = COALESCE($6, p.status),
                budget = COALESCE($7, p.budget),
                start_date = COALESCE($8, p.start_date),
                due_date = COALESCE($9, p.due_date),
                updated_at = now()
             WHERE p.organization_id = $1 AND p.id = $2
             RETURNING {PROJECT_COLUMNS}"
        );
        sqlx::query_as::<_, Project>(&sql)
            .bind(organization_id)
            .bind(id)
            .bind(changes.client_id)
            .bind(changes.name.as_deref().map(str::trim))
            .bind(&changes.description)
            .bind(changes.status.map(|s| s.as_str()))
            .bind(changes.budget)
            .bind(changes.start_date)
            .bind(changes.due_date)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Project not found".to_string()))
    }

    pub async fn delete(conn: &mut PgConnection, organization_id: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM projects WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Project not found".to_string()));
        }
        Ok(())
    }
}
