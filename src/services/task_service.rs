use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Task;
use crate::error::ApiError;
use crate::types::{TaskPriority, TaskStatus};
use crate::validation::FieldErrors;

const TASK_COLUMNS: &str = "id, organization_id, project_id, assignee_id, title, description, status,
     priority, due_date, created_at, updated_at";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskFilter {
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub project_id: Uuid,
    pub title: String,
    pub assignee_id: Option<Uuid>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
}

impl NewTask {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.name("title", &self.title);
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskUpdate {
    pub project_id: Option<Uuid>,
    pub assignee_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
}

impl TaskUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional_name("title", self.title.as_deref());
        errors.finish()
    }

    /// True when the update touches nothing but the status, the only field
    /// a team member may change on their own tasks.
    pub fn is_status_only(&self) -> bool {
        self.status.is_some()
            && self.project_id.is_none()
            && self.assignee_id.is_none()
            && self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }
}

pub struct TaskService;

impl TaskService {
    pub async fn list(
        conn: &mut PgConnection,
        organization_id: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, DatabaseError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE organization_id = $1
               AND ($2::uuid IS NULL OR project_id = $2)
               AND ($3::uuid IS NULL OR assignee_id = $3)
               AND ($4::text IS NULL OR status = $4)
             ORDER BY due_date NULLS LAST, created_at"
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(organization_id)
            .bind(filter.project_id)
            .bind(filter.assignee_id)
            .bind(filter.status.map(|s| s.as_str()))
            .fetch_all(conn)
            .await?)
    }

    pub async fn list_for_assignee(
        conn: &mut PgConnection,
        organization_id: Uuid,
        assignee_id: Uuid,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Task>, DatabaseError> {
        let filter = TaskFilter {
            project_id: None,
            assignee_id: Some(assignee_id),
            status,
        };
        Self::list(conn, organization_id, &filter).await
    }

    pub async fn get(conn: &mut PgConnection, organization_id: Uuid, id: Uuid) -> Result<Task, DatabaseError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE organization_id = $1 AND id = $2");
        sqlx::query_as::<_, Task>(&sql)
            .bind(organization_id)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Task not found".to_string()))
    }

    pub async fn create(conn: &mut PgConnection, organization_id: Uuid, input: &NewTask) -> Result<Task, DatabaseError> {
        let sql = format!(
            "INSERT INTO tasks
                (organization_id, project_id, assignee_id, title, description, status, priority, due_date)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {TASK_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(organization_id)
            .bind(input.project_id)
            .bind(input.assignee_id)
            .bind(input.title.trim())
            .bind(&input.description)
            .bind(input.status.unwrap_or(TaskStatus::Todo).as_str())
            .bind(input.priority.unwrap_or(TaskPriority::Medium).as_str())
            .bind(input.due_date)
            .fetch_one(conn)
            .await?)
    }

    pub async fn update(
        conn: &mut PgConnection,
        organization_id: Uuid,
        id: Uuid,
        changes: &TaskUpdate,
    ) -> Result<Task, DatabaseError> {
        let sql = format!(
            "UPDATE tasks SET
                project_id = COALESCE($3, project_id),
                assignee_id = COALESCE($4, assignee_id),
                title = COALESCE($5, title),
                description = COALESCE($6, description),
                status = COALESCE($7, status),
                priority = COALESCE($8, priority),
                due_date = COALESCE($9, due_date),
                updated_at = now()
             WHERE organization_id = $1 AND id = $2
             RETURNING {TASK_COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&sql)
            .bind(organization_id)
            .bind(id)
            .bind(changes.project_id)
            .bind(changes.assignee_id)
            .bind(changes.title.as_deref().map(str::trim))
            .bind(&changes.description)
            .bind(changes.status.map(|s| s.as_str()))
            .bind(changes.priority.map(|p| p.as_str()))
            .bind(changes.due_date)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Task not found".to_string()))
    }

    pub async fn update_status(
        conn: &mut PgConnection,
        organization_id: Uuid,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Task, DatabaseError> {
        let changes = TaskUpdate {
            status: Some(status),
            ..Default::default()
        };
        Self::update(conn, organization_id, id, &changes).await
    }

    pub async fn delete(conn: &mut PgConnection, organization_id: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM tasks WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Task not found".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_updates() {
        let status = TaskUpdate {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        assert!(status.is_status_only());

        let retitle = TaskUpdate {
            status: Some(TaskStatus::Done),
            title: Some("Ship it".to_string()),
            ..Default::default()
        };
        assert!(!retitle.is_status_only());
        assert!(!TaskUpdate::default().is_status_only());
    }

    #[test]
    fn blank_title_rejected() {
        let update = TaskUpdate {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }
}
