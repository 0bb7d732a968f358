use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{Project, Task};
use crate::services::project_service::ProjectService;
use crate::services::task_service::TaskService;

/// Organization-wide numbers shown on the owner dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, sqlx::FromRow)]
pub struct OwnerSummary {
    pub active_clients: i64,
    pub active_projects: i64,
    pub open_tasks: i64,
    pub team_members: i64,
    pub revenue_collected: Decimal,
    pub revenue_outstanding: Decimal,
    pub overdue_payments: i64,
}

/// What a team member sees on their dashboard
#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub open_tasks: Vec<Task>,
    pub projects: Vec<Project>,
}

pub struct DashboardService;

impl DashboardService {
    pub async fn owner_summary(conn: &mut PgConnection, organization_id: Uuid) -> Result<OwnerSummary, DatabaseError> {
        Ok(sqlx::query_as::<_, OwnerSummary>(
            "SELECT
                (SELECT count(*) FROM clients WHERE organization_id = $1 AND status = 'active') AS active_clients,
                (SELECT count(*) FROM projects WHERE organization_id = $1 AND status = 'active') AS active_projects,
                (SELECT count(*) FROM tasks WHERE organization_id = $1 AND status <> 'done') AS open_tasks,
                (SELECT count(*) FROM memberships WHERE organization_id = $1 AND status = 'active') AS team_members,
                (SELECT COALESCE(sum(amount), 0) FROM payments
                    WHERE organization_id = $1 AND status = 'paid') AS revenue_collected,
                (SELECT COALESCE(sum(amount), 0) FROM payments
                    WHERE organization_id = $1 AND status IN ('pending', 'overdue')) AS revenue_outstanding,
                (SELECT count(*) FROM payments WHERE organization_id = $1 AND status = 'overdue') AS overdue_payments",
        )
        .bind(organization_id)
        .fetch_one(conn)
        .await?)
    }

    pub async fn member_summary(
        conn: &mut PgConnection,
        organization_id: Uuid,
        user_id: Uuid,
    ) -> Result<MemberSummary, DatabaseError> {
        let open_tasks = TaskService::list_for_assignee(&mut *conn, organization_id, user_id, None)
            .await?
            .into_iter()
            .filter(|t| t.status.is_open())
            .collect();
        let projects = ProjectService::list_for_assignee(&mut *conn, organization_id, user_id).await?;
        Ok(MemberSummary { open_tasks, projects })
    }
}
