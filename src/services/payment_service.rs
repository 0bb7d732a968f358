use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Payment;
use crate::error::ApiError;
use crate::types::PaymentStatus;
use crate::validation::FieldErrors;

const PAYMENT_COLUMNS: &str = "id, organization_id, client_id, project_id, amount, currency, status,
     due_date, paid_at, notes, created_at, updated_at";

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentFilter {
    pub status: Option<PaymentStatus>,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    pub client_id: Uuid,
    pub project_id: Option<Uuid>,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub status: Option<PaymentStatus>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl NewPayment {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.positive("amount", self.amount);
        if let Some(currency) = &self.currency {
            errors.currency("currency", currency);
        }
        errors.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentUpdate {
    pub project_id: Option<Uuid>,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub status: Option<PaymentStatus>,
    pub due_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl PaymentUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.optional_positive("amount", self.amount);
        if let Some(currency) = &self.currency {
            errors.currency("currency", currency);
        }
        errors.finish()
    }
}

pub struct PaymentService;

impl PaymentService {
    pub async fn list(
        conn: &mut PgConnection,
        organization_id: Uuid,
        filter: &PaymentFilter,
    ) -> Result<Vec<Payment>, DatabaseError> {
        let sql = format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE organization_id = $1
               AND ($2::text IS NULL OR status = $2)
               AND ($3::uuid IS NULL OR client_id = $3)
             ORDER BY due_date NULLS LAST, created_at DESC"
        );
        Ok(sqlx::query_as::<_, Payment>(&sql)
            .bind(organization_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.client_id)
            .fetch_all(conn)
            .await?)
    }

    pub async fn get(conn: &mut PgConnection, organization_id: Uuid, id: Uuid) -> Result<Payment, DatabaseError> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE organization_id = $1 AND id = $2");
        sqlx::query_as::<_, Payment>(&sql)
            .bind(organization_id)
            .bind(id)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Payment not found".to_string()))
    }

    pub async fn create(
        conn: &mut PgConnection,
        organization_id: Uuid,
        input: &NewPayment,
    ) -> Result<Payment, DatabaseError> {
        let status = input.status.unwrap_or(PaymentStatus::Pending);
        let sql = format!(
            "INSERT INTO payments
                (organization_id, client_id, project_id, amount, currency, status, due_date, notes, paid_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, CASE WHEN $6 = 'paid' THEN now() END)
             RETURNING {PAYMENT_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Payment>(&sql)
            .bind(organization_id)
            .bind(input.client_id)
            .bind(input.project_id)
            .bind(input.amount)
            .bind(input.currency.as_deref().unwrap_or(DEFAULT_CURRENCY))
            .bind(status.as_str())
            .bind(input.due_date)
            .bind(&input.notes)
            .fetch_one(conn)
            .await?)
    }

    /// Apply a partial update. Moving to `paid` stamps `paid_at` unless it is
    /// already set.
    pub async fn update(
        conn: &mut PgConnection,
        organization_id: Uuid,
        id: Uuid,
        changes: &PaymentUpdate,
    ) -> Result<Payment, DatabaseError> {
        let sql = format!(
            "UPDATE payments SET
                project_id = COALESCE($3, project_id),
                amount = COALESCE($4, amount),
                currency = COALESCE($5, currency),
                status = COALESCE($6, status),
                due_date = COALESCE($7, due_date),
                notes = COALESCE($8, notes),
                paid_at = CASE
                    WHEN $6 = 'paid' THEN COALESCE(paid_at, now())
                    ELSE paid_at
                END,
                updated_at = now()
             WHERE organization_id = $1 AND id = $2
             RETURNING {PAYMENT_COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&sql)
            .bind(organization_id)
            .bind(id)
            .bind(changes.project_id)
            .bind(changes.amount)
            .bind(&changes.currency)
            .bind(changes.status.map(|s| s.as_str()))
            .bind(changes.due_date)
            .bind(&changes.notes)
            .fetch_optional(conn)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Payment not found".to_string()))
    }

    pub async fn delete(conn: &mut PgConnection, organization_id: Uuid, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM payments WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Payment not found".to_string()));
        }
        Ok(())
    }
}
