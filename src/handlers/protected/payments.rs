use axum::extract::State;
use uuid::Uuid;

use super::{commit, ensure_client, ensure_project, scoped};
use crate::app::AppState;
use crate::database::models::Payment;
use crate::middleware::{ApiResponse, ApiResult, Json, ManagerAccess, Path, Query};
use crate::services::payment_service::{NewPayment, PaymentFilter, PaymentUpdate};
use crate::services::PaymentService;

/// GET /api/payments
pub async fn list(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Query(filter): Query<PaymentFilter>,
) -> ApiResult<Vec<Payment>> {
    let mut tx = scoped(&state, &auth).await?;
    let payments = PaymentService::list(&mut tx, auth.organization_id, &filter).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(payments))
}

/// GET /api/payments/:id
pub async fn show(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(id): Path<Uuid>,
) -> ApiResult<Payment> {
    let mut tx = scoped(&state, &auth).await?;
    let payment = PaymentService::get(&mut tx, auth.organization_id, id).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(payment))
}

/// POST /api/payments
pub async fn create(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Json(input): Json<NewPayment>,
) -> ApiResult<Payment> {
    input.validate()?;
    let mut tx = scoped(&state, &auth).await?;
    ensure_client(&mut tx, &auth, Some(input.client_id)).await?;
    ensure_project(&mut tx, &auth, input.project_id).await?;
    let payment = PaymentService::create(&mut tx, auth.organization_id, &input).await?;
    commit(tx).await?;

    tracing::info!("Payment {} recorded for client {}", payment.id, payment.client_id);
    Ok(ApiResponse::created(payment))
}

/// PATCH /api/payments/:id
pub async fn update(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(id): Path<Uuid>,
    Json(changes): Json<PaymentUpdate>,
) -> ApiResult<Payment> {
    changes.validate()?;
    let mut tx = scoped(&state, &auth).await?;
    ensure_project(&mut tx, &auth, changes.project_id).await?;
    let payment = PaymentService::update(&mut tx, auth.organization_id, id, &changes).await?;
    commit(tx).await?;
    Ok(ApiResponse::success(payment))
}

/// DELETE /api/payments/:id
pub async fn delete(
    State(state): State<AppState>,
    ManagerAccess(auth): ManagerAccess,
    Path(id): Path<Uuid>,
) -> ApiResult<()> {
    let mut tx = scoped(&state, &auth).await?;
    PaymentService::delete(&mut tx, auth.organization_id, id).await?;
    commit(tx).await?;
    Ok(ApiResponse::no_content())
}
