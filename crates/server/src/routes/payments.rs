use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::payment::{CreatePayment, Payment, PaymentFilter, PaymentStatus, UpdatePayment};
use serde::Serialize;
use services::services::transitions::StatusTransition;
use sqlx::SqlitePool;
use tracing::{info, instrument};
use ts_rs::TS;
use utils::{pagination::Pagination, response::ApiResponse};
use uuid::Uuid;

use super::references::{require_booking, require_event, today};
use crate::{AppState, auth::RequestContext, error::ApiError, middleware::load_payment_middleware};

#[derive(Debug, Serialize, TS)]
pub struct MarkOverdueResponse {
    pub updated: u64,
}

/// A payment's booking must belong to the same event as the payment.
async fn check_booking(
    pool: &SqlitePool,
    organization_id: Uuid,
    event_id: Uuid,
    booking_id: Uuid,
) -> Result<(), ApiError> {
    let booking = require_booking(pool, organization_id, booking_id).await?;
    if booking.event_id != event_id {
        return Err(ApiError::BadRequest(format!(
            "booking {booking_id} belongs to a different event"
        )));
    }
    Ok(())
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(filter): Query<PaymentFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<Payment>>>, ApiError> {
    let payments = Payment::find_all(state.pool(), ctx.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(payments)))
}

#[instrument(
    name = "payments.create",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, event_id = %payload.event_id)
)]
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreatePayment>,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    payload.validate()?;
    require_event(state.pool(), ctx.organization_id, payload.event_id).await?;
    if let Some(booking_id) = payload.booking_id {
        check_booking(state.pool(), ctx.organization_id, payload.event_id, booking_id).await?;
    }
    let payment =
        Payment::create(state.pool(), ctx.organization_id, &payload, Uuid::new_v4()).await?;
    info!(payment_id = %payment.id, amount = payment.amount, "Created payment");
    Ok(ResponseJson(ApiResponse::success(payment)))
}

pub async fn get_payment(
    Extension(payment): Extension<Payment>,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(payment)))
}

#[instrument(
    name = "payments.update",
    skip(state, ctx, payment, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, payment_id = %payment.id)
)]
pub async fn update_payment(
    Extension(payment): Extension<Payment>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePayment>,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    payload.validate()?;
    if let Some(booking_id) = payload.booking_id {
        check_booking(
            state.pool(),
            payment.organization_id,
            payment.event_id,
            booking_id,
        )
        .await?;
    }
    let updated =
        Payment::update(state.pool(), payment.organization_id, payment.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

#[instrument(
    name = "payments.delete",
    skip(state, ctx, payment),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, payment_id = %payment.id)
)]
pub async fn delete_payment(
    Extension(payment): Extension<Payment>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Payment::delete(state.pool(), payment.organization_id, payment.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("payment"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

#[instrument(name = "payments.set_status", skip(state, payment), fields(payment_id = %payment.id))]
async fn move_payment(
    state: &AppState,
    payment: &Payment,
    next: PaymentStatus,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    let next = payment.status.transition_to(next)?;
    let updated =
        Payment::update_status(state.pool(), payment.organization_id, payment.id, next).await?;
    info!(from = %payment.status, to = %next, "Payment status changed");
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn mark_paid(
    Extension(payment): Extension<Payment>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    move_payment(&state, &payment, PaymentStatus::Paid).await
}

pub async fn refund_payment(
    Extension(payment): Extension<Payment>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    move_payment(&state, &payment, PaymentStatus::Refunded).await
}

pub async fn cancel_payment(
    Extension(payment): Extension<Payment>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Payment>>, ApiError> {
    move_payment(&state, &payment, PaymentStatus::Cancelled).await
}

/// POST /api/v1/payments/mark-overdue - flag pending payments past their due date
#[instrument(
    name = "payments.mark_overdue",
    skip(state, ctx),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn mark_overdue(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<ResponseJson<ApiResponse<MarkOverdueResponse>>, ApiError> {
    let updated = Payment::mark_overdue(state.pool(), ctx.organization_id, today()).await?;
    if updated > 0 {
        info!(updated, "Marked payments overdue");
    }
    Ok(ResponseJson(ApiResponse::success(MarkOverdueResponse {
        updated,
    })))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let payment_router = Router::new()
        .route(
            "/",
            get(get_payment).put(update_payment).delete(delete_payment),
        )
        .route("/mark-paid", post(mark_paid))
        .route("/refund", post(refund_payment))
        .route("/cancel", post(cancel_payment))
        .layer(from_fn_with_state(state.clone(), load_payment_middleware));

    let inner = Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route("/mark-overdue", post(mark_overdue))
        .nest("/{payment_id}", payment_router);

    Router::new().nest("/payments", inner)
}
