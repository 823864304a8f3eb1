use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::booking::{Booking, BookingFilter, BookingStatus, CreateBooking, UpdateBooking};
use services::services::transitions::StatusTransition;
use tracing::{info, instrument};
use utils::{pagination::Pagination, response::ApiResponse};
use uuid::Uuid;

use super::references::{require_event, require_vendor};
use crate::{AppState, auth::RequestContext, error::ApiError, middleware::load_booking_middleware};

#[instrument(
    name = "bookings.list",
    skip(state, ctx, filter, page),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(filter): Query<BookingFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<Booking>>>, ApiError> {
    let bookings = Booking::find_all(state.pool(), ctx.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(bookings)))
}

/// POST /api/v1/bookings - new bookings start as `requested`
#[instrument(
    name = "bookings.create",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, event_id = %payload.event_id)
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateBooking>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    payload.validate()?;
    require_event(state.pool(), ctx.organization_id, payload.event_id).await?;
    require_vendor(state.pool(), ctx.organization_id, payload.vendor_id).await?;

    let booking =
        Booking::create(state.pool(), ctx.organization_id, &payload, Uuid::new_v4()).await?;
    info!(booking_id = %booking.id, vendor_id = %booking.vendor_id, "Created booking");
    Ok(ResponseJson(ApiResponse::success(booking)))
}

pub async fn get_booking(
    Extension(booking): Extension<Booking>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(booking)))
}

#[instrument(
    name = "bookings.update",
    skip(state, ctx, booking, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, booking_id = %booking.id)
)]
pub async fn update_booking(
    Extension(booking): Extension<Booking>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateBooking>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    payload.validate(&booking)?;
    let updated = Booking::update(state.pool(), &booking, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

#[instrument(
    name = "bookings.delete",
    skip(state, ctx, booking),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, booking_id = %booking.id)
)]
pub async fn delete_booking(
    Extension(booking): Extension<Booking>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Booking::delete(state.pool(), booking.organization_id, booking.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("booking"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

#[instrument(name = "bookings.set_status", skip(state, booking), fields(booking_id = %booking.id))]
async fn move_booking(
    state: &AppState,
    booking: &Booking,
    next: BookingStatus,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    let next = booking.status.transition_to(next)?;
    let updated =
        Booking::update_status(state.pool(), booking.organization_id, booking.id, next).await?;
    info!(from = %booking.status, to = %next, "Booking status changed");
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn confirm_booking(
    Extension(booking): Extension<Booking>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    move_booking(&state, &booking, BookingStatus::Confirmed).await
}

pub async fn decline_booking(
    Extension(booking): Extension<Booking>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    move_booking(&state, &booking, BookingStatus::Declined).await
}

pub async fn cancel_booking(
    Extension(booking): Extension<Booking>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    move_booking(&state, &booking, BookingStatus::Cancelled).await
}

pub async fn complete_booking(
    Extension(booking): Extension<Booking>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Booking>>, ApiError> {
    move_booking(&state, &booking, BookingStatus::Completed).await
}

pub fn router(state: &AppState) -> Router<AppState> {
    let booking_router = Router::new()
        .route(
            "/",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
        .route("/confirm", post(confirm_booking))
        .route("/decline", post(decline_booking))
        .route("/cancel", post(cancel_booking))
        .route("/complete", post(complete_booking))
        .layer(from_fn_with_state(state.clone(), load_booking_middleware));

    let inner = Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .nest("/{booking_id}", booking_router);

    Router::new().nest("/bookings", inner)
}
