use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    booking::{Booking, BookingFilter},
    budget_item::BudgetItem,
    event::{CreateEvent, Event, EventFilter, EventStatus, UpdateEvent},
    payment::{Payment, PaymentFilter},
    task::{Task, TaskFilter},
    timeline_item::{TimelineItem, TimelineItemFilter},
};
use services::services::{
    event_summary::{BudgetSummary, EventSummary},
    transitions::StatusTransition,
};
use tracing::{info, instrument};
use utils::{pagination::Pagination, response::ApiResponse};
use uuid::Uuid;

use super::references::{StatusChange, require_lead, today};
use crate::{AppState, auth::RequestContext, error::ApiError, middleware::load_event_middleware};

/// GET /api/v1/events
#[instrument(
    name = "events.list",
    skip(state, ctx, filter, page),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn list_events(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(filter): Query<EventFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<Event>>>, ApiError> {
    let events = Event::find_all(state.pool(), ctx.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(events)))
}

/// POST /api/v1/events
#[instrument(
    name = "events.create",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn create_event(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateEvent>,
) -> Result<ResponseJson<ApiResponse<Event>>, ApiError> {
    payload.validate()?;
    if let Some(lead_id) = payload.lead_id {
        require_lead(state.pool(), ctx.organization_id, lead_id).await?;
    }
    let event = Event::create(state.pool(), ctx.organization_id, &payload, Uuid::new_v4()).await?;
    info!(event_id = %event.id, "Created event");
    Ok(ResponseJson(ApiResponse::success(event)))
}

/// GET /api/v1/events/{id}
pub async fn get_event(
    Extension(event): Extension<Event>,
) -> Result<ResponseJson<ApiResponse<Event>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(event)))
}

/// PUT /api/v1/events/{id}
#[instrument(name = "events.update", skip(state, event, payload), fields(event_id = %event.id))]
pub async fn update_event(
    Extension(event): Extension<Event>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateEvent>,
) -> Result<ResponseJson<ApiResponse<Event>>, ApiError> {
    payload.validate()?;
    let updated = Event::update(state.pool(), event.organization_id, event.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/v1/events/{id} - also removes the event's bookings, budget,
/// payments and timeline
#[instrument(name = "events.delete", skip(state, event), fields(event_id = %event.id))]
pub async fn delete_event(
    Extension(event): Extension<Event>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Event::delete(state.pool(), event.organization_id, event.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("event"));
    }
    info!(event_id = %event.id, "Deleted event");
    Ok(ResponseJson(ApiResponse::success(())))
}

/// POST /api/v1/events/{id}/status
#[instrument(name = "events.set_status", skip(state, event, payload), fields(event_id = %event.id))]
pub async fn set_event_status(
    Extension(event): Extension<Event>,
    State(state): State<AppState>,
    Json(payload): Json<StatusChange<EventStatus>>,
) -> Result<ResponseJson<ApiResponse<Event>>, ApiError> {
    let next = event.status.transition_to(payload.status)?;
    let updated =
        Event::update_status(state.pool(), event.organization_id, event.id, next).await?;
    info!(from = %event.status, to = %next, "Event status changed");
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// GET /api/v1/events/{id}/summary
#[instrument(name = "events.summary", skip(state, event), fields(event_id = %event.id))]
pub async fn get_event_summary(
    Extension(event): Extension<Event>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<EventSummary>>, ApiError> {
    let summary = EventSummary::load(state.pool(), &event, today()).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

/// GET /api/v1/events/{id}/budget
pub async fn get_event_budget(
    Extension(event): Extension<Event>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<BudgetSummary>>, ApiError> {
    let categories =
        BudgetItem::category_totals(state.pool(), event.organization_id, event.id).await?;
    Ok(ResponseJson(ApiResponse::success(
        BudgetSummary::from_totals(categories, event.budget),
    )))
}

pub async fn list_event_bookings(
    Extension(event): Extension<Event>,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<Booking>>>, ApiError> {
    let filter = BookingFilter {
        event_id: Some(event.id),
        ..Default::default()
    };
    let bookings = Booking::find_all(state.pool(), event.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(bookings)))
}

pub async fn list_event_tasks(
    Extension(event): Extension<Event>,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<Task>>>, ApiError> {
    let filter = TaskFilter {
        event_id: Some(event.id),
        ..Default::default()
    };
    let tasks = Task::find_all(state.pool(), event.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn list_event_payments(
    Extension(event): Extension<Event>,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<Payment>>>, ApiError> {
    let filter = PaymentFilter {
        event_id: Some(event.id),
        ..Default::default()
    };
    let payments = Payment::find_all(state.pool(), event.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(payments)))
}

pub async fn list_event_timeline(
    Extension(event): Extension<Event>,
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<TimelineItem>>>, ApiError> {
    let filter = TimelineItemFilter {
        event_id: Some(event.id),
    };
    let items = TimelineItem::find_all(state.pool(), event.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let event_router = Router::new()
        .route("/", get(get_event).put(update_event).delete(delete_event))
        .route("/status", post(set_event_status))
        .route("/summary", get(get_event_summary))
        .route("/budget", get(get_event_budget))
        .route("/bookings", get(list_event_bookings))
        .route("/tasks", get(list_event_tasks))
        .route("/payments", get(list_event_payments))
        .route("/timeline", get(list_event_timeline))
        .layer(from_fn_with_state(state.clone(), load_event_middleware));

    let inner = Router::new()
        .route("/", get(list_events).post(create_event))
        .nest("/{event_id}", event_router);

    Router::new().nest("/events", inner)
}
