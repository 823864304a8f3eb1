use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::timeline_item::{
    CreateTimelineItem, TimelineItem, TimelineItemFilter, UpdateTimelineItem,
};
use tracing::{info, instrument};
use utils::{pagination::Pagination, response::ApiResponse};
use uuid::Uuid;

use super::references::require_event;
use crate::{
    AppState, auth::RequestContext, error::ApiError, middleware::load_timeline_item_middleware,
};

pub async fn list_timeline_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(filter): Query<TimelineItemFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<TimelineItem>>>, ApiError> {
    let items = TimelineItem::find_all(state.pool(), ctx.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

#[instrument(
    name = "timeline_items.create",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, event_id = %payload.event_id)
)]
pub async fn create_timeline_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateTimelineItem>,
) -> Result<ResponseJson<ApiResponse<TimelineItem>>, ApiError> {
    payload.validate()?;
    require_event(state.pool(), ctx.organization_id, payload.event_id).await?;
    let item =
        TimelineItem::create(state.pool(), ctx.organization_id, &payload, Uuid::new_v4()).await?;
    info!(timeline_item_id = %item.id, "Created timeline item");
    Ok(ResponseJson(ApiResponse::success(item)))
}

pub async fn get_timeline_item(
    Extension(item): Extension<TimelineItem>,
) -> Result<ResponseJson<ApiResponse<TimelineItem>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(item)))
}

#[instrument(
    name = "timeline_items.update",
    skip(state, ctx, item, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, timeline_item_id = %item.id)
)]
pub async fn update_timeline_item(
    Extension(item): Extension<TimelineItem>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateTimelineItem>,
) -> Result<ResponseJson<ApiResponse<TimelineItem>>, ApiError> {
    payload.validate(&item)?;
    let updated = TimelineItem::update(state.pool(), &item, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

#[instrument(
    name = "timeline_items.delete",
    skip(state, ctx, item),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, timeline_item_id = %item.id)
)]
pub async fn delete_timeline_item(
    Extension(item): Extension<TimelineItem>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = TimelineItem::delete(state.pool(), item.organization_id, item.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("timeline item"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let item_router = Router::new()
        .route(
            "/",
            get(get_timeline_item)
                .put(update_timeline_item)
                .delete(delete_timeline_item),
        )
        .layer(from_fn_with_state(
            state.clone(),
            load_timeline_item_middleware,
        ));

    let inner = Router::new()
        .route("/", get(list_timeline_items).post(create_timeline_item))
        .nest("/{timeline_item_id}", item_router);

    Router::new().nest("/timeline-items", inner)
}
