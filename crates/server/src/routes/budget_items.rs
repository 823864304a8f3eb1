use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::budget_item::{BudgetItem, BudgetItemFilter, CreateBudgetItem, UpdateBudgetItem};
use tracing::instrument;
use utils::{pagination::Pagination, response::ApiResponse};
use uuid::Uuid;

use super::references::{require_event, require_vendor};
use crate::{
    AppState, auth::RequestContext, error::ApiError, middleware::load_budget_item_middleware,
};

pub async fn list_budget_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(filter): Query<BudgetItemFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<BudgetItem>>>, ApiError> {
    let items = BudgetItem::find_all(state.pool(), ctx.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

#[instrument(
    name = "budget_items.create",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, event_id = %payload.event_id)
)]
pub async fn create_budget_item(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateBudgetItem>,
) -> Result<ResponseJson<ApiResponse<BudgetItem>>, ApiError> {
    payload.validate()?;
    require_event(state.pool(), ctx.organization_id, payload.event_id).await?;
    if let Some(vendor_id) = payload.vendor_id {
        require_vendor(state.pool(), ctx.organization_id, vendor_id).await?;
    }
    let item =
        BudgetItem::create(state.pool(), ctx.organization_id, &payload, Uuid::new_v4()).await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

pub async fn get_budget_item(
    Extension(item): Extension<BudgetItem>,
) -> Result<ResponseJson<ApiResponse<BudgetItem>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(item)))
}

#[instrument(
    name = "budget_items.update",
    skip(state, ctx, item, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, budget_item_id = %item.id)
)]
pub async fn update_budget_item(
    Extension(item): Extension<BudgetItem>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateBudgetItem>,
) -> Result<ResponseJson<ApiResponse<BudgetItem>>, ApiError> {
    payload.validate()?;
    if let Some(vendor_id) = payload.vendor_id {
        require_vendor(state.pool(), item.organization_id, vendor_id).await?;
    }
    let updated = BudgetItem::update(state.pool(), item.organization_id, item.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

#[instrument(
    name = "budget_items.delete",
    skip(state, ctx, item),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, budget_item_id = %item.id)
)]
pub async fn delete_budget_item(
    Extension(item): Extension<BudgetItem>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = BudgetItem::delete(state.pool(), item.organization_id, item.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("budget item"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let item_router = Router::new()
        .route(
            "/",
            get(get_budget_item)
                .put(update_budget_item)
                .delete(delete_budget_item),
        )
        .layer(from_fn_with_state(state.clone(), load_budget_item_middleware));

    let inner = Router::new()
        .route("/", get(list_budget_items).post(create_budget_item))
        .nest("/{budget_item_id}", item_router);

    Router::new().nest("/budget-items", inner)
}
