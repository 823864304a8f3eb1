use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::vendor::{CreateVendor, UpdateVendor, Vendor, VendorFilter};
use tracing::{info, instrument};
use utils::{pagination::Pagination, response::ApiResponse};
use uuid::Uuid;

use crate::{AppState, auth::RequestContext, error::ApiError, middleware::load_vendor_middleware};

#[instrument(
    name = "vendors.list",
    skip(state, ctx, filter, page),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn list_vendors(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(filter): Query<VendorFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<Vendor>>>, ApiError> {
    let vendors = Vendor::find_all(state.pool(), ctx.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(vendors)))
}

#[instrument(
    name = "vendors.create",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn create_vendor(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateVendor>,
) -> Result<ResponseJson<ApiResponse<Vendor>>, ApiError> {
    payload.validate()?;
    let vendor = Vendor::create(state.pool(), ctx.organization_id, &payload, Uuid::new_v4()).await?;
    info!(vendor_id = %vendor.id, "Created vendor");
    Ok(ResponseJson(ApiResponse::success(vendor)))
}

pub async fn get_vendor(
    Extension(vendor): Extension<Vendor>,
) -> Result<ResponseJson<ApiResponse<Vendor>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(vendor)))
}

#[instrument(
    name = "vendors.update",
    skip(state, ctx, vendor, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id, vendor_id = %vendor.id)
)]
pub async fn update_vendor(
    Extension(vendor): Extension<Vendor>,
    Extension(ctx): Extension<RequestContext>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateVendor>,
) -> Result<ResponseJson<ApiResponse<Vendor>>, ApiError> {
    payload.validate()?;
    let updated = Vendor::update(state.pool(), vendor.organization_id, vendor.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/v1/vendors/{id} - refused with 409 while bookings reference it
#[instrument(name = "vendors.delete", skip(state, vendor), fields(vendor_id = %vendor.id))]
pub async fn delete_vendor(
    Extension(vendor): Extension<Vendor>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Vendor::delete(state.pool(), vendor.organization_id, vendor.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("vendor"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let vendor_router = Router::new()
        .route("/", get(get_vendor).put(update_vendor).delete(delete_vendor))
        .layer(from_fn_with_state(state.clone(), load_vendor_middleware));

    let inner = Router::new()
        .route("/", get(list_vendors).post(create_vendor))
        .nest("/{vendor_id}", vendor_router);

    Router::new().nest("/vendors", inner)
}
