use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::lead::{CreateLead, Lead, LeadFilter, LeadStatus, UpdateLead};
use serde::Serialize;
use services::services::{
    lead_conversion::{ConversionResult, ConvertLead, convert_lead},
    lead_scoring::{self, LeadScore, LeadSignals, rescore_all, rescore_lead},
    transitions::StatusTransition,
};
use tracing::{info, instrument};
use ts_rs::TS;
use utils::{pagination::Pagination, response::ApiResponse};
use uuid::Uuid;

use super::references::{StatusChange, today};
use crate::{AppState, auth::RequestContext, error::ApiError, middleware::load_lead_middleware};

#[derive(Debug, Serialize, TS)]
pub struct RescoreAllResponse {
    /// Leads whose stored score changed
    pub changed: usize,
}

/// GET /api/v1/leads - highest score first
#[instrument(
    name = "leads.list",
    skip(state, ctx, filter, page),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn list_leads(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Query(filter): Query<LeadFilter>,
    Query(page): Query<Pagination>,
) -> Result<ResponseJson<ApiResponse<Vec<Lead>>>, ApiError> {
    let leads = Lead::find_all(state.pool(), ctx.organization_id, &filter, &page).await?;
    Ok(ResponseJson(ApiResponse::success(leads)))
}

/// POST /api/v1/leads - the score is computed from the submitted details
#[instrument(
    name = "leads.create",
    skip(state, ctx, payload),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn create_lead(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
    Json(payload): Json<CreateLead>,
) -> Result<ResponseJson<ApiResponse<Lead>>, ApiError> {
    payload.validate()?;
    let score = lead_scoring::score(&LeadSignals::from(&payload), today());
    let lead = Lead::create(
        state.pool(),
        ctx.organization_id,
        &payload,
        Uuid::new_v4(),
        i64::from(score),
    )
    .await?;
    info!(lead_id = %lead.id, score, "Created lead");
    Ok(ResponseJson(ApiResponse::success(lead)))
}

pub async fn get_lead(
    Extension(lead): Extension<Lead>,
) -> Result<ResponseJson<ApiResponse<Lead>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(lead)))
}

/// PUT /api/v1/leads/{id} - rescored after the update is applied
#[instrument(name = "leads.update", skip(state, lead, payload), fields(lead_id = %lead.id))]
pub async fn update_lead(
    Extension(lead): Extension<Lead>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateLead>,
) -> Result<ResponseJson<ApiResponse<Lead>>, ApiError> {
    payload.validate()?;
    let updated = Lead::update(state.pool(), lead.organization_id, lead.id, &payload).await?;
    let rescored = rescore_lead(state.pool(), lead.organization_id, &updated, today()).await?;
    Ok(ResponseJson(ApiResponse::success(rescored)))
}

#[instrument(name = "leads.delete", skip(state, lead), fields(lead_id = %lead.id))]
pub async fn delete_lead(
    Extension(lead): Extension<Lead>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Lead::delete(state.pool(), lead.organization_id, lead.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound("lead"));
    }
    Ok(ResponseJson(ApiResponse::success(())))
}

#[instrument(name = "leads.set_status", skip(state, lead, payload), fields(lead_id = %lead.id))]
pub async fn set_lead_status(
    Extension(lead): Extension<Lead>,
    State(state): State<AppState>,
    Json(payload): Json<StatusChange<LeadStatus>>,
) -> Result<ResponseJson<ApiResponse<Lead>>, ApiError> {
    let next = lead.status.transition_to(payload.status)?;
    let updated = Lead::update_status(state.pool(), lead.organization_id, lead.id, next).await?;
    info!(from = %lead.status, to = %next, "Lead status changed");
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// POST /api/v1/leads/{id}/rescore
pub async fn rescore_one(
    Extension(lead): Extension<Lead>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<Lead>>, ApiError> {
    let rescored = rescore_lead(state.pool(), lead.organization_id, &lead, today()).await?;
    Ok(ResponseJson(ApiResponse::success(rescored)))
}

/// POST /api/v1/leads/rescore - refresh every score in the organization,
/// e.g. after event dates have drifted closer
#[instrument(
    name = "leads.rescore_all",
    skip(state, ctx),
    fields(user_id = %ctx.user_id, org_id = %ctx.organization_id)
)]
pub async fn rescore_organization(
    State(state): State<AppState>,
    Extension(ctx): Extension<RequestContext>,
) -> Result<ResponseJson<ApiResponse<RescoreAllResponse>>, ApiError> {
    let changed = rescore_all(state.pool(), ctx.organization_id, today()).await?;
    Ok(ResponseJson(ApiResponse::success(RescoreAllResponse {
        changed,
    })))
}

/// POST /api/v1/leads/{id}/convert
#[instrument(name = "leads.convert", skip(state, lead, payload), fields(lead_id = %lead.id))]
pub async fn convert(
    Extension(lead): Extension<Lead>,
    State(state): State<AppState>,
    Json(payload): Json<ConvertLead>,
) -> Result<ResponseJson<ApiResponse<ConversionResult>>, ApiError> {
    let result = convert_lead(state.pool(), lead.organization_id, lead.id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(result)))
}

/// POST /api/v1/leads/score - evaluate signals without storing anything
pub async fn score_signals(
    Json(signals): Json<LeadSignals>,
) -> Result<ResponseJson<ApiResponse<LeadScore>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(LeadScore::evaluate(
        &signals,
        today(),
    ))))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let lead_router = Router::new()
        .route("/", get(get_lead).put(update_lead).delete(delete_lead))
        .route("/status", post(set_lead_status))
        .route("/rescore", post(rescore_one))
        .route("/convert", post(convert))
        .layer(from_fn_with_state(state.clone(), load_lead_middleware));

    let inner = Router::new()
        .route("/", get(list_leads).post(create_lead))
        .route("/rescore", post(rescore_organization))
        .route("/score", post(score_signals))
        .nest("/{lead_id}", lead_router);

    Router::new().nest("/leads", inner)
}
