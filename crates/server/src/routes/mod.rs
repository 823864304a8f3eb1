use axum::{
    Router,
    http::{Request, header::HeaderName},
    middleware,
    routing::get,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, field};

use crate::{
    AppState,
    auth::require_session,
    middleware::rate_limit,
};

pub mod bookings;
pub mod budget_items;
pub mod events;
pub mod health;
pub mod leads;
pub mod payments;
pub mod references;
pub mod tasks;
pub mod timeline_items;
pub mod vendors;

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .and_then(|id| id.header_value().to_str().ok());
            let span = tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = field::Empty
            );
            if let Some(request_id) = request_id {
                span.record("request_id", field::display(request_id));
            }
            span
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR));

    let public = Router::<AppState>::new()
        .route("/health", get(health::health_check))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit));

    // rate_limit runs inside require_session so buckets are keyed by tenant.
    let v1 = Router::<AppState>::new()
        .merge(events::router(&state))
        .merge(leads::router(&state))
        .merge(vendors::router(&state))
        .merge(bookings::router(&state))
        .merge(budget_items::router(&state))
        .merge(payments::router(&state))
        .merge(tasks::router(&state))
        .merge(timeline_items::router(&state))
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_session,
        ));

    let cors = if state.config.cors_permissive {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
    };

    Router::<AppState>::new()
        .nest("/api", public)
        .nest("/api/v1", v1)
        .layer(cors)
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            MakeRequestUuid,
        ))
        .with_state(state)
}
