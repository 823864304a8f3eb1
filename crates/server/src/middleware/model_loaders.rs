//! Path-parameter loaders for `/{id}` sub-routers.
//!
//! Each loader resolves the id within the caller's organization and inserts
//! the record into the request extensions, so handlers take
//! `Extension<Model>` instead of repeating the lookup. A record owned by
//! another tenant is reported exactly like a missing one.

use axum::{
    Extension,
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::models::{
    booking::Booking, budget_item::BudgetItem, event::Event, lead::Lead, payment::Payment,
    task::Task, timeline_item::TimelineItem, vendor::Vendor,
};
use uuid::Uuid;

use crate::{AppState, auth::RequestContext, error::ApiError};

macro_rules! model_loader {
    ($(#[$meta:meta])* $name:ident, $model:ty, $label:literal) => {
        $(#[$meta])*
        pub async fn $name(
            State(state): State<AppState>,
            Extension(ctx): Extension<RequestContext>,
            Path(id): Path<Uuid>,
            mut request: Request,
            next: Next,
        ) -> Result<Response, ApiError> {
            let model = <$model>::find_by_id(state.pool(), ctx.organization_id, id)
                .await?
                .ok_or_else(|| {
                    tracing::debug!(%id, organization_id = %ctx.organization_id, concat!($label, " not found"));
                    ApiError::NotFound($label)
                })?;
            request.extensions_mut().insert(model);
            Ok(next.run(request).await)
        }
    };
}

model_loader!(load_event_middleware, Event, "event");
model_loader!(load_lead_middleware, Lead, "lead");
model_loader!(load_vendor_middleware, Vendor, "vendor");
model_loader!(load_booking_middleware, Booking, "booking");
model_loader!(load_budget_item_middleware, BudgetItem, "budget item");
model_loader!(load_payment_middleware, Payment, "payment");
model_loader!(load_task_middleware, Task, "task");
model_loader!(load_timeline_item_middleware, TimelineItem, "timeline item");
