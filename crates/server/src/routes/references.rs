//! Checks that ids named in a request body belong to the caller's tenant.
//!
//! A dangling reference is a client error (400) rather than a 404: the
//! addressed resource exists, one of its inputs does not.

use chrono::{NaiveDate, Utc};
use db::models::{booking::Booking, event::Event, lead::Lead, vendor::Vendor};
use serde::Deserialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::ApiError;

/// Body of the `POST .../status` endpoints.
#[derive(Debug, Deserialize)]
pub struct StatusChange<S> {
    pub status: S,
}

pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}

pub(crate) async fn require_event(
    pool: &SqlitePool,
    organization_id: Uuid,
    event_id: Uuid,
) -> Result<Event, ApiError> {
    Event::find_by_id(pool, organization_id, event_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("event {event_id} does not exist")))
}

pub(crate) async fn require_vendor(
    pool: &SqlitePool,
    organization_id: Uuid,
    vendor_id: Uuid,
) -> Result<Vendor, ApiError> {
    Vendor::find_by_id(pool, organization_id, vendor_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("vendor {vendor_id} does not exist")))
}

pub(crate) async fn require_booking(
    pool: &SqlitePool,
    organization_id: Uuid,
    booking_id: Uuid,
) -> Result<Booking, ApiError> {
    Booking::find_by_id(pool, organization_id, booking_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("booking {booking_id} does not exist")))
}

pub(crate) async fn require_lead(
    pool: &SqlitePool,
    organization_id: Uuid,
    lead_id: Uuid,
) -> Result<Lead, ApiError> {
    Lead::find_by_id(pool, organization_id, lead_id)
        .await?
        .ok_or_else(|| ApiError::BadRequest(format!("lead {lead_id} does not exist")))
}
