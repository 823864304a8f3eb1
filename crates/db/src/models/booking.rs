use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::pagination::Pagination;
use uuid::Uuid;

use crate::validation::{self, MAX_NAME_LEN, MAX_NOTES_LEN, ValidationError};

#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Requested,
    Confirmed,
    Declined,
    Cancelled,
    Completed,
}

/// A vendor engagement for an event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Booking {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub event_id: Uuid,
    pub vendor_id: Uuid,
    pub service_description: String,
    pub amount: f64,
    pub deposit_amount: f64,
    pub status: BookingStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CreateBooking {
    pub event_id: Uuid,
    pub vendor_id: Uuid,
    pub service_description: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub deposit_amount: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateBooking {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text(
            "service_description",
            &self.service_description,
            MAX_NAME_LEN,
        )?;
        validation::amount("amount", self.amount)?;
        validation::amount("deposit_amount", self.deposit_amount)?;
        validation::deposit_within_amount(self.amount, self.deposit_amount)?;
        validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateBooking {
    pub service_description: Option<String>,
    pub amount: Option<f64>,
    pub deposit_amount: Option<f64>,
    pub notes: Option<String>,
}

impl UpdateBooking {
    /// Validate against the stored booking so the deposit check sees the merged values.
    pub fn validate(&self, existing: &Booking) -> Result<(), ValidationError> {
        if let Some(description) = &self.service_description {
            validation::require_text("service_description", description, MAX_NAME_LEN)?;
        }
        validation::optional_amount("amount", self.amount)?;
        validation::optional_amount("deposit_amount", self.deposit_amount)?;
        validation::deposit_within_amount(
            self.amount.unwrap_or(existing.amount),
            self.deposit_amount.unwrap_or(existing.deposit_amount),
        )?;
        validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct BookingFilter {
    pub event_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub status: Option<BookingStatus>,
}

/// Per-status totals for one event's bookings.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct BookingStatusTotal {
    pub status: BookingStatus,
    pub count: i64,
    pub amount: f64,
    pub deposit_amount: f64,
}

impl Booking {
    pub async fn find_all(
        pool: &SqlitePool,
        organization_id: Uuid,
        filter: &BookingFilter,
        page: &Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"SELECT
                id, organization_id, event_id, vendor_id, service_description, amount,
                deposit_amount, status, confirmed_at, notes, created_at, updated_at
            FROM bookings
            WHERE organization_id = $1
              AND ($2 IS NULL OR event_id = $2)
              AND ($3 IS NULL OR vendor_id = $3)
              AND ($4 IS NULL OR status = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6"#,
        )
        .bind(organization_id)
        .bind(filter.event_id)
        .bind(filter.vendor_id)
        .bind(filter.status)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id<'e, E>(
        executor: E,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Booking>(
            r#"SELECT
                id, organization_id, event_id, vendor_id, service_description, amount,
                deposit_amount, status, confirmed_at, notes, created_at, updated_at
            FROM bookings
            WHERE id = $1 AND organization_id = $2"#,
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn create(
        pool: &SqlitePool,
        organization_id: Uuid,
        data: &CreateBooking,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"INSERT INTO bookings (
                id, organization_id, event_id, vendor_id, service_description, amount,
                deposit_amount, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                id, organization_id, event_id, vendor_id, service_description, amount,
                deposit_amount, status, confirmed_at, notes, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(data.event_id)
        .bind(data.vendor_id)
        .bind(data.service_description.trim())
        .bind(data.amount)
        .bind(data.deposit_amount)
        .bind(data.notes.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        existing: &Booking,
        data: &UpdateBooking,
    ) -> Result<Self, sqlx::Error> {
        let service_description = data
            .service_description
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.service_description);
        let amount = data.amount.unwrap_or(existing.amount);
        let deposit_amount = data.deposit_amount.unwrap_or(existing.deposit_amount);
        let notes = data.notes.as_ref().or(existing.notes.as_ref());

        sqlx::query_as::<_, Booking>(
            r#"UPDATE bookings
            SET service_description = $3, amount = $4, deposit_amount = $5, notes = $6,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, event_id, vendor_id, service_description, amount,
                deposit_amount, status, confirmed_at, notes, created_at, updated_at"#,
        )
        .bind(existing.id)
        .bind(existing.organization_id)
        .bind(service_description)
        .bind(amount)
        .bind(deposit_amount)
        .bind(notes)
        .fetch_one(pool)
        .await
    }

    /// Set the status; moving to `confirmed` stamps `confirmed_at`.
    pub async fn update_status(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        status: BookingStatus,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"UPDATE bookings
            SET status = $3,
                confirmed_at = CASE
                    WHEN $3 = 'confirmed' THEN datetime('now', 'subsec')
                    ELSE confirmed_at
                END,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, event_id, vendor_id, service_description, amount,
                deposit_amount, status, confirmed_at, notes, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM bookings WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Count and sum an event's bookings grouped by status.
    pub async fn status_totals(
        pool: &SqlitePool,
        organization_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<BookingStatusTotal>, sqlx::Error> {
        sqlx::query_as::<_, BookingStatusTotal>(
            r#"SELECT
                status,
                COUNT(*) AS count,
                CAST(COALESCE(SUM(amount), 0) AS REAL) AS amount,
                CAST(COALESCE(SUM(deposit_amount), 0) AS REAL) AS deposit_amount
            FROM bookings
            WHERE organization_id = $1 AND event_id = $2
            GROUP BY status
            ORDER BY status ASC"#,
        )
        .bind(organization_id)
        .bind(event_id)
        .fetch_all(pool)
        .await
    }
}
