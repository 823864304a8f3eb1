use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::pagination::Pagination;
use uuid::Uuid;

use crate::validation::{self, MAX_NAME_LEN, MAX_NOTES_LEN, ValidationError};

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "event_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Inquiry,
    Planning,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
}

/// An event being planned for a client.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Event {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub event_type: Option<String>,
    pub status: EventStatus,
    pub event_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub guest_count: Option<i64>,
    /// Client's overall spending ceiling
    pub budget: Option<f64>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
    /// Lead this event was converted from, if any
    pub lead_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CreateEvent {
    pub name: String,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub status: Option<EventStatus>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub guest_count: Option<i64>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub client_email: Option<String>,
    #[serde(default)]
    pub client_phone: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub lead_id: Option<Uuid>,
}

impl CreateEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("name", &self.name, MAX_NAME_LEN)?;
        validation::optional_text("event_type", self.event_type.as_deref(), MAX_NAME_LEN)?;
        validation::optional_text("venue", self.venue.as_deref(), MAX_NAME_LEN)?;
        validation::optional_text("client_name", self.client_name.as_deref(), MAX_NAME_LEN)?;
        validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)?;
        validation::optional_email(self.client_email.as_deref())?;
        validation::optional_count("guest_count", self.guest_count)?;
        validation::optional_amount("budget", self.budget)
    }
}

/// Partial update; `None` keeps the current value. Status changes go through
/// the transition endpoint instead.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateEvent {
    pub name: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub venue: Option<String>,
    pub guest_count: Option<i64>,
    pub budget: Option<f64>,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub notes: Option<String>,
}

impl UpdateEvent {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validation::require_text("name", name, MAX_NAME_LEN)?;
        }
        validation::optional_text("event_type", self.event_type.as_deref(), MAX_NAME_LEN)?;
        validation::optional_text("venue", self.venue.as_deref(), MAX_NAME_LEN)?;
        validation::optional_text("client_name", self.client_name.as_deref(), MAX_NAME_LEN)?;
        validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)?;
        validation::optional_email(self.client_email.as_deref())?;
        validation::optional_count("guest_count", self.guest_count)?;
        validation::optional_amount("budget", self.budget)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct EventFilter {
    pub status: Option<EventStatus>,
    /// Only events on or after this date
    pub from: Option<NaiveDate>,
    /// Only events on or before this date
    pub to: Option<NaiveDate>,
    /// Case-insensitive match on event or client name
    pub search: Option<String>,
}

impl Event {
    pub async fn find_all(
        pool: &SqlitePool,
        organization_id: Uuid,
        filter: &EventFilter,
        page: &Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"SELECT
                id, organization_id, name, event_type, status, event_date, venue,
                guest_count, budget, client_name, client_email, client_phone, notes,
                lead_id, created_at, updated_at
            FROM events
            WHERE organization_id = $1
              AND ($2 IS NULL OR status = $2)
              AND ($3 IS NULL OR event_date >= $3)
              AND ($4 IS NULL OR event_date <= $4)
              AND ($5 IS NULL OR name LIKE '%' || $5 || '%' OR client_name LIKE '%' || $5 || '%')
            ORDER BY event_date IS NULL, event_date ASC, created_at DESC
            LIMIT $6 OFFSET $7"#,
        )
        .bind(organization_id)
        .bind(filter.status)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.search.as_deref())
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
        sqlx::query_as::<_, Event>(
            r#"SELECT
                id, organization_id, name, event_type, status, event_date, venue,
                guest_count, budget, client_name, client_email, client_phone, notes,
                lead_id, created_at, updated_at
            FROM events
            WHERE id = $1 AND organization_id = $2"#,
        )
        .bind(id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await
    }

    pub async fn create<'e, E>(
        executor: E,
        organization_id: Uuid,
        data: &CreateEvent,
        id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Event>(
            r#"INSERT INTO events (
                id, organization_id, name, event_type, status, event_date, venue,
                guest_count, budget, client_name, client_email, client_phone, notes, lead_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING
                id, organization_id, name, event_type, status, event_date, venue,
                guest_count, budget, client_name, client_email, client_phone, notes,
                lead_id, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(data.name.trim())
        .bind(data.event_type.as_deref())
        .bind(data.status.unwrap_or_default())
        .bind(data.event_date)
        .bind(data.venue.as_deref())
        .bind(data.guest_count)
        .bind(data.budget)
        .bind(data.client_name.as_deref())
        .bind(data.client_email.as_deref())
        .bind(data.client_phone.as_deref())
        .bind(data.notes.as_deref())
        .bind(data.lead_id)
        .fetch_one(executor)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        data: &UpdateEvent,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, organization_id, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let name = data.name.as_deref().map(str::trim).unwrap_or(&existing.name);
        let event_type = data.event_type.as_ref().or(existing.event_type.as_ref());
        let event_date = data.event_date.or(existing.event_date);
        let venue = data.venue.as_ref().or(existing.venue.as_ref());
        let guest_count = data.guest_count.or(existing.guest_count);
        let budget = data.budget.or(existing.budget);
        let client_name = data.client_name.as_ref().or(existing.client_name.as_ref());
        let client_email = data.client_email.as_ref().or(existing.client_email.as_ref());
        let client_phone = data.client_phone.as_ref().or(existing.client_phone.as_ref());
        let notes = data.notes.as_ref().or(existing.notes.as_ref());

        sqlx::query_as::<_, Event>(
            r#"UPDATE events
            SET name = $3, event_type = $4, event_date = $5, venue = $6, guest_count = $7,
                budget = $8, client_name = $9, client_email = $10, client_phone = $11,
                notes = $12, updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, name, event_type, status, event_date, venue,
                guest_count, budget, client_name, client_email, client_phone, notes,
                lead_id, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(name)
        .bind(event_type)
        .bind(event_date)
        .bind(venue)
        .bind(guest_count)
        .bind(budget)
        .bind(client_name)
        .bind(client_email)
        .bind(client_phone)
        .bind(notes)
        .fetch_one(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        status: EventStatus,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Event>(
            r#"UPDATE events
            SET status = $3, updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, name, event_type, status, event_date, venue,
                guest_count, budget, client_name, client_email, client_phone, notes,
                lead_id, created_at, updated_at"#,
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
        let result = sqlx::query("DELETE FROM events WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
