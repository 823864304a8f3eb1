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
#[sqlx(type_name = "lead_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Qualified,
    ProposalSent,
    Won,
    Lost,
}

/// A prospective client inquiry.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Lead {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub guest_count: Option<i64>,
    /// Acquisition channel, e.g. "referral" or "instagram"
    pub source: Option<String>,
    /// `None` until the lead has been contacted
    pub has_engaged: Option<bool>,
    pub status: LeadStatus,
    /// Priority heuristic in 0..=100, recomputed on every write
    pub score: i64,
    pub notes: Option<String>,
    pub converted_event_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CreateLead {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub guest_count: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub has_engaged: Option<bool>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateLead {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("name", &self.name, MAX_NAME_LEN)?;
        validation::optional_email(self.email.as_deref())?;
        validation::optional_text("event_type", self.event_type.as_deref(), MAX_NAME_LEN)?;
        validation::optional_text("source", self.source.as_deref(), MAX_NAME_LEN)?;
        validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)?;
        validation::optional_count("guest_count", self.guest_count)?;
        validation::optional_amount("budget", self.budget)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateLead {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub budget: Option<f64>,
    pub guest_count: Option<i64>,
    pub source: Option<String>,
    pub has_engaged: Option<bool>,
    pub notes: Option<String>,
}

impl UpdateLead {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validation::require_text("name", name, MAX_NAME_LEN)?;
        }
        validation::optional_email(self.email.as_deref())?;
        validation::optional_text("event_type", self.event_type.as_deref(), MAX_NAME_LEN)?;
        validation::optional_text("source", self.source.as_deref(), MAX_NAME_LEN)?;
        validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)?;
        validation::optional_count("guest_count", self.guest_count)?;
        validation::optional_amount("budget", self.budget)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct LeadFilter {
    pub status: Option<LeadStatus>,
    pub source: Option<String>,
    pub min_score: Option<i64>,
    pub search: Option<String>,
}

impl Lead {
    /// Leads ordered hottest first.
    pub async fn find_all(
        pool: &SqlitePool,
        organization_id: Uuid,
        filter: &LeadFilter,
        page: &Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"SELECT
                id, organization_id, name, email, phone, event_type, event_date, budget,
                guest_count, source, has_engaged, status, score, notes, converted_event_id,
                created_at, updated_at
            FROM leads
            WHERE organization_id = $1
              AND ($2 IS NULL OR status = $2)
              AND ($3 IS NULL OR lower(source) = lower($3))
              AND ($4 IS NULL OR score >= $4)
              AND ($5 IS NULL OR name LIKE '%' || $5 || '%' OR email LIKE '%' || $5 || '%')
            ORDER BY score DESC, created_at DESC
            LIMIT $6 OFFSET $7"#,
        )
        .bind(organization_id)
        .bind(filter.status)
        .bind(filter.source.as_deref())
        .bind(filter.min_score)
        .bind(filter.search.as_deref())
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(pool)
        .await
    }

    /// Every lead belonging to a tenant, for bulk rescoring.
    pub async fn find_all_for_organization(
        pool: &SqlitePool,
        organization_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"SELECT
                id, organization_id, name, email, phone, event_type, event_date, budget,
                guest_count, source, has_engaged, status, score, notes, converted_event_id,
                created_at, updated_at
            FROM leads
            WHERE organization_id = $1
            ORDER BY created_at ASC"#,
        )
        .bind(organization_id)
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
        sqlx::query_as::<_, Lead>(
            r#"SELECT
                id, organization_id, name, email, phone, event_type, event_date, budget,
                guest_count, source, has_engaged, status, score, notes, converted_event_id,
                created_at, updated_at
            FROM leads
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
        data: &CreateLead,
        id: Uuid,
        score: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"INSERT INTO leads (
                id, organization_id, name, email, phone, event_type, event_date, budget,
                guest_count, source, has_engaged, status, score, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING
                id, organization_id, name, email, phone, event_type, event_date, budget,
                guest_count, source, has_engaged, status, score, notes, converted_event_id,
                created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(data.name.trim())
        .bind(data.email.as_deref())
        .bind(data.phone.as_deref())
        .bind(data.event_type.as_deref())
        .bind(data.event_date)
        .bind(data.budget)
        .bind(data.guest_count)
        .bind(data.source.as_deref())
        .bind(data.has_engaged)
        .bind(data.status.unwrap_or_default())
        .bind(score)
        .bind(data.notes.as_deref())
        .fetch_one(pool)
        .await
    }

    /// Merge `data` into the stored lead. The score is left untouched; callers
    /// rescore the returned lead.
    pub async fn update(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        data: &UpdateLead,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, organization_id, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let name = data.name.as_deref().map(str::trim).unwrap_or(&existing.name);
        let email = data.email.as_ref().or(existing.email.as_ref());
        let phone = data.phone.as_ref().or(existing.phone.as_ref());
        let event_type = data.event_type.as_ref().or(existing.event_type.as_ref());
        let event_date = data.event_date.or(existing.event_date);
        let budget = data.budget.or(existing.budget);
        let guest_count = data.guest_count.or(existing.guest_count);
        let source = data.source.as_ref().or(existing.source.as_ref());
        let has_engaged = data.has_engaged.or(existing.has_engaged);
        let notes = data.notes.as_ref().or(existing.notes.as_ref());

        sqlx::query_as::<_, Lead>(
            r#"UPDATE leads
            SET name = $3, email = $4, phone = $5, event_type = $6, event_date = $7,
                budget = $8, guest_count = $9, source = $10, has_engaged = $11, notes = $12,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, name, email, phone, event_type, event_date, budget,
                guest_count, source, has_engaged, status, score, notes, converted_event_id,
                created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(event_type)
        .bind(event_date)
        .bind(budget)
        .bind(guest_count)
        .bind(source)
        .bind(has_engaged)
        .bind(notes)
        .fetch_one(pool)
        .await
    }

    pub async fn set_score(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        score: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"UPDATE leads
            SET score = $3, updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, name, email, phone, event_type, event_date, budget,
                guest_count, source, has_engaged, status, score, notes, converted_event_id,
                created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(score)
        .fetch_one(pool)
        .await
    }

    pub async fn update_status(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        status: LeadStatus,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Lead>(
            r#"UPDATE leads
            SET status = $3, updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, name, email, phone, event_type, event_date, budget,
                guest_count, source, has_engaged, status, score, notes, converted_event_id,
                created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    /// Link the lead to the event created from it and mark it won.
    pub async fn mark_converted<'e, E>(
        executor: E,
        organization_id: Uuid,
        id: Uuid,
        event_id: Uuid,
    ) -> Result<Self, sqlx::Error>
    where
        E: Executor<'e, Database = Sqlite>,
    {
        sqlx::query_as::<_, Lead>(
            r#"UPDATE leads
            SET status = 'won', converted_event_id = $3, updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, name, email, phone, event_type, event_date, budget,
                guest_count, source, has_engaged, status, score, notes, converted_event_id,
                created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(event_id)
        .fetch_one(executor)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM leads WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
