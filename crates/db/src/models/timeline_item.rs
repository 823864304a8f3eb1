use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use utils::pagination::Pagination;
use uuid::Uuid;

use crate::validation::{self, MAX_NAME_LEN, MAX_NOTES_LEN, ValidationError};

/// One entry in an event's run-of-show.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct TimelineItem {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub event_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    /// Tie-breaker for items starting at the same time
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, TS)]
pub struct CreateTimelineItem {
    pub event_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub starts_at: DateTime<Utc>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

impl CreateTimelineItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("title", &self.title, MAX_NAME_LEN)?;
        validation::optional_text("description", self.description.as_deref(), MAX_NOTES_LEN)?;
        validation::optional_text("location", self.location.as_deref(), MAX_NAME_LEN)?;
        validation::time_range(self.starts_at, self.ends_at)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateTimelineItem {
    pub title: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub sort_order: Option<i64>,
}

impl UpdateTimelineItem {
    /// Checks the time range against the merged values.
    pub fn validate(&self, existing: &TimelineItem) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validation::require_text("title", title, MAX_NAME_LEN)?;
        }
        validation::optional_text("description", self.description.as_deref(), MAX_NOTES_LEN)?;
        validation::optional_text("location", self.location.as_deref(), MAX_NAME_LEN)?;
        validation::time_range(
            self.starts_at.unwrap_or(existing.starts_at),
            self.ends_at.or(existing.ends_at),
        )
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct TimelineItemFilter {
    pub event_id: Option<Uuid>,
}

impl TimelineItem {
    pub async fn find_all(
        pool: &SqlitePool,
        organization_id: Uuid,
        filter: &TimelineItemFilter,
        page: &Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, TimelineItem>(
            r#"SELECT
                id, organization_id, event_id, title, description, starts_at, ends_at,
                location, sort_order, created_at, updated_at
            FROM timeline_items
            WHERE organization_id = $1
              AND ($2 IS NULL OR event_id = $2)
            ORDER BY starts_at ASC, sort_order ASC
            LIMIT $3 OFFSET $4"#,
        )
        .bind(organization_id)
        .bind(filter.event_id)
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
        sqlx::query_as::<_, TimelineItem>(
            r#"SELECT
                id, organization_id, event_id, title, description, starts_at, ends_at,
                location, sort_order, created_at, updated_at
            FROM timeline_items
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
        data: &CreateTimelineItem,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, TimelineItem>(
            r#"INSERT INTO timeline_items (
                id, organization_id, event_id, title, description, starts_at, ends_at,
                location, sort_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id, organization_id, event_id, title, description, starts_at, ends_at,
                location, sort_order, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(data.event_id)
        .bind(data.title.trim())
        .bind(data.description.as_deref())
        .bind(data.starts_at)
        .bind(data.ends_at)
        .bind(data.location.as_deref())
        .bind(data.sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        existing: &TimelineItem,
        data: &UpdateTimelineItem,
    ) -> Result<Self, sqlx::Error> {
        let title = data
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.title);
        let description = data.description.as_ref().or(existing.description.as_ref());
        let starts_at = data.starts_at.unwrap_or(existing.starts_at);
        let ends_at = data.ends_at.or(existing.ends_at);
        let location = data.location.as_ref().or(existing.location.as_ref());
        let sort_order = data.sort_order.unwrap_or(existing.sort_order);

        sqlx::query_as::<_, TimelineItem>(
            r#"UPDATE timeline_items
            SET title = $3, description = $4, starts_at = $5, ends_at = $6, location = $7,
                sort_order = $8, updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, event_id, title, description, starts_at, ends_at,
                location, sort_order, created_at, updated_at"#,
        )
        .bind(existing.id)
        .bind(existing.organization_id)
        .bind(title)
        .bind(description)
        .bind(starts_at)
        .bind(ends_at)
        .bind(location)
        .bind(sort_order)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM timeline_items WHERE id = $1 AND organization_id = $2")
                .bind(id)
                .bind(organization_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
