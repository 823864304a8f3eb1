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
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
    Cancelled,
}

#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "task_priority", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// A to-do item, optionally attached to an event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Task {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub event_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CreateTask {
    #[serde(default)]
    pub event_id: Option<Uuid>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee: Option<String>,
}

impl CreateTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("title", &self.title, MAX_NAME_LEN)?;
        validation::optional_text("description", self.description.as_deref(), MAX_NOTES_LEN)?;
        validation::optional_text("assignee", self.assignee.as_deref(), MAX_NAME_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateTask {
    pub event_id: Option<Uuid>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<NaiveDate>,
    pub assignee: Option<String>,
}

impl UpdateTask {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(title) = &self.title {
            validation::require_text("title", title, MAX_NAME_LEN)?;
        }
        validation::optional_text("description", self.description.as_deref(), MAX_NOTES_LEN)?;
        validation::optional_text("assignee", self.assignee.as_deref(), MAX_NAME_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct TaskFilter {
    pub event_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assignee: Option<String>,
    /// Only tasks due on or before this date
    pub due_before: Option<NaiveDate>,
}

/// Task counts for one event, as of a given day.
#[derive(Debug, Clone, Default, FromRow, Serialize, TS)]
pub struct TaskStatusCounts {
    pub total: i64,
    pub todo: i64,
    pub in_progress: i64,
    pub done: i64,
    pub cancelled: i64,
    /// Open tasks whose due date has passed
    pub overdue: i64,
}

impl Task {
    pub async fn find_all(
        pool: &SqlitePool,
        organization_id: Uuid,
        filter: &TaskFilter,
        page: &Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"SELECT
                id, organization_id, event_id, title, description, status, priority,
                due_date, assignee, completed_at, created_at, updated_at
            FROM tasks
            WHERE organization_id = $1
              AND ($2 IS NULL OR event_id = $2)
              AND ($3 IS NULL OR status = $3)
              AND ($4 IS NULL OR priority = $4)
              AND ($5 IS NULL OR assignee = $5)
              AND ($6 IS NULL OR (due_date IS NOT NULL AND due_date <= $6))
            ORDER BY due_date IS NULL, due_date ASC,
                CASE priority
                    WHEN 'urgent' THEN 0
                    WHEN 'high' THEN 1
                    WHEN 'medium' THEN 2
                    ELSE 3
                END,
                created_at ASC
            LIMIT $7 OFFSET $8"#,
        )
        .bind(organization_id)
        .bind(filter.event_id)
        .bind(filter.status)
        .bind(filter.priority)
        .bind(filter.assignee.as_deref())
        .bind(filter.due_before)
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
        sqlx::query_as::<_, Task>(
            r#"SELECT
                id, organization_id, event_id, title, description, status, priority,
                due_date, assignee, completed_at, created_at, updated_at
            FROM tasks
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
        data: &CreateTask,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"INSERT INTO tasks (
                id, organization_id, event_id, title, description, priority, due_date, assignee
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING
                id, organization_id, event_id, title, description, status, priority,
                due_date, assignee, completed_at, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(data.event_id)
        .bind(data.title.trim())
        .bind(data.description.as_deref())
        .bind(data.priority)
        .bind(data.due_date)
        .bind(data.assignee.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, organization_id, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let event_id = data.event_id.or(existing.event_id);
        let title = data
            .title
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.title);
        let description = data.description.as_ref().or(existing.description.as_ref());
        let priority = data.priority.unwrap_or(existing.priority);
        let due_date = data.due_date.or(existing.due_date);
        let assignee = data.assignee.as_ref().or(existing.assignee.as_ref());

        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
            SET event_id = $3, title = $4, description = $5, priority = $6, due_date = $7,
                assignee = $8, updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, event_id, title, description, status, priority,
                due_date, assignee, completed_at, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(event_id)
        .bind(title)
        .bind(description)
        .bind(priority)
        .bind(due_date)
        .bind(assignee)
        .fetch_one(pool)
        .await
    }

    /// Set the status; `done` stamps `completed_at`, any other status clears it.
    pub async fn update_status(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"UPDATE tasks
            SET status = $3,
                completed_at = CASE
                    WHEN $3 = 'done' THEN datetime('now', 'subsec')
                    ELSE NULL
                END,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, event_id, title, description, status, priority,
                due_date, assignee, completed_at, created_at, updated_at"#,
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
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn status_counts(
        pool: &SqlitePool,
        organization_id: Uuid,
        event_id: Uuid,
        today: NaiveDate,
    ) -> Result<TaskStatusCounts, sqlx::Error> {
        sqlx::query_as::<_, TaskStatusCounts>(
            r#"SELECT
                COUNT(*) AS total,
                COALESCE(SUM(CASE WHEN status = 'todo' THEN 1 ELSE 0 END), 0) AS todo,
                COALESCE(SUM(CASE WHEN status = 'in_progress' THEN 1 ELSE 0 END), 0) AS in_progress,
                COALESCE(SUM(CASE WHEN status = 'done' THEN 1 ELSE 0 END), 0) AS done,
                COALESCE(SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END), 0) AS cancelled,
                COALESCE(SUM(CASE
                    WHEN status IN ('todo', 'in_progress')
                        AND due_date IS NOT NULL
                        AND due_date < $3
                    THEN 1 ELSE 0
                END), 0) AS overdue
            FROM tasks
            WHERE organization_id = $1 AND event_id = $2"#,
        )
        .bind(organization_id)
        .bind(event_id)
        .bind(today)
        .fetch_one(pool)
        .await
    }
}
