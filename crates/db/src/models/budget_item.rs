use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use utils::pagination::Pagination;
use uuid::Uuid;

use crate::validation::{self, MAX_NAME_LEN, MAX_NOTES_LEN, ValidationError};

/// A planned/actual/paid monetary line tied to an event.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct BudgetItem {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub event_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub category: String,
    pub description: String,
    pub planned_amount: f64,
    pub actual_amount: f64,
    pub paid_amount: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CreateBudgetItem {
    pub event_id: Uuid,
    #[serde(default)]
    pub vendor_id: Option<Uuid>,
    pub category: String,
    pub description: String,
    #[serde(default)]
    pub planned_amount: f64,
    #[serde(default)]
    pub actual_amount: f64,
    #[serde(default)]
    pub paid_amount: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateBudgetItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("category", &self.category, MAX_NAME_LEN)?;
        validation::require_text("description", &self.description, MAX_NAME_LEN)?;
        validation::amount("planned_amount", self.planned_amount)?;
        validation::amount("actual_amount", self.actual_amount)?;
        validation::amount("paid_amount", self.paid_amount)?;
        validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateBudgetItem {
    pub vendor_id: Option<Uuid>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub planned_amount: Option<f64>,
    pub actual_amount: Option<f64>,
    pub paid_amount: Option<f64>,
    pub notes: Option<String>,
}

impl UpdateBudgetItem {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(category) = &self.category {
            validation::require_text("category", category, MAX_NAME_LEN)?;
        }
        if let Some(description) = &self.description {
            validation::require_text("description", description, MAX_NAME_LEN)?;
        }
        validation::optional_amount("planned_amount", self.planned_amount)?;
        validation::optional_amount("actual_amount", self.actual_amount)?;
        validation::optional_amount("paid_amount", self.paid_amount)?;
        validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct BudgetItemFilter {
    pub event_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub category: Option<String>,
}

/// Sums of one budget category within an event.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct BudgetCategoryTotal {
    pub category: String,
    pub item_count: i64,
    pub planned: f64,
    pub actual: f64,
    pub paid: f64,
}

impl BudgetItem {
    pub async fn find_all(
        pool: &SqlitePool,
        organization_id: Uuid,
        filter: &BudgetItemFilter,
        page: &Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, BudgetItem>(
            r#"SELECT
                id, organization_id, event_id, vendor_id, category, description,
                planned_amount, actual_amount, paid_amount, notes, created_at, updated_at
            FROM budget_items
            WHERE organization_id = $1
              AND ($2 IS NULL OR event_id = $2)
              AND ($3 IS NULL OR vendor_id = $3)
              AND ($4 IS NULL OR lower(category) = lower($4))
            ORDER BY category ASC, created_at ASC
            LIMIT $5 OFFSET $6"#,
        )
        .bind(organization_id)
        .bind(filter.event_id)
        .bind(filter.vendor_id)
        .bind(filter.category.as_deref())
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
        sqlx::query_as::<_, BudgetItem>(
            r#"SELECT
                id, organization_id, event_id, vendor_id, category, description,
                planned_amount, actual_amount, paid_amount, notes, created_at, updated_at
            FROM budget_items
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
        data: &CreateBudgetItem,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, BudgetItem>(
            r#"INSERT INTO budget_items (
                id, organization_id, event_id, vendor_id, category, description,
                planned_amount, actual_amount, paid_amount, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING
                id, organization_id, event_id, vendor_id, category, description,
                planned_amount, actual_amount, paid_amount, notes, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(data.event_id)
        .bind(data.vendor_id)
        .bind(data.category.trim())
        .bind(data.description.trim())
        .bind(data.planned_amount)
        .bind(data.actual_amount)
        .bind(data.paid_amount)
        .bind(data.notes.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        data: &UpdateBudgetItem,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, organization_id, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let vendor_id = data.vendor_id.or(existing.vendor_id);
        let category = data
            .category
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.category);
        let description = data
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.description);
        let planned_amount = data.planned_amount.unwrap_or(existing.planned_amount);
        let actual_amount = data.actual_amount.unwrap_or(existing.actual_amount);
        let paid_amount = data.paid_amount.unwrap_or(existing.paid_amount);
        let notes = data.notes.as_ref().or(existing.notes.as_ref());

        sqlx::query_as::<_, BudgetItem>(
            r#"UPDATE budget_items
            SET vendor_id = $3, category = $4, description = $5, planned_amount = $6,
                actual_amount = $7, paid_amount = $8, notes = $9,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, event_id, vendor_id, category, description,
                planned_amount, actual_amount, paid_amount, notes, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(vendor_id)
        .bind(category)
        .bind(description)
        .bind(planned_amount)
        .bind(actual_amount)
        .bind(paid_amount)
        .bind(notes)
        .fetch_one(pool)
        .await
    }

    pub async fn delete(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM budget_items WHERE id = $1 AND organization_id = $2")
                .bind(id)
                .bind(organization_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }

    /// Planned/actual/paid sums per category for one event.
    pub async fn category_totals(
        pool: &SqlitePool,
        organization_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<BudgetCategoryTotal>, sqlx::Error> {
        sqlx::query_as::<_, BudgetCategoryTotal>(
            r#"SELECT
                category,
                COUNT(*) AS item_count,
                CAST(COALESCE(SUM(planned_amount), 0) AS REAL) AS planned,
                CAST(COALESCE(SUM(actual_amount), 0) AS REAL) AS actual,
                CAST(COALESCE(SUM(paid_amount), 0) AS REAL) AS paid
            FROM budget_items
            WHERE organization_id = $1 AND event_id = $2
            GROUP BY category
            ORDER BY category ASC"#,
        )
        .bind(organization_id)
        .bind(event_id)
        .fetch_all(pool)
        .await
    }
}
