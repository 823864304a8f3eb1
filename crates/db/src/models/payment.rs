use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use utils::pagination::Pagination;
use uuid::Uuid;

use crate::validation::{self, MAX_NAME_LEN, ValidationError};

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
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
    Refunded,
    Cancelled,
}

/// Money flowing in from the client or out to a vendor.
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
#[sqlx(type_name = "payment_direction", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentDirection {
    #[default]
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Payment {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub event_id: Uuid,
    pub booking_id: Option<Uuid>,
    pub description: String,
    pub amount: f64,
    pub direction: PaymentDirection,
    pub status: PaymentStatus,
    pub method: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CreatePayment {
    pub event_id: Uuid,
    #[serde(default)]
    pub booking_id: Option<Uuid>,
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub direction: PaymentDirection,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl CreatePayment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("description", &self.description, MAX_NAME_LEN)?;
        validation::amount("amount", self.amount)?;
        validation::optional_text("method", self.method.as_deref(), MAX_NAME_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdatePayment {
    pub booking_id: Option<Uuid>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub direction: Option<PaymentDirection>,
    pub method: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl UpdatePayment {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(description) = &self.description {
            validation::require_text("description", description, MAX_NAME_LEN)?;
        }
        validation::optional_amount("amount", self.amount)?;
        validation::optional_text("method", self.method.as_deref(), MAX_NAME_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct PaymentFilter {
    pub event_id: Option<Uuid>,
    pub booking_id: Option<Uuid>,
    pub status: Option<PaymentStatus>,
    pub direction: Option<PaymentDirection>,
}

/// Count and sum of an event's payments for one direction/status pair.
#[derive(Debug, Clone, FromRow, Serialize, TS)]
pub struct PaymentTotal {
    pub direction: PaymentDirection,
    pub status: PaymentStatus,
    pub count: i64,
    pub amount: f64,
}

impl Payment {
    pub async fn find_all(
        pool: &SqlitePool,
        organization_id: Uuid,
        filter: &PaymentFilter,
        page: &Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"SELECT
                id, organization_id, event_id, booking_id, description, amount, direction,
                status, method, due_date, paid_at, created_at, updated_at
            FROM payments
            WHERE organization_id = $1
              AND ($2 IS NULL OR event_id = $2)
              AND ($3 IS NULL OR booking_id = $3)
              AND ($4 IS NULL OR status = $4)
              AND ($5 IS NULL OR direction = $5)
            ORDER BY due_date IS NULL, due_date ASC, created_at DESC
            LIMIT $6 OFFSET $7"#,
        )
        .bind(organization_id)
        .bind(filter.event_id)
        .bind(filter.booking_id)
        .bind(filter.status)
        .bind(filter.direction)
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
        sqlx::query_as::<_, Payment>(
            r#"SELECT
                id, organization_id, event_id, booking_id, description, amount, direction,
                status, method, due_date, paid_at, created_at, updated_at
            FROM payments
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
        data: &CreatePayment,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"INSERT INTO payments (
                id, organization_id, event_id, booking_id, description, amount, direction,
                method, due_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING
                id, organization_id, event_id, booking_id, description, amount, direction,
                status, method, due_date, paid_at, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(data.event_id)
        .bind(data.booking_id)
        .bind(data.description.trim())
        .bind(data.amount)
        .bind(data.direction)
        .bind(data.method.as_deref())
        .bind(data.due_date)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        data: &UpdatePayment,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, organization_id, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let booking_id = data.booking_id.or(existing.booking_id);
        let description = data
            .description
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.description);
        let amount = data.amount.unwrap_or(existing.amount);
        let direction = data.direction.unwrap_or(existing.direction);
        let method = data.method.as_ref().or(existing.method.as_ref());
        let due_date = data.due_date.or(existing.due_date);

        sqlx::query_as::<_, Payment>(
            r#"UPDATE payments
            SET booking_id = $3, description = $4, amount = $5, direction = $6, method = $7,
                due_date = $8, updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, event_id, booking_id, description, amount, direction,
                status, method, due_date, paid_at, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(booking_id)
        .bind(description)
        .bind(amount)
        .bind(direction)
        .bind(method)
        .bind(due_date)
        .fetch_one(pool)
        .await
    }

    /// Set the status; moving to `paid` stamps `paid_at`, and `paid_at` is
    /// kept through a later refund.
    pub async fn update_status(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        status: PaymentStatus,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Payment>(
            r#"UPDATE payments
            SET status = $3,
                paid_at = CASE
                    WHEN $3 = 'paid' THEN datetime('now', 'subsec')
                    ELSE paid_at
                END,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, event_id, booking_id, description, amount, direction,
                status, method, due_date, paid_at, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    /// Flip every pending payment due before `today` to overdue.
    pub async fn mark_overdue(
        pool: &SqlitePool,
        organization_id: Uuid,
        today: NaiveDate,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE payments
            SET status = 'overdue', updated_at = datetime('now', 'subsec')
            WHERE organization_id = $1
              AND status = 'pending'
              AND due_date IS NOT NULL
              AND due_date < $2"#,
        )
        .bind(organization_id)
        .bind(today)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn totals(
        pool: &SqlitePool,
        organization_id: Uuid,
        event_id: Uuid,
    ) -> Result<Vec<PaymentTotal>, sqlx::Error> {
        sqlx::query_as::<_, PaymentTotal>(
            r#"SELECT
                direction,
                status,
                COUNT(*) AS count,
                CAST(COALESCE(SUM(amount), 0) AS REAL) AS amount
            FROM payments
            WHERE organization_id = $1 AND event_id = $2
            GROUP BY direction, status
            ORDER BY direction ASC, status ASC"#,
        )
        .bind(organization_id)
        .bind(event_id)
        .fetch_all(pool)
        .await
    }
}
