use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Executor, FromRow, Sqlite, SqlitePool};
use ts_rs::TS;
use utils::pagination::Pagination;
use uuid::Uuid;

use crate::validation::{self, MAX_NAME_LEN, MAX_NOTES_LEN, ValidationError};

/// A supplier the planner books for events (venue, catering, florist...).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, TS)]
pub struct Vendor {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub category: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    /// 0.0 to 5.0
    pub rating: Option<f64>,
    pub is_preferred: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct CreateVendor {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub is_preferred: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateVendor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::require_text("name", &self.name, MAX_NAME_LEN)?;
        validation::require_text("category", &self.category, MAX_NAME_LEN)?;
        validation::optional_email(self.email.as_deref())?;
        validation::optional_rating(self.rating)?;
        validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct UpdateVendor {
    pub name: Option<String>,
    pub category: Option<String>,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub is_preferred: Option<bool>,
    pub notes: Option<String>,
}

impl UpdateVendor {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validation::require_text("name", name, MAX_NAME_LEN)?;
        }
        if let Some(category) = &self.category {
            validation::require_text("category", category, MAX_NAME_LEN)?;
        }
        validation::optional_email(self.email.as_deref())?;
        validation::optional_rating(self.rating)?;
        validation::optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)
    }
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct VendorFilter {
    pub category: Option<String>,
    pub preferred: Option<bool>,
    pub search: Option<String>,
}

impl Vendor {
    pub async fn find_all(
        pool: &SqlitePool,
        organization_id: Uuid,
        filter: &VendorFilter,
        page: &Pagination,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Vendor>(
            r#"SELECT
                id, organization_id, name, category, contact_name, email, phone, website,
                rating, is_preferred, notes, created_at, updated_at
            FROM vendors
            WHERE organization_id = $1
              AND ($2 IS NULL OR lower(category) = lower($2))
              AND ($3 IS NULL OR is_preferred = $3)
              AND ($4 IS NULL OR name LIKE '%' || $4 || '%' OR contact_name LIKE '%' || $4 || '%')
            ORDER BY is_preferred DESC, name ASC
            LIMIT $5 OFFSET $6"#,
        )
        .bind(organization_id)
        .bind(filter.category.as_deref())
        .bind(filter.preferred)
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
        sqlx::query_as::<_, Vendor>(
            r#"SELECT
                id, organization_id, name, category, contact_name, email, phone, website,
                rating, is_preferred, notes, created_at, updated_at
            FROM vendors
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
        data: &CreateVendor,
        id: Uuid,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Vendor>(
            r#"INSERT INTO vendors (
                id, organization_id, name, category, contact_name, email, phone, website,
                rating, is_preferred, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING
                id, organization_id, name, category, contact_name, email, phone, website,
                rating, is_preferred, notes, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(data.name.trim())
        .bind(data.category.trim())
        .bind(data.contact_name.as_deref())
        .bind(data.email.as_deref())
        .bind(data.phone.as_deref())
        .bind(data.website.as_deref())
        .bind(data.rating)
        .bind(data.is_preferred)
        .bind(data.notes.as_deref())
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
        data: &UpdateVendor,
    ) -> Result<Self, sqlx::Error> {
        let existing = Self::find_by_id(pool, organization_id, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)?;

        let name = data.name.as_deref().map(str::trim).unwrap_or(&existing.name);
        let category = data
            .category
            .as_deref()
            .map(str::trim)
            .unwrap_or(&existing.category);
        let contact_name = data.contact_name.as_ref().or(existing.contact_name.as_ref());
        let email = data.email.as_ref().or(existing.email.as_ref());
        let phone = data.phone.as_ref().or(existing.phone.as_ref());
        let website = data.website.as_ref().or(existing.website.as_ref());
        let rating = data.rating.or(existing.rating);
        let is_preferred = data.is_preferred.unwrap_or(existing.is_preferred);
        let notes = data.notes.as_ref().or(existing.notes.as_ref());

        sqlx::query_as::<_, Vendor>(
            r#"UPDATE vendors
            SET name = $3, category = $4, contact_name = $5, email = $6, phone = $7,
                website = $8, rating = $9, is_preferred = $10, notes = $11,
                updated_at = datetime('now', 'subsec')
            WHERE id = $1 AND organization_id = $2
            RETURNING
                id, organization_id, name, category, contact_name, email, phone, website,
                rating, is_preferred, notes, created_at, updated_at"#,
        )
        .bind(id)
        .bind(organization_id)
        .bind(name)
        .bind(category)
        .bind(contact_name)
        .bind(email)
        .bind(phone)
        .bind(website)
        .bind(rating)
        .bind(is_preferred)
        .bind(notes)
        .fetch_one(pool)
        .await
    }

    /// Fails with a foreign key violation while bookings still reference the vendor.
    pub async fn delete(
        pool: &SqlitePool,
        organization_id: Uuid,
        id: Uuid,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vendors WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
