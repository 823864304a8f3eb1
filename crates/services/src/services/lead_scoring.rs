//! Lead scoring heuristic.
//!
//! A lead's score is the sum of five independently bucketed signals (budget,
//! time until the event, guest count, acquisition source and engagement),
//! clamped to `0..=100`. Missing signals contribute nothing, so the function is
//! total: every input produces a score and nothing here can fail.
//!
//! "Today" is always passed in, which keeps [`score`] pure and lets callers
//! rescore deterministically.

use chrono::{DateTime, NaiveDate};
use db::{
    RetryConfig,
    models::lead::{CreateLead, Lead},
    with_retry,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

/// Highest score a lead can reach.
pub const MAX_SCORE: u32 = 100;

/// The inputs the heuristic looks at.
///
/// `event_date` is kept as text so ad-hoc payloads can send either a plain
/// date or a full RFC 3339 timestamp.
#[derive(Debug, Clone, Default, Deserialize, Serialize, TS)]
pub struct LeadSignals {
    #[serde(default)]
    pub budget: Option<f64>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub guest_count: Option<i64>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub has_engaged: Option<bool>,
}

impl From<&Lead> for LeadSignals {
    fn from(lead: &Lead) -> Self {
        Self {
            budget: lead.budget,
            event_date: lead.event_date.map(|d| d.to_string()),
            guest_count: lead.guest_count,
            source: lead.source.clone(),
            has_engaged: lead.has_engaged,
        }
    }
}

impl From<&CreateLead> for LeadSignals {
    fn from(data: &CreateLead) -> Self {
        Self {
            budget: data.budget,
            event_date: data.event_date.map(|d| d.to_string()),
            guest_count: data.guest_count,
            source: data.source.clone(),
            has_engaged: data.has_engaged,
        }
    }
}

/// Points awarded per signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, TS)]
pub struct ScoreBreakdown {
    pub budget: u32,
    pub event_date: u32,
    pub guest_count: u32,
    pub source: u32,
    pub engagement: u32,
}

impl ScoreBreakdown {
    pub fn calculate(signals: &LeadSignals, today: NaiveDate) -> Self {
        Self {
            budget: signals.budget.map_or(0, budget_points),
            event_date: signals
                .event_date
                .as_deref()
                .and_then(parse_event_date)
                .map_or(0, |date| date_points(date, today)),
            guest_count: signals.guest_count.map_or(0, guest_points),
            source: signals.source.as_deref().map_or(0, source_points),
            engagement: engagement_points(signals.has_engaged),
        }
    }

    /// Sum of all components, capped at [`MAX_SCORE`].
    pub fn total(&self) -> u32 {
        let raw = self.budget + self.event_date + self.guest_count + self.source + self.engagement;
        raw.min(MAX_SCORE)
    }
}

/// Score a lead's signals as of `today`.
pub fn score(signals: &LeadSignals, today: NaiveDate) -> u32 {
    ScoreBreakdown::calculate(signals, today).total()
}

fn budget_points(budget: f64) -> u32 {
    // NaN and non-positive budgets carry no signal
    if budget.is_nan() || budget <= 0.0 {
        return 0;
    }
    match budget {
        b if b >= 500_000.0 => 30,
        b if b >= 300_000.0 => 25,
        b if b >= 150_000.0 => 20,
        b if b >= 75_000.0 => 15,
        b if b >= 30_000.0 => 10,
        _ => 5,
    }
}

fn date_points(event_date: NaiveDate, today: NaiveDate) -> u32 {
    let days = (event_date - today).num_days();
    match days {
        d if d < 0 => 0,
        d if d <= 30 => 20,
        d if d <= 60 => 18,
        d if d <= 90 => 15,
        d if d <= 180 => 10,
        d if d <= 365 => 5,
        _ => 2,
    }
}

fn guest_points(guests: i64) -> u32 {
    match guests {
        g if g <= 0 => 0,
        g if g >= 500 => 15,
        g if g >= 300 => 12,
        g if g >= 150 => 10,
        g if g >= 75 => 8,
        g if g >= 30 => 5,
        _ => 2,
    }
}

fn source_points(source: &str) -> u32 {
    let normalized = source.trim().to_lowercase().replace([' ', '-'], "_");
    match normalized.as_str() {
        "" => 0,
        "referral" | "repeat_client" => 15,
        "venue_partner" => 12,
        "website" | "google" | "the_knot" | "wedding_wire" => 10,
        "instagram" | "facebook" | "social_media" => 8,
        _ => 5,
    }
}

fn engagement_points(has_engaged: Option<bool>) -> u32 {
    match has_engaged {
        Some(true) => 20,
        Some(false) => 10,
        None => 0,
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp.
fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Hot/warm/cold banding used by list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum LeadCategory {
    Hot,
    Warm,
    Cold,
}

impl LeadCategory {
    pub fn from_score(score: u32) -> Self {
        match score {
            s if s >= 70 => Self::Hot,
            s if s >= 40 => Self::Warm,
            _ => Self::Cold,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Hot => "Hot",
            Self::Warm => "Warm",
            Self::Cold => "Cold",
        }
    }

    /// Hex colour for badges.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Hot => "#ef4444",
            Self::Warm => "#f59e0b",
            Self::Cold => "#3b82f6",
        }
    }
}

/// Full scoring result returned by the ad-hoc scoring endpoint.
#[derive(Debug, Clone, Serialize, TS)]
pub struct LeadScore {
    pub score: u32,
    pub category: LeadCategory,
    pub label: String,
    pub color: String,
    pub breakdown: ScoreBreakdown,
}

impl LeadScore {
    pub fn evaluate(signals: &LeadSignals, today: NaiveDate) -> Self {
        let breakdown = ScoreBreakdown::calculate(signals, today);
        let score = breakdown.total();
        let category = LeadCategory::from_score(score);
        Self {
            score,
            category,
            label: category.label().to_string(),
            color: category.color().to_string(),
            breakdown,
        }
    }
}

/// Recompute and persist one lead's score.
pub async fn rescore_lead(
    pool: &SqlitePool,
    organization_id: Uuid,
    lead: &Lead,
    today: NaiveDate,
) -> Result<Lead, sqlx::Error> {
    let new_score = i64::from(score(&LeadSignals::from(lead), today));
    if new_score == lead.score {
        return Ok(lead.clone());
    }
    debug!(lead_id = %lead.id, old = lead.score, new = new_score, "Lead score changed");
    let retry = RetryConfig::default();
    with_retry(&retry, "lead_set_score", || {
        Lead::set_score(pool, organization_id, lead.id, new_score)
    })
    .await
}

/// Rescore every lead of a tenant. Returns how many scores changed.
pub async fn rescore_all(
    pool: &SqlitePool,
    organization_id: Uuid,
    today: NaiveDate,
) -> Result<usize, sqlx::Error> {
    let leads = Lead::find_all_for_organization(pool, organization_id).await?;
    let mut changed = 0;
    for lead in &leads {
        let updated = rescore_lead(pool, organization_id, lead, today).await?;
        if updated.score != lead.score {
            changed += 1;
        }
    }
    info!(
        organization_id = %organization_id,
        total = leads.len(),
        changed,
        "Rescored leads"
    );
    Ok(changed)
}
