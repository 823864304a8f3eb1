//! Turning a won lead into an event.

use db::{
    models::{
        event::{CreateEvent, Event, EventStatus},
        lead::{Lead, LeadStatus},
    },
    validation::{self, MAX_NAME_LEN, ValidationError},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::transitions::{StatusTransition, TransitionError};

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("lead not found")]
    LeadNotFound,
    #[error("lead has already been converted to event {0}")]
    AlreadyConverted(Uuid),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Optional overrides for the event created from a lead.
#[derive(Debug, Clone, Default, Deserialize, TS)]
pub struct ConvertLead {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub venue: Option<String>,
}

impl ConvertLead {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(name) = &self.name {
            validation::require_text("name", name, MAX_NAME_LEN)?;
        }
        validation::optional_text("venue", self.venue.as_deref(), MAX_NAME_LEN)
    }
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct ConversionResult {
    pub lead: Lead,
    pub event: Event,
}

/// Build the new event's payload from the lead's details.
fn event_from_lead(lead: &Lead, overrides: &ConvertLead) -> CreateEvent {
    let name = overrides.name.clone().unwrap_or_else(|| match &lead.event_type {
        Some(event_type) => format!("{} ({})", lead.name, event_type),
        None => lead.name.clone(),
    });
    CreateEvent {
        name,
        event_type: lead.event_type.clone(),
        status: Some(EventStatus::Planning),
        event_date: lead.event_date,
        venue: overrides.venue.clone(),
        guest_count: lead.guest_count,
        budget: lead.budget,
        client_name: Some(lead.name.clone()),
        client_email: lead.email.clone(),
        client_phone: lead.phone.clone(),
        notes: lead.notes.clone(),
        lead_id: Some(lead.id),
    }
}

/// Create an event from the lead, link the two and mark the lead won, all in
/// one transaction.
pub async fn convert_lead(
    pool: &SqlitePool,
    organization_id: Uuid,
    lead_id: Uuid,
    overrides: &ConvertLead,
) -> Result<ConversionResult, ConversionError> {
    overrides.validate()?;
    let mut tx = pool.begin().await?;

    let lead = Lead::find_by_id(&mut *tx, organization_id, lead_id)
        .await?
        .ok_or(ConversionError::LeadNotFound)?;

    if let Some(event_id) = lead.converted_event_id {
        return Err(ConversionError::AlreadyConverted(event_id));
    }
    lead.status.transition_to(LeadStatus::Won)?;

    let data = event_from_lead(&lead, overrides);
    data.validate()?;
    let event = Event::create(&mut *tx, organization_id, &data, Uuid::new_v4()).await?;
    let lead = Lead::mark_converted(&mut *tx, organization_id, lead.id, event.id).await?;

    tx.commit().await?;

    info!(lead_id = %lead.id, event_id = %event.id, "Converted lead to event");
    Ok(ConversionResult { lead, event })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};

    use super::*;

    fn lead() -> Lead {
        let now = Utc::now();
        Lead {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "Priya Patel".to_string(),
            email: Some("priya@example.com".to_string()),
            phone: None,
            event_type: Some("wedding".to_string()),
            event_date: NaiveDate::from_ymd_opt(2026, 9, 12),
            budget: Some(80_000.0),
            guest_count: Some(180),
            source: Some("referral".to_string()),
            has_engaged: Some(true),
            status: LeadStatus::Qualified,
            score: 73,
            notes: None,
            converted_event_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_event_copies_lead_details() {
        let lead = lead();
        let data = event_from_lead(&lead, &ConvertLead::default());
        assert_eq!(data.name, "Priya Patel (wedding)");
        assert_eq!(data.client_name.as_deref(), Some("Priya Patel"));
        assert_eq!(data.client_email, lead.email);
        assert_eq!(data.guest_count, Some(180));
        assert_eq!(data.lead_id, Some(lead.id));
        assert_eq!(data.status, Some(EventStatus::Planning));
    }

    #[test]
    fn test_overrides_win() {
        let overrides = ConvertLead {
            name: Some("Patel Wedding".to_string()),
            venue: Some("Harbour House".to_string()),
        };
        let data = event_from_lead(&lead(), &overrides);
        assert_eq!(data.name, "Patel Wedding");
        assert_eq!(data.venue.as_deref(), Some("Harbour House"));
    }

    #[test]
    fn test_blank_name_override_is_rejected() {
        let overrides = ConvertLead {
            name: Some("   ".to_string()),
            venue: None,
        };
        assert_eq!(
            overrides.validate(),
            Err(ValidationError::Required { field: "name" })
        );

        let long_venue = ConvertLead {
            name: None,
            venue: Some("v".repeat(MAX_NAME_LEN + 1)),
        };
        assert!(matches!(
            long_venue.validate(),
            Err(ValidationError::TooLong { field: "venue", .. })
        ));
        assert_eq!(ConvertLead::default().validate(), Ok(()));
    }
}
