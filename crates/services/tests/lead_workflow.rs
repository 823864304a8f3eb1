//! Integration tests for lead scoring persistence and lead conversion.

use chrono::{Duration, NaiveDate};
use db::{
    models::{
        event::{Event, EventStatus},
        lead::{CreateLead, Lead, LeadStatus, UpdateLead},
    },
    test_utils::{create_test_pool, test_org},
};
use services::services::{
    lead_conversion::{ConversionError, ConvertLead, convert_lead},
    lead_scoring::{self, LeadSignals, rescore_all, rescore_lead},
    transitions::TransitionError,
};
use sqlx::SqlitePool;
use uuid::Uuid;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 5, 1).unwrap()
}

async fn create_scored_lead(pool: &SqlitePool, org: Uuid, data: CreateLead) -> Lead {
    let score = lead_scoring::score(&LeadSignals::from(&data), today());
    Lead::create(pool, org, &data, Uuid::new_v4(), i64::from(score))
        .await
        .expect("Failed to create lead")
}

#[tokio::test]
async fn test_rescore_after_update() {
    let (pool, _temp_dir) = create_test_pool().await;
    let org = test_org();

    let lead = create_scored_lead(
        &pool,
        org,
        CreateLead {
            name: "Jordan Lee".to_string(),
            budget: Some(10_000.0),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(lead.score, 5);

    let update = UpdateLead {
        source: Some("referral".to_string()),
        has_engaged: Some(true),
        ..Default::default()
    };
    let updated = Lead::update(&pool, org, lead.id, &update).await.unwrap();
    assert_eq!(updated.score, 5, "update alone leaves the score stale");

    let rescored = rescore_lead(&pool, org, &updated, today()).await.unwrap();
    assert_eq!(rescored.score, 40);
}

#[tokio::test]
async fn test_rescore_all_counts_changes() {
    let (pool, _temp_dir) = create_test_pool().await;
    let org = test_org();

    let far = today() + Duration::days(20);
    let soon = create_scored_lead(
        &pool,
        org,
        CreateLead {
            name: "Soon".to_string(),
            event_date: Some(far),
            ..Default::default()
        },
    )
    .await;
    assert_eq!(soon.score, 20);

    create_scored_lead(
        &pool,
        org,
        CreateLead {
            name: "Dateless".to_string(),
            guest_count: Some(40),
            ..Default::default()
        },
    )
    .await;

    // A month later the first event has passed; the second is unaffected.
    let later = today() + Duration::days(30);
    let changed = rescore_all(&pool, org, later).await.unwrap();
    assert_eq!(changed, 1);

    let soon = Lead::find_by_id(&pool, org, soon.id).await.unwrap().unwrap();
    assert_eq!(soon.score, 0);

    assert_eq!(rescore_all(&pool, test_org(), later).await.unwrap(), 0);
}

#[tokio::test]
async fn test_convert_lead_links_both_ways() {
    let (pool, _temp_dir) = create_test_pool().await;
    let org = test_org();

    let lead = create_scored_lead(
        &pool,
        org,
        CreateLead {
            name: "Avery Chen".to_string(),
            event_type: Some("corporate".to_string()),
            guest_count: Some(220),
            budget: Some(90_000.0),
            status: Some(LeadStatus::ProposalSent),
            ..Default::default()
        },
    )
    .await;

    let result = convert_lead(&pool, org, lead.id, &ConvertLead::default())
        .await
        .expect("conversion should succeed");

    assert_eq!(result.lead.status, LeadStatus::Won);
    assert_eq!(result.lead.converted_event_id, Some(result.event.id));
    assert_eq!(result.event.lead_id, Some(lead.id));
    assert_eq!(result.event.status, EventStatus::Planning);
    assert_eq!(result.event.guest_count, Some(220));

    let stored = Event::find_by_id(&pool, org, result.event.id)
        .await
        .unwrap()
        .expect("event persisted");
    assert_eq!(stored.client_name.as_deref(), Some("Avery Chen"));
}

#[tokio::test]
async fn test_convert_twice_is_rejected() {
    let (pool, _temp_dir) = create_test_pool().await;
    let org = test_org();

    let lead = create_scored_lead(
        &pool,
        org,
        CreateLead {
            name: "Sam Ortiz".to_string(),
            ..Default::default()
        },
    )
    .await;

    let first = convert_lead(&pool, org, lead.id, &ConvertLead::default())
        .await
        .unwrap();
    let err = convert_lead(&pool, org, lead.id, &ConvertLead::default())
        .await
        .expect_err("second conversion must fail");

    assert!(matches!(err, ConversionError::AlreadyConverted(id) if id == first.event.id));
}

#[tokio::test]
async fn test_convert_lost_lead_is_illegal_and_rolls_back() {
    let (pool, _temp_dir) = create_test_pool().await;
    let org = test_org();

    let lead = create_scored_lead(
        &pool,
        org,
        CreateLead {
            name: "Lost Cause".to_string(),
            status: Some(LeadStatus::Lost),
            ..Default::default()
        },
    )
    .await;

    let err = convert_lead(&pool, org, lead.id, &ConvertLead::default())
        .await
        .expect_err("lost leads cannot be converted");
    assert!(matches!(
        err,
        ConversionError::Transition(TransitionError::Illegal { .. })
    ));

    let (events,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(events, 0);
}

#[tokio::test]
async fn test_convert_other_tenants_lead_is_not_found() {
    let (pool, _temp_dir) = create_test_pool().await;
    let org = test_org();

    let lead = create_scored_lead(
        &pool,
        org,
        CreateLead {
            name: "Private".to_string(),
            ..Default::default()
        },
    )
    .await;

    let err = convert_lead(&pool, test_org(), lead.id, &ConvertLead::default())
        .await
        .expect_err("cross-tenant conversion must fail");
    assert!(matches!(err, ConversionError::LeadNotFound));
}
