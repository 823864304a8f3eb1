//! Integration tests for organization scoping.
//!
//! Rows belonging to another organization must be invisible to every read,
//! update and delete path.

use std::str::FromStr;

use db::models::{
    event::{CreateEvent, Event, EventFilter, UpdateEvent},
    lead::{CreateLead, Lead, LeadFilter},
    vendor::{CreateVendor, Vendor, VendorFilter},
};
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use tempfile::TempDir;
use utils::pagination::Pagination;
use uuid::Uuid;

async fn setup_test_pool() -> (SqlitePool, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("test.db");

    let options =
        SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.to_string_lossy()))
            .expect("Invalid database URL")
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePool::connect_with(options)
        .await
        .expect("Failed to create pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    (pool, temp_dir)
}

async fn create_event(pool: &SqlitePool, org: Uuid, name: &str) -> Event {
    let data = CreateEvent {
        name: name.to_string(),
        ..Default::default()
    };
    Event::create(pool, org, &data, Uuid::new_v4())
        .await
        .expect("Failed to create event")
}

#[tokio::test]
async fn test_find_by_id_hides_other_tenants() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();

    let event = create_event(&pool, org_a, "Smith Wedding").await;

    assert!(
        Event::find_by_id(&pool, org_a, event.id)
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        Event::find_by_id(&pool, org_b, event.id)
            .await
            .unwrap()
            .is_none(),
        "Another organization must not see the event"
    );
}

#[tokio::test]
async fn test_find_all_only_returns_own_rows() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();

    create_event(&pool, org_a, "Gala").await;
    create_event(&pool, org_a, "Offsite").await;
    create_event(&pool, org_b, "Birthday").await;

    let page = Pagination::default();
    let a = Event::find_all(&pool, org_a, &EventFilter::default(), &page)
        .await
        .unwrap();
    let b = Event::find_all(&pool, org_b, &EventFilter::default(), &page)
        .await
        .unwrap();

    assert_eq!(a.len(), 2);
    assert_eq!(b.len(), 1);
    assert!(a.iter().all(|e| e.organization_id == org_a));
}

#[tokio::test]
async fn test_update_and_delete_across_tenants_fail() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let org_a = Uuid::new_v4();
    let org_b = Uuid::new_v4();

    let event = create_event(&pool, org_a, "Launch Party").await;

    let update = UpdateEvent {
        name: Some("Hijacked".to_string()),
        ..Default::default()
    };
    let err = Event::update(&pool, org_b, event.id, &update)
        .await
        .expect_err("cross-tenant update must fail");
    assert!(matches!(err, sqlx::Error::RowNotFound));

    let deleted = Event::delete(&pool, org_b, event.id).await.unwrap();
    assert_eq!(deleted, 0);

    let still_there = Event::find_by_id(&pool, org_a, event.id)
        .await
        .unwrap()
        .expect("event should survive");
    assert_eq!(still_there.name, "Launch Party");
}

#[tokio::test]
async fn test_lead_list_is_ordered_by_score() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let org = Uuid::new_v4();

    for (name, score) in [("Cold", 12), ("Hot", 88), ("Warm", 51)] {
        let data = CreateLead {
            name: name.to_string(),
            ..Default::default()
        };
        Lead::create(&pool, org, &data, Uuid::new_v4(), score)
            .await
            .unwrap();
    }

    let leads = Lead::find_all(&pool, org, &LeadFilter::default(), &Pagination::default())
        .await
        .unwrap();
    let names: Vec<_> = leads.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["Hot", "Warm", "Cold"]);

    let filter = LeadFilter {
        min_score: Some(50),
        ..Default::default()
    };
    let hot_and_warm = Lead::find_all(&pool, org, &filter, &Pagination::default())
        .await
        .unwrap();
    assert_eq!(hot_and_warm.len(), 2);
}

#[tokio::test]
async fn test_pagination_limits_and_offsets() {
    let (pool, _temp_dir) = setup_test_pool().await;
    let org = Uuid::new_v4();

    for i in 0..5 {
        let data = CreateVendor {
            name: format!("Vendor {i}"),
            category: "catering".to_string(),
            ..Default::default()
        };
        Vendor::create(&pool, org, &data, Uuid::new_v4()).await.unwrap();
    }

    let first = Vendor::find_all(
        &pool,
        org,
        &VendorFilter::default(),
        &Pagination::new(2, 0),
    )
    .await
    .unwrap();
    let last = Vendor::find_all(
        &pool,
        org,
        &VendorFilter::default(),
        &Pagination::new(2, 4),
    )
    .await
    .unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(last.len(), 1);
    assert_eq!(last[0].name, "Vendor 4");
}
