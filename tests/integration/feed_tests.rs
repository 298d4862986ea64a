//! Live feed integration tests
//!
//! Exercise filter composition, live snapshots and search refinement end to
//! end against the in-memory document store.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde_json::{json, Value};
use tokio::time::timeout;

use visitor_log::{
    error::ErrorCode,
    live::{FeedState, VisitorFeed},
    models::{DateRange, FilterState, SortKey, SortOrder, VisitorStatus},
    repository::Repository,
    services::visitors::VisitorsService,
    store::{memory::MemoryStore, BackendError, Fields},
};

const COLLECTION: &str = "visitors";

fn fields(value: Value) -> Fields {
    value.as_object().cloned().unwrap_or_default()
}

fn visitor(name: &str, status: &str, check_in: Option<&str>, department: &str) -> Fields {
    let check_out = (status == "Out").then(|| "2024-01-15T18:00:00.000Z");
    fields(json!({
        "name": name,
        "contactNumber": "5550100",
        "address": "1 Main St",
        "purposeOfVisit": "meeting",
        "visitType": "Business",
        "registrationDate": "2024-01-15T08:00:00.000Z",
        "checkInTime": check_in,
        "checkOutTime": check_out,
        "status": status,
        "additionalDetails": {
            "whomToMeet": "Sarah Johnson",
            "department": department
        }
    }))
}

/// Three visitors: two inside, one already gone
fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .insert(COLLECTION, "a", visitor("Ada", "In", Some("2024-01-15T10:00:00.000Z"), "HR"))
        .unwrap();
    store
        .insert(COLLECTION, "b", visitor("Bob", "Out", Some("2024-01-15T11:00:00.000Z"), "IT"))
        .unwrap();
    store
        .insert(COLLECTION, "c", visitor("Cy", "In", Some("2024-01-15T12:00:00.000Z"), "IT"))
        .unwrap();
    store
}

fn service(store: &MemoryStore) -> VisitorsService {
    VisitorsService::new(Repository::new(Arc::new(store.clone()), COLLECTION))
}

async fn next_ids(feed: &mut VisitorFeed) -> Vec<String> {
    let update = timeout(Duration::from_secs(1), feed.next_update())
        .await
        .expect("no update within a second");
    match update {
        Some(FeedState::Ready(visitors)) => visitors.iter().map(|v| v.id.clone()).collect(),
        other => panic!("expected a snapshot, got {:?}", other),
    }
}

async fn next_error(feed: &mut VisitorFeed) -> (ErrorCode, bool) {
    let update = timeout(Duration::from_secs(1), feed.next_update())
        .await
        .expect("no update within a second");
    match update {
        Some(FeedState::Failed(err)) => (err.code(), err.is_retryable()),
        other => panic!("expected an error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_status_filter_with_default_order() {
    let store = seeded_store();
    let filter = FilterState::default().with_status(VisitorStatus::In);
    let mut feed = service(&store).feed(filter);

    assert_eq!(next_ids(&mut feed).await, vec!["c", "a"]);
    assert!(feed
        .visitors()
        .iter()
        .all(|v| v.status == VisitorStatus::In));
}

#[tokio::test]
async fn test_empty_filter_lists_everything_newest_first() {
    let store = seeded_store();
    let mut feed = service(&store).feed(FilterState::default());

    assert_eq!(next_ids(&mut feed).await, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn test_department_and_sort_selection() {
    let store = seeded_store();
    let filter = FilterState::default()
        .with_department("IT")
        .with_sort(SortKey::Name, SortOrder::Asc);
    let mut feed = service(&store).feed(filter);

    assert_eq!(next_ids(&mut feed).await, vec!["b", "c"]);
}

#[tokio::test]
async fn test_date_range_bounds_whole_days() {
    let store = seeded_store();
    store
        .insert(
            COLLECTION,
            "d",
            visitor("Dee", "In", Some("2024-01-16T00:00:00.000Z"), "HR"),
        )
        .unwrap();

    let day = NaiveDate::from_ymd_opt(2024, 1, 15);
    let filter = FilterState {
        date_range: Some(DateRange {
            start: day,
            end: day,
        }),
        ..Default::default()
    };
    let mut feed = service(&store).feed(filter);

    assert_eq!(next_ids(&mut feed).await, vec!["c", "b", "a"]);
}

#[tokio::test]
async fn test_malformed_record_is_dropped() {
    let store = seeded_store();
    store
        .insert(COLLECTION, "d", visitor("Dee", "In", Some("2024-01-15T13:00:00.000Z"), "HR"))
        .unwrap();
    let mut nameless = visitor("", "In", Some("2024-01-15T14:00:00.000Z"), "HR");
    nameless.remove("name");
    store.insert(COLLECTION, "e", nameless).unwrap();

    let mut feed = service(&store).feed(FilterState::default());

    assert_eq!(next_ids(&mut feed).await, vec!["d", "c", "b", "a"]);
}

#[tokio::test]
async fn test_snapshots_replace_the_list() {
    let store = seeded_store();
    let filter = FilterState::default().with_status(VisitorStatus::In);
    let mut feed = service(&store).feed(filter);
    assert_eq!(next_ids(&mut feed).await, vec!["c", "a"]);

    store
        .insert(COLLECTION, "a", visitor("Ada", "Out", Some("2024-01-15T10:00:00.000Z"), "HR"))
        .unwrap();
    assert_eq!(next_ids(&mut feed).await, vec!["c"]);

    store
        .insert(COLLECTION, "d", visitor("Dee", "In", Some("2024-01-15T13:00:00.000Z"), "HR"))
        .unwrap();
    assert_eq!(next_ids(&mut feed).await, vec!["d", "c"]);
}

#[tokio::test]
async fn test_filter_change_keeps_one_subscription() {
    let store = seeded_store();
    let mut feed = service(&store).feed(FilterState::default());
    next_ids(&mut feed).await;
    assert_eq!(store.subscriber_count(), 1);

    let toggled = feed.filter().toggle_status(VisitorStatus::Out);
    feed.set_filter(toggled);
    assert_eq!(store.subscriber_count(), 1);
    assert!(matches!(feed.state(), FeedState::Loading));
    assert_eq!(next_ids(&mut feed).await, vec!["b"]);

    let cleared = feed.filter().cleared();
    feed.set_filter(cleared);
    assert_eq!(next_ids(&mut feed).await, vec!["c", "b", "a"]);

    feed.close();
    assert_eq!(store.subscriber_count(), 0);
    assert!(!feed.is_subscribed());
}

#[tokio::test]
async fn test_search_refines_each_snapshot() {
    let store = seeded_store();
    store
        .insert(
            COLLECTION,
            "d",
            fields(json!({
                "name": "Dee",
                "contactNumber": "5550199",
                "purposeOfVisit": "interview",
                "checkInTime": "2024-01-15T13:00:00.000Z",
                "status": "In",
                "additionalDetails": { "whomToMeet": "Priya Patel", "department": "HR" }
            })),
        )
        .unwrap();

    let mut feed = service(&store).feed(FilterState::default().with_search("PATEL"));
    assert_eq!(next_ids(&mut feed).await, vec!["d"]);

    let mut feed = service(&store).feed(FilterState::default().with_search("555"));
    assert_eq!(next_ids(&mut feed).await, vec!["d", "c", "b", "a"]);

    let mut feed = service(&store).feed(FilterState::default().with_search("nobody"));
    assert!(next_ids(&mut feed).await.is_empty());
}

#[tokio::test]
async fn test_missing_index_fails_until_declared() {
    let store = seeded_store();
    store.enforce_indexes(Vec::new()).unwrap();

    let filter = FilterState::default().with_status(VisitorStatus::In);
    let mut feed = service(&store).feed(filter);

    assert_eq!(next_error(&mut feed).await, (ErrorCode::MissingIndex, true));
    assert!(!feed.is_subscribed());
    assert!(feed.visitors().is_empty());

    store
        .enforce_indexes(vec![vec!["status".to_string(), "checkInTime".to_string()]])
        .unwrap();
    feed.retry();
    assert_eq!(next_ids(&mut feed).await, vec!["c", "a"]);
}

#[tokio::test]
async fn test_permission_error_stops_the_feed() {
    let store = seeded_store();
    let mut feed = service(&store).feed(FilterState::default());
    next_ids(&mut feed).await;

    store
        .push_error(
            COLLECTION,
            BackendError::new("permission-denied", "Missing or insufficient permissions"),
        )
        .unwrap();

    assert_eq!(
        next_error(&mut feed).await,
        (ErrorCode::PermissionDenied, false)
    );
    assert!(!feed.is_subscribed());

    store
        .insert(COLLECTION, "d", visitor("Dee", "In", Some("2024-01-15T13:00:00.000Z"), "HR"))
        .unwrap();
    assert!(feed.next_update().await.is_none());
}

#[tokio::test]
async fn test_legacy_status_spellings_are_filterable() {
    let store = seeded_store();
    store
        .insert(
            COLLECTION,
            "p",
            fields(json!({ "name": "Pia", "status": "pending", "checkInTime": null })),
        )
        .unwrap();
    store
        .insert(
            COLLECTION,
            "q",
            visitor("Quinn", "checked_in", Some("2024-01-15T13:00:00.000Z"), "HR"),
        )
        .unwrap();
    store
        .insert(
            COLLECTION,
            "x",
            fields(json!({ "name": "Xia", "status": "PENDING", "checkInTime": null })),
        )
        .unwrap();

    let mut feed = service(&store).feed(FilterState::default());
    assert_eq!(next_ids(&mut feed).await, vec!["q", "c", "b", "a", "p"]);

    let mut feed = service(&store).feed(FilterState::default().with_status(VisitorStatus::Pending));
    assert_eq!(next_ids(&mut feed).await, vec!["p"]);
    assert_eq!(feed.visitors()[0].status, VisitorStatus::Pending);

    let mut feed = service(&store).feed(FilterState::default().with_status(VisitorStatus::In));
    assert_eq!(next_ids(&mut feed).await, vec!["q", "c", "a"]);
}
