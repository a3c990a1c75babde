// tests/session_test.rs — Integration test: demo session quota through the store task

use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use siteinsight::demo::session::{SessionLimits, SessionTracker};
use siteinsight::infra::config::QuotaConfig;
use siteinsight::store::{self, spawn_store_server, StoreHandle};

fn tracker() -> (SessionTracker, StoreHandle) {
    let (handle, _task) = spawn_store_server(store::in_memory().unwrap());
    (
        SessionTracker::new(handle.clone(), &QuotaConfig::default()),
        handle,
    )
}

/// A handle whose store task is already gone.
fn dead_tracker() -> SessionTracker {
    let (tx, rx) = mpsc::channel(1);
    drop(rx);
    SessionTracker::new(StoreHandle::new(tx), &QuotaConfig::default())
}

#[tokio::test]
async fn test_fresh_session_has_full_quota() {
    let (tracker, _) = tracker();
    let id = tracker.get_or_create_session_id(None).await;
    assert!(id.starts_with("demo_"));

    let limits = tracker.check_session_limits(&id).await;
    assert_eq!(
        limits,
        SessionLimits {
            can_proceed: true,
            remaining_analyses: 10,
        }
    );
}

#[tokio::test]
async fn test_existing_id_is_reused() {
    let (tracker, handle) = tracker();
    let id = tracker.get_or_create_session_id(Some("demo_1_abcdefghi")).await;
    assert_eq!(id, "demo_1_abcdefghi");
    assert!(handle.get_session(id).await.unwrap().is_some());

    let minted = tracker.get_or_create_session_id(Some("not valid!")).await;
    assert_ne!(minted, "not valid!");
}

#[tokio::test]
async fn test_ten_analyses_exhaust_quota() {
    let (tracker, _) = tracker();
    let id = tracker.get_or_create_session_id(None).await;

    for i in 0..9 {
        tracker
            .record_analysis(&id, &format!("https://site{i}.example.com"))
            .await
            .unwrap();
    }
    let limits = tracker.check_session_limits(&id).await;
    assert!(limits.can_proceed);
    assert_eq!(limits.remaining_analyses, 1);

    tracker.record_analysis(&id, "https://last.example.com").await.unwrap();
    let limits = tracker.check_session_limits(&id).await;
    assert!(!limits.can_proceed);
    assert_eq!(limits.remaining_analyses, 0);
}

#[tokio::test]
async fn test_analyses_outside_window_do_not_count() {
    let (tracker, handle) = tracker();
    let old = Utc::now() - Duration::hours(25);
    for i in 0..10 {
        handle
            .record_analysis_at(format!("a-{i}"), "s".into(), "https://a.com".into(), old)
            .await
            .unwrap();
    }
    let limits = tracker.check_session_limits("s").await;
    assert!(limits.can_proceed);
    assert_eq!(limits.remaining_analyses, 10);
}

#[tokio::test]
async fn test_stats_report_window_remaining() {
    let (tracker, handle) = tracker();
    let first = Utc::now() - Duration::hours(2);
    handle
        .record_analysis_at("a-1".into(), "s".into(), "https://a.com".into(), first)
        .await
        .unwrap();
    tracker.record_analysis("s", "https://a.com").await.unwrap();

    let stats = tracker.get_demo_session_stats("s").await;
    assert_eq!(stats.total_analyses, 2);
    assert_eq!(
        stats.created_at.map(|t| t.timestamp_millis()),
        Some(first.timestamp_millis())
    );
    // 22h left, allow a little slack for test runtime
    let expected = Duration::hours(22).num_seconds();
    assert!((stats.time_remaining_secs - expected).abs() <= 5);
}

#[tokio::test]
async fn test_stats_for_unused_session() {
    let (tracker, _) = tracker();
    let stats = tracker.get_demo_session_stats("nobody").await;
    assert_eq!(stats.total_analyses, 0);
    assert_eq!(stats.time_remaining_secs, Duration::hours(24).num_seconds());
    assert!(stats.created_at.is_none());
}

#[tokio::test]
async fn test_reads_fail_open_when_store_is_down() {
    let tracker = dead_tracker();

    let limits = tracker.check_session_limits("s").await;
    assert!(limits.can_proceed);
    assert_eq!(limits.remaining_analyses, 10);

    let stats = tracker.get_demo_session_stats("s").await;
    assert_eq!(stats.total_analyses, 0);
    assert!(stats.created_at.is_none());

    // minting still hands out an id
    let id = tracker.get_or_create_session_id(None).await;
    assert!(id.starts_with("demo_"));
}

#[tokio::test]
async fn test_writes_propagate_when_store_is_down() {
    let tracker = dead_tracker();
    assert!(tracker.record_analysis("s", "https://a.com").await.is_err());
}

#[tokio::test]
async fn test_custom_quota() {
    let (handle, _task) = spawn_store_server(store::in_memory().unwrap());
    let tracker = SessionTracker::new(
        handle,
        &QuotaConfig {
            max_analyses_per_session: 2,
            session_duration_hours: 1,
        },
    );
    tracker.record_analysis("s", "https://a.com").await.unwrap();
    tracker.record_analysis("s", "https://a.com").await.unwrap();
    let limits = tracker.check_session_limits("s").await;
    assert!(!limits.can_proceed);
    assert_eq!(tracker.window(), Duration::hours(1));
}

#[tokio::test]
async fn test_concurrent_records_all_land() {
    let (tracker, handle) = tracker();
    let writes = (0..8).map(|i| {
        handle.record_analysis(format!("a-{i}"), "busy".into(), "https://a.com".into())
    });
    let results = futures::future::join_all(writes).await;
    assert!(results.iter().all(|r| r.is_ok()));

    let limits = tracker.check_session_limits("busy").await;
    assert_eq!(limits.remaining_analyses, 2);
    assert_eq!(handle.get_session("busy".into()).await.unwrap().unwrap().analysis_count, 8);
}
