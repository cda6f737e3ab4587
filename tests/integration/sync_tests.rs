//! Sync engine tests against the in-process store

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::{broadcast, watch};

use feedboard::{
    clock::FixedClock,
    config::AppConfig,
    error::AppError,
    models::{CreateSource, LogType},
    repository::{memory::MemoryStore, RemoteStore},
    services::{events::DashboardEvent, Services},
};

const NOW: i64 = 1_704_110_400_000;

struct Harness {
    store: Arc<MemoryStore>,
    services: Services,
    events: broadcast::Receiver<DashboardEvent>,
    shutdown: watch::Sender<bool>,
    engine: tokio::task::JoinHandle<()>,
}

async fn start() -> Harness {
    let config = AppConfig::default();
    let clock = Arc::new(FixedClock::new(NOW));
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let services = Services::new(store.clone(), clock, &config);
    let mut events = services.events.subscribe();

    let (shutdown, shutdown_rx) = watch::channel(false);
    let engine = tokio::spawn(services.sync_engine(&config).run(shutdown_rx));
    wait_for(&mut events, |e| matches!(e, DashboardEvent::FilteredViewChanged { .. })).await;

    Harness {
        store,
        services,
        events,
        shutdown,
        engine,
    }
}

/// Next event accepted by `check`, skipping the others
async fn wait_for(
    events: &mut broadcast::Receiver<DashboardEvent>,
    check: impl Fn(&DashboardEvent) -> bool,
) -> DashboardEvent {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let event = events.recv().await.unwrap();
            if check(&event) {
                return event;
            }
        }
    })
    .await
    .expect("event not received")
}

fn drain(events: &mut broadcast::Receiver<DashboardEvent>) -> Vec<DashboardEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

#[tokio::test]
async fn test_remote_writes_reach_filtered_view() {
    let mut h = start().await;

    h.store
        .set("sources/b", json!({"name": "B", "url": "https://b.example", "enabled": true, "priority": 5}))
        .await
        .unwrap();
    h.store
        .set("sources/a", json!({"name": "A", "url": "https://a.example", "enabled": true}))
        .await
        .unwrap();

    let event = wait_for(&mut h.events, |e| {
        matches!(e, DashboardEvent::FilteredViewChanged { sources, .. } if sources.len() == 2)
    })
    .await;
    if let DashboardEvent::FilteredViewChanged { sources, counts } = event {
        // missing priority sorts after 5
        assert_eq!(sources[0].id, "b");
        assert_eq!(sources[1].id, "a");
        assert_eq!(counts.total, 2);
    }
}

#[tokio::test]
async fn test_add_source_orders_log_after_write() {
    let mut h = start().await;

    let id = h
        .services
        .records
        .add_source(CreateSource {
            name: "Le Monde".into(),
            url: "https://lemonde.example/rss".into(),
            priority: Some(1),
            region: Some("EU".into()),
        })
        .await
        .unwrap();
    assert_eq!(id, "le_monde");

    let stored = h.store.get("sources/le_monde").await.unwrap().unwrap();
    assert_eq!(stored["enabled"], true);
    assert_eq!(stored["lastUpdated"], json!(NOW));

    let logs = h.store.tail("logs", 10).await.unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].value["message"], "Source Le Monde added");
    assert_eq!(logs[0].value["user"], "System");

    // notification feed and activity chart consume separate streams,
    // so their events may interleave either way
    let mut unread_seen = false;
    let mut last_bucket = None;
    while !(unread_seen && last_bucket.is_some()) {
        match wait_for(&mut h.events, |_| true).await {
            DashboardEvent::UnreadCountChanged { count: 1 } => unread_seen = true,
            DashboardEvent::BucketsChanged { buckets, summary } if summary.added == 1 => {
                assert_eq!(buckets.len(), 10);
                last_bucket = buckets.last().map(|b| b.added);
            }
            _ => {}
        }
    }
    assert_eq!(last_bucket, Some(1));
}

#[tokio::test]
async fn test_failed_write_emits_error_toast_only() {
    let mut h = start().await;
    drain(&mut h.events);
    h.store.set_online(false);

    let result = h
        .services
        .records
        .add_source(CreateSource {
            name: "CNN".into(),
            url: "https://cnn.example/rss".into(),
            priority: None,
            region: None,
        })
        .await;
    assert!(matches!(result, Err(AppError::RemoteUnavailable(_))));

    let toasts: Vec<LogType> = drain(&mut h.events)
        .into_iter()
        .filter_map(|e| match e {
            DashboardEvent::Toast { level, .. } => Some(level),
            _ => None,
        })
        .collect();
    assert_eq!(toasts, vec![LogType::Error]);

    h.store.set_online(true);
    assert!(h.store.tail("logs", 10).await.unwrap().is_empty());
    assert!(h.store.get("sources/cnn").await.unwrap().is_none());
}

#[tokio::test]
async fn test_stats_node_is_mirrored() {
    let mut h = start().await;
    h.services.monitor.tick().await;

    let event = wait_for(&mut h.events, |e| {
        matches!(e, DashboardEvent::StatsChanged { stats } if stats.cpu.is_some())
    })
    .await;
    if let DashboardEvent::StatsChanged { stats } = event {
        assert_eq!(stats.last_updated, Some(NOW));
    }
    assert!(h.services.dashboard.stats().cpu.is_some());
}

#[tokio::test]
async fn test_shutdown_stops_engine() {
    let h = start().await;
    h.shutdown.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(2), h.engine)
        .await
        .expect("engine did not stop")
        .unwrap();
}
