//! Typed change notifications raised by the dashboard components.
//!
//! Each component publishes on the shared [`EventBus`]; rendering glue,
//! counters and tests subscribe and receive every event in publish order.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::models::{
    ActivityBucket, ActivitySummary, CountInfo, DashboardStats, LogEntry, LogType, Notification,
    PerformanceSample, SourceRecord, UserIdentity,
};

/// Events emitted whenever a cached collection or a derived view changes
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// Record store replaced its source cache
    SourcesChanged { sources: Vec<SourceRecord> },
    /// Record store replaced its log window
    LogsChanged { logs: Vec<LogEntry> },
    /// Filter pipeline recomputed the visible subset
    FilteredViewChanged {
        sources: Vec<SourceRecord>,
        counts: CountInfo,
    },
    /// Activity buckets recomputed
    BucketsChanged {
        buckets: Vec<ActivityBucket>,
        summary: ActivitySummary,
    },
    UnreadCountChanged { count: usize },
    NotificationListChanged { notifications: Vec<Notification> },
    StatsChanged { stats: DashboardStats },
    TelemetrySampled { sample: PerformanceSample },
    AuthStateChanged { user: Option<UserIdentity> },
    /// Transient message for the user
    Toast { level: LogType, message: String },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashboardEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Deliver to current subscribers; nobody listening is not an error
    pub fn publish(&self, event: DashboardEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }

    pub fn toast(&self, level: LogType, message: impl Into<String>) {
        self.publish(DashboardEvent::Toast {
            level,
            message: message.into(),
        });
    }
}
