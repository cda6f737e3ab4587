//! Derived-view coordinator.
//!
//! Routes every remote snapshot to the record store first and then to the
//! components derived from it, all within the same call, so the filtered
//! view, activity buckets and notification feed never lag the cache.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{
    clock::Clock,
    config::{ActivityConfig, AppConfig},
    models::{
        ActivityReport, CriteriaUpdate, DashboardStats, FilterCriteria, FilterState,
        FilteredView, LogEntry, LogType, NotificationList,
    },
    repository::{stats::decode_stats, Child, Snapshot},
    services::{
        activity::{recent_activity, TimeBucketAggregator},
        events::{DashboardEvent, EventBus},
        filter::FilterPipeline,
        notifications::{ConfirmationGate, NotificationFeed},
        record_store::{decode_logs, decode_sources, RecordStore},
    },
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct Dashboard {
    records: Arc<RecordStore>,
    filter: Mutex<FilterPipeline>,
    activity: Mutex<TimeBucketAggregator>,
    notifications: Mutex<NotificationFeed>,
    stats: Mutex<DashboardStats>,
    activity_config: ActivityConfig,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl Dashboard {
    pub fn new(
        records: Arc<RecordStore>,
        config: &AppConfig,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self {
            records,
            filter: Mutex::new(FilterPipeline::new(events.clone())),
            activity: Mutex::new(TimeBucketAggregator::new(
                config.activity.bucket_width_ms,
                config.activity.bucket_count,
                events.clone(),
            )),
            notifications: Mutex::new(NotificationFeed::new(
                config.notifications.capacity,
                config.notifications.freshness_ms,
                events.clone(),
            )),
            stats: Mutex::new(DashboardStats::default()),
            activity_config: config.activity.clone(),
            clock,
            events,
        }
    }

    pub fn records(&self) -> &Arc<RecordStore> {
        &self.records
    }

    // Subscription handlers

    pub fn on_sources_snapshot(&self, children: Snapshot) {
        self.records.apply_source_snapshot(decode_sources(children));
        lock(&self.filter).update_sources(self.records.sources());
    }

    pub fn on_log_snapshot(&self, children: Snapshot) {
        self.records.apply_log_snapshot(decode_logs(children));
    }

    /// Wider log window feeding the activity chart
    pub fn on_activity_snapshot(&self, children: Snapshot) {
        let now = self.clock.now_millis();
        lock(&self.activity).recompute(decode_logs(children), now);
    }

    /// Pre-existing entries shown as already read
    pub fn seed_notifications(&self, entries: Vec<LogEntry>) {
        lock(&self.notifications).seed(entries);
    }

    pub fn on_log_added(&self, child: Child) -> bool {
        let entry = match LogEntry::from_child(&child.key, child.value) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %child.key, error = %e, "Skipping malformed log entry");
                return false;
            }
        };
        let now = self.clock.now_millis();
        lock(&self.notifications).on_entry_arrived(entry, now)
    }

    pub fn on_stats_snapshot(&self, children: Snapshot) {
        let stats = decode_stats(children);
        *lock(&self.stats) = stats.clone();
        self.events.publish(DashboardEvent::StatsChanged { stats });
    }

    /// Slide the activity window forward without new data
    pub fn tick_activity(&self) {
        let now = self.clock.now_millis();
        lock(&self.activity).refresh(now);
    }

    // Filters

    pub fn filtered_view(&self) -> FilteredView {
        lock(&self.filter).view().clone()
    }

    pub fn filter_state(&self) -> FilterState {
        let filter = lock(&self.filter);
        FilterState {
            criteria: filter.criteria().clone(),
            region_options: filter.region_options(),
        }
    }

    pub fn set_criteria(&self, update: CriteriaUpdate) -> FilteredView {
        let mut filter = lock(&self.filter);
        filter.set_criteria(update);
        filter.view().clone()
    }

    pub fn reset_filters(&self) -> FilterCriteria {
        let mut filter = lock(&self.filter);
        filter.reset();
        filter.criteria().clone()
    }

    // Activity and logs

    pub fn activity_report(&self) -> ActivityReport {
        let now = self.clock.now_millis();
        let activity = lock(&self.activity);
        ActivityReport {
            buckets: activity.buckets().to_vec(),
            summary: activity.summary(),
            scale_max: activity.scale_max(),
            recent: recent_activity(
                activity.logs(),
                now,
                self.activity_config.feed_size,
                self.activity_config.new_badge_ms,
            ),
        }
    }

    /// Cached log window, newest first
    pub fn logs(&self) -> Vec<LogEntry> {
        let mut logs = self.records.logs();
        logs.reverse();
        logs
    }

    pub fn stats(&self) -> DashboardStats {
        lock(&self.stats).clone()
    }

    // Notifications

    pub fn notifications(&self) -> NotificationList {
        lock(&self.notifications).list()
    }

    pub fn mark_read(&self, id: &str) -> usize {
        let mut feed = lock(&self.notifications);
        feed.mark_read(id);
        feed.unread_count()
    }

    pub fn mark_all_read(&self) {
        lock(&self.notifications).mark_all_read();
        self.events
            .toast(LogType::Info, "All notifications marked as read");
    }

    /// Returns whether the gate allowed the feed to be cleared
    pub fn clear_notifications(&self, gate: impl ConfirmationGate) -> bool {
        let cleared = lock(&self.notifications).clear_all(gate);
        if cleared {
            self.events.toast(LogType::Info, "All notifications cleared");
        }
        cleared
    }
}
