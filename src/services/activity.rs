//! Rolling time-bucket aggregation of the log window for the activity chart

use chrono::{DateTime, Timelike, Utc};

use crate::{
    models::{
        log::time_ago, ActivityBucket, ActivityFeedItem, ActivitySummary, LogEntry,
    },
    services::events::{DashboardEvent, EventBus},
};

/// Label of a bucket starting at `start`: its UTC hour, e.g. "9:00"
fn hour_label(start: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(start)
        .map(|dt| format!("{}:00", dt.hour()))
        .unwrap_or_default()
}

/// Partition `logs` into `count` buckets of `width` millis ending at `now`,
/// oldest first. Entries without a timestamp or outside the window, and
/// entries with no category, are not counted.
pub fn compute_buckets(logs: &[LogEntry], now: i64, width: i64, count: usize) -> Vec<ActivityBucket> {
    if width <= 0 || count == 0 {
        return Vec::new();
    }
    let slots = count as i64;

    let mut buckets: Vec<ActivityBucket> = (0..slots)
        .map(|i| {
            let start = now - (slots - i) * width;
            ActivityBucket {
                start,
                label: hour_label(start),
                ..Default::default()
            }
        })
        .collect();

    for entry in logs {
        let Some(timestamp) = entry.timestamp else {
            continue;
        };
        let buckets_ago = (now - timestamp).div_euclid(width);
        if !(0..slots).contains(&buckets_ago) {
            continue;
        }
        if let Some(category) = entry.category() {
            let index = (slots - 1 - buckets_ago) as usize;
            buckets[index].increment(category);
        }
    }

    buckets
}

/// Newest `limit` entries as feed lines, newest first
pub fn recent_activity(logs: &[LogEntry], now: i64, limit: usize, new_badge_ms: i64) -> Vec<ActivityFeedItem> {
    logs.iter()
        .rev()
        .take(limit)
        .map(|entry| {
            let (label, is_new) = match entry.timestamp {
                Some(ts) => (time_ago(ts, now), now - ts < new_badge_ms),
                None => ("Just now".to_string(), false),
            };
            ActivityFeedItem {
                id: entry.id.clone(),
                kind: entry.kind,
                message: entry.message.clone(),
                time_ago: label,
                is_new,
            }
        })
        .collect()
}

pub struct TimeBucketAggregator {
    width: i64,
    count: usize,
    logs: Vec<LogEntry>,
    buckets: Vec<ActivityBucket>,
    summary: ActivitySummary,
    events: EventBus,
}

impl TimeBucketAggregator {
    pub fn new(width: i64, count: usize, events: EventBus) -> Self {
        Self {
            width,
            count,
            logs: Vec::new(),
            buckets: Vec::new(),
            summary: ActivitySummary::default(),
            events,
        }
    }

    /// Rebuild every bucket from `logs` and publish the result
    pub fn recompute(&mut self, logs: Vec<LogEntry>, now: i64) {
        self.logs = logs;
        self.refresh(now);
    }

    /// Rebuild from the last window against a new `now`
    pub fn refresh(&mut self, now: i64) {
        self.buckets = compute_buckets(&self.logs, now, self.width, self.count);
        self.summary = ActivitySummary::from_buckets(&self.buckets);
        tracing::debug!(total = self.summary.total, "Activity buckets recomputed");
        self.events.publish(DashboardEvent::BucketsChanged {
            buckets: self.buckets.clone(),
            summary: self.summary,
        });
    }

    pub fn buckets(&self) -> &[ActivityBucket] {
        &self.buckets
    }

    pub fn summary(&self) -> ActivitySummary {
        self.summary
    }

    pub fn scale_max(&self) -> u32 {
        ActivitySummary::scale_max(&self.buckets)
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityCategory, LogType};

    const HOUR: i64 = 3_600_000;
    // 2024-01-01T12:00:00Z
    const NOW: i64 = 1_704_110_400_000;

    fn entry(id: &str, message: &str, timestamp: Option<i64>) -> LogEntry {
        LogEntry {
            id: id.into(),
            kind: LogType::Info,
            message: message.into(),
            timestamp,
            user: "System".into(),
            category: None,
        }
    }

    #[test]
    fn test_bucket_placement() {
        let logs = vec![
            entry("a", "source added", Some(NOW - 100)),
            entry("b", "enabled", Some(NOW - 3_700_000)),
            // floor(10_000_000 / HOUR) = 2, still the oldest slot
            entry("c", "deleted", Some(NOW - 10_000_000)),
            // three full widths back is past the window
            entry("d", "deleted", Some(NOW - 3 * HOUR)),
        ];
        let buckets = compute_buckets(&logs, NOW, HOUR, 3);
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[2].added, 1);
        assert_eq!(buckets[1].enabled, 1);
        assert_eq!(buckets[0].deleted, 1);
        assert_eq!(ActivitySummary::from_buckets(&buckets).total, 3);
    }

    #[test]
    fn test_bucket_windows_and_labels() {
        let buckets = compute_buckets(&[], NOW, HOUR, 3);
        assert_eq!(buckets[0].start, NOW - 3 * HOUR);
        assert_eq!(buckets[2].start, NOW - HOUR);
        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["9:00", "10:00", "11:00"]);
    }

    #[test]
    fn test_future_and_untimed_entries_dropped() {
        let logs = vec![
            entry("a", "Source X added", Some(NOW + 1)),
            entry("b", "Source Y added", None),
            entry("c", "Source Z updated", Some(NOW - 10)),
        ];
        let summary = ActivitySummary::from_buckets(&compute_buckets(&logs, NOW, HOUR, 10));
        assert_eq!(summary.total, 0);
    }

    #[test]
    fn test_keyword_priority_and_structured_category() {
        // "added" wins over "disabled" in free text
        let mut structured = entry("b", "Source Added disabled", Some(NOW - 5));
        structured.category = Some(ActivityCategory::Deleted);
        let logs = vec![entry("a", "added then disabled", Some(NOW - 5)), structured];
        let buckets = compute_buckets(&logs, NOW, HOUR, 1);
        assert_eq!(buckets[0].added, 1);
        assert_eq!(buckets[0].disabled, 0);
        assert_eq!(buckets[0].deleted, 1);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let events = EventBus::default();
        let mut rx = events.subscribe();
        let mut aggregator = TimeBucketAggregator::new(HOUR, 10, events);
        let logs = vec![
            entry("a", "Source A added", Some(NOW - HOUR * 2)),
            entry("b", "Source A disabled", Some(NOW - 30)),
        ];

        aggregator.recompute(logs.clone(), NOW);
        let first = aggregator.buckets().to_vec();
        aggregator.recompute(logs, NOW);
        assert_eq!(aggregator.buckets(), first.as_slice());
        assert_eq!(aggregator.summary().total, 2);
        assert_eq!(aggregator.scale_max(), 5);

        assert!(matches!(
            rx.try_recv().unwrap(),
            DashboardEvent::BucketsChanged { .. }
        ));
    }

    #[test]
    fn test_refresh_slides_window() {
        let mut aggregator = TimeBucketAggregator::new(HOUR, 2, EventBus::default());
        aggregator.recompute(vec![entry("a", "Source A added", Some(NOW - 10))], NOW);
        assert_eq!(aggregator.summary().added, 1);

        aggregator.refresh(NOW + 2 * HOUR);
        assert_eq!(aggregator.summary().total, 0);
    }

    #[test]
    fn test_recent_activity_feed() {
        let logs = vec![
            entry("old", "Source A added", Some(NOW - 120_000)),
            entry("mid", "Source A updated", Some(NOW - 30_000)),
            entry("new", "Source A disabled", Some(NOW - 2_000)),
        ];
        let feed = recent_activity(&logs, NOW, 2, 10_000);
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].id, "new");
        assert!(feed[0].is_new);
        assert_eq!(feed[0].time_ago, "Just now");
        assert_eq!(feed[1].time_ago, "30 seconds ago");
        assert!(!feed[1].is_new);
    }
}
