//! Activity chart models

use serde::Serialize;
use utoipa::ToSchema;

use super::log::{ActivityCategory, LogType};

/// Smallest vertical scale of the activity chart
pub const MIN_CHART_SCALE: u32 = 5;

/// Counters for one fixed-width time slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ActivityBucket {
    /// Start of the slot, epoch millis (inclusive)
    pub start: i64,
    /// Start hour of the slot, e.g. "14:00"
    pub label: String,
    pub added: u32,
    pub enabled: u32,
    pub disabled: u32,
    pub deleted: u32,
}

impl ActivityBucket {
    pub fn increment(&mut self, category: ActivityCategory) {
        match category {
            ActivityCategory::Added => self.added += 1,
            ActivityCategory::Enabled => self.enabled += 1,
            ActivityCategory::Disabled => self.disabled += 1,
            ActivityCategory::Deleted => self.deleted += 1,
        }
    }

    pub fn count(&self, category: ActivityCategory) -> u32 {
        match category {
            ActivityCategory::Added => self.added,
            ActivityCategory::Enabled => self.enabled,
            ActivityCategory::Disabled => self.disabled,
            ActivityCategory::Deleted => self.deleted,
        }
    }

    pub fn peak(&self) -> u32 {
        self.added.max(self.enabled).max(self.disabled).max(self.deleted)
    }
}

/// Per-category totals across all buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ActivitySummary {
    pub added: u32,
    pub enabled: u32,
    pub disabled: u32,
    pub deleted: u32,
    pub total: u32,
}

impl ActivitySummary {
    pub fn from_buckets(buckets: &[ActivityBucket]) -> Self {
        let mut summary = ActivitySummary::default();
        for bucket in buckets {
            summary.added += bucket.added;
            summary.enabled += bucket.enabled;
            summary.disabled += bucket.disabled;
            summary.deleted += bucket.deleted;
        }
        summary.total = summary.added + summary.enabled + summary.disabled + summary.deleted;
        summary
    }

    /// Vertical scale for charting `buckets`
    pub fn scale_max(buckets: &[ActivityBucket]) -> u32 {
        buckets
            .iter()
            .map(ActivityBucket::peak)
            .max()
            .unwrap_or(0)
            .max(MIN_CHART_SCALE)
    }
}

/// Line of the recent activity feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFeedItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LogType,
    pub message: String,
    pub time_ago: String,
    pub is_new: bool,
}

/// Everything the activity panel renders
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActivityReport {
    pub buckets: Vec<ActivityBucket>,
    pub summary: ActivitySummary,
    pub scale_max: u32,
    pub recent: Vec<ActivityFeedItem>,
}
