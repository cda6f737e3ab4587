//! Data models for Feedboard

pub mod activity;
pub mod filter;
pub mod log;
pub mod notification;
pub mod source;
pub mod telemetry;
pub mod user;

// Re-export commonly used types
pub use activity::{ActivityBucket, ActivityFeedItem, ActivityReport, ActivitySummary};
pub use filter::{
    CountInfo, CriteriaUpdate, EmptyReason, FilterCriteria, FilterState, FilteredView, RegionFilter, SortKey,
    StatusFilter,
};
pub use log::{ActivityCategory, LogEntry, LogType, NewLogEntry};
pub use notification::{Notification, NotificationList};
pub use source::{generate_id, CreateSource, SourceRecord, SourceStats, UpdateSource};
pub use telemetry::{DashboardStats, LoadLevel, PerformanceSample, ResourceLoad, TelemetryReport};
pub use user::UserIdentity;
