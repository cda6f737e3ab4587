//! Activity log model

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;

/// Severity of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LogType {
    Success,
    Warning,
    Error,
    #[serde(other)]
    Info,
}

/// What happened to a source, as counted by the activity chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Added,
    Enabled,
    Disabled,
    Deleted,
}

impl ActivityCategory {
    /// Keyword matching order used for free-text classification
    pub const ALL: [ActivityCategory; 4] = [
        ActivityCategory::Added,
        ActivityCategory::Enabled,
        ActivityCategory::Disabled,
        ActivityCategory::Deleted,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            ActivityCategory::Added => "added",
            ActivityCategory::Enabled => "enabled",
            ActivityCategory::Disabled => "disabled",
            ActivityCategory::Deleted => "deleted",
        }
    }

    /// First category whose keyword occurs in `message`
    pub fn from_message(message: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|category| message.contains(category.keyword()))
    }
}

/// Immutable entry of the append-only `logs` stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct LogEntry {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default = "default_log_type")]
    pub kind: LogType,
    #[serde(default)]
    pub message: String,
    /// Server-assigned epoch millis
    pub timestamp: Option<i64>,
    #[serde(default = "default_user")]
    pub user: String,
    /// Structured category; entries written by older clients only carry the message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ActivityCategory>,
}

fn default_log_type() -> LogType {
    LogType::Info
}

fn default_user() -> String {
    "System".to_string()
}

impl LogEntry {
    /// Build an entry from a keyed child of the `logs` node
    pub fn from_child(key: &str, value: Value) -> Result<Self, serde_json::Error> {
        let mut entry: LogEntry = serde_json::from_value(value)?;
        entry.id = key.to_string();
        Ok(entry)
    }

    /// Structured category, falling back to keyword matching on the message
    pub fn category(&self) -> Option<ActivityCategory> {
        self.category
            .or_else(|| ActivityCategory::from_message(&self.message))
    }
}

/// Log entry about to be pushed; `timestamp` is stamped by the store
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub kind: LogType,
    pub message: String,
    pub user: String,
    pub category: Option<ActivityCategory>,
}

impl NewLogEntry {
    pub fn to_value(&self, timestamp: Value) -> Value {
        let mut value = json!({
            "type": self.kind,
            "message": self.message,
            "timestamp": timestamp,
            "user": self.user,
        });
        if let (Some(category), Some(map)) = (self.category, value.as_object_mut()) {
            map.insert("category".into(), json!(category));
        }
        value
    }
}

/// Human "time ago" label, as shown next to log and activity entries
pub fn time_ago(timestamp: i64, now: i64) -> String {
    let diff = now - timestamp;
    let seconds = diff.div_euclid(1000);
    let minutes = diff.div_euclid(60_000);
    let hours = diff.div_euclid(3_600_000);
    let days = diff.div_euclid(86_400_000);

    let plural = |n: i64| if n == 1 { "" } else { "s" };

    if seconds < 10 {
        "Just now".to_string()
    } else if seconds < 60 {
        format!("{} seconds ago", seconds)
    } else if minutes < 60 {
        format!("{} minute{} ago", minutes, plural(minutes))
    } else if hours < 24 {
        format!("{} hour{} ago", hours, plural(hours))
    } else {
        format!("{} day{} ago", days, plural(days))
    }
}
