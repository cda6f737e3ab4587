//! Notification feed item

use serde::Serialize;
use utoipa::ToSchema;

use super::log::LogEntry;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Notification {
    #[serde(flatten)]
    pub entry: LogEntry,
    pub read: bool,
}

impl Notification {
    pub fn id(&self) -> &str {
        &self.entry.id
    }
}

/// Notification list with its unread badge count
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub unread_count: usize,
    pub notifications: Vec<Notification>,
}
