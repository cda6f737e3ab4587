//! Bounded read/unread feed of recent log entries.
//!
//! Entries present when the feed is seeded are shown as already read. Only
//! entries arriving afterwards, and stamped within the freshness window,
//! count as unread.

use std::collections::VecDeque;

use crate::{
    models::{LogEntry, Notification, NotificationList},
    services::events::{DashboardEvent, EventBus},
};

/// Caller-side confirmation required before destructive bulk operations
pub trait ConfirmationGate {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> ConfirmationGate for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

pub struct NotificationFeed {
    items: VecDeque<Notification>,
    unread: usize,
    capacity: usize,
    freshness_ms: i64,
    events: EventBus,
}

impl NotificationFeed {
    pub fn new(capacity: usize, freshness_ms: i64, events: EventBus) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            unread: 0,
            capacity,
            freshness_ms,
            events,
        }
    }

    /// Replace the feed with pre-existing entries (oldest first), all read
    pub fn seed(&mut self, entries: Vec<LogEntry>) {
        self.items = entries
            .into_iter()
            .rev()
            .take(self.capacity)
            .map(|entry| Notification { entry, read: true })
            .collect();
        self.unread = 0;
        tracing::debug!(count = self.items.len(), "Notification feed seeded");
        self.publish_all();
    }

    /// Handle an entry pushed by the child-added subscription.
    ///
    /// Returns whether the entry was accepted as a new unread notification.
    pub fn on_entry_arrived(&mut self, entry: LogEntry, now: i64) -> bool {
        let fresh = entry
            .timestamp
            .is_some_and(|ts| now - ts < self.freshness_ms);
        if !fresh {
            tracing::trace!(id = %entry.id, "Ignoring replayed log entry");
            return false;
        }
        if self.items.iter().any(|n| n.id() == entry.id) {
            return false;
        }

        self.items.push_front(Notification { entry, read: false });
        self.unread += 1;
        while self.items.len() > self.capacity {
            if let Some(dropped) = self.items.pop_back() {
                if !dropped.read {
                    self.unread -= 1;
                }
            }
        }
        self.publish_all();
        true
    }

    /// Mark one notification read; unknown or already read ids are ignored
    pub fn mark_read(&mut self, id: &str) {
        let Some(item) = self.items.iter_mut().find(|n| n.id() == id && !n.read) else {
            return;
        };
        item.read = true;
        self.unread = self.unread.saturating_sub(1);
        self.publish_all();
    }

    pub fn mark_all_read(&mut self) {
        if self.unread == 0 {
            return;
        }
        for item in self.items.iter_mut() {
            item.read = true;
        }
        self.unread = 0;
        self.publish_all();
    }

    /// Empty the feed once `gate` confirms. Returns whether it was cleared.
    pub fn clear_all(&mut self, gate: impl ConfirmationGate) -> bool {
        if !gate.confirm("Clear all notifications?") {
            return false;
        }
        self.items.clear();
        self.unread = 0;
        self.publish_all();
        true
    }

    pub fn unread_count(&self) -> usize {
        self.unread
    }

    /// Notifications, most recent first
    pub fn list(&self) -> NotificationList {
        NotificationList {
            unread_count: self.unread,
            notifications: self.items.iter().cloned().collect(),
        }
    }

    fn publish_all(&self) {
        self.events.publish(DashboardEvent::UnreadCountChanged {
            count: self.unread,
        });
        self.events.publish(DashboardEvent::NotificationListChanged {
            notifications: self.items.iter().cloned().collect(),
        });
    }
}
