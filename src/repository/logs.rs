//! Activity log repository

use std::sync::Arc;

use super::{server_timestamp, RemoteStore, StoreResult, LOGS_PATH};
use crate::models::log::{LogEntry, NewLogEntry};

#[derive(Clone)]
pub struct LogsRepository {
    store: Arc<dyn RemoteStore>,
}

impl LogsRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Append an entry; the store assigns key and timestamp
    pub async fn push(&self, entry: &NewLogEntry) -> StoreResult<String> {
        self.store
            .push(LOGS_PATH, entry.to_value(server_timestamp()))
            .await
    }

    /// Last `limit` entries, oldest first. Malformed entries are skipped.
    pub async fn recent(&self, limit: usize) -> StoreResult<Vec<LogEntry>> {
        let children = self.store.tail(LOGS_PATH, limit).await?;
        Ok(children
            .into_iter()
            .filter_map(|child| match LogEntry::from_child(&child.key, child.value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(key = %child.key, error = %e, "Skipping malformed log entry");
                    None
                }
            })
            .collect())
    }
}
