//! Sources repository

use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::{server_timestamp, RemoteStore, StoreError, StoreResult, SOURCES_PATH};
use crate::models::source::{SourceRecord, DEFAULT_PRIORITY};

#[derive(Clone)]
pub struct SourcesRepository {
    store: Arc<dyn RemoteStore>,
}

fn source_path(id: &str) -> String {
    format!("{}/{}", SOURCES_PATH, id)
}

impl SourcesRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Get source by ID
    pub async fn get(&self, id: &str) -> StoreResult<Option<SourceRecord>> {
        let path = source_path(id);
        match self.store.get(&path).await? {
            Some(value) => SourceRecord::from_child(id, value)
                .map(Some)
                .map_err(|e| StoreError::Malformed {
                    path,
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, id: &str) -> StoreResult<bool> {
        Ok(self.store.get(&source_path(id)).await?.is_some())
    }

    /// Write a new, enabled source stamped with the server time
    pub async fn create(
        &self,
        id: &str,
        name: &str,
        url: &str,
        priority: Option<i64>,
        region: Option<&str>,
    ) -> StoreResult<()> {
        let value = json!({
            "name": name,
            "url": url,
            "enabled": true,
            "priority": priority.unwrap_or(DEFAULT_PRIORITY),
            "region": region.unwrap_or_default(),
            "lastUpdated": server_timestamp(),
        });
        self.store.set(&source_path(id), value).await
    }

    /// Merge fields into a source and refresh its `lastUpdated`
    pub async fn update(&self, id: &str, mut fields: Map<String, Value>) -> StoreResult<()> {
        fields.insert("lastUpdated".into(), server_timestamp());
        self.store.update(&source_path(id), fields).await
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> StoreResult<()> {
        let mut fields = Map::new();
        fields.insert("enabled".into(), Value::from(enabled));
        self.update(id, fields).await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.remove(&source_path(id)).await
    }
}
