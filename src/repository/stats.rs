//! Dashboard `stats` node repository

use std::sync::Arc;

use serde_json::{Map, Value};

use super::{server_timestamp, RemoteStore, Snapshot, StoreResult, STATS_PATH};
use crate::models::telemetry::{DashboardStats, PerformanceSample};

/// Rebuild the `stats` object from its child listing. Unreadable fields
/// leave the whole node empty.
pub fn decode_stats(children: Snapshot) -> DashboardStats {
    let fields: Map<String, Value> = children
        .into_iter()
        .map(|child| (child.key, child.value))
        .collect();
    serde_json::from_value(Value::Object(fields)).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Malformed stats node");
        DashboardStats::default()
    })
}

#[derive(Clone)]
pub struct StatsRepository {
    store: Arc<dyn RemoteStore>,
}

impl StatsRepository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Persist a telemetry reading, rounded to one decimal
    pub async fn record_sample(&self, sample: &PerformanceSample) -> StoreResult<()> {
        let rounded = sample.rounded();
        let mut fields = Map::new();
        fields.insert("cpu".into(), Value::from(rounded.cpu));
        fields.insert("memory".into(), Value::from(rounded.memory));
        fields.insert("disk".into(), Value::from(rounded.disk));
        fields.insert("network".into(), Value::from(rounded.network));
        fields.insert("lastUpdated".into(), server_timestamp());
        self.store.update(STATS_PATH, fields).await
    }
}
