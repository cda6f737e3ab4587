//! Repository layer over the remote real-time store

pub mod logs;
pub mod memory;
pub mod sources;
pub mod stats;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;

pub use memory::MemoryStore;

/// Collection paths used by the dashboard
pub const SOURCES_PATH: &str = "sources";
pub const LOGS_PATH: &str = "logs";
pub const STATS_PATH: &str = "stats";

/// Keyed child of a collection node
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    pub key: String,
    pub value: Value,
}

/// Full ordered listing of a node's children
pub type Snapshot = Vec<Child>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("malformed value at {path}: {reason}")]
    Malformed { path: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Placeholder replaced by the store with its own clock at write time
pub fn server_timestamp() -> Value {
    json!({ ".sv": "timestamp" })
}

pub fn is_server_timestamp(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|map| map.len() == 1 && map.get(".sv") == Some(&Value::from("timestamp")))
}

/// Split a `/`-separated path, rejecting empty and reserved segments
pub fn split_path(path: &str) -> StoreResult<Vec<String>> {
    let segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    if segments.is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    for segment in &segments {
        if segment.contains(['.', '#', '$', '[', ']']) {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
    }
    Ok(segments)
}

/// Keyed hierarchical store with push notifications.
///
/// Subscriptions deliver on unbounded channels in the order the store
/// emits them; the first message reflects the state at subscription time.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Point read
    async fn get(&self, path: &str) -> StoreResult<Option<Value>>;

    /// Replace the value at `path`
    async fn set(&self, path: &str, value: Value) -> StoreResult<()>;

    /// Merge `fields` into the object at `path`
    async fn update(&self, path: &str, fields: Map<String, Value>) -> StoreResult<()>;

    async fn remove(&self, path: &str) -> StoreResult<()>;

    /// Append under a new, chronologically ordered unique key
    async fn push(&self, path: &str, value: Value) -> StoreResult<String>;

    /// One-shot read of the last `limit` children
    async fn tail(&self, path: &str, limit: usize) -> StoreResult<Snapshot>;

    /// Full (or last-`limit`) child listing on every change under `path`
    fn watch_children(&self, path: &str, limit: Option<usize>) -> UnboundedReceiver<Snapshot>;

    /// Each child entering the last-`limit` window of `path`
    fn watch_child_added(&self, path: &str, limit: Option<usize>) -> UnboundedReceiver<Child>;
}

/// Typed access to the dashboard collections
#[derive(Clone)]
pub struct Repository {
    pub store: Arc<dyn RemoteStore>,
    pub sources: sources::SourcesRepository,
    pub logs: logs::LogsRepository,
    pub stats: stats::StatsRepository,
}

impl Repository {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            sources: sources::SourcesRepository::new(store.clone()),
            logs: logs::LogsRepository::new(store.clone()),
            stats: stats::StatsRepository::new(store.clone()),
            store,
        }
    }
}
