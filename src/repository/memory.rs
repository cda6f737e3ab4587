//! In-process implementation of [`RemoteStore`].
//!
//! Holds the whole tree as one JSON document. Children are ordered by key,
//! push keys are fixed-width hex of (millis, sequence) so they sort in
//! creation order. Subscribers are notified after every write that touches
//! their path, in write order.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use super::{
    is_server_timestamp, split_path, Child, RemoteStore, Snapshot, StoreError, StoreResult,
};
use crate::clock::{Clock, SystemClock};

enum WatchKind {
    Children {
        limit: Option<usize>,
        tx: UnboundedSender<Snapshot>,
    },
    ChildAdded {
        limit: Option<usize>,
        tx: UnboundedSender<Child>,
        known: HashSet<String>,
    },
}

struct Watcher {
    path: Vec<String>,
    kind: WatchKind,
}

struct Inner {
    root: Value,
    seq: u64,
    online: bool,
    watchers: Vec<Watcher>,
}

pub struct MemoryStore {
    inner: Mutex<Inner>,
    clock: Arc<dyn Clock>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                root: Value::Object(Map::new()),
                seq: 0,
                online: true,
                watchers: Vec::new(),
            }),
            clock,
        }
    }

    /// Simulate losing (or regaining) the connection; offline calls fail
    pub fn set_online(&self, online: bool) {
        self.lock().online = online;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write<F>(&self, path: &str, apply: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Inner, &[String], i64) -> StoreResult<()>,
    {
        let segments = split_path(path)?;
        let now = self.clock.now_millis();
        let mut inner = self.lock();
        ensure_online(&inner)?;
        apply(&mut *inner, &segments, now)?;
        inner.notify(&segments);
        Ok(())
    }
}

fn ensure_online(inner: &Inner) -> StoreResult<()> {
    if inner.online {
        Ok(())
    } else {
        Err(StoreError::Unavailable("connection lost".to_string()))
    }
}

/// Replace every server timestamp placeholder in `value`
fn resolve_timestamps(value: &mut Value, now: i64) {
    if is_server_timestamp(value) {
        *value = Value::from(now);
        return;
    }
    match value {
        Value::Object(map) => map.values_mut().for_each(|v| resolve_timestamps(v, now)),
        Value::Array(items) => items.iter_mut().for_each(|v| resolve_timestamps(v, now)),
        _ => {}
    }
}

fn node<'a>(root: &'a Value, segments: &[String]) -> Option<&'a Value> {
    segments
        .iter()
        .try_fold(root, |current, segment| current.as_object()?.get(segment))
}

/// Walk to the parent of the last segment, creating objects on the way
fn parent_mut<'a>(root: &'a mut Value, segments: &[String]) -> StoreResult<&'a mut Map<String, Value>> {
    let mut current = root;
    for segment in &segments[..segments.len() - 1] {
        let map = current
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidPath(segments.join("/")))?;
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
    }
    current
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidPath(segments.join("/")))
}

fn children(root: &Value, segments: &[String], limit: Option<usize>) -> Snapshot {
    let mut listing: Snapshot = match node(root, segments).and_then(Value::as_object) {
        Some(map) => map
            .iter()
            .map(|(key, value)| Child {
                key: key.clone(),
                value: value.clone(),
            })
            .collect(),
        None => Vec::new(),
    };
    listing.sort_by(|a, b| a.key.cmp(&b.key));
    if let Some(limit) = limit {
        let skip = listing.len().saturating_sub(limit);
        listing.drain(..skip);
    }
    listing
}

fn related(a: &[String], b: &[String]) -> bool {
    a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

impl Inner {
    fn notify(&mut self, written: &[String]) {
        let root = &self.root;
        self.watchers.retain_mut(|watcher| {
            if !related(&watcher.path, written) {
                return true;
            }
            let listing = match &watcher.kind {
                WatchKind::Children { limit, .. } | WatchKind::ChildAdded { limit, .. } => {
                    children(root, &watcher.path, *limit)
                }
            };
            match &mut watcher.kind {
                WatchKind::Children { tx, .. } => tx.send(listing).is_ok(),
                WatchKind::ChildAdded { tx, known, .. } => {
                    let mut open = true;
                    for child in &listing {
                        if !known.contains(&child.key) {
                            open &= tx.send(child.clone()).is_ok();
                        }
                    }
                    *known = listing.into_iter().map(|c| c.key).collect();
                    open
                }
            }
        });
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn get(&self, path: &str) -> StoreResult<Option<Value>> {
        let segments = split_path(path)?;
        let inner = self.lock();
        ensure_online(&inner)?;
        Ok(node(&inner.root, &segments).cloned())
    }

    async fn set(&self, path: &str, mut value: Value) -> StoreResult<()> {
        self.write(path, |inner, segments, now| {
            resolve_timestamps(&mut value, now);
            let parent = parent_mut(&mut inner.root, segments)?;
            let key = segments[segments.len() - 1].clone();
            if value.is_null() {
                parent.remove(&key);
            } else {
                parent.insert(key, value);
            }
            Ok(())
        })
    }

    async fn update(&self, path: &str, mut fields: Map<String, Value>) -> StoreResult<()> {
        self.write(path, |inner, segments, now| {
            let parent = parent_mut(&mut inner.root, segments)?;
            let target = parent
                .entry(segments[segments.len() - 1].clone())
                .or_insert_with(|| Value::Object(Map::new()));
            let map = target.as_object_mut().ok_or_else(|| StoreError::Malformed {
                path: segments.join("/"),
                reason: "update target is not an object".to_string(),
            })?;
            for (key, value) in fields.iter_mut() {
                resolve_timestamps(value, now);
                if value.is_null() {
                    map.remove(key);
                } else {
                    map.insert(key.clone(), value.clone());
                }
            }
            Ok(())
        })
    }

    async fn remove(&self, path: &str) -> StoreResult<()> {
        self.write(path, |inner, segments, _| {
            if node(&inner.root, segments).is_some() {
                let parent = parent_mut(&mut inner.root, segments)?;
                parent.remove(&segments[segments.len() - 1]);
            }
            Ok(())
        })
    }

    async fn push(&self, path: &str, mut value: Value) -> StoreResult<String> {
        let mut generated = String::new();
        self.write(path, |inner, segments, now| {
            inner.seq += 1;
            generated = format!("{:012x}{:06x}", now.max(0), inner.seq);
            resolve_timestamps(&mut value, now);
            let mut full = segments.to_vec();
            full.push(generated.clone());
            let parent = parent_mut(&mut inner.root, &full)?;
            parent.insert(generated.clone(), value);
            Ok(())
        })?;
        Ok(generated)
    }

    async fn tail(&self, path: &str, limit: usize) -> StoreResult<Snapshot> {
        let segments = split_path(path)?;
        let inner = self.lock();
        ensure_online(&inner)?;
        Ok(children(&inner.root, &segments, Some(limit)))
    }

    fn watch_children(&self, path: &str, limit: Option<usize>) -> UnboundedReceiver<Snapshot> {
        let (tx, rx) = unbounded_channel();
        // An invalid path yields an already closed receiver
        let Ok(segments) = split_path(path) else {
            return rx;
        };
        let mut inner = self.lock();
        let _ = tx.send(children(&inner.root, &segments, limit));
        inner.watchers.push(Watcher {
            path: segments,
            kind: WatchKind::Children { limit, tx },
        });
        rx
    }

    fn watch_child_added(&self, path: &str, limit: Option<usize>) -> UnboundedReceiver<Child> {
        let (tx, rx) = unbounded_channel();
        let Ok(segments) = split_path(path) else {
            return rx;
        };
        let mut inner = self.lock();
        let listing = children(&inner.root, &segments, limit);
        for child in &listing {
            let _ = tx.send(child.clone());
        }
        inner.watchers.push(Watcher {
            path: segments,
            kind: WatchKind::ChildAdded {
                limit,
                tx,
                known: listing.into_iter().map(|c| c.key).collect(),
            },
        });
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::repository::server_timestamp;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new(Arc::new(FixedClock::new(1_000)))
    }

    #[tokio::test]
    async fn test_set_get_resolves_timestamp() {
        let store = store();
        store
            .set("sources/bbc", json!({"name": "BBC", "lastUpdated": server_timestamp()}))
            .await
            .unwrap();
        let value = store.get("sources/bbc").await.unwrap().unwrap();
        assert_eq!(value["lastUpdated"], json!(1_000));
        assert_eq!(store.get("sources/none").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_merges_fields() {
        let store = store();
        store.set("sources/a", json!({"name": "A", "enabled": true})).await.unwrap();
        let mut fields = Map::new();
        fields.insert("enabled".into(), json!(false));
        store.update("sources/a", fields).await.unwrap();
        assert_eq!(
            store.get("sources/a").await.unwrap(),
            Some(json!({"name": "A", "enabled": false}))
        );
    }

    #[tokio::test]
    async fn test_push_keys_are_ordered() {
        let store = store();
        let first = store.push("logs", json!({"message": "one"})).await.unwrap();
        let second = store.push("logs", json!({"message": "two"})).await.unwrap();
        assert!(first < second);

        let tail = store.tail("logs", 1).await.unwrap();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].key, second);
    }

    #[tokio::test]
    async fn test_watch_children_fires_on_write() {
        let store = store();
        let mut rx = store.watch_children("sources", None);
        assert_eq!(rx.recv().await.unwrap(), Vec::new());

        store.set("sources/b", json!({"name": "B"})).await.unwrap();
        store.set("sources/a", json!({"name": "A"})).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().len(), 1);
        let listing = rx.recv().await.unwrap();
        assert_eq!(listing[0].key, "a");
        assert_eq!(listing[1].key, "b");

        // unrelated paths stay silent
        store.set("stats/cpu", json!(3)).await.unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_watch_child_added_replays_then_streams() {
        let store = store();
        store.push("logs", json!({"message": "old"})).await.unwrap();
        let mut rx = store.watch_child_added("logs", Some(50));
        assert_eq!(rx.recv().await.unwrap().value["message"], "old");

        store.push("logs", json!({"message": "new"})).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().value["message"], "new");
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_offline_calls_fail() {
        let store = store();
        store.set_online(false);
        assert!(matches!(
            store.set("sources/a", json!({})).await,
            Err(StoreError::Unavailable(_))
        ));
        store.set_online(true);
        assert!(store.set("sources/a", json!({})).await.is_ok());
    }
}
