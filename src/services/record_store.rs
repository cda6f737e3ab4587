//! Record store: read-through cache of sources and logs.
//!
//! The authoritative copy lives in the remote store. Snapshots arriving from
//! subscriptions replace the cache wholesale; mutations go to the remote
//! store and are only visible here once the store pushes them back.
//!
//! Every successful mutation runs in this order: remote write acknowledged,
//! one log entry pushed, one toast published. A failed remote write publishes
//! a single error toast and pushes no log entry.

use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock};

use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        generate_id, ActivityCategory, CreateSource, LogEntry, LogType, NewLogEntry,
        SourceRecord, SourceStats, UpdateSource,
    },
    repository::{Child, Repository},
    services::{
        auth::AuthProvider,
        events::{DashboardEvent, EventBus},
    },
};

#[derive(Default)]
struct Cache {
    sources: Vec<SourceRecord>,
    logs: Vec<LogEntry>,
}

pub struct RecordStore {
    repository: Repository,
    auth: Arc<dyn AuthProvider>,
    events: EventBus,
    log_cap: usize,
    cache: RwLock<Cache>,
}

/// Decode a sources snapshot, skipping children that are not valid records
pub fn decode_sources(children: Vec<Child>) -> Vec<SourceRecord> {
    children
        .into_iter()
        .filter_map(|child| match SourceRecord::from_child(&child.key, child.value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key = %child.key, error = %e, "Skipping malformed source");
                None
            }
        })
        .collect()
}

/// Decode a logs snapshot, skipping children that are not valid entries
pub fn decode_logs(children: Vec<Child>) -> Vec<LogEntry> {
    children
        .into_iter()
        .filter_map(|child| match LogEntry::from_child(&child.key, child.value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(key = %child.key, error = %e, "Skipping malformed log entry");
                None
            }
        })
        .collect()
}

/// Stable ascending sort on priority; missing priority sorts as 999
pub fn sort_by_priority(sources: &mut [SourceRecord]) {
    sources.sort_by_key(SourceRecord::effective_priority);
}

impl RecordStore {
    pub fn new(
        repository: Repository,
        auth: Arc<dyn AuthProvider>,
        events: EventBus,
        log_cap: usize,
    ) -> Self {
        Self {
            repository,
            auth,
            events,
            log_cap,
            cache: RwLock::new(Cache::default()),
        }
    }

    /// Replace the cached sources, then sort them by priority
    pub fn apply_source_snapshot(&self, mut records: Vec<SourceRecord>) {
        sort_by_priority(&mut records);
        tracing::debug!(count = records.len(), "Applied sources snapshot");
        {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            cache.sources = records.clone();
        }
        self.events
            .publish(DashboardEvent::SourcesChanged { sources: records });
    }

    /// Replace the cached log window, keeping the newest `log_cap` entries
    pub fn apply_log_snapshot(&self, mut logs: Vec<LogEntry>) {
        let excess = logs.len().saturating_sub(self.log_cap);
        logs.drain(..excess);
        tracing::debug!(count = logs.len(), "Applied logs snapshot");
        {
            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            cache.logs = logs.clone();
        }
        self.events.publish(DashboardEvent::LogsChanged { logs });
    }

    /// Cached sources in priority order
    pub fn sources(&self) -> Vec<SourceRecord> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sources
            .clone()
    }

    /// Cached log window, oldest first
    pub fn logs(&self) -> Vec<LogEntry> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .logs
            .clone()
    }

    pub fn source(&self, id: &str) -> AppResult<SourceRecord> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sources
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Source {} not found", id)))
    }

    pub fn source_stats(&self) -> SourceStats {
        let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
        let active = cache.sources.iter().filter(|s| s.enabled).count();
        let regions: HashSet<&str> = cache
            .sources
            .iter()
            .filter_map(SourceRecord::region_label)
            .collect();
        SourceStats {
            total: cache.sources.len(),
            active,
            disabled: cache.sources.len() - active,
            regions: regions.len(),
        }
    }

    fn contains(&self, id: &str) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .sources
            .iter()
            .any(|s| s.id == id)
    }

    /// Create a source keyed by its derived id
    pub async fn add_source(&self, data: CreateSource) -> AppResult<String> {
        let result = self.try_add_source(&data).await;
        match result {
            Ok(ref id) => {
                tracing::info!(id = %id, "Source added");
                self.log(
                    LogType::Success,
                    format!("Source {} added", data.name.trim()),
                    Some(ActivityCategory::Added),
                )
                .await;
                self.events.toast(LogType::Success, "Source added successfully");
            }
            Err(AppError::DuplicateId(_)) => {
                self.events
                    .toast(LogType::Warning, "A source with this name already exists");
            }
            Err(ref e) => self.fail("Failed to add source", e),
        }
        result
    }

    async fn try_add_source(&self, data: &CreateSource) -> AppResult<String> {
        data.validate()?;
        let name = data.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Source name is required".to_string()));
        }
        let id = generate_id(name);
        if id.is_empty() {
            return Err(AppError::Validation(
                "Source name must contain letters or digits".to_string(),
            ));
        }

        if self.contains(&id) || self.repository.sources.exists(&id).await? {
            return Err(AppError::DuplicateId(format!(
                "A source with id '{}' already exists",
                id
            )));
        }

        self.repository
            .sources
            .create(
                &id,
                name,
                data.url.trim(),
                data.priority,
                data.region.as_deref().map(str::trim),
            )
            .await?;
        Ok(id)
    }

    /// Merge `data` into an existing source
    pub async fn update_source(&self, id: &str, data: UpdateSource) -> AppResult<()> {
        let result = self.try_update_source(id, &data).await;
        match result {
            Ok(()) => {
                tracing::info!(id = %id, "Source updated");
                let label = data.name.as_deref().map(str::trim).unwrap_or(id);
                self.log(LogType::Info, format!("Source {} updated", label), None)
                    .await;
                self.events
                    .toast(LogType::Success, "Source updated successfully");
            }
            Err(ref e) => self.fail("Failed to update source", e),
        }
        result
    }

    async fn try_update_source(&self, id: &str, data: &UpdateSource) -> AppResult<()> {
        data.validate()?;
        if data.is_empty() {
            return Err(AppError::Validation(
                "At least one field must be provided for update".to_string(),
            ));
        }
        if data.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Source name cannot be empty".to_string()));
        }
        self.require_remote(id).await?;
        self.repository.sources.update(id, data.to_fields()).await?;
        Ok(())
    }

    pub async fn delete_source(&self, id: &str) -> AppResult<()> {
        let result = self.try_delete_source(id).await;
        match result {
            Ok(ref name) => {
                tracing::info!(id = %id, "Source deleted");
                self.log(
                    LogType::Warning,
                    format!("Source {} deleted", name),
                    Some(ActivityCategory::Deleted),
                )
                .await;
                self.events
                    .toast(LogType::Success, "Source deleted successfully");
            }
            Err(ref e) => self.fail("Failed to delete source", e),
        }
        result.map(|_| ())
    }

    async fn try_delete_source(&self, id: &str) -> AppResult<String> {
        let source = self.require_remote(id).await?;
        self.repository.sources.delete(id).await?;
        Ok(source.name)
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> AppResult<()> {
        let result = self.try_set_enabled(id, enabled).await;
        let (status, category) = if enabled {
            ("enabled", ActivityCategory::Enabled)
        } else {
            ("disabled", ActivityCategory::Disabled)
        };
        match result {
            Ok(ref name) => {
                tracing::info!(id = %id, status, "Source toggled");
                self.log(
                    LogType::Info,
                    format!("Source {} {}", name, status),
                    Some(category),
                )
                .await;
                self.events
                    .toast(LogType::Success, format!("Source {}", status));
            }
            Err(ref e) => self.fail("Failed to toggle source", e),
        }
        result.map(|_| ())
    }

    async fn try_set_enabled(&self, id: &str, enabled: bool) -> AppResult<String> {
        let source = self.require_remote(id).await?;
        self.repository.sources.set_enabled(id, enabled).await?;
        Ok(source.name)
    }

    async fn require_remote(&self, id: &str) -> AppResult<SourceRecord> {
        self.repository
            .sources
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Source {} not found", id)))
    }

    /// Push one log entry. A failed push does not undo the committed mutation.
    async fn log(&self, kind: LogType, message: String, category: Option<ActivityCategory>) {
        let entry = NewLogEntry {
            kind,
            message,
            user: self.auth.actor(),
            category,
        };
        if let Err(e) = self.repository.logs.push(&entry).await {
            tracing::warn!(error = %e, message = %entry.message, "Failed to add log");
        }
    }

    fn fail(&self, context: &str, error: &AppError) {
        tracing::warn!(error = %error, "{}", context);
        self.events
            .toast(LogType::Error, format!("{}: {}", context, error));
    }
}
