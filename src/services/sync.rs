//! Subscription loop feeding remote changes into the dashboard.
//!
//! Each subscription is drained in arrival order on a single task, so
//! snapshots from one stream are never reordered or batched.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::{
    config::SyncConfig,
    repository::{logs::LogsRepository, RemoteStore, LOGS_PATH, SOURCES_PATH, STATS_PATH},
    services::{
        auth::AuthProvider,
        dashboard::Dashboard,
        events::{DashboardEvent, EventBus},
    },
};

pub struct SyncEngine {
    store: Arc<dyn RemoteStore>,
    dashboard: Arc<Dashboard>,
    auth: Arc<dyn AuthProvider>,
    events: EventBus,
    config: SyncConfig,
}

impl SyncEngine {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        dashboard: Arc<Dashboard>,
        auth: Arc<dyn AuthProvider>,
        events: EventBus,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            dashboard,
            auth,
            events,
            config,
        }
    }

    /// Subscribe to every node and apply changes until `shutdown` flips
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut sources = self.store.watch_children(SOURCES_PATH, None);
        let mut logs = self
            .store
            .watch_children(LOGS_PATH, Some(self.config.source_log_cap));
        let mut activity = self
            .store
            .watch_children(LOGS_PATH, Some(self.config.activity_log_cap));

        let history = LogsRepository::new(self.store.clone());
        match history.recent(self.config.notification_seed).await {
            Ok(entries) => self.dashboard.seed_notifications(entries),
            Err(e) => tracing::warn!(error = %e, "Failed to load notification history"),
        }
        let mut added = self
            .store
            .watch_child_added(LOGS_PATH, Some(self.config.notification_watch));
        let mut stats = self.store.watch_children(STATS_PATH, None);

        let mut auth_state = self.auth.subscribe();
        let mut refresh =
            tokio::time::interval(Duration::from_millis(self.config.activity_refresh_ms.max(1)));

        tracing::info!("Sync engine started");
        loop {
            tokio::select! {
                Some(snapshot) = sources.recv() => self.dashboard.on_sources_snapshot(snapshot),
                Some(snapshot) = logs.recv() => self.dashboard.on_log_snapshot(snapshot),
                Some(snapshot) = activity.recv() => self.dashboard.on_activity_snapshot(snapshot),
                Some(child) = added.recv() => {
                    self.dashboard.on_log_added(child);
                }
                Some(snapshot) = stats.recv() => self.dashboard.on_stats_snapshot(snapshot),
                Ok(()) = auth_state.changed() => {
                    let user = auth_state.borrow_and_update().clone();
                    tracing::debug!(signed_in = user.is_some(), "Auth state changed");
                    self.events.publish(DashboardEvent::AuthStateChanged { user });
                }
                _ = refresh.tick() => self.dashboard.tick_activity(),
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Sync engine stopped");
    }
}
