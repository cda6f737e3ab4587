//! Dashboard services

pub mod activity;
pub mod auth;
pub mod dashboard;
pub mod events;
pub mod filter;
pub mod notifications;
pub mod record_store;
pub mod sync;
pub mod telemetry;

use std::sync::Arc;

use crate::{
    clock::Clock,
    config::AppConfig,
    repository::{RemoteStore, Repository},
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn RemoteStore>,
    pub auth: Arc<auth::LocalAuthProvider>,
    pub records: Arc<record_store::RecordStore>,
    pub dashboard: Arc<dashboard::Dashboard>,
    pub monitor: Arc<telemetry::PerformanceMonitor>,
    pub events: events::EventBus,
    pub clock: Arc<dyn Clock>,
}

impl Services {
    /// Wire every service over `store`, with simulated metrics
    pub fn new(store: Arc<dyn RemoteStore>, clock: Arc<dyn Clock>, config: &AppConfig) -> Self {
        Self::with_metrics(
            store,
            clock,
            Arc::new(telemetry::SimulatedMetrics::default()),
            config,
        )
    }

    pub fn with_metrics(
        store: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        metrics: Arc<dyn telemetry::MetricsProvider>,
        config: &AppConfig,
    ) -> Self {
        let events = events::EventBus::default();
        let repository = Repository::new(store.clone());
        let auth = Arc::new(auth::LocalAuthProvider::new(&config.auth));

        let records = Arc::new(record_store::RecordStore::new(
            repository.clone(),
            auth.clone(),
            events.clone(),
            config.sync.source_log_cap,
        ));
        let dashboard = Arc::new(dashboard::Dashboard::new(
            records.clone(),
            config,
            clock.clone(),
            events.clone(),
        ));
        let monitor = Arc::new(telemetry::PerformanceMonitor::new(
            metrics,
            repository.stats,
            clock.clone(),
            events.clone(),
            config.telemetry.history,
        ));

        Self {
            store,
            auth,
            records,
            dashboard,
            monitor,
            events,
            clock,
        }
    }

    /// Subscription loop bound to these services
    pub fn sync_engine(&self, config: &AppConfig) -> sync::SyncEngine {
        sync::SyncEngine::new(
            self.store.clone(),
            self.dashboard.clone(),
            self.auth.clone(),
            self.events.clone(),
            config.sync.clone(),
        )
    }
}
