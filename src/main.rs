//! Feedboard Server
//!
//! Feed source administration dashboard served as a REST JSON API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::{broadcast::error::RecvError, watch};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedboard::{
    api,
    clock::{Clock, SystemClock},
    config::{AppConfig, LoggingConfig},
    models::LogType,
    repository::{memory::MemoryStore, RemoteStore},
    services::{events::DashboardEvent, Services},
    AppState,
};

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("feedboard={},tower_http=debug", logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    tracing::info!("Starting Feedboard Server v{}", env!("CARGO_PKG_VERSION"));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store: Arc<dyn RemoteStore> = Arc::new(MemoryStore::new(clock.clone()));
    let services = Services::new(store, clock, &config);
    if config.auth.accounts.is_empty() {
        tracing::warn!("No accounts configured; mutations will be rejected");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sync = tokio::spawn(services.sync_engine(&config).run(shutdown_rx.clone()));
    let monitor = config.telemetry.enabled.then(|| {
        tokio::spawn(services.monitor.clone().run(
            Duration::from_millis(config.telemetry.interval_ms.max(1)),
            shutdown_rx.clone(),
        ))
    });
    let toasts = tokio::spawn(log_toasts(services.events.subscribe()));

    let server_host = config.server.host.clone();
    let server_port = config.server.port;

    let state = AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    };
    let app = api::router(state);

    let addr = SocketAddr::new(
        server_host.parse().context("Invalid host address")?,
        server_port,
    );
    tracing::info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down");
    let _ = shutdown_tx.send(true);
    let _ = sync.await;
    if let Some(monitor) = monitor {
        let _ = monitor.await;
    }
    toasts.abort();

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

/// Mirror user-facing toasts into the server log
async fn log_toasts(mut events: tokio::sync::broadcast::Receiver<DashboardEvent>) {
    loop {
        match events.recv().await {
            Ok(DashboardEvent::Toast { level, message }) => match level {
                LogType::Error => tracing::error!(target: "toast", "{}", message),
                LogType::Warning => tracing::warn!(target: "toast", "{}", message),
                _ => tracing::info!(target: "toast", "{}", message),
            },
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Toast logger lagged behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
