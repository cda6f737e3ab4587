//! Configuration management for Feedboard

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

/// Subscription windows requested from the remote store, one per consumer.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SyncConfig {
    /// Log entries cached by the record store
    pub source_log_cap: usize,
    /// Log entries fed to the activity aggregator
    pub activity_log_cap: usize,
    /// Log entries seeded into the notification feed as already read
    pub notification_seed: usize,
    /// Tail length of the notification child-added subscription
    pub notification_watch: usize,
    /// Period of the activity chart refresh tick
    pub activity_refresh_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ActivityConfig {
    pub bucket_width_ms: i64,
    pub bucket_count: usize,
    /// Number of entries in the recent activity feed
    pub feed_size: usize,
    /// Entries younger than this are flagged as new in the feed
    pub new_badge_ms: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NotificationConfig {
    pub capacity: usize,
    pub freshness_ms: i64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    pub history: usize,
}

/// Account allowed to sign in to the dashboard
#[derive(Debug, Deserialize, Clone)]
pub struct AccountConfig {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    /// Argon2 PHC string
    pub password_hash: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
    pub accounts: Vec<AccountConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-this-secret-in-production".to_string(),
            jwt_expiration_hours: 24,
            accounts: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub activity: ActivityConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // e.g. FEEDBOARD__SERVER__PORT=9000
            .add_source(
                Environment::with_prefix("FEEDBOARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", env::var("PORT").ok())?
            // Override JWT secret from JWT_SECRET env var if present
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            source_log_cap: 50,
            activity_log_cap: 100,
            notification_seed: 20,
            notification_watch: 50,
            activity_refresh_ms: 2000,
        }
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            bucket_width_ms: 3_600_000,
            bucket_count: 10,
            feed_size: 5,
            new_badge_ms: 10_000,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            capacity: 50,
            freshness_ms: 5000,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_ms: 3000,
            history: 20,
        }
    }
}
