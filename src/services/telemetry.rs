//! Performance monitor: periodic metric samples, bounded history and
//! best-effort persistence to the `stats` node.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tokio::sync::watch;

use crate::{
    clock::Clock,
    models::{PerformanceSample, ResourceLoad, TelemetryReport},
    repository::stats::StatsRepository,
    services::events::{DashboardEvent, EventBus},
};

/// Source of system metrics
#[cfg_attr(test, mockall::automock)]
pub trait MetricsProvider: Send + Sync {
    /// Take one reading stamped with `now`
    fn sample(&self, now: i64) -> PerformanceSample;
}

/// Random readings around fixed baselines
pub struct SimulatedMetrics {
    rng: Mutex<StdRng>,
}

impl Default for SimulatedMetrics {
    fn default() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl SimulatedMetrics {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl MetricsProvider for SimulatedMetrics {
    fn sample(&self, now: i64) -> PerformanceSample {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut around = |base: f64, spread: f64, min: f64, max: f64| {
            (base + rng.gen_range(-spread..spread)).clamp(min, max)
        };
        PerformanceSample {
            cpu: around(40.0, 20.0, 10.0, 90.0),
            memory: around(50.0, 15.0, 20.0, 85.0),
            disk: around(55.0, 10.0, 30.0, 80.0),
            network: around(25.0, 25.0, 0.0, 100.0),
            timestamp: now,
        }
    }
}

/// "Hh Mm" for a duration in millis
pub fn format_uptime(millis: i64) -> String {
    let millis = millis.max(0);
    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    format!("{}h {}m", hours, minutes)
}

pub struct PerformanceMonitor {
    provider: Arc<dyn MetricsProvider>,
    stats: StatsRepository,
    clock: Arc<dyn Clock>,
    events: EventBus,
    capacity: usize,
    history: Mutex<VecDeque<PerformanceSample>>,
    started_at: i64,
}

impl PerformanceMonitor {
    pub fn new(
        provider: Arc<dyn MetricsProvider>,
        stats: StatsRepository,
        clock: Arc<dyn Clock>,
        events: EventBus,
        capacity: usize,
    ) -> Self {
        let started_at = clock.now_millis();
        Self {
            provider,
            stats,
            clock,
            events,
            capacity,
            history: Mutex::new(VecDeque::with_capacity(capacity)),
            started_at,
        }
    }

    /// Take a sample, record it and try to persist it
    pub async fn tick(&self) -> PerformanceSample {
        let sample = self.provider.sample(self.clock.now_millis());
        {
            let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
            history.push_back(sample);
            while history.len() > self.capacity {
                history.pop_front();
            }
        }
        self.events
            .publish(DashboardEvent::TelemetrySampled { sample });

        if let Err(e) = self.stats.record_sample(&sample).await {
            tracing::warn!(error = %e, "Failed to save performance data");
        }
        sample
    }

    pub fn history(&self) -> Vec<PerformanceSample> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    pub fn uptime(&self) -> String {
        format_uptime(self.clock.now_millis() - self.started_at)
    }

    pub fn report(&self) -> TelemetryReport {
        let history = self.history();
        let latest = history.last().copied();
        TelemetryReport {
            load: latest.as_ref().map(ResourceLoad::from),
            latest,
            history,
            uptime: self.uptime(),
        }
    }

    /// Sample immediately, then every `interval` until `shutdown` flips
    pub async fn run(self: Arc<Self>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        tracing::info!(interval_ms = interval.as_millis() as u64, "Performance monitor started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        tracing::info!("Performance monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::models::LoadLevel;
    use crate::repository::{MockRemoteStore, StoreError};

    fn reading(cpu: f64, now: i64) -> PerformanceSample {
        PerformanceSample {
            cpu,
            memory: 60.0,
            disk: 80.0,
            network: 12.34,
            timestamp: now,
        }
    }

    #[test]
    fn test_simulated_ranges() {
        let metrics = SimulatedMetrics::with_seed(7);
        for _ in 0..200 {
            let s = metrics.sample(0);
            assert!((20.0..=60.0).contains(&s.cpu));
            assert!((35.0..=65.0).contains(&s.memory));
            assert!((45.0..=65.0).contains(&s.disk));
            assert!((0.0..=50.0).contains(&s.network));
        }
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(0), "0h 0m");
        assert_eq!(format_uptime(3 * 3_600_000 + 12 * 60_000 + 59_000), "3h 12m");
    }

    #[tokio::test]
    async fn test_tick_survives_persist_failure() {
        let mut provider = MockMetricsProvider::new();
        provider.expect_sample().returning(|now| reading(91.0, now));

        let mut remote = MockRemoteStore::new();
        remote
            .expect_update()
            .withf(|path, fields| path == "stats" && fields.get("network") == Some(&serde_json::json!(12.3)))
            .times(3)
            .returning(|_, _| Err(StoreError::Unavailable("offline".into())));

        let clock = Arc::new(FixedClock::new(1_000));
        let monitor = PerformanceMonitor::new(
            Arc::new(provider),
            StatsRepository::new(Arc::new(remote)),
            clock.clone(),
            EventBus::default(),
            2,
        );

        for _ in 0..3 {
            clock.advance(3_000);
            monitor.tick().await;
        }
        clock.advance(60 * 60_000);

        let report = monitor.report();
        assert_eq!(report.history.len(), 2);
        assert_eq!(report.history[0].timestamp, 7_000);
        assert_eq!(report.latest.map(|s| s.timestamp), Some(10_000));
        let load = report.load.unwrap();
        assert_eq!(load.cpu, LoadLevel::High);
        assert_eq!(load.memory, LoadLevel::Moderate);
        assert_eq!(report.uptime, "1h 0m");
    }
}
