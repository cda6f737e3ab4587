//! Performance telemetry and the dashboard `stats` node

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One reading of the performance monitor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PerformanceSample {
    /// Percent
    pub cpu: f64,
    /// Percent
    pub memory: f64,
    /// Percent
    pub disk: f64,
    /// MB/s
    pub network: f64,
    pub timestamp: i64,
}

impl PerformanceSample {
    /// Copy rounded to one decimal, as persisted
    pub fn rounded(&self) -> Self {
        let round = |v: f64| (v * 10.0).round() / 10.0;
        Self {
            cpu: round(self.cpu),
            memory: round(self.memory),
            disk: round(self.disk),
            network: round(self.network),
            timestamp: self.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum LoadLevel {
    Normal,
    Moderate,
    High,
}

impl LoadLevel {
    pub fn from_percent(value: f64) -> Self {
        if value < 50.0 {
            LoadLevel::Normal
        } else if value < 75.0 {
            LoadLevel::Moderate
        } else {
            LoadLevel::High
        }
    }
}

/// Load level of each percentage metric of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ResourceLoad {
    pub cpu: LoadLevel,
    pub memory: LoadLevel,
    pub disk: LoadLevel,
}

impl From<&PerformanceSample> for ResourceLoad {
    fn from(sample: &PerformanceSample) -> Self {
        Self {
            cpu: LoadLevel::from_percent(sample.cpu),
            memory: LoadLevel::from_percent(sample.memory),
            disk: LoadLevel::from_percent(sample.disk),
        }
    }
}

/// Performance monitor state as served to the dashboard
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TelemetryReport {
    pub latest: Option<PerformanceSample>,
    pub load: Option<ResourceLoad>,
    /// Oldest first
    pub history: Vec<PerformanceSample>,
    /// e.g. "3h 12m"
    pub uptime: String,
}

/// Contents of the remote `stats` node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub disk: Option<f64>,
    pub network: Option<f64>,
    pub last_updated: Option<i64>,
}
