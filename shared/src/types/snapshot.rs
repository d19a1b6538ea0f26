//! Read views over per-GPU aggregation state

use super::events::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse health of a GPU's throughput relative to its recent baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "healthy",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }

    /// Numeric encoding for gauges: 0 critical, 1 warning, 2 healthy.
    pub fn gauge_value(&self) -> f64 {
        match self {
            Self::Critical => 0.0,
            Self::Warning => 1.0,
            Self::Healthy => 2.0,
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time metrics for one GPU.
///
/// Rates and efficiency figures are `None` until enough samples have been
/// seen to compute them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuMetricSnapshot {
    pub gpu_uuid: String,
    pub current_tps: Option<f64>,
    pub avg_tps_1m: Option<f64>,
    pub cost_per_mtoken: Option<f64>,
    pub energy_per_mtoken: Option<f64>,
    pub health_status: HealthStatus,

    /// Tokens across the events currently retained in history
    pub tokens_total: u64,

    /// Timestamp of the most recently recorded event
    pub last_updated: Timestamp,

    /// Model of the most recently recorded event
    pub model_id: String,

    /// Last SKU supplied with an event, if any
    pub gpu_sku: Option<String>,

    pub events_retained: usize,
}
