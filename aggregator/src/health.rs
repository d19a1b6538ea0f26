//! GPU health classification from throughput efficiency

use tokenmeter_shared::types::snapshot::HealthStatus;

/// current/avg ratio at or above which a GPU is healthy.
pub const HEALTHY_EFFICIENCY: f64 = 0.9;
/// current/avg ratio at or above which a GPU is only a warning.
pub const WARNING_EFFICIENCY: f64 = 0.8;

/// Classify current throughput against the trailing baseline.
///
/// A GPU producing nothing is critical. Without a baseline (avg == 0) any
/// positive throughput counts as healthy.
pub fn classify(current_tps: f64, avg_tps_1m: f64) -> HealthStatus {
    if current_tps == 0.0 {
        return HealthStatus::Critical;
    }

    if avg_tps_1m > 0.0 {
        let efficiency = current_tps / avg_tps_1m;
        return if efficiency >= HEALTHY_EFFICIENCY {
            HealthStatus::Healthy
        } else if efficiency >= WARNING_EFFICIENCY {
            HealthStatus::Warning
        } else {
            HealthStatus::Critical
        };
    }

    HealthStatus::Healthy
}
