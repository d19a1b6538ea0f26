//! Cost and energy efficiency derived from throughput

use tokenmeter_shared::types::sku::SkuProfile;

const SECONDS_PER_HOUR: f64 = 3600.0;
const TOKENS_PER_MTOKEN: f64 = 1_000_000.0;
const WH_PER_KWH: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostEnergy {
    /// USD per million tokens
    pub cost_per_mtoken: f64,
    /// Wh per million tokens
    pub energy_per_mtoken: f64,
}

/// Price and energy of a million tokens at `current_tps` on hardware `profile`.
///
/// Returns `None` when throughput is zero, negative or not finite: per-token
/// figures are undefined there and the previous values should stand.
pub fn cost_energy(current_tps: f64, profile: &SkuProfile) -> Option<CostEnergy> {
    if !current_tps.is_finite() || current_tps <= 0.0 {
        return None;
    }

    let cost_per_mtoken =
        (profile.hourly_cost_usd / (current_tps * SECONDS_PER_HOUR)) * TOKENS_PER_MTOKEN;
    let energy_per_mtoken = (profile.power_draw_watts / current_tps)
        * (TOKENS_PER_MTOKEN / SECONDS_PER_HOUR / WH_PER_KWH);

    Some(CostEnergy {
        cost_per_mtoken,
        energy_per_mtoken,
    })
}
