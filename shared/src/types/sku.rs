//! GPU SKU cost and power profiles

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Hourly cost and typical power draw for one GPU model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkuProfile {
    pub hourly_cost_usd: f64,
    pub power_draw_watts: f64,
}

impl SkuProfile {
    pub const fn new(hourly_cost_usd: f64, power_draw_watts: f64) -> Self {
        Self {
            hourly_cost_usd,
            power_draw_watts,
        }
    }
}

/// Profile used for SKUs missing from the table.
pub const DEFAULT_SKU_PROFILE: SkuProfile = SkuProfile::new(2.50, 400.0);

/// Named entry as it appears in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuEntry {
    pub sku: String,
    pub hourly_cost_usd: f64,
    pub power_draw_watts: f64,
}

impl SkuEntry {
    pub fn new(sku: impl Into<String>, hourly_cost_usd: f64, power_draw_watts: f64) -> Self {
        Self {
            sku: sku.into(),
            hourly_cost_usd,
            power_draw_watts,
        }
    }

    pub fn profile(&self) -> SkuProfile {
        SkuProfile::new(self.hourly_cost_usd, self.power_draw_watts)
    }
}

/// Rental pricing and typical board power for common datacenter GPUs.
pub fn builtin_sku_entries() -> Vec<SkuEntry> {
    vec![
        SkuEntry::new("A100", 2.50, 400.0),
        SkuEntry::new("V100", 1.20, 300.0),
        SkuEntry::new("H100", 4.00, 700.0),
        SkuEntry::new("RTX4090", 0.80, 450.0),
    ]
}

/// Read-only SKU → profile table with a fallback profile.
#[derive(Debug, Clone)]
pub struct SkuTable {
    profiles: HashMap<String, SkuProfile>,
    default: SkuProfile,
}

impl SkuTable {
    /// Build a table from entries. Later entries win on duplicate SKU names.
    pub fn new(entries: &[SkuEntry], default: SkuProfile) -> Self {
        let profiles = entries
            .iter()
            .map(|e| (e.sku.clone(), e.profile()))
            .collect();
        Self { profiles, default }
    }

    /// Exact-match lookup. Returns the profile and whether the SKU was known.
    pub fn lookup(&self, sku: &str) -> (SkuProfile, bool) {
        match self.profiles.get(sku) {
            Some(profile) => (*profile, true),
            None => (self.default, false),
        }
    }

    pub fn default_profile(&self) -> SkuProfile {
        self.default
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for SkuTable {
    fn default() -> Self {
        Self::new(&builtin_sku_entries(), DEFAULT_SKU_PROFILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = SkuTable::default();
        assert_eq!(table.len(), 4);
        assert_eq!(table.lookup("H100"), (SkuProfile::new(4.00, 700.0), true));
        assert_eq!(table.lookup("V100"), (SkuProfile::new(1.20, 300.0), true));
    }

    #[test]
    fn test_unknown_sku_uses_default() {
        let table = SkuTable::default();
        let (profile, known) = table.lookup("MI300X");
        assert!(!known);
        assert_eq!(profile, DEFAULT_SKU_PROFILE);
        assert_eq!(profile.hourly_cost_usd, 2.50);
        assert_eq!(profile.power_draw_watts, 400.0);
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let table = SkuTable::default();
        assert!(!table.lookup("h100").1);
    }

    #[test]
    fn test_custom_default_and_duplicates() {
        let entries = vec![SkuEntry::new("L4", 0.7, 72.0), SkuEntry::new("L4", 0.8, 75.0)];
        let table = SkuTable::new(&entries, SkuProfile::new(1.0, 100.0));
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup("L4").0, SkuProfile::new(0.8, 75.0));
        assert_eq!(table.lookup("T4").0, SkuProfile::new(1.0, 100.0));
    }
}
