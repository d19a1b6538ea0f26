//! Engine and exporter configuration
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, and `TOKENMETER__*` environment variables where `__` separates
//! nesting levels (e.g. `TOKENMETER__ENGINE__HISTORY_CAPACITY=500`).

use crate::error::{EngineError, Result};
use crate::history::DEFAULT_HISTORY_CAPACITY;
use crate::window::{DEFAULT_CURRENT_WINDOW, DEFAULT_TRAILING_WINDOW};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tokenmeter_shared::types::sku::{
    builtin_sku_entries, SkuEntry, SkuProfile, SkuTable, DEFAULT_SKU_PROFILE,
};

const ENV_PREFIX: &str = "TOKENMETER";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Admin HTTP listen address (health checks, metrics, live GPU views)
    pub admin_addr: String,

    pub engine: EngineConfig,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            admin_addr: "0.0.0.0:9400".to_string(),
            engine: EngineConfig::default(),
        }
    }
}

impl ExporterConfig {
    /// Load configuration from an optional TOML file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: ExporterConfig = builder.build()?.try_deserialize()?;
        config.engine.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Max events kept per GPU
    pub history_capacity: usize,

    /// Length of the "current" throughput window in seconds
    pub current_window_secs: u64,

    /// Length of the trailing average window in seconds
    pub trailing_window_secs: u64,

    /// Profile for SKUs not listed in `skus`
    pub default_sku: SkuProfile,

    pub skus: Vec<SkuEntry>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            current_window_secs: DEFAULT_CURRENT_WINDOW.as_secs(),
            trailing_window_secs: DEFAULT_TRAILING_WINDOW.as_secs(),
            default_sku: DEFAULT_SKU_PROFILE,
            skus: builtin_sku_entries(),
        }
    }
}

impl EngineConfig {
    pub fn current_window(&self) -> Duration {
        Duration::from_secs(self.current_window_secs)
    }

    pub fn trailing_window(&self) -> Duration {
        Duration::from_secs(self.trailing_window_secs)
    }

    pub fn sku_table(&self) -> SkuTable {
        SkuTable::new(&self.skus, self.default_sku)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(invalid("history_capacity must be greater than 0"));
        }

        if self.current_window_secs == 0 || self.trailing_window_secs == 0 {
            return Err(invalid("window lengths must be greater than 0"));
        }

        check_profile("default_sku", &self.default_sku)?;
        for entry in &self.skus {
            if entry.sku.is_empty() {
                return Err(invalid("sku name must not be empty"));
            }
            check_profile(&entry.sku, &entry.profile())?;
        }

        Ok(())
    }
}

fn check_profile(name: &str, profile: &SkuProfile) -> Result<()> {
    let valid = |v: f64| v.is_finite() && v >= 0.0;
    if !valid(profile.hourly_cost_usd) || !valid(profile.power_draw_watts) {
        return Err(invalid(&format!(
            "{}: cost and power must be finite and non-negative",
            name
        )));
    }
    Ok(())
}

fn invalid(msg: &str) -> EngineError {
    EngineError::InvalidConfig(msg.to_string())
}
