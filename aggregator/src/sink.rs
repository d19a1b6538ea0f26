//! Push-style sink for per-GPU throughput metrics
//!
//! The engine only pushes named, labelled values. `PrometheusSink` keeps them
//! in its own registry so several engines (or tests) never collide on metric
//! names.

use crate::error::Result;
use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};
use tokenmeter_shared::types::snapshot::HealthStatus;

pub trait MetricsSink: Send + Sync {
    fn add_prompt_tokens(&self, gpu_uuid: &str, model_id: &str, tokens: u64);
    fn add_generated_tokens(&self, gpu_uuid: &str, model_id: &str, tokens: u64);
    fn set_current_tps(&self, gpu_uuid: &str, tps: f64);
    fn set_avg_tps_1m(&self, gpu_uuid: &str, tps: f64);
    fn set_cost_per_mtoken(&self, gpu_uuid: &str, model_id: &str, usd: f64);
    fn set_energy_per_mtoken(&self, gpu_uuid: &str, wh: f64);
    fn set_health_status(&self, gpu_uuid: &str, status: HealthStatus);
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl MetricsSink for NoopSink {
    fn add_prompt_tokens(&self, _gpu_uuid: &str, _model_id: &str, _tokens: u64) {}
    fn add_generated_tokens(&self, _gpu_uuid: &str, _model_id: &str, _tokens: u64) {}
    fn set_current_tps(&self, _gpu_uuid: &str, _tps: f64) {}
    fn set_avg_tps_1m(&self, _gpu_uuid: &str, _tps: f64) {}
    fn set_cost_per_mtoken(&self, _gpu_uuid: &str, _model_id: &str, _usd: f64) {}
    fn set_energy_per_mtoken(&self, _gpu_uuid: &str, _wh: f64) {}
    fn set_health_status(&self, _gpu_uuid: &str, _status: HealthStatus) {}
}

pub struct PrometheusSink {
    registry: Registry,
    tokens_prompt: IntCounterVec,
    tokens_generated: IntCounterVec,
    current_tps: GaugeVec,
    avg_tps_1m: GaugeVec,
    cost_per_mtoken: GaugeVec,
    energy_per_mtoken: GaugeVec,
    health_status: GaugeVec,
}

impl PrometheusSink {
    /// Create a sink backed by a fresh registry.
    pub fn new() -> Result<Self> {
        Self::with_registry(Registry::new())
    }

    /// Create a sink registering its metrics into `registry`.
    pub fn with_registry(registry: Registry) -> Result<Self> {
        let tokens_prompt = IntCounterVec::new(
            Opts::new("tokens_prompt_total", "Total prompt tokens processed"),
            &["gpu_uuid", "model_id"],
        )?;
        let tokens_generated = IntCounterVec::new(
            Opts::new("tokens_generated_total", "Total generated tokens"),
            &["gpu_uuid", "model_id"],
        )?;
        let current_tps = GaugeVec::new(
            Opts::new("gpu_current_tps", "Current tokens per second"),
            &["gpu_uuid"],
        )?;
        let avg_tps_1m = GaugeVec::new(
            Opts::new("gpu_avg_tps_1m", "Average tokens per second over 1 minute"),
            &["gpu_uuid"],
        )?;
        let cost_per_mtoken = GaugeVec::new(
            Opts::new("gpu_cost_per_mtoken", "Cost per million tokens in USD"),
            &["gpu_uuid", "model_id"],
        )?;
        let energy_per_mtoken = GaugeVec::new(
            Opts::new("gpu_energy_per_mtoken", "Energy per million tokens in Wh"),
            &["gpu_uuid"],
        )?;
        let health_status = GaugeVec::new(
            Opts::new(
                "gpu_health_status",
                "GPU health status (0=critical, 1=warning, 2=healthy)",
            ),
            &["gpu_uuid"],
        )?;

        registry.register(Box::new(tokens_prompt.clone()))?;
        registry.register(Box::new(tokens_generated.clone()))?;
        registry.register(Box::new(current_tps.clone()))?;
        registry.register(Box::new(avg_tps_1m.clone()))?;
        registry.register(Box::new(cost_per_mtoken.clone()))?;
        registry.register(Box::new(energy_per_mtoken.clone()))?;
        registry.register(Box::new(health_status.clone()))?;

        Ok(Self {
            registry,
            tokens_prompt,
            tokens_generated,
            current_tps,
            avg_tps_1m,
            cost_per_mtoken,
            energy_per_mtoken,
            health_status,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render this sink's metrics to Prometheus text format.
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

impl MetricsSink for PrometheusSink {
    fn add_prompt_tokens(&self, gpu_uuid: &str, model_id: &str, tokens: u64) {
        self.tokens_prompt
            .with_label_values(&[gpu_uuid, model_id])
            .inc_by(tokens);
    }

    fn add_generated_tokens(&self, gpu_uuid: &str, model_id: &str, tokens: u64) {
        self.tokens_generated
            .with_label_values(&[gpu_uuid, model_id])
            .inc_by(tokens);
    }

    fn set_current_tps(&self, gpu_uuid: &str, tps: f64) {
        self.current_tps.with_label_values(&[gpu_uuid]).set(tps);
    }

    fn set_avg_tps_1m(&self, gpu_uuid: &str, tps: f64) {
        self.avg_tps_1m.with_label_values(&[gpu_uuid]).set(tps);
    }

    fn set_cost_per_mtoken(&self, gpu_uuid: &str, model_id: &str, usd: f64) {
        self.cost_per_mtoken
            .with_label_values(&[gpu_uuid, model_id])
            .set(usd);
    }

    fn set_energy_per_mtoken(&self, gpu_uuid: &str, wh: f64) {
        self.energy_per_mtoken.with_label_values(&[gpu_uuid]).set(wh);
    }

    fn set_health_status(&self, gpu_uuid: &str, status: HealthStatus) {
        self.health_status
            .with_label_values(&[gpu_uuid])
            .set(status.gauge_value());
    }
}

/// Look up a sample value in a registry by metric name and label values.
///
/// Returns the counter or gauge value of the first series whose labels
/// include every `(name, value)` pair in `labels`, or `None` when no such
/// series exists. Inspects what a [`PrometheusSink`] has published (see
/// [`PrometheusSink::registry`]) without parsing the text exposition, e.g.
/// from embedding code or diagnostics.
pub fn sample_value(registry: &Registry, name: &str, labels: &[(&str, &str)]) -> Option<f64> {
    registry
        .gather()
        .iter()
        .filter(|family| family.get_name() == name)
        .flat_map(|family| family.get_metric().iter())
        .find(|metric| {
            labels.iter().all(|(k, v)| {
                metric
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == *k && pair.get_value() == *v)
            })
        })
        .map(|metric| {
            if metric.has_counter() {
                metric.get_counter().get_value()
            } else {
                metric.get_gauge().get_value()
            }
        })
}
