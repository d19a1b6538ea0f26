//! Per-GPU aggregation engine
//!
//! All per-GPU state (histories and last computed values) sits behind one
//! mutex owned by the engine. An ingest appends, recomputes and publishes to
//! the sink inside a single critical section, so a concurrent reader sees
//! either none or all of its effects. Throughput for one GPU blocks every
//! other GPU; correctness over parallelism.
//!
//! Recompute steps that cannot run (too few samples in a window, zero
//! throughput, no SKU supplied) are skipped and previously computed values
//! stay in effect.

use crate::audit;
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::derived::cost_energy;
use crate::error::Result;
use crate::health::classify;
use crate::history::GpuHistory;
use crate::metrics;
use crate::sink::MetricsSink;
use crate::window::WindowAggregator;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tokenmeter_shared::types::events::{EventRecord, InferenceSample, Timestamp};
use tokenmeter_shared::types::sku::SkuTable;
use tokenmeter_shared::types::snapshot::{GpuMetricSnapshot, HealthStatus};
use tracing::debug;

/// Mutable state for one GPU.
#[derive(Debug)]
struct GpuState {
    history: GpuHistory,
    current_tps: Option<f64>,
    avg_tps_1m: Option<f64>,
    cost_per_mtoken: Option<f64>,
    energy_per_mtoken: Option<f64>,
    model_id: String,
    gpu_sku: Option<String>,
    /// Last unknown SKU reported to the audit log, to avoid repeating it per event
    reported_unknown_sku: Option<String>,
}

impl GpuState {
    fn new(gpu_uuid: &str, capacity: usize) -> Self {
        Self {
            history: GpuHistory::new(gpu_uuid, capacity),
            current_tps: None,
            avg_tps_1m: None,
            cost_per_mtoken: None,
            energy_per_mtoken: None,
            model_id: String::new(),
            gpu_sku: None,
            reported_unknown_sku: None,
        }
    }

    fn health(&self) -> HealthStatus {
        classify(
            self.current_tps.unwrap_or(0.0),
            self.avg_tps_1m.unwrap_or(0.0),
        )
    }

    fn snapshot(&self) -> GpuMetricSnapshot {
        GpuMetricSnapshot {
            gpu_uuid: self.history.gpu_uuid().to_string(),
            current_tps: self.current_tps,
            avg_tps_1m: self.avg_tps_1m,
            cost_per_mtoken: self.cost_per_mtoken,
            energy_per_mtoken: self.energy_per_mtoken,
            health_status: self.health(),
            tokens_total: self.history.tokens_total(),
            last_updated: self.history.last_update().unwrap_or_default(),
            model_id: self.model_id.clone(),
            gpu_sku: self.gpu_sku.clone(),
            events_retained: self.history.len(),
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    gpus: HashMap<String, GpuState>,
}

/// Thread-safe aggregation of inference events into per-GPU metrics.
pub struct AggregationEngine {
    history_capacity: usize,
    windows: WindowAggregator,
    skus: SkuTable,
    sink: Arc<dyn MetricsSink>,
    clock: Arc<dyn Clock>,
    state: Mutex<EngineState>,
}

impl AggregationEngine {
    /// Create an engine from validated configuration, using the system clock.
    pub fn new(config: &EngineConfig, sink: Arc<dyn MetricsSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            history_capacity: config.history_capacity,
            windows: WindowAggregator::new(config.current_window(), config.trailing_window()),
            skus: config.sku_table(),
            sink,
            clock: Arc::new(SystemClock),
            state: Mutex::new(EngineState::default()),
        })
    }

    /// Replace the time source used for default timestamps and windows.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn lock_state(&self) -> MutexGuard<'_, EngineState> {
        // Nothing inside the critical section panics, but a poisoned lock
        // still holds consistent state: every write completes before unlock.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record one inference event and republish derived metrics for its GPU.
    ///
    /// `timestamp` defaults to the engine clock. Cost and energy are only
    /// recomputed when `gpu_sku` is given.
    pub fn record_inference(
        &self,
        gpu_uuid: &str,
        model_id: &str,
        tokens_prompt: u64,
        tokens_generated: u64,
        gpu_sku: Option<&str>,
        timestamp: Option<Timestamp>,
    ) {
        let started = Instant::now();
        let timestamp = timestamp.unwrap_or_else(|| self.clock.now());
        let record = EventRecord::new(timestamp, tokens_prompt, tokens_generated, model_id);

        let mut state = self.lock_state();

        self.sink.add_prompt_tokens(gpu_uuid, model_id, tokens_prompt);
        self.sink
            .add_generated_tokens(gpu_uuid, model_id, tokens_generated);

        let gpus = &mut state.gpus;
        if !gpus.contains_key(gpu_uuid) {
            audit::gpu_registered(gpu_uuid, self.history_capacity);
            gpus.insert(
                gpu_uuid.to_string(),
                GpuState::new(gpu_uuid, self.history_capacity),
            );
            metrics::TRACKED_GPUS.set(gpus.len() as f64);
        }
        let Some(gpu) = gpus.get_mut(gpu_uuid) else {
            return;
        };

        let evicted = gpu.history.append(record);
        if evicted > 0 {
            metrics::HISTORY_EVICTIONS.inc_by(evicted as f64);
        }
        gpu.model_id = model_id.to_string();
        if let Some(sku) = gpu_sku {
            gpu.gpu_sku = Some(sku.to_string());
        }

        self.update_tps(gpu);
        if let Some(sku) = gpu_sku {
            self.update_cost_energy(gpu_uuid, model_id, sku, gpu);
        }
        self.publish(gpu_uuid, gpu);

        drop(state);
        metrics::INGEST_TOTAL.inc();
        metrics::INGEST_DURATION.observe(started.elapsed().as_secs_f64());
    }

    /// Record a decoded wire sample.
    pub fn record_sample(&self, sample: &InferenceSample) {
        self.record_inference(
            &sample.gpu_uuid,
            &sample.model_id,
            sample.tokens_prompt,
            sample.tokens_generated,
            sample.gpu_sku.as_deref(),
            sample.timestamp_ns,
        );
    }

    fn update_tps(&self, gpu: &mut GpuState) {
        let now = self.clock.now();
        let rates = self.windows.compute(&gpu.history, now);
        if let Some(tps) = rates.current_tps {
            gpu.current_tps = Some(tps);
        }
        if let Some(tps) = rates.avg_tps_1m {
            gpu.avg_tps_1m = Some(tps);
        }
    }

    fn update_cost_energy(&self, gpu_uuid: &str, model_id: &str, sku: &str, gpu: &mut GpuState) {
        let Some(current_tps) = gpu.current_tps else {
            return;
        };

        let (profile, known) = self.skus.lookup(sku);
        let Some(derived) = cost_energy(current_tps, &profile) else {
            return;
        };

        if !known {
            metrics::SKU_FALLBACK_TOTAL.inc();
            if gpu.reported_unknown_sku.as_deref() != Some(sku) {
                audit::unknown_sku(gpu_uuid, sku);
                gpu.reported_unknown_sku = Some(sku.to_string());
            }
        }

        debug!(
            gpu_uuid = %gpu_uuid,
            model_id = %model_id,
            sku = %sku,
            current_tps,
            cost_per_mtoken = derived.cost_per_mtoken,
            energy_per_mtoken = derived.energy_per_mtoken,
            "Recomputed cost and energy"
        );
        gpu.cost_per_mtoken = Some(derived.cost_per_mtoken);
        gpu.energy_per_mtoken = Some(derived.energy_per_mtoken);

        // Only a recompute publishes cost: its model label must match the
        // model the figure was computed for.
        self.sink
            .set_cost_per_mtoken(gpu_uuid, model_id, derived.cost_per_mtoken);
        self.sink
            .set_energy_per_mtoken(gpu_uuid, derived.energy_per_mtoken);
    }

    /// Push throughput and health for this GPU.
    fn publish(&self, gpu_uuid: &str, gpu: &GpuState) {
        if let Some(tps) = gpu.current_tps {
            self.sink.set_current_tps(gpu_uuid, tps);
        }
        if let Some(tps) = gpu.avg_tps_1m {
            self.sink.set_avg_tps_1m(gpu_uuid, tps);
        }
        self.sink.set_health_status(gpu_uuid, gpu.health());
    }

    /// Latest metrics for one GPU, or `None` if it has never been recorded.
    pub fn get_gpu_metrics(&self, gpu_uuid: &str) -> Option<GpuMetricSnapshot> {
        let state = self.lock_state();
        state.gpus.get(gpu_uuid).map(GpuState::snapshot)
    }

    /// Latest metrics for every recorded GPU, in no particular order.
    pub fn get_all_gpu_metrics(&self) -> Vec<GpuMetricSnapshot> {
        let state = self.lock_state();
        state.gpus.values().map(GpuState::snapshot).collect()
    }

    /// Number of GPUs with recorded history.
    pub fn tracked_gpus(&self) -> usize {
        self.lock_state().gpus.len()
    }
}
