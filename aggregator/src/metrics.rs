//! Prometheus metrics about the aggregation engine itself
//!
//! These live on the process-wide default registry. Per-GPU throughput
//! metrics go through a [`MetricsSink`](crate::sink::MetricsSink) instead.

use crate::error::Result;
use once_cell::sync::Lazy;
use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};

// ── Ingest metrics ───────────────────────────────────────────────────────────

pub static INGEST_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!("tokenmeter_ingest_total", "Inference events recorded").unwrap()
});

pub static INGEST_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "tokenmeter_ingest_duration_seconds",
        "Time spent recording one inference event, lock wait included",
        vec![0.00001, 0.00005, 0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05]
    )
    .unwrap()
});

pub static SAMPLES_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "tokenmeter_samples_total",
        "Lines read from the sample stream",
        &["status"]
    )
    .unwrap()
});

// ── History metrics ──────────────────────────────────────────────────────────

pub static HISTORY_EVICTIONS: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "tokenmeter_history_evictions_total",
        "Events dropped from per-GPU history due to capacity"
    )
    .unwrap()
});

pub static TRACKED_GPUS: Lazy<Gauge> = Lazy::new(|| {
    register_gauge!("tokenmeter_tracked_gpus", "GPUs with recorded history").unwrap()
});

// ── Derived metrics ──────────────────────────────────────────────────────────

pub static SKU_FALLBACK_TOTAL: Lazy<Counter> = Lazy::new(|| {
    register_counter!(
        "tokenmeter_sku_fallback_total",
        "Cost/energy computations that used the default SKU profile"
    )
    .unwrap()
});

/// Render all metrics on the default registry to Prometheus text format.
pub fn encode_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
