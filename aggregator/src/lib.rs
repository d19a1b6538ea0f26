//! Per-GPU inference throughput aggregation
//!
//! [`engine::AggregationEngine`] ingests inference events, keeps a bounded
//! history per GPU, and derives throughput, cost, energy and health. Values
//! are pushed to a [`sink::MetricsSink`] and can be read back as snapshots.

pub mod audit;
pub mod clock;
pub mod config;
pub mod derived;
pub mod engine;
pub mod error;
pub mod health;
pub mod history;
pub mod ingest;
pub mod metrics;
pub mod server;
pub mod sink;
pub mod window;

pub use engine::AggregationEngine;
pub use error::{EngineError, Result};
