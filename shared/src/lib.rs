//! Shared types and utilities for tokenmeter
//!
//! This crate contains the plain data structures exchanged between the
//! aggregation engine, the exporter binary and anything that feeds or reads
//! them: inference events, SKU profiles and per-GPU snapshots.

pub mod types;
pub mod utils;

// Re-export commonly used types
pub use types::{events::*, sku::*, snapshot::*};
