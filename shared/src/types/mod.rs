//! Core data types

pub mod events;
pub mod sku;
pub mod snapshot;
