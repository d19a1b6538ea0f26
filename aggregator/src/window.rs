//! Time-windowed throughput over a GPU history
//!
//! Two windows are evaluated on every ingest: a short "current" window and a
//! trailing one-minute window. A window with fewer than two events produces no
//! value, and the caller keeps whatever it published last. Silence therefore
//! never drives a rate to zero on its own.

use crate::history::GpuHistory;
use std::time::Duration;
use tokenmeter_shared::types::events::Timestamp;
use tokenmeter_shared::utils::time::span_secs;

pub const DEFAULT_CURRENT_WINDOW: Duration = Duration::from_secs(5);
pub const DEFAULT_TRAILING_WINDOW: Duration = Duration::from_secs(60);

/// Lower bound on the time span used as the rate denominator, in seconds.
const MIN_SPAN_SECS: f64 = 1.0;

/// Rates produced by one evaluation. `None` means "leave the previous value".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowRates {
    pub current_tps: Option<f64>,
    pub avg_tps_1m: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct WindowAggregator {
    current: Duration,
    trailing: Duration,
}

impl Default for WindowAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_CURRENT_WINDOW, DEFAULT_TRAILING_WINDOW)
    }
}

impl WindowAggregator {
    pub fn new(current: Duration, trailing: Duration) -> Self {
        Self { current, trailing }
    }

    pub fn current_window(&self) -> Duration {
        self.current
    }

    pub fn trailing_window(&self) -> Duration {
        self.trailing
    }

    /// Evaluate both windows at `now`.
    pub fn compute(&self, history: &GpuHistory, now: Timestamp) -> WindowRates {
        if history.len() < 2 {
            return WindowRates::default();
        }
        WindowRates {
            current_tps: window_tps(history, now, self.current),
            avg_tps_1m: window_tps(history, now, self.trailing),
        }
    }
}

/// Tokens per second over the events within `window` of `now`.
///
/// The span runs from the first to the last selected event in insertion
/// order and is floored at one second, so bursts landing in the same tick
/// (or backfilled events with a negative span) do not blow up the rate.
pub fn window_tps(history: &GpuHistory, now: Timestamp, window: Duration) -> Option<f64> {
    let mut selected = history.events_within(now, window);
    let first = selected.next()?;

    let mut last = first;
    let mut count = 1usize;
    let mut tokens_sum = first.total_tokens() as f64;
    for event in selected {
        last = event;
        count += 1;
        tokens_sum += event.total_tokens() as f64;
    }

    if count < 2 {
        return None;
    }

    let time_span = span_secs(first.timestamp, last.timestamp);
    Some(tokens_sum / time_span.max(MIN_SPAN_SECS))
}
