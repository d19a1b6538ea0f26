//! Bounded per-GPU event history

use std::collections::VecDeque;
use std::time::Duration;
use tokenmeter_shared::types::events::{EventRecord, Timestamp};
use tokenmeter_shared::utils::time::age;

/// Default number of events kept per GPU.
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// FIFO ring of the most recent events for one GPU.
///
/// Events are kept in call order. Callers are expected to supply
/// non-decreasing timestamps; nothing here sorts or rejects backfilled events.
#[derive(Debug, Clone)]
pub struct GpuHistory {
    gpu_uuid: String,
    capacity: usize,
    events: VecDeque<EventRecord>,
    last_update: Option<Timestamp>,
}

impl GpuHistory {
    /// Create a history that keeps at most `capacity` events (minimum 1).
    pub fn new(gpu_uuid: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            gpu_uuid: gpu_uuid.into(),
            capacity,
            events: VecDeque::with_capacity(capacity.min(4096)),
            last_update: None,
        }
    }

    /// Append a record, dropping the oldest while over capacity.
    /// Returns how many records were evicted.
    pub fn append(&mut self, record: EventRecord) -> usize {
        self.last_update = Some(record.timestamp);
        self.events.push_back(record);
        let mut evicted = 0;
        while self.events.len() > self.capacity {
            self.events.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Records no older than `window` at `now`, oldest first.
    ///
    /// The iterator is cheap to clone, so a caller can walk the same selection
    /// more than once.
    pub fn events_within(
        &self,
        now: Timestamp,
        window: Duration,
    ) -> impl Iterator<Item = &EventRecord> + Clone + '_ {
        self.events
            .iter()
            .filter(move |e| age(now, e.timestamp) <= window)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> + '_ {
        self.events.iter()
    }

    pub fn gpu_uuid(&self) -> &str {
        &self.gpu_uuid
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Timestamp of the most recently appended record.
    pub fn last_update(&self) -> Option<Timestamp> {
        self.last_update
    }

    /// Sum of prompt + generated tokens over retained records.
    pub fn tokens_total(&self) -> u64 {
        self.events
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.total_tokens()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenmeter_shared::utils::time::secs_to_nanos;

    fn record(ts_secs: u64, tokens: u64) -> EventRecord {
        EventRecord::new(secs_to_nanos(ts_secs), tokens, 0, "llama-7b")
    }

    #[test]
    fn test_append_within_capacity() {
        let mut history = GpuHistory::new("gpu-0", 4);
        assert!(history.is_empty());
        assert_eq!(history.append(record(1, 10)), 0);
        assert_eq!(history.append(record(2, 20)), 0);
        assert_eq!(history.len(), 2);
        assert_eq!(history.last_update(), Some(secs_to_nanos(2)));
        assert_eq!(history.tokens_total(), 30);
    }

    #[test]
    fn test_bounded_keeps_most_recent() {
        let capacity = 5;
        let mut history = GpuHistory::new("gpu-0", capacity);
        let mut evicted = 0;
        for i in 0..(capacity as u64 + 7) {
            evicted += history.append(record(i, i));
            assert!(history.len() <= capacity);
        }
        assert_eq!(evicted, 7);
        let kept: Vec<u64> = history.iter().map(|e| e.tokens_prompt).collect();
        assert_eq!(kept, vec![7, 8, 9, 10, 11]);
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut history = GpuHistory::new("gpu-0", 0);
        assert_eq!(history.capacity(), 1);
        history.append(record(1, 1));
        assert_eq!(history.append(record(2, 2)), 1);
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_events_within_window() {
        let mut history = GpuHistory::new("gpu-0", 10);
        for ts in [0, 50, 56, 58, 60] {
            history.append(record(ts, ts));
        }
        let now = secs_to_nanos(60);
        let recent: Vec<u64> = history
            .events_within(now, Duration::from_secs(5))
            .map(|e| e.tokens_prompt)
            .collect();
        assert_eq!(recent, vec![56, 58, 60]);

        let minute: Vec<u64> = history
            .events_within(now, Duration::from_secs(60))
            .map(|e| e.tokens_prompt)
            .collect();
        assert_eq!(minute, vec![0, 50, 56, 58, 60]);
    }

    #[test]
    fn test_events_within_is_restartable() {
        let mut history = GpuHistory::new("gpu-0", 10);
        history.append(record(1, 1));
        history.append(record(2, 2));
        let selection = history.events_within(secs_to_nanos(2), Duration::from_secs(5));
        assert_eq!(selection.clone().count(), 2);
        assert_eq!(selection.map(|e| e.tokens_prompt).sum::<u64>(), 3);
    }

    #[test]
    fn test_events_within_keeps_insertion_order() {
        let mut history = GpuHistory::new("gpu-0", 10);
        history.append(record(3, 3));
        history.append(record(1, 1));
        history.append(record(2, 2));
        let order: Vec<u64> = history
            .events_within(secs_to_nanos(3), Duration::from_secs(5))
            .map(|e| e.tokens_prompt)
            .collect();
        assert_eq!(order, vec![3, 1, 2]);
        assert_eq!(history.last_update(), Some(secs_to_nanos(2)));
    }

    #[test]
    fn test_future_events_included() {
        let mut history = GpuHistory::new("gpu-0", 10);
        history.append(record(100, 1));
        assert_eq!(
            history
                .events_within(secs_to_nanos(10), Duration::from_secs(5))
                .count(),
            1
        );
    }

    #[test]
    fn test_empty_history_selects_nothing() {
        let history = GpuHistory::new("gpu-0", 10);
        assert_eq!(history.events_within(0, Duration::from_secs(60)).count(), 0);
        assert_eq!(history.tokens_total(), 0);
        assert_eq!(history.last_update(), None);
    }
}
