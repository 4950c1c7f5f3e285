//! Append-only event log.
//!
//! Events are stored one shared chunk per tick that logged anything, so
//! cloning the log (to publish a read view after every tick) copies a list
//! of pointers, never the records themselves. Chunks are appended in tick
//! order and never mutated or reordered.

use std::sync::Arc;

use frontier_types::{EventPage, EventRecord};

/// Ordered record of every event a run has logged.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    chunks: Vec<Arc<[EventRecord]>>,
    len: usize,
}

impl EventLog {
    /// An empty log.
    pub const fn new() -> Self {
        Self {
            chunks: Vec::new(),
            len: 0,
        }
    }

    /// Append one tick's events. Empty ticks leave no trace.
    pub fn append_tick(&mut self, events: Vec<EventRecord>) {
        if events.is_empty() {
            return;
        }
        self.len = self.len.saturating_add(events.len());
        self.chunks.push(events.into());
    }

    /// Number of events logged.
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing has been logged yet.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Every event, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &EventRecord> {
        self.chunks.iter().flat_map(|chunk| chunk.iter())
    }

    /// The last `n` events, oldest first.
    pub fn tail(&self, n: usize) -> Vec<EventRecord> {
        self.iter()
            .skip(self.len.saturating_sub(n))
            .cloned()
            .collect()
    }

    /// The first `limit` events with `tick > after_tick`, plus how many
    /// matched in total.
    pub fn page(&self, after_tick: u64, limit: usize, current_tick: u64) -> EventPage {
        let start = self
            .chunks
            .partition_point(|chunk| chunk.first().is_none_or(|e| e.tick <= after_tick));
        let matching = self.chunks.get(start..).unwrap_or_default();
        let total = matching.iter().map(|chunk| chunk.len()).sum::<usize>();
        EventPage {
            events: matching
                .iter()
                .flat_map(|chunk| chunk.iter())
                .take(limit)
                .cloned()
                .collect(),
            total_count: u64::try_from(total).unwrap_or(u64::MAX),
            current_tick,
        }
    }
}
