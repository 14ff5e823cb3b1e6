//! Completion events.
//!
//! The driver reports every finished transaction to an `EventSink`. The sink
//! only observes; nothing it does feeds back into scheduling.

use crate::common::TransactionType;
use serde::Serialize;

/// A transaction whose data has left its channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CompletedEvent {
    pub transaction_id: u64,
    pub kind: TransactionType,
    pub channel: usize,
    /// Cycle the transaction was accepted by its channel.
    pub admitted_at: u64,
    /// Cycle its read data or write completion was handed upstream.
    pub completed_at: u64,
    pub bytes: u64,
}

impl CompletedEvent {
    pub fn latency(&self) -> u64 {
        self.completed_at.saturating_sub(self.admitted_at)
    }
}

/// Receiver of completion events.
pub trait EventSink {
    fn record(&mut self, event: CompletedEvent);
}

/// Sink that keeps every event in memory.
#[derive(Clone, Debug, Default)]
pub struct LatencyRecorder {
    events: Vec<CompletedEvent>,
}

impl LatencyRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[CompletedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Latency below which `percent` of the recorded events completed.
    ///
    /// Returns `None` when nothing has been recorded.
    pub fn percentile(&self, percent: f64) -> Option<u64> {
        if self.events.is_empty() {
            return None;
        }
        let mut latencies: Vec<u64> = self.events.iter().map(CompletedEvent::latency).collect();
        latencies.sort_unstable();

        let rank = (percent.clamp(0.0, 100.0) / 100.0 * (latencies.len() - 1) as f64).round() as usize;
        latencies.get(rank).copied()
    }

    /// Average latency of events of one kind, in cycles.
    pub fn average_latency(&self, kind: TransactionType) -> f64 {
        let (sum, count) = self
            .events
            .iter()
            .filter(|e| e.kind == kind)
            .fold((0u64, 0u64), |(s, c), e| (s + e.latency(), c + 1));
        if count == 0 {
            0.0
        } else {
            sum as f64 / count as f64
        }
    }
}

impl EventSink for LatencyRecorder {
    fn record(&mut self, event: CompletedEvent) {
        self.events.push(event);
    }
}
