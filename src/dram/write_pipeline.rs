//! Write-Data Delay Pipeline.
//!
//! Write data follows its WRITE command onto the data bus after the
//! column-write latency. Entries are created in issue order with the same
//! delay, so the head always expires first.

use crate::dram::packet::BusPacket;
use std::collections::VecDeque;

#[derive(Clone, Debug, Default)]
pub struct WriteDataPipeline {
    entries: VecDeque<(u64, BusPacket)>,
}

impl WriteDataPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds `packet` for `delay` cycles.
    pub fn push(&mut self, delay: u64, packet: BusPacket) {
        self.entries.push_back((delay, packet));
    }

    /// Advances one cycle and releases the head entry if its delay has run
    /// out. At most one packet leaves per cycle.
    pub fn tick(&mut self) -> Option<BusPacket> {
        for (remaining, _) in self.entries.iter_mut() {
            *remaining = remaining.saturating_sub(1);
        }

        match self.entries.front() {
            Some((0, _)) => self.entries.pop_front().map(|(_, packet)| packet),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
