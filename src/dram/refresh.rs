//! Refresh Arbiter.
//!
//! Every rank carries a countdown to its next refresh. Once a counter hits
//! zero the rank stops accepting ACTIVATEs, and the arbiter issues an
//! all-bank REFRESH as soon as every bank of the rank is idle and past its
//! `next_activate`. At most one rank is refreshed per cycle, lowest index
//! first.

use crate::dram::bank::BankTable;
use crate::dram::timing::TimingParams;

/// Per-rank refresh countdowns.
#[derive(Clone, Debug)]
pub struct RefreshCounters {
    counters: Vec<u64>,
    interval: u64,
}

impl RefreshCounters {
    /// Creates staggered counters for `num_ranks` ranks.
    pub fn new(timing: &TimingParams, num_ranks: usize) -> Self {
        Self {
            counters: (0..num_ranks)
                .map(|r| timing.initial_refresh_counter(r, num_ranks))
                .collect(),
            interval: timing.refresh_interval,
        }
    }

    /// Counts every rank down by one cycle, stopping at zero.
    pub fn tick(&mut self) {
        for c in self.counters.iter_mut() {
            *c = c.saturating_sub(1);
        }
    }

    /// Returns `true` if `rank` needs a refresh.
    pub fn is_due(&self, rank: usize) -> bool {
        self.counters[rank] == 0
    }

    /// Restarts `rank`'s countdown after its refresh has been issued.
    pub fn reset(&mut self, rank: usize) {
        self.counters[rank] = self.interval;
    }

    pub fn remaining(&self, rank: usize) -> u64 {
        self.counters[rank]
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.counters
    }

    /// Picks the rank to refresh at `now`, if any.
    ///
    /// A due rank is refreshable only when all of its banks are idle and
    /// at or past `next_activate`. Ranks that are due but not refreshable
    /// simply wait.
    pub fn select(&self, banks: &BankTable, now: u64) -> Option<usize> {
        (0..self.counters.len()).find(|&rank| {
            self.is_due(rank) && banks.rank(rank).iter().all(|b| b.is_ready_for_activate(now))
        })
    }
}
