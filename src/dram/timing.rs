//! Derived Timing Parameters.
//!
//! Converts the configured DRAM timings into the cycle counts the scheduler
//! works with, and provides the per-rank four-activate window.

use crate::config::Config;
use std::collections::VecDeque;

/// Maximum ACTIVATEs per rank inside one tFAW span.
pub const FAW_ACTIVATES: usize = 4;

/// Minimum READ-to-precharge time in nanoseconds, applied when four clocks
/// are shorter than this.
const READ_TO_PRECHARGE_NS: f64 = 7.5;

/// Scheduler timing, all in clock cycles.
#[derive(Clone, Debug, PartialEq)]
pub struct TimingParams {
    pub t_ck: f64,
    pub t_rc: u64,
    pub t_rcd: u64,
    pub t_rp: u64,
    pub t_ras: u64,
    pub t_rrd: u64,
    pub t_faw: u64,
    pub t_ccd: u64,
    pub t_wtr: u64,
    pub t_rtp: u64,
    pub t_cwl: u64,
    pub t_cl: u64,
    pub t_wr: u64,
    pub t_rtrs: u64,
    pub t_rfc: u64,
    /// Cycles between refreshes of one rank.
    pub refresh_interval: u64,
    /// State-change countdown after a READ (four clocks or 7.5 ns).
    pub read_to_precharge: u64,
    /// Bytes per clock on the data bus.
    pub dram_bus_width: u64,
}

impl TimingParams {
    pub fn from_config(config: &Config) -> Self {
        let t = &config.timing;
        let read_to_precharge = if 4.0 * t.t_ck > READ_TO_PRECHARGE_NS {
            t.t_rtp
        } else {
            (READ_TO_PRECHARGE_NS / t.t_ck).ceil() as u64
        };

        Self {
            t_ck: t.t_ck,
            t_rc: t.t_rc,
            t_rcd: t.t_rcd,
            t_rp: t.t_rp,
            t_ras: t.t_ras,
            t_rrd: t.t_rrd,
            t_faw: t.t_faw,
            t_ccd: t.t_ccd,
            t_wtr: t.t_wtr,
            t_rtp: t.t_rtp,
            t_cwl: t.t_cwl,
            t_cl: t.t_cl,
            t_wr: t.t_wr,
            t_rtrs: t.t_rtrs,
            t_rfc: t.t_rfc,
            refresh_interval: t.refresh_interval_cycles(),
            read_to_precharge,
            dram_bus_width: config.geometry.dram_bus_width,
        }
    }

    /// Initial refresh counter of `rank`, staggered so ranks come due one
    /// after another.
    pub fn initial_refresh_counter(&self, rank: usize, num_ranks: usize) -> u64 {
        (self.refresh_interval / num_ranks as u64) * (rank as u64 + 1)
    }

    /// Data-bus cycles needed for `size` bytes.
    pub fn burst_length(&self, size: u64) -> u64 {
        size / self.dram_bus_width
    }

    /// Bytes moved by a burst of `burst_length` cycles.
    pub fn request_bytes(&self, burst_length: u64) -> u64 {
        burst_length * self.dram_bus_width
    }
}

/// Sliding window of recent ACTIVATEs on one rank.
///
/// Each entry counts down the cycles until that ACTIVATE leaves the window.
/// The window does not enforce its own bound; the legality checker refuses
/// an ACTIVATE while `is_full` holds.
#[derive(Clone, Debug, Default)]
pub struct FawWindow {
    remaining: VecDeque<u64>,
}

impl FawWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an ACTIVATE that stays in the window for `t_faw` cycles.
    pub fn record(&mut self, t_faw: u64) {
        if t_faw > 0 {
            self.remaining.push_back(t_faw);
        }
    }

    /// Advances one cycle and drops expired entries.
    pub fn tick(&mut self) {
        for r in self.remaining.iter_mut() {
            *r -= 1;
        }
        self.remaining.retain(|&r| r > 0);
    }

    pub fn len(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.remaining.len() >= FAW_ACTIVATES
    }
}
