//! Rank Energy Bookkeeping.
//!
//! Energy is accumulated in mA·cycles per rank from IDD current-draw
//! constants, following the usual DDR power-calculation breakdown into
//! background, activate/precharge, burst and refresh components. It is a
//! reporting side effect only; scheduling never reads it.

use crate::config::{Config, PowerConfig};
use serde::Serialize;

/// Accumulated energy of one rank, in mA·cycles.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RankEnergy {
    pub background: u64,
    pub burst: u64,
    pub act_pre: u64,
    pub refresh: u64,
}

impl RankEnergy {
    pub fn total(&self) -> u64 {
        self.background + self.burst + self.act_pre + self.refresh
    }
}

/// Average power of one rank over a run, in W.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct RankPower {
    pub background: f64,
    pub burst: f64,
    pub act_pre: f64,
    pub refresh: f64,
}

impl RankPower {
    pub fn total(&self) -> f64 {
        self.background + self.burst + self.act_pre + self.refresh
    }
}

/// Energy cost model for one channel.
#[derive(Clone, Debug)]
pub struct PowerModel {
    power: PowerConfig,
    devices: u64,
    t_rc: u64,
    t_ras: u64,
    t_rfc: u64,
}

impl PowerModel {
    pub fn new(config: &Config) -> Self {
        Self {
            power: config.power.clone(),
            devices: config.geometry.devices_per_rank(),
            t_rc: config.timing.t_rc,
            t_ras: config.timing.t_ras,
            t_rfc: config.timing.t_rfc,
        }
    }

    /// Background energy for one cycle; active standby when any bank of the
    /// rank is open.
    pub fn background(&self, rank_open: bool) -> u64 {
        let idd = if rank_open {
            self.power.idd3n
        } else {
            self.power.idd2n
        };
        idd * self.devices
    }

    /// Energy of one ACTIVATE/precharge pair above standby.
    pub fn activate(&self) -> u64 {
        let p = &self.power;
        let standby = p.idd3n * self.t_ras + p.idd2n * self.t_rc.saturating_sub(self.t_ras);
        (p.idd0 * self.t_rc).saturating_sub(standby) * self.devices
    }

    /// Energy of one read burst above active standby.
    pub fn read_burst(&self) -> u64 {
        self.power.idd4r.saturating_sub(self.power.idd3n) * self.power.burst_length / 2 * self.devices
    }

    /// Energy of one write burst above active standby.
    pub fn write_burst(&self) -> u64 {
        self.power.idd4w.saturating_sub(self.power.idd3n) * self.power.burst_length / 2 * self.devices
    }

    /// Energy of one all-bank refresh above active standby.
    pub fn refresh(&self) -> u64 {
        self.power.idd5b.saturating_sub(self.power.idd3n) * self.t_rfc * self.devices
    }

    /// Converts accumulated energy over `cycles` into average power.
    pub fn average_power(&self, energy: &RankEnergy, cycles: u64) -> RankPower {
        let scale = |e: u64| {
            if cycles == 0 {
                0.0
            } else {
                e as f64 / cycles as f64 * self.power.vdd / 1000.0
            }
        };
        RankPower {
            background: scale(energy.background),
            burst: scale(energy.burst),
            act_pre: scale(energy.act_pre),
            refresh: scale(energy.refresh),
        }
    }
}
