//! Simulation statistics collection and reporting.
//!
//! Tracks command-queue occupancy, bank-state residency, backpressure,
//! command counts and per-rank energy for each channel, and formats them for
//! the terminal or as JSON.

use crate::dram::bank::BankStatus;
use crate::dram::channel::DramChannel;
use crate::dram::power::{RankEnergy, RankPower};
use serde::Serialize;

/// Counters kept by one channel's command scheduler.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ControllerStats {
    pub cycles: u64,

    /// Largest number of transactions waiting for their ACTIVATE.
    pub command_queue_max: u64,
    /// Sum of the per-cycle queue depth, for the average.
    pub command_queue_accumulated: u64,

    pub idle_bank_cycles: u64,
    pub active_bank_cycles: u64,
    pub precharging_bank_cycles: u64,
    pub refreshing_bank_cycles: u64,

    /// Column-command checks refused because the return queue was full.
    pub return_queue_full: u64,

    pub reads_admitted: u64,
    pub writes_admitted: u64,

    pub activates_issued: u64,
    pub reads_issued: u64,
    pub writes_issued: u64,
    pub refreshes_issued: u64,

    pub rank_energy: Vec<RankEnergy>,
}

impl ControllerStats {
    pub fn new(num_ranks: usize) -> Self {
        Self {
            rank_energy: vec![RankEnergy::default(); num_ranks],
            ..Self::default()
        }
    }

    pub fn record_queue_depth(&mut self, depth: u64) {
        self.command_queue_max = self.command_queue_max.max(depth);
        self.command_queue_accumulated += depth;
    }

    pub fn record_bank_status(&mut self, status: BankStatus) {
        match status {
            BankStatus::Idle => self.idle_bank_cycles += 1,
            BankStatus::RowActive => self.active_bank_cycles += 1,
            BankStatus::Precharging => self.precharging_bank_cycles += 1,
            BankStatus::Refreshing => self.refreshing_bank_cycles += 1,
        }
    }

    pub fn average_queue_depth(&self) -> f64 {
        per_cycle(self.command_queue_accumulated, self.cycles)
    }

    /// Average number of banks in each state per cycle, in the order idle,
    /// active, precharging, refreshing.
    pub fn average_bank_states(&self) -> [f64; 4] {
        [
            per_cycle(self.idle_bank_cycles, self.cycles),
            per_cycle(self.active_bank_cycles, self.cycles),
            per_cycle(self.precharging_bank_cycles, self.cycles),
            per_cycle(self.refreshing_bank_cycles, self.cycles),
        ]
    }
}

fn per_cycle(total: u64, cycles: u64) -> f64 {
    if cycles == 0 {
        0.0
    } else {
        total as f64 / cycles as f64
    }
}

/// End-of-run summary of one channel.
#[derive(Clone, Debug, Serialize)]
pub struct ChannelReport {
    pub channel: usize,
    pub stats: ControllerStats,
    pub rank_power_w: Vec<RankPower>,
    pub read_return_queue_max: usize,
    pub data_bus_idle_cycles: u64,
    pub command_bus_packets: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl ChannelReport {
    pub fn new(channel: &DramChannel) -> Self {
        let stats = channel.controller.stats.clone();
        let power = channel.controller.power_model();
        let rank_power_w = stats
            .rank_energy
            .iter()
            .map(|e| power.average_power(e, stats.cycles))
            .collect();

        Self {
            channel: channel.channel_id(),
            rank_power_w,
            read_return_queue_max: channel.data_path.read_return_queue_max,
            data_bus_idle_cycles: channel.data_path.data_bus_idle_cycles,
            command_bus_packets: channel.data_path.command_bus_packets,
            read_bytes: channel.data_path.read_bytes,
            write_bytes: channel.data_path.write_bytes,
            stats,
        }
    }

    /// Prints a formatted summary of the channel.
    pub fn print(&self) {
        let s = &self.stats;
        let cyc = if s.cycles == 0 { 1 } else { s.cycles };
        let [idle, active, pre, refresh] = s.average_bank_states();

        println!("----------------------------------------------------------");
        println!("CHANNEL {}", self.channel);
        println!("  cycles                 {}", s.cycles);
        println!("  txn.reads              {}", s.reads_admitted);
        println!("  txn.writes             {}", s.writes_admitted);
        println!("  cmd.activate           {}", s.activates_issued);
        println!("  cmd.read               {}", s.reads_issued);
        println!("  cmd.write              {}", s.writes_issued);
        println!("  cmd.refresh            {}", s.refreshes_issued);
        println!("  queue.max              {}", s.command_queue_max);
        println!("  queue.avg              {:.4}", s.average_queue_depth());
        println!("  rrq.max                {}", self.read_return_queue_max);
        println!("  rrq.full_refusals      {}", s.return_queue_full);
        println!(
            "  data_bus.idle          {} ({:.2}%)",
            self.data_bus_idle_cycles,
            (self.data_bus_idle_cycles as f64 / cyc as f64) * 100.0
        );
        println!(
            "  banks.avg              idle {:.2} | act {:.2} | pre {:.2} | ref {:.2}",
            idle, active, pre, refresh
        );
        for (rank, (energy, power)) in s.rank_energy.iter().zip(&self.rank_power_w).enumerate() {
            println!(
                "  rank{:<2} power (W)      bg {:.2} | act/pre {:.2} | burst {:.2} | ref {:.2} | total {:.2}",
                rank,
                power.background,
                power.act_pre,
                power.burst,
                power.refresh,
                power.total()
            );
            println!("  rank{:<2} energy         {}", rank, energy.total());
        }
    }
}
