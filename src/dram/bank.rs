//! Bank State Table.
//!
//! Each bank of each rank carries a small state machine plus the earliest
//! cycle at which each command type may next target it. The scheduler is the
//! only writer: it mutates a bank when it issues a command and ticks every
//! bank's state-change countdown once per cycle.

use crate::common::BusPacketType;
use serde::Serialize;

/// Coarse state of a DRAM bank.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum BankStatus {
    #[default]
    Idle,
    RowActive,
    Precharging,
    Refreshing,
}

/// State and timing counters for one bank.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BankState {
    pub status: BankStatus,
    /// Open row. `Some` exactly when `status` is `RowActive`.
    pub open_row: Option<u64>,
    /// Earliest cycle an ACTIVATE may target this bank.
    pub next_activate: u64,
    /// Earliest cycle a READ may target this bank.
    pub next_read: u64,
    /// Earliest cycle a WRITE may target this bank.
    pub next_write: u64,
    /// Cycles until the next automatic state transition. Zero means none
    /// pending.
    pub state_change_countdown: u64,
    pub last_command: Option<BusPacketType>,
}

impl BankState {
    /// Advances the automatic state transition by one cycle.
    ///
    /// A column command's countdown ends in PRECHARGING (the implicit
    /// auto-precharge), which lasts `t_rp` cycles; a precharge or refresh
    /// countdown ends in IDLE.
    ///
    /// # Arguments
    ///
    /// * `t_rp` - Precharge period in cycles.
    pub fn update_state_change(&mut self, t_rp: u64) {
        if self.state_change_countdown == 0 {
            return;
        }

        self.state_change_countdown -= 1;
        if self.state_change_countdown > 0 {
            return;
        }

        match self.last_command {
            Some(BusPacketType::Read) | Some(BusPacketType::Write) => {
                self.open_row = None;
                self.last_command = Some(BusPacketType::Precharge);
                if t_rp == 0 {
                    self.status = BankStatus::Idle;
                } else {
                    self.status = BankStatus::Precharging;
                    self.state_change_countdown = t_rp;
                }
            }
            Some(BusPacketType::Precharge) | Some(BusPacketType::Refresh) => {
                self.status = BankStatus::Idle;
            }
            _ => {}
        }
    }

    /// Returns `true` if the bank is idle and may be activated or refreshed
    /// at `now`.
    pub fn is_ready_for_activate(&self, now: u64) -> bool {
        self.status == BankStatus::Idle && now >= self.next_activate
    }
}

/// Bank states of one channel, stored rank-major in a single allocation.
#[derive(Clone, Debug)]
pub struct BankTable {
    banks: Vec<BankState>,
    num_ranks: usize,
    num_banks: usize,
}

impl BankTable {
    /// Creates a table of idle banks.
    pub fn new(num_ranks: usize, num_banks: usize) -> Self {
        Self {
            banks: vec![BankState::default(); num_ranks * num_banks],
            num_ranks,
            num_banks,
        }
    }

    pub fn num_ranks(&self) -> usize {
        self.num_ranks
    }

    pub fn num_banks(&self) -> usize {
        self.num_banks
    }

    /// Returns the state of one bank.
    ///
    /// # Panics
    ///
    /// Panics if `rank` or `bank` is out of range.
    pub fn get(&self, rank: usize, bank: usize) -> &BankState {
        &self.banks[self.index(rank, bank)]
    }

    /// Returns the mutable state of one bank.
    pub fn get_mut(&mut self, rank: usize, bank: usize) -> &mut BankState {
        let idx = self.index(rank, bank);
        &mut self.banks[idx]
    }

    /// Returns all banks of a rank.
    pub fn rank(&self, rank: usize) -> &[BankState] {
        let start = rank * self.num_banks;
        &self.banks[start..start + self.num_banks]
    }

    /// Returns all banks of a rank, mutably.
    pub fn rank_mut(&mut self, rank: usize) -> &mut [BankState] {
        let start = rank * self.num_banks;
        &mut self.banks[start..start + self.num_banks]
    }

    /// Iterates over every bank of every rank.
    pub fn iter(&self) -> impl Iterator<Item = &BankState> {
        self.banks.iter()
    }

    /// Iterates mutably over every bank of every rank.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BankState> {
        self.banks.iter_mut()
    }

    /// Returns `true` if any bank of `rank` holds an open row or is
    /// refreshing, which selects the active-standby background current.
    pub fn rank_is_open(&self, rank: usize) -> bool {
        self.rank(rank)
            .iter()
            .any(|b| matches!(b.status, BankStatus::RowActive | BankStatus::Refreshing))
    }

    fn index(&self, rank: usize, bank: usize) -> usize {
        debug_assert!(rank < self.num_ranks && bank < self.num_banks);
        rank * self.num_banks + bank
    }
}
