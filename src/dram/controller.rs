//! Per-Channel DRAM Command Scheduler.
//!
//! The `SimpleController` turns admitted transactions into ACTIVATE and
//! column commands and issues them one cycle at a time under the DRAM timing
//! constraints. Every call to `update` models one clock:
//!
//! 1. statistics and background energy,
//! 2. tFAW windows, bank state-change countdowns and refresh counters tick,
//! 3. the write-data pipeline may release one packet to the data bus,
//! 4. a due refresh is issued if its rank is quiescent, or else
//! 5. the first legal command in the queue is issued.
//!
//! At most one command leaves per cycle, because the channel has a single
//! command bus, and a refresh cycle issues nothing else anywhere on the
//! channel.

use crate::common::{BusPacketType, ConfigError, InvariantError, SimResult, TransactionType};
use crate::config::Config;
use crate::dram::address::AddressMapper;
use crate::dram::bank::{BankState, BankStatus, BankTable};
use crate::dram::channel::ChannelBus;
use crate::dram::checker::{check_issuable, BlockReason, CheckContext, Issuability};
use crate::dram::packet::{BusPacket, Transaction};
use crate::dram::power::PowerModel;
use crate::dram::queue::{AdmissionPolicy, CommandQueue, LogicFirst, StrictFifo};
use crate::dram::refresh::RefreshCounters;
use crate::dram::timing::{FawWindow, TimingParams};
use crate::dram::write_pipeline::WriteDataPipeline;
use crate::stats::ControllerStats;
use log::{debug, info, warn};

/// What the scheduler did in one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// An all-bank refresh went to `rank`; nothing else was issued.
    Refresh { rank: usize },
    /// A queued command was issued.
    Issued {
        kind: BusPacketType,
        transaction_id: u64,
    },
    /// Nothing was legal this cycle.
    Stalled,
}

/// Command scheduler for one DRAM channel.
#[derive(Debug)]
pub struct SimpleController {
    channel_id: usize,
    timing: TimingParams,
    power: PowerModel,
    mapper: AddressMapper,
    banks: BankTable,
    faw_windows: Vec<FawWindow>,
    refresh: RefreshCounters,
    queue: CommandQueue,
    write_pipeline: WriteDataPipeline,
    return_queue_capacity: u64,
    outstanding_reads: u64,
    pending_activates: u64,
    current_cycle: u64,
    trace_commands: bool,
    warned_full: bool,
    /// Statistics accumulated since construction.
    pub stats: ControllerStats,
}

impl SimpleController {
    /// Creates a controller for channel `channel_id`, using the admission
    /// policy selected by `controller.give_logic_priority`.
    pub fn new(channel_id: usize, config: &Config) -> Result<Self, ConfigError> {
        let policy: Box<dyn AdmissionPolicy> = if config.controller.give_logic_priority {
            Box::new(LogicFirst)
        } else {
            Box::new(StrictFifo)
        };
        Self::with_policy(channel_id, config, policy)
    }

    /// Creates a controller with an explicit admission policy.
    pub fn with_policy(
        channel_id: usize,
        config: &Config,
        policy: Box<dyn AdmissionPolicy>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let num_ranks = config.geometry.num_ranks as usize;
        let num_banks = config.geometry.num_banks as usize;
        let timing = TimingParams::from_config(config);

        Ok(Self {
            channel_id,
            refresh: RefreshCounters::new(&timing, num_ranks),
            timing,
            power: PowerModel::new(config),
            mapper: AddressMapper::from_config(config)?,
            banks: BankTable::new(num_ranks, num_banks),
            faw_windows: vec![FawWindow::new(); num_ranks],
            queue: CommandQueue::new(policy),
            write_pipeline: WriteDataPipeline::new(),
            return_queue_capacity: config.controller.return_queue_capacity,
            outstanding_reads: 0,
            pending_activates: 0,
            current_cycle: 0,
            trace_commands: config.general.trace_commands || cfg!(feature = "always-trace"),
            warned_full: false,
            stats: ControllerStats::new(num_ranks),
        })
    }

    /// Admits a transaction.
    ///
    /// Maps its address, builds the ACTIVATE and column command and places
    /// both in the command queue according to the admission policy.
    ///
    /// # Returns
    ///
    /// `ConfigError::InvalidTransactionSize` if the size is not a whole
    /// number of bus transfers.
    pub fn add_transaction(&mut self, trans: Transaction) -> SimResult<()> {
        let bus_width = self.timing.dram_bus_width;
        if trans.size == 0 || trans.size % bus_width != 0 {
            return Err(ConfigError::InvalidTransactionSize {
                id: trans.transaction_id,
                size: trans.size,
                bus_width,
            }
            .into());
        }

        let mapped = self.mapper.map(trans.address);
        let burst_length = self.timing.burst_length(trans.size);
        let column_kind = match trans.kind {
            TransactionType::Read => {
                self.stats.reads_admitted += 1;
                BusPacketType::Read
            }
            TransactionType::Write => {
                self.stats.writes_admitted += 1;
                BusPacketType::Write
            }
        };

        let activate = BusPacket::for_transaction(BusPacketType::Activate, &trans, &mapped, 0, self.channel_id);
        let column = BusPacket::for_transaction(column_kind, &trans, &mapped, burst_length, self.channel_id);
        self.queue.admit(activate, column);
        self.pending_activates += 1;
        Ok(())
    }

    /// Simulates one clock cycle.
    ///
    /// # Arguments
    ///
    /// * `bus` - The channel receiving issued commands and write data, and
    ///   reporting read-return-queue occupancy.
    ///
    /// # Returns
    ///
    /// The cycle's scheduling decision, or a fatal error.
    pub fn update(&mut self, bus: &mut dyn ChannelBus) -> SimResult<CycleOutcome> {
        let now = self.current_cycle;

        self.stats.record_queue_depth(self.queue.pending_activates() as u64);
        for rank in 0..self.banks.num_ranks() {
            for bank in self.banks.rank(rank) {
                self.stats.record_bank_status(bank.status);
            }
            let open = self.banks.rank_is_open(rank);
            self.stats.rank_energy[rank].background += self.power.background(open);

            self.faw_windows[rank].tick();
            for bank in self.banks.rank_mut(rank) {
                bank.update_state_change(self.timing.t_rp);
            }
        }
        self.refresh.tick();

        if let Some(data) = self.write_pipeline.tick() {
            debug!(
                "[ch{}] cycle {}: write data for transaction {:?} on data bus",
                self.channel_id, now, data.transaction_id
            );
            bus.receive_on_data_bus(data);
        }

        let outcome = match self.refresh.select(&self.banks, now) {
            Some(rank) => {
                self.issue_refresh(rank, bus)?;
                CycleOutcome::Refresh { rank }
            }
            None => self.issue_from_queue(bus)?,
        };

        self.current_cycle += 1;
        self.stats.cycles += 1;
        Ok(outcome)
    }

    /// Checks whether `packet` could be issued this cycle given a
    /// read-return queue holding `read_return_queue_len` entries.
    pub fn check_issuable(&self, packet: &BusPacket, read_return_queue_len: usize) -> Result<Issuability, ConfigError> {
        check_issuable(packet, &self.check_context(read_return_queue_len))
    }

    /// Notes that one READ's data has reached the read-return queue.
    pub fn read_data_returned(&mut self) -> SimResult<()> {
        self.outstanding_reads = self
            .outstanding_reads
            .checked_sub(1)
            .ok_or(InvariantError::OutstandingReadUnderflow {
                cycle: self.current_cycle,
            })?;
        Ok(())
    }

    fn check_context(&self, read_return_queue_len: usize) -> CheckContext<'_> {
        CheckContext {
            now: self.current_cycle,
            banks: &self.banks,
            refresh_counters: self.refresh.as_slice(),
            faw_windows: &self.faw_windows,
            timing: &self.timing,
            read_return_queue_len,
            outstanding_reads: self.outstanding_reads,
            return_queue_capacity: self.return_queue_capacity,
        }
    }

    fn issue_refresh(&mut self, rank: usize, bus: &mut dyn ChannelBus) -> SimResult<()> {
        let now = self.current_cycle;
        if let Some(bank) = self.banks.rank(rank).iter().position(|b| !b.is_ready_for_activate(now)) {
            return Err(InvariantError::RefreshWithBusyBank { cycle: now, rank, bank }.into());
        }

        let t_rfc = self.timing.t_rfc;
        for bank in self.banks.rank_mut(rank) {
            bank.status = BankStatus::Refreshing;
            bank.state_change_countdown = t_rfc.max(1);
            bank.next_activate = now + t_rfc;
            bank.last_command = Some(BusPacketType::Refresh);
        }
        self.stats.rank_energy[rank].refresh += self.power.refresh();
        self.stats.refreshes_issued += 1;
        self.refresh.reset(rank);

        debug!("[ch{}] cycle {}: REF rank {}", self.channel_id, now, rank);
        bus.receive_on_cmd_bus(BusPacket::refresh(rank, self.channel_id));
        Ok(())
    }

    fn issue_from_queue(&mut self, bus: &mut dyn ChannelBus) -> SimResult<CycleOutcome> {
        let mut chosen = None;
        let mut full_refusals = 0;
        {
            let ctx = self.check_context(bus.read_return_queue_len());
            for (i, packet) in self.queue.iter().enumerate() {
                if self.queue.waits_on_own_activate(i) {
                    continue;
                }
                match check_issuable(packet, &ctx)? {
                    Issuability::Issuable => {
                        chosen = Some(i);
                        break;
                    }
                    Issuability::Blocked(BlockReason::ReturnQueueFull) => full_refusals += 1,
                    Issuability::Blocked(_) => {}
                }
            }
        }

        self.stats.return_queue_full += full_refusals;
        if full_refusals > 0 && !self.warned_full {
            warn!(
                "[ch{}] cycle {}: read-return queue full, column commands held back",
                self.channel_id, self.current_cycle
            );
            self.warned_full = true;
        }

        let packet = match chosen.and_then(|i| self.queue.remove(i)) {
            Some(packet) => packet,
            None => return Ok(CycleOutcome::Stalled),
        };

        self.apply_issue(&packet)?;
        self.log_issue(&packet);

        let outcome = CycleOutcome::Issued {
            kind: packet.kind,
            transaction_id: packet.transaction_id.unwrap_or_default(),
        };
        bus.receive_on_cmd_bus(packet);
        Ok(outcome)
    }

    fn apply_issue(&mut self, packet: &BusPacket) -> SimResult<()> {
        match packet.kind {
            BusPacketType::Activate => self.apply_activate(packet),
            BusPacketType::Read => {
                self.take_pending_activate()?;
                self.outstanding_reads += 1;
                self.apply_read(packet);
            }
            BusPacketType::Write => {
                self.take_pending_activate()?;
                self.apply_write(packet);
            }
            other => return Err(ConfigError::UnexpectedPacket(other).into()),
        }
        Ok(())
    }

    fn apply_activate(&mut self, packet: &BusPacket) {
        let now = self.current_cycle;
        let t = &self.timing;

        for (b, bank) in self.banks.rank_mut(packet.rank).iter_mut().enumerate() {
            if b != packet.bank {
                bank.next_activate = bank.next_activate.max(now + t.t_rrd);
            }
        }

        let bank = self.banks.get_mut(packet.rank, packet.bank);
        bank.last_command = Some(BusPacketType::Activate);
        bank.status = BankStatus::RowActive;
        bank.open_row = Some(packet.row);
        bank.next_activate = now + t.t_rc;
        bank.next_read = bank.next_read.max(now + t.t_rcd);
        bank.next_write = bank.next_write.max(now + t.t_rcd);

        self.faw_windows[packet.rank].record(t.t_faw);
        self.stats.rank_energy[packet.rank].act_pre += self.power.activate();
        self.stats.activates_issued += 1;
    }

    fn apply_read(&mut self, packet: &BusPacket) {
        let now = self.current_cycle;
        let bl = packet.burst_length;
        let t = &self.timing;

        let bank = self.banks.get_mut(packet.rank, packet.bank);
        bank.last_command = Some(BusPacketType::Read);
        bank.state_change_countdown = t.read_to_precharge.max(1);
        bank.next_activate = bank.next_activate.max(now + t.t_rtp + t.t_rp);

        let write_after_read = (now + t.t_cl + bl + t.t_rtrs).saturating_sub(t.t_cwl);
        for rank in 0..self.banks.num_ranks() {
            let read_offset = if rank == packet.rank {
                t.t_ccd.max(bl)
            } else {
                bl + t.t_rtrs
            };
            for bank in self.banks.rank_mut(rank) {
                bank.next_read = bank.next_read.max(now + read_offset);
                bank.next_write = bank.next_write.max(write_after_read);
            }
        }

        close_page_after_access(self.banks.get_mut(packet.rank, packet.bank));
        self.stats.rank_energy[packet.rank].burst += self.power.read_burst();
        self.stats.reads_issued += 1;
    }

    fn apply_write(&mut self, packet: &BusPacket) {
        let now = self.current_cycle;
        let bl = packet.burst_length;
        let t = &self.timing;

        self.write_pipeline
            .push(t.t_cwl, packet.with_kind(BusPacketType::WriteData));

        let bank = self.banks.get_mut(packet.rank, packet.bank);
        let countdown = t.t_cwl + bl + t.t_wr;
        bank.last_command = Some(BusPacketType::Write);
        bank.state_change_countdown = countdown.max(1);
        bank.next_activate = now + countdown + t.t_rp;

        for rank in 0..self.banks.num_ranks() {
            let (read_at, write_at) = if rank == packet.rank {
                (now + bl + t.t_cwl + t.t_wtr, now + t.t_ccd.max(bl))
            } else {
                ((now + bl + t.t_rtrs + t.t_cwl).saturating_sub(t.t_cl), now + bl + t.t_rtrs)
            };
            for bank in self.banks.rank_mut(rank) {
                bank.next_read = bank.next_read.max(read_at);
                bank.next_write = bank.next_write.max(write_at);
            }
        }

        close_page_after_access(self.banks.get_mut(packet.rank, packet.bank));
        self.stats.rank_energy[packet.rank].burst += self.power.write_burst();
        self.stats.writes_issued += 1;
    }

    fn take_pending_activate(&mut self) -> SimResult<()> {
        self.pending_activates = self
            .pending_activates
            .checked_sub(1)
            .ok_or(InvariantError::PendingActivateUnderflow {
                cycle: self.current_cycle,
            })?;
        Ok(())
    }

    fn log_issue(&self, packet: &BusPacket) {
        if self.trace_commands {
            info!(
                "[ch{}] cycle {}: {} txn {:?} rk:{} bk:{} rw:{:#x}",
                self.channel_id, self.current_cycle, packet.kind, packet.transaction_id, packet.rank, packet.bank, packet.row
            );
        } else {
            debug!(
                "[ch{}] cycle {}: {} txn {:?} rk:{} bk:{} rw:{:#x}",
                self.channel_id, self.current_cycle, packet.kind, packet.transaction_id, packet.rank, packet.bank, packet.row
            );
        }
    }

    pub fn channel_id(&self) -> usize {
        self.channel_id
    }

    /// Cycle the next `update` will simulate.
    pub fn current_cycle(&self) -> u64 {
        self.current_cycle
    }

    pub fn timing(&self) -> &TimingParams {
        &self.timing
    }

    pub fn power_model(&self) -> &PowerModel {
        &self.power
    }

    pub fn mapper(&self) -> &AddressMapper {
        &self.mapper
    }

    pub fn bank(&self, rank: usize, bank: usize) -> &BankState {
        self.banks.get(rank, bank)
    }

    pub fn banks(&self) -> &BankTable {
        &self.banks
    }

    pub fn faw_window_len(&self, rank: usize) -> usize {
        self.faw_windows[rank].len()
    }

    /// Cycles until `rank`'s next refresh is due.
    pub fn refresh_counter(&self, rank: usize) -> u64 {
        self.refresh.remaining(rank)
    }

    pub fn command_queue(&self) -> &CommandQueue {
        &self.queue
    }

    /// Admitted transactions whose column command has not issued yet.
    pub fn pending_transactions(&self) -> u64 {
        self.pending_activates
    }

    pub fn outstanding_reads(&self) -> u64 {
        self.outstanding_reads
    }

    pub fn pending_write_data(&self) -> usize {
        self.write_pipeline.len()
    }

    /// Returns `true` once every admitted transaction has issued and all
    /// write data has left.
    pub fn is_drained(&self) -> bool {
        self.queue.is_empty() && self.write_pipeline.is_empty()
    }
}

/// Holds further column commands off a bank until its auto-precharge has
/// closed the page.
fn close_page_after_access(bank: &mut BankState) {
    bank.next_read = bank.next_activate;
    bank.next_write = bank.next_activate;
}
