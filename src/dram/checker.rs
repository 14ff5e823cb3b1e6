//! Command Legality Checker.
//!
//! Decides whether a queued command may go out on the command bus this
//! cycle. The check reads bank state, timing counters, refresh counters, the
//! tFAW windows and the downstream return-queue occupancy; it never changes
//! any of them.

use crate::common::{BusPacketType, ConfigError};
use crate::dram::bank::{BankStatus, BankTable};
use crate::dram::packet::BusPacket;
use crate::dram::timing::{FawWindow, TimingParams};

/// Why a command could not be issued. All of these are ordinary
/// backpressure: the command stays queued and is checked again next cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockReason {
    /// The read-return path has no room for the data.
    ReturnQueueFull,
    /// A column command targets a bank with no open row.
    BankNotActive,
    /// A column command targets a row other than the open one.
    RowMismatch,
    /// `next_read`/`next_write` has not been reached.
    TimingNotMet,
    /// An ACTIVATE targets a bank that is not idle or not past
    /// `next_activate`.
    BankBusy,
    /// The rank's refresh is due.
    RefreshPending,
    /// Four ACTIVATEs already sit in the rank's tFAW window.
    FawLimit,
}

/// Outcome of a legality check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Issuability {
    Issuable,
    Blocked(BlockReason),
}

impl Issuability {
    pub fn is_issuable(self) -> bool {
        self == Issuability::Issuable
    }
}

/// Read-only view of the scheduler state a check depends on.
pub struct CheckContext<'a> {
    pub now: u64,
    pub banks: &'a BankTable,
    pub refresh_counters: &'a [u64],
    pub faw_windows: &'a [FawWindow],
    pub timing: &'a TimingParams,
    /// Entries currently waiting in the channel's read-return queue.
    pub read_return_queue_len: usize,
    /// READs issued whose data has not reached the return queue yet.
    pub outstanding_reads: u64,
    /// Return-queue capacity in bytes.
    pub return_queue_capacity: u64,
}

impl CheckContext<'_> {
    /// Return-queue bytes claimed if `packet`'s data were added.
    fn return_queue_bytes(&self, packet: &BusPacket) -> u64 {
        (self.read_return_queue_len as u64 + self.outstanding_reads)
            * self.timing.request_bytes(packet.burst_length)
    }
}

/// Checks whether `packet` may be issued at `ctx.now`.
///
/// READ and WRITE are both gated on return-queue occupancy. That test comes
/// first, so every refused check made while the queue is full reports
/// `ReturnQueueFull`.
///
/// # Returns
///
/// `ConfigError::UnexpectedPacket` for any type the scheduler never queues.
pub fn check_issuable(packet: &BusPacket, ctx: &CheckContext<'_>) -> Result<Issuability, ConfigError> {
    let bank = ctx.banks.get(packet.rank, packet.bank);

    let verdict = match packet.kind {
        BusPacketType::Read | BusPacketType::Write => {
            let next = if packet.kind == BusPacketType::Read {
                bank.next_read
            } else {
                bank.next_write
            };

            if ctx.return_queue_bytes(packet) >= ctx.return_queue_capacity {
                Issuability::Blocked(BlockReason::ReturnQueueFull)
            } else if bank.status != BankStatus::RowActive {
                Issuability::Blocked(BlockReason::BankNotActive)
            } else if bank.open_row != Some(packet.row) {
                Issuability::Blocked(BlockReason::RowMismatch)
            } else if ctx.now < next {
                Issuability::Blocked(BlockReason::TimingNotMet)
            } else {
                Issuability::Issuable
            }
        }
        BusPacketType::Activate => {
            if !bank.is_ready_for_activate(ctx.now) {
                Issuability::Blocked(BlockReason::BankBusy)
            } else if ctx.refresh_counters[packet.rank] == 0 {
                Issuability::Blocked(BlockReason::RefreshPending)
            } else if ctx.faw_windows[packet.rank].is_full() {
                Issuability::Blocked(BlockReason::FawLimit)
            } else {
                Issuability::Issuable
            }
        }
        other => return Err(ConfigError::UnexpectedPacket(other)),
    };

    Ok(verdict)
}
