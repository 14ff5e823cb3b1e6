//! DRAM channel model.
//!
//! Everything below a channel's transaction interface: address mapping, the
//! per-bank state machine, the timing-legality checker, the refresh arbiter,
//! the command queue and the per-cycle command scheduler, plus the channel
//! data path the scheduler drives.

/// Physical address to channel/rank/bank/row/column mapping.
pub mod address;

/// Per-bank state machine and the rank-major bank table.
pub mod bank;

/// `ChannelBus` trait and the concrete DRAM channel.
pub mod channel;

/// Command legality checker.
pub mod checker;

/// Per-channel command scheduler.
pub mod controller;

/// Transactions and bus packets.
pub mod packet;

/// IDD-based energy bookkeeping.
pub mod power;

/// Command queue and admission policies.
pub mod queue;

/// Refresh counters and arbiter.
pub mod refresh;

/// Derived timing parameters and the tFAW window.
pub mod timing;

/// Write-data delay pipeline.
pub mod write_pipeline;

pub use address::{AddressMapper, DramAddress, MappingScheme};
pub use bank::{BankState, BankStatus, BankTable};
pub use channel::{ChannelBus, ChannelDataPath, DramChannel};
pub use checker::{BlockReason, Issuability};
pub use controller::{CycleOutcome, SimpleController};
pub use packet::{BusPacket, Transaction};
