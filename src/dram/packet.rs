//! Transactions and Bus Packets.
//!
//! A `Transaction` is what a channel receives from upstream: a cache-line
//! sized read or write at a physical address. The controller splits each one
//! into an ACTIVATE and a column command, both represented as `BusPacket`s.

use crate::common::{BusPacketType, TransactionType};
use crate::dram::address::DramAddress;
use serde::Serialize;

/// A memory request admitted to a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// Identifier unique within a run.
    pub transaction_id: u64,
    pub kind: TransactionType,
    /// Physical address.
    pub address: u64,
    /// Request size in bytes.
    pub size: u64,
    /// Upstream port the request came from.
    pub port: u32,
    /// Set for requests produced by the logic layer.
    pub from_logic: bool,
}

impl Transaction {
    /// Creates a read of `size` bytes at `address` from port 0.
    pub fn read(transaction_id: u64, address: u64, size: u64) -> Self {
        Self {
            transaction_id,
            kind: TransactionType::Read,
            address,
            size,
            port: 0,
            from_logic: false,
        }
    }

    /// Creates a write of `size` bytes at `address` from port 0.
    pub fn write(transaction_id: u64, address: u64, size: u64) -> Self {
        Self {
            transaction_id,
            kind: TransactionType::Write,
            address,
            size,
            port: 0,
            from_logic: false,
        }
    }

    /// Marks the transaction as logic-layer originated.
    pub fn from_logic(mut self) -> Self {
        self.from_logic = true;
        self
    }
}

/// A command or data packet on a DRAM channel.
///
/// Packets are never modified after construction; a WRITE_DATA packet is a
/// new packet derived from its WRITE with `with_kind`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BusPacket {
    pub kind: BusPacketType,
    /// Owning transaction. `None` for refreshes.
    pub transaction_id: Option<u64>,
    pub rank: usize,
    pub bank: usize,
    pub row: u64,
    pub column: u64,
    /// Data-bus cycles occupied by the transfer. Zero for ACTIVATE and
    /// REFRESH.
    pub burst_length: u64,
    pub channel: usize,
    pub port: u32,
    pub address: u64,
    pub from_logic: bool,
}

impl BusPacket {
    /// Builds the command packet of `kind` that serves `trans` at `mapped`.
    pub fn for_transaction(
        kind: BusPacketType,
        trans: &Transaction,
        mapped: &DramAddress,
        burst_length: u64,
        channel: usize,
    ) -> Self {
        Self {
            kind,
            transaction_id: Some(trans.transaction_id),
            rank: mapped.rank as usize,
            bank: mapped.bank as usize,
            row: mapped.row,
            column: mapped.column,
            burst_length,
            channel,
            port: trans.port,
            address: trans.address,
            from_logic: trans.from_logic,
        }
    }

    /// Builds an all-bank REFRESH for `rank`.
    pub fn refresh(rank: usize, channel: usize) -> Self {
        Self {
            kind: BusPacketType::Refresh,
            transaction_id: None,
            rank,
            bank: 0,
            row: 0,
            column: 0,
            burst_length: 0,
            channel,
            port: 0,
            address: 0,
            from_logic: false,
        }
    }

    /// Returns a copy of this packet with a different type.
    pub fn with_kind(&self, kind: BusPacketType) -> Self {
        Self {
            kind,
            ..self.clone()
        }
    }
}
