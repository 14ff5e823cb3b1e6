//! Request and Command Types.
//!
//! This module defines the classification of memory requests and of the
//! commands that travel on a DRAM channel's command and data buses. These
//! types are shared by the controller, the channel data path and the driver.

use serde::Serialize;
use std::fmt;

/// Type of a memory transaction arriving at a channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TransactionType {
    /// Data read. Produces a READ command and, later, read data.
    Read,

    /// Data write. Produces a WRITE command followed by write data on the
    /// data bus.
    Write,
}

/// Type of a bus packet.
///
/// Column commands always carry auto-precharge: the row is closed by the
/// bank itself once the access completes, so there is no explicit
/// PRECHARGE command in the command queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BusPacketType {
    /// Row activation. Opens a row in a bank.
    Activate,

    /// Column read with auto-precharge.
    Read,

    /// Column write with auto-precharge.
    Write,

    /// All-bank refresh of one rank.
    Refresh,

    /// Implicit precharge, only ever recorded as a bank's last command.
    Precharge,

    /// Read data returning from the devices.
    ReadData,

    /// Write data driven onto the data bus.
    WriteData,
}

impl BusPacketType {
    /// Returns `true` for column commands that move data.
    pub fn is_column(self) -> bool {
        matches!(self, BusPacketType::Read | BusPacketType::Write)
    }
}

impl fmt::Display for BusPacketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BusPacketType::Activate => "ACT",
            BusPacketType::Read => "RD_P",
            BusPacketType::Write => "WR_P",
            BusPacketType::Refresh => "REF",
            BusPacketType::Precharge => "PRE",
            BusPacketType::ReadData => "RD_DATA",
            BusPacketType::WriteData => "WR_DATA",
        };
        f.write_str(s)
    }
}
