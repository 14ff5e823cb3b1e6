//! Synthetic Request Streams.
//!
//! Produces a finite sequence of cache-line transactions following one of a
//! few fixed access patterns. The stream is fully deterministic so runs can
//! be compared cycle for cycle.

use crate::dram::address::{AddressMapper, DramAddress};
use crate::dram::packet::Transaction;
use clap::ValueEnum;
use serde::Serialize;

/// Address sequence of a synthetic stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Serialize)]
pub enum AccessPattern {
    /// Consecutive transactions at consecutive addresses.
    Sequential,
    /// Consecutive transactions `stride` bytes apart.
    Strided,
    /// Every transaction hits rank 0, bank 0 of channel 0 with a new row.
    RowConflict,
}

/// Deterministic transaction generator.
#[derive(Clone, Debug)]
pub struct RequestGenerator {
    pattern: AccessPattern,
    mapper: AddressMapper,
    transaction_size: u64,
    stride: u64,
    read_percent: u64,
    logic_every: u64,
    remaining: u64,
    next_id: u64,
    cursor: u64,
}

impl RequestGenerator {
    /// Creates a generator of `count` transactions of `transaction_size`
    /// bytes. Defaults to all reads, a stride of one transaction, and no
    /// logic-layer requests.
    pub fn new(pattern: AccessPattern, mapper: &AddressMapper, transaction_size: u64, count: u64) -> Self {
        Self {
            pattern,
            mapper: mapper.clone(),
            transaction_size,
            stride: transaction_size,
            read_percent: 100,
            logic_every: 0,
            remaining: count,
            next_id: 0,
            cursor: 0,
        }
    }

    /// Sets the byte distance between strided requests.
    pub fn with_stride(mut self, stride: u64) -> Self {
        self.stride = stride;
        self
    }

    /// Sets the share of reads, in percent; the rest are writes.
    pub fn with_read_percent(mut self, percent: u64) -> Self {
        self.read_percent = percent.min(100);
        self
    }

    /// Marks every `n`th transaction as logic-layer originated. Zero
    /// disables it.
    pub fn with_logic_every(mut self, n: u64) -> Self {
        self.logic_every = n;
        self
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    fn next_address(&mut self) -> u64 {
        let address = match self.pattern {
            AccessPattern::Sequential | AccessPattern::Strided => self.cursor,
            AccessPattern::RowConflict => self.mapper.unmap(&DramAddress {
                row: self.next_id,
                ..DramAddress::default()
            }),
        };
        let step = match self.pattern {
            AccessPattern::Sequential => self.transaction_size,
            AccessPattern::Strided => self.stride,
            AccessPattern::RowConflict => 0,
        };
        self.cursor = self.cursor.wrapping_add(step) & self.address_mask();
        address
    }

    fn address_mask(&self) -> u64 {
        match self.mapper.address_bits() {
            bits if bits >= 64 => u64::MAX,
            bits => (1u64 << bits) - 1,
        }
    }

    /// 61 is coprime to 100, so every run of 100 ids contains exactly
    /// `read_percent` reads.
    fn is_read(&self, id: u64) -> bool {
        (id % 100) * 61 % 100 < self.read_percent
    }
}

impl Iterator for RequestGenerator {
    type Item = Transaction;

    fn next(&mut self) -> Option<Transaction> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let id = self.next_id;
        let address = self.next_address();
        self.next_id += 1;

        let trans = if self.is_read(id) {
            Transaction::read(id, address, self.transaction_size)
        } else {
            Transaction::write(id, address, self.transaction_size)
        };

        if self.logic_every > 0 && (id + 1) % self.logic_every == 0 {
            Some(trans.from_logic())
        } else {
            Some(trans)
        }
    }
}
