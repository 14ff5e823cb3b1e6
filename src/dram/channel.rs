//! DRAM Channel.
//!
//! This module defines the `ChannelBus` trait, the interface the scheduler
//! drives each cycle, and `DramChannel`, a channel built from a
//! `SimpleController` and a `ChannelDataPath` that models the command bus,
//! the data bus and the read-return queue.

use crate::common::{BusPacketType, SimResult};
use crate::config::Config;
use crate::dram::controller::{CycleOutcome, SimpleController};
use crate::dram::packet::{BusPacket, Transaction};
use crate::stats::ChannelReport;
use std::collections::VecDeque;

/// Trait for the channel side of a command scheduler.
pub trait ChannelBus {
    /// Accepts a command issued this cycle.
    fn receive_on_cmd_bus(&mut self, packet: BusPacket);

    /// Accepts write data whose column-write latency has elapsed.
    fn receive_on_data_bus(&mut self, packet: BusPacket);

    /// Number of entries waiting in the read-return queue.
    fn read_return_queue_len(&self) -> usize;
}

/// Buses and return queue of one channel.
#[derive(Debug, Default)]
pub struct ChannelDataPath {
    cycle: u64,
    t_cl: u64,
    /// READ data in flight with the cycle it reaches the return queue.
    in_flight_reads: VecDeque<(u64, BusPacket)>,
    read_return_queue: VecDeque<BusPacket>,
    completed_writes: VecDeque<BusPacket>,
    data_bus_busy_until: u64,
    /// Largest read-return-queue length seen.
    pub read_return_queue_max: usize,
    /// Cycles with no transfer on the data bus.
    pub data_bus_idle_cycles: u64,
    /// Commands seen on the command bus.
    pub command_bus_packets: u64,
    /// Bytes of write data received.
    pub write_bytes: u64,
    /// Bytes of read data delivered to the return queue.
    pub read_bytes: u64,
    dram_bus_width: u64,
}

impl ChannelDataPath {
    pub fn new(config: &Config) -> Self {
        Self {
            t_cl: config.timing.t_cl,
            dram_bus_width: config.geometry.dram_bus_width,
            ..Self::default()
        }
    }

    /// Advances one cycle. Read data whose latency has elapsed moves to the
    /// return queue.
    ///
    /// # Returns
    ///
    /// The number of READs whose data arrived this cycle.
    pub fn tick(&mut self) -> usize {
        let mut arrived = 0;
        while let Some((ready, _)) = self.in_flight_reads.front() {
            if *ready > self.cycle {
                break;
            }
            if let Some((_, packet)) = self.in_flight_reads.pop_front() {
                self.read_bytes += packet.burst_length * self.dram_bus_width;
                self.read_return_queue.push_back(packet);
                arrived += 1;
            }
        }
        self.read_return_queue_max = self.read_return_queue_max.max(self.read_return_queue.len());

        if self.data_bus_busy_until <= self.cycle {
            self.data_bus_idle_cycles += 1;
        }
        self.cycle += 1;
        arrived
    }

    pub fn pop_read_return(&mut self) -> Option<BusPacket> {
        self.read_return_queue.pop_front()
    }

    pub fn pop_write_completion(&mut self) -> Option<BusPacket> {
        self.completed_writes.pop_front()
    }

    fn occupy_data_bus(&mut self, from: u64, burst_length: u64) {
        let start = from.max(self.data_bus_busy_until);
        self.data_bus_busy_until = start + burst_length;
    }
}

impl ChannelBus for ChannelDataPath {
    fn receive_on_cmd_bus(&mut self, packet: BusPacket) {
        self.command_bus_packets += 1;
        if packet.kind == BusPacketType::Read {
            let data_start = self.cycle + self.t_cl;
            let ready = data_start + packet.burst_length;
            self.occupy_data_bus(data_start, packet.burst_length);
            self.in_flight_reads
                .push_back((ready, packet.with_kind(BusPacketType::ReadData)));
        }
    }

    fn receive_on_data_bus(&mut self, packet: BusPacket) {
        self.occupy_data_bus(self.cycle, packet.burst_length);
        self.write_bytes += packet.burst_length * self.dram_bus_width;
        self.completed_writes.push_back(packet);
    }

    fn read_return_queue_len(&self) -> usize {
        self.read_return_queue.len()
    }
}

/// One DRAM channel: a command scheduler and the buses it drives.
#[derive(Debug)]
pub struct DramChannel {
    /// Command scheduler of this channel.
    pub controller: SimpleController,
    /// Buses and read-return queue.
    pub data_path: ChannelDataPath,
    max_pending: usize,
}

impl DramChannel {
    pub fn new(channel_id: usize, config: &Config) -> SimResult<Self> {
        Ok(Self {
            controller: SimpleController::new(channel_id, config)?,
            data_path: ChannelDataPath::new(config),
            max_pending: config.controller.max_pending_transactions,
        })
    }

    pub fn channel_id(&self) -> usize {
        self.controller.channel_id()
    }

    /// Offers a transaction to the channel.
    ///
    /// # Returns
    ///
    /// `Ok(false)` if the channel already holds its maximum number of
    /// pending transactions; the caller keeps the transaction and retries.
    pub fn add_transaction(&mut self, trans: Transaction) -> SimResult<bool> {
        if self.max_pending > 0 && self.controller.pending_transactions() as usize >= self.max_pending {
            return Ok(false);
        }
        self.controller.add_transaction(trans)?;
        Ok(true)
    }

    /// Simulates one clock cycle of the channel.
    pub fn update(&mut self) -> SimResult<CycleOutcome> {
        let outcome = self.controller.update(&mut self.data_path)?;
        for _ in 0..self.data_path.tick() {
            self.controller.read_data_returned()?;
        }
        Ok(outcome)
    }

    /// Hands the oldest returned read upstream.
    pub fn pop_read_return(&mut self) -> Option<BusPacket> {
        self.data_path.pop_read_return()
    }

    /// Hands the oldest completed write upstream.
    pub fn pop_write_completion(&mut self) -> Option<BusPacket> {
        self.data_path.pop_write_completion()
    }

    /// Returns `true` when nothing is queued, in flight or waiting upstream.
    pub fn is_idle(&self) -> bool {
        self.controller.is_drained()
            && self.controller.outstanding_reads() == 0
            && self.data_path.read_return_queue_len() == 0
            && self.data_path.completed_writes.is_empty()
    }

    /// Builds the end-of-run report for this channel.
    pub fn report(&self) -> ChannelReport {
        ChannelReport::new(self)
    }
}
