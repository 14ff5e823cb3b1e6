//! Simulation Driver.
//!
//! Owns one `DramChannel` per configured channel and advances all of them in
//! lock step. Each cycle:
//!
//! 1. at most one new transaction is offered, to the channel its address maps to,
//! 2. every channel simulates one clock, in index order,
//! 3. each channel hands at most one read return and one write completion to
//!    the event sink.

use crate::common::{BusPacketType, SimResult, TransactionType};
use crate::config::Config;
use crate::dram::address::AddressMapper;
use crate::dram::channel::DramChannel;
use crate::dram::packet::{BusPacket, Transaction};
use crate::sim::trace::{CompletedEvent, EventSink};
use crate::stats::ChannelReport;
use log::info;
use serde::Serialize;
use std::collections::HashMap;

/// Totals of one run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub cycles: u64,
    pub transactions_admitted: u64,
    pub reads_completed: u64,
    pub writes_completed: u64,
    pub bytes_transferred: u64,
    /// Cycles a ready transaction waited because its channel was full.
    pub admission_stalls: u64,
    pub average_latency: f64,
    pub max_latency: u64,
    /// Achieved bandwidth in GB/s.
    pub bandwidth_gbps: f64,
}

impl RunSummary {
    pub fn completions(&self) -> u64 {
        self.reads_completed + self.writes_completed
    }

    /// Prints the run totals.
    pub fn print(&self) {
        println!("==========================================================");
        println!("RUN SUMMARY");
        println!("==========================================================");
        println!("  cycles                 {}", self.cycles);
        println!("  txn.admitted           {}", self.transactions_admitted);
        println!("  txn.admission_stalls   {}", self.admission_stalls);
        println!("  reads.completed        {}", self.reads_completed);
        println!("  writes.completed       {}", self.writes_completed);
        println!("  bytes                  {}", self.bytes_transferred);
        println!("  latency.avg            {:.2} cycles", self.average_latency);
        println!("  latency.max            {} cycles", self.max_latency);
        println!("  bandwidth              {:.3} GB/s", self.bandwidth_gbps);
    }
}

/// Multi-channel simulation.
#[derive(Debug)]
pub struct Simulation {
    channels: Vec<DramChannel>,
    mapper: AddressMapper,
    t_ck: f64,
    cycle: u64,
    /// Transaction waiting for room in its channel.
    held: Option<Transaction>,
    /// Admission cycle and size of every transaction not yet completed.
    in_flight: HashMap<u64, (u64, u64)>,
    summary: RunSummary,
    latency_sum: u64,
}

impl Simulation {
    /// Builds every channel of `config`.
    pub fn new(config: &Config) -> SimResult<Self> {
        config.validate()?;
        let channels = (0..config.geometry.num_channels as usize)
            .map(|id| DramChannel::new(id, config))
            .collect::<SimResult<Vec<_>>>()?;

        Ok(Self {
            channels,
            mapper: AddressMapper::from_config(config)?,
            t_ck: config.timing.t_ck,
            cycle: 0,
            held: None,
            in_flight: HashMap::new(),
            summary: RunSummary::default(),
            latency_sum: 0,
        })
    }

    pub fn mapper(&self) -> &AddressMapper {
        &self.mapper
    }

    pub fn channels(&self) -> &[DramChannel] {
        &self.channels
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Returns `true` when no transaction is held, queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.held.is_none() && self.in_flight.is_empty() && self.channels.iter().all(DramChannel::is_idle)
    }

    /// Runs until `requests` is exhausted and every channel has drained, or
    /// until `max_cycles` cycles have elapsed.
    ///
    /// # Arguments
    ///
    /// * `requests` - Source of transactions; one is offered per cycle.
    /// * `sink` - Receives every completion.
    /// * `max_cycles` - Upper bound on simulated cycles.
    pub fn run(
        &mut self,
        requests: &mut dyn Iterator<Item = Transaction>,
        sink: &mut dyn EventSink,
        max_cycles: u64,
    ) -> SimResult<RunSummary> {
        info!(
            "simulating {} channel(s), mapping {}, up to {} cycles",
            self.channels.len(),
            self.mapper.scheme(),
            max_cycles
        );

        let mut exhausted = false;
        while self.cycle < max_cycles {
            if self.held.is_none() && !exhausted {
                self.held = requests.next();
                exhausted = self.held.is_none();
            }
            if exhausted && self.is_idle() {
                break;
            }
            self.step(sink)?;
        }

        info!("finished after {} cycles", self.cycle);
        Ok(self.summary())
    }

    /// Simulates one cycle of every channel.
    pub fn step(&mut self, sink: &mut dyn EventSink) -> SimResult<()> {
        if let Some(trans) = self.held.take() {
            self.offer(trans)?;
        }

        for channel in &mut self.channels {
            channel.update()?;
        }

        for ch in 0..self.channels.len() {
            if let Some(packet) = self.channels[ch].pop_read_return() {
                self.complete(ch, &packet, sink);
            }
            if let Some(packet) = self.channels[ch].pop_write_completion() {
                self.complete(ch, &packet, sink);
            }
        }

        self.cycle += 1;
        Ok(())
    }

    fn offer(&mut self, trans: Transaction) -> SimResult<()> {
        let channel = self.mapper.map(trans.address).channel as usize;
        let id = trans.transaction_id;
        let size = trans.size;

        if self.channels[channel].add_transaction(trans.clone())? {
            self.in_flight.insert(id, (self.cycle, size));
            self.summary.transactions_admitted += 1;
        } else {
            self.summary.admission_stalls += 1;
            self.held = Some(trans);
        }
        Ok(())
    }

    fn complete(&mut self, channel: usize, packet: &BusPacket, sink: &mut dyn EventSink) {
        let Some(id) = packet.transaction_id else {
            return;
        };
        let Some((admitted_at, bytes)) = self.in_flight.remove(&id) else {
            return;
        };

        let kind = match packet.kind {
            BusPacketType::ReadData => TransactionType::Read,
            _ => TransactionType::Write,
        };
        let event = CompletedEvent {
            transaction_id: id,
            kind,
            channel,
            admitted_at,
            completed_at: self.cycle,
            bytes,
        };

        match kind {
            TransactionType::Read => self.summary.reads_completed += 1,
            TransactionType::Write => self.summary.writes_completed += 1,
        }
        self.summary.bytes_transferred += bytes;
        self.summary.max_latency = self.summary.max_latency.max(event.latency());
        self.latency_sum += event.latency();

        sink.record(event);
    }

    /// Totals so far.
    pub fn summary(&self) -> RunSummary {
        let mut summary = self.summary.clone();
        summary.cycles = self.cycle;

        let completions = summary.completions();
        if completions > 0 {
            summary.average_latency = self.latency_sum as f64 / completions as f64;
        }
        let elapsed_ns = self.cycle as f64 * self.t_ck;
        if elapsed_ns > 0.0 {
            summary.bandwidth_gbps = summary.bytes_transferred as f64 / elapsed_ns;
        }
        summary
    }

    /// Per-channel reports.
    pub fn reports(&self) -> Vec<ChannelReport> {
        self.channels.iter().map(DramChannel::report).collect()
    }
}
