//! Command Queue and Admission Policies.
//!
//! The command queue holds the ACTIVATE and column command of every admitted
//! transaction. Each pair is inserted as two adjacent entries, ACTIVATE
//! first; where the pair goes is decided by a pluggable `AdmissionPolicy`.

use crate::common::BusPacketType;
use crate::dram::packet::BusPacket;
use std::collections::VecDeque;
use std::fmt::Debug;

/// Where an admitted ACTIVATE/column pair is placed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Back,
    Front,
}

/// Trait for command-queue admission policies.
pub trait AdmissionPolicy: Debug {
    /// Chooses the placement for the pair whose column command is `packet`.
    fn placement(&self, packet: &BusPacket) -> Placement;
}

/// Every pair goes to the back.
#[derive(Clone, Copy, Debug, Default)]
pub struct StrictFifo;

impl AdmissionPolicy for StrictFifo {
    fn placement(&self, _packet: &BusPacket) -> Placement {
        Placement::Back
    }
}

/// Logic-layer pairs jump to the front; everything else is FIFO.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogicFirst;

impl AdmissionPolicy for LogicFirst {
    fn placement(&self, packet: &BusPacket) -> Placement {
        if packet.from_logic {
            Placement::Front
        } else {
            Placement::Back
        }
    }
}

/// Pending commands of one channel in scan order.
#[derive(Debug)]
pub struct CommandQueue {
    packets: VecDeque<BusPacket>,
    policy: Box<dyn AdmissionPolicy>,
}

impl CommandQueue {
    pub fn new(policy: Box<dyn AdmissionPolicy>) -> Self {
        Self {
            packets: VecDeque::new(),
            policy,
        }
    }

    /// Inserts a transaction's ACTIVATE and column command as adjacent
    /// entries, ACTIVATE first.
    pub fn admit(&mut self, activate: BusPacket, column: BusPacket) {
        match self.policy.placement(&column) {
            Placement::Back => {
                self.packets.push_back(activate);
                self.packets.push_back(column);
            }
            Placement::Front => {
                self.packets.push_front(column);
                self.packets.push_front(activate);
            }
        }
    }

    /// Returns `true` if the entry at `index` is a column command sitting
    /// directly behind its own ACTIVATE.
    pub fn waits_on_own_activate(&self, index: usize) -> bool {
        index > 0
            && self.packets[index].kind.is_column()
            && self.packets[index - 1].kind == BusPacketType::Activate
            && self.packets[index - 1].transaction_id == self.packets[index].transaction_id
    }

    pub fn get(&self, index: usize) -> Option<&BusPacket> {
        self.packets.get(index)
    }

    pub fn remove(&mut self, index: usize) -> Option<BusPacket> {
        self.packets.remove(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BusPacket> {
        self.packets.iter()
    }

    pub fn len(&self) -> usize {
        self.packets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }

    /// ACTIVATEs still waiting, i.e. admitted transactions whose row has not
    /// been opened yet.
    pub fn pending_activates(&self) -> usize {
        self.packets
            .iter()
            .filter(|p| p.kind == BusPacketType::Activate)
            .count()
    }
}
