//! Integration tests for the command queue and admission policies.

use dram_channel_sim::common::BusPacketType;
use dram_channel_sim::dram::packet::BusPacket;
use dram_channel_sim::dram::queue::{AdmissionPolicy, CommandQueue, LogicFirst, Placement, StrictFifo};

/// Creates the ACTIVATE/READ pair of transaction `id`.
fn create_pair(id: u64, from_logic: bool) -> (BusPacket, BusPacket) {
    let read = BusPacket {
        kind: BusPacketType::Read,
        transaction_id: Some(id),
        rank: 0,
        bank: id as usize % 8,
        row: id,
        column: 0,
        burst_length: 4,
        channel: 0,
        port: 0,
        address: id * 64,
        from_logic,
    };
    (read.with_kind(BusPacketType::Activate), read)
}

/// Lists the queue as (kind, transaction id) pairs.
fn contents(queue: &CommandQueue) -> Vec<(BusPacketType, u64)> {
    queue
        .iter()
        .map(|p| (p.kind, p.transaction_id.unwrap_or(u64::MAX)))
        .collect()
}

/// Tests FIFO order under the strict policy.
#[test]
fn test_strict_fifo_order() {
    let mut queue = CommandQueue::new(Box::new(StrictFifo));
    let (a, r) = create_pair(1, false);
    queue.admit(a, r);
    let (a, r) = create_pair(2, true);
    queue.admit(a, r);

    assert_eq!(
        contents(&queue),
        vec![
            (BusPacketType::Activate, 1),
            (BusPacketType::Read, 1),
            (BusPacketType::Activate, 2),
            (BusPacketType::Read, 2),
        ]
    );
}

/// Tests that logic-originated pairs are placed at the front, ACTIVATE first.
#[test]
fn test_logic_first_front_insertion() {
    let mut queue = CommandQueue::new(Box::new(LogicFirst));
    let (a, r) = create_pair(1, false);
    queue.admit(a, r);
    let (a, r) = create_pair(2, true);
    queue.admit(a, r);
    let (a, r) = create_pair(3, false);
    queue.admit(a, r);

    assert_eq!(
        contents(&queue),
        vec![
            (BusPacketType::Activate, 2),
            (BusPacketType::Read, 2),
            (BusPacketType::Activate, 1),
            (BusPacketType::Read, 1),
            (BusPacketType::Activate, 3),
            (BusPacketType::Read, 3),
        ]
    );
}

/// Tests the placement decisions of both built-in policies.
#[test]
fn test_policy_placement() {
    let (_, normal) = create_pair(1, false);
    let (_, logic) = create_pair(2, true);

    assert_eq!(StrictFifo.placement(&logic), Placement::Back);
    assert_eq!(LogicFirst.placement(&normal), Placement::Back);
    assert_eq!(LogicFirst.placement(&logic), Placement::Front);
}

/// Tests that a custom policy can be plugged in.
#[test]
fn test_custom_policy() {
    #[derive(Debug)]
    struct WritesFirst;

    impl AdmissionPolicy for WritesFirst {
        fn placement(&self, packet: &BusPacket) -> Placement {
            if packet.kind == BusPacketType::Write {
                Placement::Front
            } else {
                Placement::Back
            }
        }
    }

    let mut queue = CommandQueue::new(Box::new(WritesFirst));
    let (a, r) = create_pair(1, false);
    queue.admit(a, r);
    let (a, r) = create_pair(2, false);
    queue.admit(a, r.with_kind(BusPacketType::Write));

    assert_eq!(queue.get(1).map(|p| p.kind), Some(BusPacketType::Write));
    assert_eq!(queue.get(1).and_then(|p| p.transaction_id), Some(2));
}

/// Tests detection of a column command directly behind its own ACTIVATE.
#[test]
fn test_waits_on_own_activate() {
    let mut queue = CommandQueue::new(Box::new(StrictFifo));
    let (a, r) = create_pair(1, false);
    queue.admit(a, r);
    let (a, r) = create_pair(2, false);
    queue.admit(a, r);

    assert!(!queue.waits_on_own_activate(0));
    assert!(queue.waits_on_own_activate(1));
    assert!(!queue.waits_on_own_activate(2));
    assert!(queue.waits_on_own_activate(3));

    queue.remove(0);
    assert!(!queue.waits_on_own_activate(0));
    assert!(!queue.waits_on_own_activate(1));
    assert!(queue.waits_on_own_activate(2));
}

/// Tests queue length and pending ACTIVATE counting.
#[test]
fn test_pending_activates() {
    let mut queue = CommandQueue::new(Box::new(StrictFifo));
    assert!(queue.is_empty());

    for id in 0..3 {
        let (a, r) = create_pair(id, false);
        queue.admit(a, r);
    }
    assert_eq!(queue.len(), 6);
    assert_eq!(queue.pending_activates(), 3);

    let removed = queue.remove(2).unwrap();
    assert_eq!(removed.kind, BusPacketType::Activate);
    assert_eq!(queue.pending_activates(), 2);
    assert_eq!(queue.len(), 5);
}
