//! End-to-end simulation tests.

use dram_channel_sim::common::TransactionType;
use dram_channel_sim::config::Config;
use dram_channel_sim::dram::address::AddressMapper;
use dram_channel_sim::dram::packet::Transaction;
use dram_channel_sim::sim::{AccessPattern, CompletedEvent, EventSink, LatencyRecorder, RequestGenerator, Simulation};

/// Creates a two-channel system with short timings.
fn create_system_config() -> Config {
    let mut config = Config::default();
    config.geometry.num_channels = 2;
    config.geometry.num_ranks = 2;
    config.geometry.mapping_scheme = "RW_BK_RK_CLH_CH_CLL_BY".to_string();
    config.timing.t_ck = 1.0;
    config.timing.refresh_period_ns = 2000.0;
    config
}

/// Runs `count` requests of `pattern` to completion.
fn run_pattern(config: &Config, pattern: AccessPattern, count: u64) -> (Simulation, LatencyRecorder) {
    let mut sim = Simulation::new(config).unwrap();
    let mut requests = RequestGenerator::new(pattern, sim.mapper(), config.geometry.transaction_size, count)
        .with_read_percent(70)
        .with_stride(4096);
    let mut recorder = LatencyRecorder::new();

    sim.run(&mut requests, &mut recorder, 1_000_000).unwrap();
    (sim, recorder)
}

/// Tests that a sequential stream completes every transaction.
#[test]
fn test_sequential_run_completes() {
    let config = create_system_config();
    let (sim, recorder) = run_pattern(&config, AccessPattern::Sequential, 500);
    let summary = sim.summary();

    assert!(sim.is_idle());
    assert_eq!(summary.transactions_admitted, 500);
    assert_eq!(summary.completions(), 500);
    assert_eq!(summary.reads_completed, 350);
    assert_eq!(summary.writes_completed, 150);
    assert_eq!(summary.bytes_transferred, 500 * 64);
    assert_eq!(recorder.len(), 500);
    assert!(summary.bandwidth_gbps > 0.0);
    assert!(summary.average_latency > 0.0);
    assert!(summary.max_latency as f64 >= summary.average_latency);
}

/// Tests that sequential cache lines are spread over both channels.
#[test]
fn test_channel_routing() {
    let config = create_system_config();
    let (sim, recorder) = run_pattern(&config, AccessPattern::Sequential, 100);

    let on_channel = |ch: usize| recorder.events().iter().filter(|e| e.channel == ch).count();
    assert_eq!(on_channel(0), 50);
    assert_eq!(on_channel(1), 50);

    for channel in sim.channels() {
        let s = &channel.controller.stats;
        assert_eq!(s.reads_admitted + s.writes_admitted, 50);
    }
}

/// Tests that row conflicts are slower than streaming over all banks.
#[test]
fn test_row_conflict_slower() {
    let config = create_system_config();
    let (streaming, _) = run_pattern(&config, AccessPattern::Sequential, 200);
    let (conflicting, recorder) = run_pattern(&config, AccessPattern::RowConflict, 200);

    assert_eq!(conflicting.summary().completions(), 200);
    assert!(conflicting.cycle() > streaming.cycle());
    assert!(recorder.events().iter().all(|e| e.channel == 0));
}

/// Tests completion events and latency bookkeeping.
#[test]
fn test_completion_events() {
    let config = create_system_config();
    let (_, recorder) = run_pattern(&config, AccessPattern::Strided, 100);

    for event in recorder.events() {
        assert!(event.completed_at > event.admitted_at);
        assert_eq!(event.bytes, 64);
    }
    let p50 = recorder.percentile(50.0).unwrap();
    let p99 = recorder.percentile(99.0).unwrap();
    assert!(p50 <= p99);
    assert!(recorder.average_latency(TransactionType::Read) > 0.0);

    let mut ids: Vec<u64> = recorder.events().iter().map(|e| e.transaction_id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..100).collect::<Vec<_>>());
}

/// Tests that the run stops at the cycle limit.
#[test]
fn test_cycle_limit() {
    let config = create_system_config();
    let mut sim = Simulation::new(&config).unwrap();
    let mut requests = RequestGenerator::new(AccessPattern::RowConflict, sim.mapper(), 64, 10_000);
    let mut recorder = LatencyRecorder::new();

    let summary = sim.run(&mut requests, &mut recorder, 500).unwrap();
    assert_eq!(summary.cycles, 500);
    assert!(summary.completions() < 10_000);
    assert!(summary.admission_stalls > 0);
}

/// Tests that a custom sink sees every completion.
#[test]
fn test_custom_sink() {
    #[derive(Default)]
    struct Counter {
        reads: u64,
        writes: u64,
    }

    impl EventSink for Counter {
        fn record(&mut self, event: CompletedEvent) {
            match event.kind {
                TransactionType::Read => self.reads += 1,
                TransactionType::Write => self.writes += 1,
            }
        }
    }

    let config = create_system_config();
    let mut sim = Simulation::new(&config).unwrap();
    let mut requests = vec![
        Transaction::read(0, 0x0, 64),
        Transaction::write(1, 0x40, 64),
        Transaction::read(2, 0x80, 64),
    ]
    .into_iter();
    let mut counter = Counter::default();

    sim.run(&mut requests, &mut counter, 10_000).unwrap();
    assert_eq!((counter.reads, counter.writes), (2, 1));
}

/// Tests that invalid transactions abort the run with a configuration error.
#[test]
fn test_invalid_transaction_aborts() {
    let config = create_system_config();
    let mut sim = Simulation::new(&config).unwrap();
    let mut requests = vec![Transaction::read(0, 0, 30)].into_iter();

    let err = sim.run(&mut requests, &mut LatencyRecorder::new(), 100).unwrap_err();
    assert!(err.is_config());
}

/// Tests the request generator's address patterns and mix.
#[test]
fn test_generator_patterns() {
    let config = create_system_config();
    let mapper = AddressMapper::from_config(&config).unwrap();

    let sequential: Vec<_> = RequestGenerator::new(AccessPattern::Sequential, &mapper, 64, 4).collect();
    assert_eq!(sequential.iter().map(|t| t.address).collect::<Vec<_>>(), vec![0, 64, 128, 192]);

    let strided: Vec<_> = RequestGenerator::new(AccessPattern::Strided, &mapper, 64, 3)
        .with_stride(4096)
        .collect();
    assert_eq!(strided.iter().map(|t| t.address).collect::<Vec<_>>(), vec![0, 4096, 8192]);

    let conflicts: Vec<_> = RequestGenerator::new(AccessPattern::RowConflict, &mapper, 64, 5).collect();
    for (i, t) in conflicts.iter().enumerate() {
        let mapped = mapper.map(t.address);
        assert_eq!((mapped.channel, mapped.rank, mapped.bank), (0, 0, 0));
        assert_eq!(mapped.row, i as u64);
    }

    let mixed: Vec<_> = RequestGenerator::new(AccessPattern::Sequential, &mapper, 64, 200)
        .with_read_percent(25)
        .with_logic_every(10)
        .collect();
    let reads = mixed.iter().filter(|t| t.kind == TransactionType::Read).count();
    assert_eq!(reads, 50);
    assert_eq!(mixed.iter().filter(|t| t.from_logic).count(), 20);
    assert!(mixed[9].from_logic);

    let mut generator = RequestGenerator::new(AccessPattern::Sequential, &mapper, 64, 2);
    assert_eq!(generator.remaining(), 2);
    generator.next();
    generator.next();
    assert!(generator.is_exhausted());
    assert!(generator.next().is_none());
}

/// Tests that the per-channel reports serialize to JSON.
#[test]
fn test_reports_json() {
    let config = create_system_config();
    let (sim, _) = run_pattern(&config, AccessPattern::Sequential, 50);

    let reports = sim.reports();
    assert_eq!(reports.len(), 2);

    let json = serde_json::to_value(&reports).unwrap();
    assert_eq!(json[1]["channel"], 1);
    assert!(json[0]["stats"]["rank_energy"].is_array());

    let summary = serde_json::to_value(sim.summary()).unwrap();
    assert_eq!(summary["transactions_admitted"], 50);
}
