//! DRAM Channel Scheduler CLI.
//!
//! The main executable for the simulator. It parses command-line arguments,
//! loads the configuration, drives every channel with a synthetic request
//! stream and prints per-channel statistics.
//!
//! # Usage
//!
//! ```text
//! dram-channel-sim --config configs/default.toml --requests 10000 --pattern row-conflict
//! ```
//!
//! Logging goes through `env_logger`; set `RUST_LOG=debug` to see every
//! issued command.

use clap::Parser;
use std::process;

use dram_channel_sim::common::SimResult;
use dram_channel_sim::config::Config;
use dram_channel_sim::sim::{AccessPattern, LatencyRecorder, RequestGenerator, RunSummary, Simulation};
use dram_channel_sim::stats::ChannelReport;
use serde::Serialize;

/// Command-line arguments for the DRAM channel simulator.
#[derive(Parser, Debug)]
#[command(author, version, about = "Cycle-Accurate DRAM Channel Scheduler")]
struct Args {
    #[arg(short, long, default_value = "configs/default.toml")]
    config: String,

    /// Upper bound on simulated cycles.
    #[arg(long, default_value_t = 1_000_000)]
    cycles: u64,

    /// Number of transactions to generate.
    #[arg(short, long, default_value_t = 10_000)]
    requests: u64,

    #[arg(short, long, value_enum, default_value_t = AccessPattern::Sequential)]
    pattern: AccessPattern,

    /// Byte distance between requests of the strided pattern.
    #[arg(long, default_value_t = 4096)]
    stride: u64,

    #[arg(long, default_value_t = 70)]
    read_percent: u64,

    /// Mark every Nth request as logic-layer originated (0 = never).
    #[arg(long, default_value_t = 0)]
    logic_every: u64,

    /// Print the report as JSON instead of text.
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    config: &'a Config,
    summary: &'a RunSummary,
    latency_p50: Option<u64>,
    latency_p99: Option<u64>,
    channels: &'a [ChannelReport],
}

/// Main entry point for the DRAM channel simulator.
///
/// # Behavior
///
/// 1. **Configuration**: Parses command-line arguments, loads and validates the TOML configuration.
/// 2. **Initialization**: Builds one channel per configured channel and the request generator.
/// 3. **Simulation Loop**: Ticks every channel until the stream drains or the cycle limit is hit.
/// 4. **Teardown**: Prints the run summary and per-channel statistics. Any fatal error exits with status 1.
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("\n[!] FATAL: {}", e);
        process::exit(1);
    }
}

fn run(args: &Args) -> SimResult<()> {
    let config = Config::load(&args.config)?;
    config.validate()?;

    if !args.json {
        print_config(&config);
    }

    let mut sim = Simulation::new(&config)?;
    let mut requests = RequestGenerator::new(args.pattern, sim.mapper(), config.geometry.transaction_size, args.requests)
        .with_stride(args.stride)
        .with_read_percent(args.read_percent)
        .with_logic_every(args.logic_every);
    let mut recorder = LatencyRecorder::new();

    let summary = sim.run(&mut requests, &mut recorder, args.cycles)?;
    let reports = sim.reports();

    if args.json {
        let report = JsonReport {
            config: &config,
            summary: &summary,
            latency_p50: recorder.percentile(50.0),
            latency_p99: recorder.percentile(99.0),
            channels: &reports,
        };
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("\n[!] FATAL: could not serialize report: {}", e);
                process::exit(1);
            }
        }
        return Ok(());
    }

    summary.print();
    if let (Some(p50), Some(p99)) = (recorder.percentile(50.0), recorder.percentile(99.0)) {
        println!("  latency.p50            {} cycles", p50);
        println!("  latency.p99            {} cycles", p99);
    }
    for report in &reports {
        report.print();
    }

    use std::io::Write;
    std::io::stdout().flush().ok();
    Ok(())
}

fn print_config(config: &Config) {
    let g = &config.geometry;
    let t = &config.timing;
    let c = &config.controller;

    println!("Global Configuration");
    println!("--------------------");
    println!("General:");
    println!("  Trace Commands:     {}", config.general.trace_commands);
    println!("Geometry:");
    println!("  Channels:           {}", g.num_channels);
    println!("  Ranks x Banks:      {} x {}", g.num_ranks, g.num_banks);
    println!("  Rows x Cols:        {} x {}", g.num_rows, g.num_cols);
    println!("  Bus Width:          {} B", g.dram_bus_width);
    println!("  Transaction Size:   {} B", g.transaction_size);
    println!("  Mapping Scheme:     {}", g.mapping_scheme);
    println!("Timing:");
    println!("  tCK:                {} ns", t.t_ck);
    println!(
        "  tRCD/tRP/tRAS/tRC:  {}/{}/{}/{}",
        t.t_rcd, t.t_rp, t.t_ras, t.t_rc
    );
    println!("  tCL/tCWL:           {}/{}", t.t_cl, t.t_cwl);
    println!("  tRFC / tREFI:       {} / {} cycles", t.t_rfc, t.refresh_interval_cycles());
    println!("Controller:");
    println!("  Logic Priority:     {}", c.give_logic_priority);
    println!("  Return Queue:       {} B", c.return_queue_capacity);
    println!("  Max Pending:        {}", c.max_pending_transactions);
    println!();
}
