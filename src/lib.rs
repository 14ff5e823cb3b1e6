//! DRAM Channel Scheduler Simulator Library.
//!
//! This crate implements a cycle-accurate command scheduler for one or more
//! DRAM channels. Each channel admits cache-line transactions, splits them
//! into ACTIVATE and auto-precharge column commands, and issues at most one
//! command per clock under the DDR timing constraints, with periodic
//! all-bank refresh.
//!
//! # Architecture
//!
//! * **Scheduler**: per-channel bank state machines, timing-legality checks,
//!   refresh arbitration and a write-data delay pipeline.
//! * **Address Mapping**: eight declarative physical-address layouts.
//! * **Harness**: synthetic request streams driving every channel in lock step.
//!
//! # Modules
//!
//! * `common`: Shared command/transaction types and error handling.
//! * `config`: Configuration loading, defaults and validation.
//! * `dram`: Channel model and command scheduler.
//! * `sim`: Simulation driver, request generators and completion sinks.
//! * `stats`: Statistics collection and reporting.

/// Shared types and error handling.
///
/// Provides the transaction and bus-packet kinds used throughout the
/// simulator, and the fatal error classes every fallible operation returns.
pub mod common;

/// Configuration system for geometry, timing, power and controller settings.
///
/// Loads and parses TOML configuration files; every field has a DDR3-like
/// default.
pub mod config;

/// DRAM channel model.
///
/// Address mapping, bank state, timing legality, refresh and the per-cycle
/// command scheduler, together with the concrete channel data path.
pub mod dram;

/// Simulation harness.
///
/// Generates synthetic traffic, routes it to channels and records
/// completions.
pub mod sim;

/// Statistics collection and reporting.
///
/// Tracks queue occupancy, bank-state residency, command counts and energy
/// per channel.
pub mod stats;
