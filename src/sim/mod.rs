//! Simulation harness.
//!
//! Drives a set of DRAM channels from a synthetic request stream and collects
//! completions.
//!
//! * `driver`: the cycle loop and end-of-run summary.
//! * `generator`: synthetic transaction streams.
//! * `trace`: the completion sink trait and its in-memory recorder.

pub mod driver;
pub mod generator;
pub mod trace;

pub use driver::{RunSummary, Simulation};
pub use generator::{AccessPattern, RequestGenerator};
pub use trace::{CompletedEvent, EventSink, LatencyRecorder};
