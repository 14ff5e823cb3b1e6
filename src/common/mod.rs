//! Common types used throughout the DRAM channel simulator.
//!
//! This module provides the request and command classifications and the
//! error types shared by the configuration layer, the scheduler and the
//! simulation driver.

/// Transaction and bus packet type definitions.
pub mod data;

/// Error types for configuration defects and broken invariants.
pub mod error;

pub use data::{BusPacketType, TransactionType};
pub use error::{ConfigError, InvariantError, SimError, SimResult};
