//! Error Types.
//!
//! The simulator distinguishes two classes of fatal failure. Configuration
//! errors are setup or programming defects detected before or during the run;
//! invariant errors mean the scheduler's own bookkeeping has been corrupted.
//! Neither is recoverable: a run that hits one must stop, because its timing
//! results can no longer be trusted. Backpressure is not an error and never
//! shows up here.

use crate::common::data::BusPacketType;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type SimResult<T> = Result<T, SimError>;

/// Setup or programming defect.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The named address-mapping scheme does not exist.
    #[error("unknown address mapping scheme '{0}'")]
    UnknownMappingScheme(String),

    /// A geometry parameter that is used as a bit field is not a power of two.
    #[error("{field} must be a non-zero power of two (got {value})")]
    NotPowerOfTwo { field: &'static str, value: u64 },

    /// A parameter is outside its legal range.
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    /// A packet type the scheduler never queues reached the legality checker
    /// or the issue logic.
    #[error("unexpected {0} packet in the command scheduler")]
    UnexpectedPacket(BusPacketType),

    /// A transaction whose size does not map onto whole bus bursts.
    #[error("transaction {id}: size {size} is not a non-zero multiple of the {bus_width}-byte bus")]
    InvalidTransactionSize { id: u64, size: u64, bus_width: u64 },
}

/// Broken scheduler bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantError {
    /// A column command issued with no admitted transaction waiting.
    #[error("cycle {cycle}: pending-activate counter would go negative")]
    PendingActivateUnderflow { cycle: u64 },

    /// Read data returned that was never requested.
    #[error("cycle {cycle}: outstanding-read counter would go negative")]
    OutstandingReadUnderflow { cycle: u64 },

    /// A refresh was applied while a bank of the rank was not idle.
    #[error("cycle {cycle}: refresh issued to rank {rank} while bank {bank} is busy")]
    RefreshWithBusyBank { cycle: u64, rank: usize, bank: usize },
}

/// Top-level simulator error.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantError),

    #[error("could not read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl SimError {
    /// Returns `true` for configuration-class failures, including unreadable
    /// or malformed configuration files.
    pub fn is_config(&self) -> bool {
        matches!(self, SimError::Config(_) | SimError::Io(_) | SimError::Parse(_))
    }

    /// Returns `true` for broken-invariant failures.
    pub fn is_invariant(&self) -> bool {
        matches!(self, SimError::Invariant(_))
    }
}
