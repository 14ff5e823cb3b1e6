use crate::common::{ConfigError, SimResult};
use crate::dram::address::MappingScheme;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const NUM_CHANNELS: u64 = 4;
const NUM_RANKS: u64 = 2;
const NUM_BANKS: u64 = 8;
const NUM_ROWS: u64 = 16384;
const NUM_COLS: u64 = 1024;
const DEVICE_WIDTH: u64 = 8;
const DRAM_BUS_WIDTH: u64 = 16;
const BUS_ALIGNMENT_SIZE: u64 = 8;
const CACHE_LINE_SIZE: u64 = 64;
const TRANSACTION_SIZE: u64 = 64;

const REFRESH_PERIOD_NS: f64 = 7800.0;
const RETURN_QUEUE_CAPACITY: u64 = 1024;
const MAX_PENDING_TRANSACTIONS: usize = 32;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub power: PowerConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
}

impl Config {
    /// Parses a configuration from TOML text. Missing sections and fields
    /// take their defaults.
    pub fn from_toml_str(s: &str) -> SimResult<Self> {
        let config: Config = toml::from_str(s)?;
        Ok(config)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> SimResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Resolves the configured address-mapping scheme.
    pub fn mapping_scheme(&self) -> Result<MappingScheme, ConfigError> {
        self.geometry.mapping_scheme.parse()
    }

    /// Checks every constraint the scheduler and address mapper rely on.
    ///
    /// # Returns
    ///
    /// The first violated constraint as a `ConfigError`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let g = &self.geometry;
        for (field, value) in [
            ("geometry.num_channels", g.num_channels),
            ("geometry.num_ranks", g.num_ranks),
            ("geometry.num_banks", g.num_banks),
            ("geometry.num_rows", g.num_rows),
            ("geometry.num_cols", g.num_cols),
            ("geometry.bus_alignment_size", g.bus_alignment_size),
            ("geometry.cache_line_size", g.cache_line_size),
        ] {
            if !value.is_power_of_two() {
                return Err(ConfigError::NotPowerOfTwo { field, value });
            }
        }

        if g.cache_line_size < g.bus_alignment_size {
            return Err(ConfigError::InvalidValue {
                field: "geometry.cache_line_size",
                reason: format!(
                    "{} is smaller than the {}-byte bus alignment",
                    g.cache_line_size, g.bus_alignment_size
                ),
            });
        }

        let low_col_bits = g.cache_line_size.trailing_zeros() - g.bus_alignment_size.trailing_zeros();
        if low_col_bits > g.num_cols.trailing_zeros() {
            return Err(ConfigError::InvalidValue {
                field: "geometry.num_cols",
                reason: format!(
                    "{} columns cannot hold the {} low column bits of a cache line",
                    g.num_cols, low_col_bits
                ),
            });
        }

        if g.dram_bus_width == 0 || g.transaction_size == 0 || g.transaction_size % g.dram_bus_width != 0 {
            return Err(ConfigError::InvalidValue {
                field: "geometry.transaction_size",
                reason: format!(
                    "{} is not a non-zero multiple of the {}-byte bus",
                    g.transaction_size, g.dram_bus_width
                ),
            });
        }

        if g.device_width == 0 || g.devices_per_rank() == 0 {
            return Err(ConfigError::InvalidValue {
                field: "geometry.device_width",
                reason: format!(
                    "x{} devices cannot populate a {}-byte DDR bus",
                    g.device_width, g.dram_bus_width
                ),
            });
        }

        if self.timing.t_ck.is_nan() || self.timing.t_ck <= 0.0 {
            return Err(ConfigError::InvalidValue {
                field: "timing.t_ck",
                reason: format!("clock period must be positive (got {})", self.timing.t_ck),
            });
        }

        if self.timing.refresh_interval_cycles() == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timing.refresh_period_ns",
                reason: format!(
                    "{} ns is shorter than one {} ns clock",
                    self.timing.refresh_period_ns, self.timing.t_ck
                ),
            });
        }

        if self.controller.return_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "controller.return_queue_capacity",
                reason: "capacity must be non-zero".to_string(),
            });
        }

        self.mapping_scheme()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Log every issued command at info level instead of debug.
    #[serde(default)]
    pub trace_commands: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeometryConfig {
    #[serde(default = "default_num_channels")]
    pub num_channels: u64,

    #[serde(default = "default_num_ranks")]
    pub num_ranks: u64,

    #[serde(default = "default_num_banks")]
    pub num_banks: u64,

    #[serde(default = "default_num_rows")]
    pub num_rows: u64,

    #[serde(default = "default_num_cols")]
    pub num_cols: u64,

    /// Data pins per device.
    #[serde(default = "default_device_width")]
    pub device_width: u64,

    /// Bytes transferred per clock on the DDR data bus.
    #[serde(default = "default_dram_bus_width")]
    pub dram_bus_width: u64,

    /// Bytes addressed by the low-order byte-offset bits.
    #[serde(default = "default_bus_alignment_size")]
    pub bus_alignment_size: u64,

    #[serde(default = "default_cache_line_size")]
    pub cache_line_size: u64,

    #[serde(default = "default_transaction_size")]
    pub transaction_size: u64,

    #[serde(default = "default_mapping_scheme")]
    pub mapping_scheme: String,
}

impl GeometryConfig {
    /// Number of devices ganged into one rank. `dram_bus_width` counts both
    /// clock edges, hence the halving.
    pub fn devices_per_rank(&self) -> u64 {
        if self.device_width == 0 {
            return 0;
        }
        (self.dram_bus_width / 2 * 8) / self.device_width
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            num_channels: default_num_channels(),
            num_ranks: default_num_ranks(),
            num_banks: default_num_banks(),
            num_rows: default_num_rows(),
            num_cols: default_num_cols(),
            device_width: default_device_width(),
            dram_bus_width: default_dram_bus_width(),
            bus_alignment_size: default_bus_alignment_size(),
            cache_line_size: default_cache_line_size(),
            transaction_size: default_transaction_size(),
            mapping_scheme: default_mapping_scheme(),
        }
    }
}

fn default_num_channels() -> u64 {
    NUM_CHANNELS
}

fn default_num_ranks() -> u64 {
    NUM_RANKS
}

fn default_num_banks() -> u64 {
    NUM_BANKS
}

fn default_num_rows() -> u64 {
    NUM_ROWS
}

fn default_num_cols() -> u64 {
    NUM_COLS
}

fn default_device_width() -> u64 {
    DEVICE_WIDTH
}

fn default_dram_bus_width() -> u64 {
    DRAM_BUS_WIDTH
}

fn default_bus_alignment_size() -> u64 {
    BUS_ALIGNMENT_SIZE
}

fn default_cache_line_size() -> u64 {
    CACHE_LINE_SIZE
}

fn default_transaction_size() -> u64 {
    TRANSACTION_SIZE
}

fn default_mapping_scheme() -> String {
    MappingScheme::RwBkRkChClBy.name().to_string()
}

/// DRAM timing parameters. Everything except `t_ck` and
/// `refresh_period_ns` is in clock cycles.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimingConfig {
    /// Clock period in nanoseconds.
    #[serde(default = "default_t_ck")]
    pub t_ck: f64,

    #[serde(default = "default_t_rc")]
    pub t_rc: u64,

    #[serde(default = "default_t_rcd")]
    pub t_rcd: u64,

    #[serde(default = "default_t_rp")]
    pub t_rp: u64,

    #[serde(default = "default_t_ras")]
    pub t_ras: u64,

    #[serde(default = "default_t_rrd")]
    pub t_rrd: u64,

    #[serde(default = "default_t_faw")]
    pub t_faw: u64,

    #[serde(default = "default_t_ccd")]
    pub t_ccd: u64,

    #[serde(default = "default_t_wtr")]
    pub t_wtr: u64,

    #[serde(default = "default_t_rtp")]
    pub t_rtp: u64,

    #[serde(default = "default_t_cwl")]
    pub t_cwl: u64,

    #[serde(default = "default_t_cl")]
    pub t_cl: u64,

    #[serde(default = "default_t_wr")]
    pub t_wr: u64,

    #[serde(default = "default_t_rtrs")]
    pub t_rtrs: u64,

    #[serde(default = "default_t_rfc")]
    pub t_rfc: u64,

    /// Average refresh interval (tREFI) in nanoseconds.
    #[serde(default = "default_refresh_period")]
    pub refresh_period_ns: f64,
}

impl TimingConfig {
    /// Cycles between two refreshes of the same rank.
    pub fn refresh_interval_cycles(&self) -> u64 {
        if self.t_ck <= 0.0 {
            return 0;
        }
        (self.refresh_period_ns / self.t_ck) as u64
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            t_ck: default_t_ck(),
            t_rc: default_t_rc(),
            t_rcd: default_t_rcd(),
            t_rp: default_t_rp(),
            t_ras: default_t_ras(),
            t_rrd: default_t_rrd(),
            t_faw: default_t_faw(),
            t_ccd: default_t_ccd(),
            t_wtr: default_t_wtr(),
            t_rtp: default_t_rtp(),
            t_cwl: default_t_cwl(),
            t_cl: default_t_cl(),
            t_wr: default_t_wr(),
            t_rtrs: default_t_rtrs(),
            t_rfc: default_t_rfc(),
            refresh_period_ns: default_refresh_period(),
        }
    }
}

fn default_t_ck() -> f64 {
    1.5
}

fn default_t_rc() -> u64 {
    34
}

fn default_t_rcd() -> u64 {
    10
}

fn default_t_rp() -> u64 {
    10
}

fn default_t_ras() -> u64 {
    24
}

fn default_t_rrd() -> u64 {
    4
}

fn default_t_faw() -> u64 {
    20
}

fn default_t_ccd() -> u64 {
    4
}

fn default_t_wtr() -> u64 {
    5
}

fn default_t_rtp() -> u64 {
    5
}

fn default_t_cwl() -> u64 {
    7
}

fn default_t_cl() -> u64 {
    10
}

fn default_t_wr() -> u64 {
    10
}

fn default_t_rtrs() -> u64 {
    1
}

fn default_t_rfc() -> u64 {
    74
}

fn default_refresh_period() -> f64 {
    REFRESH_PERIOD_NS
}

/// Device current draw in mA, used for energy bookkeeping only.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PowerConfig {
    #[serde(default = "default_idd0")]
    pub idd0: u64,

    #[serde(default = "default_idd2n")]
    pub idd2n: u64,

    #[serde(default = "default_idd3n")]
    pub idd3n: u64,

    #[serde(default = "default_idd4r")]
    pub idd4r: u64,

    #[serde(default = "default_idd4w")]
    pub idd4w: u64,

    #[serde(default = "default_idd5b")]
    pub idd5b: u64,

    #[serde(default = "default_vdd")]
    pub vdd: f64,

    /// Device burst length (BL) used for burst energy.
    #[serde(default = "default_burst_length")]
    pub burst_length: u64,
}

impl Default for PowerConfig {
    fn default() -> Self {
        Self {
            idd0: default_idd0(),
            idd2n: default_idd2n(),
            idd3n: default_idd3n(),
            idd4r: default_idd4r(),
            idd4w: default_idd4w(),
            idd5b: default_idd5b(),
            vdd: default_vdd(),
            burst_length: default_burst_length(),
        }
    }
}

fn default_idd0() -> u64 {
    120
}

fn default_idd2n() -> u64 {
    45
}

fn default_idd3n() -> u64 {
    55
}

fn default_idd4r() -> u64 {
    190
}

fn default_idd4w() -> u64 {
    185
}

fn default_idd5b() -> u64 {
    250
}

fn default_vdd() -> f64 {
    1.5
}

fn default_burst_length() -> u64 {
    8
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ControllerConfig {
    /// Queue logic-layer transactions ahead of everything else.
    #[serde(default = "default_give_logic_priority")]
    pub give_logic_priority: bool,

    /// Read-return queue capacity in bytes.
    #[serde(default = "default_return_queue_capacity")]
    pub return_queue_capacity: u64,

    /// Admitted transactions a channel holds before refusing new ones.
    #[serde(default = "default_max_pending")]
    pub max_pending_transactions: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            give_logic_priority: default_give_logic_priority(),
            return_queue_capacity: default_return_queue_capacity(),
            max_pending_transactions: default_max_pending(),
        }
    }
}

fn default_give_logic_priority() -> bool {
    true
}

fn default_return_queue_capacity() -> u64 {
    RETURN_QUEUE_CAPACITY
}

fn default_max_pending() -> usize {
    MAX_PENDING_TRANSACTIONS
}
