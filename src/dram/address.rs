//! Physical Address Mapping.
//!
//! Translates a physical address into the channel, rank, bank, row and column
//! it lives at. The eight supported schemes are pure bit layouts: each one is
//! an ordered list of fields, least-significant first, consumed by a single
//! shift-and-mask routine. Schemes whose name contains `CLH`/`CLL` split the
//! column into a high part and the low part that addresses bytes within a
//! cache line; those low bits sit below the channel field.

use crate::common::ConfigError;
use crate::config::{Config, GeometryConfig};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// A bit field of a physical address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum AddressField {
    /// Byte within one bus transfer.
    ByteOffset,
    /// Column bits below the channel field (split-column schemes).
    ColumnLow,
    Channel,
    Rank,
    Bank,
    Row,
    /// Column bits above the channel field (split-column schemes).
    ColumnHigh,
    /// The whole column (non-split schemes).
    Column,
}

use AddressField::*;

/// Address-mapping scheme, named most-significant field first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum MappingScheme {
    /// bank : col_high : row : rank : chan : col_low : byte
    BkClhRwRkChCllBy,
    /// col_high : row : rank : bank : chan : col_low : byte
    ClhRwRkBkChCllBy,
    /// rank : bank : row : col_high : chan : col_low : byte
    RkBkRwClhChCllBy,
    /// row : chan : bank : rank : col : byte
    RwChBkRkClBy,
    /// row : bank : rank : chan : col : byte
    RwBkRkChClBy,
    /// row : bank : rank : col_high : chan : col_low : byte
    RwBkRkClhChCllBy,
    /// row : col_high : bank : rank : chan : col_low : byte
    RwClhBkRkChCllBy,
    /// chan : row : bank : rank : col : byte
    ChRwBkRkClBy,
}

impl MappingScheme {
    /// Every scheme, in selector order.
    pub const ALL: [MappingScheme; 8] = [
        MappingScheme::BkClhRwRkChCllBy,
        MappingScheme::ClhRwRkBkChCllBy,
        MappingScheme::RkBkRwClhChCllBy,
        MappingScheme::RwChBkRkClBy,
        MappingScheme::RwBkRkChClBy,
        MappingScheme::RwBkRkClhChCllBy,
        MappingScheme::RwClhBkRkChCllBy,
        MappingScheme::ChRwBkRkClBy,
    ];

    /// Selects a scheme by its numeric selector.
    pub fn from_index(index: usize) -> Result<Self, ConfigError> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| ConfigError::UnknownMappingScheme(index.to_string()))
    }

    /// The configuration name of the scheme.
    pub fn name(self) -> &'static str {
        match self {
            MappingScheme::BkClhRwRkChCllBy => "BK_CLH_RW_RK_CH_CLL_BY",
            MappingScheme::ClhRwRkBkChCllBy => "CLH_RW_RK_BK_CH_CLL_BY",
            MappingScheme::RkBkRwClhChCllBy => "RK_BK_RW_CLH_CH_CLL_BY",
            MappingScheme::RwChBkRkClBy => "RW_CH_BK_RK_CL_BY",
            MappingScheme::RwBkRkChClBy => "RW_BK_RK_CH_CL_BY",
            MappingScheme::RwBkRkClhChCllBy => "RW_BK_RK_CLH_CH_CLL_BY",
            MappingScheme::RwClhBkRkChCllBy => "RW_CLH_BK_RK_CH_CLL_BY",
            MappingScheme::ChRwBkRkClBy => "CH_RW_BK_RK_CL_BY",
        }
    }

    /// Field order, least-significant first.
    pub fn layout(self) -> &'static [AddressField] {
        match self {
            MappingScheme::BkClhRwRkChCllBy => &[ByteOffset, ColumnLow, Channel, Rank, Row, ColumnHigh, Bank],
            MappingScheme::ClhRwRkBkChCllBy => &[ByteOffset, ColumnLow, Channel, Bank, Rank, Row, ColumnHigh],
            MappingScheme::RkBkRwClhChCllBy => &[ByteOffset, ColumnLow, Channel, ColumnHigh, Row, Bank, Rank],
            MappingScheme::RwChBkRkClBy => &[ByteOffset, Column, Rank, Bank, Channel, Row],
            MappingScheme::RwBkRkChClBy => &[ByteOffset, Column, Channel, Rank, Bank, Row],
            MappingScheme::RwBkRkClhChCllBy => &[ByteOffset, ColumnLow, Channel, ColumnHigh, Rank, Bank, Row],
            MappingScheme::RwClhBkRkChCllBy => &[ByteOffset, ColumnLow, Channel, Rank, Bank, ColumnHigh, Row],
            MappingScheme::ChRwBkRkClBy => &[ByteOffset, Column, Rank, Bank, Row, Channel],
        }
    }
}

impl FromStr for MappingScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|scheme| scheme.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownMappingScheme(s.to_string()))
    }
}

impl fmt::Display for MappingScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Bit widths of every address field for one geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldWidths {
    pub byte_offset: u32,
    pub column_low: u32,
    pub channel: u32,
    pub rank: u32,
    pub bank: u32,
    pub row: u32,
    /// Width of the whole column field.
    pub column: u32,
}

impl FieldWidths {
    /// Derives widths from a geometry whose sizes are powers of two.
    pub fn from_geometry(g: &GeometryConfig) -> Result<Self, ConfigError> {
        let log2 = |field: &'static str, value: u64| {
            if value.is_power_of_two() {
                Ok(value.trailing_zeros())
            } else {
                Err(ConfigError::NotPowerOfTwo { field, value })
            }
        };

        let byte_offset = log2("geometry.bus_alignment_size", g.bus_alignment_size)?;
        let cache_offset = log2("geometry.cache_line_size", g.cache_line_size)?;
        let column = log2("geometry.num_cols", g.num_cols)?;
        let column_low = cache_offset.checked_sub(byte_offset).ok_or_else(|| ConfigError::InvalidValue {
            field: "geometry.cache_line_size",
            reason: "smaller than the bus alignment".to_string(),
        })?;
        if column_low > column {
            return Err(ConfigError::InvalidValue {
                field: "geometry.num_cols",
                reason: format!("fewer than the {} low column bits of a cache line", column_low),
            });
        }

        Ok(Self {
            byte_offset,
            column_low,
            channel: log2("geometry.num_channels", g.num_channels)?,
            rank: log2("geometry.num_ranks", g.num_ranks)?,
            bank: log2("geometry.num_banks", g.num_banks)?,
            row: log2("geometry.num_rows", g.num_rows)?,
            column,
        })
    }

    /// Width of one field.
    pub fn width(&self, field: AddressField) -> u32 {
        match field {
            ByteOffset => self.byte_offset,
            ColumnLow => self.column_low,
            Channel => self.channel,
            Rank => self.rank,
            Bank => self.bank,
            Row => self.row,
            ColumnHigh => self.column - self.column_low,
            Column => self.column,
        }
    }
}

/// A physical address split into its DRAM coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct DramAddress {
    pub channel: u64,
    pub rank: u64,
    pub bank: u64,
    pub row: u64,
    pub column: u64,
    pub byte_offset: u64,
}

/// Maps physical addresses under one fixed scheme and geometry.
#[derive(Clone, Debug)]
pub struct AddressMapper {
    scheme: MappingScheme,
    widths: FieldWidths,
}

impl AddressMapper {
    /// Creates a mapper for `scheme` over `geometry`.
    pub fn new(scheme: MappingScheme, geometry: &GeometryConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            scheme,
            widths: FieldWidths::from_geometry(geometry)?,
        })
    }

    /// Creates the mapper described by a full configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(config.mapping_scheme()?, &config.geometry)
    }

    pub fn scheme(&self) -> MappingScheme {
        self.scheme
    }

    pub fn widths(&self) -> FieldWidths {
        self.widths
    }

    /// Number of address bits the scheme consumes. Higher bits are ignored.
    pub fn address_bits(&self) -> u32 {
        self.scheme.layout().iter().map(|&f| self.widths.width(f)).sum()
    }

    /// Splits `address` into DRAM coordinates.
    pub fn map(&self, address: u64) -> DramAddress {
        let mut rest = address;
        let mut out = DramAddress::default();
        let mut column_low = 0;
        let mut column_high = 0;

        for &field in self.scheme.layout() {
            let width = self.widths.width(field);
            let value = rest & low_mask(width);
            rest = rest.checked_shr(width).unwrap_or(0);

            match field {
                ByteOffset => out.byte_offset = value,
                ColumnLow => column_low = value,
                Channel => out.channel = value,
                Rank => out.rank = value,
                Bank => out.bank = value,
                Row => out.row = value,
                ColumnHigh => column_high = value,
                Column => out.column = value,
            }
        }

        if self.is_split_column() {
            out.column = (column_high << self.widths.column_low) | column_low;
        }

        log::trace!(
            "mapped {:#x} -> ch:{} rk:{} bk:{} rw:{:#x} cl:{:#x}",
            address,
            out.channel,
            out.rank,
            out.bank,
            out.row,
            out.column
        );
        out
    }

    /// Rebuilds the physical address of `coords`. Inverse of `map` for
    /// every address below `2^address_bits()`.
    pub fn unmap(&self, coords: &DramAddress) -> u64 {
        let mut address = 0u64;
        let mut shift = 0u32;

        for &field in self.scheme.layout() {
            let width = self.widths.width(field);
            let value = match field {
                ByteOffset => coords.byte_offset,
                ColumnLow => coords.column,
                Channel => coords.channel,
                Rank => coords.rank,
                Bank => coords.bank,
                Row => coords.row,
                ColumnHigh => coords.column >> self.widths.column_low,
                Column => coords.column,
            };
            address |= (value & low_mask(width)).checked_shl(shift).unwrap_or(0);
            shift += width;
        }
        address
    }

    /// Bit mask of every field in the scheme.
    pub fn field_masks(&self) -> Vec<(AddressField, u64)> {
        let mut shift = 0u32;
        self.scheme
            .layout()
            .iter()
            .map(|&field| {
                let width = self.widths.width(field);
                let mask = low_mask(width).checked_shl(shift).unwrap_or(0);
                shift += width;
                (field, mask)
            })
            .collect()
    }

    fn is_split_column(&self) -> bool {
        self.scheme.layout().contains(&ColumnHigh)
    }
}

fn low_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}
