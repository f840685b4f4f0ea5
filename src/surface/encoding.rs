//! Surface hex — the ingest counter followed by raw storage sites
//!
//! The first `dstream_t_bitwidth` bits hold the counter big-endian; the
//! storage sites follow, `differentia_bit_width` bits each, packed
//! most-significant-bit first and zero-padded to a whole byte.

use serde::{Deserialize, Serialize};

use super::{HereditaryStratigraphicSurface, SurfaceConfig, SurfaceError};
use crate::serialization::bits;

/// Bit positions of each field within a surface hex string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceHexLayout {
    pub dstream_t_bitoffset: usize,
    pub dstream_t_bitwidth: usize,
    pub dstream_storage_bitoffset: usize,
    pub dstream_storage_bitwidth: usize,
}

impl SurfaceHexLayout {
    pub const DSTREAM_T_BITWIDTH: usize = 32;

    pub fn for_config(config: &SurfaceConfig) -> Self {
        Self {
            dstream_t_bitoffset: 0,
            dstream_t_bitwidth: Self::DSTREAM_T_BITWIDTH,
            dstream_storage_bitoffset: Self::DSTREAM_T_BITWIDTH,
            dstream_storage_bitwidth: config.storage_capacity
                * config.differentia_bit_width as usize,
        }
    }

    /// Hex digits needed for the whole string
    pub fn hex_len(&self) -> usize {
        2 * (self.dstream_storage_bitoffset + self.dstream_storage_bitwidth).div_ceil(8)
    }
}

impl HereditaryStratigraphicSurface {
    pub fn hex_layout(&self) -> SurfaceHexLayout {
        SurfaceHexLayout::for_config(&self.config())
    }

    pub fn to_hex(&self) -> Result<String, SurfaceError> {
        let counter = u32::try_from(self.dstream_t()).map_err(|_| SurfaceError::CounterOverflow {
            value: self.dstream_t(),
            bit_width: SurfaceHexLayout::DSTREAM_T_BITWIDTH,
        })?;
        let bit_width = self.config().differentia_bit_width;
        let (storage, _) = bits::pack(self.storage().iter().copied(), bit_width);
        let mut bytes = counter.to_be_bytes().to_vec();
        bytes.extend(storage);
        Ok(hex::encode(bytes))
    }

    pub fn from_hex(text: &str, config: SurfaceConfig) -> Result<Self, SurfaceError> {
        config.validate()?;
        let layout = SurfaceHexLayout::for_config(&config);
        let text = text.trim();
        if text.len() != layout.hex_len() {
            return Err(SurfaceError::Malformed(format!(
                "expected {} hex digits, found {}",
                layout.hex_len(),
                text.len()
            )));
        }
        let bytes = hex::decode(text)?;
        let (counter, storage) = bytes.split_at(SurfaceHexLayout::DSTREAM_T_BITWIDTH / 8);
        let dstream_t = counter.iter().fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));
        let storage = bits::unpack(storage, config.differentia_bit_width, config.storage_capacity)
            .map_err(|e| SurfaceError::Malformed(e.to_string()))?;
        Self::from_parts(config, dstream_t, storage)
    }
}
