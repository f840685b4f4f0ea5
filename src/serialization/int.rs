//! PacketInt — a packet read as one big-endian integer
//!
//! A `1` sentry bit sits above the packet's most significant byte so leading
//! zero bytes survive the trip through an integer. Valid values therefore
//! have a bit length of one more than a multiple of eight.

use std::fmt;
use std::str::FromStr;

use super::{col_from_packet, col_to_packet, PacketConfig, SerializationError};
use crate::genome::{ColumnConfig, HereditaryStratigraphicColumn};

/// Arbitrary-width non-negative integer holding a sentried packet
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PacketInt {
    /// Big-endian magnitude; the first byte is always the sentry `0x01`
    bytes: Vec<u8>,
}

impl PacketInt {
    pub fn from_packet(packet: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(packet.len() + 1);
        bytes.push(0x01);
        bytes.extend_from_slice(packet);
        Self { bytes }
    }

    /// Parse a big-endian magnitude, ignoring leading zero bytes
    pub fn from_be_bytes(bytes: &[u8]) -> Result<Self, SerializationError> {
        let start = bytes.iter().position(|&b| b != 0).ok_or(SerializationError::MissingSentry)?;
        let bytes = &bytes[start..];
        if bytes[0] != 0x01 {
            let leading_bits = u64::from(u8::BITS - bytes[0].leading_zeros());
            let bit_length = 8 * (bytes.len() as u64 - 1) + leading_bits;
            return Err(SerializationError::BadBitLength(bit_length));
        }
        Ok(Self { bytes: bytes.to_vec() })
    }

    /// Parse lowercase or uppercase hex, with or without a `0x` prefix
    pub fn from_hex(text: &str) -> Result<Self, SerializationError> {
        let digits = text.trim();
        let digits = digits
            .strip_prefix("0x")
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);
        let bytes = if digits.len() % 2 == 1 {
            hex::decode(format!("0{digits}"))?
        } else {
            hex::decode(digits)?
        };
        Self::from_be_bytes(&bytes)
    }

    pub fn bit_length(&self) -> u64 {
        8 * (self.bytes.len() as u64 - 1) + 1
    }

    pub fn as_be_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The packet without its sentry
    pub fn packet(&self) -> &[u8] {
        &self.bytes[1..]
    }

    /// Minimal hex digits of the integer value
    pub fn to_hex(&self) -> String {
        format!("1{}", hex::encode(self.packet()))
    }
}

impl fmt::Display for PacketInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for PacketInt {
    type Err = SerializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Serialize a column to its integer form
pub fn col_to_int(
    column: &HereditaryStratigraphicColumn,
    config: &PacketConfig,
) -> Result<PacketInt, SerializationError> {
    Ok(PacketInt::from_packet(&col_to_packet(column, config)?))
}

/// Rebuild a column from its integer form
pub fn col_from_int(
    value: &PacketInt,
    column_config: ColumnConfig,
    config: &PacketConfig,
) -> Result<HereditaryStratigraphicColumn, SerializationError> {
    col_from_packet(value.packet(), column_config, config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::StratumRetentionPolicy;

    #[test]
    fn test_sentry_keeps_leading_zeros() {
        let value = PacketInt::from_packet(&[0x00, 0x00, 0x0A]);
        assert_eq!(value.bit_length(), 25);
        assert_eq!(value.to_hex(), "100000a");
        assert_eq!(value.to_string(), "0x100000a");
        let parsed: PacketInt = "0x100000a".parse().unwrap();
        assert_eq!(parsed.packet(), &[0x00, 0x00, 0x0A]);
    }

    #[test]
    fn test_rejects_malformed_integers() {
        assert!(matches!(
            PacketInt::from_be_bytes(&[0, 0]),
            Err(SerializationError::MissingSentry)
        ));
        assert!(matches!(
            PacketInt::from_be_bytes(&[0x03, 0xFF]),
            Err(SerializationError::BadBitLength(10))
        ));
        assert!(matches!(PacketInt::from_hex("zz"), Err(SerializationError::Hex(_))));
        assert!(PacketInt::from_be_bytes(&[0x00, 0x01, 0x42]).is_ok());
    }

    #[test]
    fn test_column_round_trip() {
        let policy = StratumRetentionPolicy::depth_proportional_resolution(3).unwrap();
        let mut column = HereditaryStratigraphicColumn::new(policy, 16).unwrap();
        column.deposit_strata(40);
        let config = PacketConfig::default();
        let value = col_to_int(&column, &config).unwrap();
        assert_eq!(value.bit_length() % 8, 1);
        let reparsed = PacketInt::from_hex(&value.to_hex()).unwrap();
        let restored = col_from_int(&reparsed, ColumnConfig::new(policy, 16), &config).unwrap();
        assert_eq!(restored, column);
    }
}
