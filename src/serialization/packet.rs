//! Binary packets — a deposition-count header followed by bit-packed differentiae
//!
//! Layout: `num_strata_deposited` big-endian in a fixed-width header, an
//! optional one-byte count of trailing padding bits, then every retained
//! differentia packed most-significant-bit first. Ranks are not written; the
//! reader recomputes them from the policy.

use log::debug;
use serde::{Deserialize, Serialize};

use super::{bits, SerializationError};
use crate::genome::{
    ColumnConfig, ColumnError, HereditaryStratigraphicColumn, Stratum, MAX_DIFFERENTIA_BIT_WIDTH,
};
use crate::policy::StratumRetentionPolicy;

/// Whether a packet carries the `num_padding_bits` byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaddingHeader {
    /// Only when the bit width is uneven and the policy has no exact count
    #[default]
    Auto,
    Include,
    Omit,
}

impl PaddingHeader {
    /// Resolve against a policy and bit width; readers and writers must agree
    pub fn is_included(
        self,
        policy: &StratumRetentionPolicy,
        differentia_bit_width: u32,
    ) -> bool {
        match self {
            Self::Auto => differentia_bit_width % 8 != 0 && !policy.has_rank_scry(),
            Self::Include => true,
            Self::Omit => false,
        }
    }
}

/// Packet layout options shared by writer and reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketConfig {
    /// Bytes in the deposition-count header, 1 through 8
    pub num_strata_deposited_byte_width: usize,
    pub padding_header: PaddingHeader,
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            num_strata_deposited_byte_width: 4,
            padding_header: PaddingHeader::Auto,
        }
    }
}

impl PacketConfig {
    /// Always write the padding byte, so the payload is self-delimiting
    pub fn self_describing() -> Self {
        Self {
            padding_header: PaddingHeader::Include,
            ..Self::default()
        }
    }

    fn header_width(&self) -> Result<usize, SerializationError> {
        match self.num_strata_deposited_byte_width {
            width @ 1..=8 => Ok(width),
            width => Err(SerializationError::InvalidHeaderWidth(width)),
        }
    }
}

/// Differentia payload with an optional leading padding byte
pub(crate) fn encode_payload(
    column: &HereditaryStratigraphicColumn,
    include_padding_header: bool,
) -> Vec<u8> {
    let (packed, padding_bits) =
        bits::pack(column.iter_retained_differentia(), column.differentia_bit_width());
    let mut payload = Vec::with_capacity(packed.len() + 1);
    if include_padding_header {
        payload.push(padding_bits);
    }
    payload.extend(packed);
    payload
}

/// Split a payload into differentiae, trusting `expected` when the padding
/// byte is absent
pub(crate) fn decode_payload(
    payload: &[u8],
    differentia_bit_width: u32,
    include_padding_header: bool,
    expected: Option<usize>,
    policy: &StratumRetentionPolicy,
) -> Result<Vec<u64>, SerializationError> {
    if differentia_bit_width == 0 || differentia_bit_width > MAX_DIFFERENTIA_BIT_WIDTH {
        return Err(ColumnError::UnsupportedBitWidth(differentia_bit_width).into());
    }
    let (packed, count) = if include_padding_header {
        let (&padding_bits, packed) = payload.split_first().ok_or(SerializationError::Truncated {
            expected: 1,
            found: 0,
        })?;
        let count = bits::count_from_padding(packed.len(), padding_bits, differentia_bit_width)?;
        if let Some(expected) = expected {
            if expected != count {
                return Err(SerializationError::Malformed(format!(
                    "padding implies {count} differentiae, expected {expected}"
                )));
            }
        }
        (packed, count)
    } else {
        let count =
            expected.ok_or_else(|| SerializationError::RanksUnavailable(policy.to_string()))?;
        (payload, count)
    };
    bits::unpack(packed, differentia_bit_width, count)
}

/// Serialize a column into a binary packet
pub fn col_to_packet(
    column: &HereditaryStratigraphicColumn,
    config: &PacketConfig,
) -> Result<Vec<u8>, SerializationError> {
    let byte_width = config.header_width()?;
    let n = column.num_strata_deposited();
    if byte_width < 8 && n >> (8 * byte_width) != 0 {
        return Err(SerializationError::HeaderOverflow { value: n, byte_width });
    }
    let include = config
        .padding_header
        .is_included(column.policy(), column.differentia_bit_width());

    let mut packet = n.to_be_bytes()[8 - byte_width..].to_vec();
    packet.extend(encode_payload(column, include));
    debug!(
        "Packed column: deposited={}, retained={}, bytes={}",
        n,
        column.num_strata_retained(),
        packet.len()
    );
    Ok(packet)
}

/// Rebuild a column from a packet written with the same policy, bit width
/// and packet layout
pub fn col_from_packet(
    packet: &[u8],
    column_config: ColumnConfig,
    config: &PacketConfig,
) -> Result<HereditaryStratigraphicColumn, SerializationError> {
    let byte_width = config.header_width()?;
    if packet.len() < byte_width {
        return Err(SerializationError::Truncated {
            expected: byte_width,
            found: packet.len(),
        });
    }
    let (header, payload) = packet.split_at(byte_width);
    let n = header.iter().fold(0u64, |acc, &byte| (acc << 8) | u64::from(byte));

    let policy = column_config.policy;
    let expected = policy
        .calc_num_strata_retained_exact(n)
        .and_then(|count| usize::try_from(count).ok())
        .ok_or_else(|| SerializationError::RanksUnavailable(policy.to_string()))?;
    let include = config
        .padding_header
        .is_included(&policy, column_config.differentia_bit_width);
    let differentiae = decode_payload(
        payload,
        column_config.differentia_bit_width,
        include,
        Some(expected),
        &policy,
    )?;

    let strata = differentiae.into_iter().map(Stratum::new).collect();
    let column = HereditaryStratigraphicColumn::from_retained_strata(column_config, n, strata)?;
    debug!("Unpacked column: deposited={}, retained={}", n, column.num_strata_retained());
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grown(
        policy: StratumRetentionPolicy,
        bit_width: u32,
        generations: u64,
    ) -> HereditaryStratigraphicColumn {
        let mut rng = StdRng::seed_from_u64(7);
        let config = ColumnConfig::new(policy, bit_width);
        let mut column =
            HereditaryStratigraphicColumn::with_config_and_rng(config, &mut rng).unwrap();
        column.deposit_strata_with_rng(&mut rng, generations);
        column
    }

    #[test]
    fn test_header_is_big_endian() {
        let column = grown(StratumRetentionPolicy::nominal_resolution(), 8, 299);
        let packet = col_to_packet(&column, &PacketConfig::default()).unwrap();
        assert_eq!(&packet[..4], &[0, 0, 1, 44]);
        assert_eq!(packet.len(), 4 + 2);
    }

    #[test]
    fn test_round_trip() {
        let policies = [
            StratumRetentionPolicy::perfect_resolution(),
            StratumRetentionPolicy::fixed_resolution(4).unwrap(),
            StratumRetentionPolicy::recency_proportional_resolution_curbed(12).unwrap(),
            StratumRetentionPolicy::geom_seq_nth_root_tapered(2, 2).unwrap(),
        ];
        for policy in policies {
            for bit_width in [1, 3, 8, 64] {
                let column = grown(policy, bit_width, 137);
                let config = PacketConfig::default();
                let packet = col_to_packet(&column, &config).unwrap();
                let column_config = ColumnConfig::new(policy, bit_width);
                let restored = col_from_packet(&packet, column_config, &config).unwrap();
                assert_eq!(restored, column);
            }
        }
    }

    #[test]
    fn test_included_padding_header() {
        let policy = StratumRetentionPolicy::recency_proportional_resolution(5).unwrap();
        let column = grown(policy, 3, 49);
        assert_eq!(column.num_strata_retained(), 25);
        let config = PacketConfig::self_describing();
        let packet = col_to_packet(&column, &config).unwrap();
        assert_eq!(packet[4], 5);
        assert_eq!(packet.len(), 4 + 1 + 10);
        let restored = col_from_packet(&packet, ColumnConfig::new(policy, 3), &config).unwrap();
        assert_eq!(restored, column);
        // auto mode skips the byte because the count is recomputable
        let auto = col_to_packet(&column, &PacketConfig::default()).unwrap();
        assert_eq!(auto.len(), 4 + 10);
    }

    #[test]
    fn test_header_overflow() {
        let column = grown(StratumRetentionPolicy::nominal_resolution(), 8, 300);
        let config = PacketConfig {
            num_strata_deposited_byte_width: 1,
            ..PacketConfig::default()
        };
        assert!(matches!(
            col_to_packet(&column, &config),
            Err(SerializationError::HeaderOverflow { value: 301, byte_width: 1 })
        ));
    }

    #[test]
    fn test_stochastic_needs_ranks() {
        let column = grown(StratumRetentionPolicy::stochastic(), 8, 20);
        let config = PacketConfig::default();
        let packet = col_to_packet(&column, &config).unwrap();
        let column_config = ColumnConfig::new(StratumRetentionPolicy::stochastic(), 8);
        assert!(matches!(
            col_from_packet(&packet, column_config, &config),
            Err(SerializationError::RanksUnavailable(_))
        ));
    }

    #[test]
    fn test_out_of_range_bit_width_is_an_error() {
        let policy = StratumRetentionPolicy::fixed_resolution(3).unwrap();
        let config = PacketConfig::self_describing();
        let packet = col_to_packet(&grown(policy, 3, 40), &config).unwrap();
        for bit_width in [0, 65, 128, 200] {
            let result = col_from_packet(&packet, ColumnConfig::new(policy, bit_width), &config);
            let rejected = matches!(
                result,
                Err(SerializationError::Column(ColumnError::UnsupportedBitWidth(w)))
                    if w == bit_width
            );
            assert!(rejected, "bit width {bit_width}");
        }
    }

    #[test]
    fn test_oversized_header_is_an_error() {
        let config = PacketConfig {
            num_strata_deposited_byte_width: 8,
            ..PacketConfig::default()
        };
        let packet = [0xff; 12];
        for bit_width in [1, 64] {
            let column_config =
                ColumnConfig::new(StratumRetentionPolicy::perfect_resolution(), bit_width);
            assert!(col_from_packet(&packet, column_config, &config).is_err());
        }
    }

    #[test]
    fn test_empty_column_is_header_only() {
        let column = HereditaryStratigraphicColumn::from_retained_strata(
            ColumnConfig::new(StratumRetentionPolicy::perfect_resolution(), 3),
            0,
            Vec::new(),
        )
        .unwrap();
        let packet = col_to_packet(&column, &PacketConfig::default()).unwrap();
        assert_eq!(packet, vec![0, 0, 0, 0]);
        let restored = col_from_packet(
            &packet,
            ColumnConfig::new(StratumRetentionPolicy::perfect_resolution(), 3),
            &PacketConfig::default(),
        )
        .unwrap();
        assert_eq!(restored.num_strata_deposited(), 0);
        assert_eq!(restored.num_strata_retained(), 0);
    }

    #[test]
    fn test_truncated_packet() {
        let column = grown(StratumRetentionPolicy::perfect_resolution(), 8, 9);
        let config = PacketConfig::default();
        let packet = col_to_packet(&column, &config).unwrap();
        let result = col_from_packet(
            &packet[..packet.len() - 1],
            ColumnConfig::new(StratumRetentionPolicy::perfect_resolution(), 8),
            &config,
        );
        assert!(matches!(result, Err(SerializationError::Truncated { .. })));
    }
}
