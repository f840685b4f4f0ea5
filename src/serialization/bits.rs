//! MSB-first bit packing of fixed-width differentiae

use super::SerializationError;

/// Pack `values` of `bit_width` bits each, returning the bytes and the
/// number of unused trailing bits in the last byte
pub(crate) fn pack(values: impl IntoIterator<Item = u64>, bit_width: u32) -> (Vec<u8>, u8) {
    let mut bytes = Vec::new();
    let mut accumulator: u128 = 0;
    let mut pending: u32 = 0;
    for value in values {
        accumulator = (accumulator << bit_width) | u128::from(value);
        pending += bit_width;
        while pending >= 8 {
            pending -= 8;
            bytes.push((accumulator >> pending) as u8);
        }
        accumulator &= (1u128 << pending) - 1;
    }
    let padding_bits = if pending == 0 { 0 } else { 8 - pending };
    if pending > 0 {
        bytes.push((accumulator << padding_bits) as u8);
    }
    (bytes, padding_bits as u8)
}

/// Unpack exactly `count` values of `bit_width` bits each
pub(crate) fn unpack(
    bytes: &[u8],
    bit_width: u32,
    count: usize,
) -> Result<Vec<u64>, SerializationError> {
    let expected = count
        .checked_mul(bit_width as usize)
        .map(|total_bits| total_bits.div_ceil(8))
        .ok_or_else(|| {
            SerializationError::Malformed(format!("{count} differentiae of {bit_width} bits"))
        })?;
    if bytes.len() != expected {
        return Err(SerializationError::Truncated {
            expected,
            found: bytes.len(),
        });
    }
    let mask: u128 = (1u128 << bit_width) - 1;
    let mut values = Vec::with_capacity(count);
    let mut accumulator: u128 = 0;
    let mut pending: u32 = 0;
    let mut cursor = bytes.iter();
    while values.len() < count {
        while pending < bit_width {
            let byte = cursor.next().copied().unwrap_or(0);
            accumulator = (accumulator << 8) | u128::from(byte);
            pending += 8;
        }
        pending -= bit_width;
        values.push(((accumulator >> pending) & mask) as u64);
        accumulator &= (1u128 << pending) - 1;
    }
    Ok(values)
}

/// How many differentiae a payload holds once padding is discounted
pub(crate) fn count_from_padding(
    payload_len: usize,
    padding_bits: u8,
    bit_width: u32,
) -> Result<usize, SerializationError> {
    let payload_bits = payload_len * 8;
    let bad = || SerializationError::BadPadding {
        payload_bits,
        padding_bits,
        bit_width,
    };
    if padding_bits >= 8 || (payload_len == 0 && padding_bits > 0) {
        return Err(bad());
    }
    let used = payload_bits - usize::from(padding_bits);
    if used % bit_width as usize != 0 {
        return Err(bad());
    }
    Ok(used / bit_width as usize)
}
