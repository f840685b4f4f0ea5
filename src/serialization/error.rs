use crate::genome::ColumnError;
use crate::policy::PolicyError;

/// Failures reading or writing serialized annotations
#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("deposition count {value} does not fit in a {byte_width}-byte header")]
    HeaderOverflow { value: u64, byte_width: usize },
    #[error("header byte width {0} must be within 1..=8")]
    InvalidHeaderWidth(usize),
    #[error("truncated payload: expected {expected} bytes, found {found}")]
    Truncated { expected: usize, found: usize },
    #[error(
        "payload of {payload_bits} bits with {padding_bits} padding bits \
         is not a whole number of {bit_width}-bit differentiae"
    )]
    BadPadding {
        payload_bits: usize,
        padding_bits: u8,
        bit_width: u32,
    },
    #[error("{0} cannot recompute retained ranks; ranks must be stored explicitly")]
    RanksUnavailable(String),
    #[error("serialized integer is missing its sentry bit")]
    MissingSentry,
    #[error("serialized integer has bit length {0}, expected one more than a multiple of 8")]
    BadBitLength(u64),
    #[error("{0}")]
    Malformed(String),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error(transparent)]
    Column(#[from] ColumnError),
}
