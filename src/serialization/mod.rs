//! Serialization — packets, integers and records for columns and populations

pub(crate) mod bits;
mod error;
mod int;
mod packet;
mod records;

pub use error::SerializationError;
pub use int::{col_from_int, col_to_int, PacketInt};
pub use packet::{col_from_packet, col_to_packet, PacketConfig, PaddingHeader};
pub use records::{
    col_from_records, col_to_records, pop_from_records, pop_to_records, specimen_from_records,
    ColumnEntry, ColumnRecord, PopulationRecord, RecordHeader, HSTRAT_VERSION,
};
