//! Surface — fixed-capacity annotations curated by dstream algorithms

mod algo;
mod encoding;
mod hybrid;
mod steady;
mod stratigraphic_surface;
mod tilted;

pub use algo::{DstreamAlgo, MAX_STORAGE_CAPACITY};
pub use encoding::SurfaceHexLayout;
pub use stratigraphic_surface::{HereditaryStratigraphicSurface, SurfaceConfig};

/// Failures building or decoding a surface
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    #[error("storage capacity {capacity} unsupported by {algo}: need a power of two within range")]
    InvalidCapacity { algo: &'static str, capacity: usize },
    #[error("unsupported differentia bit width {0}: must be within 1..=64")]
    UnsupportedBitWidth(u32),
    #[error("unknown dstream algorithm: {0}")]
    UnknownAlgo(String),
    #[error("ingest counter {value} does not fit in {bit_width} bits")]
    CounterOverflow { value: u64, bit_width: usize },
    #[error("malformed surface: {0}")]
    Malformed(String),
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}
