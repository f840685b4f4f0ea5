//! hstrat — Hereditary Stratigraphy
//!
//! Lineages carry append-only columns of random differentiae, one per
//! generation, pruned by a retention policy. Comparing two columns rank by
//! rank bounds and estimates their most recent common ancestor without any
//! central record of who descended from whom.

pub mod genome;
pub mod inference;
pub mod juxtaposition;
pub mod policy;
pub mod serialization;
pub mod specimen;
pub mod surface;

pub use genome::{ColumnConfig, ColumnError, HereditaryStratigraphicColumn, Stratum};
pub use inference::{estimate_rank_of_mrca_between, BuiltinPrior, Estimator, Prior};
pub use juxtaposition::{
    calc_rank_of_first_retained_disparity_between, calc_rank_of_last_retained_commonality_between,
    calc_rank_of_mrca_bounds_between,
};
pub use policy::{PolicyError, StratumRetentionPolicy};
pub use serialization::{PacketConfig, SerializationError};
pub use specimen::{Assemblage, Specimen, StratigraphicView};
pub use surface::{DstreamAlgo, HereditaryStratigraphicSurface, SurfaceConfig};
