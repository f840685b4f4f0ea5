//! Stratum retention — which historical strata a column keeps as it grows
//!
//! Each algorithm lives in its own module as a handful of free functions;
//! `StratumRetentionPolicy` ties them together as a single value type and
//! dispatches every facet by `match`.

mod depth_proportional_resolution;
mod depth_proportional_resolution_tapered;
mod fixed_resolution;
mod geom_seq_nth_root;
mod geom_seq_nth_root_tapered;
mod nominal_resolution;
mod perfect_resolution;
mod ranks;
mod recency_proportional_resolution;
mod recency_proportional_resolution_curbed;
mod retention_policy;
mod stochastic;
mod stride;
mod taper;

pub use ranks::{DropRanks, RetainedRanks};
pub use retention_policy::{PolicyError, StratumRetentionPolicy};

pub(crate) use stride::bit_length;
