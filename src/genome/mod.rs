//! Genome — strata and the stratigraphic column that accumulates them
//!
//! A column is the heritable annotation one lineage carries: one random
//! stratum per generation, pruned by a retention policy.

mod stratigraphic_column;
mod stratum;
mod stratum_store;

pub use stratigraphic_column::{ColumnConfig, ColumnError, HereditaryStratigraphicColumn};
pub use stratum::{
    max_differentia, Stratum, MAX_DIFFERENTIA_BIT_WIDTH, NATIVE_DIFFERENTIA_BIT_WIDTHS,
};
pub use stratum_store::StratumStore;
