//! StratigraphicView — what comparisons need from any annotation
//!
//! Columns, surfaces and frozen specimens all reduce to an ascending run of
//! signed ranks paired with differentiae. Ranks are signed because a surface
//! may carry strata from before its lineage's first deposition.

use super::Specimen;

pub trait StratigraphicView {
    /// Bits per differentia
    fn differentia_bit_width(&self) -> u32;

    /// Depositions since the lineage's origin
    fn num_strata_deposited(&self) -> u64;

    fn num_strata_retained(&self) -> usize;

    /// Retained ranks, strictly ascending
    fn iter_ranks(&self) -> Box<dyn Iterator<Item = i64> + '_>;

    /// Differentiae aligned with `iter_ranks`
    fn iter_differentia(&self) -> Box<dyn Iterator<Item = u64> + '_>;

    fn iter_rank_differentia(&self) -> Box<dyn Iterator<Item = (i64, u64)> + '_> {
        Box::new(self.iter_ranks().zip(self.iter_differentia()))
    }

    fn to_specimen(&self) -> Specimen {
        Specimen::from_view(self)
    }
}
