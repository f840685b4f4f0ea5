//! Recency-proportional resolution, curbed — never more than `c` strata
//!
//! The column grows with perfect resolution until it holds `c` strata, then
//! falls back to recency-proportional resolution with the largest
//! resolution whose count bound still fits the curb. Resolution only ever
//! decreases. Once even resolution zero would exceed the curb
//! (past `2^(c-1)` depositions) the stride switches to the coarser of the
//! resolution-zero stride and a degree `(c - 1) / 2` geometric stride.

use super::geom_seq_nth_root;
use super::recency_proportional_resolution;
use super::stride::bit_floor;

pub(crate) const ALGO_NAME: &str = "recency_proportional_resolution_curbed";

/// Which backing schedule is in force after `n` depositions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CurbedPhase {
    Perfect,
    Recency(u64),
    Geometric,
}

pub(crate) fn phase(size_curb: u64, n: u64) -> CurbedPhase {
    if n <= size_curb {
        return CurbedPhase::Perfect;
    }
    (0..=size_curb / 2)
        .rev()
        .find(|&resolution| {
            recency_proportional_resolution::num_retained_upper_bound(resolution, n) <= size_curb
        })
        .map_or(CurbedPhase::Geometric, CurbedPhase::Recency)
}

pub(crate) fn stride(size_curb: u64, recency: u64, n: u64) -> u64 {
    match phase(size_curb, n) {
        CurbedPhase::Perfect => 1,
        CurbedPhase::Recency(resolution) => {
            recency_proportional_resolution::stride(resolution, recency)
        }
        CurbedPhase::Geometric => {
            let degree = ((size_curb - 1) / 2).max(1);
            bit_floor(recency)
                .max(1)
                .max(geom_seq_nth_root::stride(degree, 1, recency, n))
        }
    }
}

pub(crate) fn num_retained_upper_bound(size_curb: u64, n: u64) -> u64 {
    n.min(size_curb)
}
