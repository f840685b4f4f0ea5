//! Recency-proportional resolution — dense near the tip, sparse near the root
//!
//! A stratum at recency `ρ` is kept iff its rank is a multiple of
//! `bit_floor(ρ / (r + 1))`. The gap bracketing any ancestor therefore grows
//! in proportion to how long ago it lived, and the column holds
//! `O(r · log n)` strata.

use super::stride::{bit_floor, bit_length};

pub(crate) const ALGO_NAME: &str = "recency_proportional_resolution";

pub(crate) fn stride(resolution: u64, recency: u64) -> u64 {
    bit_floor(recency / (resolution + 1)).max(1)
}

pub(crate) fn num_retained_upper_bound(resolution: u64, n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let tiers = u64::from(bit_length((n - 1) / (resolution + 1)).saturating_sub(1));
    n.min((resolution + 1).saturating_mul(2 + tiers))
}

/// Closed-form gap bound: the stride at the far edge of a gap of size `G`
/// around recency `ρ` is at most `bit_floor((ρ + G - 1) / (r + 1))`, which
/// caps `G` at `bit_floor((ρ - 1) / r)`.
pub(crate) fn mrca_uncertainty_abs_upper_bound(
    resolution: u64,
    a: u64,
    b: u64,
    actual_rank_of_mrca: u64,
) -> u64 {
    if actual_rank_of_mrca >= a.min(b) {
        return 0;
    }
    let recency = a.max(b) - 1 - actual_rank_of_mrca;
    if recency == 0 {
        return 0;
    }
    bit_floor((recency - 1) / resolution).max(1) - 1
}
