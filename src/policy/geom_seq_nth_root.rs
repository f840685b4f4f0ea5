//! Geometric sequence nth root — resolution tiers at `n^(j/D)` recencies
//!
//! The history is split into `D` tiers whose far edges sit at recencies
//! `n^(1/D), n^(2/D), …, n`. Inside tier `j` ranks are kept on a stride of
//! `bit_floor(n^(j/D) / I)`, so each tier holds about `2I` strata and the
//! relative uncertainty at any depth is `O(1 / I)` of that tier's extent.

use super::stride::bit_floor;

pub(crate) const ALGO_NAME: &str = "geom_seq_nth_root";

/// Far edge of tier `tier` (1-based) after `n` depositions
fn tier_target(degree: u64, tier: u64, n: u64) -> f64 {
    (n as f64).powf(tier as f64 / degree as f64)
}

pub(crate) fn stride(degree: u64, interspersal: u64, recency: u64, n: u64) -> u64 {
    (1..=degree)
        .map(|tier| tier_target(degree, tier, n))
        .find(|&target| recency as f64 <= target)
        .map_or_else(
            || bit_floor(n / interspersal),
            |target| bit_floor((target / interspersal as f64) as u64),
        )
        .max(1)
}

pub(crate) fn num_retained_upper_bound(degree: u64, interspersal: u64, n: u64) -> u64 {
    n.min(
        degree
            .saturating_mul(interspersal)
            .saturating_mul(2)
            .saturating_add(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::stride;

    fn walk(degree: u64, interspersal: u64, n: u64) -> Vec<u64> {
        stride::retained_ranks(|rho, n| stride(degree, interspersal, rho, n), n)
    }

    #[test]
    fn test_retained_ranks() {
        assert_eq!(walk(1, 1, 10), vec![0, 8, 9]);
        assert_eq!(walk(2, 2, 100), vec![0, 32, 64, 92, 96, 99]);
    }

    #[test]
    fn test_count_bound() {
        for (degree, interspersal) in [(1, 1), (2, 2), (3, 2), (4, 4)] {
            for n in 0..3000 {
                let count = walk(degree, interspersal, n).len() as u64;
                assert!(count <= num_retained_upper_bound(degree, interspersal, n));
            }
        }
    }

    #[test]
    fn test_uncertainty_bound() {
        let bound = stride::mrca_uncertainty_abs_upper_bound(
            |rho, n| stride(2, 2, rho, n),
            100,
            100,
            50,
        );
        assert_eq!(bound, 31);
    }
}
