//! Depth-proportional resolution — a constant number of evenly spaced strata
//!
//! All retained ranks share one stride, `2^bitlen((n / d) / 2)`, which doubles
//! each time the column depth doubles. The column therefore holds between
//! `d` and `2d + 1` strata, spaced roughly `n / d` apart.

use super::stride::bit_length;

pub(crate) const ALGO_NAME: &str = "depth_proportional_resolution";

pub(crate) fn stride(resolution: u64, n: u64) -> u64 {
    1 << bit_length((n / resolution) / 2)
}

pub(crate) fn num_retained_upper_bound(resolution: u64, n: u64) -> u64 {
    n.min(resolution.saturating_mul(2).saturating_add(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::stride;

    #[test]
    fn test_stride_doubles_with_depth() {
        assert_eq!(stride(2, 3), 1);
        assert_eq!(stride(2, 4), 2);
        assert_eq!(stride(2, 8), 4);
        assert_eq!(stride(2, 16), 8);
    }

    #[test]
    fn test_retained_ranks() {
        let walk = |n| stride::retained_ranks(|_, n| stride(2, n), n);
        assert_eq!(walk(20), vec![0, 8, 16, 19]);
        assert_eq!(walk(100), vec![0, 32, 64, 96, 99]);
    }

    #[test]
    fn test_count_bounded_by_resolution() {
        for resolution in [1, 2, 5] {
            for n in 0..2000 {
                let count = stride::retained_ranks(|_, n| stride(resolution, n), n).len() as u64;
                assert!(count <= num_retained_upper_bound(resolution, n));
            }
        }
    }
}
