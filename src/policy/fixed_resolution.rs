//! Fixed resolution — keeps every k-th stratum plus the newest
//!
//! Retained count grows linearly as `n / k`, in exchange for an MRCA
//! uncertainty that never exceeds `k - 1` ranks.

pub(crate) const ALGO_NAME: &str = "fixed_resolution";

pub(crate) fn stride(resolution: u64) -> u64 {
    resolution
}

pub(crate) fn num_retained_exact(resolution: u64, n: u64) -> u64 {
    if n == 0 {
        return 0;
    }
    let multiples = n.div_ceil(resolution);
    if (n - 1) % resolution == 0 {
        multiples
    } else {
        multiples + 1
    }
}

pub(crate) fn num_retained_upper_bound(resolution: u64, n: u64) -> u64 {
    n.min(n.div_ceil(resolution) + 1)
}

pub(crate) fn mrca_uncertainty_abs_upper_bound(
    resolution: u64,
    a: u64,
    b: u64,
    actual_rank_of_mrca: u64,
) -> u64 {
    if actual_rank_of_mrca >= a.min(b) {
        return 0;
    }
    resolution - 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::stride;

    #[test]
    fn test_every_kth_rank() {
        let ranks = stride::retained_ranks(|_, _| stride(3), 10);
        assert_eq!(ranks, vec![0, 3, 6, 9]);
        let ranks = stride::retained_ranks(|_, _| stride(3), 12);
        assert_eq!(ranks, vec![0, 3, 6, 9, 11]);
    }

    #[test]
    fn test_exact_count_matches_walk() {
        for resolution in [1, 2, 3, 7, 10] {
            for n in 0..200 {
                let walked = stride::retained_ranks(|_, _| stride(resolution), n).len() as u64;
                assert_eq!(num_retained_exact(resolution, n), walked);
                assert!(walked <= num_retained_upper_bound(resolution, n));
            }
        }
    }
}
