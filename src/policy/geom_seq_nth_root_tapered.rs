//! Geometric sequence nth root, tapered
//!
//! Tier layout of the untapered form with drop batches released one rank per
//! deposition.

use super::geom_seq_nth_root;
use super::taper;

pub(crate) const ALGO_NAME: &str = "geom_seq_nth_root_tapered";

pub(crate) fn retained_ranks(degree: u64, interspersal: u64, n: u64) -> Vec<u64> {
    let window = geom_seq_nth_root::num_retained_upper_bound(degree, interspersal, u64::MAX);
    taper::retained_ranks(
        |rho, n| geom_seq_nth_root::stride(degree, interspersal, rho, n),
        window,
        n,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tapered_superset_of_base() {
        assert_eq!(retained_ranks(2, 2, 16), vec![0, 8, 11, 12, 13, 14, 15]);
        assert_eq!(retained_ranks(2, 2, 64), vec![0, 32, 48, 56, 58, 60, 62, 63]);
        assert_eq!(retained_ranks(2, 2, 100), vec![0, 32, 64, 92, 96, 99]);
    }

    #[test]
    fn test_count_bound() {
        for n in 0..1200 {
            assert!(retained_ranks(2, 2, n).len() <= 9);
        }
    }
}
