//! Perfect resolution — every stratum is kept forever
//!
//! The reference policy: columns grow linearly and comparisons locate the
//! MRCA exactly (up to spurious collisions).

use std::ops::Range;

pub(crate) const ALGO_NAME: &str = "perfect_resolution";

pub(crate) fn retained_ranks(n: u64) -> Range<u64> {
    0..n
}

pub(crate) fn num_retained_exact(n: u64) -> u64 {
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_everything() {
        assert_eq!(retained_ranks(0).count(), 0);
        assert_eq!(retained_ranks(5).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert_eq!(num_retained_exact(1234), 1234);
    }
}
