//! Depth-proportional resolution, tapered
//!
//! Same spacing as the untapered form, but when the stride doubles the
//! orphaned strata are released one per deposition rather than all at once.

use super::depth_proportional_resolution;
use super::taper;

pub(crate) const ALGO_NAME: &str = "depth_proportional_resolution_tapered";

pub(crate) fn retained_ranks(resolution: u64, n: u64) -> Vec<u64> {
    let window = depth_proportional_resolution::num_retained_upper_bound(resolution, u64::MAX);
    taper::retained_ranks(
        |_, n| depth_proportional_resolution::stride(resolution, n),
        window,
        n,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_is_gradual() {
        assert_eq!(retained_ranks(2, 15), vec![0, 4, 8, 12, 14]);
        assert_eq!(retained_ranks(2, 16), vec![0, 8, 12, 14, 15]);
        assert_eq!(retained_ranks(2, 17), vec![0, 8, 14, 16]);
        assert_eq!(retained_ranks(2, 20), vec![0, 8, 16, 19]);
    }

    #[test]
    fn test_count_never_jumps_by_more_than_one() {
        let mut previous = 0usize;
        for n in 1..500 {
            let count = retained_ranks(3, n).len();
            assert!(count <= 8);
            assert!(count + 1 >= previous);
            previous = count;
        }
    }
}
