//! Tapering — spreads the strata dropped by a stride change over later depositions
//!
//! When a stride schedule doubles, a whole batch of ranks stops being a
//! multiple at once. A tapered policy keeps that batch around and releases it
//! one rank per deposition, oldest first, so the retained count changes by at
//! most one per step instead of collapsing.

use std::collections::BTreeSet;

use super::stride;

/// Ranks retained after `n` depositions by the tapered form of `stride`.
///
/// `window` must be at least the base schedule's retained-count bound: no
/// drop batch can outlive that many depositions.
pub(crate) fn retained_ranks<F>(stride: F, window: u64, n: u64) -> Vec<u64>
where
    F: Fn(u64, u64) -> u64 + Copy,
{
    let mut current = stride::retained_ranks(stride, n);
    if n < 2 {
        return current;
    }
    let mut retained: BTreeSet<u64> = current.iter().copied().collect();
    let oldest = (n + 1).saturating_sub(window).max(2);
    for epoch in (oldest..=n).rev() {
        let previous = stride::retained_ranks(stride, epoch - 1);
        let released = (n - epoch + 1) as usize;
        let batch: Vec<u64> = {
            let kept: BTreeSet<u64> = current.iter().copied().collect();
            previous
                .iter()
                .copied()
                .filter(|rank| !kept.contains(rank))
                .collect()
        };
        retained.extend(batch.into_iter().skip(released));
        current = previous;
    }
    retained.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::stride::bit_length;

    fn depth_two(_rho: u64, n: u64) -> u64 {
        1 << bit_length((n / 2) / 2)
    }

    #[test]
    fn test_taper_holds_back_batch() {
        assert_eq!(stride::retained_ranks(depth_two, 16), vec![0, 8, 15]);
        assert_eq!(retained_ranks(depth_two, 6, 16), vec![0, 8, 12, 14, 15]);
        assert_eq!(retained_ranks(depth_two, 6, 17), vec![0, 8, 14, 16]);
        assert_eq!(retained_ranks(depth_two, 6, 18), vec![0, 8, 16, 17]);
    }

    #[test]
    fn test_taper_monotone() {
        let mut previous: Vec<u64> = Vec::new();
        for n in 0..300u64 {
            let ranks = retained_ranks(depth_two, 6, n);
            if n >= 1 {
                assert_eq!(ranks[0], 0);
                assert_eq!(*ranks.last().unwrap(), n - 1);
                assert!(ranks.len() <= 6);
            }
            for rank in &ranks {
                assert!(previous.contains(rank) || *rank + 1 == n);
            }
            previous = ranks;
        }
    }
}
