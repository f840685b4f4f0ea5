//! Stride rule — the shared retention skeleton of the deterministic policies
//!
//! A stride policy keeps rank `k` after `n` depositions iff `k` is a multiple
//! of `stride(ρ, n)`, where `ρ = n - 1 - k` is the stratum's recency. The
//! newest rank is kept unconditionally. Strides are powers of two and never
//! shrink as either recency or deposition count grows, which is what makes
//! retention monotone: a rank dropped once can never be a multiple again.

/// Number of significant bits in `x` (0 for 0)
pub(crate) fn bit_length(x: u64) -> u32 {
    u64::BITS - x.leading_zeros()
}

/// Largest power of two not exceeding `x` (0 for 0)
pub(crate) fn bit_floor(x: u64) -> u64 {
    if x == 0 {
        0
    } else {
        1 << (bit_length(x) - 1)
    }
}

/// Enumerate the retained ranks after `n` depositions, ascending.
///
/// Walks downward from the newest rank, snapping each candidate to the
/// stride in force at its recency until it lands on a kept rank.
pub(crate) fn retained_ranks<F>(stride: F, n: u64) -> Vec<u64>
where
    F: Fn(u64, u64) -> u64,
{
    if n == 0 {
        return Vec::new();
    }
    let mut ranks = vec![n - 1];
    let mut rank = n - 1;
    while rank > 0 {
        let mut candidate = rank - 1;
        loop {
            let step = stride(n - 1 - candidate, n).max(1);
            if candidate % step == 0 {
                break;
            }
            candidate = candidate / step * step;
        }
        ranks.push(candidate);
        rank = candidate;
    }
    ranks.reverse();
    ranks
}

/// Whether `rank` survives `n` depositions under `stride`
pub(crate) fn is_retained<F>(stride: F, rank: u64, n: u64) -> bool
where
    F: Fn(u64, u64) -> u64,
{
    rank < n && (rank == n - 1 || rank % stride(n - 1 - rank, n).max(1) == 0)
}

/// Worst-case MRCA uncertainty for power-of-two stride schedules.
///
/// The gap bracketing the MRCA is at most the largest stride `G` in force
/// anywhere within `G - 1` ranks of it, evaluated at the larger column.
pub(crate) fn mrca_uncertainty_abs_upper_bound<F>(
    stride: F,
    first_num_strata_deposited: u64,
    second_num_strata_deposited: u64,
    actual_rank_of_mrca: u64,
) -> u64
where
    F: Fn(u64, u64) -> u64,
{
    let n = first_num_strata_deposited.max(second_num_strata_deposited);
    if actual_rank_of_mrca >= first_num_strata_deposited.min(second_num_strata_deposited) {
        return 0;
    }
    let recency = n - 1 - actual_rank_of_mrca;
    let mut best = 1u64;
    let mut gap = 1u64;
    while gap <= n {
        let far_recency = recency.saturating_add(gap - 1).min(n - 1);
        if stride(far_recency, n) >= gap {
            best = gap;
        }
        match gap.checked_mul(2) {
            Some(next) => gap = next,
            None => break,
        }
    }
    best - 1
}

/// Exact MRCA uncertainty given both columns' retained ranks.
///
/// Counts the ranks strictly between the last mutually retained rank at or
/// before the MRCA and the first mutually retained rank after it (or the
/// shorter column's deposition count when none remains).
pub(crate) fn mrca_uncertainty_abs_exact(
    first_ranks: &[u64],
    second_ranks: &[u64],
    first_num_strata_deposited: u64,
    second_num_strata_deposited: u64,
    actual_rank_of_mrca: u64,
) -> u64 {
    let ceiling = first_num_strata_deposited.min(second_num_strata_deposited);
    if actual_rank_of_mrca >= ceiling {
        return 0;
    }
    let mut below = 0u64;
    let mut above = ceiling;
    let (mut i, mut j) = (0, 0);
    while i < first_ranks.len() && j < second_ranks.len() {
        let (a, b) = (first_ranks[i], second_ranks[j]);
        if a < b {
            i += 1;
        } else if b < a {
            j += 1;
        } else {
            if a <= actual_rank_of_mrca {
                below = a;
            } else {
                above = a.min(ceiling);
                break;
            }
            i += 1;
            j += 1;
        }
    }
    above - below - 1
}

/// Convert an absolute uncertainty into one relative to the MRCA's recency
pub(crate) fn relative_uncertainty(
    abs_uncertainty: u64,
    first_num_strata_deposited: u64,
    second_num_strata_deposited: u64,
    actual_rank_of_mrca: u64,
) -> f64 {
    let ceiling = first_num_strata_deposited.min(second_num_strata_deposited);
    let recency = ceiling
        .saturating_sub(1)
        .saturating_sub(actual_rank_of_mrca)
        .max(1);
    abs_uncertainty as f64 / recency as f64
}
