//! Confidence bounds on the MRCA rank
//!
//! Matching differentiae right after two lineages diverge may be spurious
//! collisions. A match is trusted only when it is followed by enough further
//! matches that coincidence is implausible at the requested confidence, so
//! every bound here backs off `m(1 - confidence) - 1` mutual ranks from
//! what was observed.

use super::collision::min_implausible_spurious_collisions;
use super::mutual::MutualStrata;
use crate::specimen::StratigraphicView;

/// Mutual ranks up to and including the first disparity
struct Sweep {
    mutual_ranks: Vec<i64>,
    first_disparity: Option<usize>,
}

impl Sweep {
    fn new<A, B>(first: &A, second: &B) -> Self
    where
        A: StratigraphicView + ?Sized,
        B: StratigraphicView + ?Sized,
    {
        let mut mutual_ranks = Vec::new();
        let mut first_disparity = None;
        for stratum in MutualStrata::new(first, second) {
            mutual_ranks.push(stratum.rank);
            if !stratum.is_common() {
                first_disparity = Some(mutual_ranks.len() - 1);
                break;
            }
        }
        Self {
            mutual_ranks,
            first_disparity,
        }
    }

    /// Backs off even when every mutual rank matched; the trailing matches
    /// may all be collisions between lineages that split earlier.
    fn last_commonality(&self, threshold: u64) -> Option<i64> {
        let last_match = match self.first_disparity {
            Some(index) => index.checked_sub(1)?,
            None => self.mutual_ranks.len().checked_sub(1)?,
        };
        let backoff = usize::try_from(threshold.max(1) - 1).ok()?;
        last_match
            .checked_sub(backoff)
            .map(|index| self.mutual_ranks[index])
    }

    fn first_disparity(&self, threshold: u64) -> Option<i64> {
        let disparity = self.first_disparity?;
        let backoff = usize::try_from(threshold.max(1) - 1).unwrap_or(usize::MAX);
        Some(self.mutual_ranks[disparity.saturating_sub(backoff)])
    }

    fn observed_disparity(&self) -> Option<i64> {
        self.first_disparity.map(|index| self.mutual_ranks[index])
    }
}

fn threshold<A>(first: &A, confidence_level: f64) -> u64
where
    A: StratigraphicView + ?Sized,
{
    min_implausible_spurious_collisions(first.differentia_bit_width(), 1.0 - confidence_level)
}

fn min_deposited<A, B>(first: &A, second: &B) -> i64
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    first.num_strata_deposited().min(second.num_strata_deposited()) as i64
}

/// Deepest rank at which both annotations confidently share ancestry.
///
/// `None` when no common ancestor is detectable at this confidence. The
/// back-off applies whether or not a disparity was observed, so identical
/// narrow-differentia annotations report a rank below their last one.
pub fn calc_rank_of_last_retained_commonality_between<A, B>(
    first: &A,
    second: &B,
    confidence_level: f64,
) -> Option<i64>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    Sweep::new(first, second).last_commonality(threshold(first, confidence_level))
}

/// Earliest rank at which the annotations confidently differ.
///
/// Backs off from the first observed disparity over matches that could be
/// coincidental; `None` when no disparity was observed.
pub fn calc_rank_of_first_retained_disparity_between<A, B>(
    first: &A,
    second: &B,
    confidence_level: f64,
) -> Option<i64>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    Sweep::new(first, second).first_disparity(threshold(first, confidence_level))
}

/// Last commonality and first disparity from a single sweep
pub fn calc_rank_of_parity_segue_between<A, B>(
    first: &A,
    second: &B,
    commonality_confidence_level: f64,
    disparity_confidence_level: f64,
) -> (Option<i64>, Option<i64>)
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    let sweep = Sweep::new(first, second);
    (
        sweep.last_commonality(threshold(first, commonality_confidence_level)),
        sweep.first_disparity(threshold(first, disparity_confidence_level)),
    )
}

/// Half-open `[lower, upper)` interval containing the MRCA rank.
///
/// The lower end is the confident last commonality; the upper end is the
/// first observed disparity (a mismatch is never coincidental) or, absent
/// one, the shorter annotation's deposition count.
pub fn calc_rank_of_mrca_bounds_between<A, B>(
    first: &A,
    second: &B,
    confidence_level: f64,
) -> Option<(i64, i64)>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    let sweep = Sweep::new(first, second);
    let lower = sweep.last_commonality(threshold(first, confidence_level))?;
    let upper = sweep
        .observed_disparity()
        .unwrap_or_else(|| min_deposited(first, second));
    Some((lower, upper))
}

/// Half-open interval of generations elapsed on `focal` since the MRCA
pub fn calc_ranks_since_mrca_bounds_with<A, B>(
    focal: &A,
    other: &B,
    confidence_level: f64,
) -> Option<(i64, i64)>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    let (lower, upper) = calc_rank_of_mrca_bounds_between(focal, other, confidence_level)?;
    let deposited = focal.num_strata_deposited() as i64;
    Some((deposited - upper, deposited - lower))
}

/// Earliest mutual rank at which a shared ancestor could be confirmed.
///
/// Confirmation needs `m` mutual ranks, so this is the `m`-th one; `None`
/// when the annotations hold fewer.
pub fn calc_rank_of_earliest_detectable_mrca_between<A, B>(
    first: &A,
    second: &B,
    confidence_level: f64,
) -> Option<i64>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    let needed = threshold(first, confidence_level).max(1);
    let index = usize::try_from(needed - 1).ok()?;
    MutualStrata::new(first, second)
        .nth(index)
        .map(|stratum| stratum.rank)
}

/// Whether the annotations share any ancestor; `None` when they hold too
/// few mutual ranks to tell at this confidence
pub fn does_have_any_common_ancestor<A, B>(
    first: &A,
    second: &B,
    confidence_level: f64,
) -> Option<bool>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    if does_definitively_have_no_common_ancestor(first, second) {
        return Some(false);
    }
    calc_rank_of_earliest_detectable_mrca_between(first, second, confidence_level)?;
    Some(calc_rank_of_last_retained_commonality_between(first, second, confidence_level).is_some())
}

/// True iff the earliest mutual rank already disagrees
pub fn does_definitively_have_no_common_ancestor<A, B>(first: &A, second: &B) -> bool
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    MutualStrata::new(first, second)
        .next()
        .is_some_and(|stratum| !stratum.is_common())
}
