//! MRCA point estimators
//!
//! Working back from the first observed disparity, the MRCA lies in the gap
//! just below it unless the last `k` matches were all spurious collisions,
//! which happens with probability `p^k`. Weighting each candidate gap by that
//! chance times the prior's mass yields a posterior over gaps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Prior;
use crate::juxtaposition::{differentia_collision_probability, MutualStrata};
use crate::specimen::StratigraphicView;

/// Which point summary of the posterior to report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    /// Most probable rank within the most probable gap
    #[default]
    MaximumLikelihood,
    /// Posterior mean rank
    Unbiased,
}

impl Estimator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::MaximumLikelihood => "maximum_likelihood",
            Self::Unbiased => "unbiased",
        }
    }
}

impl fmt::Display for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized estimator: {0}")]
pub struct UnknownEstimator(pub String);

impl FromStr for Estimator {
    type Err = UnknownEstimator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "maximum_likelihood" => Ok(Self::MaximumLikelihood),
            "unbiased" => Ok(Self::Unbiased),
            other => Err(UnknownEstimator(other.to_string())),
        }
    }
}

/// Candidate gaps, most recent first: the first observed disparity (or the
/// shorter deposition count) followed by every matching rank below it
fn coincident_ranks<A, B>(first: &A, second: &B) -> Vec<i64>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    let mut matches = Vec::new();
    let mut ceiling = first.num_strata_deposited().min(second.num_strata_deposited()) as i64;
    for stratum in MutualStrata::new(first, second) {
        if !stratum.is_common() {
            ceiling = stratum.rank;
            break;
        }
        matches.push(stratum.rank);
    }
    if matches.is_empty() {
        return matches;
    }
    matches.push(ceiling);
    matches.reverse();
    matches
}

/// Point estimate inside a single gap
fn locate_within<P: Prior + ?Sized>(prior: &P, begin_inclusive: i64, end_exclusive: i64) -> f64 {
    let midpoint = (begin_inclusive as f64 + end_exclusive as f64 - 1.0) / 2.0;
    let mean = prior.calc_interval_conditioned_mean(begin_inclusive, end_exclusive);
    if mean > midpoint {
        (end_exclusive - 1) as f64
    } else if mean < midpoint {
        begin_inclusive as f64
    } else {
        midpoint
    }
}

/// Log posterior weight of each candidate gap, most recent first.
///
/// The `k`-th gap below the first disparity needs `k` spurious collisions,
/// so its weight is `k ln p` plus the prior's log mass.
fn log_gap_weights<'a, P: Prior + ?Sized>(
    ranks: &'a [i64],
    log_p: f64,
    prior: &'a P,
) -> impl Iterator<Item = (f64, i64, i64)> + 'a {
    ranks.windows(2).enumerate().map(move |(k, pair)| {
        let (end_exclusive, begin_inclusive) = (pair[0], pair[1]);
        let log_weight = k as f64 * log_p
            + prior.calc_interval_log_probability_proxy(begin_inclusive, end_exclusive);
        (log_weight, begin_inclusive, end_exclusive)
    })
}

fn log_collision_probability<A: StratigraphicView + ?Sized>(view: &A) -> f64 {
    differentia_collision_probability(view.differentia_bit_width()).ln()
}

/// Most probable MRCA rank; `None` without any matching mutual rank
pub fn estimate_rank_of_mrca_maximum_likelihood<A, B, P>(
    first: &A,
    second: &B,
    prior: &P,
) -> Option<f64>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
    P: Prior + ?Sized,
{
    let ranks = coincident_ranks(first, second);
    let earliest = *ranks.last()?;
    let log_p = log_collision_probability(first);

    let mut best: Option<(f64, i64, i64)> = None;
    for (k, (log_weight, begin_inclusive, end_exclusive)) in
        log_gap_weights(&ranks, log_p, prior).enumerate()
    {
        if best.map_or(true, |(top, _, _)| log_weight > top) {
            best = Some((log_weight, begin_inclusive, end_exclusive));
        }
        // everything older needs at least one more collision
        let remaining = (k + 1) as f64 * log_p
            + prior.calc_interval_log_probability_proxy(earliest, begin_inclusive);
        if best.is_some_and(|(top, _, _)| remaining < top) {
            break;
        }
    }
    best.map(|(_, begin_inclusive, end_exclusive)| {
        locate_within(prior, begin_inclusive, end_exclusive)
    })
}

/// Posterior mean MRCA rank; `None` without any matching mutual rank
pub fn estimate_rank_of_mrca_unbiased<A, B, P>(first: &A, second: &B, prior: &P) -> Option<f64>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
    P: Prior + ?Sized,
{
    let ranks = coincident_ranks(first, second);
    let log_p = log_collision_probability(first);
    let gaps: Vec<(f64, i64, i64)> = log_gap_weights(&ranks, log_p, prior).collect();
    let peak = gaps
        .iter()
        .map(|&(log_weight, _, _)| log_weight)
        .fold(f64::NEG_INFINITY, f64::max);
    if !peak.is_finite() {
        return None;
    }

    let mut total_weight = 0.0;
    let mut weighted_sum = 0.0;
    for (log_weight, begin_inclusive, end_exclusive) in gaps {
        let weight = (log_weight - peak).exp();
        if weight == 0.0 {
            continue;
        }
        total_weight += weight;
        weighted_sum +=
            weight * prior.calc_interval_conditioned_mean(begin_inclusive, end_exclusive);
    }
    Some(weighted_sum / total_weight)
}

/// Estimate the MRCA rank with the chosen estimator and prior
pub fn estimate_rank_of_mrca_between<A, B, P>(
    first: &A,
    second: &B,
    estimator: Estimator,
    prior: &P,
) -> Option<f64>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
    P: Prior + ?Sized,
{
    match estimator {
        Estimator::MaximumLikelihood => {
            estimate_rank_of_mrca_maximum_likelihood(first, second, prior)
        }
        Estimator::Unbiased => estimate_rank_of_mrca_unbiased(first, second, prior),
    }
}

/// Estimated generations elapsed on `focal` since the MRCA
pub fn estimate_ranks_since_mrca_with<A, B, P>(
    focal: &A,
    other: &B,
    estimator: Estimator,
    prior: &P,
) -> Option<f64>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
    P: Prior + ?Sized,
{
    let rank = estimate_rank_of_mrca_between(focal, other, estimator, prior)?;
    Some(focal.num_strata_deposited() as f64 - 1.0 - rank)
}

/// Estimated total generations separating the two lineages through their MRCA
pub fn estimate_patristic_distance_between<A, B, P>(
    first: &A,
    second: &B,
    estimator: Estimator,
    prior: &P,
) -> Option<f64>
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
    P: Prior + ?Sized,
{
    let rank = estimate_rank_of_mrca_between(first, second, estimator, prior)?;
    let since_first = first.num_strata_deposited() as f64 - 1.0 - rank;
    let since_second = second.num_strata_deposited() as f64 - 1.0 - rank;
    Some(since_first + since_second)
}
