//! StratumRetentionPolicy — the value type every column consults when pruning
//!
//! A policy is an algorithm tag plus its parameters. Facets fall into three
//! groups: invariants (bounds that hold for any history), scry (exact
//! predictions from the deposition count alone) and enact (the drop set for
//! one deposition).

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::ranks::{DropRanks, RetainedRanks};
use super::stride;
use super::{
    depth_proportional_resolution, depth_proportional_resolution_tapered, fixed_resolution,
    geom_seq_nth_root, geom_seq_nth_root_tapered, nominal_resolution, perfect_resolution,
    recency_proportional_resolution, recency_proportional_resolution_curbed, stochastic,
};

/// Failures raised by policy construction and scry facets
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid {name} = {value} for {algo}: must be at least {minimum}")]
    InvalidParameter {
        algo: &'static str,
        name: &'static str,
        value: u64,
        minimum: u64,
    },
    #[error("column index {index} out of range: only {num_retained} strata retained")]
    IndexOutOfRange { index: u64, num_retained: u64 },
    #[error("{0} cannot compute retained ranks from the deposition count alone")]
    Unsupported(&'static str),
    #[error("unrecognized policy string: {0}")]
    Unrecognized(String),
}

/// A stratum retention algorithm and its validated parameters.
///
/// Only the named constructors, `FromStr` and deserialization build a
/// policy, so every facet may assume its parameters are in range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StratumRetentionPolicy {
    algorithm: Algorithm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
enum Algorithm {
    /// Keep every stratum
    #[default]
    PerfectResolution,
    /// Keep only the first and most recent strata
    NominalResolution,
    /// Keep every `resolution`-th stratum
    FixedResolution { resolution: u64 },
    /// Keep about `resolution` evenly spaced strata
    DepthProportionalResolution { resolution: u64 },
    /// Depth-proportional with gradual release of dropped strata
    DepthProportionalResolutionTapered { resolution: u64 },
    /// Keep gaps proportional to recency, `resolution` strata per tier
    RecencyProportionalResolution { resolution: u64 },
    /// Recency-proportional, never more than `size_curb` strata
    RecencyProportionalResolutionCurbed { size_curb: u64 },
    /// Geometric tiers at `n^(j/degree)`, `interspersal` strata per tier
    GeomSeqNthRoot { degree: u64, interspersal: u64 },
    /// Geometric tiers with gradual release of dropped strata
    GeomSeqNthRootTapered { degree: u64, interspersal: u64 },
    /// Random coin-flip retention; history dependent
    Stochastic,
}

fn require(
    algo: &'static str,
    name: &'static str,
    value: u64,
    minimum: u64,
) -> Result<(), PolicyError> {
    if value < minimum {
        return Err(PolicyError::InvalidParameter {
            algo,
            name,
            value,
            minimum,
        });
    }
    Ok(())
}

impl StratumRetentionPolicy {
    pub fn perfect_resolution() -> Self {
        Self::from_algorithm(Algorithm::PerfectResolution)
    }

    pub fn nominal_resolution() -> Self {
        Self::from_algorithm(Algorithm::NominalResolution)
    }

    pub fn fixed_resolution(resolution: u64) -> Result<Self, PolicyError> {
        Self::validated(Algorithm::FixedResolution { resolution })
    }

    pub fn depth_proportional_resolution(resolution: u64) -> Result<Self, PolicyError> {
        Self::validated(Algorithm::DepthProportionalResolution { resolution })
    }

    pub fn depth_proportional_resolution_tapered(resolution: u64) -> Result<Self, PolicyError> {
        Self::validated(Algorithm::DepthProportionalResolutionTapered { resolution })
    }

    pub fn recency_proportional_resolution(resolution: u64) -> Result<Self, PolicyError> {
        Self::validated(Algorithm::RecencyProportionalResolution { resolution })
    }

    pub fn recency_proportional_resolution_curbed(size_curb: u64) -> Result<Self, PolicyError> {
        Self::validated(Algorithm::RecencyProportionalResolutionCurbed { size_curb })
    }

    pub fn geom_seq_nth_root(degree: u64, interspersal: u64) -> Result<Self, PolicyError> {
        Self::validated(Algorithm::GeomSeqNthRoot {
                degree,
                interspersal,
            })
    }

    pub fn geom_seq_nth_root_tapered(degree: u64, interspersal: u64) -> Result<Self, PolicyError> {
        Self::validated(Algorithm::GeomSeqNthRootTapered {
                degree,
                interspersal,
            })
    }

    pub fn stochastic() -> Self {
        Self::from_algorithm(Algorithm::Stochastic)
    }

    const fn from_algorithm(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    fn validated(algorithm: Algorithm) -> Result<Self, PolicyError> {
        let policy = Self::from_algorithm(algorithm);
        policy.validate()?;
        Ok(policy)
    }

    fn validate(&self) -> Result<(), PolicyError> {
        let algo = self.algo_name();
        match self.algorithm {
            Algorithm::PerfectResolution
            | Algorithm::NominalResolution
            | Algorithm::Stochastic => Ok(()),
            Algorithm::FixedResolution { resolution }
            | Algorithm::DepthProportionalResolution { resolution }
            | Algorithm::DepthProportionalResolutionTapered { resolution }
            | Algorithm::RecencyProportionalResolution { resolution } => {
                require(algo, "resolution", resolution, 1)
            }
            Algorithm::RecencyProportionalResolutionCurbed { size_curb } => {
                require(algo, "size_curb", size_curb, 3)
            }
            Algorithm::GeomSeqNthRoot {
                degree,
                interspersal,
            }
            | Algorithm::GeomSeqNthRootTapered {
                degree,
                interspersal,
            } => {
                require(algo, "degree", degree, 1)?;
                require(algo, "interspersal", interspersal, 1)
            }
        }
    }

    pub fn algo_name(&self) -> &'static str {
        match self.algorithm {
            Algorithm::PerfectResolution => perfect_resolution::ALGO_NAME,
            Algorithm::NominalResolution => nominal_resolution::ALGO_NAME,
            Algorithm::FixedResolution { .. } => fixed_resolution::ALGO_NAME,
            Algorithm::DepthProportionalResolution { .. } => {
                depth_proportional_resolution::ALGO_NAME
            }
            Algorithm::DepthProportionalResolutionTapered { .. } => {
                depth_proportional_resolution_tapered::ALGO_NAME
            }
            Algorithm::RecencyProportionalResolution { .. } => {
                recency_proportional_resolution::ALGO_NAME
            }
            Algorithm::RecencyProportionalResolutionCurbed { .. } => {
                recency_proportional_resolution_curbed::ALGO_NAME
            }
            Algorithm::GeomSeqNthRoot { .. } => geom_seq_nth_root::ALGO_NAME,
            Algorithm::GeomSeqNthRootTapered { .. } => geom_seq_nth_root_tapered::ALGO_NAME,
            Algorithm::Stochastic => stochastic::ALGO_NAME,
        }
    }

    /// Whether retained ranks can be recomputed from the deposition count
    pub fn has_rank_scry(&self) -> bool {
        !matches!(self.algorithm, Algorithm::Stochastic)
    }

    /// Stride schedule for the policies that are a pure stride rule
    fn stride(&self, recency: u64, n: u64) -> Option<u64> {
        match self.algorithm {
            Algorithm::FixedResolution { resolution } => Some(fixed_resolution::stride(resolution)),
            Algorithm::DepthProportionalResolution { resolution } => {
                Some(depth_proportional_resolution::stride(resolution, n))
            }
            Algorithm::RecencyProportionalResolution { resolution } => {
                Some(recency_proportional_resolution::stride(resolution, recency))
            }
            Algorithm::RecencyProportionalResolutionCurbed { size_curb } => Some(
                recency_proportional_resolution_curbed::stride(size_curb, recency, n),
            ),
            Algorithm::GeomSeqNthRoot {
                degree,
                interspersal,
            } => Some(geom_seq_nth_root::stride(degree, interspersal, recency, n)),
            _ => None,
        }
    }

    fn has_stride(&self) -> bool {
        self.stride(0, 1).is_some()
    }

    fn stride_or_unit(&self, recency: u64, n: u64) -> u64 {
        self.stride(recency, n).unwrap_or(1)
    }

    fn retained_rank_list(&self, n: u64) -> Option<Vec<u64>> {
        match self.algorithm {
            Algorithm::PerfectResolution => Some(perfect_resolution::retained_ranks(n).collect()),
            Algorithm::NominalResolution => Some(nominal_resolution::retained_ranks(n)),
            Algorithm::DepthProportionalResolutionTapered { resolution } => Some(
                depth_proportional_resolution_tapered::retained_ranks(resolution, n),
            ),
            Algorithm::GeomSeqNthRootTapered {
                degree,
                interspersal,
            } => Some(geom_seq_nth_root_tapered::retained_ranks(
                degree,
                interspersal,
                n,
            )),
            Algorithm::Stochastic => None,
            _ => Some(stride::retained_ranks(
                |recency, n| self.stride_or_unit(recency, n),
                n,
            )),
        }
    }

    // ---- invariants -----------------------------------------------------

    /// Upper bound on the retained count after `n` depositions, for any history
    pub fn calc_num_strata_retained_upper_bound(&self, n: u64) -> u64 {
        match self.algorithm {
            Algorithm::PerfectResolution | Algorithm::Stochastic => n,
            Algorithm::NominalResolution => nominal_resolution::num_retained_exact(n),
            Algorithm::FixedResolution { resolution } => {
                fixed_resolution::num_retained_upper_bound(resolution, n)
            }
            Algorithm::DepthProportionalResolution { resolution }
            | Algorithm::DepthProportionalResolutionTapered { resolution } => {
                depth_proportional_resolution::num_retained_upper_bound(resolution, n)
            }
            Algorithm::RecencyProportionalResolution { resolution } => {
                recency_proportional_resolution::num_retained_upper_bound(resolution, n)
            }
            Algorithm::RecencyProportionalResolutionCurbed { size_curb } => {
                recency_proportional_resolution_curbed::num_retained_upper_bound(size_curb, n)
            }
            Algorithm::GeomSeqNthRoot {
                degree,
                interspersal,
            }
            | Algorithm::GeomSeqNthRootTapered {
                degree,
                interspersal,
            } => geom_seq_nth_root::num_retained_upper_bound(degree, interspersal, n),
        }
    }

    /// Worst-case count of ranks between the MRCA and the nearest mutually
    /// retained ranks bracketing it, for columns of `a` and `b` depositions
    /// whose true MRCA is at `actual_rank_of_mrca`
    pub fn calc_mrca_uncertainty_abs_upper_bound(
        &self,
        a: u64,
        b: u64,
        actual_rank_of_mrca: u64,
    ) -> u64 {
        let t = actual_rank_of_mrca;
        match self.algorithm {
            Algorithm::PerfectResolution => 0,
            Algorithm::NominalResolution | Algorithm::Stochastic => {
                nominal_resolution::mrca_uncertainty_abs_upper_bound(a, b, t)
            }
            Algorithm::FixedResolution { resolution } => {
                fixed_resolution::mrca_uncertainty_abs_upper_bound(resolution, a, b, t)
            }
            Algorithm::RecencyProportionalResolution { resolution } => {
                recency_proportional_resolution::mrca_uncertainty_abs_upper_bound(
                    resolution, a, b, t,
                )
            }
            Algorithm::DepthProportionalResolutionTapered { resolution } => {
                Self::from_algorithm(Algorithm::DepthProportionalResolution { resolution })
                    .calc_mrca_uncertainty_abs_upper_bound(a, b, t)
            }
            Algorithm::GeomSeqNthRootTapered {
                degree,
                interspersal,
            } => Self::from_algorithm(Algorithm::GeomSeqNthRoot {
                degree,
                interspersal,
            })
            .calc_mrca_uncertainty_abs_upper_bound(a, b, t),
            _ => stride::mrca_uncertainty_abs_upper_bound(
                |recency, n| self.stride_or_unit(recency, n),
                a,
                b,
                t,
            ),
        }
    }

    /// Upper bound on uncertainty relative to the MRCA's recency
    pub fn calc_mrca_uncertainty_rel_upper_bound(
        &self,
        a: u64,
        b: u64,
        actual_rank_of_mrca: u64,
    ) -> f64 {
        let abs = self.calc_mrca_uncertainty_abs_upper_bound(a, b, actual_rank_of_mrca);
        stride::relative_uncertainty(abs, a, b, actual_rank_of_mrca)
    }

    // ---- scry -----------------------------------------------------------

    /// Exact retained count after `n` depositions, when history independent
    pub fn calc_num_strata_retained_exact(&self, n: u64) -> Option<u64> {
        match self.algorithm {
            Algorithm::PerfectResolution => Some(perfect_resolution::num_retained_exact(n)),
            Algorithm::NominalResolution => Some(nominal_resolution::num_retained_exact(n)),
            Algorithm::FixedResolution { resolution } => {
                Some(fixed_resolution::num_retained_exact(resolution, n))
            }
            Algorithm::Stochastic => None,
            _ => self.retained_rank_list(n).map(|ranks| ranks.len() as u64),
        }
    }

    /// Rank of the `index`-th retained stratum after `n` depositions
    pub fn calc_rank_at_column_index(&self, index: u64, n: u64) -> Result<u64, PolicyError> {
        match self.algorithm {
            Algorithm::PerfectResolution => {
                if index < n {
                    Ok(index)
                } else {
                    Err(PolicyError::IndexOutOfRange {
                        index,
                        num_retained: n,
                    })
                }
            }
            _ => {
                let ranks = self
                    .retained_rank_list(n)
                    .ok_or(PolicyError::Unsupported(self.algo_name()))?;
                usize::try_from(index)
                    .ok()
                    .and_then(|i| ranks.get(i).copied())
                    .ok_or(PolicyError::IndexOutOfRange {
                        index,
                        num_retained: ranks.len() as u64,
                    })
            }
        }
    }

    /// Lazily enumerate retained ranks after `n` depositions, ascending
    pub fn iter_retained_ranks(&self, n: u64) -> Option<RetainedRanks> {
        match self.algorithm {
            Algorithm::PerfectResolution => Some(RetainedRanks::contiguous(
                perfect_resolution::retained_ranks(n),
            )),
            _ => self.retained_rank_list(n).map(RetainedRanks::listed),
        }
    }

    /// Exact MRCA uncertainty, when retained ranks are predictable
    pub fn calc_mrca_uncertainty_abs_exact(
        &self,
        a: u64,
        b: u64,
        actual_rank_of_mrca: u64,
    ) -> Option<u64> {
        if self.algorithm == Algorithm::PerfectResolution {
            return Some(0);
        }
        let first = self.retained_rank_list(a)?;
        let second = self.retained_rank_list(b)?;
        Some(stride::mrca_uncertainty_abs_exact(
            &first,
            &second,
            a,
            b,
            actual_rank_of_mrca,
        ))
    }

    pub fn calc_mrca_uncertainty_rel_exact(
        &self,
        a: u64,
        b: u64,
        actual_rank_of_mrca: u64,
    ) -> Option<f64> {
        self.calc_mrca_uncertainty_abs_exact(a, b, actual_rank_of_mrca)
            .map(|abs| stride::relative_uncertainty(abs, a, b, actual_rank_of_mrca))
    }

    // ---- enact ----------------------------------------------------------

    /// Ranks to discard when moving from `n` to `n + 1` depositions.
    ///
    /// `retained_ranks` are the ranks currently held, ascending; they may or
    /// may not already include the incoming rank `n`, which is never dropped.
    /// Stochastic retention flips its coins on the thread-local RNG.
    pub fn gen_drop_ranks<I>(&self, n: u64, retained_ranks: I) -> DropRanks
    where
        I: IntoIterator<Item = u64>,
    {
        self.gen_drop_ranks_with_rng(n, retained_ranks, &mut rand::thread_rng())
    }

    /// `gen_drop_ranks` with the coin flips drawn from `rng`
    pub fn gen_drop_ranks_with_rng<I, R>(&self, n: u64, retained_ranks: I, rng: &mut R) -> DropRanks
    where
        I: IntoIterator<Item = u64>,
        R: Rng + ?Sized,
    {
        let held = retained_ranks.into_iter();
        let dropped: Vec<u64> = match self.algorithm {
            Algorithm::PerfectResolution => return DropRanks::none(),
            // only the previous tip can lose its place
            Algorithm::NominalResolution => previous_tip(n, |_| true),
            Algorithm::FixedResolution { resolution } => {
                previous_tip(n, |rank| rank % resolution != 0)
            }
            Algorithm::Stochastic => held
                .filter(|&rank| stochastic::is_dropped_with_rng(rank, n, rng))
                .collect(),
            _ if self.has_stride() => held
                .filter(|&rank| {
                    rank < n
                        && !stride::is_retained(
                            |recency, n| self.stride_or_unit(recency, n),
                            rank,
                            n + 1,
                        )
                })
                .collect(),
            _ => {
                let kept: BTreeSet<u64> = self
                    .retained_rank_list(n + 1)
                    .unwrap_or_default()
                    .into_iter()
                    .collect();
                held.filter(|rank| !kept.contains(rank)).collect()
            }
        };
        DropRanks::new(dropped)
    }
}

/// The tip before rank `n` arrives, when it exists and `is_dropped` says so
fn previous_tip(n: u64, is_dropped: impl Fn(u64) -> bool) -> Vec<u64> {
    match n.checked_sub(1) {
        Some(tip) if tip > 0 && is_dropped(tip) => vec![tip],
        _ => Vec::new(),
    }
}

impl fmt::Display for StratumRetentionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let algo = self.algo_name();
        match self.algorithm {
            Algorithm::PerfectResolution | Algorithm::NominalResolution | Algorithm::Stochastic => {
                write!(f, "{algo}")
            }
            Algorithm::FixedResolution { resolution }
            | Algorithm::DepthProportionalResolution { resolution }
            | Algorithm::DepthProportionalResolutionTapered { resolution }
            | Algorithm::RecencyProportionalResolution { resolution } => {
                write!(f, "{algo}(resolution={resolution})")
            }
            Algorithm::RecencyProportionalResolutionCurbed { size_curb } => {
                write!(f, "{algo}(size_curb={size_curb})")
            }
            Algorithm::GeomSeqNthRoot {
                degree,
                interspersal,
            }
            | Algorithm::GeomSeqNthRootTapered {
                degree,
                interspersal,
            } => write!(f, "{algo}(degree={degree}, interspersal={interspersal})"),
        }
    }
}

/// Split `name(key=value, ...)` into its name and parameters
fn parse_policy_text(text: &str) -> Option<(&str, Vec<(&str, u64)>)> {
    let text = text.trim();
    let Some(open) = text.find('(') else {
        return Some((text, Vec::new()));
    };
    let body = text[open + 1..].strip_suffix(')')?;
    let mut params = Vec::new();
    for item in body.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let (key, value) = item.split_once('=')?;
        params.push((key.trim(), value.trim().parse().ok()?));
    }
    Some((text[..open].trim(), params))
}

impl FromStr for StratumRetentionPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unrecognized = || PolicyError::Unrecognized(s.to_string());
        let (name, params) = parse_policy_text(s).ok_or_else(unrecognized)?;
        let take = |key: &str| -> Result<u64, PolicyError> {
            params
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| *v)
                .ok_or_else(unrecognized)
        };
        let expect_params = |count: usize| -> Result<(), PolicyError> {
            if params.len() == count {
                Ok(())
            } else {
                Err(unrecognized())
            }
        };
        match name {
            "perfect_resolution" => expect_params(0).map(|_| Self::perfect_resolution()),
            "nominal_resolution" => expect_params(0).map(|_| Self::nominal_resolution()),
            "stochastic" => expect_params(0).map(|_| Self::stochastic()),
            "fixed_resolution" => {
                expect_params(1)?;
                Self::fixed_resolution(take("resolution")?)
            }
            "depth_proportional_resolution" => {
                expect_params(1)?;
                Self::depth_proportional_resolution(take("resolution")?)
            }
            "depth_proportional_resolution_tapered" => {
                expect_params(1)?;
                Self::depth_proportional_resolution_tapered(take("resolution")?)
            }
            "recency_proportional_resolution" => {
                expect_params(1)?;
                Self::recency_proportional_resolution(take("resolution")?)
            }
            "recency_proportional_resolution_curbed" => {
                expect_params(1)?;
                Self::recency_proportional_resolution_curbed(take("size_curb")?)
            }
            "geom_seq_nth_root" => {
                expect_params(2)?;
                Self::geom_seq_nth_root(take("degree")?, take("interspersal")?)
            }
            "geom_seq_nth_root_tapered" => {
                expect_params(2)?;
                Self::geom_seq_nth_root_tapered(take("degree")?, take("interspersal")?)
            }
            _ => Err(unrecognized()),
        }
    }
}

impl TryFrom<String> for StratumRetentionPolicy {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StratumRetentionPolicy> for String {
    fn from(policy: StratumRetentionPolicy) -> Self {
        policy.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_policies() -> Vec<StratumRetentionPolicy> {
        vec![
            StratumRetentionPolicy::perfect_resolution(),
            StratumRetentionPolicy::nominal_resolution(),
            StratumRetentionPolicy::fixed_resolution(4).unwrap(),
            StratumRetentionPolicy::depth_proportional_resolution(3).unwrap(),
            StratumRetentionPolicy::depth_proportional_resolution_tapered(3).unwrap(),
            StratumRetentionPolicy::recency_proportional_resolution(2).unwrap(),
            StratumRetentionPolicy::recency_proportional_resolution_curbed(8).unwrap(),
            StratumRetentionPolicy::geom_seq_nth_root(2, 2).unwrap(),
            StratumRetentionPolicy::geom_seq_nth_root_tapered(2, 2).unwrap(),
        ]
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        assert!(StratumRetentionPolicy::fixed_resolution(0).is_err());
        assert!(StratumRetentionPolicy::recency_proportional_resolution(0).is_err());
        assert!(StratumRetentionPolicy::recency_proportional_resolution_curbed(2).is_err());
        assert!(StratumRetentionPolicy::geom_seq_nth_root(0, 2).is_err());
        assert!(StratumRetentionPolicy::geom_seq_nth_root_tapered(2, 0).is_err());
        let err = StratumRetentionPolicy::fixed_resolution(0).unwrap_err();
        assert!(matches!(err, PolicyError::InvalidParameter { name: "resolution", .. }));
    }

    #[test]
    fn test_endpoints_and_empty() {
        for policy in all_policies() {
            assert_eq!(policy.iter_retained_ranks(0).unwrap().count(), 0);
            assert_eq!(policy.iter_retained_ranks(1).unwrap().collect::<Vec<_>>(), vec![0]);
            for n in 1..300 {
                let ranks: Vec<u64> = policy.iter_retained_ranks(n).unwrap().collect();
                assert_eq!(ranks[0], 0, "{policy} n={n}");
                assert_eq!(*ranks.last().unwrap(), n - 1, "{policy} n={n}");
            }
        }
    }

    #[test]
    fn test_drop_set_complements_new_rank() {
        for policy in all_policies() {
            for n in 0..300 {
                let before: BTreeSet<u64> = policy.iter_retained_ranks(n).unwrap().collect();
                let after: BTreeSet<u64> = policy.iter_retained_ranks(n + 1).unwrap().collect();
                let dropped: BTreeSet<u64> =
                    policy.gen_drop_ranks(n, before.iter().copied()).collect();
                let mut lhs = after.clone();
                lhs.extend(dropped.iter().copied());
                let mut rhs = before.clone();
                rhs.insert(n);
                assert_eq!(lhs, rhs, "{policy} n={n}");
                assert!(dropped.is_disjoint(&after));
            }
        }
    }

    #[test]
    fn test_exact_count_and_rank_at_index() {
        for policy in all_policies() {
            for n in [0, 1, 2, 7, 64, 100, 513] {
                let ranks: Vec<u64> = policy.iter_retained_ranks(n).unwrap().collect();
                assert_eq!(policy.calc_num_strata_retained_exact(n), Some(ranks.len() as u64));
                assert!(policy.calc_num_strata_retained_upper_bound(n) >= ranks.len() as u64);
                for (i, rank) in ranks.iter().enumerate() {
                    assert_eq!(policy.calc_rank_at_column_index(i as u64, n), Ok(*rank));
                }
                assert!(matches!(
                    policy.calc_rank_at_column_index(ranks.len() as u64, n),
                    Err(PolicyError::IndexOutOfRange { .. })
                ));
            }
        }
    }

    #[test]
    fn test_uncertainty_exact_within_bound() {
        for policy in all_policies() {
            for (a, b) in [(50, 50), (100, 37), (257, 300)] {
                for t in 0..a.min(b) {
                    let exact = policy.calc_mrca_uncertainty_abs_exact(a, b, t).unwrap();
                    let bound = policy.calc_mrca_uncertainty_abs_upper_bound(a, b, t);
                    assert!(exact <= bound, "{policy} a={a} b={b} t={t}: {exact} > {bound}");
                    let rel_exact = policy.calc_mrca_uncertainty_rel_exact(a, b, t).unwrap();
                    let rel_bound = policy.calc_mrca_uncertainty_rel_upper_bound(a, b, t);
                    assert!(rel_exact <= rel_bound);
                }
            }
        }
    }

    #[test]
    fn test_nominal_drops_previous_tip() {
        let policy = StratumRetentionPolicy::nominal_resolution();
        let dropped: Vec<u64> = policy.gen_drop_ranks(100, [0, 99]).collect();
        assert_eq!(dropped, vec![99]);
        let dropped: Vec<u64> = policy.gen_drop_ranks(100, [0, 99, 100]).collect();
        assert_eq!(dropped, vec![99]);
        assert_eq!(policy.iter_retained_ranks(101).unwrap().collect::<Vec<_>>(), vec![0, 100]);
    }

    #[test]
    fn test_stochastic_has_no_scry() {
        let policy = StratumRetentionPolicy::stochastic();
        assert!(!policy.has_rank_scry());
        assert!(policy.iter_retained_ranks(10).is_none());
        assert_eq!(policy.calc_num_strata_retained_exact(10), None);
        assert_eq!(policy.calc_mrca_uncertainty_abs_exact(10, 10, 3), None);
        assert_eq!(
            policy.calc_rank_at_column_index(0, 10),
            Err(PolicyError::Unsupported("stochastic"))
        );
        assert_eq!(policy.calc_num_strata_retained_upper_bound(10), 10);
    }

    #[test]
    fn test_string_round_trip() {
        let mut policies = all_policies();
        policies.push(StratumRetentionPolicy::stochastic());
        for policy in policies {
            let text = policy.to_string();
            assert_eq!(text.parse::<StratumRetentionPolicy>(), Ok(policy));
        }
        assert_eq!(
            StratumRetentionPolicy::fixed_resolution(10).unwrap().to_string(),
            "fixed_resolution(resolution=10)"
        );
        assert_eq!(
            "geom_seq_nth_root( degree = 3 , interspersal=4 )".parse(),
            StratumRetentionPolicy::geom_seq_nth_root(3, 4)
        );
    }

    #[test]
    fn test_malformed_strings_rejected() {
        for text in [
            "",
            "fixed_resolution",
            "fixed_resolution(resolution=0)",
            "fixed_resolution(k=3)",
            "fixed_resolution(resolution=3, extra=1)",
            "perfect_resolution(resolution=3)",
            "geom_seq_nth_root(degree=2)",
            "recency_proportional_resolution(resolution=abc)",
            "unheard_of",
        ] {
            assert!(text.parse::<StratumRetentionPolicy>().is_err(), "{text}");
        }
    }

    #[test]
    fn test_serde_uses_string_form() {
        let policy = StratumRetentionPolicy::recency_proportional_resolution_curbed(10).unwrap();
        let json = serde_json::to_string(&policy).unwrap();
        assert_eq!(json, "\"recency_proportional_resolution_curbed(size_curb=10)\"");
        let back: StratumRetentionPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
        let zero_resolution = "\"fixed_resolution(resolution=0)\"";
        assert!(serde_json::from_str::<StratumRetentionPolicy>(zero_resolution).is_err());
    }

    #[test]
    fn test_out_of_range_parameters_never_reach_facets() {
        for text in [
            "\"fixed_resolution(resolution=0)\"",
            "\"recency_proportional_resolution_curbed(size_curb=1)\"",
            "\"recency_proportional_resolution_curbed(size_curb=0)\"",
            "\"geom_seq_nth_root(degree=2, interspersal=0)\"",
            "\"geom_seq_nth_root_tapered(degree=0, interspersal=2)\"",
        ] {
            assert!(serde_json::from_str::<StratumRetentionPolicy>(text).is_err(), "{text}");
        }
        assert!(matches!(
            StratumRetentionPolicy::recency_proportional_resolution_curbed(1),
            Err(PolicyError::InvalidParameter { name: "size_curb", value: 1, minimum: 3, .. })
        ));
        assert_eq!(StratumRetentionPolicy::default(), StratumRetentionPolicy::perfect_resolution());
    }

    #[test]
    fn test_stochastic_drops_follow_rng() {
        use rand::rngs::StdRng;
        use rand::SeedableRng;

        let policy = StratumRetentionPolicy::stochastic();
        let simulate = |seed: u64| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut held: Vec<u64> = Vec::new();
            for n in 0..2000 {
                held.push(n);
                let dropped: Vec<u64> = policy
                    .gen_drop_ranks_with_rng(n, held.iter().copied(), &mut rng)
                    .collect();
                held.retain(|rank| !dropped.contains(rank));
            }
            held
        };
        let first = simulate(1);
        assert_eq!(first, simulate(1));
        assert_ne!(first, simulate(999));
        for held in [&first, &simulate(7)] {
            assert_eq!(held[0], 0);
            assert_eq!(*held.last().unwrap(), 1999);
            assert!(held.len() < 60, "retained {}", held.len());
        }
    }
}
