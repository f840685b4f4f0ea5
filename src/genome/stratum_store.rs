//! StratumStore — ordered storage for a column's retained strata
//!
//! Policies that can recompute retained ranks from the deposition count let
//! the store omit ranks entirely; history-dependent policies need every
//! stratum tagged with its rank.

use serde::{Deserialize, Serialize};

use super::Stratum;
use crate::policy::StratumRetentionPolicy;

/// Retained strata in ascending rank order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StratumStore {
    /// Each stratum carries its deposition rank
    RankTagged(Vec<Stratum>),
    /// Ranks are recomputed from the retention policy
    RankImplicit(Vec<Stratum>),
}

impl StratumStore {
    /// Pick the cheapest representation the policy allows
    pub fn for_policy(
        policy: &StratumRetentionPolicy,
        always_store_rank_in_stratum: bool,
    ) -> Self {
        if always_store_rank_in_stratum || !policy.has_rank_scry() {
            Self::RankTagged(Vec::new())
        } else {
            Self::RankImplicit(Vec::new())
        }
    }

    pub fn strata(&self) -> &[Stratum] {
        match self {
            Self::RankTagged(strata) | Self::RankImplicit(strata) => strata,
        }
    }

    fn strata_mut(&mut self) -> &mut Vec<Stratum> {
        match self {
            Self::RankTagged(strata) | Self::RankImplicit(strata) => strata,
        }
    }

    pub fn len(&self) -> usize {
        self.strata().len()
    }

    pub fn is_empty(&self) -> bool {
        self.strata().is_empty()
    }

    pub fn stores_deposition_ranks(&self) -> bool {
        matches!(self, Self::RankTagged(_))
    }

    /// Append a stratum deposited at `rank`
    pub(crate) fn push(&mut self, stratum: Stratum, rank: u64) {
        let stratum = match self {
            Self::RankTagged(_) => stratum.with_rank(rank),
            Self::RankImplicit(_) => Stratum {
                deposition_rank: None,
                ..stratum
            },
        };
        self.strata_mut().push(stratum);
    }

    /// Ranks of the held strata, given the policy's view of `num_strata_deposited`
    pub fn ranks(&self, policy: &StratumRetentionPolicy, num_strata_deposited: u64) -> Vec<u64> {
        match self {
            Self::RankTagged(strata) => strata
                .iter()
                .filter_map(|stratum| stratum.deposition_rank)
                .collect(),
            Self::RankImplicit(_) => policy
                .iter_retained_ranks(num_strata_deposited)
                .map(Iterator::collect)
                .unwrap_or_default(),
        }
    }

    /// Remove the strata whose ranks appear in `dropped`.
    ///
    /// `held` lists the rank of every stored stratum; both are ascending.
    /// Strata below the first dropped rank are left in place.
    pub(crate) fn discard(&mut self, held: &[u64], dropped: &[u64]) {
        let Some(&first) = dropped.first() else {
            return;
        };
        let start = held.partition_point(|&rank| rank < first);
        let strata = self.strata_mut();
        let mut cursor = 0;
        let mut write = start;
        for read in start..strata.len() {
            let rank = held[read];
            while cursor < dropped.len() && dropped[cursor] < rank {
                cursor += 1;
            }
            if cursor < dropped.len() && dropped[cursor] == rank {
                continue;
            }
            strata.swap(write, read);
            write += 1;
        }
        strata.truncate(write);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_representation_follows_policy() {
        let perfect = StratumRetentionPolicy::perfect_resolution();
        assert!(!StratumStore::for_policy(&perfect, false).stores_deposition_ranks());
        assert!(StratumStore::for_policy(&perfect, true).stores_deposition_ranks());
        let stochastic = StratumRetentionPolicy::stochastic();
        assert!(StratumStore::for_policy(&stochastic, false).stores_deposition_ranks());
    }

    #[test]
    fn test_push_tags_only_when_needed() {
        let policy = StratumRetentionPolicy::perfect_resolution();
        let mut implicit = StratumStore::for_policy(&policy, false);
        implicit.push(Stratum::new(1).with_rank(9), 0);
        assert_eq!(implicit.strata()[0].deposition_rank, None);
        let mut tagged = StratumStore::for_policy(&policy, true);
        tagged.push(Stratum::new(1), 4);
        assert_eq!(tagged.strata()[0].deposition_rank, Some(4));
        assert_eq!(tagged.ranks(&policy, 99), vec![4]);
    }

    #[test]
    fn test_discard_by_rank() {
        let policy = StratumRetentionPolicy::perfect_resolution();
        let mut store = StratumStore::for_policy(&policy, false);
        for (rank, differentia) in [10, 20, 30, 40, 50].into_iter().enumerate() {
            store.push(Stratum::new(differentia), rank as u64);
        }
        store.discard(&[0, 3, 5, 8, 9], &[3, 4, 9]);
        let left: Vec<u64> = store.strata().iter().map(|s| s.differentia).collect();
        assert_eq!(left, vec![10, 30, 40]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_discard_tail_only() {
        let policy = StratumRetentionPolicy::perfect_resolution();
        let mut store = StratumStore::for_policy(&policy, true);
        for rank in 0..6 {
            store.push(Stratum::new(rank * 10), rank);
        }
        store.discard(&[0, 1, 2, 3, 4, 5], &[4]);
        let left: Vec<u64> = store.strata().iter().map(|s| s.differentia).collect();
        assert_eq!(left, vec![0, 10, 20, 30, 50]);
        store.discard(&[0, 1, 2, 3, 5], &[]);
        assert_eq!(store.len(), 5);
    }
}
