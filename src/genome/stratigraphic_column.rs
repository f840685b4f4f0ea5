//! HereditaryStratigraphicColumn — the annotation a lineage carries
//!
//! Every generation the column appends one random stratum and asks its
//! retention policy which older strata to forget. Rank 0 and the newest rank
//! are always present, ranks stay strictly increasing, and the retained
//! count never exceeds the policy's bound.

use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{max_differentia, Stratum, StratumStore, MAX_DIFFERENTIA_BIT_WIDTH};
use crate::policy::{PolicyError, StratumRetentionPolicy};
use crate::specimen::{Specimen, StratigraphicView};

/// Errors raised while building a column
#[derive(Debug, thiserror::Error)]
pub enum ColumnError {
    #[error("unsupported differentia bit width {0}: must be within 1..=64")]
    UnsupportedBitWidth(u32),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    #[error("column index {index} out of range: only {num_retained} strata retained")]
    IndexOutOfRange { index: usize, num_retained: usize },
    #[error("inconsistent strata: {0}")]
    InconsistentStrata(String),
}

/// Construction parameters for a column
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnConfig {
    /// Which strata to keep as the column grows
    pub policy: StratumRetentionPolicy,
    /// Bits per differentia, 1 through 64
    pub differentia_bit_width: u32,
    /// Tag every stratum with its rank even when the policy could recompute it
    pub always_store_rank_in_stratum: bool,
    /// Annotation attached to the founding stratum
    pub initial_stratum_annotation: Option<serde_json::Value>,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self {
            policy: StratumRetentionPolicy::default(),
            differentia_bit_width: 64,
            always_store_rank_in_stratum: false,
            initial_stratum_annotation: None,
        }
    }
}

impl ColumnConfig {
    pub fn new(policy: StratumRetentionPolicy, differentia_bit_width: u32) -> Self {
        Self {
            policy,
            differentia_bit_width,
            ..Self::default()
        }
    }

    /// Single-bit differentia: smallest footprint, loosest bounds
    pub fn compact(policy: StratumRetentionPolicy) -> Self {
        Self::new(policy, 1)
    }

    fn validate(&self) -> Result<(), ColumnError> {
        let bit_width = self.differentia_bit_width;
        if bit_width == 0 || bit_width > MAX_DIFFERENTIA_BIT_WIDTH {
            return Err(ColumnError::UnsupportedBitWidth(bit_width));
        }
        Ok(())
    }
}

/// A lineage's append-only, policy-pruned record of differentiae
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HereditaryStratigraphicColumn {
    policy: StratumRetentionPolicy,
    differentia_bit_width: u32,
    store: StratumStore,
    num_strata_deposited: u64,
    /// Rank of every stored stratum; rebuilt on first use after deserializing
    #[serde(skip)]
    rank_cache: Vec<u64>,
}

impl HereditaryStratigraphicColumn {
    /// Found a column holding a single stratum at rank 0
    pub fn new(
        policy: StratumRetentionPolicy,
        differentia_bit_width: u32,
    ) -> Result<Self, ColumnError> {
        Self::with_config(ColumnConfig::new(policy, differentia_bit_width))
    }

    pub fn with_config(config: ColumnConfig) -> Result<Self, ColumnError> {
        Self::with_config_and_rng(config, &mut rand::thread_rng())
    }

    pub fn with_config_and_rng<R: Rng + ?Sized>(
        config: ColumnConfig,
        rng: &mut R,
    ) -> Result<Self, ColumnError> {
        let mut column = Self::empty(&config)?;
        debug!(
            "Founding column: policy={}, differentia_bit_width={}",
            column.policy, column.differentia_bit_width
        );
        column.deposit_stratum_with_rng(rng, config.initial_stratum_annotation);
        Ok(column)
    }

    /// A column with no depositions at all; only reachable by deserialization
    fn empty(config: &ColumnConfig) -> Result<Self, ColumnError> {
        config.validate()?;
        Ok(Self {
            policy: config.policy,
            differentia_bit_width: config.differentia_bit_width,
            store: StratumStore::for_policy(&config.policy, config.always_store_rank_in_stratum),
            num_strata_deposited: 0,
            rank_cache: Vec::new(),
        })
    }

    /// Rebuild a column from its retained strata.
    ///
    /// Strata lacking a deposition rank get the rank the policy predicts for
    /// their position; every supplied or predicted rank must agree with the
    /// column invariants.
    pub fn from_retained_strata(
        config: ColumnConfig,
        num_strata_deposited: u64,
        strata: Vec<Stratum>,
    ) -> Result<Self, ColumnError> {
        let mut column = Self::empty(&config)?;
        let limit = max_differentia(column.differentia_bit_width);
        if let Some(stratum) = strata.iter().find(|s| s.differentia > limit) {
            return Err(ColumnError::InconsistentStrata(format!(
                "differentia {} exceeds {} bits",
                stratum.differentia, column.differentia_bit_width
            )));
        }

        let predicted: Option<Vec<u64>> = column
            .policy
            .iter_retained_ranks(num_strata_deposited)
            .map(Iterator::collect);
        let fully_tagged =
            !strata.is_empty() && strata.iter().all(|s| s.deposition_rank.is_some());
        let ranks: Vec<u64> = if fully_tagged {
            strata.iter().filter_map(|s| s.deposition_rank).collect()
        } else if let Some(predicted) = &predicted {
            predicted.clone()
        } else if strata.is_empty() {
            Vec::new()
        } else {
            return Err(ColumnError::InconsistentStrata(format!(
                "{} strata lack deposition ranks",
                column.policy.algo_name()
            )));
        };
        if ranks.len() != strata.len() {
            return Err(ColumnError::InconsistentStrata(format!(
                "{} strata for {} retained ranks",
                strata.len(),
                ranks.len()
            )));
        }
        if let Some(predicted) = &predicted {
            if *predicted != ranks {
                return Err(ColumnError::InconsistentStrata(format!(
                    "ranks disagree with {} after {} depositions",
                    column.policy, num_strata_deposited
                )));
            }
        }
        column.check_rank_invariants(&ranks, num_strata_deposited)?;

        for (stratum, rank) in strata.into_iter().zip(&ranks) {
            column.store.push(stratum, *rank);
        }
        column.num_strata_deposited = num_strata_deposited;
        column.rank_cache = ranks;
        debug!(
            "Restored column: policy={}, deposited={}, retained={}",
            column.policy,
            num_strata_deposited,
            column.store.len()
        );
        Ok(column)
    }

    fn check_rank_invariants(
        &self,
        ranks: &[u64],
        num_strata_deposited: u64,
    ) -> Result<(), ColumnError> {
        let inconsistent = |why: &str| Err(ColumnError::InconsistentStrata(why.to_string()));
        if num_strata_deposited == 0 {
            return if ranks.is_empty() {
                Ok(())
            } else {
                inconsistent("strata present in an empty column")
            };
        }
        if ranks.first() != Some(&0) {
            return inconsistent("rank 0 is missing");
        }
        if ranks.last() != Some(&(num_strata_deposited - 1)) {
            return inconsistent("newest rank is missing");
        }
        if ranks.windows(2).any(|pair| pair[0] >= pair[1]) {
            return inconsistent("ranks are not strictly increasing");
        }
        let bound = self.policy.calc_num_strata_retained_upper_bound(num_strata_deposited);
        if ranks.len() as u64 > bound {
            return inconsistent("more strata than the policy can retain");
        }
        Ok(())
    }

    // ---- deposition -----------------------------------------------------

    /// Append a fresh stratum and prune per the retention policy
    pub fn deposit_stratum(&mut self, annotation: Option<serde_json::Value>) {
        self.deposit_stratum_with_rng(&mut rand::thread_rng(), annotation);
    }

    pub fn deposit_stratum_with_rng<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        annotation: Option<serde_json::Value>,
    ) {
        let rank = self.num_strata_deposited;
        if !self.rank_cache_is_current() {
            self.rank_cache = self.store.ranks(&self.policy, rank);
        }
        let stratum = Stratum::random_with_rng(rng, self.differentia_bit_width)
            .with_annotation(annotation);
        self.store.push(stratum, rank);
        self.rank_cache.push(rank);
        self.num_strata_deposited += 1;

        let dropped: Vec<u64> = self
            .policy
            .gen_drop_ranks_with_rng(rank, self.rank_cache.iter().copied(), rng)
            .collect();
        if !dropped.is_empty() {
            trace!("Deposit {}: dropping ranks {:?}", rank, dropped);
            self.store.discard(&self.rank_cache, &dropped);
            discard_ranks(&mut self.rank_cache, &dropped);
        }
    }

    fn rank_cache_is_current(&self) -> bool {
        self.rank_cache.len() == self.store.len()
    }

    /// Deposit `count` strata, equivalent to `count` single deposits
    pub fn deposit_strata(&mut self, count: u64) {
        self.deposit_strata_with_rng(&mut rand::thread_rng(), count);
    }

    pub fn deposit_strata_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R, count: u64) {
        for _ in 0..count {
            self.deposit_stratum_with_rng(rng, None);
        }
    }

    /// Copy this column and deposit one stratum on the copy
    pub fn clone_descendant(&self, annotation: Option<serde_json::Value>) -> Self {
        self.clone_descendant_with_rng(&mut rand::thread_rng(), annotation)
    }

    pub fn clone_descendant_with_rng<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        annotation: Option<serde_json::Value>,
    ) -> Self {
        let mut child = self.clone();
        child.deposit_stratum_with_rng(rng, annotation);
        child
    }

    /// Copy this column and deposit `count` strata on the copy
    pub fn clone_nth_descendant(&self, count: u64) -> Self {
        self.clone_nth_descendant_with_rng(&mut rand::thread_rng(), count)
    }

    pub fn clone_nth_descendant_with_rng<R: Rng + ?Sized>(&self, rng: &mut R, count: u64) -> Self {
        let mut descendant = self.clone();
        descendant.deposit_strata_with_rng(rng, count);
        descendant
    }

    // ---- accessors ------------------------------------------------------

    pub fn policy(&self) -> &StratumRetentionPolicy {
        &self.policy
    }

    pub fn differentia_bit_width(&self) -> u32 {
        self.differentia_bit_width
    }

    pub fn num_strata_deposited(&self) -> u64 {
        self.num_strata_deposited
    }

    pub fn num_strata_retained(&self) -> usize {
        self.store.len()
    }

    pub fn has_discarded_strata(&self) -> bool {
        (self.store.len() as u64) < self.num_strata_deposited
    }

    pub fn stores_deposition_ranks(&self) -> bool {
        self.store.stores_deposition_ranks()
    }

    pub fn iter_retained_strata(&self) -> impl Iterator<Item = &Stratum> + '_ {
        self.store.strata().iter()
    }

    /// Ranks of retained strata, ascending
    pub fn iter_retained_ranks(&self) -> impl Iterator<Item = u64> {
        let ranks = if self.rank_cache_is_current() {
            self.rank_cache.clone()
        } else {
            self.store.ranks(&self.policy, self.num_strata_deposited)
        };
        ranks.into_iter()
    }

    pub fn iter_retained_differentia(&self) -> impl Iterator<Item = u64> + '_ {
        self.store.strata().iter().map(|stratum| stratum.differentia)
    }

    pub fn stratum_at_column_index(&self, index: usize) -> Result<&Stratum, ColumnError> {
        self.store.strata().get(index).ok_or(ColumnError::IndexOutOfRange {
            index,
            num_retained: self.store.len(),
        })
    }

    pub fn rank_at_column_index(&self, index: usize) -> Result<u64, ColumnError> {
        let stratum = self.stratum_at_column_index(index)?;
        if self.rank_cache_is_current() {
            return Ok(self.rank_cache[index]);
        }
        match stratum.deposition_rank {
            Some(rank) => Ok(rank),
            None => Ok(self
                .policy
                .calc_rank_at_column_index(index as u64, self.num_strata_deposited)?),
        }
    }

    pub fn differentia_at_column_index(&self, index: usize) -> Result<u64, ColumnError> {
        Ok(self.stratum_at_column_index(index)?.differentia)
    }

    /// Freeze into an immutable rank-indexed view
    pub fn to_specimen(&self) -> Specimen {
        Specimen::from_view(self)
    }
}

/// Remove `dropped` from the ascending `ranks`, touching only the affected tail
fn discard_ranks(ranks: &mut Vec<u64>, dropped: &[u64]) {
    let Some(&first) = dropped.first() else {
        return;
    };
    let start = ranks.partition_point(|&rank| rank < first);
    let tail = ranks.split_off(start);
    ranks.extend(tail.into_iter().filter(|rank| dropped.binary_search(rank).is_err()));
}

impl PartialEq for HereditaryStratigraphicColumn {
    fn eq(&self, other: &Self) -> bool {
        self.num_strata_deposited == other.num_strata_deposited
            && self.differentia_bit_width == other.differentia_bit_width
            && self.policy == other.policy
            && self.iter_retained_ranks().eq(other.iter_retained_ranks())
            && self.iter_retained_differentia().eq(other.iter_retained_differentia())
    }
}

impl StratigraphicView for HereditaryStratigraphicColumn {
    fn differentia_bit_width(&self) -> u32 {
        self.differentia_bit_width
    }

    fn num_strata_deposited(&self) -> u64 {
        self.num_strata_deposited
    }

    fn num_strata_retained(&self) -> usize {
        self.store.len()
    }

    fn iter_ranks(&self) -> Box<dyn Iterator<Item = i64> + '_> {
        Box::new(self.iter_retained_ranks().map(|rank| rank as i64))
    }

    fn iter_differentia(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        Box::new(self.iter_retained_differentia())
    }
}
