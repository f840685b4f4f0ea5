//! HereditaryStratigraphicSurface — a fixed-size, dstream-curated column
//!
//! The surface owns exactly `storage_capacity` differentia sites. Each
//! ingest either overwrites the site its dstream algorithm assigns or is
//! dropped. Which ingest a site holds is recomputed from the ingest counter,
//! so nothing but the counter and the raw sites is stored.

use log::{debug, trace};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{DstreamAlgo, SurfaceError};
use crate::genome::{Stratum, MAX_DIFFERENTIA_BIT_WIDTH};
use crate::specimen::StratigraphicView;

/// Construction parameters for a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceConfig {
    pub algo: DstreamAlgo,
    /// Number of differentia sites; a power of two
    pub storage_capacity: usize,
    pub differentia_bit_width: u32,
    /// Ingests made before rank 0; they surface as negative ranks
    pub predeposit_strata: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            algo: DstreamAlgo::Hybrid,
            storage_capacity: 64,
            differentia_bit_width: 64,
            predeposit_strata: 64,
        }
    }
}

impl SurfaceConfig {
    pub fn new(algo: DstreamAlgo, storage_capacity: usize, differentia_bit_width: u32) -> Self {
        Self {
            algo,
            storage_capacity,
            differentia_bit_width,
            predeposit_strata: storage_capacity as u64,
        }
    }

    /// No pre-seeded history: ranks start at 0 like a column
    pub fn without_predeposit(self) -> Self {
        Self {
            predeposit_strata: 0,
            ..self
        }
    }

    pub(crate) fn validate(&self) -> Result<(), SurfaceError> {
        self.algo.validate_capacity(self.storage_capacity)?;
        let bit_width = self.differentia_bit_width;
        if bit_width == 0 || bit_width > MAX_DIFFERENTIA_BIT_WIDTH {
            return Err(SurfaceError::UnsupportedBitWidth(bit_width));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HereditaryStratigraphicSurface {
    algo: DstreamAlgo,
    differentia_bit_width: u32,
    predeposit_strata: u64,
    dstream_t: u64,
    storage: Vec<u64>,
}

impl HereditaryStratigraphicSurface {
    pub fn new(config: SurfaceConfig) -> Result<Self, SurfaceError> {
        Self::with_rng(config, &mut rand::thread_rng())
    }

    /// Build a surface and run its predeposit ingests
    pub fn with_rng<R: Rng + ?Sized>(
        config: SurfaceConfig,
        rng: &mut R,
    ) -> Result<Self, SurfaceError> {
        let mut surface = Self::from_parts(config, 0, vec![0; config.storage_capacity])?;
        surface.deposit_strata_with_rng(rng, config.predeposit_strata);
        debug!(
            "Founding surface: algo={}, capacity={}, differentia_bit_width={}, predeposited={}",
            surface.algo,
            config.storage_capacity,
            surface.differentia_bit_width,
            config.predeposit_strata
        );
        Ok(surface)
    }

    /// Reassemble a surface from its ingest counter and raw sites
    pub fn from_parts(
        config: SurfaceConfig,
        dstream_t: u64,
        storage: Vec<u64>,
    ) -> Result<Self, SurfaceError> {
        config.validate()?;
        if storage.len() != config.storage_capacity {
            return Err(SurfaceError::Malformed(format!(
                "{} sites for a capacity of {}",
                storage.len(),
                config.storage_capacity
            )));
        }
        if dstream_t < config.predeposit_strata {
            return Err(SurfaceError::Malformed(format!(
                "ingest counter {} is below the {} predeposited strata",
                dstream_t, config.predeposit_strata
            )));
        }
        Ok(Self {
            algo: config.algo,
            differentia_bit_width: config.differentia_bit_width,
            predeposit_strata: config.predeposit_strata,
            dstream_t,
            storage,
        })
    }

    pub fn config(&self) -> SurfaceConfig {
        SurfaceConfig {
            algo: self.algo,
            storage_capacity: self.storage.len(),
            differentia_bit_width: self.differentia_bit_width,
            predeposit_strata: self.predeposit_strata,
        }
    }

    // ---- deposition -----------------------------------------------------

    pub fn deposit_stratum(&mut self) {
        self.deposit_stratum_with_rng(&mut rand::thread_rng());
    }

    pub fn deposit_stratum_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let differentia = Stratum::random_with_rng(rng, self.differentia_bit_width).differentia;
        match self.algo.assign_storage_site(self.storage.len(), self.dstream_t) {
            Some(site) => {
                trace!("Ingest {} -> site {}", self.dstream_t, site);
                self.storage[site] = differentia;
            }
            None => trace!("Ingest {} discarded", self.dstream_t),
        }
        self.dstream_t += 1;
    }

    pub fn deposit_strata(&mut self, count: u64) {
        self.deposit_strata_with_rng(&mut rand::thread_rng(), count);
    }

    pub fn deposit_strata_with_rng<R: Rng + ?Sized>(&mut self, rng: &mut R, count: u64) {
        for _ in 0..count {
            self.deposit_stratum_with_rng(rng);
        }
    }

    pub fn clone_descendant(&self) -> Self {
        self.clone_descendant_with_rng(&mut rand::thread_rng())
    }

    pub fn clone_descendant_with_rng<R: Rng + ?Sized>(&self, rng: &mut R) -> Self {
        self.clone_nth_descendant_with_rng(rng, 1)
    }

    pub fn clone_nth_descendant(&self, count: u64) -> Self {
        self.clone_nth_descendant_with_rng(&mut rand::thread_rng(), count)
    }

    pub fn clone_nth_descendant_with_rng<R: Rng + ?Sized>(&self, rng: &mut R, count: u64) -> Self {
        let mut child = self.clone();
        child.deposit_strata_with_rng(rng, count);
        child
    }

    // ---- accessors ------------------------------------------------------

    pub fn algo(&self) -> DstreamAlgo {
        self.algo
    }

    pub fn storage_capacity(&self) -> usize {
        self.storage.len()
    }

    /// Total ingests, predeposits included
    pub fn dstream_t(&self) -> u64 {
        self.dstream_t
    }

    pub fn predeposit_strata(&self) -> u64 {
        self.predeposit_strata
    }

    /// Raw site contents, including sites not yet written
    pub fn storage(&self) -> &[u64] {
        &self.storage
    }

    /// `(rank, differentia)` for every occupied site, ascending by rank
    pub fn retained(&self) -> Vec<(i64, u64)> {
        let offset = self.predeposit_strata as i64;
        let mut entries: Vec<(i64, u64)> = self
            .algo
            .lookup_ingest_times(self.storage.len(), self.dstream_t)
            .into_iter()
            .zip(&self.storage)
            .filter_map(|(time, &differentia)| time.map(|t| (t as i64 - offset, differentia)))
            .collect();
        entries.sort_unstable_by_key(|&(rank, _)| rank);
        entries
    }

    pub fn iter_retained_ranks(&self) -> impl Iterator<Item = i64> {
        self.retained().into_iter().map(|(rank, _)| rank)
    }

    pub fn iter_retained_differentia(&self) -> impl Iterator<Item = u64> {
        self.retained().into_iter().map(|(_, differentia)| differentia)
    }
}

impl StratigraphicView for HereditaryStratigraphicSurface {
    fn differentia_bit_width(&self) -> u32 {
        self.differentia_bit_width
    }

    fn num_strata_deposited(&self) -> u64 {
        self.dstream_t - self.predeposit_strata
    }

    fn num_strata_retained(&self) -> usize {
        self.algo
            .lookup_ingest_times(self.storage.len(), self.dstream_t)
            .iter()
            .filter(|time| time.is_some())
            .count()
    }

    fn iter_ranks(&self) -> Box<dyn Iterator<Item = i64> + '_> {
        Box::new(self.iter_retained_ranks())
    }

    fn iter_differentia(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        Box::new(self.iter_retained_differentia())
    }
}
