//! DstreamAlgo — which curation scheme decides a surface's storage sites

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{hybrid, steady, tilted, SurfaceError};

/// Largest supported site count
pub const MAX_STORAGE_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstreamAlgo {
    /// Even coverage across the whole history
    Steady,
    /// Dense coverage of recent history
    Tilted,
    /// Half steady, half tilted
    #[default]
    Hybrid,
}

impl DstreamAlgo {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Steady => "steady",
            Self::Tilted => "tilted",
            Self::Hybrid => "hybrid",
        }
    }

    fn min_capacity(&self) -> usize {
        match self {
            Self::Steady | Self::Tilted => 2,
            Self::Hybrid => 4,
        }
    }

    /// Capacities must be powers of two within the algorithm's range
    pub fn validate_capacity(&self, storage_capacity: usize) -> Result<(), SurfaceError> {
        if !storage_capacity.is_power_of_two()
            || storage_capacity < self.min_capacity()
            || storage_capacity > MAX_STORAGE_CAPACITY
        {
            return Err(SurfaceError::InvalidCapacity {
                algo: self.name(),
                capacity: storage_capacity,
            });
        }
        Ok(())
    }

    /// Site that ingest `time` overwrites, or `None` if it is discarded.
    ///
    /// `storage_capacity` must pass `validate_capacity`.
    pub fn assign_storage_site(&self, storage_capacity: usize, time: u64) -> Option<usize> {
        let capacity = storage_capacity as u64;
        let site = match self {
            Self::Steady => steady::assign_storage_site(capacity, time),
            Self::Tilted => tilted::assign_storage_site(capacity, time),
            Self::Hybrid => hybrid::assign_storage_site(capacity, time),
        };
        site.map(|site| site as usize)
    }

    /// Ingest time held by each site after `num_ingests` ingests
    pub fn lookup_ingest_times(
        &self,
        storage_capacity: usize,
        num_ingests: u64,
    ) -> Vec<Option<u64>> {
        let capacity = storage_capacity as u64;
        match self {
            Self::Steady => steady::lookup_ingest_times(capacity, num_ingests),
            Self::Tilted => tilted::lookup_ingest_times(capacity, num_ingests),
            Self::Hybrid => hybrid::lookup_ingest_times(capacity, num_ingests),
        }
    }
}

impl fmt::Display for DstreamAlgo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DstreamAlgo {
    type Err = SurfaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let name = name.strip_suffix("_algo").unwrap_or(name);
        match name {
            "steady" => Ok(Self::Steady),
            "tilted" => Ok(Self::Tilted),
            "hybrid" => Ok(Self::Hybrid),
            _ => Err(SurfaceError::UnknownAlgo(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALGOS: [DstreamAlgo; 3] = [DstreamAlgo::Steady, DstreamAlgo::Tilted, DstreamAlgo::Hybrid];

    #[test]
    fn test_lookup_matches_replayed_ingests() {
        for algo in ALGOS {
            for capacity in [4usize, 8, 16, 64] {
                let mut sites: Vec<Option<u64>> = vec![None; capacity];
                for time in 0..3000u64 {
                    let looked_up = algo.lookup_ingest_times(capacity, time);
                    assert_eq!(looked_up, sites, "{algo} S={capacity} T={time}");
                    if let Some(site) = algo.assign_storage_site(capacity, time) {
                        sites[site] = Some(time);
                    }
                }
            }
        }
    }

    #[test]
    fn test_sites_fill_up() {
        let full = |algo: DstreamAlgo, time| {
            algo.lookup_ingest_times(32, time)
                .iter()
                .all(Option::is_some)
        };
        assert!(full(DstreamAlgo::Steady, 32));
        assert!(!full(DstreamAlgo::Tilted, 511));
        assert!(full(DstreamAlgo::Tilted, 512));
        assert!(!full(DstreamAlgo::Hybrid, 63));
        assert!(full(DstreamAlgo::Hybrid, 64));
    }

    #[test]
    fn test_capacity_validation() {
        assert!(DstreamAlgo::Steady.validate_capacity(2).is_ok());
        assert!(DstreamAlgo::Hybrid.validate_capacity(2).is_err());
        assert!(DstreamAlgo::Tilted.validate_capacity(12).is_err());
        assert!(DstreamAlgo::Steady.validate_capacity(8192).is_err());
    }

    #[test]
    fn test_names() {
        assert_eq!("hybrid_algo".parse::<DstreamAlgo>().unwrap(), DstreamAlgo::Hybrid);
        assert_eq!(DstreamAlgo::Tilted.to_string(), "tilted");
        assert!("ring".parse::<DstreamAlgo>().is_err());
    }
}
