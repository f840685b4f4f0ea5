//! Specimen — a frozen, rank-indexed snapshot of an annotation
//!
//! Specimens are what post-hoc analysis works on: they no longer know their
//! retention policy, only which ranks they hold and the differentia at each.

use serde::{Deserialize, Serialize};

use super::StratigraphicView;
use crate::genome::{max_differentia, MAX_DIFFERENTIA_BIT_WIDTH};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpecimenError {
    #[error("{ranks} ranks but {differentiae} differentiae")]
    LengthMismatch { ranks: usize, differentiae: usize },
    #[error("ranks are not strictly increasing at position {0}")]
    RanksNotIncreasing(usize),
    #[error("unsupported differentia bit width {0}")]
    UnsupportedBitWidth(u32),
    #[error("differentia {differentia} does not fit in {bit_width} bits")]
    DifferentiaOutOfRange { differentia: u64, bit_width: u32 },
}

/// Immutable `(rank, differentia)` sequence plus its provenance counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specimen {
    ranks: Vec<i64>,
    differentiae: Vec<u64>,
    differentia_bit_width: u32,
    num_strata_deposited: u64,
}

impl Specimen {
    pub fn new(
        ranks: Vec<i64>,
        differentiae: Vec<u64>,
        differentia_bit_width: u32,
        num_strata_deposited: u64,
    ) -> Result<Self, SpecimenError> {
        if differentia_bit_width == 0 || differentia_bit_width > MAX_DIFFERENTIA_BIT_WIDTH {
            return Err(SpecimenError::UnsupportedBitWidth(differentia_bit_width));
        }
        if ranks.len() != differentiae.len() {
            return Err(SpecimenError::LengthMismatch {
                ranks: ranks.len(),
                differentiae: differentiae.len(),
            });
        }
        if let Some(position) = ranks.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(SpecimenError::RanksNotIncreasing(position + 1));
        }
        let limit = max_differentia(differentia_bit_width);
        if let Some(&differentia) = differentiae.iter().find(|&&d| d > limit) {
            return Err(SpecimenError::DifferentiaOutOfRange {
                differentia,
                bit_width: differentia_bit_width,
            });
        }
        Ok(Self {
            ranks,
            differentiae,
            differentia_bit_width,
            num_strata_deposited,
        })
    }

    /// Snapshot any annotation
    pub fn from_view<V: StratigraphicView + ?Sized>(view: &V) -> Self {
        let (ranks, differentiae) = view.iter_rank_differentia().unzip();
        Self {
            ranks,
            differentiae,
            differentia_bit_width: view.differentia_bit_width(),
            num_strata_deposited: view.num_strata_deposited(),
        }
    }

    pub fn ranks(&self) -> &[i64] {
        &self.ranks
    }

    pub fn differentiae(&self) -> &[u64] {
        &self.differentiae
    }

    pub fn differentia_at_rank(&self, rank: i64) -> Option<u64> {
        self.ranks
            .binary_search(&rank)
            .ok()
            .map(|index| self.differentiae[index])
    }
}

impl StratigraphicView for Specimen {
    fn differentia_bit_width(&self) -> u32 {
        self.differentia_bit_width
    }

    fn num_strata_deposited(&self) -> u64 {
        self.num_strata_deposited
    }

    fn num_strata_retained(&self) -> usize {
        self.ranks.len()
    }

    fn iter_ranks(&self) -> Box<dyn Iterator<Item = i64> + '_> {
        Box::new(self.ranks.iter().copied())
    }

    fn iter_differentia(&self) -> Box<dyn Iterator<Item = u64> + '_> {
        Box::new(self.differentiae.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::HereditaryStratigraphicColumn;
    use crate::policy::StratumRetentionPolicy;

    #[test]
    fn test_validation() {
        assert!(Specimen::new(vec![0, 4], vec![1, 2], 8, 5).is_ok());
        assert_eq!(
            Specimen::new(vec![0, 4], vec![1], 8, 5),
            Err(SpecimenError::LengthMismatch { ranks: 2, differentiae: 1 })
        );
        assert_eq!(
            Specimen::new(vec![0, 4, 4], vec![1, 2, 3], 8, 5),
            Err(SpecimenError::RanksNotIncreasing(2))
        );
        assert_eq!(
            Specimen::new(vec![0], vec![256], 8, 1),
            Err(SpecimenError::DifferentiaOutOfRange { differentia: 256, bit_width: 8 })
        );
        assert_eq!(Specimen::new(vec![], vec![], 0, 0), Err(SpecimenError::UnsupportedBitWidth(0)));
    }

    #[test]
    fn test_frozen_from_column() {
        let policy = StratumRetentionPolicy::fixed_resolution(4).unwrap();
        let mut column = HereditaryStratigraphicColumn::new(policy, 16).unwrap();
        column.deposit_strata(10);
        let specimen = column.to_specimen();
        assert_eq!(specimen.ranks(), &[0, 4, 8, 10]);
        assert_eq!(specimen.num_strata_deposited(), 11);
        assert_eq!(specimen.differentia_bit_width(), 16);
        let differentiae: Vec<u64> = column.iter_retained_differentia().collect();
        assert_eq!(specimen.differentiae(), differentiae.as_slice());
        assert_eq!(specimen.differentia_at_rank(8), Some(differentiae[2]));
        assert_eq!(specimen.differentia_at_rank(5), None);
    }

    #[test]
    fn test_negative_ranks_allowed() {
        let specimen = Specimen::new(vec![-3, -1, 0, 2], vec![1, 2, 3, 4], 8, 3).unwrap();
        assert_eq!(specimen.differentia_at_rank(-1), Some(2));
        assert_eq!(specimen.to_specimen(), specimen);
    }
}
