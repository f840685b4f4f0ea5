//! Assemblage — specimens aligned on the union of their ranks
//!
//! Rows are ranks any member retains, columns are specimens, and a cell is
//! `None` where that specimen no longer holds the rank.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Specimen, SpecimenError, StratigraphicView};
use crate::juxtaposition;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblageError {
    #[error("assemblage holds no specimens")]
    Empty,
    #[error("specimen {index} has {found}-bit differentia, expected {expected}")]
    BitWidthMismatch { index: usize, expected: u32, found: u32 },
    #[error("no specimen at index {0}")]
    NoSuchSpecimen(usize),
    #[error("specimen {index} is malformed: {source}")]
    MalformedSpecimen { index: usize, source: SpecimenError },
}

/// Rank-aligned table of nullable differentiae
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assemblage {
    ranks: Vec<i64>,
    cells: Vec<Vec<Option<u64>>>,
    differentia_bit_width: Option<u32>,
    num_strata_deposited: Vec<u64>,
}

impl Assemblage {
    pub fn new(specimens: &[Specimen]) -> Result<Self, AssemblageError> {
        Self::from_views(specimens)
    }

    /// Align any annotations sharing one differentia width
    pub fn from_views<V: StratigraphicView>(views: &[V]) -> Result<Self, AssemblageError> {
        let differentia_bit_width = views.first().map(|view| view.differentia_bit_width());
        if let Some(expected) = differentia_bit_width {
            if let Some((index, found)) = views
                .iter()
                .map(|view| view.differentia_bit_width())
                .enumerate()
                .find(|&(_, found)| found != expected)
            {
                return Err(AssemblageError::BitWidthMismatch {
                    index,
                    expected,
                    found,
                });
            }
        }

        let ranks: Vec<i64> = views
            .iter()
            .flat_map(|view| view.iter_ranks())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let cells = views
            .iter()
            .map(|view| {
                let mut column = vec![None; ranks.len()];
                let mut row = 0;
                for (rank, differentia) in view.iter_rank_differentia() {
                    while ranks[row] < rank {
                        row += 1;
                    }
                    column[row] = Some(differentia);
                }
                column
            })
            .collect();
        Ok(Self {
            ranks,
            cells,
            differentia_bit_width,
            num_strata_deposited: views.iter().map(|view| view.num_strata_deposited()).collect(),
        })
    }

    pub fn num_rows(&self) -> usize {
        self.ranks.len()
    }

    pub fn num_specimens(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn differentia_bit_width(&self) -> Option<u32> {
        self.differentia_bit_width
    }

    /// Row labels, ascending
    pub fn ranks(&self) -> &[i64] {
        &self.ranks
    }

    pub fn row_for_rank(&self, rank: i64) -> Option<usize> {
        self.ranks.binary_search(&rank).ok()
    }

    /// One specimen's cells, aligned with `ranks`
    pub fn column(&self, specimen: usize) -> Option<&[Option<u64>]> {
        self.cells.get(specimen).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, specimen: usize) -> Option<u64> {
        self.cells.get(specimen)?.get(row).copied().flatten()
    }

    /// Recover a member specimen, dropping its null cells.
    ///
    /// Fails only for an out-of-range index or a deserialized table whose
    /// cells no longer fit its differentia width.
    pub fn specimen(&self, index: usize) -> Result<Specimen, AssemblageError> {
        let column = self
            .cells
            .get(index)
            .ok_or(AssemblageError::NoSuchSpecimen(index))?;
        let deposited = self
            .num_strata_deposited
            .get(index)
            .copied()
            .ok_or(AssemblageError::NoSuchSpecimen(index))?;
        let (ranks, differentiae) = self
            .ranks
            .iter()
            .zip(column)
            .filter_map(|(&rank, cell)| cell.map(|differentia| (rank, differentia)))
            .unzip();
        Specimen::new(ranks, differentiae, self.differentia_bit_width.unwrap_or(0), deposited)
            .map_err(|source| AssemblageError::MalformedSpecimen { index, source })
    }

    /// Last retained commonality rank for every specimen pair
    pub fn calc_pairwise_last_commonality(
        &self,
        confidence_level: f64,
    ) -> Result<Vec<Vec<Option<i64>>>, AssemblageError> {
        if self.is_empty() {
            return Err(AssemblageError::Empty);
        }
        let specimens = (0..self.num_specimens())
            .map(|index| self.specimen(index))
            .collect::<Result<Vec<Specimen>, _>>()?;
        Ok(specimens
            .iter()
            .map(|first| {
                specimens
                    .iter()
                    .map(|second| {
                        juxtaposition::calc_rank_of_last_retained_commonality_between(
                            first,
                            second,
                            confidence_level,
                        )
                    })
                    .collect()
            })
            .collect())
    }
}
