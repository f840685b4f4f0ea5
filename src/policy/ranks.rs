//! Iterator types yielded by the retention facets

use std::ops::Range;

/// Ascending ranks retained after some number of depositions
#[derive(Debug, Clone)]
pub struct RetainedRanks {
    inner: RetainedRanksInner,
}

#[derive(Debug, Clone)]
enum RetainedRanksInner {
    Contiguous(Range<u64>),
    Listed(std::vec::IntoIter<u64>),
}

impl RetainedRanks {
    pub(crate) fn contiguous(ranks: Range<u64>) -> Self {
        Self {
            inner: RetainedRanksInner::Contiguous(ranks),
        }
    }

    pub(crate) fn listed(ranks: Vec<u64>) -> Self {
        Self {
            inner: RetainedRanksInner::Listed(ranks.into_iter()),
        }
    }
}

impl Iterator for RetainedRanks {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        match &mut self.inner {
            RetainedRanksInner::Contiguous(range) => range.next(),
            RetainedRanksInner::Listed(ranks) => ranks.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            RetainedRanksInner::Contiguous(range) => range.size_hint(),
            RetainedRanksInner::Listed(ranks) => ranks.size_hint(),
        }
    }
}

impl DoubleEndedIterator for RetainedRanks {
    fn next_back(&mut self) -> Option<u64> {
        match &mut self.inner {
            RetainedRanksInner::Contiguous(range) => range.next_back(),
            RetainedRanksInner::Listed(ranks) => ranks.next_back(),
        }
    }
}

/// Ascending ranks to discard on a single deposition
#[derive(Debug, Clone)]
pub struct DropRanks {
    ranks: std::vec::IntoIter<u64>,
}

impl DropRanks {
    pub(crate) fn new(ranks: Vec<u64>) -> Self {
        Self {
            ranks: ranks.into_iter(),
        }
    }

    pub(crate) fn none() -> Self {
        Self::new(Vec::new())
    }
}

impl Iterator for DropRanks {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.ranks.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ranks.size_hint()
    }
}

impl ExactSizeIterator for DropRanks {}
