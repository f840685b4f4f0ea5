//! Mutual-rank sweeps
//!
//! Both annotations list ranks in ascending order, so ranks held by both are
//! found with a single two-pointer pass, comparing differentiae in place.

use std::iter::Peekable;

use crate::specimen::StratigraphicView;

type RankDifferentia<'a> = Box<dyn Iterator<Item = (i64, u64)> + 'a>;

/// A rank held by both annotations and the differentia each stores there
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutualStratum {
    pub rank: i64,
    pub first_differentia: u64,
    pub second_differentia: u64,
}

impl MutualStratum {
    pub fn is_common(&self) -> bool {
        self.first_differentia == self.second_differentia
    }
}

/// Two-pointer sweep over the ranks both annotations retain
pub struct MutualStrata<'a> {
    first: Peekable<RankDifferentia<'a>>,
    second: Peekable<RankDifferentia<'a>>,
}

impl<'a> MutualStrata<'a> {
    pub fn new<A, B>(first: &'a A, second: &'a B) -> Self
    where
        A: StratigraphicView + ?Sized,
        B: StratigraphicView + ?Sized,
    {
        assert_eq!(
            first.differentia_bit_width(),
            second.differentia_bit_width(),
            "compared annotations must share a differentia bit width"
        );
        Self {
            first: first.iter_rank_differentia().peekable(),
            second: second.iter_rank_differentia().peekable(),
        }
    }
}

impl Iterator for MutualStrata<'_> {
    type Item = MutualStratum;

    fn next(&mut self) -> Option<MutualStratum> {
        loop {
            let (first_rank, _) = *self.first.peek()?;
            let (second_rank, _) = *self.second.peek()?;
            if first_rank < second_rank {
                self.first.next();
            } else if second_rank < first_rank {
                self.second.next();
            } else {
                let (rank, first_differentia) = self.first.next()?;
                let (_, second_differentia) = self.second.next()?;
                return Some(MutualStratum {
                    rank,
                    first_differentia,
                    second_differentia,
                });
            }
        }
    }
}

/// Ranks retained by both annotations, ascending
pub fn iter_mutual_ranks<'a, A, B>(first: &'a A, second: &'a B) -> impl Iterator<Item = i64> + 'a
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    MutualStrata::new(first, second).map(|stratum| stratum.rank)
}

/// Mutual ranks paired with whether the two differentiae agree there
pub fn iter_mutual_ranks_compared<'a, A, B>(
    first: &'a A,
    second: &'a B,
) -> impl Iterator<Item = (i64, bool)> + 'a
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    MutualStrata::new(first, second).map(|stratum| (stratum.rank, stratum.is_common()))
}

/// Mutual ranks with matching differentiae, up to the first disparity
pub fn iter_ranks_of_retained_commonality_between<'a, A, B>(
    first: &'a A,
    second: &'a B,
) -> impl Iterator<Item = i64> + 'a
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    MutualStrata::new(first, second)
        .take_while(MutualStratum::is_common)
        .map(|stratum| stratum.rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specimen::Specimen;

    fn specimen(ranks: &[i64], differentiae: &[u64]) -> Specimen {
        Specimen::new(ranks.to_vec(), differentiae.to_vec(), 8, 20).unwrap()
    }

    #[test]
    fn test_mutual_ranks() {
        let a = specimen(&[0, 2, 4, 6, 8, 10], &[1, 2, 3, 4, 5, 6]);
        let b = specimen(&[0, 3, 4, 8, 9], &[1, 7, 3, 9, 9]);
        assert_eq!(iter_mutual_ranks(&a, &b).collect::<Vec<_>>(), vec![0, 4, 8]);
        assert_eq!(
            iter_mutual_ranks_compared(&a, &b).collect::<Vec<_>>(),
            vec![(0, true), (4, true), (8, false)]
        );
        assert_eq!(
            iter_ranks_of_retained_commonality_between(&a, &b).collect::<Vec<_>>(),
            vec![0, 4]
        );
    }

    #[test]
    fn test_sweep_is_symmetric() {
        let a = specimen(&[-2, 0, 5, 7], &[1, 2, 3, 4]);
        let b = specimen(&[-2, 1, 5, 7], &[1, 2, 3, 0]);
        let forward: Vec<_> = iter_mutual_ranks_compared(&a, &b).collect();
        let backward: Vec<_> = iter_mutual_ranks_compared(&b, &a).collect();
        assert_eq!(forward, backward);
        assert_eq!(forward, vec![(-2, true), (5, true), (7, false)]);
    }

    #[test]
    fn test_disjoint_ranks() {
        let a = specimen(&[1, 3], &[1, 1]);
        let b = specimen(&[0, 2], &[1, 1]);
        assert_eq!(iter_mutual_ranks(&a, &b).count(), 0);
    }

    #[test]
    #[should_panic(expected = "differentia bit width")]
    fn test_mismatched_widths_panic() {
        let a = Specimen::new(vec![0], vec![1], 8, 1).unwrap();
        let b = Specimen::new(vec![0], vec![1], 16, 1).unwrap();
        let _ = MutualStrata::new(&a, &b);
    }
}
