//! Stochastic retention — each stratum survives a coin flip per deposition
//!
//! At every deposition a stratum reaching recency `ρ ≥ 2` is discarded with
//! probability `1 / ρ`. Survival to recency `ρ` has probability `1 / ρ`, so a
//! column holds about `H(n) = Θ(log n)` strata. Coins come from the lineage's
//! own RNG, so which ranks survive depends on history and cannot be predicted
//! from `n` alone.

use rand::Rng;

pub(crate) const ALGO_NAME: &str = "stochastic";

/// Whether `rank` is discarded on the transition from `n` to `n + 1` depositions
pub(crate) fn is_dropped_with_rng<R: Rng + ?Sized>(rank: u64, n: u64, rng: &mut R) -> bool {
    if rank == 0 || rank >= n {
        return false;
    }
    let recency = n - rank;
    recency >= 2 && rng.gen_range(0..recency) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn simulate_retained_ranks(n: u64, seed: u64) -> Vec<u64> {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut ranks: Vec<u64> = Vec::new();
        for deposited in 0..n {
            ranks.retain(|&rank| !is_dropped_with_rng(rank, deposited, &mut rng));
            ranks.push(deposited);
        }
        ranks
    }

    #[test]
    fn test_endpoints_never_dropped() {
        let mut rng = StdRng::seed_from_u64(3);
        for n in 1..500 {
            assert!(!is_dropped_with_rng(0, n, &mut rng));
            assert!(!is_dropped_with_rng(n - 1, n, &mut rng));
            assert!(!is_dropped_with_rng(n, n, &mut rng));
        }
    }

    #[test]
    fn test_recency_two_is_a_fair_coin() {
        let mut rng = StdRng::seed_from_u64(11);
        let drops = (0..10_000).filter(|_| is_dropped_with_rng(8, 10, &mut rng)).count();
        assert!((4_500..5_500).contains(&drops), "dropped {drops}");
    }

    #[test]
    fn test_retained_count_is_logarithmic() {
        let ranks = simulate_retained_ranks(10_000, 5);
        assert_eq!(ranks[0], 0);
        assert_eq!(*ranks.last().unwrap(), 9_999);
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
        // H(10000) is about 9.8
        assert!(ranks.len() < 60, "retained {}", ranks.len());
    }

    #[test]
    fn test_seeds_diverge() {
        assert_eq!(simulate_retained_ranks(2_000, 1), simulate_retained_ranks(2_000, 1));
        assert_ne!(simulate_retained_ranks(2_000, 1), simulate_retained_ranks(2_000, 999));
    }
}
