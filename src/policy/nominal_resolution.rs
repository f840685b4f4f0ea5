//! Nominal resolution — only the first and most recent strata survive
//!
//! Columns stay at two strata; comparisons can only tell whether two
//! lineages share any ancestor at all.

pub(crate) const ALGO_NAME: &str = "nominal_resolution";

pub(crate) fn retained_ranks(n: u64) -> Vec<u64> {
    match n {
        0 => Vec::new(),
        1 => vec![0],
        _ => vec![0, n - 1],
    }
}

pub(crate) fn num_retained_exact(n: u64) -> u64 {
    n.min(2)
}

/// Only the column endpoints bracket the MRCA
pub(crate) fn mrca_uncertainty_abs_upper_bound(a: u64, b: u64, actual_rank_of_mrca: u64) -> u64 {
    let ceiling = a.min(b);
    if actual_rank_of_mrca >= ceiling {
        return 0;
    }
    ceiling - 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_only() {
        assert!(retained_ranks(0).is_empty());
        assert_eq!(retained_ranks(1), vec![0]);
        assert_eq!(retained_ranks(2), vec![0, 1]);
        assert_eq!(retained_ranks(100), vec![0, 99]);
        assert_eq!(num_retained_exact(100), 2);
    }

    #[test]
    fn test_uncertainty_spans_column() {
        assert_eq!(mrca_uncertainty_abs_upper_bound(100, 50, 10), 49);
        assert_eq!(mrca_uncertainty_abs_upper_bound(100, 50, 50), 0);
    }
}
