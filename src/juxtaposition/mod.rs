//! Juxtaposition — comparing two annotations rank by rank
//!
//! Everything here works on any `StratigraphicView`, so columns, surfaces and
//! specimens can be compared with one another freely as long as they share a
//! differentia bit width.

mod bounds;
mod collision;
mod mutual;

pub use bounds::{
    calc_rank_of_earliest_detectable_mrca_between, calc_rank_of_first_retained_disparity_between,
    calc_rank_of_last_retained_commonality_between, calc_rank_of_mrca_bounds_between,
    calc_rank_of_parity_segue_between, calc_ranks_since_mrca_bounds_with,
    does_definitively_have_no_common_ancestor, does_have_any_common_ancestor,
};
pub use collision::{
    calc_min_implausible_spurious_consecutive_differentia_collisions_between,
    calc_probability_differentia_collision_between, differentia_collision_probability,
    min_implausible_spurious_collisions,
};
pub use mutual::{
    iter_mutual_ranks, iter_mutual_ranks_compared, iter_ranks_of_retained_commonality_between,
    MutualStrata, MutualStratum,
};
