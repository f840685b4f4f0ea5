//! Spurious-collision arithmetic
//!
//! Unrelated strata share a differentia with probability `p = 2^-W`. A run of
//! `m` matches is implausible as pure coincidence at significance `α` once
//! `p^m ≤ α`.

use crate::specimen::StratigraphicView;

/// Slack absorbing rounding when `α` is an exact power of `p`
const CEIL_EPSILON: f64 = 1e-9;

/// Chance that two unrelated strata of `bit_width` bits collide
pub fn differentia_collision_probability(bit_width: u32) -> f64 {
    (-f64::from(bit_width)).exp2()
}

/// Smallest `m` with `2^(-W·m) ≤ significance_level`.
///
/// `α ≥ 1` needs no evidence at all; `α ≤ 0` can never be met.
pub fn min_implausible_spurious_collisions(bit_width: u32, significance_level: f64) -> u64 {
    if significance_level >= 1.0 {
        return 0;
    }
    if significance_level <= 0.0 || significance_level.is_nan() {
        return u64::MAX;
    }
    // work in log2 to stay exact for wide differentia
    let needed = -significance_level.log2() / f64::from(bit_width);
    (needed - CEIL_EPSILON).ceil().max(0.0) as u64
}

pub fn calc_probability_differentia_collision_between<A, B>(first: &A, second: &B) -> f64
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    assert_eq!(first.differentia_bit_width(), second.differentia_bit_width());
    differentia_collision_probability(first.differentia_bit_width())
}

/// How many consecutive matching strata it takes to rule out coincidence
pub fn calc_min_implausible_spurious_consecutive_differentia_collisions_between<A, B>(
    first: &A,
    second: &B,
    significance_level: f64,
) -> u64
where
    A: StratigraphicView + ?Sized,
    B: StratigraphicView + ?Sized,
{
    assert_eq!(first.differentia_bit_width(), second.differentia_bit_width());
    min_implausible_spurious_collisions(first.differentia_bit_width(), significance_level)
}
