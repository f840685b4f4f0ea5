//! Priors over the MRCA rank
//!
//! Estimators only need two numbers from a prior for any interval of ranks:
//! its unnormalized probability mass and the expected rank given the MRCA
//! falls inside it. Intervals are half-open, `[begin, end)`. Masses of the
//! growing and shrinking priors leave `f64` range within a few thousand
//! ranks, so estimators compare them through the log-space proxy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub trait Prior {
    /// Unnormalized prior mass of ranks in `[begin_inclusive, end_exclusive)`
    fn calc_interval_probability_proxy(&self, begin_inclusive: i64, end_exclusive: i64) -> f64;

    /// Natural log of the interval mass, `-inf` for an empty interval
    fn calc_interval_log_probability_proxy(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        self.calc_interval_probability_proxy(begin_inclusive, end_exclusive)
            .ln()
    }

    /// Expected rank given the MRCA lies in `[begin_inclusive, end_exclusive)`
    fn calc_interval_conditioned_mean(&self, begin_inclusive: i64, end_exclusive: i64) -> f64;
}

fn midpoint(begin_inclusive: i64, end_exclusive: i64) -> f64 {
    (begin_inclusive as f64 + end_exclusive as f64 - 1.0) / 2.0
}

fn length(begin_inclusive: i64, end_exclusive: i64) -> f64 {
    (end_exclusive - begin_inclusive).max(0) as f64
}

/// No information: every non-empty interval is equally likely
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ArbitraryPrior;

impl Prior for ArbitraryPrior {
    fn calc_interval_probability_proxy(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        if end_exclusive > begin_inclusive {
            1.0
        } else {
            0.0
        }
    }

    fn calc_interval_conditioned_mean(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        midpoint(begin_inclusive, end_exclusive)
    }
}

/// Every rank is equally likely
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UniformPrior;

impl Prior for UniformPrior {
    fn calc_interval_probability_proxy(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        length(begin_inclusive, end_exclusive)
    }

    fn calc_interval_conditioned_mean(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        midpoint(begin_inclusive, end_exclusive)
    }
}

/// Mass at rank `r` proportional to `growth_factor^r`.
///
/// A growth factor above one favors recent MRCAs, as under an expanding
/// population; below one favors ancient ones.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeometricPrior {
    pub growth_factor: f64,
}

impl GeometricPrior {
    pub fn new(growth_factor: f64) -> Self {
        Self { growth_factor }
    }
}

/// Mean offset from the interval start of `q^i` weights over `i in 0..n`
fn geometric_offset_mean(q: f64, n: f64) -> f64 {
    if (q - 1.0).abs() < f64::EPSILON {
        (n - 1.0) / 2.0
    } else if q < 1.0 {
        q / (1.0 - q) - n * q.powf(n) / (1.0 - q.powf(n))
    } else {
        // mirror the interval so the series stays bounded
        (n - 1.0) - geometric_offset_mean(q.recip(), n)
    }
}

/// `ln((q^n - 1) / (q - 1))` without forming `q^n`
fn log_geometric_series(q: f64, n: f64) -> f64 {
    let log_q = q.ln();
    if q < 1.0 {
        (-(n * log_q).exp()).ln_1p() - (-log_q.exp_m1()).ln()
    } else {
        n * log_q + (-(-n * log_q).exp()).ln_1p() - log_q.exp_m1().ln()
    }
}

impl Prior for GeometricPrior {
    fn calc_interval_probability_proxy(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        let n = length(begin_inclusive, end_exclusive);
        let q = self.growth_factor;
        if n == 0.0 {
            0.0
        } else if (q - 1.0).abs() < f64::EPSILON {
            n
        } else {
            q.powf(begin_inclusive as f64) * (q.powf(n) - 1.0) / (q - 1.0)
        }
    }

    fn calc_interval_log_probability_proxy(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        let n = length(begin_inclusive, end_exclusive);
        let q = self.growth_factor;
        if n == 0.0 {
            f64::NEG_INFINITY
        } else if (q - 1.0).abs() < f64::EPSILON {
            n.ln()
        } else {
            begin_inclusive as f64 * q.ln() + log_geometric_series(q, n)
        }
    }

    fn calc_interval_conditioned_mean(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        let n = length(begin_inclusive, end_exclusive);
        if n == 0.0 {
            return midpoint(begin_inclusive, end_exclusive);
        }
        begin_inclusive as f64 + geometric_offset_mean(self.growth_factor, n)
    }
}

/// Continuous density proportional to `growth_factor^x`, each rank `r`
/// owning the unit cell centered on it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExponentialPrior {
    pub growth_factor: f64,
}

impl ExponentialPrior {
    pub fn new(growth_factor: f64) -> Self {
        Self { growth_factor }
    }

    fn rate(&self) -> f64 {
        self.growth_factor.ln()
    }
}

impl Prior for ExponentialPrior {
    fn calc_interval_probability_proxy(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        let width = length(begin_inclusive, end_exclusive);
        let rate = self.rate();
        if width == 0.0 {
            return 0.0;
        }
        if rate.abs() < 1e-12 {
            return width;
        }
        let low = begin_inclusive as f64 - 0.5;
        ((rate * (low + width)).exp() - (rate * low).exp()) / rate
    }

    fn calc_interval_log_probability_proxy(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        let width = length(begin_inclusive, end_exclusive);
        let rate = self.rate();
        if width == 0.0 {
            return f64::NEG_INFINITY;
        }
        if rate.abs() < 1e-12 {
            return width.ln();
        }
        // factor out the larger endpoint's density
        let low = begin_inclusive as f64 - 0.5;
        let peak = if rate > 0.0 { low + width } else { low };
        rate * peak + (-(-rate.abs() * width).exp()).ln_1p() - rate.abs().ln()
    }

    fn calc_interval_conditioned_mean(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        let width = length(begin_inclusive, end_exclusive);
        let rate = self.rate();
        if width == 0.0 || rate.abs() < 1e-12 {
            return midpoint(begin_inclusive, end_exclusive);
        }
        let low = begin_inclusive as f64 - 0.5;
        if rate > 0.0 {
            low + width / (1.0 - (-rate * width).exp()) - rate.recip()
        } else {
            let decay = (rate * width).exp();
            low - width * decay / (1.0 - decay) - rate.recip()
        }
    }
}

/// Error parsing a prior name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized prior: {0}")]
pub struct UnknownPrior(pub String);

/// The built-in priors, selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinPrior {
    Arbitrary,
    Uniform,
    Geometric { growth_factor: f64 },
    Exponential { growth_factor: f64 },
}

impl Prior for BuiltinPrior {
    fn calc_interval_probability_proxy(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        self.as_prior()
            .calc_interval_probability_proxy(begin_inclusive, end_exclusive)
    }

    fn calc_interval_log_probability_proxy(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        self.as_prior()
            .calc_interval_log_probability_proxy(begin_inclusive, end_exclusive)
    }

    fn calc_interval_conditioned_mean(&self, begin_inclusive: i64, end_exclusive: i64) -> f64 {
        self.as_prior()
            .calc_interval_conditioned_mean(begin_inclusive, end_exclusive)
    }
}

impl BuiltinPrior {
    fn as_prior(&self) -> Box<dyn Prior> {
        match *self {
            Self::Arbitrary => Box::new(ArbitraryPrior),
            Self::Uniform => Box::new(UniformPrior),
            Self::Geometric { growth_factor } => Box::new(GeometricPrior::new(growth_factor)),
            Self::Exponential { growth_factor } => Box::new(ExponentialPrior::new(growth_factor)),
        }
    }
}

impl fmt::Display for BuiltinPrior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arbitrary => write!(f, "arbitrary"),
            Self::Uniform => write!(f, "uniform"),
            Self::Geometric { growth_factor } => {
                write!(f, "geometric(growth_factor={growth_factor})")
            }
            Self::Exponential { growth_factor } => {
                write!(f, "exponential(growth_factor={growth_factor})")
            }
        }
    }
}

impl FromStr for BuiltinPrior {
    type Err = UnknownPrior;

    /// Accepts `arbitrary`, `uniform`, `geometric(growth_factor=g)` and
    /// `exponential(growth_factor=g)`; the key may be omitted
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || UnknownPrior(s.to_string());
        let text = s.trim();
        let (name, argument) = match text.split_once('(') {
            Some((name, rest)) => (name.trim(), Some(rest.strip_suffix(')').ok_or_else(unknown)?)),
            None => (text, None),
        };
        let growth_factor = || -> Result<f64, UnknownPrior> {
            let raw = argument.ok_or_else(unknown)?;
            let raw = raw.split_once('=').map_or(raw, |(key, value)| {
                if key.trim() == "growth_factor" {
                    value
                } else {
                    ""
                }
            });
            raw.trim()
                .parse::<f64>()
                .ok()
                .filter(|g| g.is_finite() && *g > 0.0)
                .ok_or_else(unknown)
        };
        match (name, argument) {
            ("arbitrary", None) => Ok(Self::Arbitrary),
            ("uniform", None) => Ok(Self::Uniform),
            ("geometric", Some(_)) => Ok(Self::Geometric {
                growth_factor: growth_factor()?,
            }),
            ("exponential", Some(_)) => Ok(Self::Exponential {
                growth_factor: growth_factor()?,
            }),
            _ => Err(unknown()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brute_geometric(q: f64, begin: i64, end: i64) -> (f64, f64) {
        let mass: f64 = (begin..end).map(|r| q.powi(r as i32)).sum();
        let moment: f64 = (begin..end).map(|r| r as f64 * q.powi(r as i32)).sum();
        (mass, moment / mass)
    }

    #[test]
    fn test_arbitrary_and_uniform() {
        assert_eq!(ArbitraryPrior.calc_interval_probability_proxy(3, 9), 1.0);
        assert_eq!(ArbitraryPrior.calc_interval_probability_proxy(9, 9), 0.0);
        assert_eq!(UniformPrior.calc_interval_probability_proxy(3, 9), 6.0);
        assert_eq!(UniformPrior.calc_interval_conditioned_mean(3, 9), 5.5);
        assert_eq!(UniformPrior.calc_interval_conditioned_mean(10, 11), 10.0);
    }

    #[test]
    fn test_geometric_matches_summation() {
        for q in [0.5, 0.9, 1.0, 1.1, 2.0] {
            let prior = GeometricPrior::new(q);
            for (begin, end) in [(0, 1), (2, 7), (5, 40)] {
                let (mass, mean) = brute_geometric(q, begin, end);
                let proxy = prior.calc_interval_probability_proxy(begin, end);
                assert!((proxy - mass).abs() <= 1e-6 * mass, "q={q} [{begin},{end})");
                let conditioned = prior.calc_interval_conditioned_mean(begin, end);
                assert!((conditioned - mean).abs() < 1e-6, "q={q} [{begin},{end})");
            }
        }
    }

    #[test]
    fn test_exponential_tilts_mean() {
        let growing = ExponentialPrior::new(1.5);
        let shrinking = ExponentialPrior::new(0.5);
        let flat = ExponentialPrior::new(1.0);
        assert!(growing.calc_interval_conditioned_mean(0, 10) > 4.5);
        assert!(shrinking.calc_interval_conditioned_mean(0, 10) < 4.5);
        assert_eq!(flat.calc_interval_conditioned_mean(0, 10), 4.5);
        assert_eq!(flat.calc_interval_probability_proxy(0, 10), 10.0);
        let proxy = growing.calc_interval_probability_proxy(0, 4);
        let split = growing.calc_interval_probability_proxy(0, 2)
            + growing.calc_interval_probability_proxy(2, 4);
        assert!((proxy - split).abs() < 1e-9);
    }

    #[test]
    fn test_log_proxy_matches_direct_mass() {
        let priors = [
            BuiltinPrior::Arbitrary,
            BuiltinPrior::Uniform,
            BuiltinPrior::Geometric { growth_factor: 0.9 },
            BuiltinPrior::Geometric { growth_factor: 1.1 },
            BuiltinPrior::Exponential { growth_factor: 0.9 },
            BuiltinPrior::Exponential { growth_factor: 1.1 },
        ];
        for prior in priors {
            for (begin, end) in [(0, 1), (3, 9), (10, 60)] {
                let direct = prior.calc_interval_probability_proxy(begin, end).ln();
                let logged = prior.calc_interval_log_probability_proxy(begin, end);
                assert!((direct - logged).abs() < 1e-9, "{prior} [{begin},{end})");
            }
            assert_eq!(prior.calc_interval_log_probability_proxy(5, 5), f64::NEG_INFINITY);
        }
    }

    #[test]
    fn test_log_proxy_stays_finite_at_deep_ranks() {
        for growth_factor in [0.9, 1.1] {
            let geometric = GeometricPrior::new(growth_factor);
            let exponential = ExponentialPrior::new(growth_factor);
            let priors: [&dyn Prior; 2] = [&geometric, &exponential];
            for prior in priors {
                let deep = prior.calc_interval_log_probability_proxy(9_000, 9_010);
                let shallow = prior.calc_interval_log_probability_proxy(0, 10);
                assert!(deep.is_finite(), "growth {growth_factor}");
                let shift = 9_000.0 * f64::ln(growth_factor);
                assert!((deep - shallow - shift).abs() < 1e-6, "growth {growth_factor}");
            }
            let mean = geometric.calc_interval_conditioned_mean(8_900, 8_999);
            assert!((8_900.0..8_999.0).contains(&mean), "growth {growth_factor}");
        }
    }

    #[test]
    fn test_parse_builtin() {
        assert_eq!("arbitrary".parse(), Ok(BuiltinPrior::Arbitrary));
        assert_eq!(" uniform ".parse(), Ok(BuiltinPrior::Uniform));
        assert_eq!("geometric(1.1)".parse(), Ok(BuiltinPrior::Geometric { growth_factor: 1.1 }));
        assert_eq!(
            "exponential(growth_factor=0.9)".parse(),
            Ok(BuiltinPrior::Exponential { growth_factor: 0.9 })
        );
        assert!("geometric".parse::<BuiltinPrior>().is_err());
        assert!("geometric(rate=2)".parse::<BuiltinPrior>().is_err());
        assert!("geometric(-1)".parse::<BuiltinPrior>().is_err());
        assert!("uniform(2)".parse::<BuiltinPrior>().is_err());
        let prior = BuiltinPrior::Geometric { growth_factor: 1.25 };
        assert_eq!(prior.to_string().parse(), Ok(prior));
    }
}
