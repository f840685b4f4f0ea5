//! Stratum — one generation's fingerprint
//!
//! A stratum is deposited once and never mutated. Its differentia is a
//! uniformly random `W`-bit value; two lineages that share a stratum share
//! its differentia, and unrelated strata collide with probability `2^-W`.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Differentia widths with a natural machine representation
pub const NATIVE_DIFFERENTIA_BIT_WIDTHS: [u32; 6] = [1, 2, 8, 16, 32, 64];

/// Widest supported differentia
pub const MAX_DIFFERENTIA_BIT_WIDTH: u32 = 64;

/// Largest differentia representable in `bit_width` bits
pub fn max_differentia(bit_width: u32) -> u64 {
    u64::MAX >> (MAX_DIFFERENTIA_BIT_WIDTH - bit_width)
}

/// A single deposited stratum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stratum {
    /// Random fingerprint, below `2^W`
    pub differentia: u64,
    /// Deposition rank, stored only when the policy cannot recompute it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deposition_rank: Option<u64>,
    /// Opaque user payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotation: Option<serde_json::Value>,
}

impl Stratum {
    pub fn new(differentia: u64) -> Self {
        Self {
            differentia,
            deposition_rank: None,
            annotation: None,
        }
    }

    /// Draw a fresh `bit_width`-bit differentia
    pub fn random_with_rng<R: Rng + ?Sized>(rng: &mut R, bit_width: u32) -> Self {
        Self::new(rng.gen::<u64>() >> (MAX_DIFFERENTIA_BIT_WIDTH - bit_width))
    }

    pub fn with_rank(mut self, rank: u64) -> Self {
        self.deposition_rank = Some(rank);
        self
    }

    pub fn with_annotation(mut self, annotation: Option<serde_json::Value>) -> Self {
        self.annotation = annotation;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_differentia_fits_width() {
        let mut rng = StdRng::seed_from_u64(7);
        for bit_width in 1..=64 {
            for _ in 0..50 {
                let stratum = Stratum::random_with_rng(&mut rng, bit_width);
                assert!(stratum.differentia <= max_differentia(bit_width));
            }
        }
    }

    #[test]
    fn test_single_bit_takes_both_values() {
        let mut rng = StdRng::seed_from_u64(11);
        let ones = (0..200)
            .filter(|_| Stratum::random_with_rng(&mut rng, 1).differentia == 1)
            .count();
        assert!(ones > 50 && ones < 150);
    }

    #[test]
    fn test_serde_skips_absent_fields() {
        let json = serde_json::to_string(&Stratum::new(5)).unwrap();
        assert_eq!(json, r#"{"differentia":5}"#);
        let tagged = Stratum::new(5)
            .with_rank(3)
            .with_annotation(Some(serde_json::json!({"id": 1})));
        let back: Stratum = serde_json::from_str(&serde_json::to_string(&tagged).unwrap()).unwrap();
        assert_eq!(back, tagged);
    }
}
