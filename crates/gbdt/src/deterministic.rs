//! Deterministic utilities for reproducible training
//!
//! Provides an LCG-based RNG and tie-breaking logic so that identical
//! parameters and data always produce identical models.

use std::num::Wrapping;

/// Linear Congruential Generator for deterministic pseudo-randomness
/// Uses constants from Numerical Recipes (glibc)
#[derive(Clone, Debug)]
pub struct LcgRng {
    state: Wrapping<i64>,
}

impl LcgRng {
    const MULTIPLIER: i64 = 1103515245;
    const INCREMENT: i64 = 12345;
    const MODULUS: i64 = 1 << 31;

    pub fn new(seed: i64) -> Self {
        Self {
            state: Wrapping(seed.abs() % Self::MODULUS),
        }
    }

    /// Generate next random i64 in range [0, MODULUS)
    pub fn next_i64(&mut self) -> i64 {
        self.state = self.state * Wrapping(Self::MULTIPLIER) + Wrapping(Self::INCREMENT);
        (self.state.0 & (Self::MODULUS - 1)).abs()
    }

    /// Generate random value in range [0, max)
    pub fn next_range(&mut self, max: i64) -> i64 {
        if max <= 0 {
            return 0;
        }
        self.next_i64() % max
    }
}

/// Deterministically shuffled row indices `0..n` (Fisher-Yates).
pub fn shuffled_indices(n: usize, seed: i64) -> Vec<usize> {
    let mut rng = LcgRng::new(seed);
    let mut indices: Vec<usize> = (0..n).collect();

    for i in (1..n).rev() {
        let j = rng.next_range(i as i64 + 1) as usize;
        indices.swap(i, j);
    }

    indices
}

/// Deterministic tie-breaker for split selection.
///
/// Orders candidates by (feature index, threshold bits, node id) so equal
/// gains always resolve the same way. Thresholds are compared through their
/// bit patterns; all candidate thresholds are finite and non-negative-NaN
/// by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SplitTieBreaker {
    pub feature_idx: usize,
    pub threshold_bits: u64,
    pub node_id: usize,
}

impl SplitTieBreaker {
    pub fn new(feature_idx: usize, threshold: f64, node_id: usize) -> Self {
        Self {
            feature_idx,
            threshold_bits: threshold.to_bits(),
            node_id,
        }
    }
}
