//! K-fold cross-validation splits
//!
//! Deterministic shuffled folds: the same row count, fold count and seed
//! always produce the same partition.

use crate::deterministic::shuffled_indices;
use crate::errors::TrainerError;

/// Shuffled k-fold splitter.
#[derive(Clone, Debug)]
pub struct KFold {
    n_splits: usize,
    seed: i64,
}

impl KFold {
    pub fn new(n_splits: usize, seed: i64) -> Self {
        Self { n_splits, seed }
    }

    /// Partition `0..n` into `(train, valid)` index pairs, one per fold.
    ///
    /// Validation folds are disjoint and together cover every row exactly
    /// once. The first `n % n_splits` folds receive one extra row.
    pub fn split(&self, n: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>, TrainerError> {
        if self.n_splits < 2 {
            return Err(TrainerError::Dataset(format!(
                "need at least 2 folds, got {}",
                self.n_splits
            )));
        }
        if n < self.n_splits {
            return Err(TrainerError::Dataset(format!(
                "cannot split {} rows into {} folds",
                n, self.n_splits
            )));
        }

        let shuffled = shuffled_indices(n, self.seed);
        let base = n / self.n_splits;
        let remainder = n % self.n_splits;

        let mut folds = Vec::with_capacity(self.n_splits);
        let mut start = 0usize;

        for fold in 0..self.n_splits {
            let size = base + usize::from(fold < remainder);
            let end = start + size;

            let mut valid: Vec<usize> = shuffled[start..end].to_vec();
            let mut train: Vec<usize> = shuffled[..start]
                .iter()
                .chain(&shuffled[end..])
                .copied()
                .collect();
            valid.sort_unstable();
            train.sort_unstable();

            folds.push((train, valid));
            start = end;
        }

        Ok(folds)
    }
}
