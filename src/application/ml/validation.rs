//! Rolling-origin (expanding window) cross-validation splits.

use crate::domain::errors::ForecastError;
use std::ops::Range;

/// Smallest training window a fold may have
pub const MIN_TRAIN_ROWS: usize = 2;
/// Fewest folds that still give a meaningful error estimate
pub const MIN_FOLDS: usize = 2;

/// One fold: train on everything before `test`, never after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FoldSplit {
    pub fold: usize,
    pub train: Range<usize>,
    pub test: Range<usize>,
}

#[derive(Debug, Clone, Copy)]
pub struct RollingOriginSplitter {
    n_splits: usize,
}

impl RollingOriginSplitter {
    pub fn new(n_splits: usize) -> Self {
        Self { n_splits }
    }

    /// Largest fold count `<= n_splits` that `n_rows` can support, if any
    /// count `>= MIN_FOLDS` works.
    pub fn effective_folds(&self, n_rows: usize) -> Option<usize> {
        (MIN_FOLDS..=self.n_splits).rev().find(|&k| {
            let test_size = n_rows / (k + 1);
            test_size >= 1 && n_rows - k * test_size >= MIN_TRAIN_ROWS
        })
    }

    /// Splits `n_rows` time-ordered rows. Rows are never shuffled.
    ///
    /// With `k` folds each test window holds `n_rows / (k + 1)` rows and the
    /// windows tile the end of the series; any remainder goes to the first
    /// training window. When `n_rows` is too short for the configured count,
    /// folds are reduced down to `MIN_FOLDS` before giving up.
    pub fn split(&self, n_rows: usize) -> Result<Vec<FoldSplit>, ForecastError> {
        let k = self
            .effective_folds(n_rows)
            .ok_or_else(|| ForecastError::insufficient_rows(Self::min_rows(), n_rows))?;
        let test_size = n_rows / (k + 1);

        Ok((0..k)
            .map(|fold| {
                let test_start = n_rows - (k - fold) * test_size;
                FoldSplit {
                    fold,
                    train: 0..test_start,
                    test: test_start..test_start + test_size,
                }
            })
            .collect())
    }

    /// Rows needed for `MIN_FOLDS` folds of one test row each.
    pub fn min_rows() -> usize {
        MIN_FOLDS + MIN_TRAIN_ROWS
    }
}
