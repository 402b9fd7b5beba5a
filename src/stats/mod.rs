//! Log-ratio statistics over the abundance matrix.

use crate::data::AbundanceMatrix;
use crate::error::{OmicsGedError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;

/// Dataset-wide log-ratio range and the global maximum feature value.
///
/// The range spans `ln(v_i / v_j)` over every ordered pair of distinct
/// co-present features within a sample, across all samples, and is used to
/// rescale every subsequently computed log-ratio into [0, 1].
#[derive(Debug, Clone, Copy)]
pub struct LogratioRange {
    min: f64,
    max: f64,
    max_feature: f64,
}

impl LogratioRange {
    /// Scan the dataset for the global log-ratio range and maximum abundance.
    ///
    /// Fails fast on degenerate datasets: no co-present feature pair at all,
    /// or a single distinct log-ratio value, would make the [0, 1] rescaling
    /// divide by zero.
    pub fn compute(matrix: &AbundanceMatrix) -> Result<Self> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut max_feature = 0.0f64;
        let n_features = matrix.n_features();

        for sample in 0..matrix.n_samples() {
            for feature_1 in 0..n_features {
                max_feature = max_feature.max(matrix.value(sample, feature_1));
                if !matrix.is_present(sample, feature_1) {
                    continue;
                }
                for feature_2 in (feature_1 + 1)..n_features {
                    if !matrix.is_present(sample, feature_2) {
                        continue;
                    }
                    let logratio =
                        (matrix.value(sample, feature_1) / matrix.value(sample, feature_2)).ln();
                    // Ordered pairs: the reversed pair contributes the
                    // negated log-ratio.
                    min = min.min(logratio.min(-logratio));
                    max = max.max(logratio.max(-logratio));
                }
            }
        }

        if min > max {
            return Err(OmicsGedError::Degenerate(
                "dataset contains no sample with two co-present features".to_string(),
            ));
        }
        if min == max {
            return Err(OmicsGedError::Degenerate(
                "all log-ratios share a single value; the normalized range would collapse"
                    .to_string(),
            ));
        }

        Ok(Self {
            min,
            max,
            max_feature,
        })
    }

    /// Smallest log-ratio observed in the dataset.
    #[inline]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest log-ratio observed in the dataset.
    #[inline]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Largest single feature value across the dataset (bin-width input).
    #[inline]
    pub fn max_feature(&self) -> f64 {
        self.max_feature
    }

    /// Rescale a raw log-ratio into [0, 1].
    #[inline]
    pub fn normalize(&self, raw: f64) -> f64 {
        (raw - self.min) / (self.max - self.min)
    }
}

/// Per-feature-pair mean and standard deviation of the normalized log-ratio.
///
/// Filled for unordered pairs (i < j) over the samples where both features
/// are present; pairs without a single co-present sample stay NaN and are
/// reported as undefined.
#[derive(Debug, Clone)]
pub struct PairStatistics {
    means: DMatrix<f64>,
    stdevs: DMatrix<f64>,
}

impl PairStatistics {
    /// Compute statistics for every unordered feature pair.
    ///
    /// Each pair's fold is independent, so pairs are processed in parallel;
    /// the result is identical to the sequential fold.
    pub fn compute(matrix: &AbundanceMatrix, range: &LogratioRange) -> Self {
        let n_features = matrix.n_features();
        let n_samples = matrix.n_samples();

        let pairs: Vec<(usize, usize)> = (0..n_features)
            .flat_map(|i| ((i + 1)..n_features).map(move |j| (i, j)))
            .collect();

        let computed: Vec<((usize, usize), (f64, f64))> = pairs
            .into_par_iter()
            .map(|(i, j)| {
                let mut normalized = Vec::new();
                for sample in 0..n_samples {
                    if matrix.is_present(sample, i) && matrix.is_present(sample, j) {
                        let logratio = (matrix.value(sample, i) / matrix.value(sample, j)).ln();
                        normalized.push(range.normalize(logratio));
                    }
                }
                if normalized.is_empty() {
                    return ((i, j), (f64::NAN, f64::NAN));
                }
                let mean = normalized.iter().sum::<f64>() / normalized.len() as f64;
                let variance = normalized
                    .iter()
                    .map(|v| (mean - v) * (mean - v))
                    .sum::<f64>()
                    / normalized.len() as f64;
                ((i, j), (mean, variance.sqrt()))
            })
            .collect();

        let mut means = DMatrix::from_element(n_features, n_features, f64::NAN);
        let mut stdevs = DMatrix::from_element(n_features, n_features, f64::NAN);
        for ((i, j), (mean, stdev)) in computed {
            means[(i, j)] = mean;
            stdevs[(i, j)] = stdev;
            // The ordered-pair range is symmetric around zero, so the
            // reversed pair's normalized log-ratios are the mirror image of
            // the forward ones: same spread, mean reflected through 1/2.
            means[(j, i)] = 1.0 - mean;
            stdevs[(j, i)] = stdev;
        }
        Self { means, stdevs }
    }

    /// Mean and standard deviation stored at (i, j).
    ///
    /// Returns `None` when the indices fall outside the matrix or the pair
    /// has no defined statistics; callers treat both as insufficient
    /// evidence.
    pub fn get(&self, i: usize, j: usize) -> Option<(f64, f64)> {
        if i >= self.means.nrows() || j >= self.means.ncols() {
            return None;
        }
        let mean = self.means[(i, j)];
        let stdev = self.stdevs[(i, j)];
        if mean.is_nan() {
            return None;
        }
        Some((mean, stdev))
    }
}
