//! Dense abundance and presence matrices derived from the sample table.

use crate::data::SampleTable;
use crate::error::{OmicsGedError, Result};
use nalgebra::DMatrix;

/// Dense sample-by-feature view of the cumulative dataset.
///
/// Rebuilt in full after every successful table merge; row order follows the
/// sorted sample names and column order the sorted feature names, so
/// sample/feature ids are stable across rebuilds of the same data.
#[derive(Debug, Clone)]
pub struct AbundanceMatrix {
    values: DMatrix<f64>,
    presence: DMatrix<bool>,
    sample_names: Vec<String>,
    feature_names: Vec<String>,
}

impl AbundanceMatrix {
    /// Build the dense matrices from the full cumulative table.
    pub fn from_table(table: &SampleTable) -> Result<Self> {
        if table.is_empty() {
            return Err(OmicsGedError::State(
                "no abundance table has been loaded".to_string(),
            ));
        }

        let sample_names: Vec<String> =
            table.sample_names().into_iter().map(String::from).collect();
        let feature_names: Vec<String> =
            table.feature_names().into_iter().map(String::from).collect();

        let n_samples = sample_names.len();
        let n_features = feature_names.len();
        let mut values = DMatrix::zeros(n_samples, n_features);
        let mut presence = DMatrix::from_element(n_samples, n_features, false);

        for (sample_id, (_, features)) in table.iter().enumerate() {
            for (feature_id, (_, &value)) in features.iter().enumerate() {
                values[(sample_id, feature_id)] = value;
                presence[(sample_id, feature_id)] = value > 0.0;
            }
        }

        Ok(Self {
            values,
            presence,
            sample_names,
            feature_names,
        })
    }

    /// Abundance of a feature in a sample.
    #[inline]
    pub fn value(&self, sample: usize, feature: usize) -> f64 {
        self.values[(sample, feature)]
    }

    /// Whether a feature is present (abundance > 0) in a sample.
    #[inline]
    pub fn is_present(&self, sample: usize, feature: usize) -> bool {
        self.presence[(sample, feature)]
    }

    /// Number of samples (rows).
    #[inline]
    pub fn n_samples(&self) -> usize {
        self.values.nrows()
    }

    /// Number of features (columns).
    #[inline]
    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    /// Sample names in row order.
    #[inline]
    pub fn sample_names(&self) -> &[String] {
        &self.sample_names
    }

    /// Feature names in column order.
    #[inline]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Feature ids of every feature present in a sample, ascending.
    pub fn present_features(&self, sample: usize) -> Vec<usize> {
        (0..self.n_features())
            .filter(|&f| self.is_present(sample, f))
            .collect()
    }
}
