//! Fixed-width abundance bins within a single sample.

use crate::data::AbundanceMatrix;

/// One abundance interval of a sample's binning.
///
/// Bins partition `[0, global_max]` into `num_bins` equal-width intervals.
/// Boundary values belong to the lower-indexed bin: assignment walks the bins
/// in ascending order and takes the first whose inclusive `[lower, upper]`
/// interval contains the value, so a value sitting exactly on two adjacent
/// bins' shared bound stops at the earlier bin.
#[derive(Debug, Clone)]
pub struct Bin {
    index: usize,
    lower: f64,
    upper: f64,
    features: Vec<(usize, f64)>,
    mean: f64,
}

impl Bin {
    fn new(index: usize, lower: f64, upper: f64) -> Self {
        Self {
            index,
            lower,
            upper,
            features: Vec::new(),
            mean: 0.0,
        }
    }

    fn try_assign(&mut self, feature: usize, value: f64) -> bool {
        if value >= self.lower && value <= self.upper {
            self.features.push((feature, value));
            return true;
        }
        false
    }

    fn compute_mean(&mut self) {
        if !self.features.is_empty() {
            self.mean = self.features.iter().map(|&(_, v)| v).sum::<f64>()
                / self.features.len() as f64;
        }
    }

    /// Position of the bin within its sample's partition.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Lower abundance bound.
    #[inline]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Upper abundance bound.
    #[inline]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Assigned (feature id, value) pairs in assignment order.
    #[inline]
    pub fn features(&self) -> &[(usize, f64)] {
        &self.features
    }

    /// Whether any feature was assigned.
    #[inline]
    pub fn has_features(&self) -> bool {
        !self.features.is_empty()
    }

    /// Arithmetic mean of the assigned feature values (0 when empty).
    #[inline]
    pub fn mean_value(&self) -> f64 {
        self.mean
    }
}

/// Partition a sample's abundance range into bins and assign its features.
///
/// Bin width is `global_max / num_bins`, shared by every sample so bin
/// indices are comparable across samples. Features with zero abundance or
/// below `abundance_threshold` are left unassigned. Features are visited in
/// ascending feature-id order and values alone determine placement, so the
/// result is reproducible across runs.
pub fn build_bins(
    sample: usize,
    matrix: &AbundanceMatrix,
    num_bins: usize,
    abundance_threshold: f64,
    global_max: f64,
) -> Vec<Bin> {
    let bin_width = global_max / num_bins as f64;

    let mut bins = Vec::with_capacity(num_bins);
    for index in 0..num_bins {
        let lower = bin_width * index as f64;
        // Adjacent bins share the same bound expression, so the partition has
        // no gaps; the top bin is clamped so rounding cannot push the global
        // maximum outside it.
        let upper = if index + 1 == num_bins {
            (bin_width * num_bins as f64).max(global_max)
        } else {
            bin_width * (index + 1) as f64
        };
        bins.push(Bin::new(index, lower, upper));
    }

    for feature in 0..matrix.n_features() {
        let value = matrix.value(sample, feature);
        if value == 0.0 || value < abundance_threshold {
            continue;
        }
        for bin in bins.iter_mut() {
            if bin.try_assign(feature, value) {
                break;
            }
        }
    }

    for bin in bins.iter_mut() {
        bin.compute_mean();
    }
    bins
}
