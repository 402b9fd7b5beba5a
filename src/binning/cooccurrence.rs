//! Dataset-wide bin-pair co-occurrence counting.

use crate::binning::Bin;
use nalgebra::DMatrix;

/// Symmetric bin-index matrix counting, for each pair of bins, the number of
/// samples in which both bins are non-empty.
///
/// Bin indices are comparable across samples because every sample shares the
/// same bin-count/bin-width partition. The count is the evidence volume
/// behind the edge significance test.
#[derive(Debug, Clone)]
pub struct CooccurrenceCounts {
    counts: DMatrix<usize>,
}

impl CooccurrenceCounts {
    /// Count co-occurrences over every sample's binning.
    pub fn count(sample_bins: &[Vec<Bin>], num_bins: usize) -> Self {
        let mut counts = DMatrix::from_element(num_bins, num_bins, 0usize);
        for bins in sample_bins {
            for bin_1 in bins {
                if !bin_1.has_features() {
                    continue;
                }
                for bin_2 in bins {
                    if bin_1.index() == bin_2.index() || !bin_2.has_features() {
                        continue;
                    }
                    counts[(bin_1.index(), bin_2.index())] += 1;
                }
            }
        }
        Self { counts }
    }

    /// Number of samples in which both bins are non-empty.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> usize {
        self.counts[(i, j)]
    }

    /// Side length of the count matrix.
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.counts.nrows()
    }
}
