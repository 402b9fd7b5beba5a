//! Abundance binning and bin co-occurrence counting.

mod bin;
mod cooccurrence;

pub use bin::{build_bins, Bin};
pub use cooccurrence::CooccurrenceCounts;
