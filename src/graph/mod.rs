//! Significance-gated assembly of one weighted graph per sample.

use crate::binning::{Bin, CooccurrenceCounts};
use crate::data::AbundanceMatrix;
use crate::engine::GedEngine;
use crate::error::Result;
use crate::stats::{LogratioRange, PairStatistics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tunable thresholds of the graph construction pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphParams {
    /// Number of equal-width abundance bins per sample.
    pub num_bins: usize,
    /// Features below this abundance are excluded from binning.
    pub abundance_threshold: f64,
    /// Minimum bin-pair co-occurrence count for the significance test to
    /// apply; pairs with less evidence always draw their edges.
    pub min_sample_cutoff: usize,
    /// Bin pairs whose z-score magnitude stays below this are suppressed.
    pub z_score_cutoff: f64,
}

impl Default for GraphParams {
    fn default() -> Self {
        Self {
            num_bins: 100,
            abundance_threshold: 0.0,
            min_sample_cutoff: 10,
            z_score_cutoff: 2.0,
        }
    }
}

impl GraphParams {
    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.num_bins == 0 {
            return Err(crate::error::OmicsGedError::Config {
                kind: "bin count",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Build one sample's graph inside the engine and return its graph id.
///
/// Nodes are the features present in the sample, labeled by feature id. For
/// every ordered pair of distinct non-empty bins the bin-level normalized
/// log-ratio is tested against the reference distribution; when enough
/// samples co-populate the bin pair and the z-score magnitude stays below the
/// cutoff, the pair is not statistically distinguishable from the reference
/// and draws no edges. Otherwise the pair materializes as the complete
/// bipartite edge set between the two bins' features, each edge weighted by
/// its own exact normalized log-ratio. The engine keeps the first label
/// offered per unordered node pair, so the ascending-order traversal fixes
/// the stored orientation.
///
/// The reference distribution is looked up by the bins' mean abundances cast
/// to matrix indices, not by the feature pair the statistics were computed
/// for; lookups that miss the matrix count as insufficient evidence and the
/// edges are drawn. DESIGN.md discusses this lookup.
#[allow(clippy::too_many_arguments)]
pub fn assemble_graph<E: GedEngine>(
    engine: &mut E,
    name: &str,
    sample: usize,
    matrix: &AbundanceMatrix,
    bins: &[Bin],
    cooccurrence: &CooccurrenceCounts,
    range: &LogratioRange,
    statistics: &PairStatistics,
    params: &GraphParams,
) -> Result<usize> {
    let graph_id = engine.add_graph(name);

    let mut node_ids = BTreeMap::new();
    for feature in matrix.present_features(sample) {
        let node_id = node_ids.len();
        node_ids.insert(feature, node_id);
        engine.add_node(graph_id, node_id, feature)?;
    }

    for bin_1 in bins {
        if !bin_1.has_features() {
            continue;
        }
        for bin_2 in bins {
            if bin_1.index() == bin_2.index() || !bin_2.has_features() {
                continue;
            }

            let bin_logratio = (bin_1.mean_value() / bin_2.mean_value()).ln();
            let normalized = range.normalize(bin_logratio);

            let mut draw_edges = true;
            if cooccurrence.get(bin_1.index(), bin_2.index()) >= params.min_sample_cutoff {
                let lookup = statistics
                    .get(bin_1.mean_value() as usize, bin_2.mean_value() as usize);
                if let Some((mean, stdev)) = lookup {
                    let z_score = (normalized - mean) / stdev;
                    // A NaN z-score (zero spread) fails this comparison and
                    // keeps the edges.
                    if z_score.abs() < params.z_score_cutoff {
                        draw_edges = false;
                    }
                }
            }

            if draw_edges {
                for &(feature_1, value_1) in bin_1.features() {
                    for &(feature_2, value_2) in bin_2.features() {
                        let exact = range.normalize((value_1 / value_2).ln());
                        engine.add_edge(
                            graph_id,
                            node_ids[&feature_1],
                            node_ids[&feature_2],
                            exact,
                        )?;
                    }
                }
            }
        }
    }

    Ok(graph_id)
}
