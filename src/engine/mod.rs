//! The graph-comparison engine seam.
//!
//! The construction pipeline only ever talks to the engine through
//! [`GedEngine`]: it populates graphs via `add_graph`/`add_node`/`add_edge`
//! and reads results back through the accessors. Everything behind the trait
//! (search strategy, internal graph representation, parallelism) belongs to
//! the engine.

mod baseline;

pub use baseline::GreedyEngine;

use crate::costs::CostModel;
use crate::error::{OmicsGedError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Comparison method selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GedMethod {
    /// Branch lower/upper bound method (alias STANDARD).
    #[default]
    Branch,
    /// Faster, looser branch variant (alias FAST).
    BranchFast,
    /// Tighter, slower branch variant (alias TIGHT).
    BranchTight,
    /// Randomized improvement method; produces asymmetric upper bounds.
    Ipfp,
}

impl GedMethod {
    /// Parse a method name; an empty string selects the default.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "" => {
                log::info!("no comparison method passed; defaulting to BRANCH");
                Ok(GedMethod::Branch)
            }
            "STANDARD" | "BRANCH" => Ok(GedMethod::Branch),
            "FAST" | "BRANCH_FAST" => Ok(GedMethod::BranchFast),
            "TIGHT" | "BRANCH_TIGHT" => Ok(GedMethod::BranchTight),
            "IPFP" => Ok(GedMethod::Ipfp),
            _ => Err(OmicsGedError::Config {
                kind: "comparison method",
                value: name.to_string(),
            }),
        }
    }

    /// Canonical method name.
    pub fn name(&self) -> &'static str {
        match self {
            GedMethod::Branch => "BRANCH",
            GedMethod::BranchFast => "BRANCH_FAST",
            GedMethod::BranchTight => "BRANCH_TIGHT",
            GedMethod::Ipfp => "IPFP",
        }
    }

    /// Whether the method's upper bounds depend on the pair ordering.
    pub fn is_randomized(&self) -> bool {
        matches!(self, GedMethod::Ipfp)
    }
}

/// Engine initialization mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitType {
    /// Defer per-graph precomputation until a pair is compared.
    #[default]
    Lazy,
    /// Precompute eagerly at initialization time.
    Eager,
}

impl InitType {
    /// Parse an initialization type; an empty string selects the default.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "" => {
                log::info!("no initialization type passed; defaulting to LAZY");
                Ok(InitType::Lazy)
            }
            "LAZY" => Ok(InitType::Lazy),
            "EAGER" => Ok(InitType::Eager),
            _ => Err(OmicsGedError::Config {
                kind: "initialization type",
                value: name.to_string(),
            }),
        }
    }
}

/// A graph exported from the engine: adjacency over node positions plus the
/// original node ids and labels, and edge labels keyed by unordered node-id
/// pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphView {
    pub node_ids: Vec<usize>,
    pub node_labels: Vec<usize>,
    pub adjacency: Vec<Vec<usize>>,
    pub edge_labels: BTreeMap<(usize, usize), f64>,
}

/// The consumed comparison-engine interface.
///
/// Edges are undirected attributes keyed by unordered node-id pairs; offering
/// an edge for an already-occupied pair leaves the stored label unchanged.
pub trait GedEngine {
    /// Add an empty graph and return its id.
    fn add_graph(&mut self, name: &str) -> usize;

    /// Add a labeled node to a graph.
    fn add_node(&mut self, graph_id: usize, node_id: usize, node_label: usize) -> Result<()>;

    /// Add a weighted undirected edge between two existing nodes.
    fn add_edge(&mut self, graph_id: usize, from: usize, to: usize, edge_label: f64)
        -> Result<()>;

    /// Install the edit cost model used by subsequent comparisons.
    fn set_cost_model(&mut self, model: Arc<CostModel>);

    /// Select the comparison method.
    fn set_method(&mut self, method: GedMethod, arguments: &str);

    /// (Re-)initialize the engine; invalidates previously computed bounds.
    fn init(&mut self, init_type: InitType) -> Result<()>;

    /// Compare one ordered graph pair.
    fn run_method(&mut self, graph_id_1: usize, graph_id_2: usize) -> Result<()>;

    /// The upper bound computed by the last `run_method` for this pair.
    fn upper_bound(&self, graph_id_1: usize, graph_id_2: usize) -> Result<f64>;

    /// Number of graphs in the engine.
    fn num_graphs(&self) -> usize;

    /// Name of a graph.
    fn graph_name(&self, graph_id: usize) -> Result<&str>;

    /// Export a graph for inspection or copying.
    fn graph(&self, graph_id: usize) -> Result<GraphView>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_parsing_and_aliases() {
        assert_eq!(GedMethod::parse("").unwrap(), GedMethod::Branch);
        assert_eq!(GedMethod::parse("STANDARD").unwrap(), GedMethod::Branch);
        assert_eq!(GedMethod::parse("FAST").unwrap(), GedMethod::BranchFast);
        assert_eq!(
            GedMethod::parse("BRANCH_TIGHT").unwrap(),
            GedMethod::BranchTight
        );
        assert!(matches!(
            GedMethod::parse("NEAREST"),
            Err(OmicsGedError::Config { .. })
        ));
    }

    #[test]
    fn test_only_ipfp_is_randomized() {
        assert!(GedMethod::Ipfp.is_randomized());
        assert!(!GedMethod::Branch.is_randomized());
        assert!(!GedMethod::BranchTight.is_randomized());
    }

    #[test]
    fn test_init_type_parsing() {
        assert_eq!(InitType::parse("").unwrap(), InitType::Lazy);
        assert_eq!(InitType::parse("EAGER").unwrap(), InitType::Eager);
        assert!(matches!(
            InitType::parse("lazy"),
            Err(OmicsGedError::Config { .. })
        ));
    }
}
