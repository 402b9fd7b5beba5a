//! Omics-to-Graph Construction Library
//!
//! This library turns tabular abundance measurements (per-sample
//! feature/quantity tables) into weighted graphs suitable for pairwise
//! structural comparison, and derives a feature-relabeling cost model for a
//! downstream graph edit distance engine.
//!
//! # Overview
//!
//! The library is organized into composable modules:
//!
//! - **data**: Core data structures (SampleTable, AbundanceMatrix, AttributeTable)
//! - **stats**: Log-ratio statistics (LogratioRange, PairStatistics)
//! - **binning**: Abundance binning and bin co-occurrence counting
//! - **graph**: Significance-gated graph assembly, one graph per sample
//! - **costs**: Relabeling cost matrices and the edit-cost capability interface
//! - **engine**: The consumed graph-comparison engine seam
//! - **env**: The owned pipeline context and distance orchestration
//!
//! # Example
//!
//! ```no_run
//! use omics_ged::prelude::*;
//!
//! let config = EnvConfig::default();
//! let mut env = OmicsGedEnv::new(GreedyEngine::default(), &config).unwrap();
//!
//! env.load_omics_csv("abundances.csv".as_ref(), Some("costs.csv".as_ref()), b',')
//!     .unwrap();
//! env.generate_labels(None).unwrap();
//! env.compute_distances().unwrap();
//!
//! let distances = env.distance_matrix().unwrap();
//! println!("{} graphs compared", distances.len());
//! ```

pub mod binning;
pub mod costs;
pub mod data;
pub mod engine;
pub mod env;
pub mod error;
pub mod graph;
pub mod stats;

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::binning::{build_bins, Bin, CooccurrenceCounts};
    pub use crate::costs::{
        CallbackCosts, ConstantCosts, CostMatrix, CostModel, DatasetCosts, EditCosts,
    };
    pub use crate::data::{AbundanceMatrix, AttributeTable, CellGrid, SampleTable};
    pub use crate::engine::{GedEngine, GedMethod, GraphView, GreedyEngine, InitType};
    pub use crate::env::{DistanceMatrix, EnvConfig, OmicsGedEnv};
    pub use crate::error::{OmicsGedError, Result};
    pub use crate::graph::{assemble_graph, GraphParams};
    pub use crate::stats::{LogratioRange, PairStatistics};
}
