//! Edit cost models consumed by the comparison engine.

use crate::costs::CostMatrix;
use crate::error::{OmicsGedError, Result};
use std::sync::Mutex;

/// The edit-cost capability: one implementation per cost-model variant,
/// selected once at configuration time.
///
/// Node labels are feature ids; edge labels are normalized log-ratio weights.
pub trait EditCosts: Send + Sync {
    fn node_ins_cost(&self, node_label: usize) -> f64;
    fn node_del_cost(&self, node_label: usize) -> f64;
    fn node_rel_cost(&self, node_label_1: usize, node_label_2: usize) -> f64;
    fn edge_ins_cost(&self, edge_label: f64) -> f64;
    fn edge_del_cost(&self, edge_label: f64) -> f64;
    fn edge_rel_cost(&self, edge_label_1: f64, edge_label_2: f64) -> f64;
}

/// Unit costs: every operation costs 1, relabeling is free between equal
/// labels.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConstantCosts;

impl EditCosts for ConstantCosts {
    fn node_ins_cost(&self, _node_label: usize) -> f64 {
        1.0
    }

    fn node_del_cost(&self, _node_label: usize) -> f64 {
        1.0
    }

    fn node_rel_cost(&self, node_label_1: usize, node_label_2: usize) -> f64 {
        if node_label_1 == node_label_2 {
            0.0
        } else {
            1.0
        }
    }

    fn edge_ins_cost(&self, _edge_label: f64) -> f64 {
        1.0
    }

    fn edge_del_cost(&self, _edge_label: f64) -> f64 {
        1.0
    }

    fn edge_rel_cost(&self, edge_label_1: f64, edge_label_2: f64) -> f64 {
        if edge_label_1 == edge_label_2 {
            0.0
        } else {
            1.0
        }
    }
}

/// Costs derived from a dataset cost matrix.
///
/// `node_factor` balances node against edge cost mass and `ins_del_factor`
/// balances insertion/deletion against relabeling; both are weights in
/// [0, 1]. Node relabeling is discounted by the matrix entry for the two
/// feature labels, falling back to the undiscounted cost when a label lies
/// outside the matrix.
#[derive(Debug, Clone)]
pub struct DatasetCosts {
    matrix: CostMatrix,
    node_factor: f64,
    ins_del_factor: f64,
}

impl DatasetCosts {
    /// Default weighting between node/edge and insert-delete/relabel mass.
    pub const DEFAULT_FACTOR: f64 = 0.5;

    pub fn new(matrix: CostMatrix, node_factor: f64, ins_del_factor: f64) -> Result<Self> {
        for (name, value) in [
            ("node factor", node_factor),
            ("insert-delete factor", ins_del_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(OmicsGedError::Config {
                    kind: name,
                    value: value.to_string(),
                });
            }
        }
        Ok(Self {
            matrix,
            node_factor,
            ins_del_factor,
        })
    }
}

impl EditCosts for DatasetCosts {
    fn node_ins_cost(&self, _node_label: usize) -> f64 {
        self.ins_del_factor * self.node_factor
    }

    fn node_del_cost(&self, _node_label: usize) -> f64 {
        self.ins_del_factor * self.node_factor
    }

    fn node_rel_cost(&self, node_label_1: usize, node_label_2: usize) -> f64 {
        let base = (1.0 - self.ins_del_factor) * self.node_factor;
        match self.matrix.get(node_label_1, node_label_2) {
            Some(cost) => base * cost,
            None => base,
        }
    }

    fn edge_ins_cost(&self, _edge_label: f64) -> f64 {
        self.ins_del_factor * (1.0 - self.node_factor)
    }

    fn edge_del_cost(&self, _edge_label: f64) -> f64 {
        self.ins_del_factor * (1.0 - self.node_factor)
    }

    fn edge_rel_cost(&self, edge_label_1: f64, edge_label_2: f64) -> f64 {
        (1.0 - self.ins_del_factor) * (1.0 - self.node_factor)
            * (edge_label_1 - edge_label_2).abs()
    }
}

pub type NodeCostFn = Box<dyn FnMut(usize) -> f64 + Send>;
pub type NodeRelCostFn = Box<dyn FnMut(usize, usize) -> f64 + Send>;
pub type EdgeCostFn = Box<dyn FnMut(f64) -> f64 + Send>;
pub type EdgeRelCostFn = Box<dyn FnMut(f64, f64) -> f64 + Send>;

/// The six caller-supplied cost functions backing [`CallbackCosts`].
pub struct CallbackFns {
    pub node_ins: NodeCostFn,
    pub node_del: NodeCostFn,
    pub node_rel: NodeRelCostFn,
    pub edge_ins: EdgeCostFn,
    pub edge_del: EdgeCostFn,
    pub edge_rel: EdgeRelCostFn,
}

/// Costs delegated to externally hosted callbacks.
///
/// Precondition of this variant only: the callbacks may be bound to a runtime
/// that cannot be entered concurrently, so every cost evaluation takes a
/// single global lock. Engines invoking the model from multiple worker
/// contexts are serialized through that lock; deployments that cannot accept
/// this must run single-threaded.
pub struct CallbackCosts {
    funcs: Mutex<CallbackFns>,
}

impl CallbackCosts {
    pub fn new(funcs: CallbackFns) -> Self {
        Self {
            funcs: Mutex::new(funcs),
        }
    }

    fn locked(&self) -> std::sync::MutexGuard<'_, CallbackFns> {
        self.funcs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for CallbackCosts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackCosts").finish_non_exhaustive()
    }
}

impl EditCosts for CallbackCosts {
    fn node_ins_cost(&self, node_label: usize) -> f64 {
        (self.locked().node_ins)(node_label)
    }

    fn node_del_cost(&self, node_label: usize) -> f64 {
        (self.locked().node_del)(node_label)
    }

    fn node_rel_cost(&self, node_label_1: usize, node_label_2: usize) -> f64 {
        (self.locked().node_rel)(node_label_1, node_label_2)
    }

    fn edge_ins_cost(&self, edge_label: f64) -> f64 {
        (self.locked().edge_ins)(edge_label)
    }

    fn edge_del_cost(&self, edge_label: f64) -> f64 {
        (self.locked().edge_del)(edge_label)
    }

    fn edge_rel_cost(&self, edge_label_1: f64, edge_label_2: f64) -> f64 {
        (self.locked().edge_rel)(edge_label_1, edge_label_2)
    }
}

/// The active cost model, fixed at configuration time.
#[derive(Debug)]
pub enum CostModel {
    Constant(ConstantCosts),
    Dataset(DatasetCosts),
    Callback(CallbackCosts),
}

impl CostModel {
    /// The model name reported through the environment getters.
    pub fn name(&self) -> &'static str {
        match self {
            CostModel::Constant(_) => "constant",
            CostModel::Dataset(_) => "dataset",
            CostModel::Callback(_) => "custom",
        }
    }
}

impl EditCosts for CostModel {
    fn node_ins_cost(&self, node_label: usize) -> f64 {
        match self {
            CostModel::Constant(c) => c.node_ins_cost(node_label),
            CostModel::Dataset(c) => c.node_ins_cost(node_label),
            CostModel::Callback(c) => c.node_ins_cost(node_label),
        }
    }

    fn node_del_cost(&self, node_label: usize) -> f64 {
        match self {
            CostModel::Constant(c) => c.node_del_cost(node_label),
            CostModel::Dataset(c) => c.node_del_cost(node_label),
            CostModel::Callback(c) => c.node_del_cost(node_label),
        }
    }

    fn node_rel_cost(&self, node_label_1: usize, node_label_2: usize) -> f64 {
        match self {
            CostModel::Constant(c) => c.node_rel_cost(node_label_1, node_label_2),
            CostModel::Dataset(c) => c.node_rel_cost(node_label_1, node_label_2),
            CostModel::Callback(c) => c.node_rel_cost(node_label_1, node_label_2),
        }
    }

    fn edge_ins_cost(&self, edge_label: f64) -> f64 {
        match self {
            CostModel::Constant(c) => c.edge_ins_cost(edge_label),
            CostModel::Dataset(c) => c.edge_ins_cost(edge_label),
            CostModel::Callback(c) => c.edge_ins_cost(edge_label),
        }
    }

    fn edge_del_cost(&self, edge_label: f64) -> f64 {
        match self {
            CostModel::Constant(c) => c.edge_del_cost(edge_label),
            CostModel::Dataset(c) => c.edge_del_cost(edge_label),
            CostModel::Callback(c) => c.edge_del_cost(edge_label),
        }
    }

    fn edge_rel_cost(&self, edge_label_1: f64, edge_label_2: f64) -> f64 {
        match self {
            CostModel::Constant(c) => c.edge_rel_cost(edge_label_1, edge_label_2),
            CostModel::Dataset(c) => c.edge_rel_cost(edge_label_1, edge_label_2),
            CostModel::Callback(c) => c.edge_rel_cost(edge_label_1, edge_label_2),
        }
    }
}
