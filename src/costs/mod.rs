//! Relabeling cost matrices and edit-cost models.

mod matrix;
mod model;

pub use matrix::CostMatrix;
pub use model::{
    CallbackCosts, CallbackFns, ConstantCosts, CostModel, DatasetCosts, EdgeCostFn,
    EdgeRelCostFn, EditCosts, NodeCostFn, NodeRelCostFn,
};
