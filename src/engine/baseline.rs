//! A small reference engine producing valid (loose) upper bounds.

use crate::costs::{ConstantCosts, CostModel, EditCosts};
use crate::engine::{GedEngine, GedMethod, GraphView, InitType};
use crate::error::{OmicsGedError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
struct StoredGraph {
    name: String,
    nodes: BTreeMap<usize, usize>,
    edges: BTreeMap<(usize, usize), f64>,
}

/// In-memory engine that prices one concrete edit path per pair.
///
/// Nodes of the two graphs are matched greedily in ascending label order; the
/// cost of relabeling the matched prefix, inserting/deleting the remainder,
/// and reconciling the induced edges is returned as the upper bound. The cost
/// of any edit path bounds the exact edit distance from above, so the result
/// is always valid, just not tight. The selected method is recorded and
/// reported but does not change the bound.
#[derive(Debug, Default)]
pub struct GreedyEngine {
    graphs: Vec<StoredGraph>,
    costs: Option<Arc<CostModel>>,
    method: GedMethod,
    arguments: String,
    init_type: InitType,
    bounds: BTreeMap<(usize, usize), f64>,
}

impl GreedyEngine {
    /// The method most recently selected.
    pub fn method(&self) -> GedMethod {
        self.method
    }

    /// The raw argument string passed with the method.
    pub fn method_arguments(&self) -> &str {
        &self.arguments
    }

    /// The initialization type of the last `init` call.
    pub fn init_type(&self) -> InitType {
        self.init_type
    }

    fn stored(&self, graph_id: usize) -> Result<&StoredGraph> {
        self.graphs.get(graph_id).ok_or(OmicsGedError::Range {
            kind: "graph",
            id: graph_id,
            len: self.graphs.len(),
        })
    }

    /// Nodes sorted by (label, id); the pairing order of the edit path.
    fn sorted_nodes(graph: &StoredGraph) -> Vec<(usize, usize)> {
        let mut nodes: Vec<(usize, usize)> =
            graph.nodes.iter().map(|(&id, &label)| (id, label)).collect();
        nodes.sort_by_key(|&(id, label)| (label, id));
        nodes
    }

    fn edit_path_cost(&self, g1: &StoredGraph, g2: &StoredGraph) -> f64 {
        let fallback = ConstantCosts;
        let costs: &dyn EditCosts = match &self.costs {
            Some(model) => model.as_ref(),
            None => &fallback,
        };

        let nodes_1 = Self::sorted_nodes(g1);
        let nodes_2 = Self::sorted_nodes(g2);
        let matched = nodes_1.len().min(nodes_2.len());

        let mut total = 0.0;
        let mut mapping = BTreeMap::new();
        for i in 0..matched {
            total += costs.node_rel_cost(nodes_1[i].1, nodes_2[i].1);
            mapping.insert(nodes_1[i].0, nodes_2[i].0);
        }
        for &(_, label) in &nodes_1[matched..] {
            total += costs.node_del_cost(label);
        }
        for &(_, label) in &nodes_2[matched..] {
            total += costs.node_ins_cost(label);
        }

        let mut used = BTreeSet::new();
        for (&(u, v), &weight) in &g1.edges {
            let image = match (mapping.get(&u), mapping.get(&v)) {
                (Some(&mu), Some(&mv)) => Some((mu.min(mv), mu.max(mv))),
                _ => None,
            };
            match image.and_then(|key| g2.edges.get(&key).map(|&w| (key, w))) {
                Some((key, other)) => {
                    total += costs.edge_rel_cost(weight, other);
                    used.insert(key);
                }
                None => total += costs.edge_del_cost(weight),
            }
        }
        for (key, &weight) in &g2.edges {
            if !used.contains(key) {
                total += costs.edge_ins_cost(weight);
            }
        }
        total
    }
}

impl GedEngine for GreedyEngine {
    fn add_graph(&mut self, name: &str) -> usize {
        self.graphs.push(StoredGraph {
            name: name.to_string(),
            ..Default::default()
        });
        self.graphs.len() - 1
    }

    fn add_node(&mut self, graph_id: usize, node_id: usize, node_label: usize) -> Result<()> {
        let len = self.graphs.len();
        let graph = self.graphs.get_mut(graph_id).ok_or(OmicsGedError::Range {
            kind: "graph",
            id: graph_id,
            len,
        })?;
        if graph.nodes.contains_key(&node_id) {
            return Err(OmicsGedError::DuplicateKey {
                kind: "node",
                name: node_id.to_string(),
            });
        }
        graph.nodes.insert(node_id, node_label);
        Ok(())
    }

    fn add_edge(
        &mut self,
        graph_id: usize,
        from: usize,
        to: usize,
        edge_label: f64,
    ) -> Result<()> {
        let len = self.graphs.len();
        let graph = self.graphs.get_mut(graph_id).ok_or(OmicsGedError::Range {
            kind: "graph",
            id: graph_id,
            len,
        })?;
        for node in [from, to] {
            if !graph.nodes.contains_key(&node) {
                return Err(OmicsGedError::Range {
                    kind: "node",
                    id: node,
                    len: graph.nodes.len(),
                });
            }
        }
        // Undirected storage; the first offered label for a pair wins.
        graph
            .edges
            .entry((from.min(to), from.max(to)))
            .or_insert(edge_label);
        Ok(())
    }

    fn set_cost_model(&mut self, model: Arc<CostModel>) {
        self.costs = Some(model);
        self.bounds.clear();
    }

    fn set_method(&mut self, method: GedMethod, arguments: &str) {
        self.method = method;
        self.arguments = arguments.to_string();
    }

    fn init(&mut self, init_type: InitType) -> Result<()> {
        self.init_type = init_type;
        self.bounds.clear();
        Ok(())
    }

    fn run_method(&mut self, graph_id_1: usize, graph_id_2: usize) -> Result<()> {
        let g1 = self.stored(graph_id_1)?;
        let g2 = self.stored(graph_id_2)?;
        let bound = self.edit_path_cost(g1, g2);
        self.bounds.insert((graph_id_1, graph_id_2), bound);
        Ok(())
    }

    fn upper_bound(&self, graph_id_1: usize, graph_id_2: usize) -> Result<f64> {
        self.stored(graph_id_1)?;
        self.stored(graph_id_2)?;
        self.bounds
            .get(&(graph_id_1, graph_id_2))
            .copied()
            .ok_or_else(|| {
                OmicsGedError::State(format!(
                    "no comparison has been run for graph pair ({}, {})",
                    graph_id_1, graph_id_2
                ))
            })
    }

    fn num_graphs(&self) -> usize {
        self.graphs.len()
    }

    fn graph_name(&self, graph_id: usize) -> Result<&str> {
        Ok(&self.stored(graph_id)?.name)
    }

    fn graph(&self, graph_id: usize) -> Result<GraphView> {
        let graph = self.stored(graph_id)?;
        let node_ids: Vec<usize> = graph.nodes.keys().copied().collect();
        let node_labels: Vec<usize> = graph.nodes.values().copied().collect();

        let position: BTreeMap<usize, usize> = node_ids
            .iter()
            .enumerate()
            .map(|(pos, &id)| (id, pos))
            .collect();
        let n = node_ids.len();
        let mut adjacency = vec![vec![0usize; n]; n];
        for &(u, v) in graph.edges.keys() {
            let (pu, pv) = (position[&u], position[&v]);
            adjacency[pu][pv] = 1;
            adjacency[pv][pu] = 1;
        }

        Ok(GraphView {
            node_ids,
            node_labels,
            adjacency,
            edge_labels: graph.edges.clone(),
        })
    }
}
