//! The owned pipeline context and distance orchestration.

use crate::binning::{build_bins, Bin, CooccurrenceCounts};
use crate::costs::{CallbackCosts, CallbackFns, ConstantCosts, CostMatrix, CostModel, DatasetCosts};
use crate::data::{AbundanceMatrix, AttributeTable, CellGrid, SampleTable};
use crate::engine::{GedEngine, GedMethod, GraphView, InitType};
use crate::error::{OmicsGedError, Result};
use crate::graph::{assemble_graph, GraphParams};
use crate::stats::{LogratioRange, PairStatistics};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Square integer matrix of pairwise upper-bound distances; the diagonal is
/// zero by definition.
pub type DistanceMatrix = Vec<Vec<i64>>;

/// Configuration of an [`OmicsGedEnv`], loadable from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvConfig {
    /// Comparison method name; empty selects the default.
    pub method: String,
    /// Free-form argument string forwarded to the engine.
    pub method_arguments: String,
    /// Initialization type name; empty selects the default.
    pub init_type: String,
    /// Node-versus-edge cost mass weight in [0, 1].
    pub node_factor: f64,
    /// Insert/delete-versus-relabel cost mass weight in [0, 1].
    pub ins_del_factor: f64,
    /// Graph construction thresholds.
    pub graph: GraphParams,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            method: String::new(),
            method_arguments: String::new(),
            init_type: String::new(),
            node_factor: DatasetCosts::DEFAULT_FACTOR,
            ins_del_factor: DatasetCosts::DEFAULT_FACTOR,
            graph: GraphParams::default(),
        }
    }
}

impl EnvConfig {
    /// Load from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(OmicsGedError::from)
    }

    /// Save to a YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(OmicsGedError::from)
    }
}

/// The pipeline context: the cumulative dataset, the active cost model, the
/// graph collection inside the engine, and the computed results.
///
/// Every pipeline stage receives the state it needs from here; nothing is
/// process-global, so reload and reset semantics stay explicit.
pub struct OmicsGedEnv<E: GedEngine> {
    engine: E,
    samples: SampleTable,
    attributes: AttributeTable,
    params: GraphParams,
    method: GedMethod,
    method_arguments: String,
    init_type: InitType,
    /// The construction-time model; loads without a cost table fall back to
    /// it.
    base_model: Arc<CostModel>,
    cost_model: Arc<CostModel>,
    node_factor: f64,
    ins_del_factor: f64,
    labels: Vec<String>,
    distances: Option<DistanceMatrix>,
    warnings: Vec<String>,
    num_sample_graphs: usize,
}

impl<E: GedEngine + Default> OmicsGedEnv<E> {
    /// Construct an environment with the constant cost model.
    pub fn new(engine: E, config: &EnvConfig) -> Result<Self> {
        Self::construct(engine, config, CostModel::Constant(ConstantCosts))
    }

    /// Construct an environment whose costs are delegated to caller-supplied
    /// callbacks.
    pub fn with_callback_costs(engine: E, config: &EnvConfig, funcs: CallbackFns) -> Result<Self> {
        Self::construct(engine, config, CostModel::Callback(CallbackCosts::new(funcs)))
    }

    fn construct(mut engine: E, config: &EnvConfig, cost_model: CostModel) -> Result<Self> {
        config.graph.validate()?;
        for (name, value) in [
            ("node factor", config.node_factor),
            ("insert-delete factor", config.ins_del_factor),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(OmicsGedError::Config {
                    kind: name,
                    value: value.to_string(),
                });
            }
        }

        let method = GedMethod::parse(&config.method)?;
        let init_type = InitType::parse(&config.init_type)?;
        let cost_model = Arc::new(cost_model);

        engine.set_cost_model(Arc::clone(&cost_model));
        engine.set_method(method, &config.method_arguments);
        engine.init(init_type)?;

        Ok(Self {
            engine,
            samples: SampleTable::new(),
            attributes: AttributeTable::new(),
            params: config.graph,
            method,
            method_arguments: config.method_arguments.clone(),
            init_type,
            base_model: Arc::clone(&cost_model),
            cost_model,
            node_factor: config.node_factor,
            ins_del_factor: config.ins_del_factor,
            labels: Vec::new(),
            distances: None,
            warnings: Vec::new(),
            num_sample_graphs: 0,
        })
    }

    /// Load an abundance table (and optionally a cost table) from CSV files.
    pub fn load_omics_csv(
        &mut self,
        path: &Path,
        costs_path: Option<&Path>,
        separator: u8,
    ) -> Result<()> {
        let grid = CellGrid::from_path(path, separator)?;
        let costs = match costs_path {
            Some(p) => Some(CellGrid::from_path(p, separator)?),
            None => None,
        };
        self.load_omics_grid(&grid, costs.as_ref())
    }

    /// Merge an abundance grid into the dataset and rebuild every graph.
    ///
    /// All validation and statistics run on staged state; a failure anywhere
    /// leaves the environment exactly as it was. On success the sample graphs
    /// are rebuilt in a fresh engine, previously added non-sample graphs are
    /// copied across, and the engine is re-initialized with the active cost
    /// model and method.
    pub fn load_omics_grid(&mut self, grid: &CellGrid, costs: Option<&CellGrid>) -> Result<()> {
        let prior_sample_count = self.num_sample_graphs;

        let mut staged_samples = self.samples.clone();
        let mut warnings = staged_samples.merge_grid(grid)?;

        let matrix = AbundanceMatrix::from_table(&staged_samples)?;
        let range = LogratioRange::compute(&matrix)?;
        let statistics = PairStatistics::compute(&matrix, &range);

        let bins: Vec<Vec<Bin>> = (0..matrix.n_samples())
            .map(|sample| {
                build_bins(
                    sample,
                    &matrix,
                    self.params.num_bins,
                    self.params.abundance_threshold,
                    range.max_feature(),
                )
            })
            .collect();
        let cooccurrence = CooccurrenceCounts::count(&bins, self.params.num_bins);

        // The dataset cost model is parsed before anything is committed so a
        // malformed cost table cannot leave a half-updated environment.
        let dataset_model = match costs {
            Some(cost_grid) => {
                let (cost_matrix, cost_warnings) =
                    CostMatrix::from_grid(cost_grid, matrix.feature_names())?;
                warnings.extend(cost_warnings);
                Some(DatasetCosts::new(
                    cost_matrix,
                    self.node_factor,
                    self.ins_del_factor,
                )?)
            }
            None => None,
        };

        let mut engine = E::default();
        for sample in 0..matrix.n_samples() {
            assemble_graph(
                &mut engine,
                &matrix.sample_names()[sample],
                sample,
                &matrix,
                &bins[sample],
                &cooccurrence,
                &range,
                &statistics,
                &self.params,
            )?;
        }

        // Carry previously added non-sample graphs into the new engine.
        for old_id in prior_sample_count..self.engine.num_graphs() {
            let name = self.engine.graph_name(old_id)?.to_string();
            if !self.attributes.is_empty() {
                for new_id in 0..engine.num_graphs() {
                    if engine.graph_name(new_id)? == name {
                        warnings.push(format!(
                            "the environment will contain multiple graphs named '{}'; \
                             associating attribute data with them may behave unexpectedly",
                            name
                        ));
                    }
                }
            }
            let view = self.engine.graph(old_id)?;
            let new_id = engine.add_graph(&name);
            for (position, &node_id) in view.node_ids.iter().enumerate() {
                engine.add_node(new_id, node_id, view.node_labels[position])?;
            }
            for (&(from, to), &weight) in &view.edge_labels {
                engine.add_edge(new_id, from, to, weight)?;
            }
        }

        // A cost table switches to the dataset model; without one the load
        // reverts to the construction-time model.
        let new_cost_model = match dataset_model {
            Some(model) => Arc::new(CostModel::Dataset(model)),
            None => Arc::clone(&self.base_model),
        };
        engine.set_cost_model(Arc::clone(&new_cost_model));
        engine.set_method(self.method, &self.method_arguments);
        engine.init(self.init_type)?;

        // Commit.
        self.cost_model = new_cost_model;
        self.samples = staged_samples;
        self.num_sample_graphs = self.samples.n_samples();
        self.engine = engine;
        self.labels.clear();
        self.distances = None;
        for warning in warnings {
            self.warn(warning);
        }
        Ok(())
    }
}

impl<E: GedEngine> OmicsGedEnv<E> {
    fn warn(&mut self, message: String) {
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    fn is_sample_graph(&self, graph_id: usize) -> bool {
        graph_id < self.num_sample_graphs
    }

    /// Load a per-sample attribute table from a CSV file.
    pub fn load_attributes_csv(&mut self, path: &Path, separator: u8) -> Result<()> {
        let grid = CellGrid::from_path(path, separator)?;
        self.load_attributes_grid(&grid)
    }

    /// Merge an attribute grid into the environment.
    pub fn load_attributes_grid(&mut self, grid: &CellGrid) -> Result<()> {
        let warnings = self.attributes.merge_grid(grid)?;
        for warning in warnings {
            self.warn(warning);
        }
        Ok(())
    }

    /// Generate one label per graph.
    ///
    /// Without an attribute the label is `"{id}_{name}"`. With one, graphs
    /// whose name has attribute data use `"{id}_{value}"`; anything else
    /// falls back to the name, with a warning for sample graphs lacking
    /// attributes and for graphs lacking the chosen attribute.
    pub fn generate_labels(&mut self, attribute: Option<&str>) -> Result<()> {
        let n = self.engine.num_graphs();
        let mut labels = Vec::with_capacity(n);
        let mut warnings = Vec::new();

        for graph_id in 0..n {
            let name = self.engine.graph_name(graph_id)?.to_string();
            let label = match attribute {
                None => format!("{}_{}", graph_id, name),
                Some(_) if !self.attributes.contains(&name) => {
                    if self.is_sample_graph(graph_id) {
                        warnings.push(format!(
                            "the graph of sample '{}' has no associated attributes; \
                             using its name as its label instead",
                            name
                        ));
                    }
                    format!("{}_{}", graph_id, name)
                }
                Some(attribute) => match self.attributes.value(&name, attribute) {
                    Some(value) => format!("{}_{}", graph_id, value),
                    None => {
                        warnings.push(format!(
                            "the attributes of graph '{}' do not contain '{}'; \
                             using its name as its label instead",
                            name, attribute
                        ));
                        format!("{}_{}", graph_id, name)
                    }
                },
            };
            labels.push(label);
        }

        self.labels = labels;
        for warning in warnings {
            self.warn(warning);
        }
        Ok(())
    }

    /// Compare every graph pair and assemble the distance matrix.
    ///
    /// One engine call per ordered off-diagonal pair; the diagonal is fixed
    /// at zero. Randomized methods produce asymmetric upper bounds, so their
    /// matrix is symmetrized afterwards by keeping the smaller directed bound
    /// of each unordered pair.
    pub fn compute_distances(&mut self) -> Result<()> {
        let n = self.engine.num_graphs();
        log::info!(
            "computing distances for {} graphs (method {}, {} costs)",
            n,
            self.method.name(),
            self.cost_model.name()
        );

        let mut matrix: DistanceMatrix = vec![vec![0; n]; n];
        for graph_id_1 in 0..n {
            for graph_id_2 in 0..n {
                if graph_id_1 == graph_id_2 {
                    continue;
                }
                self.engine.run_method(graph_id_1, graph_id_2)?;
                matrix[graph_id_1][graph_id_2] =
                    self.engine.upper_bound(graph_id_1, graph_id_2)? as i64;
            }
        }

        if self.method.is_randomized() {
            for i in 0..n {
                for j in (i + 1)..n {
                    let smaller = matrix[i][j].min(matrix[j][i]);
                    matrix[i][j] = smaller;
                    matrix[j][i] = smaller;
                }
            }
        }

        self.distances = Some(matrix);
        Ok(())
    }

    /// Add an empty graph and return its id.
    pub fn add_graph(&mut self, name: &str) -> usize {
        if !self.attributes.is_empty() {
            let collision = (0..self.engine.num_graphs()).any(|id| {
                self.engine
                    .graph_name(id)
                    .map(|existing| existing == name)
                    .unwrap_or(false)
            });
            if collision {
                self.warn(format!(
                    "the environment already contains a graph named '{}'; \
                     associating attribute data with it may behave unexpectedly",
                    name
                ));
            }
        }
        self.engine.add_graph(name)
    }

    /// Add a labeled node to a graph.
    pub fn add_node(&mut self, graph_id: usize, node_id: usize, node_label: usize) -> Result<()> {
        self.engine.add_node(graph_id, node_id, node_label)
    }

    /// Add a weighted edge to a graph.
    pub fn add_edge(
        &mut self,
        graph_id: usize,
        from: usize,
        to: usize,
        edge_label: f64,
    ) -> Result<()> {
        self.engine.add_edge(graph_id, from, to, edge_label)
    }

    /// Re-initialize the engine, e.g. after manual graph edits.
    pub fn reinit(&mut self) -> Result<()> {
        self.engine.init(self.init_type)
    }

    /// Number of graphs currently held by the engine.
    pub fn num_graphs(&self) -> usize {
        self.engine.num_graphs()
    }

    /// Name of a graph.
    pub fn graph_name(&self, graph_id: usize) -> Result<&str> {
        self.engine.graph_name(graph_id)
    }

    /// Adjacency, node labels and edge labels of a graph.
    pub fn graph(&self, graph_id: usize) -> Result<GraphView> {
        self.engine.graph(graph_id)
    }

    /// The active comparison method name.
    pub fn method_name(&self) -> &'static str {
        self.method.name()
    }

    /// The active cost model name.
    pub fn cost_model_name(&self) -> &'static str {
        self.cost_model.name()
    }

    /// The labels generated by the last [`Self::generate_labels`] call.
    pub fn label_vector(&self) -> Result<&[String]> {
        if self.labels.is_empty() {
            return Err(OmicsGedError::State(
                "no labels have been generated".to_string(),
            ));
        }
        Ok(&self.labels)
    }

    /// The distance matrix computed by the last [`Self::compute_distances`]
    /// call.
    pub fn distance_matrix(&self) -> Result<&DistanceMatrix> {
        self.distances.as_ref().ok_or_else(|| {
            OmicsGedError::State("no distances have been computed".to_string())
        })
    }

    /// The warnings recorded since the environment was constructed.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// The cumulative sample table.
    pub fn sample_table(&self) -> &SampleTable {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::GreedyEngine;

    fn grid(rows: &[&[&str]]) -> CellGrid {
        CellGrid::from_rows(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    fn two_sample_grid() -> CellGrid {
        grid(&[&["", "a", "b"], &["s1", "10", "5"], &["s2", "4", "8"]])
    }

    fn small_env() -> OmicsGedEnv<GreedyEngine> {
        let config = EnvConfig {
            graph: GraphParams {
                num_bins: 2,
                ..GraphParams::default()
            },
            ..EnvConfig::default()
        };
        OmicsGedEnv::new(GreedyEngine::default(), &config).unwrap()
    }

    #[test]
    fn test_load_builds_one_graph_per_sample() {
        let mut env = small_env();
        env.load_omics_grid(&two_sample_grid(), None).unwrap();

        assert_eq!(env.num_graphs(), 2);
        assert_eq!(env.graph_name(0).unwrap(), "s1");
        assert_eq!(env.graph_name(1).unwrap(), "s2");
        assert_eq!(env.cost_model_name(), "constant");
    }

    #[test]
    fn test_failed_load_leaves_environment_untouched() {
        let mut env = small_env();
        env.load_omics_grid(&two_sample_grid(), None).unwrap();

        let bad = grid(&[&["", "a", "c"], &["s3", "1", "2"]]);
        assert!(env.load_omics_grid(&bad, None).is_err());
        assert_eq!(env.num_graphs(), 2);
        assert_eq!(env.sample_table().n_samples(), 2);
    }

    #[test]
    fn test_cost_table_switches_model_to_dataset() {
        let mut env = small_env();
        let costs = grid(&[&["", "a", "b"], &["a", "0", "1"], &["b", "1", "0"]]);
        env.load_omics_grid(&two_sample_grid(), Some(&costs)).unwrap();

        assert_eq!(env.cost_model_name(), "dataset");

        // A later load without a cost table reverts to the base model.
        env.load_omics_grid(&grid(&[&["", "a", "b"], &["s3", "2", "6"]]), None)
            .unwrap();
        assert_eq!(env.cost_model_name(), "constant");
    }

    #[test]
    fn test_reload_preserves_manual_graphs() {
        let mut env = small_env();
        env.load_omics_grid(&two_sample_grid(), None).unwrap();

        let manual = env.add_graph("manual");
        env.add_node(manual, 0, 7).unwrap();
        env.add_node(manual, 1, 8).unwrap();
        env.add_edge(manual, 0, 1, 0.5).unwrap();

        env.load_omics_grid(&grid(&[&["", "a", "b"], &["s3", "2", "6"]]), None)
            .unwrap();

        assert_eq!(env.num_graphs(), 4); // s1, s2, s3 + manual
        assert_eq!(env.graph_name(3).unwrap(), "manual");
        let view = env.graph(3).unwrap();
        assert_eq!(view.node_labels, vec![7, 8]);
        assert_eq!(view.edge_labels.len(), 1);
    }

    #[test]
    fn test_sample_overwrite_warns_and_keeps_size() {
        let mut env = small_env();
        env.load_omics_grid(&two_sample_grid(), None).unwrap();
        env.load_omics_grid(&grid(&[&["", "a", "b"], &["s1", "6", "3"]]), None)
            .unwrap();

        assert_eq!(env.num_graphs(), 2);
        assert!(env.warnings().iter().any(|w| w.contains("'s1'")));
    }

    #[test]
    fn test_generate_labels_by_name_and_attribute() {
        let mut env = small_env();
        env.load_omics_grid(&two_sample_grid(), None).unwrap();

        env.generate_labels(None).unwrap();
        assert_eq!(env.label_vector().unwrap(), &["0_s1", "1_s2"]);

        env.load_attributes_grid(&grid(&[&["", "group"], &["s1", "control"]]))
            .unwrap();
        env.generate_labels(Some("group")).unwrap();
        // s1 has the attribute; s2 falls back to its name with a warning.
        assert_eq!(env.label_vector().unwrap(), &["0_control", "1_s2"]);
        assert!(env
            .warnings()
            .iter()
            .any(|w| w.contains("'s2'") && w.contains("no associated attributes")));

        env.generate_labels(Some("age")).unwrap();
        assert_eq!(env.label_vector().unwrap(), &["0_s1", "1_s2"]);
        assert!(env.warnings().iter().any(|w| w.contains("'age'")));
    }

    #[test]
    fn test_results_require_prior_computation() {
        let env = small_env();
        assert!(matches!(env.label_vector(), Err(OmicsGedError::State(_))));
        assert!(matches!(
            env.distance_matrix(),
            Err(OmicsGedError::State(_))
        ));
    }

    #[test]
    fn test_compute_distances_zero_diagonal() {
        let mut env = small_env();
        env.load_omics_grid(&two_sample_grid(), None).unwrap();
        env.compute_distances().unwrap();

        let matrix = env.distance_matrix().unwrap();
        assert_eq!(matrix.len(), 2);
        assert_eq!(matrix[0][0], 0);
        assert_eq!(matrix[1][1], 0);
        assert!(matrix[0][1] >= 0);
    }

    #[test]
    fn test_invalid_method_and_factors_rejected() {
        let config = EnvConfig {
            method: "NEAREST".to_string(),
            ..EnvConfig::default()
        };
        assert!(matches!(
            OmicsGedEnv::new(GreedyEngine::default(), &config),
            Err(OmicsGedError::Config { .. })
        ));

        let config = EnvConfig {
            node_factor: 2.0,
            ..EnvConfig::default()
        };
        assert!(matches!(
            OmicsGedEnv::new(GreedyEngine::default(), &config),
            Err(OmicsGedError::Config { .. })
        ));
    }

    /// Engine double with deliberately asymmetric bounds.
    #[derive(Default)]
    struct AsymmetricEngine {
        names: Vec<String>,
    }

    impl GedEngine for AsymmetricEngine {
        fn add_graph(&mut self, name: &str) -> usize {
            self.names.push(name.to_string());
            self.names.len() - 1
        }

        fn add_node(&mut self, _: usize, _: usize, _: usize) -> Result<()> {
            Ok(())
        }

        fn add_edge(&mut self, _: usize, _: usize, _: usize, _: f64) -> Result<()> {
            Ok(())
        }

        fn set_cost_model(&mut self, _: Arc<CostModel>) {}

        fn set_method(&mut self, _: GedMethod, _: &str) {}

        fn init(&mut self, _: InitType) -> Result<()> {
            Ok(())
        }

        fn run_method(&mut self, _: usize, _: usize) -> Result<()> {
            Ok(())
        }

        fn upper_bound(&self, graph_id_1: usize, graph_id_2: usize) -> Result<f64> {
            Ok((10 * graph_id_1 + graph_id_2) as f64)
        }

        fn num_graphs(&self) -> usize {
            self.names.len()
        }

        fn graph_name(&self, graph_id: usize) -> Result<&str> {
            Ok(&self.names[graph_id])
        }

        fn graph(&self, _: usize) -> Result<GraphView> {
            Ok(GraphView {
                node_ids: Vec::new(),
                node_labels: Vec::new(),
                adjacency: Vec::new(),
                edge_labels: Default::default(),
            })
        }
    }

    #[test]
    fn test_randomized_method_symmetrizes_bounds() {
        let config = EnvConfig {
            method: "IPFP".to_string(),
            ..EnvConfig::default()
        };
        let mut env = OmicsGedEnv::new(AsymmetricEngine::default(), &config).unwrap();
        env.add_graph("g0");
        env.add_graph("g1");
        env.compute_distances().unwrap();

        let matrix = env.distance_matrix().unwrap();
        // Directed bounds were 1 and 10; the smaller one wins both cells.
        assert_eq!(matrix[0][1], 1);
        assert_eq!(matrix[1][0], 1);
    }

    #[test]
    fn test_config_yaml_round_trip() {
        let config = EnvConfig {
            method: "FAST".to_string(),
            graph: GraphParams {
                num_bins: 50,
                ..GraphParams::default()
            },
            ..EnvConfig::default()
        };
        let yaml = config.to_yaml().unwrap();
        let parsed = EnvConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.method, "FAST");
        assert_eq!(parsed.graph.num_bins, 50);
    }
}
