//! Integration tests for the omics-to-graph pipeline.

use omics_ged::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_with_bins(num_bins: usize) -> EnvConfig {
    EnvConfig {
        graph: GraphParams {
            num_bins,
            ..GraphParams::default()
        },
        ..EnvConfig::default()
    }
}

fn env_with_bins(num_bins: usize) -> OmicsGedEnv<GreedyEngine> {
    OmicsGedEnv::new(GreedyEngine::default(), &config_with_bins(num_bins)).unwrap()
}

fn grid(rows: &[&[&str]]) -> CellGrid {
    CellGrid::from_rows(
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect(),
    )
    .unwrap()
}

fn write_csv(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    file.flush().unwrap();
    file
}

#[test]
fn test_two_sample_end_to_end_scenario() {
    // Two samples over two features: (A=10, B=5) spreads over both bins,
    // (A=8, B=8) collapses into the upper bin.
    let mut env = env_with_bins(2);
    env.load_omics_grid(
        &grid(&[&["", "A", "B"], &["s1", "10", "5"], &["s2", "8", "8"]]),
        None,
    )
    .unwrap();

    assert_eq!(env.num_graphs(), 2);
    let view_1 = env.graph(0).unwrap();
    let view_2 = env.graph(1).unwrap();

    // Both samples produce a 2-node graph.
    assert_eq!(view_1.node_labels, vec![0, 1]);
    assert_eq!(view_2.node_labels, vec![0, 1]);

    // With only one sample populating both bins the co-occurrence evidence
    // stays far below the cutoff, so s1's edge is drawn unconditionally.
    assert_eq!(view_1.edge_labels.len(), 1);
    // s2's features share a single bin; bins are never compared with
    // themselves, so its graph has no edges.
    assert!(view_2.edge_labels.is_empty());
}

#[test]
fn test_insufficient_evidence_ignores_z_score_cutoff() {
    // An infinite cutoff would suppress any testable edge; the bin pair
    // below the co-occurrence cutoff must keep its edge anyway.
    let config = EnvConfig {
        graph: GraphParams {
            num_bins: 2,
            z_score_cutoff: f64::INFINITY,
            ..GraphParams::default()
        },
        ..EnvConfig::default()
    };
    let mut env = OmicsGedEnv::new(GreedyEngine::default(), &config).unwrap();
    env.load_omics_grid(
        &grid(&[&["", "A", "B"], &["s1", "10", "5"], &["s2", "8", "8"]]),
        None,
    )
    .unwrap();

    assert_eq!(env.graph(0).unwrap().edge_labels.len(), 1);
}

#[test]
fn test_csv_files_with_custom_separator() {
    let abundances = write_csv(&[";A;B", "s1;10;5", "s2;4;8"]);
    let costs = write_csv(&[";A;B", "A;0;1", "B;1;0"]);

    let mut env = env_with_bins(2);
    env.load_omics_csv(abundances.path(), Some(costs.path()), b';')
        .unwrap();

    assert_eq!(env.num_graphs(), 2);
    assert_eq!(env.cost_model_name(), "dataset");
}

#[test]
fn test_merging_tables_grows_and_overwrites() {
    let mut env = env_with_bins(4);
    env.load_omics_grid(
        &grid(&[&["", "A", "B"], &["s1", "10", "5"], &["s2", "4", "8"]]),
        None,
    )
    .unwrap();
    env.load_omics_grid(&grid(&[&["", "A", "B"], &["s3", "2", "6"]]), None)
        .unwrap();

    // Disjoint sample names: sizes add up.
    assert_eq!(env.num_graphs(), 3);
    assert_eq!(env.sample_table().n_samples(), 3);

    // Re-loading an existing sample overwrites instead of growing.
    env.load_omics_grid(&grid(&[&["", "A", "B"], &["s2", "9", "1"]]), None)
        .unwrap();
    assert_eq!(env.num_graphs(), 3);
    assert_eq!(env.sample_table().value("s2", "A"), Some(9.0));
    assert!(env.warnings().iter().any(|w| w.contains("'s2'")));
}

#[test]
fn test_schema_mismatch_aborts_without_partial_merge() {
    let mut env = env_with_bins(4);
    env.load_omics_grid(
        &grid(&[&["", "A", "B"], &["s1", "10", "5"], &["s2", "4", "8"]]),
        None,
    )
    .unwrap();

    let result = env.load_omics_grid(&grid(&[&["", "A", "C"], &["s3", "1", "2"]]), None);
    assert!(matches!(result, Err(OmicsGedError::SchemaMismatch(_))));
    assert_eq!(env.sample_table().n_samples(), 2);
    assert_eq!(env.num_graphs(), 2);
}

#[test]
fn test_degenerate_dataset_fails_fast() {
    let mut env = env_with_bins(4);
    let result = env.load_omics_grid(&grid(&[&["", "A", "B"], &["s1", "3", "3"]]), None);
    assert!(matches!(result, Err(OmicsGedError::Degenerate(_))));
    assert_eq!(env.num_graphs(), 0);
}

#[test]
fn test_missing_cost_row_degrades_with_warning() {
    let mut env = env_with_bins(2);
    let costs = grid(&[
        &["", "A", "B"],
        &["A", "0", "1"],
        &["B", "1", "0"],
    ]);
    // Feature C never appears in the cost table.
    env.load_omics_grid(
        &grid(&[
            &["", "A", "B", "C"],
            &["s1", "10", "5", "1"],
            &["s2", "4", "8", "2"],
        ]),
        Some(&costs),
    )
    .unwrap();

    assert_eq!(env.cost_model_name(), "dataset");
    assert!(env
        .warnings()
        .iter()
        .any(|w| w.contains("'C'") && w.contains("missing")));
}

#[test]
fn test_labels_and_distances_full_run() {
    let abundances = write_csv(&[",A,B", "s1,10,5", "s2,4,8", "s3,2,6"]);
    let attributes = write_csv(&[",group", "s1,control", "s2,treated", "s3,treated"]);

    let mut env = env_with_bins(2);
    env.load_omics_csv(abundances.path(), None, b',').unwrap();
    env.load_attributes_csv(attributes.path(), b',').unwrap();

    env.generate_labels(Some("group")).unwrap();
    assert_eq!(
        env.label_vector().unwrap(),
        &["0_control", "1_treated", "2_treated"]
    );

    env.compute_distances().unwrap();
    let matrix = env.distance_matrix().unwrap();
    assert_eq!(matrix.len(), 3);
    for (i, row) in matrix.iter().enumerate() {
        assert_eq!(row.len(), 3);
        assert_eq!(row[i], 0);
        for &entry in row {
            assert!(entry >= 0);
        }
    }
}

#[test]
fn test_manual_graphs_join_the_distance_matrix() {
    let mut env = env_with_bins(2);
    env.load_omics_grid(
        &grid(&[&["", "A", "B"], &["s1", "10", "5"], &["s2", "4", "8"]]),
        None,
    )
    .unwrap();

    let manual = env.add_graph("manual");
    env.add_node(manual, 0, 0).unwrap();
    env.add_node(manual, 1, 1).unwrap();
    env.add_edge(manual, 0, 1, 0.5).unwrap();
    env.reinit().unwrap();

    env.compute_distances().unwrap();
    let matrix = env.distance_matrix().unwrap();
    assert_eq!(matrix.len(), 3);
    assert_eq!(matrix[2][2], 0);
    assert!(matrix[0][2] >= 0 && matrix[2][0] >= 0);
}

#[test]
fn test_graph_queries_reject_bad_ids() {
    let mut env = env_with_bins(2);
    env.load_omics_grid(
        &grid(&[&["", "A", "B"], &["s1", "10", "5"], &["s2", "4", "8"]]),
        None,
    )
    .unwrap();

    assert!(matches!(
        env.graph_name(9),
        Err(OmicsGedError::Range { kind: "graph", .. })
    ));
    assert!(matches!(
        env.graph(9),
        Err(OmicsGedError::Range { kind: "graph", .. })
    ));
}
