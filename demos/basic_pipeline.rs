//! Basic example demonstrating the omics-to-graph pipeline.
//!
//! This example shows how to:
//! 1. Create a synthetic abundance dataset
//! 2. Build one graph per sample
//! 3. Compute the pairwise distance matrix
//! 4. Examine graphs and results

use omics_ged::prelude::*;

fn main() -> Result<()> {
    println!("=== Omics GED Example ===\n");

    let (abundances, costs) = create_example_data();

    let config = EnvConfig {
        graph: GraphParams {
            num_bins: 10,
            ..GraphParams::default()
        },
        ..EnvConfig::default()
    };
    let mut env = OmicsGedEnv::new(GreedyEngine::default(), &config)?;

    env.load_omics_grid(&abundances, Some(&costs))?;
    println!("Built {} graphs", env.num_graphs());
    println!("  Method:     {}", env.method_name());
    println!("  Edit costs: {}", env.cost_model_name());
    println!();

    println!("=== Graphs ===\n");
    for id in 0..env.num_graphs() {
        let view = env.graph(id)?;
        println!(
            "{:<10} {} nodes, {} edges",
            env.graph_name(id)?,
            view.node_ids.len(),
            view.edge_labels.len()
        );
    }
    println!();

    env.generate_labels(None)?;
    env.compute_distances()?;

    println!("=== Distance Matrix ===\n");
    let labels = env.label_vector()?;
    let distances = env.distance_matrix()?;
    for (label, row) in labels.iter().zip(distances) {
        let cells: Vec<String> = row.iter().map(|d| d.to_string()).collect();
        println!("{:<12} {}", label, cells.join(" "));
    }

    if !env.warnings().is_empty() {
        println!("\n=== Warnings ===\n");
        for warning in env.warnings() {
            println!("  {}", warning);
        }
    }

    Ok(())
}

/// Create a small synthetic dataset with two clearly separated sample groups.
fn create_example_data() -> (CellGrid, CellGrid) {
    let n_samples = 8;
    let n_features = 6;
    let mut seed = 12345u64;

    let rand_uniform = |s: &mut u64| -> f64 {
        *s = s.wrapping_mul(1103515245).wrapping_add(12345);
        ((*s >> 16) & 0x7FFF) as f64 / 32768.0
    };

    let mut rows = Vec::new();
    let mut header = vec![String::new()];
    header.extend((0..n_features).map(|f| format!("otu_{}", f)));
    rows.push(header);

    for sample in 0..n_samples {
        let enriched = sample >= n_samples / 2;
        let mut row = vec![format!("S{:02}", sample)];
        for feature in 0..n_features {
            let base = match feature {
                0..=1 => 20.0,
                2..=3 => 60.0,
                _ => 150.0,
            };
            let effect = if enriched && feature < 2 { 4.0 } else { 1.0 };
            let noise = 0.8 + 0.4 * rand_uniform(&mut seed);
            row.push(format!("{:.2}", base * effect * noise));
        }
        rows.push(row);
    }
    let abundances = CellGrid::from_rows(rows).unwrap();

    // Relabeling costs: cheap within the same abundance tier, expensive
    // across tiers.
    let mut cost_rows = Vec::new();
    let mut header = vec![String::new()];
    header.extend((0..n_features).map(|f| format!("otu_{}", f)));
    cost_rows.push(header);
    for i in 0..n_features {
        let mut row = vec![format!("otu_{}", i)];
        for j in 0..n_features {
            let cost = if i == j {
                0.0
            } else if i / 2 == j / 2 {
                0.25
            } else {
                1.0
            };
            row.push(format!("{}", cost));
        }
        cost_rows.push(row);
    }
    let costs = CellGrid::from_rows(cost_rows).unwrap();

    (abundances, costs)
}
