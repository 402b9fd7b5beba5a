//! oged - Omics graph edit distance CLI
//!
//! Command-line interface for building sample graphs from abundance tables
//! and computing their pairwise edit distance matrix.

use clap::{Parser, Subcommand};
use omics_ged::engine::GreedyEngine;
use omics_ged::env::{EnvConfig, OmicsGedEnv};
use omics_ged::error::{OmicsGedError, Result};
use serde::Serialize;
use std::path::PathBuf;

/// Omics graph edit distance toolkit
#[derive(Parser)]
#[command(name = "oged")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build graphs from an abundance table and compute the distance matrix
    Run {
        /// Path to the abundance CSV (samples in rows, features in columns)
        #[arg(short, long)]
        abundances: PathBuf,

        /// Path to an optional feature cost CSV
        #[arg(short, long)]
        costs: Option<PathBuf>,

        /// Path to an optional per-sample attribute CSV
        #[arg(short = 't', long)]
        attributes: Option<PathBuf>,

        /// Attribute used for graph labels (defaults to the graph name)
        #[arg(short, long)]
        label_attribute: Option<String>,

        /// Field separator of the CSV files
        #[arg(short, long, default_value = ",")]
        separator: char,

        /// Path to an environment configuration YAML
        #[arg(short = 'f', long)]
        config: Option<PathBuf>,

        /// Output format: text or json
        #[arg(short = 'o', long, default_value = "text")]
        format: String,
    },

    /// Build graphs from an abundance table and inspect them
    Graphs {
        /// Path to the abundance CSV (samples in rows, features in columns)
        #[arg(short, long)]
        abundances: PathBuf,

        /// Field separator of the CSV file
        #[arg(short, long, default_value = ",")]
        separator: char,

        /// Path to an environment configuration YAML
        #[arg(short = 'f', long)]
        config: Option<PathBuf>,

        /// Inspect a single graph id instead of all graphs
        #[arg(short, long)]
        id: Option<usize>,
    },
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            abundances,
            costs,
            attributes,
            label_attribute,
            separator,
            config,
            format,
        } => cmd_run(
            &abundances,
            costs.as_deref(),
            attributes.as_deref(),
            label_attribute.as_deref(),
            separator,
            config.as_deref(),
            &format,
        ),

        Commands::Graphs {
            abundances,
            separator,
            config,
            id,
        } => cmd_graphs(&abundances, separator, config.as_deref(), id),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<&std::path::Path>) -> Result<EnvConfig> {
    match path {
        Some(path) => {
            let yaml = std::fs::read_to_string(path)?;
            EnvConfig::from_yaml(&yaml)
        }
        None => Ok(EnvConfig::default()),
    }
}

fn parse_separator(separator: char) -> Result<u8> {
    if !separator.is_ascii() {
        return Err(OmicsGedError::Config {
            kind: "field separator",
            value: separator.to_string(),
        });
    }
    Ok(separator as u8)
}

#[derive(Serialize)]
struct RunOutput<'a> {
    method: &'a str,
    edit_costs: &'a str,
    labels: &'a [String],
    distances: &'a [Vec<i64>],
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    abundances: &std::path::Path,
    costs: Option<&std::path::Path>,
    attributes: Option<&std::path::Path>,
    label_attribute: Option<&str>,
    separator: char,
    config: Option<&std::path::Path>,
    format: &str,
) -> Result<()> {
    let separator = parse_separator(separator)?;
    let config = load_config(config)?;
    let mut env = OmicsGedEnv::new(GreedyEngine::default(), &config)?;

    eprintln!("Loading abundance data from {:?}...", abundances);
    env.load_omics_csv(abundances, costs, separator)?;
    if let Some(path) = attributes {
        eprintln!("Loading attribute data from {:?}...", path);
        env.load_attributes_csv(path, separator)?;
    }

    eprintln!(
        "Built {} graphs ({} method, {} costs)",
        env.num_graphs(),
        env.method_name(),
        env.cost_model_name()
    );

    env.generate_labels(label_attribute)?;
    env.compute_distances()?;

    let labels = env.label_vector()?;
    let distances = env.distance_matrix()?;
    match format {
        "json" => {
            let output = RunOutput {
                method: env.method_name(),
                edit_costs: env.cost_model_name(),
                labels,
                distances,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        "text" => {
            let width = labels.iter().map(|l| l.len()).max().unwrap_or(0);
            for (label, row) in labels.iter().zip(distances) {
                let cells: Vec<String> = row.iter().map(|d| d.to_string()).collect();
                println!("{:>width$}  {}", label, cells.join(" "), width = width);
            }
        }
        _ => {
            return Err(OmicsGedError::Config {
                kind: "output format",
                value: format.to_string(),
            })
        }
    }
    Ok(())
}

fn cmd_graphs(
    abundances: &std::path::Path,
    separator: char,
    config: Option<&std::path::Path>,
    id: Option<usize>,
) -> Result<()> {
    let separator = parse_separator(separator)?;
    let config = load_config(config)?;
    let mut env = OmicsGedEnv::new(GreedyEngine::default(), &config)?;
    env.load_omics_csv(abundances, None, separator)?;

    let ids: Vec<usize> = match id {
        Some(id) => vec![id],
        None => (0..env.num_graphs()).collect(),
    };

    for graph_id in ids {
        let view = env.graph(graph_id)?;
        println!(
            "graph {} '{}': {} nodes, {} edges",
            graph_id,
            env.graph_name(graph_id)?,
            view.node_ids.len(),
            view.edge_labels.len()
        );
        for ((from, to), weight) in &view.edge_labels {
            println!("  {} -- {}  {:.4}", from, to, weight);
        }
    }
    Ok(())
}
