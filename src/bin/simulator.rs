//! Overlay simulator
//!
//! Generates one network, reduces it to a service overlay and scores the
//! overlay over several rounds of randomly chosen senders. Optionally dumps
//! every intermediate graph as JSON for plotting.

use clap::Parser;
use overlay_reduce::config::ExperimentConfig;
use overlay_reduce::experiment::run_iteration_with_output;
use overlay_reduce::logging::{init_logging, LogFormat};
use overlay_reduce::{ServiceSelection, Weighting};
use std::fs::File;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "Reduce one random geometric network to a service overlay")]
#[command(version)]
struct Args {
    /// JSON experiment config; flags below override its fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Total node count (N)
    #[arg(short = 'n', long)]
    nodes: Option<usize>,

    /// Service node count (M)
    #[arg(short = 'm', long)]
    services: Option<usize>,

    /// Connection radius (D)
    #[arg(short = 'd', long)]
    radius: Option<f64>,

    /// Services sampled as senders each round
    #[arg(long)]
    senders: Option<usize>,

    #[arg(long)]
    rounds: Option<usize>,

    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    weighting: Option<Weighting>,

    #[arg(long, value_enum)]
    selection: Option<ServiceSelection>,

    /// Treat the spanning-tree center as an extra distinguished node
    #[arg(long)]
    tree_center: bool,

    /// Write the generated, reduced and overlay graphs to this JSON file
    #[arg(long)]
    snapshot: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

impl Args {
    fn experiment(&self) -> Result<ExperimentConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ExperimentConfig::from_json_file(path)?,
            None => ExperimentConfig::default(),
        };
        if let Some(n) = self.nodes {
            config.num_nodes = n;
        }
        if let Some(m) = self.services {
            config.num_services = m;
        }
        if let Some(d) = self.radius {
            config.radius = d;
        }
        if let Some(senders) = self.senders {
            config.senders = senders;
        }
        if let Some(rounds) = self.rounds {
            config.rounds = rounds;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(weighting) = self.weighting {
            config.weighting = weighting;
        }
        if let Some(selection) = self.selection {
            config.selection = selection;
        }
        if self.tree_center {
            config.include_tree_center = true;
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let _guard = init_logging(args.log_format, None)?;
    let config = args.experiment()?;

    info!(
        num_nodes = config.num_nodes,
        num_services = config.num_services,
        radius = config.radius,
        weighting = %config.weighting,
        seed = config.seed,
        "starting simulation"
    );

    let (report, output) = run_iteration_with_output(&config)?;

    println!("=== Overlay Simulation ===");
    println!("{}", report);
    println!();
    println!("round  furthest  random  center  closest");
    for r in &report.rounds {
        println!(
            "{:>5}  {:>8}  {:>6}  {:>6}  {:>7}",
            r.round, r.furthest, r.random, r.center, r.closest
        );
    }

    if let Some(path) = &args.snapshot {
        serde_json::to_writer_pretty(File::create(path)?, &output.snapshot(&config))?;
        info!(path = %path.display(), "wrote graph snapshot");
    }

    Ok(())
}
