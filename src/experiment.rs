//! Experiment driver: generate, reduce and score networks, singly or as a
//! sweep.
//!
//! Each iteration owns a `StdRng` seeded from its config, so a sweep gives
//! the same results whether it runs sequentially or on the rayon pool.

use crate::center::center;
use crate::config::{ExperimentConfig, SweepPlan};
use crate::error::Result;
use crate::generator::generate;
use crate::graph::{Graph, GraphSnapshot, NodeId};
use crate::metrics::{closest_from_set, furthest_from_set, random_pair_distance, sum_distance};
use crate::mst::{RandomOrder, StableOrder};
use crate::overlay::{build_overlay, Overlay};
use crate::paths::Distance;
use crate::reducer::{Reducer, Reduction};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::time::Instant;
use tracing::{info, warn};

/// Every graph produced by one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Generated network with its centers promoted
    pub graph: Graph,
    pub reduction: Reduction,
    pub overlay: Overlay,
}

/// Serialisable view of a pipeline run for visualisation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub config: ExperimentConfig,
    pub original: GraphSnapshot,
    pub spanning_tree: GraphSnapshot,
    pub reduced: GraphSnapshot,
    pub overlay: GraphSnapshot,
}

impl PipelineOutput {
    pub fn snapshot(&self, config: &ExperimentConfig) -> PipelineSnapshot {
        PipelineSnapshot {
            config: config.clone(),
            original: self.graph.snapshot(),
            spanning_tree: self.reduction.spanning_tree.snapshot(),
            reduced: self.reduction.reduced.snapshot(),
            overlay: self.overlay.graph.snapshot(),
        }
    }
}

/// Metrics of one scoring round on the overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundMetrics {
    pub round: usize,
    /// Largest distance sum from any overlay node to the senders
    pub furthest: Distance,
    /// Distance sum from a random service node
    pub random: Distance,
    /// Distance sum from the overlay center
    pub center: Distance,
    /// Smallest distance sum from any service node
    pub closest: Distance,
    pub num_nodes: usize,
    pub num_services: usize,
    pub senders: usize,
}

/// Outcome of one experiment iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationReport {
    pub config: ExperimentConfig,
    pub original_edges: usize,
    pub reduced_nodes: usize,
    pub reduced_edges: usize,
    pub overlay_nodes: usize,
    pub overlay_edges: usize,
    pub overlay_weight: u64,
    pub graph_center: NodeId,
    pub reduced_center: Option<NodeId>,
    pub overlay_center: Option<NodeId>,
    pub rounds: Vec<RoundMetrics>,
    pub elapsed_ms: u128,
}

/// Per-metric means over the rounds of an iteration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricMeans {
    pub furthest: f64,
    pub random: f64,
    pub center: f64,
    pub closest: f64,
}

impl IterationReport {
    pub fn means(&self) -> MetricMeans {
        let count = self.rounds.len().max(1) as f64;
        let mean = |pick: fn(&RoundMetrics) -> Distance| {
            self.rounds.iter().map(pick).sum::<Distance>() as f64 / count
        };
        MetricMeans {
            furthest: mean(|r: &RoundMetrics| r.furthest),
            random: mean(|r: &RoundMetrics| r.random),
            center: mean(|r: &RoundMetrics| r.center),
            closest: mean(|r: &RoundMetrics| r.closest),
        }
    }
}

impl std::fmt::Display for IterationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let means = self.means();
        write!(
            f,
            "N={:<4} M={:<4} senders={:<4} {:<10} reduced={}/{} overlay={}/{} | furthest={:>7.1} random={:>7.1} center={:>7.1} closest={:>7.1} ({}ms)",
            self.config.num_nodes,
            self.config.num_services,
            self.config.senders,
            self.config.weighting,
            self.reduced_nodes,
            self.reduced_edges,
            self.overlay_nodes,
            self.overlay_edges,
            means.furthest,
            means.random,
            means.center,
            means.closest,
            self.elapsed_ms
        )
    }
}

/// Run generation, reduction and overlay weighting for one config
pub fn run_pipeline(config: &ExperimentConfig) -> Result<PipelineOutput> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    pipeline(config, &mut rng)
}

fn pipeline(config: &ExperimentConfig, rng: &mut StdRng) -> Result<PipelineOutput> {
    config.validate()?;

    let mut graph = generate(&config.generator_config(), rng)?;
    let services = graph.services();

    let reducer = Reducer::new(config.reducer_config());
    let reduction = reducer.reduce(&mut graph, &services, &mut RandomOrder::new(&mut *rng))?;
    let overlay = build_overlay(&reduction, &config.weighting, &mut StableOrder)?;

    Ok(PipelineOutput {
        graph,
        reduction,
        overlay,
    })
}

/// Run the pipeline and score the overlay over `config.rounds` rounds.
///
/// Each round samples `config.senders` service nodes as the target set.
pub fn run_iteration(config: &ExperimentConfig) -> Result<IterationReport> {
    run_iteration_with_output(config).map(|(report, _)| report)
}

/// [`run_iteration`], also handing back the graphs the report was scored on
pub fn run_iteration_with_output(config: &ExperimentConfig) -> Result<(IterationReport, PipelineOutput)> {
    let started = Instant::now();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let output = pipeline(config, &mut rng)?;

    let overlay = &output.overlay.graph;
    let overlay_nodes = overlay.node_ids();
    // the reduced center may have replaced a service role in the overlay
    let services = output.graph.services();
    let overlay_center = if overlay.node_count() > 1 {
        Some(center(overlay)?.node)
    } else {
        overlay_nodes.first().copied()
    };

    let mut rounds = Vec::with_capacity(config.rounds);
    for round in 0..config.rounds {
        let mut senders: Vec<NodeId> = index::sample(&mut rng, services.len(), config.senders)
            .into_iter()
            .map(|i| services[i])
            .collect();
        senders.sort();

        let center_sum = match overlay_center {
            Some(node) => sum_distance(overlay, node, &senders)?,
            None => 0,
        };

        rounds.push(RoundMetrics {
            round,
            furthest: furthest_from_set(overlay, &overlay_nodes, &senders)?.sum,
            random: random_pair_distance(overlay, &services, &senders, &mut rng)?.sum,
            center: center_sum,
            closest: closest_from_set(overlay, &services, &senders)?.sum,
            num_nodes: config.num_nodes,
            num_services: config.num_services,
            senders: config.senders,
        });
    }

    let report = IterationReport {
        config: config.clone(),
        original_edges: output.graph.edge_count(),
        reduced_nodes: output.reduction.reduced.node_count(),
        reduced_edges: output.reduction.reduced.edge_count(),
        overlay_nodes: overlay.node_count(),
        overlay_edges: overlay.edge_count(),
        overlay_weight: overlay.total_weight(),
        graph_center: output.reduction.graph_center.node,
        reduced_center: output.reduction.reduced_center.map(|c| c.node),
        overlay_center,
        rounds,
        elapsed_ms: started.elapsed().as_millis(),
    };

    info!(
        num_nodes = config.num_nodes,
        num_services = config.num_services,
        senders = config.senders,
        overlay_edges = report.overlay_edges,
        elapsed_ms = report.elapsed_ms as u64,
        "iteration complete"
    );
    Ok((report, output))
}

/// One sweep row: a report or the error that aborted the iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepEntry {
    pub index: usize,
    pub config: ExperimentConfig,
    pub report: Option<IterationReport>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepResults {
    /// RFC 3339 timestamp of the run
    pub generated_at: String,
    pub entries: Vec<SweepEntry>,
}

impl SweepResults {
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.error.is_some()).count()
    }
}

/// Run every experiment of `plan`; a failing iteration is logged and
/// recorded, and the sweep moves on.
pub fn run_sweep(plan: &SweepPlan, parallel: bool) -> SweepResults {
    let run = |(index, config): (usize, &ExperimentConfig)| match run_iteration(config) {
        Ok(report) => SweepEntry {
            index,
            config: config.clone(),
            report: Some(report),
            error: None,
        },
        Err(e) => {
            warn!(
                index,
                num_nodes = config.num_nodes,
                num_services = config.num_services,
                fatal = e.is_invariant_violation(),
                "iteration failed: {}",
                e
            );
            SweepEntry {
                index,
                config: config.clone(),
                report: None,
                error: Some(e.to_string()),
            }
        }
    };

    let entries: Vec<SweepEntry> = if parallel {
        plan.experiments.par_iter().enumerate().map(run).collect()
    } else {
        plan.experiments.iter().enumerate().map(run).collect()
    };

    let results = SweepResults {
        generated_at: chrono::Utc::now().to_rfc3339(),
        entries,
    };
    info!(
        iterations = results.entries.len(),
        failures = results.failures(),
        "sweep complete"
    );
    results
}

/// CSV export, one row per round; a failed iteration gets one row with the
/// error column filled in
pub fn write_csv<W: Write>(results: &SweepResults, out: &mut W) -> std::io::Result<()> {
    writeln!(
        out,
        "iteration,num_nodes,num_services,senders,weighting,round,furthest,random,center,closest,error"
    )?;

    for entry in &results.entries {
        let c = &entry.config;
        match (&entry.report, &entry.error) {
            (Some(report), _) => {
                for r in &report.rounds {
                    writeln!(
                        out,
                        "{},{},{},{},{},{},{},{},{},{},",
                        entry.index,
                        c.num_nodes,
                        c.num_services,
                        c.senders,
                        c.weighting,
                        r.round,
                        r.furthest,
                        r.random,
                        r.center,
                        r.closest
                    )?;
                }
            }
            (None, error) => {
                writeln!(
                    out,
                    "{},{},{},{},{},,,,,,\"{}\"",
                    entry.index,
                    c.num_nodes,
                    c.num_services,
                    c.senders,
                    c.weighting,
                    error.as_deref().unwrap_or("unknown").replace('"', "\"\"")
                )?;
            }
        }
    }
    Ok(())
}

/// Pretty JSON export of the full results
pub fn write_json<W: Write>(results: &SweepResults, out: W) -> serde_json::Result<()> {
    serde_json::to_writer_pretty(out, results)
}
