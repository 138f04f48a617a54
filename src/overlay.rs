//! Overlay weighting: collapse a [`Reduction`] into a small weighted graph
//! that connects only its distinguished nodes.
//!
//! Two interchangeable strategies produce the candidate edges:
//! - [`PathHopWeighting`]: walk each stitched path from its source to the
//!   first other distinguished node; the weight is the hop count.
//! - [`HammingWeighting`]: complete graph over the distinguished nodes; the
//!   weight is the Hamming distance of their bit labels.
//!
//! Either way the overlay is the minimum spanning tree of the candidates, so
//! overlapping paths never leave redundant edges behind.

use crate::error::{OverlayError, Result};
use crate::graph::{Edge, Graph, NodeId};
use crate::mst::{minimum_spanning_tree, TieBreak};
use crate::reducer::Reduction;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

/// Produces candidate overlay edges from a reduction
pub trait WeightingStrategy {
    /// Short name for logs and exports
    fn name(&self) -> &'static str;

    fn candidate_edges(&self, reduction: &Reduction) -> Result<Vec<Edge>>;
}

/// Hop count along stitched paths to the first distinguished node
#[derive(Debug, Clone, Copy, Default)]
pub struct PathHopWeighting;

impl WeightingStrategy for PathHopWeighting {
    fn name(&self) -> &'static str {
        "path_hops"
    }

    fn candidate_edges(&self, reduction: &Reduction) -> Result<Vec<Edge>> {
        let targets: BTreeSet<NodeId> = reduction.targets.iter().copied().collect();
        let mut edges = Vec::new();

        for path in &reduction.paths {
            let Some((&source, rest)) = path.split_first() else {
                continue;
            };
            let first_hit = rest
                .iter()
                .enumerate()
                .find(|&(_, id)| *id != source && targets.contains(id));
            if let Some((offset, &hit)) = first_hit {
                edges.push(Edge::new(source, hit, (offset + 1) as u32));
            }
        }

        Ok(edges)
    }
}

/// Hamming distance between fixed-width bit labels, over every target pair
#[derive(Debug, Clone, Copy, Default)]
pub struct HammingWeighting;

impl WeightingStrategy for HammingWeighting {
    fn name(&self) -> &'static str {
        "hamming"
    }

    fn candidate_edges(&self, reduction: &Reduction) -> Result<Vec<Edge>> {
        let labels = reduction
            .targets
            .iter()
            .map(|&id| {
                reduction
                    .reduced
                    .node(id)
                    .ok_or(OverlayError::UnknownNode(id))?
                    .label()
                    .map(|label| (id, label))
                    .ok_or(OverlayError::MissingLabel(id))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut edges = Vec::new();
        for (i, &(a, label_a)) in labels.iter().enumerate() {
            for &(b, label_b) in &labels[i + 1..] {
                edges.push(Edge::new(a, b, label_a.hamming_distance(&label_b)));
            }
        }
        Ok(edges)
    }
}

/// Serialisable strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Weighting {
    #[default]
    PathHops,
    Hamming,
}

impl WeightingStrategy for Weighting {
    fn name(&self) -> &'static str {
        match self {
            Weighting::PathHops => PathHopWeighting.name(),
            Weighting::Hamming => HammingWeighting.name(),
        }
    }

    fn candidate_edges(&self, reduction: &Reduction) -> Result<Vec<Edge>> {
        match self {
            Weighting::PathHops => PathHopWeighting.candidate_edges(reduction),
            Weighting::Hamming => HammingWeighting.candidate_edges(reduction),
        }
    }
}

impl std::fmt::Display for Weighting {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Weighted overlay over the distinguished nodes
#[derive(Debug, Clone)]
pub struct Overlay {
    /// Minimum spanning tree of the candidates
    pub graph: Graph,
    /// Candidate graph before the spanning-tree step (duplicates collapsed)
    pub candidates: Graph,
    pub weighting: &'static str,
}

impl Overlay {
    pub fn total_weight(&self) -> u64 {
        self.graph.total_weight()
    }

    pub fn is_acyclic(&self) -> bool {
        self.graph.is_forest()
    }
}

/// Build the overlay of `reduction` with the given strategy.
///
/// Duplicate candidate edges keep their smallest weight. Node attributes
/// (roles, positions, labels) come from the reduced graph.
pub fn build_overlay<W, T>(reduction: &Reduction, strategy: &W, tie_break: &mut T) -> Result<Overlay>
where
    W: WeightingStrategy + ?Sized,
    T: TieBreak + ?Sized,
{
    let mut candidates = Graph::new();
    for &id in &reduction.targets {
        let node = reduction.reduced.node(id).ok_or(OverlayError::UnknownNode(id))?;
        candidates.add_node(node.clone());
    }

    for edge in strategy.candidate_edges(reduction)? {
        match candidates.edge_weight(edge.a, edge.b) {
            Some(existing) if existing <= edge.weight => {}
            _ => {
                candidates.add_edge(edge.a, edge.b, edge.weight)?;
            }
        }
    }

    let graph = minimum_spanning_tree(&candidates, tie_break);

    info!(
        weighting = strategy.name(),
        nodes = graph.node_count(),
        candidate_edges = candidates.edge_count(),
        overlay_edges = graph.edge_count(),
        total_weight = graph.total_weight(),
        "built overlay"
    );

    Ok(Overlay {
        graph,
        candidates,
        weighting: strategy.name(),
    })
}
