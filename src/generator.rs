//! Random geometric network generation.
//!
//! Nodes are scattered uniformly over the unit square and linked whenever
//! they lie within the connection radius. Sparse placements fall apart into
//! several components, so a repair pass chains consecutive components with
//! one random edge each until a single component remains.

use crate::error::{OverlayError, Result};
use crate::graph::{BitLabel, Graph, Node, NodeId, NodeRole};
use crate::Position;
use clap::ValueEnum;
use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How the service nodes are chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ServiceSelection {
    /// Node ids `0..M`
    FirstM,
    /// A uniform random M-subset
    #[default]
    Random,
}

impl std::fmt::Display for ServiceSelection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceSelection::FirstM => write!(f, "first-m"),
            ServiceSelection::Random => write!(f, "random"),
        }
    }
}

/// Parameters of one generated network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Total node count (N)
    pub num_nodes: usize,
    /// Service node count (M)
    pub num_services: usize,
    /// Connection radius (D)
    pub radius: f64,
    pub selection: ServiceSelection,
    /// Attach fixed-width binary labels of this many bits
    pub label_width: Option<u8>,
}

impl GeneratorConfig {
    pub fn new(num_nodes: usize, num_services: usize, radius: f64) -> Self {
        Self {
            num_nodes,
            num_services,
            radius,
            selection: ServiceSelection::default(),
            label_width: None,
        }
    }

    pub fn with_selection(mut self, selection: ServiceSelection) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_labels(mut self, width: u8) -> Self {
        self.label_width = Some(width);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_nodes == 0 {
            return Err(OverlayError::InvalidParameters(
                "a network needs at least one node".to_string(),
            ));
        }
        if self.num_services > self.num_nodes {
            return Err(OverlayError::InvalidParameters(format!(
                "{} service nodes requested from {} nodes",
                self.num_services, self.num_nodes
            )));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(OverlayError::InvalidParameters(format!(
                "connection radius must be finite and non-negative, got {}",
                self.radius
            )));
        }
        if let Some(width) = self.label_width {
            let fits = width >= 1
                && width <= BitLabel::MAX_WIDTH
                && (width == BitLabel::MAX_WIDTH || (self.num_nodes as u128) <= (1u128 << width));
            if !fits {
                return Err(OverlayError::InvalidParameters(format!(
                    "{} nodes cannot be labelled with {}-bit labels",
                    self.num_nodes, width
                )));
            }
        }
        Ok(())
    }
}

/// Generate a connected network with its service nodes marked.
///
/// The post-condition `component_count() == 1` is checked; a violation is
/// reported as [`OverlayError::Disconnected`].
pub fn generate<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Result<Graph> {
    config.validate()?;

    let mut graph = random_geometric_graph(config.num_nodes, config.radius, rng);
    let geometric_edges = graph.edge_count();
    let repairs = merge_components(&mut graph, rng)?;

    let services = select_services(config, rng);
    graph.assign_services(&services)?;

    if let Some(width) = config.label_width {
        assign_labels(&mut graph, width)?;
    }

    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        geometric_edges,
        repairs,
        services = services.len(),
        "generated network"
    );
    Ok(graph)
}

/// Nodes placed uniformly in the unit square, linked when their Euclidean
/// distance is at most `radius`. Every node starts as a data holder.
pub fn random_geometric_graph<R: Rng + ?Sized>(num_nodes: usize, radius: f64, rng: &mut R) -> Graph {
    let mut graph = Graph::new();
    let positions: Vec<Position> = (0..num_nodes).map(|_| Position::random(rng)).collect();

    for (i, &position) in positions.iter().enumerate() {
        graph.add_node(Node::new(NodeId(i), position, NodeRole::DataHolder));
    }

    for i in 0..num_nodes {
        for j in (i + 1)..num_nodes {
            if positions[i].distance(&positions[j]) <= radius {
                let _ = graph.add_edge(NodeId(i), NodeId(j), 1);
            }
        }
    }

    graph
}

/// Join adjacent components (in stable order) with one unit edge between a
/// random node of each, returning the number of edges added.
///
/// Each added edge merges two components, so exactly `components - 1` edges
/// are added.
pub fn merge_components<R: Rng + ?Sized>(graph: &mut Graph, rng: &mut R) -> Result<usize> {
    let components = graph.connected_components();
    let mut added = 0;

    for pair in components.windows(2) {
        let (previous, current) = (&pair[0], &pair[1]);
        let (Some(&a), Some(&b)) = (previous.choose(rng), current.choose(rng)) else {
            continue;
        };
        graph.add_edge(a, b, 1)?;
        added += 1;
        debug!(from = %a, to = %b, "merged two isolated components");
    }

    if !graph.is_empty() {
        graph.ensure_connected("generate")?;
    }
    Ok(added)
}

fn select_services<R: Rng + ?Sized>(config: &GeneratorConfig, rng: &mut R) -> Vec<NodeId> {
    let mut services: Vec<NodeId> = match config.selection {
        ServiceSelection::FirstM => (0..config.num_services).map(NodeId).collect(),
        ServiceSelection::Random => index::sample(rng, config.num_nodes, config.num_services)
            .into_iter()
            .map(NodeId)
            .collect(),
    };
    services.sort();
    services
}

fn assign_labels(graph: &mut Graph, width: u8) -> Result<()> {
    for id in graph.node_ids() {
        let label = BitLabel::new(id.0 as u64, width).ok_or_else(|| {
            OverlayError::InvalidParameters(format!("node {} does not fit in {} bits", id, width))
        })?;
        graph.set_label(id, label)?;
    }
    Ok(())
}
