//! Error types shared by every stage of the reduction pipeline.

use crate::graph::NodeId;
use thiserror::Error;

/// Errors raised while generating, reducing or measuring a graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    /// A stage that needs a single connected component was handed more (or none)
    #[error("{stage}: {} ({components} components)", disconnected_reason(.stage))]
    Disconnected {
        stage: &'static str,
        components: usize,
    },

    #[error("no node with positive eccentricity, graph center undefined")]
    NoCenter,

    /// A shortest-path query failed on a graph believed to be connected
    #[error("no path between {from} and {to}")]
    Unreachable { from: NodeId, to: NodeId },

    #[error("node {0} is not in the graph")]
    UnknownNode(NodeId),

    #[error("node {0} carries no bit label")]
    MissingLabel(NodeId),

    #[error("invalid bit label: {0}")]
    InvalidLabel(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("empty {0} set")]
    EmptySet(&'static str),
}

fn disconnected_reason(stage: &str) -> &'static str {
    match stage {
        "center" => "graph center undefined on disconnected graph",
        _ => "graph is not a single connected component",
    }
}

impl OverlayError {
    /// True for the fatal classes that indicate a broken invariant upstream
    /// (disconnected input, missing center, unreachable pair).
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            OverlayError::Disconnected { .. }
                | OverlayError::NoCenter
                | OverlayError::Unreachable { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;
