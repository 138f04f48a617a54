//! overlay_reduce: service overlay reduction for random geometric networks
//!
//! Core library for generating connected random networks, locating graph
//! centers, and reducing a network to a weighted overlay that connects only
//! its service nodes.

pub mod center;
pub mod config;
pub mod error;
pub mod experiment;
pub mod generator;
pub mod graph;
pub mod logging;
pub mod metrics;
pub mod mst;
pub mod overlay;
pub mod paths;
pub mod reducer;

pub use center::{center, Center};
pub use error::{OverlayError, Result};
pub use generator::{generate, GeneratorConfig, ServiceSelection};
pub use graph::{BitLabel, Graph, Node, NodeId, NodeRole};
pub use overlay::{build_overlay, Overlay, Weighting};
pub use reducer::{reduce, Reducer, ReducerConfig, Reduction};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// A node location in the unit square [0, 1] x [0, 1].
///
/// Positions only drive edge placement during generation; no reduction stage
/// reads them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    /// Create a new position.
    /// Returns None if the point lies outside the unit square.
    pub fn new(x: f64, y: f64) -> Option<Self> {
        if (0.0..=1.0).contains(&x) && (0.0..=1.0).contains(&y) {
            Some(Self { x, y })
        } else {
            None
        }
    }

    /// Origin of the unit square
    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Sample a position uniformly from [0, 1) x [0, 1)
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            x: rng.gen::<f64>(),
            y: rng.gen::<f64>(),
        }
    }

    /// Euclidean distance between two positions
    pub fn distance(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.4}, {:.4})", self.x, self.y)
    }
}
