//! Read-only distance queries used to score an overlay.
//!
//! Every query requires a connected graph and sums shortest-path distances
//! from one node to a target set.

use crate::error::{OverlayError, Result};
use crate::graph::{Graph, NodeId};
use crate::paths::{single_source_distances, Distance};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A node and its distance sum to a target set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetDistance {
    pub node: NodeId,
    pub sum: Distance,
}

/// Sum of shortest-path distances from `source` to every target
pub fn sum_distance(graph: &Graph, source: NodeId, targets: &[NodeId]) -> Result<Distance> {
    graph.ensure_connected("metrics")?;
    sum_from(graph, source, targets)
}

/// First candidate (in the given order) with the strictly greatest sum
pub fn furthest_from_set(graph: &Graph, candidates: &[NodeId], targets: &[NodeId]) -> Result<SetDistance> {
    pick(graph, candidates, targets, |sum, best| sum > best)
}

/// First candidate (in the given order) with the strictly smallest sum
pub fn closest_from_set(graph: &Graph, candidates: &[NodeId], targets: &[NodeId]) -> Result<SetDistance> {
    pick(graph, candidates, targets, |sum, best| sum < best)
}

/// Sum from one uniformly random candidate
pub fn random_pair_distance<R: Rng + ?Sized>(
    graph: &Graph,
    candidates: &[NodeId],
    targets: &[NodeId],
    rng: &mut R,
) -> Result<SetDistance> {
    graph.ensure_connected("metrics")?;
    let &node = candidates.choose(rng).ok_or(OverlayError::EmptySet("candidate"))?;
    Ok(SetDistance {
        node,
        sum: sum_from(graph, node, targets)?,
    })
}

fn pick<F>(graph: &Graph, candidates: &[NodeId], targets: &[NodeId], replaces: F) -> Result<SetDistance>
where
    F: Fn(Distance, Distance) -> bool,
{
    graph.ensure_connected("metrics")?;
    let mut best: Option<SetDistance> = None;

    for &node in candidates {
        let sum = sum_from(graph, node, targets)?;
        match best {
            Some(current) if !replaces(sum, current.sum) => {}
            _ => best = Some(SetDistance { node, sum }),
        }
    }

    best.ok_or(OverlayError::EmptySet("candidate"))
}

fn sum_from(graph: &Graph, source: NodeId, targets: &[NodeId]) -> Result<Distance> {
    let distances = single_source_distances(graph, source)?;
    targets.iter().try_fold(0, |total, &target| {
        if !graph.contains(target) {
            return Err(OverlayError::UnknownNode(target));
        }
        let hop = distances.get(&target).ok_or(OverlayError::Unreachable {
            from: source,
            to: target,
        })?;
        Ok(total + hop)
    })
}
