//! Shortest-path routines over [`Graph`].
//!
//! Dijkstra with a binary heap keyed on `(distance, node id)`, so equal-length
//! alternatives always resolve towards the smallest node id. On unit-weight
//! graphs this is a hop-count search.

use crate::error::{OverlayError, Result};
use crate::graph::{Graph, NodeId};
use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};

/// Path length (sum of edge weights)
pub type Distance = u64;

/// Distances and predecessors from one source
struct Search {
    distances: BTreeMap<NodeId, Distance>,
    parents: BTreeMap<NodeId, NodeId>,
}

fn dijkstra(graph: &Graph, source: NodeId, stop_at: Option<NodeId>) -> Result<Search> {
    if !graph.contains(source) {
        return Err(OverlayError::UnknownNode(source));
    }

    let mut distances: BTreeMap<NodeId, Distance> = BTreeMap::new();
    let mut parents: BTreeMap<NodeId, NodeId> = BTreeMap::new();
    let mut heap = BinaryHeap::new();

    distances.insert(source, 0);
    heap.push(Reverse((0, source)));

    while let Some(Reverse((dist, current))) = heap.pop() {
        if distances.get(&current).is_some_and(|&best| dist > best) {
            continue;
        }
        if stop_at == Some(current) {
            break;
        }

        for (neighbor, weight) in graph.neighbors(current) {
            let candidate = dist + Distance::from(weight);
            let improves = distances.get(&neighbor).map_or(true, |&known| candidate < known);
            if improves {
                distances.insert(neighbor, candidate);
                parents.insert(neighbor, current);
                heap.push(Reverse((candidate, neighbor)));
            }
        }
    }

    Ok(Search { distances, parents })
}

/// Distances from `source` to every reachable node (including itself at 0)
pub fn single_source_distances(graph: &Graph, source: NodeId) -> Result<BTreeMap<NodeId, Distance>> {
    Ok(dijkstra(graph, source, None)?.distances)
}

/// One shortest path from `source` to `target`, both endpoints included.
///
/// A path from a node to itself is `[source]`. Fails with
/// [`OverlayError::Unreachable`] when `target` cannot be reached.
pub fn shortest_path(graph: &Graph, source: NodeId, target: NodeId) -> Result<Vec<NodeId>> {
    if !graph.contains(target) {
        return Err(OverlayError::UnknownNode(target));
    }
    let search = dijkstra(graph, source, Some(target))?;
    if !search.distances.contains_key(&target) {
        return Err(OverlayError::Unreachable {
            from: source,
            to: target,
        });
    }

    let mut path = vec![target];
    let mut current = target;
    while current != source {
        current = *search
            .parents
            .get(&current)
            .ok_or(OverlayError::Unreachable {
                from: source,
                to: target,
            })?;
        path.push(current);
    }
    path.reverse();
    Ok(path)
}

/// Shortest-path distance between two nodes
pub fn distance(graph: &Graph, source: NodeId, target: NodeId) -> Result<Distance> {
    if !graph.contains(target) {
        return Err(OverlayError::UnknownNode(target));
    }
    dijkstra(graph, source, Some(target))?
        .distances
        .get(&target)
        .copied()
        .ok_or(OverlayError::Unreachable {
            from: source,
            to: target,
        })
}

/// All-pairs distance table, one Dijkstra run per node
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    node_count: usize,
    rows: BTreeMap<NodeId, BTreeMap<NodeId, Distance>>,
}

impl DistanceMatrix {
    pub fn get(&self, from: NodeId, to: NodeId) -> Option<Distance> {
        self.rows.get(&from)?.get(&to).copied()
    }

    /// Maximum distance from `node` to any other node, or None when some node
    /// is unreachable from it
    pub fn eccentricity(&self, node: NodeId) -> Option<Distance> {
        let row = self.rows.get(&node)?;
        if row.len() < self.node_count {
            return None;
        }
        row.values().copied().max()
    }

    /// Source nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.rows.keys().copied()
    }
}

pub fn all_pairs_distances(graph: &Graph) -> DistanceMatrix {
    let rows = graph
        .node_ids()
        .into_iter()
        .map(|id| {
            let distances = dijkstra(graph, id, None)
                .map(|search| search.distances)
                .unwrap_or_default();
            (id, distances)
        })
        .collect();

    DistanceMatrix {
        node_count: graph.node_count(),
        rows,
    }
}
