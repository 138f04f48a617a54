//! Graph center discovery.
//!
//! The center is the node whose worst-case shortest-path distance to every
//! other node (its eccentricity) is smallest. Candidates are scanned in
//! ascending id order and only a strictly smaller eccentricity replaces the
//! current best, so ties always resolve to the smallest id.

use crate::error::{OverlayError, Result};
use crate::graph::{Graph, NodeId};
use crate::paths::{all_pairs_distances, Distance};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// A graph center and its eccentricity (the graph radius)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Center {
    pub node: NodeId,
    pub eccentricity: Distance,
}

/// Eccentricity of every node of a connected graph
pub fn eccentricities(graph: &Graph) -> Result<BTreeMap<NodeId, Distance>> {
    graph.ensure_connected("center")?;
    let matrix = all_pairs_distances(graph);

    matrix
        .nodes()
        .map(|node| {
            // Connected graph: every row is complete
            let eccentricity = matrix.eccentricity(node).ok_or_else(|| OverlayError::Disconnected {
                stage: "center",
                components: graph.component_count(),
            })?;
            Ok((node, eccentricity))
        })
        .collect()
}

/// Find the center of a connected graph.
///
/// Nodes with eccentricity 0 (a single-node graph) are skipped; if nothing
/// qualifies the result is [`OverlayError::NoCenter`].
pub fn center(graph: &Graph) -> Result<Center> {
    let mut best: Option<Center> = None;

    for (node, eccentricity) in eccentricities(graph)? {
        if eccentricity == 0 {
            continue;
        }
        match best {
            Some(current) if eccentricity >= current.eccentricity => {}
            _ => best = Some(Center { node, eccentricity }),
        }
    }

    let found = best.ok_or(OverlayError::NoCenter)?;
    debug!(node = %found.node, eccentricity = found.eccentricity, "graph center");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_of_five_centers_on_middle() {
        let graph = Graph::from_edge_list(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
        assert_eq!(
            center(&graph).unwrap(),
            Center {
                node: NodeId(2),
                eccentricity: 2
            }
        );
    }

    #[test]
    fn test_ties_resolve_to_smallest_id() {
        // Every node of a cycle has the same eccentricity
        let cycle = Graph::from_edge_list(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        assert_eq!(center(&cycle).unwrap().node, NodeId(0));

        // Even path: nodes 1 and 2 tie
        let path = Graph::from_edge_list(4, &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(
            center(&path).unwrap(),
            Center {
                node: NodeId(1),
                eccentricity: 2
            }
        );
    }

    #[test]
    fn test_idempotent() {
        let graph = Graph::from_edge_list(7, &[(0, 1), (1, 2), (1, 3), (3, 4), (4, 5), (4, 6)]);
        let first = center(&graph).unwrap();
        let second = center(&graph).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_weighted_center() {
        let mut graph = Graph::from_edge_list(3, &[]);
        graph.add_edge(NodeId(0), NodeId(1), 5).unwrap();
        graph.add_edge(NodeId(1), NodeId(2), 1).unwrap();
        // ecc(0) = 6, ecc(1) = 5, ecc(2) = 6
        assert_eq!(
            center(&graph).unwrap(),
            Center {
                node: NodeId(1),
                eccentricity: 5
            }
        );
    }

    #[test]
    fn test_disconnected_graph_is_fatal() {
        let graph = Graph::from_edge_list(4, &[(0, 1), (2, 3)]);
        let err = center(&graph).unwrap_err();
        assert_eq!(
            err,
            OverlayError::Disconnected {
                stage: "center",
                components: 2
            }
        );
        assert!(err.is_invariant_violation());
    }

    #[test]
    fn test_single_node_has_no_center() {
        let graph = Graph::from_edge_list(1, &[]);
        assert_eq!(center(&graph), Err(OverlayError::NoCenter));
    }

    #[test]
    fn test_eccentricities_of_star() {
        let star = Graph::from_edge_list(4, &[(0, 1), (0, 2), (0, 3)]);
        let ecc = eccentricities(&star).unwrap();
        assert_eq!(ecc[&NodeId(0)], 1);
        assert_eq!(ecc[&NodeId(1)], 2);
        assert_eq!(ecc.len(), 4);
    }
}
