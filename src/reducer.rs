//! Topology reduction: shrink a connected network to the nodes that lie on
//! shortest paths between its distinguished nodes.
//!
//! Pipeline:
//! 1. center of the full graph, promoted in place
//! 2. minimum spanning tree of the graph
//! 3. center of the tree (optionally promoted and added to the targets)
//! 4. target set = services followed by the center(s)
//! 5. one tree path per unordered target pair
//! 6. reduced graph = union of the path edges
//! 7. center of the reduced graph (isolates removed), marked `ReducedCenter`

use crate::center::{center, Center};
use crate::error::{OverlayError, Result};
use crate::graph::{Graph, NodeId, NodeRole};
use crate::mst::{minimum_spanning_tree, TieBreak};
use crate::paths::shortest_path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Reducer variant switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReducerConfig {
    /// Treat the spanning-tree center as an extra distinguished node
    pub include_tree_center: bool,
}

/// Everything produced by one reduction
#[derive(Debug, Clone)]
pub struct Reduction {
    /// Center of the input graph
    pub graph_center: Center,
    /// Center of the spanning tree
    pub tree_center: Center,
    /// Center of the reduced graph, None when it has no edges
    pub reduced_center: Option<Center>,
    pub spanning_tree: Graph,
    pub reduced: Graph,
    /// Distinguished nodes in enumeration order
    pub targets: Vec<NodeId>,
    /// One tree path per target pair `(i, j)`, `i < j` in target order
    pub paths: Vec<Vec<NodeId>>,
}

impl Reduction {
    pub fn is_target(&self, id: NodeId) -> bool {
        self.targets.contains(&id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Reducer {
    config: ReducerConfig,
}

impl Reducer {
    pub fn new(config: ReducerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }

    /// Reduce `graph` around `services`.
    ///
    /// `graph` must be connected. Its center is promoted in place; the spanning
    /// tree and reduced graph are returned in the [`Reduction`].
    pub fn reduce<T: TieBreak + ?Sized>(
        &self,
        graph: &mut Graph,
        services: &[NodeId],
        tie_break: &mut T,
    ) -> Result<Reduction> {
        graph.ensure_connected("reduce")?;
        if let Some(&missing) = services.iter().find(|id| !graph.contains(**id)) {
            return Err(OverlayError::UnknownNode(missing));
        }

        let graph_center = center_or_sole(graph)?;
        promote(graph, graph_center.node)?;

        let mut spanning_tree = minimum_spanning_tree(graph, tie_break);
        let tree_center = center_or_sole(&spanning_tree)?;

        let mut targets: Vec<NodeId> = services
            .iter()
            .copied()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        push_unique(&mut targets, graph_center.node);

        if self.config.include_tree_center {
            promote(graph, tree_center.node)?;
            promote(&mut spanning_tree, tree_center.node)?;
            push_unique(&mut targets, tree_center.node);
        }

        let paths = pairwise_paths(&spanning_tree, &targets)?;
        let mut reduced = stitch_paths(&spanning_tree, &targets, &paths)?;

        let core = reduced.without_isolates();
        let reduced_center = if core.is_empty() {
            debug!(targets = targets.len(), "reduced graph has no edges, skipping re-centering");
            None
        } else {
            let found = center(&core)?;
            reduced.set_role(found.node, NodeRole::ReducedCenter)?;
            Some(found)
        };

        info!(
            original_nodes = graph.node_count(),
            original_edges = graph.edge_count(),
            targets = targets.len(),
            paths = paths.len(),
            reduced_nodes = reduced.node_count(),
            reduced_edges = reduced.edge_count(),
            graph_center = %graph_center.node,
            tree_center = %tree_center.node,
            "reduced topology"
        );

        Ok(Reduction {
            graph_center,
            tree_center,
            reduced_center,
            spanning_tree,
            reduced,
            targets,
            paths,
        })
    }
}

/// Reduce with the default [`ReducerConfig`]
pub fn reduce<T: TieBreak + ?Sized>(
    graph: &mut Graph,
    services: &[NodeId],
    tie_break: &mut T,
) -> Result<Reduction> {
    Reducer::default().reduce(graph, services, tie_break)
}

/// A one-node network is its own center at eccentricity 0
fn center_or_sole(graph: &Graph) -> Result<Center> {
    match graph.node_ids().as_slice() {
        &[node] => Ok(Center {
            node,
            eccentricity: 0,
        }),
        _ => center(graph),
    }
}

fn promote(graph: &mut Graph, id: NodeId) -> Result<()> {
    let role = graph.role(id).ok_or(OverlayError::UnknownNode(id))?;
    graph.set_role(id, role.promoted_to_center())
}

fn push_unique(targets: &mut Vec<NodeId>, id: NodeId) {
    if !targets.contains(&id) {
        targets.push(id);
    }
}

fn pairwise_paths(tree: &Graph, targets: &[NodeId]) -> Result<Vec<Vec<NodeId>>> {
    let mut paths = Vec::new();
    for (i, &source) in targets.iter().enumerate() {
        for &target in &targets[i + 1..] {
            paths.push(shortest_path(tree, source, target)?);
        }
    }
    Ok(paths)
}

/// Union of path nodes and consecutive path edges; targets are always kept
fn stitch_paths(tree: &Graph, targets: &[NodeId], paths: &[Vec<NodeId>]) -> Result<Graph> {
    let mut reduced = Graph::new();

    let path_nodes = paths.iter().flatten();
    for &id in targets.iter().chain(path_nodes) {
        if reduced.contains(id) {
            continue;
        }
        let node = tree.node(id).ok_or(OverlayError::UnknownNode(id))?;
        reduced.add_node(node.clone());
    }

    for path in paths {
        for hop in path.windows(2) {
            let (a, b) = (hop[0], hop[1]);
            let weight = tree
                .edge_weight(a, b)
                .ok_or(OverlayError::Unreachable { from: a, to: b })?;
            reduced.add_edge(a, b, weight)?;
        }
    }

    Ok(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mst::StableOrder;

    fn ids(raw: &[usize]) -> Vec<NodeId> {
        raw.iter().map(|&i| NodeId(i)).collect()
    }

    /// 0-1-2-3-4-5-6 with a pendant 7 hanging off 3 and a pendant 8 off 5
    fn caterpillar() -> Graph {
        Graph::from_edge_list(9, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (3, 7), (5, 8)])
    }

    #[test]
    fn test_reduce_keeps_only_path_nodes() {
        let mut graph = caterpillar();
        graph.assign_services(&ids(&[1, 5])).unwrap();

        let reduction = reduce(&mut graph, &ids(&[1, 5]), &mut StableOrder).unwrap();

        // center of the caterpillar is 3 (ecc 3)
        assert_eq!(reduction.graph_center.node, NodeId(3));
        assert_eq!(reduction.targets, ids(&[1, 5, 3]));
        assert_eq!(reduction.reduced.node_ids(), ids(&[1, 2, 3, 4, 5]));
        assert_eq!(reduction.reduced.edge_count(), 4);
        assert_eq!(reduction.paths.len(), 3);
        assert_eq!(graph.role(NodeId(3)), Some(NodeRole::DataHolderCenter));
    }

    #[test]
    fn test_reduced_center_is_marked() {
        let mut graph = caterpillar();
        graph.assign_services(&ids(&[1, 5])).unwrap();
        let reduction = reduce(&mut graph, &ids(&[1, 5]), &mut StableOrder).unwrap();

        let reduced_center = reduction.reduced_center.unwrap();
        assert_eq!(reduced_center.node, NodeId(3));
        assert_eq!(reduced_center.eccentricity, 2);
        assert_eq!(reduction.reduced.role(NodeId(3)), Some(NodeRole::ReducedCenter));
        assert_eq!(reduction.reduced.role(NodeId(1)), Some(NodeRole::Service));
    }

    #[test]
    fn test_service_center_promotion() {
        let mut graph = caterpillar();
        graph.assign_services(&ids(&[3, 6])).unwrap();
        let reduction = reduce(&mut graph, &ids(&[3, 6]), &mut StableOrder).unwrap();

        assert_eq!(graph.role(NodeId(3)), Some(NodeRole::ServiceCenter));
        // the center is already a service, no extra target
        assert_eq!(reduction.targets, ids(&[3, 6]));
        assert_eq!(reduction.reduced.node_ids(), ids(&[3, 4, 5, 6]));
    }

    #[test]
    fn test_single_target_is_degenerate() {
        let mut graph = caterpillar();
        graph.assign_services(&ids(&[3])).unwrap();
        let reduction = reduce(&mut graph, &ids(&[3]), &mut StableOrder).unwrap();

        assert_eq!(reduction.targets, ids(&[3]));
        assert!(reduction.paths.is_empty());
        assert_eq!(reduction.reduced.node_ids(), ids(&[3]));
        assert_eq!(reduction.reduced.edge_count(), 0);
        assert!(reduction.reduced_center.is_none());
    }

    #[test]
    fn test_single_node_network_is_degenerate() {
        let mut graph = Graph::from_edge_list(1, &[]);
        graph.assign_services(&ids(&[0])).unwrap();
        let reduction = reduce(&mut graph, &ids(&[0]), &mut StableOrder).unwrap();

        assert_eq!(reduction.graph_center.node, NodeId(0));
        assert_eq!(reduction.graph_center.eccentricity, 0);
        assert_eq!(reduction.tree_center, reduction.graph_center);
        assert_eq!(graph.role(NodeId(0)), Some(NodeRole::ServiceCenter));
        assert_eq!(reduction.targets, ids(&[0]));
        assert!(reduction.paths.is_empty());
        assert_eq!(reduction.reduced.node_ids(), ids(&[0]));
        assert_eq!(reduction.reduced.edge_count(), 0);
        assert!(reduction.reduced_center.is_none());
    }

    #[test]
    fn test_cycle_reduces_over_spanning_tree() {
        // 6-cycle; stable MST drops edge (4, 5)
        let mut graph = Graph::from_edge_list(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        graph.assign_services(&ids(&[2, 4])).unwrap();
        let reduction = reduce(&mut graph, &ids(&[2, 4]), &mut StableOrder).unwrap();

        assert!(!reduction.spanning_tree.has_edge(NodeId(4), NodeId(5)));
        assert!(reduction.spanning_tree.is_forest());
        // every cycle node has eccentricity 3, so the center is 0
        assert_eq!(reduction.graph_center.node, NodeId(0));
        assert_eq!(reduction.targets, ids(&[2, 4, 0]));
        // node 5 hangs off the tree path 0-1-2-3-4 and is dropped
        assert_eq!(reduction.reduced.node_ids(), ids(&[0, 1, 2, 3, 4]));
        assert!(reduction.reduced.is_connected());
    }

    #[test]
    fn test_tree_center_variant() {
        let mut graph = Graph::from_edge_list(6, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0)]);
        graph.assign_services(&ids(&[2, 4])).unwrap();
        let reducer = Reducer::new(ReducerConfig {
            include_tree_center: true,
        });
        let reduction = reducer.reduce(&mut graph, &ids(&[2, 4]), &mut StableOrder).unwrap();

        // tree is the path 5-0-1-2-3-4; nodes 1 and 2 tie, smaller id wins
        assert_eq!(reduction.tree_center.node, NodeId(1));
        assert_eq!(reduction.targets, ids(&[2, 4, 0, 1]));
        assert_eq!(graph.role(NodeId(1)), Some(NodeRole::DataHolderCenter));
    }

    #[test]
    fn test_disconnected_input_is_fatal() {
        let mut graph = Graph::from_edge_list(4, &[(0, 1), (2, 3)]);
        let err = reduce(&mut graph, &ids(&[0, 3]), &mut StableOrder).unwrap_err();
        assert!(matches!(err, OverlayError::Disconnected { stage: "reduce", .. }));
    }

    #[test]
    fn test_unknown_service() {
        let mut graph = caterpillar();
        assert_eq!(
            reduce(&mut graph, &ids(&[1, 42]), &mut StableOrder).unwrap_err(),
            OverlayError::UnknownNode(NodeId(42))
        );
    }
}
