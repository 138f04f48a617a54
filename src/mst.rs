//! Minimum spanning tree extraction (Kruskal).
//!
//! Equal-weight edges can be ordered in more than one way, and each order may
//! yield a different (equally minimal) tree. The order is supplied by a
//! [`TieBreak`] policy so that callers can pin it in tests or randomise it
//! from a seeded generator.

use crate::graph::{Edge, Graph, NodeId};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;

/// Ordering policy for candidate edges before Kruskal's scan.
///
/// Implementations must leave `edges` sorted by non-decreasing weight; they
/// only choose the order inside each weight class.
pub trait TieBreak {
    fn order_edges(&mut self, edges: &mut [Edge]);
}

/// Deterministic order: weight, then endpoint ids
#[derive(Debug, Clone, Copy, Default)]
pub struct StableOrder;

impl TieBreak for StableOrder {
    fn order_edges(&mut self, edges: &mut [Edge]) {
        edges.sort_by_key(|e| (e.weight, e.a, e.b));
    }
}

/// Random order inside each weight class, drawn from the wrapped generator
#[derive(Debug)]
pub struct RandomOrder<R> {
    rng: R,
}

impl<R: Rng> RandomOrder<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: Rng> TieBreak for RandomOrder<R> {
    fn order_edges(&mut self, edges: &mut [Edge]) {
        edges.shuffle(&mut self.rng);
        // stable sort keeps the shuffled order among equal weights
        edges.sort_by_key(|e| e.weight);
    }
}

/// Union-find over dense indices with path compression and union by rank
#[derive(Clone, Debug)]
struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        while self.parent[node] != node {
            let parent = self.parent[node];
            self.parent[node] = root;
            node = parent;
        }

        root
    }

    /// Merge the sets holding `left` and `right`; false if already merged
    fn union(&mut self, left: usize, right: usize) -> bool {
        let mut left = self.find(left);
        let mut right = self.find(right);
        if left == right {
            return false;
        }
        let left_rank = self.rank[left];
        let right_rank = self.rank[right];
        if left_rank < right_rank {
            std::mem::swap(&mut left, &mut right);
        }
        self.parent[right] = left;
        if left_rank == right_rank {
            self.rank[left] = left_rank.saturating_add(1);
        }
        true
    }
}

/// Minimum spanning tree of `graph`, keeping every node and its attributes.
///
/// On a disconnected graph this is a minimum spanning forest; callers that
/// need a tree check connectivity first.
pub fn minimum_spanning_tree<T: TieBreak + ?Sized>(graph: &Graph, tie_break: &mut T) -> Graph {
    let index: BTreeMap<NodeId, usize> = graph
        .node_ids()
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, i))
        .collect();

    let mut edges = graph.edges();
    tie_break.order_edges(&mut edges);

    let mut tree = graph.empty_copy();
    let mut sets = DisjointSet::new(index.len());
    let needed = index.len().saturating_sub(1);
    let mut taken = 0;

    for edge in edges {
        if taken == needed {
            break;
        }
        let (Some(&left), Some(&right)) = (index.get(&edge.a), index.get(&edge.b)) else {
            continue;
        };
        if sets.union(left, right) {
            // Endpoints come from `graph`, so they exist in its copy
            let _ = tree.add_edge(edge.a, edge.b, edge.weight);
            taken += 1;
        }
    }

    tree
}
