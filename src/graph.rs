//! Owned graph model: nodes with roles, positions and optional bit labels,
//! plus an undirected simple graph with integer edge weights.
//!
//! All collections are ordered maps so that every traversal visits nodes in
//! ascending [`NodeId`] order. That order is the deterministic tie-break order
//! used by the center finder, the reducer and the metrics.

use crate::error::{OverlayError, Result};
use crate::Position;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::str::FromStr;

/// Node identifier, unique within a graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Role of a node in the reduction pipeline.
///
/// The generator assigns `DataHolder`/`Service`; center promotion is done by
/// the reducer. A distinguished node is never demoted back to `DataHolder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Plain relay node
    DataHolder,
    /// Center of the generated graph
    DataHolderCenter,
    /// Service node the overlay must keep connected
    Service,
    /// Service node that is also a center
    ServiceCenter,
    /// Center of the reduced graph
    ReducedCenter,
}

impl NodeRole {
    pub fn is_service(self) -> bool {
        matches!(self, NodeRole::Service | NodeRole::ServiceCenter)
    }

    pub fn is_center(self) -> bool {
        matches!(
            self,
            NodeRole::DataHolderCenter | NodeRole::ServiceCenter | NodeRole::ReducedCenter
        )
    }

    /// Anything other than a plain data holder
    pub fn is_distinguished(self) -> bool {
        self != NodeRole::DataHolder
    }

    /// Role after the node is found to be a graph center
    pub fn promoted_to_center(self) -> Self {
        match self {
            NodeRole::DataHolder => NodeRole::DataHolderCenter,
            NodeRole::Service => NodeRole::ServiceCenter,
            other => other,
        }
    }

    /// Short code used in exports
    pub fn code(self) -> &'static str {
        match self {
            NodeRole::DataHolder => "d",
            NodeRole::DataHolderCenter => "d-ctr",
            NodeRole::Service => "s",
            NodeRole::ServiceCenter => "s-ctr",
            NodeRole::ReducedCenter => "r-ctr",
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Fixed-width binary label, printed as a zero-padded bit string (`00000011`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct BitLabel {
    bits: u64,
    width: u8,
}

impl BitLabel {
    pub const MAX_WIDTH: u8 = 64;

    /// Create a label. Returns None if the width is outside 1..=64 or the
    /// value does not fit in `width` bits.
    pub fn new(bits: u64, width: u8) -> Option<Self> {
        if width == 0 || width > Self::MAX_WIDTH {
            return None;
        }
        if width < Self::MAX_WIDTH && bits >> width != 0 {
            return None;
        }
        Some(Self { bits, width })
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    /// Number of differing bit positions
    pub fn hamming_distance(&self, other: &Self) -> u32 {
        (self.bits ^ other.bits).count_ones()
    }
}

impl std::fmt::Display for BitLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:0width$b}", self.bits, width = self.width as usize)
    }
}

impl FromStr for BitLabel {
    type Err = OverlayError;

    fn from_str(s: &str) -> Result<Self> {
        let width = s.len();
        if width == 0 || width > Self::MAX_WIDTH as usize || !s.bytes().all(|b| b == b'0' || b == b'1') {
            return Err(OverlayError::InvalidLabel(s.to_string()));
        }
        let bits = u64::from_str_radix(s, 2).map_err(|_| OverlayError::InvalidLabel(s.to_string()))?;
        Ok(Self {
            bits,
            width: width as u8,
        })
    }
}

impl From<BitLabel> for String {
    fn from(label: BitLabel) -> Self {
        label.to_string()
    }
}

impl TryFrom<String> for BitLabel {
    type Error = OverlayError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// A node record owned by its graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    position: Position,
    role: NodeRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    label: Option<BitLabel>,
}

impl Node {
    pub fn new(id: NodeId, position: Position, role: NodeRole) -> Self {
        Self {
            id,
            position,
            role,
            label: None,
        }
    }

    pub fn with_label(mut self, label: BitLabel) -> Self {
        self.label = Some(label);
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn label(&self) -> Option<BitLabel> {
        self.label
    }

    pub(crate) fn set_role(&mut self, role: NodeRole) {
        self.role = role;
    }

    pub(crate) fn set_label(&mut self, label: BitLabel) {
        self.label = Some(label);
    }
}

/// An undirected weighted edge, stored with `a < b`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub a: NodeId,
    pub b: NodeId,
    pub weight: u32,
}

impl Edge {
    pub fn new(x: NodeId, y: NodeId, weight: u32) -> Self {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        Self { a, b, weight }
    }
}

/// Serialisable view of a graph for external visualisation layers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

/// Undirected simple graph with integer edge weights
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: BTreeMap<NodeId, Node>,
    adjacency: BTreeMap<NodeId, BTreeMap<NodeId, u32>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an unweighted hop graph over nodes `0..node_count`.
    /// Endpoints beyond the range are added as well. Every node starts as a
    /// data holder at the origin.
    pub fn from_edge_list(node_count: usize, edges: &[(usize, usize)]) -> Self {
        let mut graph = Self::new();
        for i in 0..node_count {
            graph.add_node(Node::new(NodeId(i), Position::origin(), NodeRole::DataHolder));
        }
        for &(a, b) in edges {
            for id in [a, b] {
                if !graph.contains(NodeId(id)) {
                    graph.add_node(Node::new(NodeId(id), Position::origin(), NodeRole::DataHolder));
                }
            }
            if a != b {
                graph.link(NodeId(a), NodeId(b), 1);
            }
        }
        graph
    }

    /// Rebuild a graph from a snapshot
    pub fn from_snapshot(snapshot: &GraphSnapshot) -> Result<Self> {
        let mut graph = Self::new();
        for node in &snapshot.nodes {
            graph.add_node(node.clone());
        }
        for edge in &snapshot.edges {
            graph.add_edge(edge.a, edge.b, edge.weight)?;
        }
        Ok(graph)
    }

    /// Insert a node, replacing any node with the same id (edges are kept)
    pub fn add_node(&mut self, node: Node) -> Option<Node> {
        let id = node.id;
        self.adjacency.entry(id).or_default();
        self.nodes.insert(id, node)
    }

    /// Remove a node and all its incident edges
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        if let Some(neighbors) = self.adjacency.remove(&id) {
            for neighbor in neighbors.keys() {
                if let Some(back) = self.adjacency.get_mut(neighbor) {
                    back.remove(&id);
                }
            }
        }
        self.nodes.remove(&id)
    }

    /// Add an undirected edge. Self loops are ignored; an existing edge has its
    /// weight replaced. Returns true if a new edge was created.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: u32) -> Result<bool> {
        for id in [a, b] {
            if !self.contains(id) {
                return Err(OverlayError::UnknownNode(id));
            }
        }
        if a == b {
            return Ok(false);
        }
        Ok(self.link(a, b, weight))
    }

    fn link(&mut self, a: NodeId, b: NodeId, weight: u32) -> bool {
        let created = self.adjacency.entry(a).or_default().insert(b, weight).is_none();
        self.adjacency.entry(b).or_default().insert(a, weight);
        created
    }

    pub fn remove_edge(&mut self, a: NodeId, b: NodeId) -> Option<u32> {
        let weight = self.adjacency.get_mut(&a)?.remove(&b)?;
        if let Some(back) = self.adjacency.get_mut(&b) {
            back.remove(&a);
        }
        Some(weight)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn role(&self, id: NodeId) -> Option<NodeRole> {
        self.nodes.get(&id).map(Node::role)
    }

    pub(crate) fn set_role(&mut self, id: NodeId, role: NodeRole) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(OverlayError::UnknownNode(id))?;
        node.set_role(role);
        Ok(())
    }

    pub(crate) fn set_label(&mut self, id: NodeId, label: BitLabel) -> Result<()> {
        let node = self.nodes.get_mut(&id).ok_or(OverlayError::UnknownNode(id))?;
        node.set_label(label);
        Ok(())
    }

    /// Initial role assignment: the listed nodes become services, every other
    /// node a data holder.
    pub fn assign_services(&mut self, services: &[NodeId]) -> Result<()> {
        if let Some(&missing) = services.iter().find(|id| !self.contains(**id)) {
            return Err(OverlayError::UnknownNode(missing));
        }
        let services: BTreeSet<NodeId> = services.iter().copied().collect();
        for (id, node) in self.nodes.iter_mut() {
            let role = if services.contains(id) {
                NodeRole::Service
            } else {
                NodeRole::DataHolder
            };
            node.set_role(role);
        }
        Ok(())
    }

    /// Nodes currently tagged as services (including service centers)
    pub fn services(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.role.is_service())
            .map(|node| node.id)
            .collect()
    }

    /// Neighbors with edge weights, ascending by id
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = (NodeId, u32)> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|neighbors| neighbors.iter().map(|(&n, &w)| (n, w)))
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.adjacency.get(&id).map_or(0, BTreeMap::len)
    }

    pub fn edge_weight(&self, a: NodeId, b: NodeId) -> Option<u32> {
        self.adjacency.get(&a)?.get(&b).copied()
    }

    pub fn has_edge(&self, a: NodeId, b: NodeId) -> bool {
        self.edge_weight(a, b).is_some()
    }

    /// Every edge once, ordered by (a, b)
    pub fn edges(&self) -> Vec<Edge> {
        self.adjacency
            .iter()
            .flat_map(|(&a, neighbors)| {
                neighbors
                    .iter()
                    .filter(move |(&b, _)| a < b)
                    .map(move |(&b, &weight)| Edge { a, b, weight })
            })
            .collect()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.edges().iter().map(|e| u64::from(e.weight)).sum()
    }

    /// Connected components in stable order: components are ordered by their
    /// smallest node id and each component is sorted ascending.
    pub fn connected_components(&self) -> Vec<Vec<NodeId>> {
        let mut seen: BTreeSet<NodeId> = BTreeSet::new();
        let mut components = Vec::new();

        for &start in self.nodes.keys() {
            if !seen.insert(start) {
                continue;
            }
            let mut component = Vec::new();
            let mut queue = VecDeque::new();
            queue.push_back(start);

            while let Some(current) = queue.pop_front() {
                component.push(current);
                for (neighbor, _) in self.neighbors(current) {
                    if seen.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }

            component.sort();
            components.push(component);
        }

        components
    }

    pub fn component_count(&self) -> usize {
        self.connected_components().len()
    }

    pub fn is_connected(&self) -> bool {
        self.component_count() == 1
    }

    /// Fail with [`OverlayError::Disconnected`] unless the graph is exactly one
    /// component
    pub fn ensure_connected(&self, stage: &'static str) -> Result<()> {
        let components = self.component_count();
        if components == 1 {
            Ok(())
        } else {
            Err(OverlayError::Disconnected { stage, components })
        }
    }

    /// Acyclic check: a forest has exactly `nodes - components` edges
    pub fn is_forest(&self) -> bool {
        self.edge_count() + self.component_count() == self.node_count()
    }

    /// Nodes of degree zero
    pub fn isolates(&self) -> Vec<NodeId> {
        self.nodes
            .keys()
            .filter(|id| self.degree(**id) == 0)
            .copied()
            .collect()
    }

    /// Copy of the graph with every isolated node removed
    pub fn without_isolates(&self) -> Self {
        let mut copy = self.clone();
        for id in self.isolates() {
            copy.remove_node(id);
        }
        copy
    }

    /// Same nodes, no edges
    pub fn empty_copy(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            adjacency: self.nodes.keys().map(|&id| (id, BTreeMap::new())).collect(),
        }
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        GraphSnapshot {
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges(),
        }
    }
}
