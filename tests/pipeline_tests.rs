//! End-to-end checks of the reduction pipeline on small hand-built and
//! generated networks.

use overlay_reduce::center::center;
use overlay_reduce::generator::{generate, merge_components, random_geometric_graph};
use overlay_reduce::graph::Edge;
use overlay_reduce::metrics::{closest_from_set, furthest_from_set, sum_distance};
use overlay_reduce::mst::{RandomOrder, StableOrder};
use overlay_reduce::overlay::{build_overlay, HammingWeighting, PathHopWeighting, WeightingStrategy};
use overlay_reduce::paths::distance;
use overlay_reduce::{
    BitLabel, GeneratorConfig, Graph, Node, NodeId, NodeRole, OverlayError, Reducer, ReducerConfig,
    ServiceSelection,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn ids(raw: &[usize]) -> Vec<NodeId> {
    raw.iter().map(|&i| NodeId(i)).collect()
}

#[test]
fn test_generated_networks_are_connected() {
    for seed in 0..20 {
        let mut rng = StdRng::seed_from_u64(seed);
        let config = GeneratorConfig::new(100, 10, 0.08);
        let graph = generate(&config, &mut rng).unwrap();
        assert_eq!(graph.component_count(), 1, "seed {seed}");
    }
}

#[test]
fn test_sparse_placement_is_repaired() {
    let mut rng = StdRng::seed_from_u64(21);
    let mut graph = random_geometric_graph(50, 0.05, &mut rng);
    let components = graph.component_count();
    assert!(components > 1);

    let edges_before = graph.edge_count();
    let added = merge_components(&mut graph, &mut rng).unwrap();
    assert_eq!(added, components - 1);
    assert_eq!(graph.edge_count(), edges_before + added);
    assert!(graph.is_connected());
}

#[test]
fn test_path_center() {
    let path = Graph::from_edge_list(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
    let found = center(&path).unwrap();
    assert_eq!(found.node, NodeId(2));
    assert_eq!(found.eccentricity, 2);
    assert_eq!(center(&path).unwrap(), found);
}

#[test]
fn test_reduction_keeps_targets_on_shortest_paths() {
    let mut rng = StdRng::seed_from_u64(9);
    let config = GeneratorConfig::new(80, 8, 0.15);
    let mut graph = generate(&config, &mut rng).unwrap();
    let services = graph.services();

    let reduction = Reducer::default()
        .reduce(&mut graph, &services, &mut RandomOrder::new(&mut rng))
        .unwrap();

    for id in &reduction.targets {
        assert!(reduction.reduced.contains(*id));
    }
    for id in reduction.reduced.node_ids() {
        assert!(
            reduction.paths.iter().any(|p| p.contains(&id)),
            "{id} is on no target path"
        );
    }
    for path in &reduction.paths {
        let (first, last) = (path[0], path[path.len() - 1]);
        let hops = distance(&reduction.spanning_tree, first, last).unwrap();
        assert_eq!(hops as usize, path.len() - 1);
    }
}

#[test]
fn test_reduced_graph_recenters_without_disconnection() {
    for seed in 0..10 {
        let mut rng = StdRng::seed_from_u64(seed);
        let config = GeneratorConfig::new(60, 5, 0.2).with_selection(ServiceSelection::FirstM);
        let mut graph = generate(&config, &mut rng).unwrap();
        let services = graph.services();
        let reduction = Reducer::default()
            .reduce(&mut graph, &services, &mut StableOrder)
            .unwrap();

        assert!(reduction.reduced.is_connected());
        match center(&reduction.reduced) {
            Ok(_) => {}
            Err(OverlayError::Disconnected { .. }) => panic!("reduced graph split, seed {seed}"),
            Err(other) => panic!("unexpected error {other}"),
        }
    }
}

#[test]
fn test_overlay_is_a_spanning_tree_of_targets() {
    let mut rng = StdRng::seed_from_u64(17);
    let config = GeneratorConfig::new(120, 12, 0.12);
    let mut graph = generate(&config, &mut rng).unwrap();
    let services = graph.services();
    let reducer = Reducer::new(ReducerConfig {
        include_tree_center: true,
    });
    let reduction = reducer.reduce(&mut graph, &services, &mut StableOrder).unwrap();

    let overlay = build_overlay(&reduction, &PathHopWeighting, &mut StableOrder).unwrap();
    assert_eq!(overlay.graph.node_count(), reduction.targets.len());
    assert_eq!(overlay.graph.edge_count(), reduction.targets.len() - 1);
    assert!(overlay.is_acyclic());
    assert!(overlay.graph.is_connected());
}

#[test]
fn test_hamming_weight_counts_differing_bits() {
    let a = BitLabel::new(0b0000_0000, 8).unwrap();
    let b: BitLabel = "00000011".parse().unwrap();
    assert_eq!(a.hamming_distance(&b), 2);

    // 0 - 1 - 3 with labels equal to the ids
    let mut graph = Graph::new();
    for i in [0u64, 1, 3] {
        let node = Node::new(NodeId(i as usize), overlay_reduce::Position::origin(), NodeRole::DataHolder)
            .with_label(BitLabel::new(i, 8).unwrap());
        graph.add_node(node);
    }
    graph.add_edge(NodeId(0), NodeId(1), 1).unwrap();
    graph.add_edge(NodeId(1), NodeId(3), 1).unwrap();
    graph.assign_services(&ids(&[0, 3])).unwrap();

    let reduction = Reducer::default()
        .reduce(&mut graph, &ids(&[0, 3]), &mut StableOrder)
        .unwrap();
    let edges = HammingWeighting.candidate_edges(&reduction).unwrap();
    assert!(edges.contains(&Edge::new(NodeId(0), NodeId(3), 2)));
}

#[test]
fn test_square_metrics() {
    let square = Graph::from_edge_list(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
    let all = square.node_ids();
    let targets = ids(&[0, 1]);

    let furthest = furthest_from_set(&square, &all, &targets).unwrap();
    assert_eq!(furthest.node, NodeId(2));
    assert_eq!(furthest.sum, 3);

    let closest = closest_from_set(&square, &all, &targets).unwrap();
    assert!(closest.node == NodeId(0) || closest.node == NodeId(1));
    assert!(closest.sum <= 1);
    assert_eq!(sum_distance(&square, closest.node, &targets).unwrap(), closest.sum);
}

#[test]
fn test_zero_radius_is_degenerate_not_fatal() {
    let mut rng = StdRng::seed_from_u64(4);
    let config = GeneratorConfig::new(12, 3, 0.0);
    let mut graph = generate(&config, &mut rng).unwrap();
    assert_eq!(graph.edge_count(), 11);

    let services = graph.services();
    let reduction = Reducer::default()
        .reduce(&mut graph, &services, &mut StableOrder)
        .unwrap();
    let overlay = build_overlay(&reduction, &PathHopWeighting, &mut StableOrder).unwrap();
    assert!(overlay.is_acyclic());
}

#[test]
fn test_centers_are_promoted_not_demoted() {
    let mut graph = Graph::from_edge_list(5, &[(0, 1), (1, 2), (2, 3), (3, 4)]);
    graph.assign_services(&ids(&[0, 2, 4])).unwrap();
    Reducer::default()
        .reduce(&mut graph, &ids(&[0, 2, 4]), &mut StableOrder)
        .unwrap();

    assert_eq!(graph.role(NodeId(2)), Some(NodeRole::ServiceCenter));
    assert_eq!(graph.services(), ids(&[0, 2, 4]));
}
