//! Property-based tests for overlay_reduce
//!
//! Invariants of generation, center finding, reduction and overlay
//! weighting over randomly drawn networks.

use overlay_reduce::center::{center, eccentricities};
use overlay_reduce::mst::{minimum_spanning_tree, RandomOrder, StableOrder};
use overlay_reduce::overlay::{build_overlay, Weighting};
use overlay_reduce::paths::distance;
use overlay_reduce::{generate, BitLabel, GeneratorConfig, Graph, Reducer, ReducerConfig, ServiceSelection};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

// ============================================================================
// Strategies
// ============================================================================

/// Generator parameters: 2..60 nodes, at least one service, radius up to 0.4
fn generator_strategy() -> impl Strategy<Value = (GeneratorConfig, u64)> {
    (2usize..60, 0.0..0.4_f64, any::<bool>(), any::<u64>())
        .prop_flat_map(|(n, radius, first_m, seed)| {
            (1..=n).prop_map(move |m| {
                let selection = if first_m {
                    ServiceSelection::FirstM
                } else {
                    ServiceSelection::Random
                };
                (
                    GeneratorConfig::new(n, m, radius).with_selection(selection),
                    seed,
                )
            })
        })
}

fn generated(config: &GeneratorConfig, seed: u64) -> Graph {
    generate(config, &mut StdRng::seed_from_u64(seed)).unwrap()
}

// ============================================================================
// Generation and centers
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_generated_graph_is_connected((config, seed) in generator_strategy()) {
        let graph = generated(&config, seed);
        prop_assert_eq!(graph.node_count(), config.num_nodes);
        prop_assert_eq!(graph.component_count(), 1);
        prop_assert_eq!(graph.services().len(), config.num_services);
    }

    #[test]
    fn prop_center_minimises_eccentricity((config, seed) in generator_strategy()) {
        let graph = generated(&config, seed);
        let found = center(&graph).unwrap();
        let ecc = eccentricities(&graph).unwrap();

        prop_assert_eq!(center(&graph).unwrap(), found);
        prop_assert!(ecc.values().all(|&e| e >= found.eccentricity));
        // ties resolve to the smallest id
        let first = ecc.iter().find(|&(_, &e)| e == found.eccentricity).map(|(&id, _)| id);
        prop_assert_eq!(first, Some(found.node));
    }

    #[test]
    fn prop_spanning_tree_weight_ignores_tie_break((config, seed) in generator_strategy()) {
        let graph = generated(&config, seed);
        let stable = minimum_spanning_tree(&graph, &mut StableOrder);
        let random = minimum_spanning_tree(&graph, &mut RandomOrder::new(StdRng::seed_from_u64(seed)));
        prop_assert_eq!(stable.edge_count(), graph.node_count() - 1);
        prop_assert_eq!(stable.total_weight(), random.total_weight());
        prop_assert!(random.is_forest());
        prop_assert!(random.is_connected());
    }
}

// ============================================================================
// Reduction and overlay
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_reduction_invariants((config, seed) in generator_strategy(), tree_center in any::<bool>()) {
        let mut graph = generated(&config, seed);
        let services = graph.services();
        let reducer = Reducer::new(ReducerConfig { include_tree_center: tree_center });
        let reduction = reducer
            .reduce(&mut graph, &services, &mut RandomOrder::new(StdRng::seed_from_u64(seed)))
            .unwrap();

        for id in &services {
            prop_assert!(reduction.targets.contains(id));
        }
        for id in &reduction.targets {
            prop_assert!(reduction.reduced.contains(*id));
        }
        for id in reduction.reduced.node_ids() {
            prop_assert!(reduction.targets.contains(&id) || reduction.paths.iter().any(|p| p.contains(&id)));
        }
        for path in &reduction.paths {
            let hops = distance(&reduction.spanning_tree, path[0], path[path.len() - 1]).unwrap();
            prop_assert_eq!(hops as usize, path.len() - 1);
        }

        if reduction.targets.len() >= 2 {
            prop_assert!(reduction.reduced.is_connected());
            prop_assert!(center(&reduction.reduced).is_ok());
            prop_assert!(reduction.reduced_center.is_some());
        } else {
            prop_assert_eq!(reduction.reduced.edge_count(), 0);
        }
    }

    #[test]
    fn prop_overlay_spans_targets((config, seed) in generator_strategy(), hamming in any::<bool>()) {
        let config = if hamming { config.with_labels(8) } else { config };
        let weighting = if hamming { Weighting::Hamming } else { Weighting::PathHops };

        let mut graph = generated(&config, seed);
        let services = graph.services();
        let reduction = Reducer::default()
            .reduce(&mut graph, &services, &mut StableOrder)
            .unwrap();
        let overlay = build_overlay(&reduction, &weighting, &mut StableOrder).unwrap();

        prop_assert_eq!(overlay.graph.node_count(), reduction.targets.len());
        prop_assert_eq!(overlay.graph.edge_count(), reduction.targets.len() - 1);
        prop_assert!(overlay.is_acyclic());
        prop_assert!(overlay.graph.is_connected());
    }
}

// ============================================================================
// Bit labels
// ============================================================================

proptest! {
    #[test]
    fn prop_hamming_matches_xor_popcount(a in any::<u8>(), b in any::<u8>()) {
        let left = BitLabel::new(a as u64, 8).unwrap();
        let right = BitLabel::new(b as u64, 8).unwrap();
        prop_assert_eq!(left.hamming_distance(&right), (a ^ b).count_ones());
        prop_assert_eq!(left.hamming_distance(&right), right.hamming_distance(&left));
    }

    #[test]
    fn prop_label_text_round_trip(bits in any::<u16>(), width in 16u8..=64) {
        let label = BitLabel::new(bits as u64, width).unwrap();
        let text = label.to_string();
        prop_assert_eq!(text.len(), width as usize);
        prop_assert_eq!(text.parse::<BitLabel>().unwrap(), label);
    }
}
