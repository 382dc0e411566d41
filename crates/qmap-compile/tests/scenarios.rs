//! End-to-end routing scenarios on small devices.

use qmap_compile::{
    CompilationUnit, CompileError, ConnectivityGraph, DeviceCharacterization, PassManagerBuilder,
    PlacementConfig, PlacementState, Predicate, Router, RoutingConfig, place, route,
};
use qmap_ir::{Circuit, ClbitId, Node, QubitId, StandardGate};

fn swaps(circuit: &Circuit) -> usize {
    circuit
        .operations()
        .iter()
        .filter(|op| op.is_standard(&StandardGate::Swap))
        .count()
}

/// Ring 0-1-2-3-0 with logical 0 on node 1, 1 on node 0, 2 on node 3.
fn ring_circuit(third: u32) -> Circuit {
    let mut circuit = Circuit::on_nodes("ring", [Node(1), Node(0), Node(third)]).unwrap();
    circuit.cx(Node(1), Node(0)).unwrap();
    circuit.cx(Node(1), Node(third)).unwrap();
    circuit
}

#[test]
fn test_ring_needs_exactly_one_swap() {
    let graph = ConnectivityGraph::ring(4);
    let config = RoutingConfig::default();
    let circuit = ring_circuit(3);

    let report = Router::new(&graph, &config).run(&circuit).unwrap();

    assert_eq!(report.swaps_inserted, 1);
    assert_eq!(swaps(&report.circuit), 1);
    // The first CX was already adjacent and is emitted first, untouched.
    assert_eq!(report.circuit.operations()[0], circuit.operations()[0]);
    assert!(Predicate::Connectivity.holds(&report.circuit, Some(&graph)));
}

#[test]
fn test_ring_adjacent_pair_needs_no_swap() {
    let graph = ConnectivityGraph::ring(4);
    let circuit = ring_circuit(2);
    let routed = route(&circuit, &graph, &RoutingConfig::default()).unwrap();
    assert_eq!(routed, circuit);
}

#[test]
fn test_disconnected_device_is_unroutable() {
    let mut graph = ConnectivityGraph::new();
    graph.add_node(Node(0));
    graph.add_node(Node(1));

    let mut circuit = Circuit::on_nodes("split", [Node(0), Node(1)]).unwrap();
    circuit.cx(Node(0), Node(1)).unwrap();

    let err = route(&circuit, &graph, &RoutingConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::UnroutableCircuit { .. }));
}

#[test]
fn test_rerouting_is_byte_identical() {
    let graph = ConnectivityGraph::grid(2, 3);
    let mut circuit = Circuit::with_size("grid", 6, 6);
    for (a, b) in [(0, 5), (1, 4), (2, 3), (0, 3), (5, 1)] {
        circuit.cx(QubitId(a), QubitId(b)).unwrap();
    }
    for q in 0..6 {
        circuit.measure(QubitId(q), ClbitId(q)).unwrap();
    }

    let pm = PassManagerBuilder::new(&graph).build().unwrap();
    let mut unit = CompilationUnit::new(circuit);
    pm.run(&mut unit).unwrap();

    let once = unit.circuit();
    let twice = route(once, &graph, &RoutingConfig::default()).unwrap();
    assert_eq!(
        serde_json::to_string(once).unwrap(),
        serde_json::to_string(&twice).unwrap()
    );
}

#[test]
fn test_full_occupancy_keeps_qubit_count() {
    let graph = ConnectivityGraph::linear(5);
    let mut circuit = Circuit::with_size("full", 5, 0);
    circuit.cx(QubitId(0), QubitId(4)).unwrap();
    circuit.cx(QubitId(1), QubitId(3)).unwrap();
    circuit.cx(QubitId(2), QubitId(0)).unwrap();

    let pm = PassManagerBuilder::new(&graph).build().unwrap();
    let mut unit = CompilationUnit::new(circuit);
    pm.run(&mut unit).unwrap();

    assert_eq!(unit.circuit().num_qubits(), 5);
    assert_eq!(unit.initial_map().nodes().count(), 5);
    assert_eq!(unit.final_map().nodes().count(), 5);
}

#[test]
fn test_spare_nodes_stay_unused() {
    // A triangle of interactions cannot embed in a grid, so routing is needed.
    let graph = ConnectivityGraph::grid(3, 3);
    let mut circuit = Circuit::with_size("triangle", 3, 0);
    circuit.cx(QubitId(0), QubitId(1)).unwrap();
    circuit.cx(QubitId(1), QubitId(2)).unwrap();
    circuit.cx(QubitId(0), QubitId(2)).unwrap();

    let pm = PassManagerBuilder::new(&graph).build().unwrap();
    let mut unit = CompilationUnit::new(circuit);
    pm.run(&mut unit).unwrap();

    assert!(swaps(unit.circuit()) > 0);
    assert_eq!(unit.circuit().num_qubits(), 3);
    let mut initial: Vec<Node> = unit.initial_map().nodes().collect();
    let mut fin: Vec<Node> = unit.final_map().nodes().collect();
    initial.sort_unstable();
    fin.sort_unstable();
    assert_eq!(initial, fin);
}

#[test]
fn test_final_map_moves_only_swapped_qubits() {
    let graph = ConnectivityGraph::linear(4);
    let mut circuit = Circuit::on_nodes("line", (0..4).map(Node)).unwrap();
    circuit.cx(Node(0), Node(2)).unwrap();

    let config = RoutingConfig::default();
    let report = Router::new(&graph, &config).run(&circuit).unwrap();
    assert_eq!(report.swaps_inserted, 1);

    let swapped: Vec<Node> = report
        .circuit
        .operations()
        .iter()
        .filter(|op| op.is_standard(&StandardGate::Swap))
        .flat_map(|op| op.qubits.iter().filter_map(|q| q.node()))
        .collect();
    for node in (0..4).map(Node) {
        let moved = report.permutation.image(node) != node;
        assert_eq!(moved, swapped.contains(&node));
    }
    assert_eq!(report.permutation.image(Node(3)), Node(3));
}

#[test]
fn test_placement_then_routing_with_noise() {
    let graph = ConnectivityGraph::linear(4);
    let noise = DeviceCharacterization::new()
        .with_edge_error(0, 1, 0.2)
        .with_edge_error(1, 2, 0.01)
        .with_edge_error(2, 3, 0.2);
    let config = PlacementConfig::default().with_characterization(noise);

    let mut circuit = Circuit::with_size("pair", 2, 0);
    circuit.cx(QubitId(0), QubitId(1)).unwrap();

    let mapping = place(&mut circuit, &graph, &config).unwrap();
    let mut nodes: Vec<Node> = mapping.nodes().collect();
    nodes.sort_unstable();
    assert_eq!(nodes, vec![Node(1), Node(2)]);

    let routed = route(&circuit, &graph, &RoutingConfig::default()).unwrap();
    assert_eq!(swaps(&routed), 0);
}

#[test]
fn test_unit_maps_through_pipeline() {
    let graph = ConnectivityGraph::star(4);
    let mut circuit = Circuit::with_size("star", 4, 0);
    circuit.cx(QubitId(1), QubitId(2)).unwrap();
    circuit.cx(QubitId(2), QubitId(3)).unwrap();
    circuit.cx(QubitId(3), QubitId(1)).unwrap();

    let pm = PassManagerBuilder::new(&graph).build().unwrap();
    let mut unit = CompilationUnit::new(circuit);
    assert_eq!(unit.state(), PlacementState::Unplaced);
    pm.run(&mut unit).unwrap();

    assert_eq!(unit.state(), PlacementState::Routed);
    assert_eq!(unit.initial_map().len(), 4);
    assert!(swaps(unit.circuit()) > 0);
    assert_ne!(unit.initial_map(), unit.final_map());
}
