//! Weighted interaction graph of a circuit's logical qubits.

use petgraph::graphmap::UnGraphMap;

use qmap_ir::{Circuit, QubitId};

/// Which logical qubits interact early in a circuit, and how strongly.
///
/// Every multi-qubit gate in ASAP layer `l < depth_limit` adds
/// `depth_limit - l` to the weight of each pair of qubits it touches, so
/// interactions near the start of the circuit dominate.
#[derive(Debug, Clone, Default)]
pub struct InteractionGraph {
    graph: UnGraphMap<QubitId, u64>,
}

impl InteractionGraph {
    /// Build the interaction graph of the logical qubits in `circuit`.
    ///
    /// References that are not logical are ignored.
    pub fn from_circuit(circuit: &Circuit, depth_limit: usize) -> Self {
        let mut graph = UnGraphMap::new();
        for (op, layer) in circuit.operations().iter().zip(circuit.layers()) {
            if layer >= depth_limit || !op.is_multi_qubit_gate() {
                continue;
            }
            let weight = (depth_limit - layer) as u64;
            let qubits: Vec<QubitId> = op.qubits.iter().filter_map(|q| q.logical()).collect();
            for (i, &a) in qubits.iter().enumerate() {
                for &b in &qubits[i + 1..] {
                    match graph.edge_weight_mut(a, b) {
                        Some(w) => *w += weight,
                        None => {
                            graph.add_edge(a, b, weight);
                        }
                    }
                }
            }
        }
        Self { graph }
    }

    /// Interacting qubits in id order.
    pub fn qubits(&self) -> Vec<QubitId> {
        let mut qubits: Vec<QubitId> = self.graph.nodes().collect();
        qubits.sort_unstable();
        qubits
    }

    /// Check if no qubits interact.
    pub fn is_empty(&self) -> bool {
        self.graph.edge_count() == 0
    }

    /// Number of interacting pairs.
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if a qubit takes part in any interaction.
    pub fn contains(&self, qubit: QubitId) -> bool {
        self.graph.contains_node(qubit)
    }

    /// Interaction weight between two qubits; 0 when they never interact.
    pub fn weight(&self, a: QubitId, b: QubitId) -> u64 {
        self.graph.edge_weight(a, b).copied().unwrap_or(0)
    }

    /// Sum of the weights of all interactions of a qubit.
    pub fn total_weight(&self, qubit: QubitId) -> u64 {
        if !self.graph.contains_node(qubit) {
            return 0;
        }
        self.graph.edges(qubit).map(|(_, _, w)| *w).sum()
    }

    /// Interaction partners of a qubit with their weights, in id order.
    pub fn neighbors(&self, qubit: QubitId) -> Vec<(QubitId, u64)> {
        if !self.graph.contains_node(qubit) {
            return vec![];
        }
        let mut neighbors: Vec<(QubitId, u64)> = self
            .graph
            .edges(qubit)
            .map(|(a, b, w)| (if a == qubit { b } else { a }, *w))
            .collect();
        neighbors.sort_unstable();
        neighbors
    }

    /// All interactions as `(low, high, weight)`, sorted.
    pub fn edges(&self) -> Vec<(QubitId, QubitId, u64)> {
        let mut edges: Vec<_> = self
            .graph
            .all_edges()
            .map(|(a, b, w)| if a < b { (a, b, *w) } else { (b, a, *w) })
            .collect();
        edges.sort_unstable();
        edges
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_decay_with_depth() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();

        let graph = InteractionGraph::from_circuit(&circuit, 5);
        // layers 0 and 2 for (0,1); layer 1 for (1,2)
        assert_eq!(graph.weight(QubitId(0), QubitId(1)), 5 + 3);
        assert_eq!(graph.weight(QubitId(2), QubitId(1)), 4);
        assert_eq!(graph.total_weight(QubitId(1)), 12);
        assert_eq!(graph.weight(QubitId(0), QubitId(2)), 0);
    }

    #[test]
    fn test_depth_limit_cuts_late_gates() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(1), QubitId(2)).unwrap();

        let graph = InteractionGraph::from_circuit(&circuit, 1);
        assert_eq!(graph.qubits(), vec![QubitId(0), QubitId(1)]);
        assert!(!graph.contains(QubitId(2)));
    }

    #[test]
    fn test_barriers_and_single_qubit_gates_ignored() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.barrier([QubitId(0), QubitId(1), QubitId(2)]).unwrap();
        let graph = InteractionGraph::from_circuit(&circuit, 5);
        assert!(graph.is_empty());
    }

    #[test]
    fn test_three_qubit_gate_adds_all_pairs() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        let graph = InteractionGraph::from_circuit(&circuit, 2);
        assert_eq!(graph.num_edges(), 3);
        assert_eq!(
            graph.neighbors(QubitId(2)),
            vec![(QubitId(0), 2), (QubitId(1), 2)]
        );
    }
}
