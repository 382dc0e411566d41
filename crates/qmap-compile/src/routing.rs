//! SWAP and BRIDGE insertion so every two-qubit gate acts on adjacent nodes.
//!
//! Routing walks the operations once, in order, keeping track of the node
//! each wire (a qubit reference as it appears in the input) currently sits
//! on. When a two-qubit gate meets non-adjacent nodes, swaps that shorten
//! the distance between its qubits by one are inserted until they touch.
//! Among the candidate swaps the one that leaves the upcoming two-qubit
//! gates closest together wins:
//!
//! ```text
//! cost = Σ_k decay^k · distance(gate_k)    k < lookahead_depth
//! ```
//!
//! While the occupied nodes connect the two qubits of a gate, swaps stay
//! between occupied nodes, so routing does not pull in unused nodes. Only a
//! pair separated by free nodes is routed through them.
//!
//! Wires that were not placed are given a node when first used, next to the
//! partners of their upcoming gates.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashMap;
use tracing::{debug, info, instrument};

use qmap_ir::{Circuit, Node, Operation, QubitId, QubitRef, StandardGate};

use crate::config::RoutingConfig;
use crate::error::{CompileError, CompileResult};
use crate::graph::ConnectivityGraph;
use crate::mapping::NodePermutation;
use crate::predicate::Predicate;

/// Result of a routing run.
#[derive(Debug, Clone)]
pub struct RoutingReport {
    /// The routed circuit. Every reference is placed.
    pub circuit: Circuit,
    /// Logical qubits that were given a node during routing, with the node
    /// they occupy at the start of the circuit.
    pub assignments: Vec<(QubitId, Node)>,
    /// Node each input wire ends on.
    pub final_positions: BTreeMap<QubitRef, Node>,
    /// Where the state on each node ends up.
    pub permutation: NodePermutation,
    /// Number of SWAP gates inserted.
    pub swaps_inserted: usize,
    /// Number of BRIDGE gates inserted.
    pub bridges_inserted: usize,
}

/// Route `circuit` on `graph`, returning a connectivity-compliant circuit.
pub fn route(
    circuit: &Circuit,
    graph: &ConnectivityGraph,
    config: &RoutingConfig,
) -> CompileResult<Circuit> {
    Ok(Router::new(graph, config).run(circuit)?.circuit)
}

/// Routing engine bound to a device and configuration.
pub struct Router<'a> {
    graph: &'a ConnectivityGraph,
    config: &'a RoutingConfig,
}

impl<'a> Router<'a> {
    /// Create a router.
    pub fn new(graph: &'a ConnectivityGraph, config: &'a RoutingConfig) -> Self {
        Self { graph, config }
    }

    /// Route `circuit`.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name(), ops = circuit.num_ops()))]
    pub fn run(&self, circuit: &Circuit) -> CompileResult<RoutingReport> {
        self.validate(circuit)?;

        if circuit.qubits().iter().all(|q| q.is_placed())
            && Predicate::Connectivity.holds(circuit, Some(self.graph))
        {
            debug!("Circuit already satisfies connectivity, nothing to route");
            return Ok(RoutingReport {
                circuit: circuit.clone(),
                assignments: vec![],
                final_positions: circuit
                    .qubits()
                    .iter()
                    .filter_map(|&q| q.node().map(|n| (q, n)))
                    .collect(),
                permutation: NodePermutation::identity(),
                swaps_inserted: 0,
                bridges_inserted: 0,
            });
        }

        let mut state = RoutingState::new(self, circuit);
        for (index, op) in circuit.operations().iter().enumerate() {
            state.advance(index);
            state.process(index, op)?;
        }
        state.finish(circuit)
    }

    fn validate(&self, circuit: &Circuit) -> CompileResult<()> {
        for &q in circuit.qubits() {
            if let QubitRef::Placed(node) = q {
                if !self.graph.contains(node) {
                    return Err(CompileError::UnknownNode(node));
                }
            }
        }
        if circuit.num_qubits() > self.graph.num_nodes() {
            return Err(CompileError::CircuitTooLarge {
                required: circuit.num_qubits(),
                available: self.graph.num_nodes(),
            });
        }
        for op in circuit.operations() {
            if op.is_gate() && op.qubits.len() > 2 && !op.is_standard(&StandardGate::Bridge) {
                return Err(CompileError::UnsupportedOperation {
                    name: op.name().to_string(),
                    arity: op.qubits.len(),
                });
            }
        }
        Ok(())
    }
}

/// A two-qubit interaction in the input: operation index and the wires it
/// brings together. BRIDGE contributes its outer pair.
#[derive(Debug, Clone, Copy)]
struct Interaction {
    index: usize,
    a: QubitRef,
    b: QubitRef,
}

struct RoutingState<'r, 'a> {
    router: &'r Router<'a>,
    /// Current node of every wire that has one.
    position: FxHashMap<QubitRef, Node>,
    /// Wire currently on each occupied node.
    occupant: FxHashMap<Node, QubitRef>,
    permutation: NodePermutation,
    interactions: Vec<Interaction>,
    /// First interaction after the operation being processed.
    cursor: usize,
    output: Vec<Operation>,
    assignments: Vec<(QubitId, Node)>,
    swaps: usize,
    bridges: usize,
}

impl<'r, 'a> RoutingState<'r, 'a> {
    fn new(router: &'r Router<'a>, circuit: &Circuit) -> Self {
        let mut position = FxHashMap::default();
        let mut occupant = FxHashMap::default();
        for &q in circuit.qubits() {
            if let QubitRef::Placed(node) = q {
                position.insert(q, node);
                occupant.insert(node, q);
            }
        }

        let interactions = circuit
            .operations()
            .iter()
            .enumerate()
            .filter(|(_, op)| op.is_multi_qubit_gate())
            .filter_map(|(index, op)| match op.qubits.as_slice() {
                &[a, b] | &[a, _, b] => Some(Interaction { index, a, b }),
                _ => None,
            })
            .collect();

        Self {
            router,
            position,
            occupant,
            permutation: NodePermutation::identity(),
            interactions,
            cursor: 0,
            output: Vec::with_capacity(circuit.num_ops()),
            assignments: vec![],
            swaps: 0,
            bridges: 0,
        }
    }

    fn graph(&self) -> &'a ConnectivityGraph {
        self.router.graph
    }

    fn config(&self) -> &'a RoutingConfig {
        self.router.config
    }

    /// Move the lookahead cursor past operation `index`.
    fn advance(&mut self, index: usize) {
        while self
            .interactions
            .get(self.cursor)
            .is_some_and(|i| i.index <= index)
        {
            self.cursor += 1;
        }
    }

    fn process(&mut self, index: usize, op: &Operation) -> CompileResult<()> {
        for &q in &op.qubits {
            self.ensure_assigned(q, index)?;
        }

        if !op.is_multi_qubit_gate() {
            self.emit(op.clone());
            return Ok(());
        }

        match op.qubits.as_slice() {
            &[a, b] => {
                let bridged = self.bring_together(a, b, op)?;
                if !bridged {
                    self.emit(op.clone());
                }
            }
            &[c, m, t] => {
                let (nc, nm, nt) = (self.node_of(c)?, self.node_of(m)?, self.node_of(t)?);
                if self.graph().are_adjacent(nc, nm) && self.graph().are_adjacent(nm, nt) {
                    self.emit(op.clone());
                } else {
                    debug!("Bridge on {nc}, {nm}, {nt} is not a path, routing as CX");
                    let mut cx = Operation::two_qubit_gate(StandardGate::CX, c, t);
                    cx.condition.clone_from(&op.condition);
                    let bridged = self.bring_together(c, t, &cx)?;
                    if !bridged {
                        self.emit(cx);
                    }
                }
            }
            _ => {
                return Err(CompileError::UnsupportedOperation {
                    name: op.name().to_string(),
                    arity: op.qubits.len(),
                });
            }
        }
        Ok(())
    }

    fn node_of(&self, wire: QubitRef) -> CompileResult<Node> {
        match (self.position.get(&wire), wire.logical()) {
            (Some(&node), _) => Ok(node),
            (None, Some(q)) => Err(CompileError::UnknownQubit(q)),
            (None, None) => Err(CompileError::InvalidMapping(format!("{wire} has no node"))),
        }
    }

    /// Emit `op` with every wire replaced by its current node.
    fn emit(&mut self, mut op: Operation) {
        op.map_qubits(|q| self.position.get(&q).map_or(q, |&n| QubitRef::Placed(n)));
        self.output.push(op);
    }

    /// Insert swaps until `a` and `b` are adjacent. With bridges enabled a
    /// distance-2 CX may instead be emitted as a BRIDGE, in which case
    /// `true` is returned and `op` must not be emitted.
    fn bring_together(&mut self, a: QubitRef, b: QubitRef, op: &Operation) -> CompileResult<bool> {
        loop {
            let (na, nb) = (self.node_of(a)?, self.node_of(b)?);
            let distance = self
                .graph()
                .distance(na, nb)
                .map_err(|_| CompileError::UnroutableCircuit { from: na, to: nb })?;
            if distance <= 1 {
                return Ok(false);
            }

            let occupied = self.occupied_distances(nb).get(&na).copied();
            let distance = occupied.unwrap_or(distance);
            let (swap, swap_cost) = self.best_swap(na, nb, distance, occupied.is_some())?;

            if distance == 2
                && self.config().allow_bridge
                && op.is_standard(&StandardGate::CX)
                && swap_cost >= self.lookahead_cost(None)
            {
                let graph = self.graph();
                let mid = graph
                    .neighbors(na)
                    .into_iter()
                    .filter(|&m| graph.are_adjacent(m, nb))
                    .filter(|m| occupied.is_none() || self.occupant.contains_key(m))
                    .min()
                    .ok_or(CompileError::UnroutableCircuit { from: na, to: nb })?;
                debug!("Inserting bridge {na} -> {mid} -> {nb}");
                let mut bridge = Operation::bridge(na, mid, nb);
                bridge.condition.clone_from(&op.condition);
                bridge.clbits.clone_from(&op.clbits);
                self.output.push(bridge);
                self.bridges += 1;
                return Ok(true);
            }

            self.apply_swap(swap.0, swap.1);
        }
    }

    /// Hops from `from` to every node reachable through occupied nodes only.
    fn occupied_distances(&self, from: Node) -> FxHashMap<Node, u32> {
        let graph = self.graph();
        let mut dist = FxHashMap::default();
        dist.insert(from, 0);
        let mut queue = VecDeque::from([from]);
        while let Some(node) = queue.pop_front() {
            let d = dist[&node];
            for next in graph.neighbors(node) {
                if self.occupant.contains_key(&next) && !dist.contains_key(&next) {
                    dist.insert(next, d + 1);
                    queue.push_back(next);
                }
            }
        }
        dist
    }

    /// Choose among the swaps incident to `na` or `nb` that shorten their
    /// distance by one, preferring the lowest lookahead cost, then the
    /// lowest node ids. With `occupied_only`, distances are measured through
    /// occupied nodes and only swaps onto occupied nodes are considered.
    fn best_swap(
        &self,
        na: Node,
        nb: Node,
        distance: u32,
        occupied_only: bool,
    ) -> CompileResult<((Node, Node), f64)> {
        let graph = self.graph();
        let mut best: Option<((Node, Node), f64)> = None;
        for (moving, fixed) in [(na, nb), (nb, na)] {
            let from_fixed = occupied_only.then(|| self.occupied_distances(fixed));
            for neighbor in graph.neighbors(moving) {
                let remaining = match &from_fixed {
                    Some(dist) => dist.get(&neighbor).copied(),
                    None => graph.try_distance(neighbor, fixed),
                };
                if remaining != Some(distance - 1) {
                    continue;
                }
                let pair = if moving < neighbor {
                    (moving, neighbor)
                } else {
                    (neighbor, moving)
                };
                let cost = self.lookahead_cost(Some(pair));
                let better = match best {
                    None => true,
                    Some((best_pair, best_cost)) => match cost.total_cmp(&best_cost) {
                        Ordering::Less => true,
                        Ordering::Equal => pair < best_pair,
                        Ordering::Greater => false,
                    },
                };
                if better {
                    best = Some((pair, cost));
                }
            }
        }
        best.ok_or(CompileError::UnroutableCircuit { from: na, to: nb })
    }

    /// Decayed distance of the upcoming interactions, optionally as if the
    /// two nodes of `swap` had been exchanged.
    fn lookahead_cost(&self, swap: Option<(Node, Node)>) -> f64 {
        let config = self.config();
        let locate = |wire: QubitRef| -> Option<Node> {
            let node = *self.position.get(&wire)?;
            Some(match swap {
                Some((x, y)) if node == x => y,
                Some((x, y)) if node == y => x,
                _ => node,
            })
        };

        let mut cost = 0.0;
        let mut weight = 1.0;
        for interaction in self
            .interactions
            .iter()
            .skip(self.cursor)
            .take(config.lookahead_depth)
        {
            if let (Some(a), Some(b)) = (locate(interaction.a), locate(interaction.b)) {
                if let Some(d) = self.graph().try_distance(a, b) {
                    cost += weight * f64::from(d);
                }
            }
            weight *= config.lookahead_decay;
        }
        cost
    }

    fn apply_swap(&mut self, x: Node, y: Node) {
        debug!("Inserting swap {x} <-> {y}");
        self.output.push(Operation::swap(x, y));
        let wx = self.occupant.remove(&x);
        let wy = self.occupant.remove(&y);
        if let Some(w) = wx {
            self.position.insert(w, y);
            self.occupant.insert(y, w);
        }
        if let Some(w) = wy {
            self.position.insert(w, x);
            self.occupant.insert(x, w);
        }
        self.permutation.swap(x, y);
        self.swaps += 1;
    }

    /// Give `wire` a node if it has none, close to the partners of its
    /// upcoming interactions.
    fn ensure_assigned(&mut self, wire: QubitRef, index: usize) -> CompileResult<()> {
        if self.position.contains_key(&wire) {
            return Ok(());
        }
        let graph = self.graph();
        let config = self.config();
        let penalty = graph.num_nodes() as u64 + 1;

        let partners: Vec<Node> = self
            .interactions
            .iter()
            .filter(|i| i.index >= index)
            .filter_map(|i| {
                if i.a == wire {
                    Some(i.b)
                } else if i.b == wire {
                    Some(i.a)
                } else {
                    None
                }
            })
            .take(config.lookahead_depth.max(1))
            .filter_map(|p| self.position.get(&p).copied())
            .collect();
        let placed: Vec<Node> = self.occupant.keys().copied().collect();

        let node = graph
            .nodes()
            .into_iter()
            .filter(|n| !self.occupant.contains_key(n))
            .map(|n| {
                let mut near = 0.0;
                let mut weight = 1.0;
                for &p in &partners {
                    near += weight * graph.try_distance(n, p).map_or(penalty as f64, f64::from);
                    weight *= config.lookahead_decay;
                }
                let spread: u64 = placed
                    .iter()
                    .map(|&p| graph.try_distance(n, p).map_or(penalty, u64::from))
                    .sum();
                (n, near, spread, graph.degree(n))
            })
            .min_by(|x, y| {
                x.1.total_cmp(&y.1)
                    .then_with(|| x.2.cmp(&y.2))
                    .then_with(|| Reverse(x.3).cmp(&Reverse(y.3)))
                    .then_with(|| x.0.cmp(&y.0))
            })
            .map(|(n, ..)| n)
            .ok_or(CompileError::CircuitTooLarge {
                required: self.position.len() + 1,
                available: graph.num_nodes(),
            })?;

        self.assign(wire, node);
        Ok(())
    }

    fn assign(&mut self, wire: QubitRef, node: Node) {
        let start = self.permutation.origin(node);
        debug!("Assigning {wire} to {node} (start node {start})");
        if let Some(q) = wire.logical() {
            self.assignments.push((q, start));
        }
        self.position.insert(wire, node);
        self.occupant.insert(node, wire);
    }

    fn finish(mut self, circuit: &Circuit) -> CompileResult<RoutingReport> {
        // Idle wires take the remaining free nodes in id order.
        let free: Vec<Node> = self
            .graph()
            .nodes()
            .into_iter()
            .filter(|n| !self.occupant.contains_key(n))
            .collect();
        let mut free = free.into_iter();
        for &q in circuit.qubits() {
            if !self.position.contains_key(&q) {
                let node = free.next().ok_or(CompileError::CircuitTooLarge {
                    required: circuit.num_qubits(),
                    available: self.graph().num_nodes(),
                })?;
                self.assign(q, node);
            }
        }

        let mut nodes: Vec<Node> = self
            .output
            .iter()
            .flat_map(|op| op.qubits.iter().filter_map(|q| q.node()))
            .chain(self.position.values().copied())
            .collect();
        nodes.sort_unstable();
        nodes.dedup();

        let routed = Circuit::from_parts(
            circuit.name(),
            nodes.into_iter().map(QubitRef::Placed).collect(),
            circuit.clbits().to_vec(),
            self.output,
        )?;
        Predicate::Connectivity.check(&routed, Some(self.router.graph))?;

        info!(
            "Routing inserted {} swaps and {} bridges ({} -> {} ops)",
            self.swaps,
            self.bridges,
            circuit.num_ops(),
            routed.num_ops()
        );

        Ok(RoutingReport {
            circuit: routed,
            assignments: self.assignments,
            final_positions: self.position.into_iter().collect(),
            permutation: self.permutation,
            swaps_inserted: self.swaps,
            bridges_inserted: self.bridges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmap_ir::ClbitId;

    fn placed(name: &str, nodes: &[u32]) -> Circuit {
        Circuit::on_nodes(name, nodes.iter().copied().map(Node)).unwrap()
    }

    #[test]
    fn test_compliant_circuit_unchanged() {
        let graph = ConnectivityGraph::linear(3);
        let mut circuit = placed("test", &[0, 1, 2]);
        circuit.cx(Node(0), Node(1)).unwrap();
        circuit.cx(Node(2), Node(1)).unwrap();

        let report = Router::new(&graph, &RoutingConfig::default()).run(&circuit).unwrap();
        assert_eq!(report.circuit, circuit);
        assert_eq!(report.swaps_inserted, 0);
        assert!(report.permutation.is_identity());
    }

    #[test]
    fn test_single_swap_on_line() {
        let graph = ConnectivityGraph::linear(3);
        let mut circuit = placed("test", &[0, 1, 2]);
        circuit.cx(Node(0), Node(2)).unwrap();

        let report = Router::new(&graph, &RoutingConfig::default()).run(&circuit).unwrap();
        assert_eq!(report.swaps_inserted, 1);
        assert_eq!(report.circuit.count_ops("swap"), 1);
        assert!(Predicate::Connectivity.holds(&report.circuit, Some(&graph)));
        // swap (0,1) wins the tie on node ids
        assert_eq!(report.final_positions[&QubitRef::Placed(Node(0))], Node(1));
        assert_eq!(report.final_positions[&QubitRef::Placed(Node(1))], Node(0));
        assert_eq!(report.permutation.image(Node(0)), Node(1));
    }

    #[test]
    fn test_lookahead_prefers_useful_swap() {
        // 0 - 1 - 2 - 3 - 4; CX(1,3) then CX(3,4).
        // Moving 1 towards 3 keeps 3 next to 4; moving 3 towards 1 does not.
        let graph = ConnectivityGraph::linear(5);
        let mut circuit = placed("test", &[0, 1, 2, 3, 4]);
        circuit.cx(Node(1), Node(3)).unwrap();
        circuit.cx(Node(3), Node(4)).unwrap();

        let report = Router::new(&graph, &RoutingConfig::default()).run(&circuit).unwrap();
        assert_eq!(report.swaps_inserted, 1);
        assert_eq!(report.circuit.operations()[0].qubits, vec![
            QubitRef::Placed(Node(1)),
            QubitRef::Placed(Node(2))
        ]);
    }

    #[test]
    fn test_swaps_stay_on_occupied_nodes() {
        // 0 1 2
        // 3 4 5
        // 6 7 8
        let graph = ConnectivityGraph::grid(3, 3);
        let mut circuit = placed("test", &[0, 1, 4]);
        circuit.cx(Node(0), Node(4)).unwrap();
        circuit.cx(Node(1), Node(4)).unwrap();
        circuit.cx(Node(0), Node(1)).unwrap();

        let report = Router::new(&graph, &RoutingConfig::default()).run(&circuit).unwrap();
        assert_eq!(
            report.circuit.qubits(),
            &[
                QubitRef::Placed(Node(0)),
                QubitRef::Placed(Node(1)),
                QubitRef::Placed(Node(4))
            ]
        );
        assert!(report.swaps_inserted > 0);
        assert!(Predicate::Connectivity.holds(&report.circuit, Some(&graph)));
    }

    #[test]
    fn test_free_nodes_used_when_occupied_nodes_disconnected() {
        let graph = ConnectivityGraph::linear(4);
        let mut circuit = placed("test", &[0, 3]);
        circuit.cx(Node(0), Node(3)).unwrap();

        let report = Router::new(&graph, &RoutingConfig::default()).run(&circuit).unwrap();
        assert_eq!(report.swaps_inserted, 2);
        assert!(Predicate::Connectivity.holds(&report.circuit, Some(&graph)));
    }

    #[test]
    fn test_bridge_through_occupied_node() {
        // 0 - 1 - 3 and 0 - 2 - 3; only 1 is free.
        let graph = ConnectivityGraph::from_edges([(0, 1), (1, 3), (0, 2), (2, 3)]);
        let mut circuit = placed("test", &[0, 2, 3]);
        circuit.cx(Node(0), Node(3)).unwrap();

        let config = RoutingConfig::default().with_bridges(true);
        let report = Router::new(&graph, &config).run(&circuit).unwrap();
        assert_eq!(report.bridges_inserted, 1);
        assert_eq!(report.circuit.operations()[0].qubits, vec![
            QubitRef::Placed(Node(0)),
            QubitRef::Placed(Node(2)),
            QubitRef::Placed(Node(3))
        ]);
    }

    #[test]
    fn test_measurements_follow_wires() {
        let graph = ConnectivityGraph::linear(3);
        let mut circuit = Circuit::on_nodes("test", [Node(0), Node(1), Node(2)]).unwrap();
        circuit.add_clbit(ClbitId(0));
        circuit.cx(Node(0), Node(2)).unwrap();
        circuit.measure(Node(0), ClbitId(0)).unwrap();

        let routed = route(&circuit, &graph, &RoutingConfig::default()).unwrap();
        let measure = routed.operations().last().unwrap();
        assert!(measure.is_measure());
        assert_eq!(measure.qubits, vec![QubitRef::Placed(Node(1))]);
    }

    #[test]
    fn test_bridge_instead_of_swap() {
        let graph = ConnectivityGraph::linear(3);
        let mut circuit = placed("test", &[0, 1, 2]);
        circuit.cx(Node(0), Node(2)).unwrap();
        circuit.cx(Node(0), Node(1)).unwrap();

        let config = RoutingConfig::default().with_bridges(true);
        let report = Router::new(&graph, &config).run(&circuit).unwrap();
        assert_eq!(report.bridges_inserted, 1);
        assert_eq!(report.swaps_inserted, 0);
        assert!(report.circuit.operations()[0].is_standard(&StandardGate::Bridge));
        assert!(report.permutation.is_identity());
        assert!(Predicate::Connectivity.holds(&report.circuit, Some(&graph)));
    }

    #[test]
    fn test_unplaced_wires_assigned_near_partners() {
        let graph = ConnectivityGraph::linear(5);
        let mut circuit = Circuit::new("test");
        circuit.add_qubit(Node(0)).unwrap();
        circuit.add_qubit(QubitRef::Unplaced(QubitId(1))).unwrap();
        circuit
            .apply(Operation::two_qubit_gate(
                StandardGate::CX,
                Node(0),
                QubitRef::Unplaced(QubitId(1)),
            ))
            .unwrap();

        let report = Router::new(&graph, &RoutingConfig::default()).run(&circuit).unwrap();
        assert_eq!(report.swaps_inserted, 0);
        assert_eq!(report.assignments, vec![(QubitId(1), Node(1))]);
        assert!(report.circuit.qubits().iter().all(|q| q.is_placed()));
    }

    #[test]
    fn test_idle_wires_take_free_nodes_in_order() {
        let graph = ConnectivityGraph::linear(4);
        let mut circuit = Circuit::new("test");
        circuit.add_qubit(Node(1)).unwrap();
        circuit.add_qubit(QubitRef::Unplaced(QubitId(7))).unwrap();

        let report = Router::new(&graph, &RoutingConfig::default()).run(&circuit).unwrap();
        assert_eq!(report.assignments, vec![(QubitId(7), Node(0))]);
        assert_eq!(
            report.circuit.qubits(),
            &[QubitRef::Placed(Node(0)), QubitRef::Placed(Node(1))]
        );
    }

    #[test]
    fn test_disconnected_is_unroutable() {
        let mut graph = ConnectivityGraph::new();
        graph.add_node(Node(0));
        graph.add_node(Node(1));
        let mut circuit = placed("test", &[0, 1]);
        circuit.cx(Node(0), Node(1)).unwrap();

        let result = route(&circuit, &graph, &RoutingConfig::default());
        assert!(matches!(
            result,
            Err(CompileError::UnroutableCircuit { .. })
        ));
    }

    #[test]
    fn test_unknown_node() {
        let graph = ConnectivityGraph::linear(2);
        let circuit = placed("test", &[0, 5]);
        let result = route(&circuit, &graph, &RoutingConfig::default());
        assert!(matches!(result, Err(CompileError::UnknownNode(Node(5)))));
    }

    #[test]
    fn test_three_qubit_gate_rejected() {
        let graph = ConnectivityGraph::linear(3);
        let mut circuit = placed("test", &[0, 1, 2]);
        circuit.ccx(Node(0), Node(1), Node(2)).unwrap();
        let result = route(&circuit, &graph, &RoutingConfig::default());
        assert!(matches!(
            result,
            Err(CompileError::UnsupportedOperation { arity: 3, .. })
        ));
    }

    #[test]
    fn test_non_compliant_bridge_routed_as_cx() {
        let graph = ConnectivityGraph::linear(4);
        let mut circuit = placed("test", &[0, 1, 2, 3]);
        circuit.apply(Operation::bridge(Node(0), Node(3), Node(1))).unwrap();
        let routed = route(&circuit, &graph, &RoutingConfig::default()).unwrap();
        assert_eq!(routed.count_ops("bridge"), 0);
        assert_eq!(routed.count_ops("cx"), 1);
        assert!(Predicate::Connectivity.holds(&routed, Some(&graph)));
    }

    #[test]
    fn test_barrier_exempt() {
        let graph = ConnectivityGraph::linear(3);
        let mut circuit = placed("test", &[0, 1, 2]);
        circuit.barrier([Node(0), Node(2)]).unwrap();
        let routed = route(&circuit, &graph, &RoutingConfig::default()).unwrap();
        assert_eq!(routed, circuit);
    }
}
