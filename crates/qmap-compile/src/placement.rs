//! Initial placement of logical qubits onto device nodes.
//!
//! The graph strategy searches for a subgraph match between the circuit's
//! [`InteractionGraph`] and the device [`ConnectivityGraph`]. Partial matches
//! are expanded best-first; a match loses the weight of every interaction
//! whose two qubits end up on non-adjacent nodes. When device error rates
//! are supplied, several equally good matches are collected and the one with
//! the lowest aggregate error wins.
//!
//! The search is bounded by a wall-clock timeout and an expansion budget. On
//! exhaustion the best partial match found so far is returned instead of an
//! error; routing places whatever is left.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use qmap_ir::{Circuit, Node, QubitId, QubitRef};

use crate::config::{PlacementConfig, PlacementStrategy};
use crate::device::DeviceCharacterization;
use crate::error::{CompileError, CompileResult};
use crate::graph::ConnectivityGraph;
use crate::interaction::InteractionGraph;
use crate::mapping::QubitMapping;

/// How a placement search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementStatus {
    /// Every declared qubit was placed.
    Complete,
    /// The search finished but qubits without early interactions were left
    /// unplaced.
    Partial,
    /// The time or expansion budget ran out before a complete match was found.
    TimedOut,
}

/// Result of a placement run.
#[derive(Debug, Clone)]
pub struct PlacementReport {
    /// The chosen mapping (possibly partial).
    pub mapping: QubitMapping,
    /// How the search ended.
    pub status: PlacementStatus,
    /// Number of search states expanded.
    pub expansions: usize,
    /// Interaction weight of matched pairs that are not adjacent.
    pub lost_weight: u64,
    /// Declared qubits left without a node, in id order.
    pub unplaced: Vec<QubitId>,
}

/// Place `circuit` on `graph` and rewrite its qubit references.
///
/// Every `Logical(q)` becomes `Placed(node)` or, if no node was chosen,
/// `Unplaced(q)`. Returns the (possibly partial) mapping.
pub fn place(
    circuit: &mut Circuit,
    graph: &ConnectivityGraph,
    config: &PlacementConfig,
) -> CompileResult<QubitMapping> {
    let report = Placer::new(graph, config).run(circuit)?;
    apply_placement(circuit, &report.mapping)?;
    Ok(report.mapping)
}

/// Rewrite the logical references of `circuit` through `mapping`.
pub fn apply_placement(circuit: &mut Circuit, mapping: &QubitMapping) -> CompileResult<()> {
    circuit.rename_qubits(|q| match q {
        QubitRef::Logical(id) => mapping
            .get(id)
            .map_or(QubitRef::Unplaced(id), QubitRef::Placed),
        other => other,
    })?;
    Ok(())
}

/// Placement engine bound to a device and configuration.
pub struct Placer<'a> {
    graph: &'a ConnectivityGraph,
    config: &'a PlacementConfig,
}

impl<'a> Placer<'a> {
    /// Create a placer.
    pub fn new(graph: &'a ConnectivityGraph, config: &'a PlacementConfig) -> Self {
        Self { graph, config }
    }

    /// Choose a mapping for the logical qubits of `circuit` without
    /// modifying it.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name(), qubits = circuit.num_qubits()))]
    pub fn run(&self, circuit: &Circuit) -> CompileResult<PlacementReport> {
        let mut logical = Vec::with_capacity(circuit.num_qubits());
        for &q in circuit.qubits() {
            match q {
                QubitRef::Logical(id) => logical.push(id),
                other => return Err(CompileError::AlreadyPlaced(other.to_string())),
            }
        }
        if logical.len() > self.graph.num_nodes() {
            return Err(CompileError::CircuitTooLarge {
                required: logical.len(),
                available: self.graph.num_nodes(),
            });
        }
        logical.sort_unstable();

        let (mapping, status, expansions, lost_weight) = match self.config.strategy {
            PlacementStrategy::Trivial => {
                let mapping = QubitMapping::from_pairs(
                    logical.iter().copied().zip(self.graph.nodes()),
                )?;
                (mapping, PlacementStatus::Complete, 0, 0)
            }
            PlacementStrategy::Graph => {
                let interactions = InteractionGraph::from_circuit(circuit, self.config.depth_limit);
                let measured = measured_qubits(circuit);
                let search = Search::new(self.graph, &interactions, self.config, &measured);
                let outcome = search.run()?;
                let status = if outcome.exhausted {
                    PlacementStatus::TimedOut
                } else if outcome.mapping.len() < logical.len() {
                    PlacementStatus::Partial
                } else {
                    PlacementStatus::Complete
                };
                (outcome.mapping, status, outcome.expansions, outcome.lost)
            }
        };

        let unplaced: Vec<QubitId> = logical
            .iter()
            .copied()
            .filter(|&q| !mapping.contains_qubit(q))
            .collect();

        match status {
            PlacementStatus::TimedOut => warn!(
                "Placement budget exhausted after {expansions} expansions; {} of {} qubits placed",
                mapping.len(),
                logical.len()
            ),
            _ => info!(
                "Placed {} of {} qubits ({expansions} expansions, lost weight {lost_weight})",
                mapping.len(),
                logical.len()
            ),
        }

        Ok(PlacementReport {
            mapping,
            status,
            expansions,
            lost_weight,
            unplaced,
        })
    }
}

// =============================================================================
// Best-first subgraph search
// =============================================================================

/// A partial match. `assigned[k]` is the position in `Search::nodes` of the
/// node chosen for `Search::order[k]`.
#[derive(Debug, Clone)]
struct State {
    lost: u64,
    noise: f64,
    seq: u64,
    assigned: Vec<usize>,
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for State {}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for State {
    /// Greater is better: less lost weight, then deeper, then less noise,
    /// then earlier insertion.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .lost
            .cmp(&self.lost)
            .then_with(|| self.assigned.len().cmp(&other.assigned.len()))
            .then_with(|| other.noise.total_cmp(&self.noise))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

struct SearchOutcome {
    mapping: QubitMapping,
    expansions: usize,
    lost: u64,
    exhausted: bool,
}

struct Search<'a> {
    graph: &'a ConnectivityGraph,
    config: &'a PlacementConfig,
    noise: Option<&'a DeviceCharacterization>,
    /// Device nodes in id order.
    nodes: Vec<Node>,
    /// Interacting qubits in search order.
    order: Vec<QubitId>,
    /// For each qubit in `order`, its earlier-ordered partners as
    /// `(order index, weight)`.
    partners: Vec<Vec<(usize, u64)>>,
    /// For each qubit in `order`, whether it is measured.
    measured: Vec<bool>,
}

impl<'a> Search<'a> {
    fn new(
        graph: &'a ConnectivityGraph,
        interactions: &'a InteractionGraph,
        config: &'a PlacementConfig,
        measured: &FxHashSet<QubitId>,
    ) -> Self {
        let order = search_order(interactions);
        let measured = order.iter().map(|q| measured.contains(q)).collect();
        let position: FxHashMap<QubitId, usize> =
            order.iter().enumerate().map(|(i, &q)| (q, i)).collect();
        let partners = order
            .iter()
            .enumerate()
            .map(|(k, &q)| {
                interactions
                    .neighbors(q)
                    .into_iter()
                    .filter_map(|(p, w)| position.get(&p).filter(|&&i| i < k).map(|&i| (i, w)))
                    .collect()
            })
            .collect();

        Self {
            graph,
            config,
            noise: config.characterization.as_ref().filter(|c| !c.is_empty()),
            nodes: graph.nodes(),
            order,
            partners,
            measured,
        }
    }

    fn run(&self) -> CompileResult<SearchOutcome> {
        if self.order.is_empty() {
            return Ok(SearchOutcome {
                mapping: QubitMapping::new(),
                expansions: 0,
                lost: 0,
                exhausted: false,
            });
        }

        let deadline = Instant::now() + self.config.timeout();
        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;
        heap.push(State {
            lost: 0,
            noise: 0.0,
            seq,
            assigned: vec![],
        });

        let mut best_partial: Option<State> = None;
        let mut complete: Vec<State> = vec![];
        let mut expansions = 0usize;
        let mut exhausted = false;

        while let Some(state) = heap.pop() {
            if state.assigned.len() == self.order.len() {
                if let Some(first) = complete.first() {
                    if state.lost > first.lost {
                        break;
                    }
                }
                debug!(
                    "Complete match #{} (lost {}, noise {:.4})",
                    complete.len() + 1,
                    state.lost,
                    state.noise
                );
                complete.push(state);
                if self.noise.is_none() || complete.len() >= self.config.max_matches {
                    break;
                }
                continue;
            }

            let better = best_partial.as_ref().is_none_or(|best| {
                state.assigned.len() > best.assigned.len()
                    || (state.assigned.len() == best.assigned.len() && state.lost < best.lost)
            });
            if better {
                best_partial = Some(state.clone());
            }

            if expansions >= self.config.max_expansions || Instant::now() >= deadline {
                exhausted = true;
                break;
            }
            expansions += 1;

            for child in self.expand(&state) {
                seq += 1;
                heap.push(State { seq, ..child });
            }
        }

        let chosen = match complete
            .into_iter()
            .min_by(|a, b| a.noise.total_cmp(&b.noise).then_with(|| a.seq.cmp(&b.seq)))
        {
            Some(state) => {
                exhausted = false;
                state
            }
            None => best_partial.unwrap_or(State {
                lost: 0,
                noise: 0.0,
                seq: 0,
                assigned: vec![],
            }),
        };

        let mapping = QubitMapping::from_pairs(
            chosen
                .assigned
                .iter()
                .enumerate()
                .map(|(k, &pos)| (self.order[k], self.nodes[pos])),
        )?;
        Ok(SearchOutcome {
            mapping,
            expansions,
            lost: chosen.lost,
            exhausted,
        })
    }

    /// Children of `state`: every way to place the next qubit in order.
    fn expand(&self, state: &State) -> Vec<State> {
        let k = state.assigned.len();
        let mut used = vec![false; self.nodes.len()];
        for &pos in &state.assigned {
            used[pos] = true;
        }

        let mut candidates: Vec<usize> = vec![];
        for &(partner, _) in &self.partners[k] {
            let anchor = self.nodes[state.assigned[partner]];
            for neighbor in self.graph.neighbors(anchor) {
                if let Ok(pos) = self.nodes.binary_search(&neighbor) {
                    if !used[pos] && !candidates.contains(&pos) {
                        candidates.push(pos);
                    }
                }
            }
        }
        if candidates.is_empty() {
            candidates = (0..self.nodes.len()).filter(|&p| !used[p]).collect();
            candidates.sort_by_key(|&p| std::cmp::Reverse(self.graph.degree(self.nodes[p])));
        } else {
            candidates.sort_unstable();
        }

        candidates
            .into_iter()
            .map(|pos| {
                let node = self.nodes[pos];
                let mut lost = state.lost;
                let mut noise = state.noise;
                for &(partner, weight) in &self.partners[k] {
                    let other = self.nodes[state.assigned[partner]];
                    if !self.graph.are_adjacent(node, other) {
                        lost += weight;
                    }
                    if let Some(device) = self.noise {
                        noise += weight as f64 * device.edge_error(node, other);
                    }
                }
                if let Some(device) = self.noise {
                    noise += device.node_error(node);
                    if self.measured[k] {
                        noise += device.readout_error(node);
                    }
                }
                let mut assigned = state.assigned.clone();
                assigned.push(pos);
                State {
                    lost,
                    noise,
                    seq: 0,
                    assigned,
                }
            })
            .collect()
    }

    #[cfg(test)]
    fn order(&self) -> &[QubitId] {
        &self.order
    }
}

fn measured_qubits(circuit: &Circuit) -> FxHashSet<QubitId> {
    circuit
        .operations()
        .iter()
        .filter(|op| op.is_measure())
        .flat_map(|op| op.qubits.iter().filter_map(|q| q.logical()))
        .collect()
}

/// Heaviest qubit first, then repeatedly the qubit most strongly connected
/// to the ones already ordered.
fn search_order(interactions: &InteractionGraph) -> Vec<QubitId> {
    let mut remaining = interactions.qubits();
    let mut order = Vec::with_capacity(remaining.len());
    let mut connection: FxHashMap<QubitId, u64> = FxHashMap::default();

    loop {
        let Some((idx, _)) = remaining
            .iter()
            .enumerate()
            .max_by(|x, y| {
                let (a, b) = (*x.1, *y.1);
                let ca = connection.get(&a).copied().unwrap_or(0);
                let cb = connection.get(&b).copied().unwrap_or(0);
                ca.cmp(&cb)
                    .then_with(|| interactions.total_weight(a).cmp(&interactions.total_weight(b)))
                    .then_with(|| b.cmp(&a))
            })
        else {
            break;
        };
        let next = remaining.remove(idx);
        for (partner, weight) in interactions.neighbors(next) {
            *connection.entry(partner).or_insert(0) += weight;
        }
        order.push(next);
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmap_ir::ClbitId;

    fn line_circuit(n: u32) -> Circuit {
        let mut circuit = Circuit::with_size("line", n, 0);
        for i in 1..n {
            circuit.cx(QubitId(i - 1), QubitId(i)).unwrap();
        }
        circuit
    }

    fn assert_injective(mapping: &QubitMapping) {
        let nodes: FxHashSet<Node> = mapping.iter().map(|(_, n)| n).collect();
        assert_eq!(nodes.len(), mapping.len());
        assert!(mapping.is_consistent());
    }

    #[test]
    fn test_line_on_line_is_exact() {
        let circuit = line_circuit(4);
        let graph = ConnectivityGraph::linear(6);
        let config = PlacementConfig::default();
        let report = Placer::new(&graph, &config).run(&circuit).unwrap();

        assert_eq!(report.status, PlacementStatus::Complete);
        assert_eq!(report.lost_weight, 0);
        assert_eq!(report.mapping.len(), 4);
        assert_injective(&report.mapping);
        for i in 1..4 {
            let a = report.mapping.get(QubitId(i - 1)).unwrap();
            let b = report.mapping.get(QubitId(i)).unwrap();
            assert!(graph.are_adjacent(a, b), "{a} and {b} not adjacent");
        }
    }

    #[test]
    fn test_star_interactions_on_star_device() {
        let mut circuit = Circuit::with_size("star", 4, 0);
        for i in 1..4 {
            circuit.cx(QubitId(0), QubitId(i)).unwrap();
        }
        let graph = ConnectivityGraph::star(5);
        let config = PlacementConfig::default();
        let report = Placer::new(&graph, &config).run(&circuit).unwrap();

        assert_eq!(report.lost_weight, 0);
        assert_eq!(report.mapping.get(QubitId(0)), Some(Node(0)));
    }

    #[test]
    fn test_triangle_on_line_loses_weight() {
        let mut circuit = Circuit::with_size("triangle", 3, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.cx(QubitId(1), QubitId(2)).unwrap();
        circuit.cx(QubitId(2), QubitId(0)).unwrap();
        let graph = ConnectivityGraph::linear(3);
        let config = PlacementConfig::default();
        let report = Placer::new(&graph, &config).run(&circuit).unwrap();

        assert_eq!(report.status, PlacementStatus::Complete);
        assert!(report.lost_weight > 0);
        assert_injective(&report.mapping);
    }

    #[test]
    fn test_qubits_without_interactions_stay_unplaced() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        circuit.h(QubitId(2)).unwrap();

        let graph = ConnectivityGraph::linear(3);
        let mut placed = circuit.clone();
        let mapping = place(&mut placed, &graph, &PlacementConfig::default()).unwrap();

        assert_eq!(mapping.len(), 2);
        assert!(!mapping.contains_qubit(QubitId(2)));
        assert_eq!(placed.qubits()[2], QubitRef::Unplaced(QubitId(2)));
        assert!(placed.qubits()[..2].iter().all(|q| q.is_placed()));
        assert!(placed.operations()[1].qubits[0] == QubitRef::Unplaced(QubitId(2)));
    }

    #[test]
    fn test_depth_limit_leaves_late_qubits_unplaced() {
        let circuit = line_circuit(4);
        let graph = ConnectivityGraph::linear(4);
        let config = PlacementConfig {
            depth_limit: 1,
            ..PlacementConfig::default()
        };
        let report = Placer::new(&graph, &config).run(&circuit).unwrap();
        assert_eq!(report.status, PlacementStatus::Partial);
        assert_eq!(report.unplaced, vec![QubitId(2), QubitId(3)]);
    }

    #[test]
    fn test_noise_breaks_ties() {
        let mut circuit = Circuit::with_size("pair", 2, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let graph = ConnectivityGraph::linear(4);
        let noise = DeviceCharacterization::new()
            .with_node_error(0, 0.1)
            .with_node_error(1, 0.1)
            .with_edge_error(0, 1, 0.2)
            .with_edge_error(1, 2, 0.2);
        let config = PlacementConfig::default().with_characterization(noise);
        let report = Placer::new(&graph, &config).run(&circuit).unwrap();

        let mut nodes: Vec<Node> = report.mapping.nodes().collect();
        nodes.sort();
        assert_eq!(nodes, vec![Node(2), Node(3)]);
    }

    #[test]
    fn test_expansion_budget_returns_partial() {
        let circuit = line_circuit(5);
        let graph = ConnectivityGraph::linear(5);
        let config = PlacementConfig {
            max_expansions: 2,
            ..PlacementConfig::default()
        };
        let report = Placer::new(&graph, &config).run(&circuit).unwrap();
        assert_eq!(report.status, PlacementStatus::TimedOut);
        assert_eq!(report.expansions, 2);
        assert_eq!(report.mapping.len(), 2);
        assert_injective(&report.mapping);
    }

    #[test]
    fn test_wall_clock_budget_returns_partial() {
        let mut circuit = line_circuit(5);
        let graph = ConnectivityGraph::linear(5);
        let config = PlacementConfig {
            timeout_ms: 0,
            max_expansions: usize::MAX,
            ..PlacementConfig::default()
        };
        let report = Placer::new(&graph, &config).run(&circuit).unwrap();
        assert_eq!(report.status, PlacementStatus::TimedOut);
        assert!(report.mapping.len() < 5);
        assert_injective(&report.mapping);

        let mapping = place(&mut circuit, &graph, &config).unwrap();
        for &q in circuit.qubits() {
            match q {
                QubitRef::Placed(node) => assert!(mapping.nodes().any(|n| n == node)),
                QubitRef::Unplaced(id) => assert!(!mapping.contains_qubit(id)),
                QubitRef::Logical(_) => panic!("{q} left logical"),
            }
        }
    }

    #[test]
    fn test_readout_error_counts_for_measured_qubits() {
        let graph = ConnectivityGraph::linear(4);
        let noise = DeviceCharacterization::new()
            .with_readout_error(0, 0.3)
            .with_readout_error(1, 0.3);
        let config = PlacementConfig::default().with_characterization(noise);

        let mut measured = Circuit::with_size("pair", 2, 2);
        measured.cx(QubitId(0), QubitId(1)).unwrap();
        measured.measure(QubitId(0), ClbitId(0)).unwrap();
        measured.measure(QubitId(1), ClbitId(1)).unwrap();
        let report = Placer::new(&graph, &config).run(&measured).unwrap();
        let mut nodes: Vec<Node> = report.mapping.nodes().collect();
        nodes.sort();
        assert_eq!(nodes, vec![Node(2), Node(3)]);

        // Without measurements the readout errors do not matter.
        let mut unmeasured = Circuit::with_size("pair", 2, 0);
        unmeasured.cx(QubitId(0), QubitId(1)).unwrap();
        let with_noise = Placer::new(&graph, &config).run(&unmeasured).unwrap();
        let without = Placer::new(&graph, &PlacementConfig::default())
            .run(&unmeasured)
            .unwrap();
        assert_eq!(with_noise.mapping, without.mapping);
    }

    #[test]
    fn test_trivial_strategy() {
        let circuit = Circuit::with_size("test", 3, 0);
        let graph = ConnectivityGraph::from_edges([(4, 7), (7, 9), (9, 12)]);
        let config = PlacementConfig::default().with_strategy(PlacementStrategy::Trivial);
        let report = Placer::new(&graph, &config).run(&circuit).unwrap();
        assert_eq!(report.mapping.get(QubitId(0)), Some(Node(4)));
        assert_eq!(report.mapping.get(QubitId(2)), Some(Node(9)));
        assert_eq!(report.status, PlacementStatus::Complete);
    }

    #[test]
    fn test_circuit_too_large() {
        let circuit = Circuit::with_size("test", 4, 0);
        let graph = ConnectivityGraph::linear(3);
        let result = Placer::new(&graph, &PlacementConfig::default()).run(&circuit);
        assert!(matches!(
            result,
            Err(CompileError::CircuitTooLarge {
                required: 4,
                available: 3
            })
        ));
    }

    #[test]
    fn test_already_placed() {
        let mut circuit = line_circuit(2);
        let graph = ConnectivityGraph::linear(2);
        place(&mut circuit, &graph, &PlacementConfig::default()).unwrap();
        let result = place(&mut circuit, &graph, &PlacementConfig::default());
        assert!(matches!(result, Err(CompileError::AlreadyPlaced(_))));
    }

    #[test]
    fn test_search_order_heaviest_first() {
        let mut circuit = Circuit::with_size("test", 4, 0);
        circuit.cx(QubitId(2), QubitId(3)).unwrap();
        circuit.cx(QubitId(2), QubitId(1)).unwrap();
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let interactions = InteractionGraph::from_circuit(&circuit, 5);
        let graph = ConnectivityGraph::linear(4);
        let config = PlacementConfig::default();
        let search = Search::new(&graph, &interactions, &config, &FxHashSet::default());

        // q2: 5 + 4, q1: 4 + 3
        assert_eq!(search.order()[0], QubitId(2));
        assert_eq!(search.order()[1], QubitId(3));
        assert_eq!(search.order()[2], QubitId(1));
        assert_eq!(search.order()[3], QubitId(0));
    }
}
