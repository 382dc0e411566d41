//! Compilation unit: a circuit plus the maps relating its logical qubits to
//! device nodes at the start and at the end of the circuit.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use qmap_ir::{Circuit, ClbitId};

use crate::error::{CompileError, CompileResult};
use crate::graph::ConnectivityGraph;
use crate::mapping::QubitMapping;
use crate::pass::{Pass, PassKind, PassOutcome};
use crate::predicate::Predicate;

/// How far a unit has progressed towards running on a device.
///
/// States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementState {
    /// No qubit has a node.
    Unplaced,
    /// Some qubits have a node.
    PartiallyPlaced,
    /// Every qubit has a node.
    FullyPlaced,
    /// Every qubit has a node and all target predicates hold.
    Routed,
}

/// A circuit together with its `initial_map` and `final_map`.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    circuit: Circuit,
    initial_map: QubitMapping,
    final_map: QubitMapping,
    state: PlacementState,
    /// Predicates known to hold for the current circuit.
    known: BTreeSet<Predicate>,
    /// Predicates that must hold for the unit to count as routed.
    targets: Vec<Predicate>,
}

impl CompilationUnit {
    /// Wrap a circuit. Both maps start out empty.
    pub fn new(circuit: Circuit) -> Self {
        Self {
            circuit,
            initial_map: QubitMapping::new(),
            final_map: QubitMapping::new(),
            state: PlacementState::Unplaced,
            known: BTreeSet::new(),
            targets: vec![Predicate::Placed, Predicate::Connectivity],
        }
    }

    /// Replace the predicates required for [`PlacementState::Routed`].
    #[must_use]
    pub fn with_targets(mut self, targets: impl IntoIterator<Item = Predicate>) -> Self {
        self.targets = targets.into_iter().collect();
        self
    }

    /// The wrapped circuit.
    pub fn circuit(&self) -> &Circuit {
        &self.circuit
    }

    /// Unwrap the circuit.
    pub fn into_circuit(self) -> Circuit {
        self.circuit
    }

    /// Logical qubit to node at the start of the circuit.
    pub fn initial_map(&self) -> &QubitMapping {
        &self.initial_map
    }

    /// Logical qubit to node at the end of the circuit.
    pub fn final_map(&self) -> &QubitMapping {
        &self.final_map
    }

    /// Classical bits are never renamed: every bit maps to itself.
    pub fn classical_map(&self) -> Vec<(ClbitId, ClbitId)> {
        self.circuit.clbits().iter().map(|&c| (c, c)).collect()
    }

    /// Current placement state.
    pub fn state(&self) -> PlacementState {
        self.state
    }

    /// Predicates known to hold, as established by the passes applied so far.
    pub fn known_predicates(&self) -> impl Iterator<Item = Predicate> + '_ {
        self.known.iter().copied()
    }

    /// Evaluate every predicate against the circuit and `device`.
    pub fn check_all_predicates(
        &self,
        predicates: &[Predicate],
        device: &ConnectivityGraph,
    ) -> CompileResult<()> {
        predicates
            .iter()
            .try_for_each(|p| p.check(&self.circuit, Some(device)))
    }

    /// Apply a pass.
    ///
    /// Preconditions are taken from the known predicates or evaluated on the
    /// circuit. After the pass runs, its outcome is merged into the maps and
    /// the known predicates are updated from its post-conditions.
    pub fn apply(&mut self, pass: &dyn Pass) -> CompileResult<()> {
        if !pass.should_run(&self.circuit) {
            debug!("Skipping pass: {}", pass.name());
            return Ok(());
        }

        for predicate in pass.preconditions() {
            if self.known.contains(&predicate) {
                continue;
            }
            if let Err(err) = predicate.check(&self.circuit, pass.device()) {
                let reason = match err {
                    CompileError::PredicateFailed { reason, .. } => reason,
                    other => other.to_string(),
                };
                return Err(CompileError::PreconditionFailed {
                    pass: pass.name().to_string(),
                    predicate,
                    reason,
                });
            }
            self.known.extend(predicate.implied());
        }

        debug!("Running pass: {}", pass.name());
        let mut circuit = self.circuit.clone();
        let outcome = pass.run(&mut circuit)?;
        let (initial_map, final_map) = self.merged_maps(outcome)?;

        self.circuit = circuit;
        self.initial_map = initial_map;
        self.final_map = final_map;

        let post = pass.postconditions();
        if pass.kind() == PassKind::Transformation {
            for predicate in &post.invalidates {
                self.known.remove(predicate);
            }
        }
        for predicate in &post.guarantees {
            self.known.extend(predicate.implied());
        }

        self.advance_state();
        debug!(
            "Pass {} completed, ops: {}, state: {:?}",
            pass.name(),
            self.circuit.num_ops(),
            self.state
        );
        Ok(())
    }

    /// Maps after merging `outcome`; the unit is untouched on error.
    fn merged_maps(&self, outcome: PassOutcome) -> CompileResult<(QubitMapping, QubitMapping)> {
        let mut initial = self.initial_map.clone();
        let mut fin = self.final_map.clone();

        if let Some(placement) = outcome.placement {
            if !initial.is_empty() {
                return Err(CompileError::InvalidMapping(
                    "initial placement reported twice".to_string(),
                ));
            }
            initial = placement.clone();
            fin = placement;
        }
        for (qubit, node) in outcome.assignments {
            initial.insert(qubit, node)?;
            fin.insert(qubit, node)?;
        }
        fin.permute(&outcome.permutation);

        if !initial.is_consistent() || !fin.is_consistent() {
            return Err(CompileError::InvalidMapping(
                "qubit maps are no longer injective".to_string(),
            ));
        }
        Ok((initial, fin))
    }

    fn advance_state(&mut self) {
        let qubits = self.circuit.qubits();
        let placed = qubits.iter().filter(|q| q.is_placed()).count();

        let observed = if placed == qubits.len() && !qubits.is_empty() {
            if self.targets.iter().all(|p| self.known.contains(p)) {
                PlacementState::Routed
            } else {
                PlacementState::FullyPlaced
            }
        } else if placed > 0 {
            PlacementState::PartiallyPlaced
        } else {
            PlacementState::Unplaced
        };

        if observed > self.state {
            info!("Compilation unit {:?} -> {:?}", self.state, observed);
            self.state = observed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::NodePermutation;
    use crate::pass::PostConditions;
    use qmap_ir::{Node, QubitId};

    /// Places qubit i on node i.
    struct IdentityPlacement;

    impl Pass for IdentityPlacement {
        fn name(&self) -> &str {
            "IdentityPlacement"
        }

        fn kind(&self) -> PassKind {
            PassKind::Transformation
        }

        fn postconditions(&self) -> PostConditions {
            PostConditions::guarantees([Predicate::Placed])
        }

        fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome> {
            let mut mapping = QubitMapping::new();
            for q in circuit.qubits() {
                if let Some(id) = q.logical() {
                    mapping.insert(id, Node(id.0))?;
                }
            }
            crate::placement::apply_placement(circuit, &mapping)?;
            Ok(PassOutcome::placed(mapping))
        }
    }

    /// Reports a swap of nodes 0 and 1 without touching the circuit.
    struct SwapFirstTwo;

    impl Pass for SwapFirstTwo {
        fn name(&self) -> &str {
            "SwapFirstTwo"
        }

        fn kind(&self) -> PassKind {
            PassKind::Transformation
        }

        fn preconditions(&self) -> Vec<Predicate> {
            vec![Predicate::Placed]
        }

        fn run(&self, _circuit: &mut Circuit) -> CompileResult<PassOutcome> {
            let mut permutation = NodePermutation::identity();
            permutation.swap(Node(0), Node(1));
            Ok(PassOutcome::permuted(permutation))
        }
    }

    #[test]
    fn test_new_unit() {
        let mut circuit = Circuit::with_size("test", 2, 2);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let unit = CompilationUnit::new(circuit);
        assert_eq!(unit.state(), PlacementState::Unplaced);
        assert!(unit.initial_map().is_empty());
        assert!(unit.final_map().is_empty());
        assert_eq!(
            unit.classical_map(),
            vec![(ClbitId(0), ClbitId(0)), (ClbitId(1), ClbitId(1))]
        );
    }

    #[test]
    fn test_permutation_merged_into_final_map() {
        let mut unit = CompilationUnit::new(Circuit::with_size("test", 2, 0));
        unit.apply(&IdentityPlacement).unwrap();
        assert_eq!(unit.state(), PlacementState::FullyPlaced);

        unit.apply(&SwapFirstTwo).unwrap();
        assert_eq!(unit.initial_map().get(QubitId(0)), Some(Node(0)));
        assert_eq!(unit.final_map().get(QubitId(0)), Some(Node(1)));
        assert_eq!(unit.final_map().get(QubitId(1)), Some(Node(0)));
    }

    #[test]
    fn test_precondition_failure_leaves_unit_untouched() {
        let mut unit = CompilationUnit::new(Circuit::with_size("test", 2, 0));
        let err = unit.apply(&SwapFirstTwo).unwrap_err();
        assert!(matches!(
            err,
            CompileError::PreconditionFailed {
                predicate: Predicate::Placed,
                ..
            }
        ));
        assert!(unit.final_map().is_empty());
        assert_eq!(unit.state(), PlacementState::Unplaced);
    }

    #[test]
    fn test_second_placement_rejected() {
        let mut unit = CompilationUnit::new(Circuit::with_size("test", 1, 0));
        unit.apply(&IdentityPlacement).unwrap();

        struct Replace;
        impl Pass for Replace {
            fn name(&self) -> &str {
                "Replace"
            }
            fn kind(&self) -> PassKind {
                PassKind::Transformation
            }
            fn run(&self, _circuit: &mut Circuit) -> CompileResult<PassOutcome> {
                Ok(PassOutcome::placed(
                    QubitMapping::from_pairs([(QubitId(0), Node(5))]).unwrap(),
                ))
            }
        }
        assert!(matches!(
            unit.apply(&Replace),
            Err(CompileError::InvalidMapping(_))
        ));
        assert_eq!(unit.initial_map().get(QubitId(0)), Some(Node(0)));
    }

    #[test]
    fn test_check_all_predicates() {
        let mut circuit = Circuit::with_size("test", 3, 0);
        circuit.cx(QubitId(0), QubitId(2)).unwrap();
        let mut unit = CompilationUnit::new(circuit);
        unit.apply(&IdentityPlacement).unwrap();

        let graph = ConnectivityGraph::linear(3);
        assert!(unit.check_all_predicates(&[Predicate::Placed], &graph).is_ok());
        assert!(
            unit.check_all_predicates(&[Predicate::Placed, Predicate::Connectivity], &graph)
                .is_err()
        );
    }
}
