//! Pass trait and types for compilation passes.

use qmap_ir::{Circuit, Node, QubitId};

use crate::error::CompileResult;
use crate::graph::ConnectivityGraph;
use crate::mapping::{NodePermutation, QubitMapping};
use crate::predicate::Predicate;

/// The kind of compilation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// Analysis pass that reads but does not modify the circuit.
    Analysis,
    /// Transformation pass that modifies the circuit.
    Transformation,
}

/// Predicates a pass establishes and predicates it may break.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostConditions {
    /// Predicates that hold after the pass.
    pub guarantees: Vec<Predicate>,
    /// Predicates that may no longer hold after the pass.
    pub invalidates: Vec<Predicate>,
}

impl PostConditions {
    /// Post-conditions of a pass that establishes `guarantees`.
    pub fn guarantees(guarantees: impl IntoIterator<Item = Predicate>) -> Self {
        Self {
            guarantees: guarantees.into_iter().collect(),
            invalidates: vec![],
        }
    }

    /// Also mark `invalidates` as possibly broken.
    #[must_use]
    pub fn invalidating(mut self, invalidates: impl IntoIterator<Item = Predicate>) -> Self {
        self.invalidates.extend(invalidates);
        self
    }
}

/// What a pass reports about how it moved qubits.
///
/// A compilation unit merges this into its maps: a placement seeds both
/// maps, assignments add qubits that were placed late, and the permutation
/// is composed into the final map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassOutcome {
    /// Initial placement chosen by the pass.
    pub placement: Option<QubitMapping>,
    /// Logical qubits given a node by this pass, with the node they occupy at
    /// the start of the circuit.
    pub assignments: Vec<(QubitId, Node)>,
    /// Where the state on each node at the end of the circuit moved to.
    pub permutation: NodePermutation,
}

impl PassOutcome {
    /// An outcome that moved nothing.
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// An outcome reporting an initial placement.
    pub fn placed(mapping: QubitMapping) -> Self {
        Self {
            placement: Some(mapping),
            ..Self::default()
        }
    }

    /// An outcome reporting a node permutation.
    pub fn permuted(permutation: NodePermutation) -> Self {
        Self {
            permutation,
            ..Self::default()
        }
    }

    /// Combine with the outcome of a pass that ran afterwards.
    #[must_use]
    pub fn then(self, next: PassOutcome) -> Self {
        let mut assignments = self.assignments;
        assignments.extend(next.assignments);
        Self {
            placement: next.placement.or(self.placement),
            assignments,
            permutation: self.permutation.then(&next.permutation),
        }
    }
}

/// A compilation pass that operates on a circuit.
///
/// Each pass declares the predicates it needs and the predicates it
/// establishes or breaks, so pass sequences can be checked before they run.
pub trait Pass: Send + Sync {
    /// Get the name of this pass.
    fn name(&self) -> &str;

    /// Get the kind of this pass.
    fn kind(&self) -> PassKind;

    /// Predicates that must hold before the pass runs.
    fn preconditions(&self) -> Vec<Predicate> {
        vec![]
    }

    /// Predicates established and broken by the pass.
    fn postconditions(&self) -> PostConditions {
        PostConditions::default()
    }

    /// The device the pass targets, used to evaluate preconditions.
    fn device(&self) -> Option<&ConnectivityGraph> {
        None
    }

    /// Run the pass on the given circuit.
    fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome>;

    /// Check if this pass should run based on current state.
    fn should_run(&self, _circuit: &Circuit) -> bool {
        true
    }
}
