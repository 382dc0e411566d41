//! Predicate verification.

use qmap_ir::Circuit;

use crate::error::CompileResult;
use crate::graph::ConnectivityGraph;
use crate::pass::{Pass, PassKind, PassOutcome, PostConditions};
use crate::predicate::Predicate;

/// Analysis pass that fails unless every listed predicate holds.
pub struct VerifyPredicates<'a> {
    graph: &'a ConnectivityGraph,
    predicates: Vec<Predicate>,
}

impl<'a> VerifyPredicates<'a> {
    /// Verify `predicates` against `graph`.
    pub fn new(graph: &'a ConnectivityGraph, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        Self {
            graph,
            predicates: predicates.into_iter().collect(),
        }
    }

    /// The predicates this pass checks.
    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }
}

impl Pass for VerifyPredicates<'_> {
    fn name(&self) -> &'static str {
        "VerifyPredicates"
    }

    fn kind(&self) -> PassKind {
        PassKind::Analysis
    }

    fn postconditions(&self) -> PostConditions {
        PostConditions::guarantees(self.predicates.iter().copied())
    }

    fn device(&self) -> Option<&ConnectivityGraph> {
        Some(self.graph)
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome> {
        for predicate in &self.predicates {
            predicate.check(circuit, Some(self.graph))?;
        }
        Ok(PassOutcome::unchanged())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CompileError;
    use qmap_ir::Node;

    #[test]
    fn test_verify_passes_and_fails() {
        let graph = ConnectivityGraph::linear(3);
        let mut circuit = Circuit::on_nodes("test", (0..3).map(Node)).unwrap();
        circuit.cx(Node(0), Node(1)).unwrap();

        let pass = VerifyPredicates::new(&graph, [Predicate::Placed, Predicate::Connectivity]);
        assert_eq!(pass.kind(), PassKind::Analysis);
        assert!(pass.run(&mut circuit.clone()).is_ok());

        circuit.cx(Node(0), Node(2)).unwrap();
        let err = pass.run(&mut circuit).unwrap_err();
        assert!(matches!(
            err,
            CompileError::PredicateFailed {
                predicate: Predicate::Connectivity,
                ..
            }
        ));
    }
}
