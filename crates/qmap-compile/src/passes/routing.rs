//! Routing as a pass.

use qmap_ir::Circuit;

use crate::config::RoutingConfig;
use crate::error::CompileResult;
use crate::graph::ConnectivityGraph;
use crate::pass::{Pass, PassKind, PassOutcome, PostConditions};
use crate::predicate::Predicate;
use crate::routing::Router;

/// Inserts SWAPs (and optionally BRIDGEs) until every two-qubit gate acts on
/// adjacent nodes.
pub struct RoutingPass<'a> {
    graph: &'a ConnectivityGraph,
    config: RoutingConfig,
}

impl<'a> RoutingPass<'a> {
    /// Create a routing pass for `graph`.
    pub fn new(graph: &'a ConnectivityGraph, config: RoutingConfig) -> Self {
        Self { graph, config }
    }
}

impl Pass for RoutingPass<'_> {
    fn name(&self) -> &'static str {
        "RoutingPass"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn preconditions(&self) -> Vec<Predicate> {
        vec![Predicate::MaxTwoQubitGates]
    }

    fn postconditions(&self) -> PostConditions {
        let mut invalidates = vec![Predicate::NoSwaps, Predicate::DirectedConnectivity];
        if self.config.allow_bridge {
            invalidates.push(Predicate::NoBridges);
        }
        PostConditions::guarantees([Predicate::Placed, Predicate::Connectivity])
            .invalidating(invalidates)
    }

    fn device(&self) -> Option<&ConnectivityGraph> {
        Some(self.graph)
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome> {
        let report = Router::new(self.graph, &self.config).run(circuit)?;
        *circuit = report.circuit;
        Ok(PassOutcome {
            placement: None,
            assignments: report.assignments,
            permutation: report.permutation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qmap_ir::Node;

    #[test]
    fn test_routing_pass_reports_permutation() {
        let graph = ConnectivityGraph::linear(3);
        let mut circuit = Circuit::on_nodes("test", (0..3).map(Node)).unwrap();
        circuit.cx(Node(0), Node(2)).unwrap();

        let pass = RoutingPass::new(&graph, RoutingConfig::default());
        let outcome = pass.run(&mut circuit).unwrap();

        assert!(outcome.assignments.is_empty());
        assert!(!outcome.permutation.is_identity());
        assert!(Predicate::Connectivity.holds(&circuit, Some(&graph)));
    }

    #[test]
    fn test_routing_pass_conditions() {
        let graph = ConnectivityGraph::linear(3);
        let pass = RoutingPass::new(&graph, RoutingConfig::default().with_bridges(true));
        let post = pass.postconditions();
        assert!(post.guarantees.contains(&Predicate::Connectivity));
        assert!(post.invalidates.contains(&Predicate::NoBridges));
        assert_eq!(pass.preconditions(), vec![Predicate::MaxTwoQubitGates]);
    }
}
