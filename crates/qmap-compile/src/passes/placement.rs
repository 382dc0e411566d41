//! Initial placement as a pass.

use tracing::debug;

use qmap_ir::Circuit;

use crate::config::PlacementConfig;
use crate::error::CompileResult;
use crate::graph::ConnectivityGraph;
use crate::pass::{Pass, PassKind, PassOutcome};
use crate::placement::{PlacementStatus, Placer, apply_placement};

/// Chooses an initial node for each logical qubit and rewrites the circuit.
///
/// Qubits the search leaves out become `Unplaced`; a later [`RoutingPass`]
/// gives them a node. The pass guarantees nothing on its own, since the
/// placement may be partial.
///
/// [`RoutingPass`]: crate::passes::RoutingPass
pub struct PlacementPass<'a> {
    graph: &'a ConnectivityGraph,
    config: PlacementConfig,
}

impl<'a> PlacementPass<'a> {
    /// Create a placement pass for `graph`.
    pub fn new(graph: &'a ConnectivityGraph, config: PlacementConfig) -> Self {
        Self { graph, config }
    }
}

impl Pass for PlacementPass<'_> {
    fn name(&self) -> &'static str {
        "PlacementPass"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn device(&self) -> Option<&ConnectivityGraph> {
        Some(self.graph)
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome> {
        let report = Placer::new(self.graph, &self.config).run(circuit)?;
        if report.status != PlacementStatus::Complete {
            debug!(
                "Placement left {} qubit(s) unplaced ({:?})",
                report.unplaced.len(),
                report.status
            );
        }
        apply_placement(circuit, &report.mapping)?;
        Ok(PassOutcome::placed(report.mapping))
    }

    fn should_run(&self, circuit: &Circuit) -> bool {
        circuit.qubits().iter().any(|q| !q.is_placed())
    }
}
