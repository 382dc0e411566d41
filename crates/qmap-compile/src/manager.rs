//! Pass sequencing and the preset placement-and-routing pipeline.

use std::collections::BTreeSet;

use tracing::{debug, info, instrument};

use qmap_ir::Circuit;

use crate::config::CompilerConfig;
use crate::error::{CompileError, CompileResult};
use crate::graph::ConnectivityGraph;
use crate::pass::{Pass, PassKind, PassOutcome, PostConditions};
use crate::passes::{
    DecomposeBridges, DecomposeMultiQubitGates, DecomposeSwapsToCx, ElideTrailingSwaps,
    PlacementPass, RoutingPass, VerifyPredicates,
};
use crate::predicate::Predicate;
use crate::unit::CompilationUnit;

/// Predicates known to hold at each point of a pass sequence, tracked
/// without running anything.
#[derive(Debug, Clone, Default)]
struct Composition {
    available: BTreeSet<Predicate>,
    invalidated: BTreeSet<Predicate>,
}

impl Composition {
    fn assuming(assumed: impl IntoIterator<Item = Predicate>) -> Self {
        let mut composition = Self::default();
        for predicate in assumed {
            composition.available.extend(predicate.implied());
        }
        composition
    }

    /// Check `pass` can follow the passes pushed so far, then record its
    /// post-conditions.
    fn push(&mut self, pass: &dyn Pass) -> CompileResult<()> {
        if let Some(missing) = pass
            .preconditions()
            .into_iter()
            .find(|p| !self.available.contains(p))
        {
            return Err(CompileError::IncompatiblePasses {
                pass: pass.name().to_string(),
                predicate: missing,
            });
        }

        let PostConditions {
            guarantees,
            invalidates,
        } = pass.postconditions();
        if pass.kind() == PassKind::Transformation {
            for predicate in invalidates {
                self.available.remove(&predicate);
                self.invalidated.insert(predicate);
            }
        }
        for predicate in guarantees {
            for &implied in predicate.implied() {
                self.available.insert(implied);
                self.invalidated.remove(&implied);
            }
        }
        Ok(())
    }
}

/// Several passes run as one.
///
/// Construction checks that each pass's preconditions are guaranteed by the
/// assumed predicates or by an earlier pass, and that no pass in between
/// invalidated them.
pub struct SequencePass<'a> {
    name: String,
    passes: Vec<Box<dyn Pass + 'a>>,
    assumed: Vec<Predicate>,
    composition: Composition,
}

impl<'a> SequencePass<'a> {
    /// Sequence `passes`, assuming nothing about the input circuit.
    pub fn new(passes: Vec<Box<dyn Pass + 'a>>) -> CompileResult<Self> {
        Self::with_assumptions(passes, [])
    }

    /// Sequence `passes` for input circuits satisfying `assumed`.
    pub fn with_assumptions(
        passes: Vec<Box<dyn Pass + 'a>>,
        assumed: impl IntoIterator<Item = Predicate>,
    ) -> CompileResult<Self> {
        let assumed: Vec<Predicate> = assumed.into_iter().collect();
        let mut composition = Composition::assuming(assumed.iter().copied());
        for pass in &passes {
            composition.push(pass.as_ref())?;
        }
        let name = format!(
            "Sequence[{}]",
            passes.iter().map(|p| p.name()).collect::<Vec<_>>().join(", ")
        );
        Ok(Self {
            name,
            passes,
            assumed,
            composition,
        })
    }

    /// Number of passes in the sequence.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Pass for SequencePass<'_> {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> PassKind {
        if self
            .passes
            .iter()
            .all(|p| p.kind() == PassKind::Analysis)
        {
            PassKind::Analysis
        } else {
            PassKind::Transformation
        }
    }

    fn preconditions(&self) -> Vec<Predicate> {
        self.assumed.clone()
    }

    fn postconditions(&self) -> PostConditions {
        PostConditions::guarantees(self.composition.available.iter().copied())
            .invalidating(self.composition.invalidated.iter().copied())
    }

    fn device(&self) -> Option<&ConnectivityGraph> {
        self.passes.iter().find_map(|p| p.device())
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome> {
        let mut outcome = PassOutcome::unchanged();
        for pass in &self.passes {
            if pass.should_run(circuit) {
                debug!("Running pass: {}", pass.name());
                outcome = outcome.then(pass.run(circuit)?);
            } else {
                debug!("Skipping pass: {}", pass.name());
            }
        }
        Ok(outcome)
    }
}

/// Manages and executes a sequence of compilation passes on a
/// [`CompilationUnit`].
///
/// Every pass added is checked against the predicates available at that
/// point; an incompatible pass is rejected before anything runs.
pub struct PassManager<'a> {
    passes: Vec<Box<dyn Pass + 'a>>,
    composition: Composition,
}

impl<'a> PassManager<'a> {
    /// Create a new empty pass manager.
    pub fn new() -> Self {
        Self::with_assumptions([])
    }

    /// Create an empty pass manager for circuits satisfying `assumed`.
    pub fn with_assumptions(assumed: impl IntoIterator<Item = Predicate>) -> Self {
        Self {
            passes: vec![],
            composition: Composition::assuming(assumed),
        }
    }

    /// Add a pass to the manager.
    pub fn add_pass(&mut self, pass: impl Pass + 'a) -> CompileResult<()> {
        self.composition.push(&pass)?;
        self.passes.push(Box::new(pass));
        Ok(())
    }

    /// Names of the passes, in order.
    pub fn pass_names(&self) -> Vec<&str> {
        self.passes.iter().map(|p| p.name()).collect()
    }

    /// Predicates guaranteed once every pass has run.
    pub fn guarantees(&self) -> impl Iterator<Item = Predicate> + '_ {
        self.composition.available.iter().copied()
    }

    /// Run all passes on the given unit.
    #[instrument(skip(self, unit), fields(circuit = unit.circuit().name()))]
    pub fn run(&self, unit: &mut CompilationUnit) -> CompileResult<()> {
        info!(
            "Running pass manager with {} passes on circuit with {} qubits",
            self.passes.len(),
            unit.circuit().num_qubits()
        );

        for pass in &self.passes {
            unit.apply(pass.as_ref())?;
        }

        info!(
            "Pass manager completed, state: {:?}, depth: {}, ops: {}",
            unit.state(),
            unit.circuit().depth(),
            unit.circuit().num_ops()
        );
        Ok(())
    }

    /// Get the number of passes.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Check if the manager has no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

impl Default for PassManager<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for the preset pipeline targeting one device.
///
/// The pipeline decomposes gates on three or more qubits, places, routes,
/// optionally post-processes SWAPs and BRIDGEs, and finally verifies the
/// result.
pub struct PassManagerBuilder<'a> {
    graph: &'a ConnectivityGraph,
    config: CompilerConfig,
    decompose_swaps: bool,
    decompose_bridges: bool,
    elide_trailing_swaps: bool,
}

impl<'a> PassManagerBuilder<'a> {
    /// Create a builder for `graph` with the default configuration.
    pub fn new(graph: &'a ConnectivityGraph) -> Self {
        Self {
            graph,
            config: CompilerConfig::default(),
            decompose_swaps: false,
            decompose_bridges: false,
            elide_trailing_swaps: false,
        }
    }

    /// Set the placement and routing configuration.
    #[must_use]
    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Rewrite inserted SWAPs as CX gates.
    #[must_use]
    pub fn decompose_swaps(mut self, enabled: bool) -> Self {
        self.decompose_swaps = enabled;
        self
    }

    /// Rewrite inserted BRIDGEs as CX gates.
    #[must_use]
    pub fn decompose_bridges(mut self, enabled: bool) -> Self {
        self.decompose_bridges = enabled;
        self
    }

    /// Fold SWAPs at the end of the routed circuit into the final map.
    #[must_use]
    pub fn elide_trailing_swaps(mut self, enabled: bool) -> Self {
        self.elide_trailing_swaps = enabled;
        self
    }

    /// Build the pass manager.
    pub fn build(self) -> CompileResult<PassManager<'a>> {
        self.config.validate()?;
        let graph = self.graph;
        let mut pm = PassManager::new();

        pm.add_pass(DecomposeMultiQubitGates)?;
        pm.add_pass(PlacementPass::new(graph, self.config.placement))?;
        pm.add_pass(RoutingPass::new(graph, self.config.routing))?;

        if self.elide_trailing_swaps {
            pm.add_pass(ElideTrailingSwaps::for_device(graph))?;
        }
        let mut verified = vec![Predicate::Placed, Predicate::Connectivity];
        if self.decompose_bridges {
            pm.add_pass(DecomposeBridges::for_device(graph))?;
            verified.push(Predicate::NoBridges);
        }
        if self.decompose_swaps {
            pm.add_pass(DecomposeSwapsToCx::for_device(graph))?;
            verified.push(Predicate::NoSwaps);
        }

        pm.add_pass(VerifyPredicates::new(graph, verified))?;
        Ok(pm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoutingConfig;
    use crate::unit::PlacementState;
    use qmap_ir::{Node, QubitId, StandardGate};

    fn boxed<'a>(pass: impl Pass + 'a) -> Box<dyn Pass + 'a> {
        Box::new(pass)
    }

    /// A pass that needs a circuit without SWAPs.
    struct NeedsNoSwaps;

    impl Pass for NeedsNoSwaps {
        fn name(&self) -> &'static str {
            "NeedsNoSwaps"
        }

        fn kind(&self) -> PassKind {
            PassKind::Analysis
        }

        fn preconditions(&self) -> Vec<Predicate> {
            vec![Predicate::NoSwaps]
        }

        fn run(&self, _circuit: &mut Circuit) -> CompileResult<PassOutcome> {
            Ok(PassOutcome::unchanged())
        }
    }

    #[test]
    fn test_empty_pass_manager() {
        let pm = PassManager::new();
        assert!(pm.is_empty());
        assert_eq!(pm.len(), 0);
    }

    #[test]
    fn test_incompatible_pass_rejected() {
        let graph = ConnectivityGraph::linear(3);
        let mut pm = PassManager::new();
        let err = pm
            .add_pass(RoutingPass::new(&graph, RoutingConfig::default()))
            .unwrap_err();
        assert!(matches!(
            err,
            CompileError::IncompatiblePasses {
                predicate: Predicate::MaxTwoQubitGates,
                ..
            }
        ));
        assert!(pm.is_empty());

        let mut pm = PassManager::with_assumptions([Predicate::MaxTwoQubitGates]);
        pm.add_pass(RoutingPass::new(&graph, RoutingConfig::default()))
            .unwrap();
        assert!(pm.guarantees().any(|p| p == Predicate::Connectivity));
    }

    #[test]
    fn test_sequence_tracks_invalidation() {
        let graph = ConnectivityGraph::linear(3);
        let passes = vec![boxed(DecomposeSwapsToCx::new()), boxed(NeedsNoSwaps)];
        let seq = SequencePass::new(passes).unwrap();
        assert_eq!(seq.len(), 2);

        let passes = vec![
            boxed(DecomposeSwapsToCx::new()),
            boxed(RoutingPass::new(&graph, RoutingConfig::default())),
            boxed(NeedsNoSwaps),
        ];
        let err = SequencePass::with_assumptions(passes, [Predicate::MaxTwoQubitGates])
            .err()
            .unwrap();
        assert!(matches!(
            err,
            CompileError::IncompatiblePasses {
                predicate: Predicate::NoSwaps,
                ..
            }
        ));
    }

    #[test]
    fn test_sequence_postconditions() {
        let graph = ConnectivityGraph::linear(3);
        let passes = vec![
            boxed(DecomposeMultiQubitGates),
            boxed(RoutingPass::new(&graph, RoutingConfig::default())),
        ];
        let seq = SequencePass::new(passes).unwrap();
        let post = seq.postconditions();
        assert!(post.guarantees.contains(&Predicate::Connectivity));
        assert!(post.guarantees.contains(&Predicate::MaxTwoQubitGates));
        assert!(post.invalidates.contains(&Predicate::NoSwaps));
        assert_eq!(seq.kind(), PassKind::Transformation);
        assert_eq!(seq.name(), "Sequence[DecomposeMultiQubitGates, RoutingPass]");
    }

    #[test]
    fn test_sequence_run_merges_outcomes() {
        let graph = ConnectivityGraph::linear(3);
        let passes = vec![
            boxed(RoutingPass::new(&graph, RoutingConfig::default())),
            boxed(ElideTrailingSwaps::new()),
        ];
        let seq = SequencePass::with_assumptions(passes, [Predicate::MaxTwoQubitGates]).unwrap();

        let mut circuit = Circuit::on_nodes("test", (0..3).map(Node)).unwrap();
        circuit.cx(Node(0), Node(2)).unwrap();
        let outcome = seq.run(&mut circuit).unwrap();

        assert!(!outcome.permutation.is_identity());
        assert!(Predicate::Connectivity.holds(&circuit, Some(&graph)));
    }

    #[test]
    fn test_preset_pipeline() {
        let graph = ConnectivityGraph::linear(4);
        let mut circuit = Circuit::with_size("test", 4, 0);
        circuit.h(QubitId(0)).unwrap();
        circuit.ccx(QubitId(0), QubitId(1), QubitId(2)).unwrap();
        circuit.cx(QubitId(0), QubitId(3)).unwrap();

        let pm = PassManagerBuilder::new(&graph)
            .decompose_swaps(true)
            .build()
            .unwrap();
        assert_eq!(
            pm.pass_names(),
            vec![
                "DecomposeMultiQubitGates",
                "PlacementPass",
                "RoutingPass",
                "DecomposeSwapsToCx",
                "VerifyPredicates"
            ]
        );

        let mut unit = CompilationUnit::new(circuit);
        pm.run(&mut unit).unwrap();

        assert_eq!(unit.state(), PlacementState::Routed);
        assert_eq!(unit.initial_map().len(), 4);
        assert_eq!(unit.final_map().len(), 4);
        assert!(Predicate::Connectivity.holds(unit.circuit(), Some(&graph)));
        assert!(
            !unit
                .circuit()
                .operations()
                .iter()
                .any(|op| op.is_standard(&StandardGate::Swap))
        );
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let graph = ConnectivityGraph::linear(2);
        let mut config = CompilerConfig::default();
        config.routing.lookahead_decay = 0.0;
        assert!(PassManagerBuilder::new(&graph).with_config(config).build().is_err());
    }
}
