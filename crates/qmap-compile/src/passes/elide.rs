//! Removal of SWAPs with nothing after them.

use rustc_hash::FxHashSet;
use tracing::debug;

use qmap_ir::{Circuit, QubitRef, StandardGate};

use crate::error::CompileResult;
use crate::graph::ConnectivityGraph;
use crate::mapping::NodePermutation;
use crate::pass::{Pass, PassKind, PassOutcome};
use crate::predicate::Predicate;

/// Drops unconditioned SWAPs that no later operation depends on and folds
/// them into the final map instead.
///
/// A SWAP is trailing when every later operation on either of its nodes is
/// itself a dropped SWAP.
#[derive(Default)]
pub struct ElideTrailingSwaps<'a> {
    graph: Option<&'a ConnectivityGraph>,
}

impl<'a> ElideTrailingSwaps<'a> {
    /// Create the pass.
    pub fn new() -> Self {
        Self { graph: None }
    }

    /// Check placement against `graph` before running.
    pub fn for_device(graph: &'a ConnectivityGraph) -> Self {
        Self { graph: Some(graph) }
    }
}

impl Pass for ElideTrailingSwaps<'_> {
    fn name(&self) -> &'static str {
        "ElideTrailingSwaps"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn preconditions(&self) -> Vec<Predicate> {
        vec![Predicate::Placed]
    }

    fn device(&self) -> Option<&ConnectivityGraph> {
        self.graph
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome> {
        let mut busy: FxHashSet<QubitRef> = FxHashSet::default();
        let mut dropped = vec![false; circuit.num_ops()];
        let mut permutation = NodePermutation::identity();

        for (i, op) in circuit.operations().iter().enumerate().rev() {
            let trailing = op.is_standard(&StandardGate::Swap)
                && op.condition.is_none()
                && op.qubits.iter().all(|q| !busy.contains(q));
            let nodes: Vec<_> = op.qubits.iter().filter_map(|q| q.node()).collect();
            match (trailing, nodes.as_slice()) {
                (true, &[a, b]) => {
                    // Walking backwards, so this composes the inverse of the
                    // dropped swaps.
                    permutation.swap(a, b);
                    dropped[i] = true;
                }
                _ => busy.extend(op.qubits.iter().copied()),
            }
        }

        let removed = dropped.iter().filter(|&&d| d).count();
        if removed > 0 {
            let ops = circuit
                .operations()
                .iter()
                .zip(&dropped)
                .filter(|&(_, &d)| !d)
                .map(|(op, _)| op.clone())
                .collect();
            circuit.replace_operations(ops)?;
        }
        debug!("Elided {} trailing swap(s)", removed);
        Ok(PassOutcome::permuted(permutation))
    }
}
