//! Gate decomposition passes.

use tracing::debug;

use qmap_ir::{Circuit, ClassicalCondition, Operation, QubitRef, StandardGate};

use crate::error::{CompileError, CompileResult};
use crate::graph::ConnectivityGraph;
use crate::pass::{Pass, PassKind, PassOutcome, PostConditions};
use crate::predicate::Predicate;

/// Rewrite every operation for which `expand` returns a replacement.
///
/// The replacement inherits the classical condition of the original.
/// Returns the number of operations that were replaced.
fn rewrite(
    circuit: &mut Circuit,
    mut expand: impl FnMut(&Operation) -> CompileResult<Option<Vec<Operation>>>,
) -> CompileResult<usize> {
    let mut ops = Vec::with_capacity(circuit.num_ops());
    let mut replaced = 0;
    for op in circuit.operations() {
        match expand(op)? {
            Some(replacement) => {
                replaced += 1;
                ops.extend(conditioned(replacement, op.condition.as_ref()));
            }
            None => ops.push(op.clone()),
        }
    }
    if replaced > 0 {
        circuit.replace_operations(ops)?;
    }
    Ok(replaced)
}

fn conditioned(
    ops: Vec<Operation>,
    condition: Option<&ClassicalCondition>,
) -> impl Iterator<Item = Operation> + '_ {
    ops.into_iter().map(move |op| match condition {
        Some(c) => op.with_condition(c.clone()),
        None => op,
    })
}

fn one(gate: StandardGate, q: QubitRef) -> Operation {
    Operation::gate(gate, [q])
}

/// CX from `control` to `target`, flipped with Hadamards when the device
/// only prefers the opposite orientation.
fn oriented_cx(graph: Option<&ConnectivityGraph>, control: QubitRef, target: QubitRef) -> Vec<Operation> {
    let reversed = match (graph, control.node(), target.node()) {
        (Some(g), Some(c), Some(t)) => {
            g.is_directed() && !g.has_orientation(c, t) && g.has_orientation(t, c)
        }
        _ => false,
    };
    if !reversed {
        return vec![Operation::two_qubit_gate(StandardGate::CX, control, target)];
    }
    vec![
        one(StandardGate::H, control),
        one(StandardGate::H, target),
        Operation::two_qubit_gate(StandardGate::CX, target, control),
        one(StandardGate::H, control),
        one(StandardGate::H, target),
    ]
}

/// Toffoli as six CX and single-qubit Clifford+T gates.
fn ccx(a: QubitRef, b: QubitRef, t: QubitRef) -> Vec<Operation> {
    use StandardGate::{CX, H, T, Tdg};
    let cx = |c, t| Operation::two_qubit_gate(CX, c, t);
    vec![
        one(H, t),
        cx(b, t),
        one(Tdg, t),
        cx(a, t),
        one(T, t),
        cx(b, t),
        one(Tdg, t),
        cx(a, t),
        one(T, b),
        one(T, t),
        one(H, t),
        cx(a, b),
        one(T, a),
        one(Tdg, b),
        cx(a, b),
    ]
}

/// Rewrites CCX and CSWAP into gates on at most two qubits.
///
/// Other gates on three or more qubits, apart from BRIDGE, are rejected.
pub struct DecomposeMultiQubitGates;

impl Pass for DecomposeMultiQubitGates {
    fn name(&self) -> &'static str {
        "DecomposeMultiQubitGates"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn postconditions(&self) -> PostConditions {
        PostConditions::guarantees([Predicate::MaxTwoQubitGates])
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome> {
        let replaced = rewrite(circuit, |op| {
            if !op.is_gate() || op.qubits.len() <= 2 {
                return Ok(None);
            }
            match (op.standard_gate(), op.qubits.as_slice()) {
                (Some(StandardGate::Bridge), _) => Ok(None),
                (Some(StandardGate::CCX), &[a, b, t]) => Ok(Some(ccx(a, b, t))),
                (Some(StandardGate::CSwap), &[c, a, b]) => {
                    let mut ops = vec![Operation::two_qubit_gate(StandardGate::CX, b, a)];
                    ops.extend(ccx(c, a, b));
                    ops.push(Operation::two_qubit_gate(StandardGate::CX, b, a));
                    Ok(Some(ops))
                }
                _ => Err(CompileError::UnsupportedOperation {
                    name: op.name().to_string(),
                    arity: op.qubits.len(),
                }),
            }
        })?;
        debug!("Decomposed {} multi-qubit gate(s)", replaced);
        Ok(PassOutcome::unchanged())
    }

    fn should_run(&self, circuit: &Circuit) -> bool {
        !Predicate::MaxTwoQubitGates.holds(circuit, None)
    }
}

/// Rewrites SWAP as three CX.
///
/// With a directed device, every CX follows a preferred orientation.
#[derive(Default)]
pub struct DecomposeSwapsToCx<'a> {
    graph: Option<&'a ConnectivityGraph>,
}

impl<'a> DecomposeSwapsToCx<'a> {
    /// Decompose without orientation constraints.
    pub fn new() -> Self {
        Self { graph: None }
    }

    /// Decompose following the preferred orientations of `graph`.
    pub fn for_device(graph: &'a ConnectivityGraph) -> Self {
        Self { graph: Some(graph) }
    }
}

impl Pass for DecomposeSwapsToCx<'_> {
    fn name(&self) -> &'static str {
        "DecomposeSwapsToCx"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn postconditions(&self) -> PostConditions {
        let post = PostConditions::guarantees([Predicate::NoSwaps]);
        if self.graph.is_some() {
            post
        } else {
            post.invalidating([Predicate::DirectedConnectivity])
        }
    }

    fn device(&self) -> Option<&ConnectivityGraph> {
        self.graph
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome> {
        let replaced = rewrite(circuit, |op| {
            if !op.is_standard(&StandardGate::Swap) {
                return Ok(None);
            }
            let (a, b) = (op.qubits[0], op.qubits[1]);
            let mut ops = oriented_cx(self.graph, a, b);
            ops.extend(oriented_cx(self.graph, b, a));
            ops.extend(oriented_cx(self.graph, a, b));
            Ok(Some(ops))
        })?;
        debug!("Decomposed {} swap(s)", replaced);
        Ok(PassOutcome::unchanged())
    }

    fn should_run(&self, circuit: &Circuit) -> bool {
        !Predicate::NoSwaps.holds(circuit, None)
    }
}

/// Rewrites BRIDGE(c, m, t) as CX(c,m) CX(m,t) CX(c,m) CX(m,t).
#[derive(Default)]
pub struct DecomposeBridges<'a> {
    graph: Option<&'a ConnectivityGraph>,
}

impl<'a> DecomposeBridges<'a> {
    /// Decompose without orientation constraints.
    pub fn new() -> Self {
        Self { graph: None }
    }

    /// Decompose following the preferred orientations of `graph`.
    pub fn for_device(graph: &'a ConnectivityGraph) -> Self {
        Self { graph: Some(graph) }
    }
}

impl Pass for DecomposeBridges<'_> {
    fn name(&self) -> &'static str {
        "DecomposeBridges"
    }

    fn kind(&self) -> PassKind {
        PassKind::Transformation
    }

    fn postconditions(&self) -> PostConditions {
        PostConditions::guarantees([Predicate::NoBridges])
    }

    fn device(&self) -> Option<&ConnectivityGraph> {
        self.graph
    }

    fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome> {
        let replaced = rewrite(circuit, |op| {
            if !op.is_standard(&StandardGate::Bridge) {
                return Ok(None);
            }
            let (c, m, t) = (op.qubits[0], op.qubits[1], op.qubits[2]);
            let mut ops = Vec::with_capacity(4);
            for _ in 0..2 {
                ops.extend(oriented_cx(self.graph, c, m));
                ops.extend(oriented_cx(self.graph, m, t));
            }
            Ok(Some(ops))
        })?;
        debug!("Decomposed {} bridge(s)", replaced);
        Ok(PassOutcome::unchanged())
    }

    fn should_run(&self, circuit: &Circuit) -> bool {
        !Predicate::NoBridges.holds(circuit, None)
    }
}
