//! Ordered-operation circuit with a builder API.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::{ClassicalCondition, Gate, StandardGate};
use crate::operation::{OpKind, Operation};
use crate::qubit::{ClbitId, Node, QubitId, QubitRef};

/// A quantum circuit: declared qubits and classical bits plus an ordered
/// sequence of operations over them.
///
/// Every operation is validated on insertion, so a `Circuit` only ever holds
/// operations on declared, pairwise-distinct qubits with the arity their gate
/// expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CircuitSpec")]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Qubits in the circuit, in declaration order.
    qubits: Vec<QubitRef>,
    /// Classical bits in the circuit, in declaration order.
    clbits: Vec<ClbitId>,
    /// Operations in program order.
    ops: Vec<Operation>,
}

/// Unvalidated wire form of a [`Circuit`].
#[derive(Deserialize)]
struct CircuitSpec {
    #[serde(default = "default_name")]
    name: String,
    qubits: Vec<QubitRef>,
    #[serde(default)]
    clbits: Vec<ClbitId>,
    #[serde(default)]
    ops: Vec<Operation>,
}

fn default_name() -> String {
    "circuit".to_string()
}

impl TryFrom<CircuitSpec> for Circuit {
    type Error = IrError;

    fn try_from(spec: CircuitSpec) -> IrResult<Self> {
        Circuit::from_parts(spec.name, spec.qubits, spec.clbits, spec.ops)
    }
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            qubits: vec![],
            clbits: vec![],
            ops: vec![],
        }
    }

    /// Create a circuit with `num_qubits` logical qubits and `num_clbits`
    /// classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        let mut circuit = Self::new(name);
        circuit.qubits = (0..num_qubits)
            .map(|i| QubitRef::Logical(QubitId(i)))
            .collect();
        circuit.clbits = (0..num_clbits).map(ClbitId).collect();
        circuit
    }

    /// Create a circuit whose qubits are the given physical nodes.
    pub fn on_nodes(name: impl Into<String>, nodes: impl IntoIterator<Item = Node>) -> IrResult<Self> {
        let mut circuit = Self::new(name);
        for node in nodes {
            circuit.add_qubit(QubitRef::Placed(node))?;
        }
        Ok(circuit)
    }

    /// Build a circuit from its parts, validating every operation.
    pub fn from_parts(
        name: impl Into<String>,
        qubits: Vec<QubitRef>,
        clbits: Vec<ClbitId>,
        ops: Vec<Operation>,
    ) -> IrResult<Self> {
        let mut circuit = Self::new(name);
        for q in qubits {
            circuit.add_qubit(q)?;
        }
        for c in clbits {
            circuit.add_clbit(c);
        }
        for op in ops {
            circuit.apply(op)?;
        }
        Ok(circuit)
    }

    /// Declare a qubit.
    pub fn add_qubit(&mut self, qubit: impl Into<QubitRef>) -> IrResult<()> {
        let qubit = qubit.into();
        if self.qubits.contains(&qubit) {
            return Err(IrError::DuplicateWire(qubit));
        }
        self.qubits.push(qubit);
        Ok(())
    }

    /// Declare a classical bit. Declaring an existing bit is a no-op.
    pub fn add_clbit(&mut self, clbit: ClbitId) {
        if !self.clbits.contains(&clbit) {
            self.clbits.push(clbit);
        }
    }

    /// Append an operation after validating its operands.
    pub fn apply(&mut self, op: Operation) -> IrResult<&mut Self> {
        self.validate_operation(&op)?;
        self.ops.push(op);
        Ok(self)
    }

    fn validate_operation(&self, op: &Operation) -> IrResult<()> {
        let gate_name = || Some(op.name().to_string());

        let mut seen = FxHashSet::default();
        for &q in &op.qubits {
            if !self.qubits.contains(&q) {
                return Err(IrError::QubitNotFound {
                    qubit: q,
                    gate_name: gate_name(),
                });
            }
            if !seen.insert(q) {
                return Err(IrError::DuplicateQubit {
                    qubit: q,
                    gate_name: gate_name(),
                });
            }
        }

        let condition_bits = op.condition.iter().flat_map(|c| c.bits.iter());
        for &c in op.clbits.iter().chain(condition_bits) {
            if !self.clbits.contains(&c) {
                return Err(IrError::ClbitNotFound {
                    clbit: c,
                    gate_name: gate_name(),
                });
            }
        }

        match &op.kind {
            OpKind::Gate(gate) => {
                let expected = gate.num_qubits();
                let got = op.qubits.len() as u32;
                if expected != got {
                    return Err(IrError::QubitCountMismatch {
                        gate_name: gate.name().to_string(),
                        expected,
                        got,
                    });
                }
            }
            OpKind::Measure => {
                if op.qubits.len() != op.clbits.len() {
                    return Err(IrError::MeasureArity {
                        qubits: op.qubits.len(),
                        clbits: op.clbits.len(),
                    });
                }
            }
            OpKind::Reset | OpKind::Barrier => {}
        }
        Ok(())
    }

    // =========================================================================
    // Gate helpers
    // =========================================================================

    /// Apply a gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = impl Into<QubitRef>>,
    ) -> IrResult<&mut Self> {
        self.apply(Operation::gate(gate, qubits))
    }

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: impl Into<QubitRef>) -> IrResult<&mut Self> {
        self.gate(StandardGate::H, [qubit.into()])
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: impl Into<QubitRef>) -> IrResult<&mut Self> {
        self.gate(StandardGate::X, [qubit.into()])
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: impl Into<QubitRef>) -> IrResult<&mut Self> {
        self.gate(StandardGate::T, [qubit.into()])
    }

    /// Apply Rz rotation gate.
    pub fn rz(&mut self, theta: f64, qubit: impl Into<QubitRef>) -> IrResult<&mut Self> {
        self.gate(StandardGate::Rz(theta), [qubit.into()])
    }

    /// Apply CNOT (CX) gate.
    pub fn cx(
        &mut self,
        control: impl Into<QubitRef>,
        target: impl Into<QubitRef>,
    ) -> IrResult<&mut Self> {
        self.apply(Operation::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, q1: impl Into<QubitRef>, q2: impl Into<QubitRef>) -> IrResult<&mut Self> {
        self.apply(Operation::two_qubit_gate(StandardGate::CZ, q1, q2))
    }

    /// Apply controlled-phase gate.
    pub fn cp(
        &mut self,
        theta: f64,
        control: impl Into<QubitRef>,
        target: impl Into<QubitRef>,
    ) -> IrResult<&mut Self> {
        self.apply(Operation::two_qubit_gate(
            StandardGate::CP(theta),
            control,
            target,
        ))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: impl Into<QubitRef>, q2: impl Into<QubitRef>) -> IrResult<&mut Self> {
        self.apply(Operation::swap(q1, q2))
    }

    /// Apply Toffoli (CCX) gate.
    pub fn ccx(
        &mut self,
        c1: impl Into<QubitRef>,
        c2: impl Into<QubitRef>,
        target: impl Into<QubitRef>,
    ) -> IrResult<&mut Self> {
        self.gate(StandardGate::CCX, [c1.into(), c2.into(), target.into()])
    }

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: impl Into<QubitRef>, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Operation::measure(qubit, clbit))
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: impl Into<QubitRef>) -> IrResult<&mut Self> {
        self.apply(Operation::reset(qubit))
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(
        &mut self,
        qubits: impl IntoIterator<Item = impl Into<QubitRef>>,
    ) -> IrResult<&mut Self> {
        self.apply(Operation::barrier(qubits))
    }

    /// Apply a gate only if the classical condition holds.
    pub fn conditional(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = impl Into<QubitRef>>,
        condition: ClassicalCondition,
    ) -> IrResult<&mut Self> {
        self.apply(Operation::gate(gate, qubits).with_condition(condition))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the declared qubits.
    pub fn qubits(&self) -> &[QubitRef] {
        &self.qubits
    }

    /// Get the declared classical bits.
    pub fn clbits(&self) -> &[ClbitId] {
        &self.clbits
    }

    /// Get the operations in program order.
    pub fn operations(&self) -> &[Operation] {
        &self.ops
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.qubits.len()
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.clbits.len()
    }

    /// Get the number of operations.
    pub fn num_ops(&self) -> usize {
        self.ops.len()
    }

    /// Count the operations with the given name.
    pub fn count_ops(&self, name: &str) -> usize {
        self.ops.iter().filter(|op| op.name() == name).count()
    }

    /// Count gates acting on two or more qubits.
    pub fn num_multi_qubit_gates(&self) -> usize {
        self.ops.iter().filter(|op| op.is_multi_qubit_gate()).count()
    }

    /// The distinct qubit references used by at least one operation.
    pub fn active_qubits(&self) -> FxHashSet<QubitRef> {
        self.ops.iter().flat_map(|op| op.qubits.iter().copied()).collect()
    }

    /// ASAP layer index of every operation.
    ///
    /// An operation sits one layer after the latest operation sharing a
    /// qubit or a classical bit with it (including bits read by a condition).
    pub fn layers(&self) -> Vec<usize> {
        let mut qubit_front: FxHashMap<QubitRef, usize> = FxHashMap::default();
        let mut clbit_front: FxHashMap<ClbitId, usize> = FxHashMap::default();
        let mut layers = Vec::with_capacity(self.ops.len());

        for op in &self.ops {
            let condition_bits = op.condition.iter().flat_map(|c| c.bits.iter());
            let clbits: Vec<ClbitId> = op.clbits.iter().chain(condition_bits).copied().collect();

            let layer = op
                .qubits
                .iter()
                .map(|q| qubit_front.get(q).copied().unwrap_or(0))
                .chain(clbits.iter().map(|c| clbit_front.get(c).copied().unwrap_or(0)))
                .max()
                .unwrap_or(0);

            for &q in &op.qubits {
                qubit_front.insert(q, layer + 1);
            }
            for c in clbits {
                clbit_front.insert(c, layer + 1);
            }
            layers.push(layer);
        }
        layers
    }

    /// Get the circuit depth.
    pub fn depth(&self) -> usize {
        self.layers().iter().map(|l| l + 1).max().unwrap_or(0)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Rename every qubit reference, in the declarations and in every
    /// operation. The renaming must be injective over the declared qubits.
    pub fn rename_qubits(&mut self, mut f: impl FnMut(QubitRef) -> QubitRef) -> IrResult<()> {
        let mut renamed = Vec::with_capacity(self.qubits.len());
        let mut seen = FxHashSet::default();
        let mut lookup = FxHashMap::default();
        for &q in &self.qubits {
            let new = f(q);
            if !seen.insert(new) {
                return Err(IrError::DuplicateWire(new));
            }
            lookup.insert(q, new);
            renamed.push(new);
        }
        self.qubits = renamed;
        for op in &mut self.ops {
            op.map_qubits(|q| lookup.get(&q).copied().unwrap_or(q));
        }
        Ok(())
    }

    /// Replace the declared qubits and operations, validating the result.
    ///
    /// On error the circuit is left unchanged.
    pub fn replace(&mut self, qubits: Vec<QubitRef>, ops: Vec<Operation>) -> IrResult<()> {
        let rebuilt = Self::from_parts(self.name.clone(), qubits, self.clbits.clone(), ops)?;
        *self = rebuilt;
        Ok(())
    }

    /// Replace the operations, keeping the declared wires.
    pub fn replace_operations(&mut self, ops: Vec<Operation>) -> IrResult<()> {
        self.replace(self.qubits.clone(), ops)
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure(QubitId(0), ClbitId(0))?
            .measure(QubitId(1), ClbitId(1))?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit.
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, n);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        for i in 0..n {
            circuit.measure(QubitId(i), ClbitId(i))?;
        }
        Ok(circuit)
    }

    /// Create a QFT circuit (without measurements), including the final
    /// bit-reversal swaps.
    pub fn qft(n: u32) -> IrResult<Self> {
        use std::f64::consts::PI;

        let mut circuit = Self::with_size("qft", n, 0);
        for i in 0..n {
            circuit.h(QubitId(i))?;
            for j in (i + 1)..n {
                let angle = PI / f64::from(1u32 << (j - i).min(31));
                circuit.cp(angle, QubitId(j), QubitId(i))?;
            }
        }
        for i in 0..n / 2 {
            circuit.swap(QubitId(i), QubitId(n - 1 - i))?;
        }
        Ok(circuit)
    }
}
