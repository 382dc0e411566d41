//! Circuit operations combining an operation kind with its operands.

use serde::{Deserialize, Serialize};

use crate::gate::{ClassicalCondition, Gate, StandardGate};
use crate::qubit::{ClbitId, QubitRef};

/// The kind of operation in a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpKind {
    /// A quantum gate.
    Gate(Gate),
    /// Measurement of each qubit into the matching classical bit.
    Measure,
    /// Reset qubit to |0⟩.
    Reset,
    /// Barrier (synchronization point). Never an interaction.
    Barrier,
}

/// A complete operation with operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// The kind of operation.
    pub kind: OpKind,
    /// Qubits this operation acts on, in gate-argument order.
    pub qubits: Vec<QubitRef>,
    /// Classical bits this operation writes (for measure).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clbits: Vec<ClbitId>,
    /// Optional classical condition.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ClassicalCondition>,
}

impl Operation {
    /// Create a gate operation.
    pub fn gate(gate: impl Into<Gate>, qubits: impl IntoIterator<Item = impl Into<QubitRef>>) -> Self {
        Self {
            kind: OpKind::Gate(gate.into()),
            qubits: qubits.into_iter().map(Into::into).collect(),
            clbits: vec![],
            condition: None,
        }
    }

    /// Create a two-qubit standard gate operation.
    pub fn two_qubit_gate(
        gate: StandardGate,
        q1: impl Into<QubitRef>,
        q2: impl Into<QubitRef>,
    ) -> Self {
        Self::gate(gate, [q1.into(), q2.into()])
    }

    /// Create a SWAP between two qubits.
    pub fn swap(q1: impl Into<QubitRef>, q2: impl Into<QubitRef>) -> Self {
        Self::two_qubit_gate(StandardGate::Swap, q1, q2)
    }

    /// Create a BRIDGE from `control` to `target` through `middle`.
    pub fn bridge(
        control: impl Into<QubitRef>,
        middle: impl Into<QubitRef>,
        target: impl Into<QubitRef>,
    ) -> Self {
        Self::gate(
            StandardGate::Bridge,
            [control.into(), middle.into(), target.into()],
        )
    }

    /// Create a measurement operation.
    pub fn measure(qubit: impl Into<QubitRef>, clbit: ClbitId) -> Self {
        Self {
            kind: OpKind::Measure,
            qubits: vec![qubit.into()],
            clbits: vec![clbit],
            condition: None,
        }
    }

    /// Create a reset operation.
    pub fn reset(qubit: impl Into<QubitRef>) -> Self {
        Self {
            kind: OpKind::Reset,
            qubits: vec![qubit.into()],
            clbits: vec![],
            condition: None,
        }
    }

    /// Create a barrier operation.
    pub fn barrier(qubits: impl IntoIterator<Item = impl Into<QubitRef>>) -> Self {
        Self {
            kind: OpKind::Barrier,
            qubits: qubits.into_iter().map(Into::into).collect(),
            clbits: vec![],
            condition: None,
        }
    }

    /// Attach a classical condition.
    #[must_use]
    pub fn with_condition(mut self, condition: ClassicalCondition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Check if this is a gate operation.
    pub fn is_gate(&self) -> bool {
        matches!(self.kind, OpKind::Gate(_))
    }

    /// Check if this is a measurement.
    pub fn is_measure(&self) -> bool {
        matches!(self.kind, OpKind::Measure)
    }

    /// Check if this is a barrier.
    pub fn is_barrier(&self) -> bool {
        matches!(self.kind, OpKind::Barrier)
    }

    /// Get the gate if this is a gate operation.
    pub fn as_gate(&self) -> Option<&Gate> {
        match &self.kind {
            OpKind::Gate(g) => Some(g),
            _ => None,
        }
    }

    /// Get the standard gate if this is a standard gate operation.
    pub fn standard_gate(&self) -> Option<&StandardGate> {
        self.as_gate().and_then(Gate::as_standard)
    }

    /// Check if this operation is the given standard gate (ignoring parameters).
    pub fn is_standard(&self, gate: &StandardGate) -> bool {
        self.standard_gate()
            .is_some_and(|g| std::mem::discriminant(g) == std::mem::discriminant(gate))
    }

    /// Check if this operation is a gate that couples two or more qubits.
    ///
    /// Barriers span several qubits but never count as an interaction.
    pub fn is_multi_qubit_gate(&self) -> bool {
        self.is_gate() && self.qubits.len() >= 2
    }

    /// Get the name of the operation.
    pub fn name(&self) -> &str {
        match &self.kind {
            OpKind::Gate(g) => g.name(),
            OpKind::Measure => "measure",
            OpKind::Reset => "reset",
            OpKind::Barrier => "barrier",
        }
    }

    /// Rewrite every qubit reference through `f`.
    pub fn map_qubits(&mut self, mut f: impl FnMut(QubitRef) -> QubitRef) {
        for q in &mut self.qubits {
            *q = f(*q);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qubit::{Node, QubitId};

    #[test]
    fn test_gate_operation() {
        let op = Operation::gate(StandardGate::H, [QubitId(0)]);
        assert!(op.is_gate());
        assert!(!op.is_multi_qubit_gate());
        assert_eq!(op.name(), "h");
        assert_eq!(op.qubits, vec![QubitRef::Logical(QubitId(0))]);
    }

    #[test]
    fn test_barrier_is_not_interaction() {
        let op = Operation::barrier([QubitId(0), QubitId(1), QubitId(2)]);
        assert!(op.is_barrier());
        assert!(!op.is_multi_qubit_gate());
        assert_eq!(op.qubits.len(), 3);
    }

    #[test]
    fn test_bridge_operands() {
        let op = Operation::bridge(Node(0), Node(1), Node(2));
        assert!(op.is_standard(&StandardGate::Bridge));
        assert!(op.is_multi_qubit_gate());
        assert_eq!(op.qubits[1], QubitRef::Placed(Node(1)));
    }

    #[test]
    fn test_is_standard_ignores_params() {
        let op = Operation::two_qubit_gate(StandardGate::CRz(0.3), QubitId(0), QubitId(1));
        assert!(op.is_standard(&StandardGate::CRz(1.0)));
        assert!(!op.is_standard(&StandardGate::CX));
    }

    #[test]
    fn test_map_qubits() {
        let mut op = Operation::swap(QubitId(0), QubitId(1));
        op.map_qubits(|q| match q {
            QubitRef::Logical(QubitId(i)) => QubitRef::Placed(Node(i + 10)),
            other => other,
        });
        assert_eq!(
            op.qubits,
            vec![QubitRef::Placed(Node(10)), QubitRef::Placed(Node(11))]
        );
    }
}
