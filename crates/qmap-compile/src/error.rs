//! Error types for the compilation crate.

use qmap_ir::{IrError, Node, QubitId};
use thiserror::Error;

use crate::predicate::Predicate;

/// Errors that can occur during placement, routing and pass management.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// Error from the IR crate.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// No path connects the two nodes in the connectivity graph.
    #[error("No path between {from} and {to} in the connectivity graph")]
    NoPath { from: Node, to: Node },

    /// Routing cannot bring two qubits together because their nodes lie in
    /// different components of the connectivity graph.
    #[error("Unroutable circuit: {from} and {to} must interact but are not connected")]
    UnroutableCircuit { from: Node, to: Node },

    /// A qubit mapping violates injectivity.
    #[error("Invalid qubit mapping: {0}")]
    InvalidMapping(String),

    /// A node is not part of the connectivity graph.
    #[error("{0} is not part of the connectivity graph")]
    UnknownNode(Node),

    /// Circuit has more qubits than the device has nodes.
    #[error("Circuit requires {required} qubits but target only has {available}")]
    CircuitTooLarge { required: usize, available: usize },

    /// Placement was asked to place a circuit that no longer refers to
    /// logical qubits.
    #[error("Circuit is already placed: found {0}")]
    AlreadyPlaced(String),

    /// Routing does not support this operation.
    #[error("Unsupported operation '{name}' on {arity} qubits")]
    UnsupportedOperation { name: String, arity: usize },

    /// A predicate does not hold for the circuit.
    #[error("Predicate {predicate} failed: {reason}")]
    PredicateFailed { predicate: Predicate, reason: String },

    /// A pass was applied to a unit that does not satisfy its preconditions.
    #[error("Pass '{pass}' requires {predicate}: {reason}")]
    PreconditionFailed {
        pass: String,
        predicate: Predicate,
        reason: String,
    },

    /// A pass sequence where a pass's preconditions are not guaranteed by
    /// the passes before it.
    #[error("Pass '{pass}' requires {predicate}, which no earlier pass guarantees")]
    IncompatiblePasses { pass: String, predicate: Predicate },

    /// A logical qubit the unit does not know about.
    #[error("Logical qubit {0} is not part of the compilation unit")]
    UnknownQubit(QubitId),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;
