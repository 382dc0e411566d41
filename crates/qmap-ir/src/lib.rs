//! qmap Circuit Intermediate Representation
//!
//! This crate provides the data structures the placement and routing stage
//! operates on: identifiers for logical qubits, classical bits and physical
//! nodes, the gate set, and an ordered-operation [`Circuit`].
//!
//! # Qubit references
//!
//! Operations refer to qubits through [`QubitRef`], a tagged reference that
//! makes the placement state explicit:
//!
//! | Variant | Meaning |
//! |---------|---------|
//! | `Logical(QubitId)` | circuit as built, before placement |
//! | `Placed(Node)` | qubit lives on a physical node |
//! | `Unplaced(QubitId)` | placement ran but found no node for this qubit |
//!
//! # Example: Building a Bell State
//!
//! ```rust
//! use qmap_ir::{Circuit, ClbitId, QubitId};
//!
//! let mut circuit = Circuit::with_size("bell_state", 2, 2);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//! circuit.measure(QubitId(0), ClbitId(0)).unwrap();
//! circuit.measure(QubitId(1), ClbitId(1)).unwrap();
//!
//! assert_eq!(circuit.num_qubits(), 2);
//! assert_eq!(circuit.depth(), 3);
//! ```

pub mod circuit;
pub mod error;
pub mod gate;
pub mod operation;
pub mod qubit;

pub use circuit::Circuit;
pub use error::{IrError, IrResult};
pub use gate::{ClassicalCondition, CustomGate, Gate, StandardGate};
pub use operation::{OpKind, Operation};
pub use qubit::{ClbitId, Node, QubitId, QubitRef};
