//! Qubit placement and routing for connectivity-constrained devices.
//!
//! A device is described by a [`ConnectivityGraph`]: nodes are physical
//! qubits and edges are the pairs a two-qubit gate may act on. This crate
//! takes a circuit written against logical qubits and produces an equivalent
//! circuit in which every two-qubit gate acts on adjacent nodes.
//!
//! # Overview
//!
//! 1. **Placement** ([`Placer`]): choose an initial node for each logical
//!    qubit by matching the circuit's interaction graph onto the device
//! 2. **Routing** ([`Router`]): walk the circuit in order and insert SWAPs
//!    (or BRIDGEs) in front of gates whose qubits are not adjacent
//! 3. **Bookkeeping** ([`CompilationUnit`]): track where each logical qubit
//!    starts and ends as passes rearrange them
//!
//! # Architecture
//!
//! ```text
//! Logical circuit
//!       |
//!       v
//! +-------------+
//! | PassManager | <-- ConnectivityGraph, CompilerConfig
//! +-------------+
//!       |
//!       |-- DecomposeMultiQubitGates
//!       |-- PlacementPass
//!       |-- RoutingPass
//!       |-- ElideTrailingSwaps / DecomposeBridges / DecomposeSwapsToCx
//!       `-- VerifyPredicates
//!       |
//!       v
//! CompilationUnit (routed circuit, initial_map, final_map)
//! ```
//!
//! Every pass declares the [`Predicate`]s it needs and the ones it
//! establishes or breaks, so a [`PassManager`] refuses pass orders that
//! cannot work before running anything.
//!
//! # Example
//!
//! ```rust
//! use qmap_compile::{CompilationUnit, ConnectivityGraph, PassManagerBuilder, PlacementState};
//! use qmap_ir::{Circuit, QubitId};
//!
//! let device = ConnectivityGraph::ring(4);
//!
//! let mut circuit = Circuit::with_size("example", 4, 0);
//! circuit.h(QubitId(0)).unwrap();
//! circuit.cx(QubitId(0), QubitId(2)).unwrap();
//! circuit.cx(QubitId(1), QubitId(3)).unwrap();
//! circuit.cx(QubitId(0), QubitId(1)).unwrap();
//!
//! let pm = PassManagerBuilder::new(&device).build().unwrap();
//! let mut unit = CompilationUnit::new(circuit);
//! pm.run(&mut unit).unwrap();
//!
//! assert_eq!(unit.state(), PlacementState::Routed);
//! println!("{} -> {}", unit.initial_map(), unit.final_map());
//! ```
//!
//! # Custom Passes
//!
//! Implement the [`Pass`] trait to add passes of your own:
//!
//! ```rust
//! use qmap_compile::{CompileResult, Pass, PassKind, PassOutcome};
//! use qmap_ir::Circuit;
//!
//! struct CountGates;
//!
//! impl Pass for CountGates {
//!     fn name(&self) -> &str { "count_gates" }
//!     fn kind(&self) -> PassKind { PassKind::Analysis }
//!
//!     fn run(&self, circuit: &mut Circuit) -> CompileResult<PassOutcome> {
//!         println!("{} operations", circuit.num_ops());
//!         Ok(PassOutcome::unchanged())
//!     }
//! }
//! ```

pub mod config;
pub mod device;
pub mod error;
pub mod graph;
pub mod interaction;
pub mod manager;
pub mod mapping;
pub mod pass;
pub mod placement;
pub mod predicate;
pub mod routing;
pub mod unit;

// Built-in passes
pub mod passes;

pub use config::{CompilerConfig, PlacementConfig, PlacementStrategy, RoutingConfig};
pub use device::DeviceCharacterization;
pub use error::{CompileError, CompileResult};
pub use graph::ConnectivityGraph;
pub use interaction::InteractionGraph;
pub use manager::{PassManager, PassManagerBuilder, SequencePass};
pub use mapping::{NodePermutation, QubitMapping};
pub use pass::{Pass, PassKind, PassOutcome, PostConditions};
pub use placement::{PlacementReport, PlacementStatus, Placer, apply_placement, place};
pub use predicate::Predicate;
pub use routing::{Router, RoutingReport, route};
pub use unit::{CompilationUnit, PlacementState};
