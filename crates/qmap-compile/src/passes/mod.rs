//! Built-in compilation passes.
//!
//! - [`PlacementPass`] and [`RoutingPass`] move logical qubits onto a device
//! - [`DecomposeMultiQubitGates`], [`DecomposeSwapsToCx`] and
//!   [`DecomposeBridges`] rewrite gates into smaller ones
//! - [`ElideTrailingSwaps`] folds SWAPs at the end of the circuit into the
//!   final map
//! - [`VerifyPredicates`] checks predicates without changing anything

mod decompose;
mod elide;
mod placement;
mod routing;
mod verify;

pub use decompose::{DecomposeBridges, DecomposeMultiQubitGates, DecomposeSwapsToCx};
pub use elide::ElideTrailingSwaps;
pub use placement::PlacementPass;
pub use routing::RoutingPass;
pub use verify::VerifyPredicates;
