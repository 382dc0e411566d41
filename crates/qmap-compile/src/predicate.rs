//! Circuit predicates used as pass pre- and postconditions.

use std::fmt;

use serde::{Deserialize, Serialize};

use qmap_ir::{Circuit, Node, Operation, QubitRef, StandardGate};

use crate::error::{CompileError, CompileResult};
use crate::graph::ConnectivityGraph;

/// A property a circuit may satisfy with respect to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    /// Every declared qubit is a node of the device.
    Placed,
    /// Every two-qubit gate acts on adjacent nodes and every BRIDGE acts on a
    /// path. Barriers are exempt.
    Connectivity,
    /// [`Predicate::Connectivity`], and on directed devices every oriented
    /// gate follows a preferred edge orientation.
    DirectedConnectivity,
    /// No gate acts on more than two qubits, except BRIDGE.
    MaxTwoQubitGates,
    /// The circuit contains no BRIDGE gate.
    NoBridges,
    /// The circuit contains no SWAP gate.
    NoSwaps,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Predicate::Placed => "Placed",
            Predicate::Connectivity => "Connectivity",
            Predicate::DirectedConnectivity => "DirectedConnectivity",
            Predicate::MaxTwoQubitGates => "MaxTwoQubitGates",
            Predicate::NoBridges => "NoBridges",
            Predicate::NoSwaps => "NoSwaps",
        };
        f.write_str(name)
    }
}

impl Predicate {
    /// Every predicate.
    pub const ALL: [Predicate; 6] = [
        Predicate::Placed,
        Predicate::Connectivity,
        Predicate::DirectedConnectivity,
        Predicate::MaxTwoQubitGates,
        Predicate::NoBridges,
        Predicate::NoSwaps,
    ];

    /// Predicates that hold whenever this one does, including itself.
    pub fn implied(self) -> &'static [Predicate] {
        match self {
            Predicate::DirectedConnectivity => &[
                Predicate::DirectedConnectivity,
                Predicate::Connectivity,
                Predicate::MaxTwoQubitGates,
            ],
            Predicate::Connectivity => &[Predicate::Connectivity, Predicate::MaxTwoQubitGates],
            Predicate::Placed => &[Predicate::Placed],
            Predicate::MaxTwoQubitGates => &[Predicate::MaxTwoQubitGates],
            Predicate::NoBridges => &[Predicate::NoBridges],
            Predicate::NoSwaps => &[Predicate::NoSwaps],
        }
    }

    /// Check if evaluating this predicate needs a device.
    pub fn needs_device(self) -> bool {
        matches!(
            self,
            Predicate::Connectivity | Predicate::DirectedConnectivity
        )
    }

    /// Check if the predicate holds.
    pub fn holds(self, circuit: &Circuit, device: Option<&ConnectivityGraph>) -> bool {
        self.check(circuit, device).is_ok()
    }

    /// Check the predicate, describing the first violation.
    ///
    /// Without a device, [`Predicate::Placed`] only checks that every
    /// reference is placed, and the connectivity predicates fail.
    pub fn check(self, circuit: &Circuit, device: Option<&ConnectivityGraph>) -> CompileResult<()> {
        let fail = |reason: String| {
            Err(CompileError::PredicateFailed {
                predicate: self,
                reason,
            })
        };

        match self {
            Predicate::Placed => {
                for &q in circuit.qubits() {
                    match (q, device) {
                        (QubitRef::Placed(n), Some(graph)) if !graph.contains(n) => {
                            return fail(format!("{n} is not a device node"));
                        }
                        (QubitRef::Placed(_), _) => {}
                        (other, _) => return fail(format!("{other} is not placed")),
                    }
                }
                Ok(())
            }
            Predicate::Connectivity | Predicate::DirectedConnectivity => {
                let Some(graph) = device else {
                    return fail("no device to check against".to_string());
                };
                let directed = self == Predicate::DirectedConnectivity && graph.is_directed();
                for (i, op) in circuit.operations().iter().enumerate() {
                    if let Err(reason) = check_operation(op, graph, directed) {
                        return fail(format!("operation {i} ({}): {reason}", op.name()));
                    }
                }
                Ok(())
            }
            Predicate::MaxTwoQubitGates => {
                for (i, op) in circuit.operations().iter().enumerate() {
                    if op.is_gate() && op.qubits.len() > 2 && !op.is_standard(&StandardGate::Bridge) {
                        return fail(format!(
                            "operation {i} ({}) acts on {} qubits",
                            op.name(),
                            op.qubits.len()
                        ));
                    }
                }
                Ok(())
            }
            Predicate::NoBridges => match position_of(circuit, &StandardGate::Bridge) {
                Some(i) => fail(format!("operation {i} is a bridge")),
                None => Ok(()),
            },
            Predicate::NoSwaps => match position_of(circuit, &StandardGate::Swap) {
                Some(i) => fail(format!("operation {i} is a swap")),
                None => Ok(()),
            },
        }
    }
}

fn position_of(circuit: &Circuit, gate: &StandardGate) -> Option<usize> {
    circuit.operations().iter().position(|op| op.is_standard(gate))
}

fn placed_nodes(op: &Operation) -> Result<Vec<Node>, String> {
    op.qubits
        .iter()
        .map(|q| q.node().ok_or_else(|| format!("{q} is not placed")))
        .collect()
}

/// Check one operation against the device.
fn check_operation(op: &Operation, graph: &ConnectivityGraph, directed: bool) -> Result<(), String> {
    if !op.is_multi_qubit_gate() {
        return Ok(());
    }
    let nodes = placed_nodes(op)?;
    let oriented = op.standard_gate().is_some_and(StandardGate::is_oriented);

    match nodes.as_slice() {
        &[a, b] => {
            if !graph.are_adjacent(a, b) {
                return Err(format!("{a} and {b} are not adjacent"));
            }
            if directed && oriented && !graph.has_orientation(a, b) {
                return Err(format!("{a} -> {b} is not a preferred orientation"));
            }
            Ok(())
        }
        &[c, m, t] if op.is_standard(&StandardGate::Bridge) => {
            if !graph.are_adjacent(c, m) || !graph.are_adjacent(m, t) {
                return Err(format!("{c}, {m}, {t} is not a path"));
            }
            if directed && !(graph.has_orientation(c, m) && graph.has_orientation(m, t)) {
                return Err(format!("{c} -> {m} -> {t} is not a preferred orientation"));
            }
            Ok(())
        }
        _ => Err(format!("gate acts on {} qubits", nodes.len())),
    }
}
