//! Qubit, classical bit and physical node identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a logical qubit within a circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Unique identifier for a classical bit within a circuit.
///
/// Classical bits are never renamed by placement or routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

/// A physical qubit location on a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Node(pub u32);

impl Node {
    /// The numeric index of this node.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node[{}]", self.0)
    }
}

impl From<u32> for Node {
    fn from(id: u32) -> Self {
        Node(id)
    }
}

/// The qubit an operation acts on.
///
/// Circuits start out referring to [`QubitRef::Logical`] qubits. Placement
/// rewrites each reference either to the node it was assigned
/// ([`QubitRef::Placed`]) or, when no node was found, to
/// [`QubitRef::Unplaced`]. Routing resolves the remainder so that a routed
/// circuit only contains placed references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QubitRef {
    /// A logical qubit that has not been through placement.
    Logical(QubitId),
    /// A qubit living on a physical node.
    Placed(Node),
    /// A logical qubit that placement could not assign.
    Unplaced(QubitId),
}

impl QubitRef {
    /// The node, if this reference is placed.
    #[inline]
    pub fn node(self) -> Option<Node> {
        match self {
            QubitRef::Placed(n) => Some(n),
            QubitRef::Logical(_) | QubitRef::Unplaced(_) => None,
        }
    }

    /// The logical qubit, if this reference has not been placed.
    #[inline]
    pub fn logical(self) -> Option<QubitId> {
        match self {
            QubitRef::Logical(q) | QubitRef::Unplaced(q) => Some(q),
            QubitRef::Placed(_) => None,
        }
    }

    /// Check if this reference names a physical node.
    #[inline]
    pub fn is_placed(self) -> bool {
        matches!(self, QubitRef::Placed(_))
    }
}

impl From<QubitId> for QubitRef {
    fn from(q: QubitId) -> Self {
        QubitRef::Logical(q)
    }
}

impl From<Node> for QubitRef {
    fn from(n: Node) -> Self {
        QubitRef::Placed(n)
    }
}

impl fmt::Display for QubitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QubitRef::Logical(q) => write!(f, "{q}"),
            QubitRef::Placed(n) => write!(f, "{n}"),
            QubitRef::Unplaced(q) => write!(f, "unplaced[{}]", q.0),
        }
    }
}
