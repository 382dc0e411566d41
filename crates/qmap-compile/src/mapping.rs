//! Logical-to-physical qubit mappings and node permutations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use qmap_ir::{Node, QubitId};

use crate::error::{CompileError, CompileResult};

/// A partial injective mapping from logical qubits to physical nodes.
///
/// Both directions are kept so lookups by node are as cheap as lookups by
/// qubit. Iteration is ordered by qubit id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<u32, u32>", into = "BTreeMap<u32, u32>")]
pub struct QubitMapping {
    forward: BTreeMap<QubitId, Node>,
    reverse: BTreeMap<Node, QubitId>,
}

impl TryFrom<BTreeMap<u32, u32>> for QubitMapping {
    type Error = CompileError;

    fn try_from(pairs: BTreeMap<u32, u32>) -> CompileResult<Self> {
        Self::from_pairs(pairs.into_iter().map(|(q, n)| (QubitId(q), Node(n))))
    }
}

impl From<QubitMapping> for BTreeMap<u32, u32> {
    fn from(mapping: QubitMapping) -> Self {
        mapping.forward.into_iter().map(|(q, n)| (q.0, n.0)).collect()
    }
}

impl QubitMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a mapping from `(qubit, node)` pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (QubitId, Node)>) -> CompileResult<Self> {
        let mut mapping = Self::new();
        for (qubit, node) in pairs {
            mapping.insert(qubit, node)?;
        }
        Ok(mapping)
    }

    /// Map `qubit` to `node`.
    ///
    /// Re-inserting an existing pair is a no-op. Fails with
    /// [`CompileError::InvalidMapping`] if either side is already mapped
    /// elsewhere.
    pub fn insert(&mut self, qubit: QubitId, node: Node) -> CompileResult<()> {
        match (self.forward.get(&qubit), self.reverse.get(&node)) {
            (Some(&n), _) if n == node => return Ok(()),
            (Some(&n), _) => {
                return Err(CompileError::InvalidMapping(format!(
                    "{qubit} is already mapped to {n}, cannot map it to {node}"
                )));
            }
            (None, Some(&q)) => {
                return Err(CompileError::InvalidMapping(format!(
                    "{node} is already occupied by {q}, cannot map {qubit} to it"
                )));
            }
            (None, None) => {}
        }
        self.forward.insert(qubit, node);
        self.reverse.insert(node, qubit);
        Ok(())
    }

    /// Remove a qubit, returning the node it was mapped to.
    pub fn remove(&mut self, qubit: QubitId) -> Option<Node> {
        let node = self.forward.remove(&qubit)?;
        self.reverse.remove(&node);
        Some(node)
    }

    /// The node a qubit is mapped to.
    #[inline]
    pub fn get(&self, qubit: QubitId) -> Option<Node> {
        self.forward.get(&qubit).copied()
    }

    /// The qubit mapped to a node.
    #[inline]
    pub fn qubit_at(&self, node: Node) -> Option<QubitId> {
        self.reverse.get(&node).copied()
    }

    /// Check if a qubit is mapped.
    pub fn contains_qubit(&self, qubit: QubitId) -> bool {
        self.forward.contains_key(&qubit)
    }

    /// Check if a node is occupied.
    pub fn contains_node(&self, node: Node) -> bool {
        self.reverse.contains_key(&node)
    }

    /// Number of mapped qubits.
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    /// Check if nothing is mapped.
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Iterate `(qubit, node)` pairs in qubit order.
    pub fn iter(&self) -> impl Iterator<Item = (QubitId, Node)> + '_ {
        self.forward.iter().map(|(&q, &n)| (q, n))
    }

    /// Mapped qubits in id order.
    pub fn qubits(&self) -> impl Iterator<Item = QubitId> + '_ {
        self.forward.keys().copied()
    }

    /// Occupied nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = Node> + '_ {
        self.reverse.keys().copied()
    }

    /// Exchange the occupants of two nodes. Either node may be empty.
    pub fn swap_nodes(&mut self, a: Node, b: Node) {
        let qa = self.reverse.remove(&a);
        let qb = self.reverse.remove(&b);
        if let Some(q) = qa {
            self.forward.insert(q, b);
            self.reverse.insert(b, q);
        }
        if let Some(q) = qb {
            self.forward.insert(q, a);
            self.reverse.insert(a, q);
        }
    }

    /// Move every qubit along a node permutation.
    pub fn permute(&mut self, permutation: &NodePermutation) {
        let moved: Vec<(QubitId, Node)> = self
            .forward
            .iter()
            .map(|(&q, &n)| (q, permutation.image(n)))
            .collect();
        self.forward.clear();
        self.reverse.clear();
        for (q, n) in moved {
            self.forward.insert(q, n);
            self.reverse.insert(n, q);
        }
    }

    /// Check that both directions agree and no node is used twice.
    pub fn is_consistent(&self) -> bool {
        self.forward.len() == self.reverse.len()
            && self
                .forward
                .iter()
                .all(|(q, n)| self.reverse.get(n) == Some(q))
    }
}

impl fmt::Display for QubitMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (q, n)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{q} -> {n}")?;
        }
        write!(f, "}}")
    }
}

/// A bijection on nodes recording where the state held on each node moved.
///
/// Nodes that are not listed map to themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodePermutation {
    /// start node -> current node
    forward: BTreeMap<Node, Node>,
    /// current node -> start node
    origin: BTreeMap<Node, Node>,
}

impl NodePermutation {
    /// The identity permutation.
    pub fn identity() -> Self {
        Self::default()
    }

    /// Where the state that started on `start` currently is.
    pub fn image(&self, start: Node) -> Node {
        self.forward.get(&start).copied().unwrap_or(start)
    }

    /// Which start node the state currently on `current` came from.
    pub fn origin(&self, current: Node) -> Node {
        self.origin.get(&current).copied().unwrap_or(current)
    }

    /// Record a SWAP between two nodes.
    pub fn swap(&mut self, a: Node, b: Node) {
        if a == b {
            return;
        }
        let oa = self.origin(a);
        let ob = self.origin(b);
        self.set(ob, a);
        self.set(oa, b);
    }

    fn set(&mut self, start: Node, current: Node) {
        if start == current {
            self.forward.remove(&start);
            self.origin.remove(&current);
        } else {
            self.forward.insert(start, current);
            self.origin.insert(current, start);
        }
    }

    /// Apply `next` after `self`.
    pub fn then(&self, next: &NodePermutation) -> NodePermutation {
        let mut result = NodePermutation::identity();
        let starts = self.forward.keys().chain(next.forward.keys());
        for &start in starts {
            result.set(start, next.image(self.image(start)));
        }
        result
    }

    /// Check if no node moved.
    pub fn is_identity(&self) -> bool {
        self.forward.is_empty()
    }

    /// Moved nodes as `(start, current)` pairs.
    pub fn moves(&self) -> impl Iterator<Item = (Node, Node)> + '_ {
        self.forward.iter().map(|(&s, &c)| (s, c))
    }
}
