//! Device characterization (error rates) used for noise-aware placement.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use qmap_ir::Node;

/// Measured error rates of a device.
///
/// Missing entries are treated as error-free. Edge errors are
/// order-insensitive: `edge_error(a, b) == edge_error(b, a)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CharacterizationSpec", into = "CharacterizationSpec")]
pub struct DeviceCharacterization {
    node_errors: FxHashMap<Node, f64>,
    edge_errors: FxHashMap<(Node, Node), f64>,
    readout_errors: FxHashMap<Node, f64>,
}

/// Serialized form of a [`DeviceCharacterization`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CharacterizationSpec {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    node_errors: BTreeMap<u32, f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    edge_errors: Vec<EdgeError>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    readout_errors: BTreeMap<u32, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct EdgeError {
    edge: (u32, u32),
    error: f64,
}

impl From<CharacterizationSpec> for DeviceCharacterization {
    fn from(spec: CharacterizationSpec) -> Self {
        let mut device = DeviceCharacterization::new();
        for (node, error) in spec.node_errors {
            device.set_node_error(Node(node), error);
        }
        for EdgeError { edge: (a, b), error } in spec.edge_errors {
            device.set_edge_error(Node(a), Node(b), error);
        }
        for (node, error) in spec.readout_errors {
            device.set_readout_error(Node(node), error);
        }
        device
    }
}

impl From<DeviceCharacterization> for CharacterizationSpec {
    fn from(device: DeviceCharacterization) -> Self {
        let mut edge_errors: Vec<EdgeError> = device
            .edge_errors
            .iter()
            .map(|(&(a, b), &error)| EdgeError {
                edge: (a.0, b.0),
                error,
            })
            .collect();
        edge_errors.sort_by_key(|e| e.edge);
        CharacterizationSpec {
            node_errors: device.node_errors.iter().map(|(n, &e)| (n.0, e)).collect(),
            edge_errors,
            readout_errors: device
                .readout_errors
                .iter()
                .map(|(n, &e)| (n.0, e))
                .collect(),
        }
    }
}

fn edge_key(a: Node, b: Node) -> (Node, Node) {
    if a <= b { (a, b) } else { (b, a) }
}

impl DeviceCharacterization {
    /// Create an empty characterization.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the single-qubit error rate of a node.
    pub fn set_node_error(&mut self, node: Node, error: f64) {
        self.node_errors.insert(node, error);
    }

    /// Set the two-qubit error rate of an edge.
    pub fn set_edge_error(&mut self, a: Node, b: Node, error: f64) {
        self.edge_errors.insert(edge_key(a, b), error);
    }

    /// Set the readout error rate of a node.
    pub fn set_readout_error(&mut self, node: Node, error: f64) {
        self.readout_errors.insert(node, error);
    }

    /// Builder form of [`set_node_error`](Self::set_node_error).
    #[must_use]
    pub fn with_node_error(mut self, node: u32, error: f64) -> Self {
        self.set_node_error(Node(node), error);
        self
    }

    /// Builder form of [`set_edge_error`](Self::set_edge_error).
    #[must_use]
    pub fn with_edge_error(mut self, a: u32, b: u32, error: f64) -> Self {
        self.set_edge_error(Node(a), Node(b), error);
        self
    }

    /// Builder form of [`set_readout_error`](Self::set_readout_error).
    #[must_use]
    pub fn with_readout_error(mut self, node: u32, error: f64) -> Self {
        self.set_readout_error(Node(node), error);
        self
    }

    /// Single-qubit error of a node; 0 when unknown.
    pub fn node_error(&self, node: Node) -> f64 {
        self.node_errors.get(&node).copied().unwrap_or(0.0)
    }

    /// Two-qubit error of an edge; 0 when unknown.
    pub fn edge_error(&self, a: Node, b: Node) -> f64 {
        self.edge_errors.get(&edge_key(a, b)).copied().unwrap_or(0.0)
    }

    /// Readout error of a node; 0 when unknown.
    pub fn readout_error(&self, node: Node) -> f64 {
        self.readout_errors.get(&node).copied().unwrap_or(0.0)
    }

    /// Check if no error rate is recorded.
    pub fn is_empty(&self) -> bool {
        self.node_errors.is_empty() && self.edge_errors.is_empty() && self.readout_errors.is_empty()
    }
}
