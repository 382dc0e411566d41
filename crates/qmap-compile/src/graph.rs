//! Device connectivity graph.
//!
//! The [`ConnectivityGraph`] describes which pairs of physical nodes can take
//! part in a two-qubit interaction. Edges are undirected; a device may
//! additionally declare a preferred orientation for each edge, which makes the
//! graph *directed* for the purposes of
//! [`Predicate::DirectedConnectivity`](crate::Predicate::DirectedConnectivity).
//!
//! ## Performance
//!
//! Distances and shortest paths are served from an all-pairs table built with
//! one BFS per node. The table is computed on first use and dropped whenever
//! the graph is mutated.

use std::collections::VecDeque;
use std::sync::OnceLock;

use petgraph::graph::{NodeIndex, UnGraph};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use qmap_ir::Node;

use crate::error::{CompileError, CompileResult};

const UNREACHABLE: u32 = u32::MAX;

/// All-pairs BFS distances and predecessors, indexed by graph index.
#[derive(Debug, Clone)]
struct DistanceTable {
    dist: Vec<Vec<u32>>,
    /// `pred[src][dst]` is the node before `dst` on a shortest path from `src`.
    pred: Vec<Vec<u32>>,
}

/// Undirected graph of physical nodes and permitted two-qubit interactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "GraphSpec", into = "GraphSpec")]
pub struct ConnectivityGraph {
    graph: UnGraph<Node, ()>,
    indices: FxHashMap<Node, NodeIndex>,
    /// Preferred `(control, target)` orientations. Empty for undirected devices.
    orientations: FxHashSet<(Node, Node)>,
    distances: OnceLock<DistanceTable>,
}

/// Serialized form of a [`ConnectivityGraph`].
///
/// When `directed` is set, each edge is read as a preferred
/// `(control, target)` orientation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GraphSpec {
    #[serde(default)]
    nodes: Vec<Node>,
    edges: Vec<(Node, Node)>,
    #[serde(default)]
    directed: bool,
}

impl From<GraphSpec> for ConnectivityGraph {
    fn from(spec: GraphSpec) -> Self {
        let mut graph = ConnectivityGraph::new();
        for node in spec.nodes {
            graph.add_node(node);
        }
        for (a, b) in spec.edges {
            if spec.directed {
                graph.add_directed_edge(a, b);
            } else {
                graph.add_edge(a, b);
            }
        }
        graph
    }
}

impl From<ConnectivityGraph> for GraphSpec {
    fn from(graph: ConnectivityGraph) -> Self {
        let directed = graph.is_directed();
        let edges = if directed {
            let mut edges: Vec<_> = graph.orientations.iter().copied().collect();
            edges.sort_unstable();
            edges
        } else {
            graph.edges()
        };
        GraphSpec {
            nodes: graph.nodes(),
            edges,
            directed,
        }
    }
}

impl Default for ConnectivityGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectivityGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
            indices: FxHashMap::default(),
            orientations: FxHashSet::default(),
            distances: OnceLock::new(),
        }
    }

    /// Create a graph from an undirected edge list.
    pub fn from_edges(edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut graph = Self::new();
        for (a, b) in edges {
            graph.add_edge(Node(a), Node(b));
        }
        graph
    }

    /// Create a graph from `(control, target)` pairs, recording each pair as
    /// the preferred orientation of its edge.
    pub fn from_directed_edges(edges: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut graph = Self::new();
        for (a, b) in edges {
            graph.add_directed_edge(Node(a), Node(b));
        }
        graph
    }

    /// Add an isolated node. Adding an existing node is a no-op.
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        if let Some(&idx) = self.indices.get(&node) {
            return idx;
        }
        self.distances.take();
        let idx = self.graph.add_node(node);
        self.indices.insert(node, idx);
        idx
    }

    /// Add an undirected edge, creating missing nodes.
    ///
    /// Self-loops and duplicate edges (in either direction) are ignored.
    pub fn add_edge(&mut self, a: Node, b: Node) {
        if a == b {
            self.add_node(a);
            return;
        }
        let ia = self.add_node(a);
        let ib = self.add_node(b);
        if self.graph.find_edge(ia, ib).is_none() {
            self.distances.take();
            self.graph.add_edge(ia, ib, ());
        }
    }

    /// Add an edge with a preferred `(control, target)` orientation.
    pub fn add_directed_edge(&mut self, control: Node, target: Node) {
        self.add_edge(control, target);
        if control != target {
            self.orientations.insert((control, target));
        }
    }

    /// Create a linear chain `0 - 1 - ... - (n-1)`.
    pub fn linear(n: u32) -> Self {
        let mut graph = Self::new();
        for i in 0..n {
            graph.add_node(Node(i));
        }
        for i in 1..n {
            graph.add_edge(Node(i - 1), Node(i));
        }
        graph
    }

    /// Create a ring `0 - 1 - ... - (n-1) - 0`.
    pub fn ring(n: u32) -> Self {
        let mut graph = Self::linear(n);
        if n > 2 {
            graph.add_edge(Node(n - 1), Node(0));
        }
        graph
    }

    /// Create a `rows × cols` square grid; node `r * cols + c` sits at `(r, c)`.
    pub fn grid(rows: u32, cols: u32) -> Self {
        let mut graph = Self::new();
        for r in 0..rows {
            for c in 0..cols {
                let node = Node(r * cols + c);
                graph.add_node(node);
                if c > 0 {
                    graph.add_edge(Node(r * cols + c - 1), node);
                }
                if r > 0 {
                    graph.add_edge(Node((r - 1) * cols + c), node);
                }
            }
        }
        graph
    }

    /// Create a star with node 0 at the centre.
    pub fn star(n: u32) -> Self {
        let mut graph = Self::new();
        for i in 0..n {
            graph.add_node(Node(i));
        }
        for i in 1..n {
            graph.add_edge(Node(0), Node(i));
        }
        graph
    }

    /// Create a fully connected graph.
    pub fn full(n: u32) -> Self {
        let mut graph = Self::new();
        for i in 0..n {
            graph.add_node(Node(i));
        }
        for i in 0..n {
            for j in (i + 1)..n {
                graph.add_edge(Node(i), Node(j));
            }
        }
        graph
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Get the number of nodes.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the number of undirected edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.graph.edge_count()
    }

    /// Check if the node belongs to the graph.
    #[inline]
    pub fn contains(&self, node: Node) -> bool {
        self.indices.contains_key(&node)
    }

    /// All nodes, sorted by id.
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.graph.node_weights().copied().collect();
        nodes.sort_unstable();
        nodes
    }

    /// All undirected edges as `(low, high)` pairs, sorted.
    pub fn edges(&self) -> Vec<(Node, Node)> {
        let mut edges: Vec<_> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| {
                let (a, b) = (self.graph[a], self.graph[b]);
                if a < b { (a, b) } else { (b, a) }
            })
            .collect();
        edges.sort_unstable();
        edges
    }

    /// Check if two nodes share an edge.
    #[inline]
    pub fn are_adjacent(&self, a: Node, b: Node) -> bool {
        match (self.indices.get(&a), self.indices.get(&b)) {
            (Some(&ia), Some(&ib)) => self.graph.find_edge(ia, ib).is_some(),
            _ => false,
        }
    }

    /// Neighbours of a node, sorted by id. Empty for unknown nodes.
    pub fn neighbors(&self, node: Node) -> Vec<Node> {
        let Some(&idx) = self.indices.get(&node) else {
            return vec![];
        };
        let mut neighbors: Vec<Node> = self.graph.neighbors(idx).map(|n| self.graph[n]).collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    /// Number of neighbours of a node.
    pub fn degree(&self, node: Node) -> usize {
        self.indices
            .get(&node)
            .map_or(0, |&idx| self.graph.neighbors(idx).count())
    }

    /// Check if the device declares preferred edge orientations.
    #[inline]
    pub fn is_directed(&self) -> bool {
        !self.orientations.is_empty()
    }

    /// Check if a gate may run with `control` on `a` and target on `b`.
    ///
    /// For undirected graphs this is plain adjacency.
    pub fn has_orientation(&self, control: Node, target: Node) -> bool {
        if self.is_directed() {
            self.orientations.contains(&(control, target))
        } else {
            self.are_adjacent(control, target)
        }
    }

    // =========================================================================
    // Distances
    // =========================================================================

    fn index_of(&self, node: Node) -> CompileResult<NodeIndex> {
        self.indices
            .get(&node)
            .copied()
            .ok_or(CompileError::UnknownNode(node))
    }

    fn table(&self) -> &DistanceTable {
        self.distances.get_or_init(|| self.compute_distances())
    }

    fn compute_distances(&self) -> DistanceTable {
        let n = self.graph.node_count();
        let mut dist = vec![vec![UNREACHABLE; n]; n];
        let mut pred = vec![vec![UNREACHABLE; n]; n];

        for src in 0..n {
            dist[src][src] = 0;
            let mut queue = VecDeque::new();
            queue.push_back(NodeIndex::new(src));
            while let Some(current) = queue.pop_front() {
                let cur = current.index();
                for neighbor in self.graph.neighbors(current) {
                    let nb = neighbor.index();
                    if dist[src][nb] == UNREACHABLE {
                        dist[src][nb] = dist[src][cur] + 1;
                        pred[src][nb] = cur as u32;
                        queue.push_back(neighbor);
                    }
                }
            }
        }
        DistanceTable { dist, pred }
    }

    /// Shortest-path length between two nodes; 0 when they are equal.
    pub fn distance(&self, a: Node, b: Node) -> CompileResult<u32> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        match self.table().dist[ia.index()][ib.index()] {
            UNREACHABLE => Err(CompileError::NoPath { from: a, to: b }),
            d => Ok(d),
        }
    }

    /// Shortest-path length, or `None` for unknown or disconnected nodes.
    pub fn try_distance(&self, a: Node, b: Node) -> Option<u32> {
        self.distance(a, b).ok()
    }

    /// A minimal-length path from `a` to `b`, both ends included.
    pub fn shortest_path(&self, a: Node, b: Node) -> CompileResult<Vec<Node>> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        let table = self.table();
        if table.dist[ia.index()][ib.index()] == UNREACHABLE {
            return Err(CompileError::NoPath { from: a, to: b });
        }

        let mut path = vec![b];
        let mut current = ib.index();
        while current != ia.index() {
            current = table.pred[ia.index()][current] as usize;
            path.push(self.graph[NodeIndex::new(current)]);
        }
        path.reverse();
        Ok(path)
    }

    /// Check if both nodes lie in the same connected component.
    pub fn same_component(&self, a: Node, b: Node) -> bool {
        self.try_distance(a, b).is_some()
    }

    /// Check if every node can reach every other node.
    pub fn is_connected(&self) -> bool {
        petgraph::algo::connected_components(&self.graph) <= 1
    }

    /// Largest finite distance between two nodes.
    pub fn diameter(&self) -> Option<u32> {
        self.table()
            .dist
            .iter()
            .flatten()
            .copied()
            .filter(|&d| d != UNREACHABLE)
            .max()
    }
}
