//! Minimal graph adapter traits.
//!
//! Walks never build or persist graphs; they only ask for neighbors, degrees and
//! (for weighted policies) edge weights. Edges are undirected: if `b` is a neighbor
//! of `a`, then `a` is a neighbor of `b`.

use std::fmt::Debug;
use std::hash::Hash;

pub trait Graph {
    /// Opaque node identifier.
    type Node: Copy + Eq + Ord + Hash + Debug;

    fn nodes(&self) -> Vec<Self::Node>;
    fn contains_node(&self, node: Self::Node) -> bool;
    fn neighbors(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Append the neighbors of `node` to `out`, in [`Self::neighbors`] order.
    ///
    /// The walk loop calls this on every step with a reused buffer. Adapters that can
    /// read their adjacency in place should override it so a step allocates nothing.
    fn extend_neighbors(&self, node: Self::Node, out: &mut Vec<Self::Node>) {
        out.extend(self.neighbors(node));
    }

    /// Number of edge endpoints at `node`; a self-loop counts twice.
    fn degree(&self, node: Self::Node) -> usize {
        self.neighbors(node).len()
    }
}

pub trait WeightedGraph: Graph {
    /// Weight of the edge `{a, b}`, or `None` if the graph carries no weight for it.
    fn edge_weight(&self, a: Self::Node, b: Self::Node) -> Option<f64>;
}

/// A weighted graph whose edge weights can be rewritten in place.
///
/// Used by [`crate::random_walk::reinforce_in_place`] to land reinforcement directly
/// on the caller's graph instead of a side table.
pub trait WeightedGraphMut: WeightedGraph {
    fn set_edge_weight(&mut self, a: Self::Node, b: Self::Node, weight: f64);
}

/// Undirected adjacency-list graph over `0..n`, with optional per-edge weights.
///
/// Neighbor lists are kept sorted, so iteration order (and therefore seeded walks)
/// does not depend on insertion order.
#[derive(Debug, Clone, Default)]
pub struct AdjacencyList {
    adj: Vec<Vec<usize>>,
    wts: Vec<Vec<f64>>,
}

impl AdjacencyList {
    /// Empty graph with `n` isolated nodes.
    pub fn with_nodes(n: usize) -> Self {
        Self { adj: vec![Vec::new(); n], wts: vec![Vec::new(); n] }
    }

    /// Build from undirected edges with unit weight.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Self {
        let mut g = Self::with_nodes(n);
        for &(a, b) in edges {
            g.add_edge(a, b, 1.0);
        }
        g
    }

    /// Build from undirected weighted edges.
    pub fn from_weighted_edges(n: usize, edges: &[(usize, usize, f64)]) -> Self {
        let mut g = Self::with_nodes(n);
        for &(a, b, w) in edges {
            g.add_edge(a, b, w);
        }
        g
    }

    /// Add (or overwrite) the undirected edge `{a, b}`.
    ///
    /// Out-of-range endpoints and self-loops are ignored.
    pub fn add_edge(&mut self, a: usize, b: usize, weight: f64) {
        let n = self.adj.len();
        if a >= n || b >= n || a == b {
            return;
        }
        self.upsert(a, b, weight);
        self.upsert(b, a, weight);
    }

    pub fn node_count(&self) -> usize {
        self.adj.len()
    }

    /// Borrowed neighbor slice; avoids the allocation of [`Graph::neighbors`].
    pub fn neighbors_ref(&self, node: usize) -> &[usize] {
        self.adj.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    fn upsert(&mut self, from: usize, to: usize, weight: f64) {
        let nbrs = &mut self.adj[from];
        match nbrs.binary_search(&to) {
            Ok(i) => self.wts[from][i] = weight,
            Err(i) => {
                nbrs.insert(i, to);
                self.wts[from].insert(i, weight);
            }
        }
    }

    fn position(&self, a: usize, b: usize) -> Option<usize> {
        self.adj.get(a)?.binary_search(&b).ok()
    }
}

impl Graph for AdjacencyList {
    type Node = usize;

    fn nodes(&self) -> Vec<usize> {
        (0..self.adj.len()).collect()
    }
    fn contains_node(&self, node: usize) -> bool {
        node < self.adj.len()
    }
    fn neighbors(&self, node: usize) -> Vec<usize> {
        self.neighbors_ref(node).to_vec()
    }
    fn extend_neighbors(&self, node: usize, out: &mut Vec<usize>) {
        out.extend_from_slice(self.neighbors_ref(node));
    }
    fn degree(&self, node: usize) -> usize {
        self.neighbors_ref(node).len()
    }
}

impl WeightedGraph for AdjacencyList {
    fn edge_weight(&self, a: usize, b: usize) -> Option<f64> {
        self.position(a, b).map(|i| self.wts[a][i])
    }
}

impl WeightedGraphMut for AdjacencyList {
    fn set_edge_weight(&mut self, a: usize, b: usize, weight: f64) {
        if let Some(i) = self.position(a, b) {
            self.wts[a][i] = weight;
        }
        if let Some(j) = self.position(b, a) {
            self.wts[b][j] = weight;
        }
    }
}

/// Dense symmetric weight matrix; `w > 0` means an edge.
pub struct AdjacencyMatrix<'a>(pub &'a [Vec<f64>]);

impl<'a> Graph for AdjacencyMatrix<'a> {
    type Node = usize;

    fn nodes(&self) -> Vec<usize> {
        (0..self.0.len()).collect()
    }
    fn contains_node(&self, node: usize) -> bool {
        node < self.0.len()
    }
    fn neighbors(&self, node: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.extend_neighbors(node, &mut out);
        out
    }
    fn extend_neighbors(&self, node: usize, out: &mut Vec<usize>) {
        if let Some(row) = self.0.get(node) {
            out.extend(row.iter().enumerate().filter(|(_, &w)| w > 0.0).map(|(i, _)| i));
        }
    }
    fn degree(&self, node: usize) -> usize {
        match self.0.get(node) {
            Some(row) => {
                let nbrs = row.iter().filter(|&&w| w > 0.0).count();
                nbrs + usize::from(row.get(node).is_some_and(|&w| w > 0.0))
            }
            None => 0,
        }
    }
}

impl<'a> WeightedGraph for AdjacencyMatrix<'a> {
    fn edge_weight(&self, a: usize, b: usize) -> Option<f64> {
        self.0.get(a).and_then(|row| row.get(b)).copied().filter(|&w| w > 0.0)
    }
}

#[cfg(feature = "petgraph")]
impl<N, E, Ty, Ix> Graph for petgraph::Graph<N, E, Ty, Ix>
where
    Ty: petgraph::EdgeType,
    Ix: petgraph::graph::IndexType,
{
    type Node = petgraph::graph::NodeIndex<Ix>;

    fn nodes(&self) -> Vec<Self::Node> {
        self.node_indices().collect()
    }
    fn contains_node(&self, node: Self::Node) -> bool {
        node.index() < self.node_count()
    }
    fn neighbors(&self, node: Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        Graph::extend_neighbors(self, node, &mut out);
        out
    }
    fn extend_neighbors(&self, node: Self::Node, out: &mut Vec<Self::Node>) {
        // petgraph yields neighbors in reverse insertion order and repeats parallel
        // edges; sort and dedup the appended tail for stable walks.
        let from = out.len();
        out.extend(self.neighbors_undirected(node));
        out[from..].sort_unstable();
        let mut keep = from;
        for i in from..out.len() {
            if keep == from || out[keep - 1] != out[i] {
                out[keep] = out[i];
                keep += 1;
            }
        }
        out.truncate(keep);
    }
    fn degree(&self, node: Self::Node) -> usize {
        let nbrs = Graph::neighbors(self, node);
        nbrs.len() + usize::from(nbrs.binary_search(&node).is_ok())
    }
}

#[cfg(feature = "petgraph")]
impl<N, E, Ty, Ix> WeightedGraph for petgraph::Graph<N, E, Ty, Ix>
where
    E: Copy + Into<f64>,
    Ty: petgraph::EdgeType,
    Ix: petgraph::graph::IndexType,
{
    fn edge_weight(&self, a: Self::Node, b: Self::Node) -> Option<f64> {
        let e = self.find_edge_undirected(a, b)?.0;
        petgraph::Graph::edge_weight(self, e).map(|&w| w.into())
    }
}

#[cfg(feature = "petgraph")]
impl<N, Ty, Ix> WeightedGraphMut for petgraph::Graph<N, f64, Ty, Ix>
where
    Ty: petgraph::EdgeType,
    Ix: petgraph::graph::IndexType,
{
    fn set_edge_weight(&mut self, a: Self::Node, b: Self::Node, weight: f64) {
        if let Some((e, _)) = self.find_edge_undirected(a, b) {
            if let Some(w) = petgraph::Graph::edge_weight_mut(self, e) {
                *w = weight;
            }
        }
    }
}
