//! Per-edge weight stores for weighted and reinforcing walks.
//!
//! Weights are keyed by an unordered node pair ([`EdgeKey`]), so an undirected edge
//! has exactly one entry and both directions observe an update together. Missing
//! entries read as `1.0`.
//!
//! Invariant: every stored weight is finite and `> 0`. Updates that would violate it
//! fail with [`Error::InvalidWeight`] and leave the store untouched.

use crate::graph::{WeightedGraph, WeightedGraphMut};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Weight assumed for an edge with no explicit entry.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Unordered node pair; `EdgeKey::new(a, b) == EdgeKey::new(b, a)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeKey<N>(N, N);

impl<N: Ord> EdgeKey<N> {
    pub fn new(a: N, b: N) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }

    pub fn endpoints(&self) -> (&N, &N) {
        (&self.0, &self.1)
    }
}

/// Read/update access to edge weights during a walk.
pub trait WeightStore<N> {
    /// Weight of `{a, b}`; symmetric, `1.0` when absent.
    fn weight(&self, a: N, b: N) -> f64;

    /// Add `delta` to `{a, b}`.
    fn increment(&mut self, a: N, b: N, delta: f64) -> Result<()>;

    /// Explicit entries, ordered by key.
    fn snapshot(&self) -> BTreeMap<EdgeKey<N>, f64>;
}

fn check_weight<N: Debug>(a: N, b: N, w: f64) -> Result<f64> {
    if w.is_finite() && w > 0.0 {
        Ok(w)
    } else {
        Err(Error::InvalidWeight(format!("edge ({a:?}, {b:?}) weight must be positive and finite, got {w}")))
    }
}

/// Owned sparse weight table.
#[derive(Debug, Clone)]
pub struct EdgeWeights<N> {
    map: HashMap<EdgeKey<N>, f64>,
}

impl<N> Default for EdgeWeights<N> {
    fn default() -> Self {
        Self { map: HashMap::new() }
    }
}

impl<N> EdgeWeights<N>
where
    N: Copy + Eq + Ord + Hash + Debug,
{
    /// Every edge starts at [`DEFAULT_WEIGHT`].
    pub fn new() -> Self {
        Self { map: HashMap::new() }
    }

    /// Seed from the graph's own edge weights.
    ///
    /// Edges the graph reports no weight for keep the default. Fails if any reported
    /// weight is non-positive or non-finite.
    pub fn from_graph<G>(graph: &G) -> Result<Self>
    where
        G: WeightedGraph<Node = N>,
    {
        let mut out = Self::new();
        for a in graph.nodes() {
            for b in graph.neighbors(a) {
                if b < a {
                    continue;
                }
                if let Some(w) = graph.edge_weight(a, b) {
                    out.insert(a, b, w)?;
                }
            }
        }
        Ok(out)
    }

    /// Set `{a, b}` to `weight`.
    pub fn insert(&mut self, a: N, b: N, weight: f64) -> Result<()> {
        let w = check_weight(a, b, weight)?;
        self.map.insert(EdgeKey::new(a, b), w);
        Ok(())
    }

    /// Explicit entry for `{a, b}`, if any.
    pub fn get(&self, a: N, b: N) -> Option<f64> {
        self.map.get(&EdgeKey::new(a, b)).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every entry, resetting all edges to [`DEFAULT_WEIGHT`]; keeps the allocation.
    pub fn clear(&mut self) {
        self.map.clear();
    }

    /// Copy every explicit entry onto the graph's own edge weights.
    pub fn write_back<G>(&self, graph: &mut G)
    where
        G: WeightedGraphMut<Node = N>,
    {
        for (key, &w) in &self.map {
            let (&a, &b) = key.endpoints();
            graph.set_edge_weight(a, b, w);
        }
    }

    /// Wrap in a shareable handle.
    pub fn into_shared(self) -> SharedEdgeWeights<N> {
        SharedEdgeWeights { inner: Arc::new(Mutex::new(self)) }
    }
}

impl<N> WeightStore<N> for EdgeWeights<N>
where
    N: Copy + Eq + Ord + Hash + Debug,
{
    fn weight(&self, a: N, b: N) -> f64 {
        self.get(a, b).unwrap_or(DEFAULT_WEIGHT)
    }

    fn increment(&mut self, a: N, b: N, delta: f64) -> Result<()> {
        let next = check_weight(a, b, self.weight(a, b) + delta)?;
        self.map.insert(EdgeKey::new(a, b), next);
        Ok(())
    }

    fn snapshot(&self) -> BTreeMap<EdgeKey<N>, f64> {
        self.map.iter().map(|(k, &w)| (*k, w)).collect()
    }
}

/// Cloneable handle to one weight table shared by several walkers.
///
/// Each `increment` is a single critical section: concurrent walkers never lose an
/// update, and increments from different walkers serialize in some unspecified order.
#[derive(Debug, Clone)]
pub struct SharedEdgeWeights<N> {
    inner: Arc<Mutex<EdgeWeights<N>>>,
}

impl<N> Default for SharedEdgeWeights<N> {
    fn default() -> Self {
        Self { inner: Arc::new(Mutex::new(EdgeWeights::default())) }
    }
}

impl<N> SharedEdgeWeights<N>
where
    N: Copy + Eq + Ord + Hash + Debug,
{
    pub fn new() -> Self {
        EdgeWeights::new().into_shared()
    }

    /// Copy of the current table.
    pub fn to_owned_weights(&self) -> EdgeWeights<N> {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, EdgeWeights<N>> {
        // Increments are single inserts, so a poisoned table is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<N> WeightStore<N> for SharedEdgeWeights<N>
where
    N: Copy + Eq + Ord + Hash + Debug,
{
    fn weight(&self, a: N, b: N) -> f64 {
        self.lock().weight(a, b)
    }

    fn increment(&mut self, a: N, b: N, delta: f64) -> Result<()> {
        self.lock().increment(a, b, delta)
    }

    fn snapshot(&self) -> BTreeMap<EdgeKey<N>, f64> {
        self.lock().snapshot()
    }
}
