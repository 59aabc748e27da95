//! `rwalk`: stochastic walks over graphs, including edge-reinforced walks.
//!
//! A walk repeatedly asks a [`TransitionPolicy`] for a distribution over the current
//! node's neighbors, draws the next node with [`sample_weighted`], and (optionally)
//! applies a [`Reinforcement`] rule to the traversed edge before the next step.
//!
//! Public invariants (must not drift):
//! - **Determinism**: a walk is a pure function of (graph, start, config, initial
//!   weights, RNG). Fixed `seed` ⇒ identical traces.
//! - **Step ordering**: step `k` samples from weights that include every
//!   reinforcement of steps `< k` and none of step `k` itself.
//! - **Positive weights**: a weight store never holds a non-positive or non-finite
//!   weight; updates that would break this fail and leave the store unchanged.
//! - **All-or-nothing**: a failing walk returns an error, never a partial trace.
//! - **Independent runs**: every walk gets a fresh weight store unless the caller
//!   passes one in ([`Walker::walk`], [`generate_walks_with_store_from_nodes`]).
//!
//! Swappable (allowed to change without breaking the contract):
//! - sampling strategy (CDF scan vs. alias tables), as long as the drawn
//!   distribution and seeded determinism within a release hold
//! - internal weight-store layout

pub mod graph;
pub mod policy;
pub mod random_walk;
pub mod reinforce;
pub mod sampler;
pub mod weights;

pub use graph::{AdjacencyList, AdjacencyMatrix, Graph, WeightedGraph, WeightedGraphMut};
pub use policy::TransitionPolicy;
pub use random_walk::{
    generate_walks, generate_walks_from_nodes, generate_walks_streaming_from_nodes,
    generate_walks_with_store_from_nodes, random_walk, random_walk_weighted, reinforce_in_place,
    Walk, WalkConfig, Walker, Walks,
};
pub use reinforce::Reinforcement;
pub use sampler::sample_weighted;
pub use weights::{EdgeKey, EdgeWeights, SharedEdgeWeights, WeightStore, DEFAULT_WEIGHT};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// The current node has no candidates to move to (isolated node / dead end).
    #[error("empty domain: {0}")]
    EmptyDomain(String),
    /// Weights are negative, non-finite, or sum to zero.
    #[error("invalid weight: {0}")]
    InvalidWeight(String),
    /// A degree-based policy met a zero-degree neighbor.
    #[error("division by zero: {0}")]
    DivisionByZero(String),
    /// The start node is not part of the graph.
    #[error("invalid start: {0}")]
    InvalidStart(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// The caller's stop check fired between steps.
    #[error("walk cancelled after {0} steps")]
    Cancelled(usize),
}

pub type Result<T> = std::result::Result<T, Error>;
