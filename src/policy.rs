//! Transition policies: how the current node becomes a distribution over neighbors.
//!
//! Every policy produces `(candidates, weights)` with `candidates == neighbors(current)`
//! in the graph's neighbor order; only the weighting rule differs. Policies read the
//! graph and the weight store but never mutate either.

use crate::graph::Graph;
use crate::weights::WeightStore;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum TransitionPolicy {
    /// Every neighbor weighs 1.
    #[default]
    Uniform,
    /// Neighbor `n` weighs `degree(n)`.
    Degree,
    /// Neighbor `n` weighs `1 / degree(n)`.
    InverseDegree,
    /// Neighbor `n` weighs the stored weight of edge `{current, n}`.
    EdgeWeight,
}

impl TransitionPolicy {
    /// Whether weights come from the weight store (and so can change under
    /// reinforcement).
    pub fn reads_weights(&self) -> bool {
        matches!(self, TransitionPolicy::EdgeWeight)
    }

    pub fn candidates_and_weights<G, S>(
        &self,
        graph: &G,
        current: G::Node,
        store: &S,
    ) -> Result<(Vec<G::Node>, Vec<f64>)>
    where
        G: Graph,
        S: WeightStore<G::Node> + ?Sized,
    {
        let mut candidates = Vec::new();
        let mut weights = Vec::new();
        self.fill(graph, current, store, &mut candidates, &mut weights)?;
        Ok((candidates, weights))
    }

    /// Buffer-reusing form of [`Self::candidates_and_weights`].
    ///
    /// Fails with [`Error::EmptyDomain`] when `current` has no neighbors and with
    /// [`Error::DivisionByZero`] when the inverse-degree rule meets a zero-degree
    /// neighbor.
    pub fn fill<G, S>(
        &self,
        graph: &G,
        current: G::Node,
        store: &S,
        candidates: &mut Vec<G::Node>,
        weights: &mut Vec<f64>,
    ) -> Result<()>
    where
        G: Graph,
        S: WeightStore<G::Node> + ?Sized,
    {
        candidates.clear();
        weights.clear();
        graph.extend_neighbors(current, candidates);
        if candidates.is_empty() {
            return Err(Error::EmptyDomain(format!("node {current:?} has no neighbors")));
        }

        match self {
            TransitionPolicy::Uniform => weights.resize(candidates.len(), 1.0),
            TransitionPolicy::Degree => {
                weights.extend(candidates.iter().map(|&n| graph.degree(n) as f64));
                if weights.iter().all(|&w| w == 0.0) {
                    return Err(Error::InvalidWeight(format!(
                        "every neighbor of {current:?} has degree 0"
                    )));
                }
            }
            TransitionPolicy::InverseDegree => {
                for &n in candidates.iter() {
                    let d = graph.degree(n);
                    if d == 0 {
                        return Err(Error::DivisionByZero(format!(
                            "neighbor {n:?} of {current:?} has degree 0"
                        )));
                    }
                    weights.push(1.0 / d as f64);
                }
            }
            TransitionPolicy::EdgeWeight => {
                weights.extend(candidates.iter().map(|&n| store.weight(current, n)));
            }
        }
        Ok(())
    }

    /// Normalized transition probabilities out of `current`.
    pub fn distribution<G, S>(&self, graph: &G, current: G::Node, store: &S) -> Result<Vec<(G::Node, f64)>>
    where
        G: Graph,
        S: WeightStore<G::Node> + ?Sized,
    {
        let (candidates, weights) = self.candidates_and_weights(graph, current, store)?;
        let sum: f64 = weights.iter().sum();
        if !(sum > 0.0) || !sum.is_finite() {
            return Err(Error::InvalidWeight(format!(
                "weights out of {current:?} must sum to a positive finite value (sum={sum})"
            )));
        }
        Ok(candidates.into_iter().zip(weights).map(|(n, w)| (n, w / sum)).collect())
    }
}

impl fmt::Display for TransitionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitionPolicy::Uniform => "uniform",
            TransitionPolicy::Degree => "degree",
            TransitionPolicy::InverseDegree => "inverse-degree",
            TransitionPolicy::EdgeWeight => "edge-weight",
        };
        f.write_str(name)
    }
}

impl FromStr for TransitionPolicy {
    type Err = Error;

    /// Accepts the canonical names plus the legacy `simple`, `reverse` and `weight`.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uniform" | "simple" => Ok(TransitionPolicy::Uniform),
            "degree" => Ok(TransitionPolicy::Degree),
            "inverse-degree" | "reverse" => Ok(TransitionPolicy::InverseDegree),
            "edge-weight" | "weight" => Ok(TransitionPolicy::EdgeWeight),
            other => Err(Error::InvalidParameter(format!("unknown transition policy: {other:?}"))),
        }
    }
}
