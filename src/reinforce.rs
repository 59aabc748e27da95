//! Edge reinforcement: bump the traversed edge's weight after each step.

use crate::graph::Graph;
use crate::weights::WeightStore;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Reinforcement {
    /// Weights never change.
    #[default]
    None,
    /// Add a constant `Δ` to every traversed edge.
    Fixed(f64),
    /// Add `degree(departed)`: hubs reinforce their outgoing edges faster.
    DegreeProportional,
}

impl Reinforcement {
    pub fn validate(&self) -> Result<()> {
        match *self {
            Reinforcement::Fixed(delta) if !delta.is_finite() || delta < 0.0 => Err(Error::InvalidParameter(
                format!("fixed reinforcement delta must be finite and >= 0, got {delta}"),
            )),
            _ => Ok(()),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Reinforcement::None)
    }

    /// Increment for leaving `departed`, or `None` when nothing is reinforced.
    ///
    /// Degree-proportional increments use `degree(departed)` as seen before this
    /// step's update.
    pub fn delta<G: Graph>(&self, graph: &G, departed: G::Node) -> Option<f64> {
        match *self {
            Reinforcement::None => None,
            Reinforcement::Fixed(delta) => Some(delta),
            Reinforcement::DegreeProportional => Some(graph.degree(departed) as f64),
        }
    }

    /// Reinforce edge `{from, to}` after a step `from -> to`.
    pub fn apply<G, S>(&self, graph: &G, store: &mut S, from: G::Node, to: G::Node) -> Result<()>
    where
        G: Graph,
        S: WeightStore<G::Node> + ?Sized,
    {
        match self.delta(graph, from) {
            Some(delta) => store.increment(from, to, delta),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Reinforcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reinforcement::None => f.write_str("none"),
            Reinforcement::Fixed(delta) => write!(f, "fixed:{delta}"),
            Reinforcement::DegreeProportional => f.write_str("degree"),
        }
    }
}

impl FromStr for Reinforcement {
    type Err = Error;

    /// `none`, `degree`, `fixed:<Δ>` or `fixed(<Δ>)`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase();
        let parsed = match s.as_str() {
            "none" => Reinforcement::None,
            "degree" | "degree-proportional" => Reinforcement::DegreeProportional,
            other => {
                let raw = other
                    .strip_prefix("fixed:")
                    .or_else(|| other.strip_prefix("fixed(").and_then(|r| r.strip_suffix(')')))
                    .ok_or_else(|| Error::InvalidParameter(format!("unknown reinforcement: {other:?}")))?;
                let delta: f64 = raw
                    .trim()
                    .parse()
                    .map_err(|_| Error::InvalidParameter(format!("invalid reinforcement delta: {raw:?}")))?;
                Reinforcement::Fixed(delta)
            }
        };
        parsed.validate()?;
        Ok(parsed)
    }
}
