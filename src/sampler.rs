//! Weighted categorical sampling.

use crate::{Error, Result};
use rand::Rng;
use std::fmt::Debug;

/// Draw one candidate with probability `w_i / Σw`.
///
/// Fails with [`Error::EmptyDomain`] for an empty candidate set and with
/// [`Error::InvalidWeight`] when a weight is negative or non-finite, or when the
/// weights sum to zero. Zero-weight candidates are never returned.
///
/// A single candidate is returned without touching the RNG.
pub fn sample_weighted<N, R>(candidates: &[N], weights: &[f64], rng: &mut R) -> Result<N>
where
    N: Copy + Debug,
    R: Rng,
{
    if candidates.is_empty() {
        return Err(Error::EmptyDomain("no candidates to sample from".to_string()));
    }
    if candidates.len() != weights.len() {
        return Err(Error::InvalidParameter(format!(
            "candidates and weights must have equal length (candidates={} weights={})",
            candidates.len(),
            weights.len()
        )));
    }

    let sum = checked_sum(candidates, weights)?;
    if candidates.len() == 1 {
        return Ok(candidates[0]);
    }

    let mut r = rng.random::<f64>() * sum;
    for (i, &w) in weights.iter().enumerate() {
        if w > 0.0 && r < w {
            return Ok(candidates[i]);
        }
        r -= w;
    }

    // Rounding can leave `r` marginally above the last bucket; fall back to the
    // last candidate that carries mass.
    let last = weights.iter().rposition(|&w| w > 0.0).unwrap_or(candidates.len() - 1);
    Ok(candidates[last])
}

fn checked_sum<N: Debug>(candidates: &[N], weights: &[f64]) -> Result<f64> {
    let mut sum = 0.0f64;
    for (c, &w) in candidates.iter().zip(weights) {
        if !w.is_finite() {
            return Err(Error::InvalidWeight(format!("non-finite weight {w} for {c:?}")));
        }
        if w < 0.0 {
            return Err(Error::InvalidWeight(format!("negative weight {w} for {c:?}")));
        }
        sum += w;
    }
    if !(sum > 0.0) || !sum.is_finite() {
        return Err(Error::InvalidWeight(format!("weights must sum to a positive finite value (sum={sum})")));
    }
    Ok(sum)
}
