//! Belief points: probability distributions over POMDP states.

use serde::{Deserialize, Serialize};

use crate::error::{MathError, Result};

/// Allowed deviation of a belief's total mass from 1.
pub const SUM_TOLERANCE: f64 = 1e-6;

/// A probability distribution over states.
///
/// Validated once at construction; the algebra never re-checks it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Belief {
    probs: Vec<f64>,
}

impl Belief {
    /// Create a belief, rejecting negative, non-finite or unnormalized input.
    pub fn new(probs: Vec<f64>) -> Result<Self> {
        if probs.is_empty() {
            return Err(MathError::InvalidBelief("belief has no states".to_string()));
        }
        for (s, &p) in probs.iter().enumerate() {
            if !p.is_finite() || p < 0.0 {
                return Err(MathError::InvalidBelief(format!(
                    "probability for state {} is {}",
                    s, p
                )));
            }
        }
        let sum: f64 = probs.iter().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(MathError::InvalidBelief(format!(
                "probabilities sum to {}, expected 1",
                sum
            )));
        }
        Ok(Self { probs })
    }

    /// All mass on a single state.
    pub fn point(num_states: usize, state: usize) -> Self {
        assert!(state < num_states, "state {} out of range", state);
        let mut probs = vec![0.0; num_states];
        probs[state] = 1.0;
        Self { probs }
    }

    /// Uniform distribution over `num_states` states.
    pub fn uniform(num_states: usize) -> Self {
        assert!(num_states > 0, "uniform belief needs at least one state");
        Self {
            probs: vec![1.0 / num_states as f64; num_states],
        }
    }

    pub fn probs(&self) -> &[f64] {
        &self.probs
    }

    pub fn prob(&self, state: usize) -> f64 {
        self.probs[state]
    }

    pub fn len(&self) -> usize {
        self.probs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probs.is_empty()
    }

    /// States with strictly positive mass.
    pub fn support(&self) -> impl Iterator<Item = usize> + '_ {
        support_of(&self.probs)
    }
}

/// States with strictly positive mass in a raw distribution.
pub fn support_of(probs: &[f64]) -> impl Iterator<Item = usize> + '_ {
    probs
        .iter()
        .enumerate()
        .filter(|(_, &p)| p > 0.0)
        .map(|(s, _)| s)
}

impl AsRef<[f64]> for Belief {
    fn as_ref(&self) -> &[f64] {
        &self.probs
    }
}

impl TryFrom<Vec<f64>> for Belief {
    type Error = MathError;

    fn try_from(probs: Vec<f64>) -> Result<Self> {
        Belief::new(probs)
    }
}

impl From<Belief> for Vec<f64> {
    fn from(belief: Belief) -> Self {
        belief.probs
    }
}
