//! Direction-aware selection of the best element at a belief point.
//!
//! One implementation serves maximization and minimization, so both share
//! the same deterministic tie-break: on an exact tie the lexicographically
//! greater element wins when maximizing and the lexicographically lesser
//! one when minimizing.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::element::AlphaElement;
use super::feasibility::ActionSupport;
use super::matrix::AlphaMatrix;
use super::ops::lex_cmp;
use super::vector::AlphaVector;
use crate::error::{MathError, Result};

/// Optimization direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Maximize,
    Minimize,
}

impl Direction {
    pub fn from_is_min(is_min: bool) -> Self {
        if is_min {
            Direction::Minimize
        } else {
            Direction::Maximize
        }
    }

    /// Whether `candidate` strictly improves on `incumbent`.
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }

    /// Lexicographic ordering a tie-winning candidate must have against the
    /// incumbent.
    fn tie_winner(self) -> Ordering {
        match self {
            Direction::Maximize => Ordering::Greater,
            Direction::Minimize => Ordering::Less,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Maximize => write!(f, "max"),
            Direction::Minimize => write!(f, "min"),
        }
    }
}

/// Index and score of the best element under `score`.
fn select_by<E, F>(set: &[E], direction: Direction, score: F) -> Result<(usize, f64)>
where
    E: AlphaElement,
    F: Fn(&E) -> f64,
{
    let mut iter = set.iter().enumerate();
    let (_, first) = iter.next().ok_or(MathError::EmptySet)?;
    let mut best = (0, score(first));
    assert!(!best.1.is_nan(), "element 0 scores NaN at the belief");
    for (i, u) in iter {
        let product = score(u);
        assert!(!product.is_nan(), "element {} scores NaN at the belief", i);
        if direction.improves(product, best.1)
            || (product == best.1 && lex_cmp(u, &set[best.0]) == direction.tie_winner())
        {
            best = (i, product);
        }
    }
    Ok(best)
}

/// Index of the vector optimizing the dot product at `belief`.
pub fn best_index(belief: &[f64], set: &[AlphaVector], direction: Direction) -> Result<usize> {
    select_by(set, direction, |u| u.dot_product(belief)).map(|(i, _)| i)
}

/// Optimal dot product at `belief`.
pub fn optimal_value(belief: &[f64], set: &[AlphaVector], direction: Direction) -> Result<f64> {
    select_by(set, direction, |u| u.dot_product(belief)).map(|(_, v)| v)
}

pub fn get_best_vector_index(belief: &[f64], set: &[AlphaVector]) -> Result<usize> {
    best_index(belief, set, Direction::Maximize)
}

pub fn get_best_vector_index_min_max(
    belief: &[f64],
    set: &[AlphaVector],
    is_min: bool,
) -> Result<usize> {
    best_index(belief, set, Direction::from_is_min(is_min))
}

pub fn get_value(belief: &[f64], set: &[AlphaVector]) -> Result<f64> {
    optimal_value(belief, set, Direction::Maximize)
}

pub fn get_value_min(belief: &[f64], set: &[AlphaVector]) -> Result<f64> {
    optimal_value(belief, set, Direction::Minimize)
}

pub fn get_value_min_max(belief: &[f64], set: &[AlphaVector], is_min: bool) -> Result<f64> {
    optimal_value(belief, set, Direction::from_is_min(is_min))
}

/// Index of the matrix with the highest feasibility-gated weighted value.
///
/// `NoFeasibleElement` if every matrix evaluates to negative infinity.
pub fn best_matrix_index<S>(
    belief: &[f64],
    weights: &[f64],
    set: &[AlphaMatrix],
    support: &S,
) -> Result<usize>
where
    S: ActionSupport + ?Sized,
{
    select_matrix(belief, weights, set, support).map(|(i, _)| i)
}

/// Highest feasibility-gated weighted value over `set`.
pub fn max_matrix_value<S>(
    belief: &[f64],
    weights: &[f64],
    set: &[AlphaMatrix],
    support: &S,
) -> Result<f64>
where
    S: ActionSupport + ?Sized,
{
    select_matrix(belief, weights, set, support).map(|(_, v)| v)
}

fn select_matrix<S>(
    belief: &[f64],
    weights: &[f64],
    set: &[AlphaMatrix],
    support: &S,
) -> Result<(usize, f64)>
where
    S: ActionSupport + ?Sized,
{
    let best = select_by(set, Direction::Maximize, |m| m.value(belief, weights, support))?;
    if best.1 == f64::NEG_INFINITY {
        return Err(MathError::NoFeasibleElement);
    }
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(entries: &[f64], action: usize) -> AlphaVector {
        AlphaVector::new(entries.to_vec(), Some(action))
    }

    #[test]
    fn max_and_min_selection() {
        let set = vec![v(&[1.0, 0.0], 0), v(&[0.0, 1.0], 1), v(&[0.6, 0.6], 2)];
        let b = [0.5, 0.5];
        assert_eq!(get_best_vector_index(&b, &set).unwrap(), 2);
        assert_eq!(get_value(&b, &set).unwrap(), 0.6);
        assert_eq!(get_value_min(&b, &set).unwrap(), 0.5);
        assert_eq!(get_value_min_max(&b, &set, false).unwrap(), 0.6);
        assert_eq!(get_best_vector_index_min_max(&[1.0, 0.0], &set, true).unwrap(), 1);
    }

    #[test]
    fn max_tie_prefers_lex_greater() {
        // Both evaluate to 0.5 at the uniform belief.
        let set = vec![v(&[0.0, 1.0], 0), v(&[1.0, 0.0], 1)];
        for _ in 0..3 {
            assert_eq!(get_best_vector_index(&[0.5, 0.5], &set).unwrap(), 1);
        }
        let reversed = vec![set[1].clone(), set[0].clone()];
        assert_eq!(get_best_vector_index(&[0.5, 0.5], &reversed).unwrap(), 0);
    }

    #[test]
    fn min_tie_prefers_lex_lesser() {
        let set = vec![v(&[1.0, 0.0], 0), v(&[0.0, 1.0], 1)];
        assert_eq!(best_index(&[0.5, 0.5], &set, Direction::Minimize).unwrap(), 1);
    }

    #[test]
    fn empty_set_is_an_error() {
        assert_eq!(get_value(&[1.0], &[]), Err(MathError::EmptySet));
        assert_eq!(get_best_vector_index(&[1.0], &[]), Err(MathError::EmptySet));
    }

    #[test]
    fn direction_parsing() {
        assert_eq!(Direction::from_is_min(true), Direction::Minimize);
        assert_eq!(Direction::default(), Direction::Maximize);
        assert_eq!(Direction::Minimize.to_string(), "min");
    }

    #[test]
    fn blocked_elements_lose_where_the_belief_has_mass() {
        let set = vec![v(&[0.0, f64::NEG_INFINITY], 0), v(&[-1.0, -2.0], 1)];
        assert_eq!(get_best_vector_index(&[0.0, 1.0], &set).unwrap(), 1);
        assert_eq!(get_value(&[0.0, 1.0], &set).unwrap(), -2.0);
        assert_eq!(get_best_vector_index(&[1.0, 0.0], &set).unwrap(), 0);
    }

    #[test]
    #[should_panic(expected = "scores NaN")]
    fn nan_score_panics() {
        let set = vec![v(&[f64::NAN, 0.0], 0), v(&[1.0, 1.0], 1)];
        let _ = get_best_vector_index(&[0.5, 0.5], &set);
    }
}
