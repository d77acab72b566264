//! Multi-objective alpha-matrices.
//!
//! Rows are states, columns are objectives. The backup never sees a weight
//! vector; weights only enter at evaluation time, so one matrix set answers
//! every trade-off query at once.

use serde::{Deserialize, Serialize};

use super::arena::SetIndex;
use super::element::AlphaElement;
use super::feasibility::{is_feasible, ActionSupport};
use super::ops;
use super::provenance::{ObsSource, Provenance};
use super::vector::AlphaVector;

/// One value per (state, objective), tagged with an action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaMatrix {
    /// State-major storage: `values[s * num_objectives + k]`.
    values: Vec<f64>,
    num_states: usize,
    num_objectives: usize,
    action: Option<usize>,
    #[serde(default)]
    provenance: Provenance,
}

impl AlphaMatrix {
    /// Build from `rows[state][objective]`. All rows must have equal width.
    pub fn new(rows: Vec<Vec<f64>>, action: Option<usize>) -> Self {
        let num_states = rows.len();
        let num_objectives = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(num_states * num_objectives);
        for (s, row) in rows.into_iter().enumerate() {
            assert_eq!(
                row.len(),
                num_objectives,
                "row {} has {} objectives, expected {}",
                s,
                row.len(),
                num_objectives
            );
            values.extend(row);
        }
        Self::from_flat(values, num_states, num_objectives, action, Provenance::Fresh)
    }

    /// Build from state-major flat storage.
    pub fn from_flat(
        values: Vec<f64>,
        num_states: usize,
        num_objectives: usize,
        action: Option<usize>,
        provenance: Provenance,
    ) -> Self {
        assert_eq!(
            values.len(),
            num_states * num_objectives,
            "flat storage does not match {}x{}",
            num_states,
            num_objectives
        );
        Self {
            values,
            num_states,
            num_objectives,
            action,
            provenance,
        }
    }

    pub fn zeros(num_states: usize, num_objectives: usize, action: Option<usize>) -> Self {
        Self::from_flat(
            vec![0.0; num_states * num_objectives],
            num_states,
            num_objectives,
            action,
            Provenance::Fresh,
        )
    }

    pub fn num_states(&self) -> usize {
        self.num_states
    }

    pub fn num_objectives(&self) -> usize {
        self.num_objectives
    }

    pub fn entry(&self, state: usize, objective: usize) -> f64 {
        assert!(state < self.num_states && objective < self.num_objectives);
        self.values[state * self.num_objectives + objective]
    }

    pub fn row(&self, state: usize) -> &[f64] {
        let start = state * self.num_objectives;
        &self.values[start..start + self.num_objectives]
    }

    pub fn column(&self, objective: usize) -> Vec<f64> {
        assert!(objective < self.num_objectives);
        (0..self.num_states)
            .map(|s| self.values[s * self.num_objectives + objective])
            .collect()
    }

    pub fn action(&self) -> Option<usize> {
        self.action
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn origin_u(&self) -> Option<SetIndex> {
        self.provenance.origin().map(|(u, _)| u)
    }

    pub fn origin_w(&self) -> Option<SetIndex> {
        self.provenance.origin().map(|(_, w)| w)
    }

    pub fn obs(&self) -> Option<usize> {
        self.provenance.obs()
    }

    pub fn index(&self) -> Option<SetIndex> {
        self.provenance.index()
    }

    pub fn obs_source(&self) -> Option<&ObsSource> {
        self.provenance.obs_source()
    }

    /// Collapse objectives with `weights` into a single-objective vector.
    pub fn scalarize(&self, weights: &[f64]) -> AlphaVector {
        self.assert_weights(weights);
        let entries = (0..self.num_states)
            .map(|s| self.row_value(s, weights))
            .collect();
        AlphaVector::with_provenance(entries, self.action, self.provenance.clone())
    }

    /// Weighted value at `belief`, without the feasibility gate.
    pub fn weighted_dot(&self, belief: &[f64], weights: &[f64]) -> f64 {
        assert_eq!(belief.len(), self.num_states, "belief length mismatch");
        self.assert_weights(weights);
        belief
            .iter()
            .enumerate()
            .filter(|(_, &p)| p != 0.0)
            .map(|(s, &p)| p * self.row_value(s, weights))
            .sum()
    }

    /// Weighted sum of one row. A row holding negative infinity marks a
    /// state where the plan cannot run and stays negative infinity under
    /// any weights.
    fn row_value(&self, state: usize, weights: &[f64]) -> f64 {
        let row = self.row(state);
        if row.contains(&f64::NEG_INFINITY) {
            return f64::NEG_INFINITY;
        }
        row.iter().zip(weights).map(|(v, w)| v * w).sum()
    }

    /// Weighted value at `belief`.
    ///
    /// Returns negative infinity when this matrix's action is not available
    /// at any state in the belief's support: the plan cannot start there.
    pub fn value<S>(&self, belief: &[f64], weights: &[f64], support: &S) -> f64
    where
        S: ActionSupport + ?Sized,
    {
        if !is_feasible(self.action, belief, support) {
            return f64::NEG_INFINITY;
        }
        self.weighted_dot(belief, weights)
    }

    /// Entrywise sum of two same-action matrices.
    pub fn sum_matrices(m1: &AlphaMatrix, m2: &AlphaMatrix) -> AlphaMatrix {
        m1.combine(m2, Provenance::Fresh)
    }

    /// Strict entrywise equality.
    pub fn equals(&self, other: &AlphaMatrix) -> bool {
        self.num_objectives == other.num_objectives && ops::strictly_equal(self, other)
    }

    fn assert_weights(&self, weights: &[f64]) {
        assert_eq!(
            weights.len(),
            self.num_objectives,
            "weight vector length {} does not match {} objectives",
            weights.len(),
            self.num_objectives
        );
    }
}

impl AlphaElement for AlphaMatrix {
    fn values(&self) -> &[f64] {
        &self.values
    }

    fn action(&self) -> Option<usize> {
        self.action
    }

    fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    fn combine(&self, other: &Self, provenance: Provenance) -> Self {
        assert_eq!(self.num_states, other.num_states, "matrix state count mismatch");
        assert_eq!(
            self.num_objectives, other.num_objectives,
            "matrix objective count mismatch"
        );
        assert_eq!(self.action, other.action, "cannot sum matrices of different actions");
        let values = self
            .values
            .iter()
            .zip(&other.values)
            .map(|(a, b)| a + b)
            .collect();
        Self::from_flat(
            values,
            self.num_states,
            self.num_objectives,
            self.action,
            provenance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Avail(Vec<Vec<usize>>);

    impl ActionSupport for Avail {
        fn available_actions(&self, state: usize) -> &[usize] {
            &self.0[state]
        }
    }

    fn m(rows: &[[f64; 2]], action: usize) -> AlphaMatrix {
        AlphaMatrix::new(rows.iter().map(|r| r.to_vec()).collect(), Some(action))
    }

    #[test]
    fn shape_and_access() {
        let a = m(&[[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]], 0);
        assert_eq!(a.num_states(), 3);
        assert_eq!(a.num_objectives(), 2);
        assert_eq!(a.entry(1, 1), 4.0);
        assert_eq!(a.row(2), &[5.0, 6.0]);
        assert_eq!(a.column(0), vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn weighted_value() {
        let a = m(&[[1.0, 10.0], [2.0, 20.0]], 0);
        let avail = Avail(vec![vec![0], vec![0]]);
        // 0.5 * (0.3*1 + 0.7*10) + 0.5 * (0.3*2 + 0.7*20)
        let v = a.value(&[0.5, 0.5], &[0.3, 0.7], &avail);
        assert!((v - 10.95).abs() < 1e-12);
    }

    #[test]
    fn infeasible_action_is_negative_infinity() {
        let a = m(&[[100.0, 100.0], [100.0, 100.0]], 1);
        let avail = Avail(vec![vec![0], vec![1]]);
        assert_eq!(a.value(&[1.0, 0.0], &[0.5, 0.5], &avail), f64::NEG_INFINITY);
        assert!(a.value(&[0.9, 0.1], &[0.5, 0.5], &avail).is_finite());
    }

    #[test]
    fn scalarize_matches_weighted_dot() {
        let a = m(&[[1.0, -1.0], [0.0, 2.0]], 0);
        let v = a.scalarize(&[2.0, 1.0]);
        assert_eq!(v.entries(), &[1.0, 2.0]);
        assert_eq!(v.dot_product(&[0.5, 0.5]), a.weighted_dot(&[0.5, 0.5], &[2.0, 1.0]));
    }

    #[test]
    #[should_panic(expected = "weight vector length")]
    fn weight_length_mismatch_panics() {
        let a = m(&[[1.0, 2.0]], 0);
        let _ = a.weighted_dot(&[1.0], &[1.0]);
    }

    #[test]
    #[should_panic(expected = "objectives, expected")]
    fn ragged_rows_panic() {
        let _ = AlphaMatrix::new(vec![vec![1.0, 2.0], vec![3.0]], Some(0));
    }

    #[test]
    fn sum_and_equality() {
        let a = m(&[[1.0, 2.0], [3.0, 4.0]], 2);
        let b = m(&[[1.0, 1.0], [1.0, 1.0]], 2);
        let s = AlphaMatrix::sum_matrices(&a, &b);
        assert!(s.equals(&m(&[[2.0, 3.0], [4.0, 5.0]], 2)));
        assert_eq!(s.action(), Some(2));
        assert!(!s.equals(&a));
    }

    #[test]
    fn infinite_rows_ignore_weights() {
        let a = m(&[[f64::NEG_INFINITY, f64::NEG_INFINITY], [2.0, 4.0]], 0);
        // a zero weight must not turn the blocked row into NaN
        assert_eq!(a.weighted_dot(&[0.0, 1.0], &[1.0, 0.0]), 2.0);
        assert_eq!(a.weighted_dot(&[0.5, 0.5], &[1.0, 0.0]), f64::NEG_INFINITY);
        assert_eq!(a.weighted_dot(&[0.5, 0.5], &[-1.0, 0.0]), f64::NEG_INFINITY);
        assert_eq!(a.scalarize(&[0.0, 1.0]).entries(), &[f64::NEG_INFINITY, 4.0]);
    }
}
