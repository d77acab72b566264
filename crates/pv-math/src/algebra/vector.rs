//! Single-objective alpha-vectors.

use serde::{Deserialize, Serialize};

use super::arena::SetIndex;
use super::element::AlphaElement;
use super::ops;
use super::provenance::{ObsSource, Provenance};

/// A linear functional over the belief simplex: one value per state, tagged
/// with the action of the conditional plan it represents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlphaVector {
    entries: Vec<f64>,
    action: Option<usize>,
    #[serde(default)]
    provenance: Provenance,
}

impl AlphaVector {
    pub fn new(entries: Vec<f64>, action: Option<usize>) -> Self {
        Self::with_provenance(entries, action, Provenance::Fresh)
    }

    pub fn with_provenance(
        entries: Vec<f64>,
        action: Option<usize>,
        provenance: Provenance,
    ) -> Self {
        Self {
            entries,
            action,
            provenance,
        }
    }

    pub fn zeros(num_states: usize, action: Option<usize>) -> Self {
        Self::new(vec![0.0; num_states], action)
    }

    pub fn entry(&self, i: usize) -> f64 {
        assert!(i < self.entries.len());
        self.entries[i]
    }

    pub fn entries(&self) -> &[f64] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
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

    /// Smallest entry (+inf for an empty vector).
    pub fn min_value(&self) -> f64 {
        self.entries.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn average_value(&self) -> f64 {
        self.entries.iter().sum::<f64>() / self.entries.len() as f64
    }

    /// Value of this vector at belief `b`.
    ///
    /// States outside the belief's support are skipped, so a negative
    /// infinite entry only matters where the belief puts mass.
    pub fn dot_product(&self, b: &[f64]) -> f64 {
        assert_eq!(self.entries.len(), b.len(), "belief length mismatch");
        self.entries
            .iter()
            .zip(b)
            .filter(|(_, &p)| p != 0.0)
            .map(|(e, p)| e * p)
            .sum()
    }

    /// True if some vector in `set` is entrywise >= this one.
    pub fn is_pointwise_dominated(&self, set: &[AlphaVector]) -> bool {
        ops::is_pointwise_dominated(self, set)
    }

    /// Strict entrywise equality; vectors of different length are unequal.
    pub fn equals(&self, other: &AlphaVector) -> bool {
        ops::strictly_equal(self, other)
    }

    /// Entrywise sum of two same-action vectors.
    pub fn sum_vectors(v1: &AlphaVector, v2: &AlphaVector) -> AlphaVector {
        v1.combine(v2, Provenance::Fresh)
    }

    /// True iff `v1` is lexicographically greater than `v2`.
    pub fn lex_greater(v1: &AlphaVector, v2: &AlphaVector) -> bool {
        ops::lex_cmp(v1, v2) == std::cmp::Ordering::Greater
    }
}

impl AlphaElement for AlphaVector {
    fn values(&self) -> &[f64] {
        &self.entries
    }

    fn action(&self) -> Option<usize> {
        self.action
    }

    fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    fn combine(&self, other: &Self, provenance: Provenance) -> Self {
        assert_eq!(self.len(), other.len(), "vector length mismatch");
        assert_eq!(self.action, other.action, "cannot sum vectors of different actions");
        let entries = self
            .entries
            .iter()
            .zip(&other.entries)
            .map(|(a, b)| a + b)
            .collect();
        Self::with_provenance(entries, self.action, provenance)
    }
}

impl std::fmt::Display for AlphaVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<AlphaVector(")?;
        for e in &self.entries {
            write!(f, "{} ", e)?;
        }
        write!(f, ")>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dot_product_weights_entries() {
        let v = AlphaVector::new(vec![2.0, 4.0], Some(0));
        assert_eq!(v.dot_product(&[0.25, 0.75]), 3.5);
    }

    #[test]
    fn summary_statistics() {
        let v = AlphaVector::new(vec![3.0, -1.0, 4.0], None);
        assert_eq!(v.min_value(), -1.0);
        assert_eq!(v.average_value(), 2.0);
        assert_eq!(v.len(), 3);
    }

    #[test]
    fn sum_inherits_action_and_is_fresh() {
        let a = AlphaVector::new(vec![1.0, 2.0], Some(1));
        let b = AlphaVector::new(vec![0.5, 0.5], Some(1));
        let s = AlphaVector::sum_vectors(&a, &b);
        assert_eq!(s.entries(), &[1.5, 2.5]);
        assert_eq!(s.action(), Some(1));
        assert_eq!(*s.provenance(), Provenance::Fresh);
        assert!(s.origin_u().is_none());
    }

    #[test]
    #[should_panic(expected = "different actions")]
    fn sum_of_mismatched_actions_panics() {
        let a = AlphaVector::new(vec![1.0], Some(0));
        let b = AlphaVector::new(vec![1.0], Some(1));
        let _ = AlphaVector::sum_vectors(&a, &b);
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn sum_of_mismatched_lengths_panics() {
        let a = AlphaVector::new(vec![1.0], Some(0));
        let b = AlphaVector::new(vec![1.0, 2.0], Some(0));
        let _ = AlphaVector::sum_vectors(&a, &b);
    }

    #[test]
    fn equality_is_strict() {
        let a = AlphaVector::new(vec![1.0, 2.0], Some(0));
        let b = AlphaVector::new(vec![1.0, 2.0 + 1e-12], Some(0));
        let c = AlphaVector::new(vec![1.0, 2.0], Some(3));
        assert!(!a.equals(&b));
        assert!(a.equals(&c));
        assert!(!a.equals(&AlphaVector::new(vec![1.0], Some(0))));
    }

    #[test]
    fn display_lists_entries() {
        let v = AlphaVector::new(vec![1.0, 0.5], None);
        assert_eq!(v.to_string(), "<AlphaVector(1 0.5 )>");
    }

    #[test]
    fn dot_product_skips_states_without_mass() {
        let v = AlphaVector::new(vec![f64::NEG_INFINITY, 2.0], Some(0));
        assert_eq!(v.dot_product(&[0.0, 1.0]), 2.0);
        assert_eq!(v.dot_product(&[0.5, 0.5]), f64::NEG_INFINITY);
    }
}
