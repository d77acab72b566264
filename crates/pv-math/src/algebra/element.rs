//! Shared interface of alpha-vectors and alpha-matrices.

use super::provenance::Provenance;

/// A value-function element the set algebra can combine and compare.
///
/// `values()` is the flattened entry storage: one value per state for
/// vectors, state-major `(state, objective)` values for matrices. Dominance
/// and lexicographic order are defined over it.
pub trait AlphaElement: Clone + Send + Sync {
    fn values(&self) -> &[f64];

    fn action(&self) -> Option<usize>;

    fn provenance(&self) -> &Provenance;

    /// Entrywise sum with `other`, tagged with `provenance`.
    ///
    /// Panics if shapes or actions differ.
    fn combine(&self, other: &Self, provenance: Provenance) -> Self;
}
