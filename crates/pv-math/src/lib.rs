//! Value-function algebra for point-based POMDP value iteration.
//!
//! Alpha-vectors (one value per state) and alpha-matrices (one value per
//! state and objective) plus the stateless set operators the backup needs:
//! cross-sums, pointwise dominance pruning and direction-aware selection.

pub mod algebra;
pub mod belief;
pub mod error;

pub use algebra::arena::{AlphaSet, SetIndex};
pub use algebra::element::AlphaElement;
pub use algebra::feasibility::{feasible_actions, is_feasible, ActionSupport};
pub use algebra::matrix::AlphaMatrix;
pub use algebra::ops::{
    contains, cross_sum, cross_sum_policy_graph, cross_sum_restricted, is_pointwise_dominated,
    lex_cmp, prune_pointwise, strictly_equal,
};
pub use algebra::provenance::{ObsSource, Provenance};
pub use algebra::select::{
    best_index, best_matrix_index, get_best_vector_index, get_best_vector_index_min_max,
    get_value, get_value_min, get_value_min_max, max_matrix_value, optimal_value, Direction,
};
pub use algebra::vector::AlphaVector;
pub use belief::Belief;
pub use error::{MathError, Result};
