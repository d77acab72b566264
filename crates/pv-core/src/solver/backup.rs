//! Element-specific pieces of a Bellman backup.

use pv_math::{
    max_matrix_value, optimal_value, AlphaElement, AlphaMatrix, AlphaSet, AlphaVector, Direction,
    MathError, Provenance,
};

use crate::model::Pomdp;

/// Operations the orchestrator needs from a value-function element.
///
/// Implemented for [`AlphaVector`] (single objective) and [`AlphaMatrix`]
/// (all objectives at once, weights applied only at query time).
pub trait Backup: AlphaElement + std::fmt::Debug + 'static {
    /// Whether dropping elements dominated by another action's elements
    /// keeps every query answerable.
    const CROSS_ACTION_PRUNE_SAFE: bool;

    /// The terminal element for `action`: zero where `action` is available,
    /// negative infinity elsewhere.
    fn zero<M: Pomdp + ?Sized>(model: &M, action: usize) -> Self;

    /// Backprojection of every element of `prev` through `(action, obs)`.
    fn backproject<M: Pomdp + ?Sized>(
        model: &M,
        action: usize,
        obs: usize,
        prev: &AlphaSet<Self>,
    ) -> AlphaSet<Self>;

    /// Optimal value at `belief` for each objective, `None` where no element
    /// is feasible.
    fn probe<M: Pomdp + ?Sized>(
        model: &M,
        belief: &[f64],
        set: &[Self],
    ) -> Result<Vec<Option<f64>>, MathError>;
}

/// One backprojected element, `width` values per state.
///
/// `g(s) = R(s,a)/|O| + γ Σ P(s',o|s,a) α(s')` over outcomes observing `obs`.
/// States where `action` is unavailable get negative infinity, as does any
/// state that reaches a negative infinite successor entry with positive
/// probability: the plan cannot run from there.
pub fn backproject_values<M: Pomdp + ?Sized>(
    model: &M,
    action: usize,
    obs: usize,
    next_values: &[f64],
    width: usize,
) -> Vec<f64> {
    let ns = model.num_states();
    assert_eq!(next_values.len(), ns * width, "backprojected element has wrong size");
    let share = 1.0 / model.num_observations() as f64;
    let gamma = model.discount();

    let mut out = vec![f64::NEG_INFINITY; ns * width];
    for s in 0..ns {
        if !model.is_available(s, action) {
            continue;
        }
        let row = &mut out[s * width..(s + 1) * width];
        for (k, g) in row.iter_mut().enumerate() {
            *g = model.reward(s, action, k) * share;
        }
        for succ in model
            .successors(s, action)
            .iter()
            .filter(|x| x.obs == obs && x.prob > 0.0)
        {
            let next = &next_values[succ.next * width..(succ.next + 1) * width];
            for (g, v) in row.iter_mut().zip(next) {
                *g += gamma * succ.prob * v;
            }
        }
    }
    out
}

/// Per-state fill of a terminal element, `width` values per state.
fn terminal_values<M: Pomdp + ?Sized>(model: &M, action: usize, width: usize) -> Vec<f64> {
    (0..model.num_states())
        .flat_map(|s| {
            let v = if model.is_available(s, action) {
                0.0
            } else {
                f64::NEG_INFINITY
            };
            std::iter::repeat(v).take(width)
        })
        .collect()
}

fn leaf(obs: usize, prev: &AlphaSet<impl AlphaElement>, slot: usize) -> Provenance {
    Provenance::Leaf {
        obs,
        index: prev.index(slot),
    }
}

impl Backup for AlphaVector {
    // Blocked states are negative infinity, so a dominating element is
    // runnable wherever the dominated one is.
    const CROSS_ACTION_PRUNE_SAFE: bool = true;

    fn zero<M: Pomdp + ?Sized>(model: &M, action: usize) -> Self {
        AlphaVector::new(terminal_values(model, action, 1), Some(action))
    }

    /// Uses the first objective's rewards.
    fn backproject<M: Pomdp + ?Sized>(
        model: &M,
        action: usize,
        obs: usize,
        prev: &AlphaSet<Self>,
    ) -> AlphaSet<Self> {
        prev.iter()
            .enumerate()
            .map(|(slot, alpha)| {
                let entries = backproject_values(model, action, obs, alpha.entries(), 1);
                AlphaVector::with_provenance(entries, Some(action), leaf(obs, prev, slot))
            })
            .collect()
    }

    fn probe<M: Pomdp + ?Sized>(
        _model: &M,
        belief: &[f64],
        set: &[Self],
    ) -> Result<Vec<Option<f64>>, MathError> {
        let v = optimal_value(belief, set, Direction::Maximize)?;
        Ok(vec![v.is_finite().then_some(v)])
    }
}

impl Backup for AlphaMatrix {
    // Dominance does not survive negative objective weights.
    const CROSS_ACTION_PRUNE_SAFE: bool = false;

    fn zero<M: Pomdp + ?Sized>(model: &M, action: usize) -> Self {
        let (ns, nk) = (model.num_states(), model.num_objectives());
        AlphaMatrix::from_flat(
            terminal_values(model, action, nk),
            ns,
            nk,
            Some(action),
            Provenance::Fresh,
        )
    }

    fn backproject<M: Pomdp + ?Sized>(
        model: &M,
        action: usize,
        obs: usize,
        prev: &AlphaSet<Self>,
    ) -> AlphaSet<Self> {
        let (ns, nk) = (model.num_states(), model.num_objectives());
        prev.iter()
            .enumerate()
            .map(|(slot, alpha)| {
                let values = backproject_values(model, action, obs, alpha.values(), nk);
                AlphaMatrix::from_flat(values, ns, nk, Some(action), leaf(obs, prev, slot))
            })
            .collect()
    }

    /// Each objective is probed with a unit weight vector.
    fn probe<M: Pomdp + ?Sized>(
        model: &M,
        belief: &[f64],
        set: &[Self],
    ) -> Result<Vec<Option<f64>>, MathError> {
        let nk = model.num_objectives();
        let mut weights = vec![0.0; nk];
        let mut out = Vec::with_capacity(nk);
        for k in 0..nk {
            weights[k] = 1.0;
            match max_matrix_value(belief, &weights, set, model) {
                Ok(v) => out.push(Some(v)),
                Err(MathError::NoFeasibleElement) => out.push(None),
                Err(e) => return Err(e),
            }
            weights[k] = 0.0;
        }
        Ok(out)
    }
}
