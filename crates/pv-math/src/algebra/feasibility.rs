//! Action availability at a belief point.

use std::collections::BTreeSet;

use crate::belief::support_of;

/// Source of per-state action availability (implemented by POMDP models).
pub trait ActionSupport {
    fn available_actions(&self, state: usize) -> &[usize];
}

/// Union of the actions available at every state with positive mass.
pub fn feasible_actions<S>(belief: &[f64], support: &S) -> BTreeSet<usize>
where
    S: ActionSupport + ?Sized,
{
    let mut actions = BTreeSet::new();
    for s in support_of(belief) {
        actions.extend(support.available_actions(s).iter().copied());
    }
    actions
}

/// Whether `action` can be taken at `belief`.
///
/// An unset action is never feasible.
pub fn is_feasible<S>(action: Option<usize>, belief: &[f64], support: &S) -> bool
where
    S: ActionSupport + ?Sized,
{
    let Some(action) = action else {
        return false;
    };
    support_of(belief).any(|s| support.available_actions(s).contains(&action))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Table(Vec<Vec<usize>>);

    impl ActionSupport for Table {
        fn available_actions(&self, state: usize) -> &[usize] {
            &self.0[state]
        }
    }

    #[test]
    fn union_over_support_only() {
        let t = Table(vec![vec![0], vec![1, 2], vec![3]]);
        let acts = feasible_actions(&[0.5, 0.5, 0.0], &t);
        assert_eq!(acts.into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(is_feasible(Some(2), &[0.5, 0.5, 0.0], &t));
        assert!(!is_feasible(Some(3), &[0.5, 0.5, 0.0], &t));
        assert!(!is_feasible(None, &[0.5, 0.5, 0.0], &t));
    }
}
