//! Value and action queries on a finished solution.

use pv_math::{
    best_index, best_matrix_index, is_feasible, max_matrix_value, AlphaMatrix, AlphaVector, Belief,
    Direction, MathError,
};
use tracing::debug;

use super::value_iteration::Solution;
use super::SolverError;
use crate::logging::{event_names, Stage};
use crate::model::Pomdp;

impl<M: Pomdp + ?Sized, E> Solution<'_, M, E> {
    /// State distribution for `belief`, checked against the model size.
    fn distribution(&self, belief: &Belief) -> Result<Vec<f64>, SolverError> {
        let expected = self.model.num_states();
        if belief.len() != expected {
            return Err(SolverError::BeliefDimension {
                expected,
                actual: belief.len(),
            });
        }
        Ok(self.model.to_distribution_over_states(belief))
    }

    fn check_weights(&self, weights: &[f64]) -> Result<(), SolverError> {
        let expected = self.model.num_objectives();
        if weights.len() != expected {
            return Err(SolverError::WeightDimension {
                expected,
                actual: weights.len(),
            });
        }
        Ok(())
    }
}

impl<M: Pomdp + ?Sized> Solution<'_, M, AlphaVector> {
    /// Maximal value at `belief`.
    pub fn value(&self, belief: &Belief) -> Result<f64, SolverError> {
        self.value_in(belief, Direction::Maximize)
    }

    /// Value at `belief` of the element [`best_index`](Self::best_index)
    /// selects.
    pub fn value_in(&self, belief: &Belief, direction: Direction) -> Result<f64, SolverError> {
        self.select(belief, direction).map(|(_, v)| v)
    }

    /// Slot of the optimal element among those that can run at `belief`.
    ///
    /// An element can run when its action is available in the belief's
    /// support and its value there is finite. `NoFeasibleElement` when no
    /// element qualifies.
    pub fn best_index(&self, belief: &Belief, direction: Direction) -> Result<usize, SolverError> {
        let (slot, _) = self.select(belief, direction)?;
        debug!(
            event = event_names::QUERY_ANSWERED,
            stage = %Stage::Query,
            slot,
            direction = %direction,
            "best element selected"
        );
        Ok(slot)
    }

    fn select(&self, belief: &Belief, direction: Direction) -> Result<(usize, f64), SolverError> {
        let dist = self.distribution(belief)?;
        if self.values.is_empty() {
            return Err(MathError::EmptySet.into());
        }
        let (slots, runnable): (Vec<usize>, Vec<AlphaVector>) = self
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| {
                is_feasible(v.action(), &dist, self.model) && v.dot_product(&dist).is_finite()
            })
            .map(|(i, v)| (i, v.clone()))
            .unzip();
        if runnable.is_empty() {
            return Err(MathError::NoFeasibleElement.into());
        }
        let best = best_index(&dist, &runnable, direction)?;
        Ok((slots[best], runnable[best].dot_product(&dist)))
    }

    /// Action of the maximizing feasible element.
    pub fn best_action(&self, belief: &Belief) -> Result<usize, SolverError> {
        self.best_action_in(belief, Direction::Maximize)
    }

    pub fn best_action_in(&self, belief: &Belief, direction: Direction) -> Result<usize, SolverError> {
        let slot = self.best_index(belief, direction)?;
        self.values
            .at(slot)
            .action()
            .ok_or(SolverError::UntaggedElement { slot })
    }
}

impl<M: Pomdp + ?Sized> Solution<'_, M, AlphaMatrix> {
    /// Highest weighted value at `belief`; infeasible matrices never win.
    pub fn value(&self, belief: &Belief, weights: &[f64]) -> Result<f64, SolverError> {
        let dist = self.distribution(belief)?;
        self.check_weights(weights)?;
        Ok(max_matrix_value(&dist, weights, self.values.as_slice(), self.model)?)
    }

    pub fn best_index(&self, belief: &Belief, weights: &[f64]) -> Result<usize, SolverError> {
        let dist = self.distribution(belief)?;
        self.check_weights(weights)?;
        Ok(best_matrix_index(&dist, weights, self.values.as_slice(), self.model)?)
    }

    pub fn best_action(&self, belief: &Belief, weights: &[f64]) -> Result<usize, SolverError> {
        let slot = self.best_index(belief, weights)?;
        self.values
            .at(slot)
            .action()
            .ok_or(SolverError::UntaggedElement { slot })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ExplicitPomdp;
    use crate::solver::ValueIteration;
    use pv_config::SolverConfig;

    /// Action 0 only in state 0, action 1 only in state 1; both self-loop.
    fn split() -> ExplicitPomdp {
        ExplicitPomdp::builder(2, 2, 1)
            .objectives(2)
            .discount(0.5)
            .available(0, vec![0])
            .available(1, vec![1])
            .transition(0, 0, 0, 0, 1.0)
            .transition(1, 1, 1, 0, 1.0)
            .rewards(0, 0, vec![1.0, 0.0])
            .rewards(1, 1, vec![0.0, 1.0])
            .build()
            .unwrap()
    }

    #[test]
    fn vector_queries_check_dimensions() {
        let m = split();
        let sol = ValueIteration::<_, AlphaVector>::new(&m, SolverConfig::default().with_max_stages(2))
            .unwrap()
            .solve()
            .unwrap();
        let bad = Belief::uniform(3);
        assert!(matches!(
            sol.value(&bad),
            Err(SolverError::BeliefDimension { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn vector_best_action_respects_availability() {
        let m = split();
        let sol = ValueIteration::<_, AlphaVector>::new(&m, SolverConfig::default())
            .unwrap()
            .solve()
            .unwrap();
        assert_eq!(sol.best_action(&Belief::point(2, 0)).unwrap(), 0);
        assert_eq!(sol.best_action(&Belief::point(2, 1)).unwrap(), 1);
    }

    #[test]
    fn matrix_queries_gate_feasibility() {
        let m = split();
        let sol = ValueIteration::<_, AlphaMatrix>::new(&m, SolverConfig::default())
            .unwrap()
            .solve()
            .unwrap();

        let at0 = Belief::point(2, 0);
        assert_eq!(sol.best_action(&at0, &[0.0, 1.0]).unwrap(), 0);
        assert!((sol.value(&at0, &[1.0, 0.0]).unwrap() - 2.0).abs() < 1e-5);

        assert!(matches!(
            sol.value(&at0, &[1.0]),
            Err(SolverError::WeightDimension { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn empty_solution_reports_empty_set() {
        let m = split();
        let mut sol = ValueIteration::<_, AlphaVector>::new(&m, SolverConfig::default().with_max_stages(1))
            .unwrap()
            .solve()
            .unwrap();
        sol.values = pv_math::AlphaSet::empty();
        assert!(matches!(
            sol.best_action(&Belief::point(2, 0)),
            Err(SolverError::Math(MathError::EmptySet))
        ));
        assert!(matches!(
            sol.value(&Belief::point(2, 0)),
            Err(SolverError::Math(MathError::EmptySet))
        ));
    }

    /// State 1 is absorbing, allows only action 0 and costs 1 per step.
    /// Action 1 exists only in state 0, where it loops with reward 2.
    fn trap() -> ExplicitPomdp {
        ExplicitPomdp::builder(2, 2, 1)
            .discount(0.5)
            .available(0, vec![0, 1])
            .available(1, vec![0])
            .transition(0, 0, 1, 0, 1.0)
            .transition(0, 1, 0, 0, 1.0)
            .transition(1, 0, 1, 0, 1.0)
            .reward(1, 0, -1.0)
            .reward(0, 1, 2.0)
            .build()
            .unwrap()
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn blocked_plans_do_not_lift_values() {
        let m = trap();
        let sol = ValueIteration::<_, AlphaVector>::new(&m, SolverConfig::default())
            .unwrap()
            .solve()
            .unwrap();
        assert!(sol.termination.is_converged());

        // -1 / (1 - γ)
        let at1 = Belief::point(2, 1);
        assert!(close(sol.value(&at1).unwrap(), -2.0));
        assert_eq!(sol.best_action(&at1).unwrap(), 0);

        let at0 = Belief::point(2, 0);
        assert!(close(sol.value(&at0).unwrap(), 4.0));
        assert_eq!(sol.best_action(&at0).unwrap(), 1);

        // action 1 cannot run with mass on state 1
        let uniform = Belief::uniform(2);
        assert!(close(sol.value(&uniform).unwrap(), -1.5));
        assert_eq!(sol.best_action(&uniform).unwrap(), 0);
    }

    #[test]
    fn blocked_plans_do_not_lift_matrix_values() {
        let m = trap();
        let sol = ValueIteration::<_, AlphaMatrix>::new(&m, SolverConfig::default())
            .unwrap()
            .solve()
            .unwrap();
        assert!(close(sol.value(&Belief::point(2, 1), &[1.0]).unwrap(), -2.0));
        assert!(close(sol.value(&Belief::uniform(2), &[1.0]).unwrap(), -1.5));
        assert_eq!(sol.best_action(&Belief::uniform(2), &[1.0]).unwrap(), 0);
    }

    #[test]
    fn cross_action_pruning_keeps_runnable_plans() {
        let m = trap();
        for stages in [1, 3] {
            let cfg = SolverConfig::default()
                .with_max_stages(stages)
                .with_prune_across_actions(true);
            let sol = ValueIteration::<_, AlphaVector>::new(&m, cfg)
                .unwrap()
                .solve()
                .unwrap();
            assert_eq!(sol.best_action(&Belief::point(2, 1)).unwrap(), 0);
            assert_eq!(sol.best_action(&Belief::point(2, 0)).unwrap(), 1);
        }
    }

    #[test]
    fn value_belongs_to_the_selected_element() {
        let m = trap();
        let sol = ValueIteration::<_, AlphaVector>::new(&m, SolverConfig::default().with_max_stages(4))
            .unwrap()
            .solve()
            .unwrap();
        for p in [0.0, 0.25, 0.5, 1.0] {
            let b = Belief::new(vec![p, 1.0 - p]).unwrap();
            for direction in [Direction::Maximize, Direction::Minimize] {
                let slot = sol.best_index(&b, direction).unwrap();
                let expected = sol.values.at(slot).dot_product(b.probs());
                assert_eq!(sol.value_in(&b, direction).unwrap(), expected);
            }
        }
    }
}
