//! Property tests for the value-iteration engine on random small models.

use proptest::prelude::*;

use pv_config::SolverConfig;
use pv_core::model::ExplicitPomdp;
use pv_core::solver::ValueIteration;
use pv_math::{AlphaMatrix, AlphaVector, Belief};

const TOL: f64 = 1e-9;

/// Random two-state, two-action model with one observation.
#[derive(Debug, Clone)]
struct RandomModel {
    stay: Vec<f64>,
    rewards: Vec<f64>,
    discount: f64,
}

impl RandomModel {
    fn build(&self) -> ExplicitPomdp {
        let mut b = ExplicitPomdp::builder(2, 2, 1).discount(self.discount);
        for s in 0..2 {
            for a in 0..2 {
                let p = self.stay[s * 2 + a];
                b = b
                    .transition(s, a, s, 0, p)
                    .transition(s, a, 1 - s, 0, 1.0 - p)
                    .reward(s, a, self.rewards[s * 2 + a]);
            }
        }
        b.build().unwrap()
    }

    fn max_reward(&self) -> f64 {
        self.rewards.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

fn random_model() -> impl Strategy<Value = RandomModel> {
    (
        prop::collection::vec(0.0f64..=1.0, 4),
        prop::collection::vec(0.0f64..10.0, 4),
        0.1f64..0.9,
    )
        .prop_map(|(stay, rewards, discount)| RandomModel {
            stay,
            rewards,
            discount,
        })
}

/// State 1 is absorbing and allows only action 0, at a cost `trap_cost`
/// per step; state 0 allows both actions.
#[derive(Debug, Clone)]
struct TrapModel {
    stay: Vec<f64>,
    rewards: Vec<f64>,
    trap_cost: f64,
    discount: f64,
}

impl TrapModel {
    fn build(&self) -> ExplicitPomdp {
        let mut b = ExplicitPomdp::builder(2, 2, 1)
            .discount(self.discount)
            .available(0, vec![0, 1])
            .available(1, vec![0])
            .transition(1, 0, 1, 0, 1.0)
            .reward(1, 0, -self.trap_cost);
        for a in 0..2 {
            let p = self.stay[a];
            b = b
                .transition(0, a, 0, 0, p)
                .transition(0, a, 1, 0, 1.0 - p)
                .reward(0, a, self.rewards[a]);
        }
        b.build().unwrap()
    }
}

fn trap_model() -> impl Strategy<Value = TrapModel> {
    (
        prop::collection::vec(0.0f64..=1.0, 2),
        prop::collection::vec(-10.0f64..10.0, 2),
        0.1f64..10.0,
        0.1f64..0.8,
    )
        .prop_map(|(stay, rewards, trap_cost, discount)| TrapModel {
            stay,
            rewards,
            trap_cost,
            discount,
        })
}

fn vector_value(model: &ExplicitPomdp, stages: u32, parallel: bool, belief: &Belief) -> f64 {
    let cfg = SolverConfig::default()
        .with_max_stages(stages)
        .with_parallel(parallel);
    ValueIteration::<_, AlphaVector>::new(model, cfg)
        .unwrap()
        .solve()
        .unwrap()
        .value(belief)
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn first_stage_value_is_best_immediate_reward(m in random_model()) {
        let model = m.build();
        for s in 0..2 {
            let expected = m.rewards[s * 2].max(m.rewards[s * 2 + 1]);
            let v = vector_value(&model, 1, false, &Belief::point(2, s));
            prop_assert!((v - expected).abs() < TOL, "state {}: {} vs {}", s, v, expected);
        }
    }

    #[test]
    fn nonnegative_rewards_give_monotone_bounded_values(
        m in random_model(),
        p in 0.0f64..=1.0,
    ) {
        let model = m.build();
        let belief = Belief::new(vec![p, 1.0 - p]).unwrap();
        let mut last = 0.0;
        for stages in 1..=4 {
            let v = vector_value(&model, stages, false, &belief);
            let bound = m.max_reward() * (1.0 - m.discount.powi(stages as i32)) / (1.0 - m.discount);
            prop_assert!(v + TOL >= last, "stage {}: {} < {}", stages, v, last);
            prop_assert!(v <= bound + TOL, "stage {}: {} > {}", stages, v, bound);
            last = v;
        }
    }

    #[test]
    fn parallel_backups_match_serial(m in random_model(), p in 0.0f64..=1.0) {
        let model = m.build();
        let belief = Belief::new(vec![p, 1.0 - p]).unwrap();
        let serial = vector_value(&model, 3, false, &belief);
        let parallel = vector_value(&model, 3, true, &belief);
        prop_assert!((serial - parallel).abs() < TOL);
    }

    #[test]
    fn single_objective_matrices_agree_with_vectors(m in random_model(), p in 0.0f64..=1.0) {
        let model = m.build();
        let belief = Belief::new(vec![p, 1.0 - p]).unwrap();
        let cfg = SolverConfig::default().with_max_stages(3);
        let matrices = ValueIteration::<_, AlphaMatrix>::new(&model, cfg)
            .unwrap()
            .solve()
            .unwrap();
        let mv = matrices.value(&belief, &[1.0]).unwrap();
        let vv = vector_value(&model, 3, false, &belief);
        prop_assert!((mv - vv).abs() < 1e-7, "{} vs {}", mv, vv);
    }

    #[test]
    fn restricted_actions_with_costs_reach_closed_form(
        m in trap_model(),
        prune in any::<bool>(),
    ) {
        let model = m.build();
        let cfg = SolverConfig::default().with_prune_across_actions(prune);
        let sol = ValueIteration::<_, AlphaVector>::new(&model, cfg)
            .unwrap()
            .solve()
            .unwrap();
        prop_assert!(sol.termination.is_converged());

        let trap = Belief::point(2, 1);
        let expected = -m.trap_cost / (1.0 - m.discount);
        let v = sol.value(&trap).unwrap();
        prop_assert!((v - expected).abs() < 1e-4, "{} vs {}", v, expected);
        prop_assert_eq!(sol.best_action(&trap).unwrap(), 0);
        prop_assert!(sol.best_action(&Belief::uniform(2)).is_ok());
    }
}
