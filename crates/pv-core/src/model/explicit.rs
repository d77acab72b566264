//! Explicit, fully enumerated POMDP loaded from JSON or built in code.
//!
//! ```json
//! {
//!   "states": 2, "actions": 2, "observations": 1, "discount": 0.95,
//!   "transitions": [{"state": 0, "action": 0, "next": 1, "obs": 0, "prob": 1.0}],
//!   "rewards": [{"state": 0, "action": 0, "reward": 1.0}]
//! }
//! ```

use std::fs;
use std::path::Path;

use pv_math::{ActionSupport, Belief};
use serde::{Deserialize, Serialize};

use super::{ModelError, Pomdp, Successor};

/// Allowed deviation of a transition row's mass from 1.
const DISTRIBUTION_TOLERANCE: f64 = 1e-6;

/// On-disk model layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub name: Option<String>,
    pub states: usize,
    pub actions: usize,
    pub observations: usize,
    #[serde(default = "default_objectives")]
    pub objectives: usize,
    pub discount: f64,
    /// Per-state action lists; every action everywhere when omitted.
    #[serde(default)]
    pub available_actions: Option<Vec<Vec<usize>>>,
    pub transitions: Vec<TransitionEntry>,
    #[serde(default)]
    pub rewards: Vec<RewardEntry>,
    #[serde(default)]
    pub initial_belief: Option<Vec<f64>>,
}

fn default_objectives() -> usize {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionEntry {
    pub state: usize,
    pub action: usize,
    pub next: usize,
    pub obs: usize,
    pub prob: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardEntry {
    pub state: usize,
    pub action: usize,
    pub reward: RewardValue,
}

/// A scalar reward, or one value per objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RewardValue {
    Scalar(f64),
    PerObjective(Vec<f64>),
}

/// Validated explicit POMDP.
#[derive(Debug, Clone)]
pub struct ExplicitPomdp {
    name: Option<String>,
    num_states: usize,
    num_actions: usize,
    num_observations: usize,
    num_objectives: usize,
    discount: f64,
    available: Vec<Vec<usize>>,
    /// Indexed by `state * num_actions + action`.
    successors: Vec<Vec<Successor>>,
    /// Indexed by `(state * num_actions + action) * num_objectives + objective`.
    rewards: Vec<f64>,
    initial_belief: Option<Belief>,
}

impl ExplicitPomdp {
    pub fn builder(states: usize, actions: usize, observations: usize) -> ExplicitPomdpBuilder {
        ExplicitPomdpBuilder::new(states, actions, observations)
    }

    /// Load and validate a model file.
    pub fn from_file(path: &Path) -> Result<Self, ModelError> {
        if !path.exists() {
            return Err(ModelError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ModelFile = serde_json::from_str(&raw).map_err(|source| ModelError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_model_file(file)
    }

    /// Validate an in-memory model description.
    pub fn from_model_file(file: ModelFile) -> Result<Self, ModelError> {
        let mut builder = ExplicitPomdp::builder(file.states, file.actions, file.observations)
            .discount(file.discount)
            .objectives(file.objectives);
        if let Some(name) = file.name {
            builder = builder.name(name);
        }
        if let Some(lists) = file.available_actions {
            if lists.len() != file.states {
                return Err(ModelError::invalid(
                    "available_actions",
                    format!("has {} entries, expected {}", lists.len(), file.states),
                ));
            }
            for (s, actions) in lists.into_iter().enumerate() {
                builder = builder.available(s, actions);
            }
        }
        for t in file.transitions {
            builder = builder.transition(t.state, t.action, t.next, t.obs, t.prob);
        }
        for r in file.rewards {
            builder = match r.reward {
                RewardValue::Scalar(v) => builder.reward(r.state, r.action, v),
                RewardValue::PerObjective(v) => builder.rewards(r.state, r.action, v),
            };
        }
        if let Some(b) = file.initial_belief {
            builder = builder.initial_belief(b);
        }
        builder.build()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Belief declared by the model file, if any.
    pub fn initial_belief(&self) -> Option<&Belief> {
        self.initial_belief.as_ref()
    }

    fn pair(&self, state: usize, action: usize) -> usize {
        state * self.num_actions + action
    }
}

impl ActionSupport for ExplicitPomdp {
    fn available_actions(&self, state: usize) -> &[usize] {
        &self.available[state]
    }
}

impl Pomdp for ExplicitPomdp {
    fn num_states(&self) -> usize {
        self.num_states
    }

    fn num_actions(&self) -> usize {
        self.num_actions
    }

    fn num_observations(&self) -> usize {
        self.num_observations
    }

    fn num_objectives(&self) -> usize {
        self.num_objectives
    }

    fn discount(&self) -> f64 {
        self.discount
    }

    fn successors(&self, state: usize, action: usize) -> &[Successor] {
        &self.successors[self.pair(state, action)]
    }

    fn reward(&self, state: usize, action: usize, objective: usize) -> f64 {
        self.rewards[self.pair(state, action) * self.num_objectives + objective]
    }
}

/// Programmatic construction; all checks happen in [`ExplicitPomdpBuilder::build`].
#[derive(Debug, Clone)]
pub struct ExplicitPomdpBuilder {
    name: Option<String>,
    states: usize,
    actions: usize,
    observations: usize,
    objectives: usize,
    discount: f64,
    available: Vec<(usize, Vec<usize>)>,
    transitions: Vec<TransitionEntry>,
    rewards: Vec<(usize, usize, Vec<f64>)>,
    initial_belief: Option<Vec<f64>>,
}

impl ExplicitPomdpBuilder {
    pub fn new(states: usize, actions: usize, observations: usize) -> Self {
        Self {
            name: None,
            states,
            actions,
            observations,
            objectives: 1,
            discount: 0.95,
            available: Vec::new(),
            transitions: Vec::new(),
            rewards: Vec::new(),
            initial_belief: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn discount(mut self, discount: f64) -> Self {
        self.discount = discount;
        self
    }

    pub fn objectives(mut self, objectives: usize) -> Self {
        self.objectives = objectives;
        self
    }

    /// Restrict the actions available in `state`.
    pub fn available(mut self, state: usize, actions: Vec<usize>) -> Self {
        self.available.push((state, actions));
        self
    }

    pub fn transition(mut self, state: usize, action: usize, next: usize, obs: usize, prob: f64) -> Self {
        self.transitions.push(TransitionEntry {
            state,
            action,
            next,
            obs,
            prob,
        });
        self
    }

    /// Single-objective reward.
    pub fn reward(self, state: usize, action: usize, reward: f64) -> Self {
        self.rewards(state, action, vec![reward])
    }

    /// One reward per objective.
    pub fn rewards(mut self, state: usize, action: usize, rewards: Vec<f64>) -> Self {
        self.rewards.push((state, action, rewards));
        self
    }

    pub fn initial_belief(mut self, belief: Vec<f64>) -> Self {
        self.initial_belief = Some(belief);
        self
    }

    pub fn build(self) -> Result<ExplicitPomdp, ModelError> {
        let (ns, na, no, nk) = (self.states, self.actions, self.observations, self.objectives);
        for (field, n) in [("states", ns), ("actions", na), ("observations", no), ("objectives", nk)] {
            if n == 0 {
                return Err(ModelError::invalid(field, "must be at least 1"));
            }
        }
        if !self.discount.is_finite() || self.discount <= 0.0 || self.discount > 1.0 {
            return Err(ModelError::invalid(
                "discount",
                format!("must be in (0, 1], got {}", self.discount),
            ));
        }

        let mut declared: Vec<Option<Vec<usize>>> = vec![None; ns];
        for (s, list) in self.available {
            check_index("available_actions", "state", s, ns)?;
            declared[s] = Some(list);
        }
        let mut available = Vec::with_capacity(ns);
        for (s, list) in declared.into_iter().enumerate() {
            let mut list = list.unwrap_or_else(|| (0..na).collect());
            list.sort_unstable();
            list.dedup();
            if list.is_empty() {
                return Err(ModelError::invalid(
                    format!("available_actions[{}]", s),
                    "every state needs at least one action",
                ));
            }
            if let Some(&a) = list.iter().find(|&&a| a >= na) {
                return Err(ModelError::invalid(
                    format!("available_actions[{}]", s),
                    format!("action {} out of range (actions = {})", a, na),
                ));
            }
            available.push(list);
        }

        let mut successors: Vec<Vec<Successor>> = vec![Vec::new(); ns * na];
        for (i, t) in self.transitions.iter().enumerate() {
            let field = format!("transitions[{}]", i);
            check_index(&field, "state", t.state, ns)?;
            check_index(&field, "action", t.action, na)?;
            check_index(&field, "next", t.next, ns)?;
            check_index(&field, "obs", t.obs, no)?;
            if !t.prob.is_finite() || t.prob < 0.0 {
                return Err(ModelError::invalid(
                    field,
                    format!("probability must be finite and >= 0, got {}", t.prob),
                ));
            }
            if !available[t.state].contains(&t.action) {
                return Err(ModelError::invalid(
                    field,
                    format!("action {} is not available in state {}", t.action, t.state),
                ));
            }
            if t.prob > 0.0 {
                successors[t.state * na + t.action].push(Successor {
                    next: t.next,
                    obs: t.obs,
                    prob: t.prob,
                });
            }
        }
        for (pair, row) in successors.iter_mut().enumerate() {
            merge_duplicates(row);
            let (s, a) = (pair / na, pair % na);
            if !available[s].contains(&a) {
                continue;
            }
            let mass: f64 = row.iter().map(|x| x.prob).sum();
            if (mass - 1.0).abs() > DISTRIBUTION_TOLERANCE {
                return Err(ModelError::invalid(
                    "transitions",
                    format!("(state {}, action {}) sums to {}, expected 1", s, a, mass),
                ));
            }
        }

        let mut rewards = vec![0.0; ns * na * nk];
        for (i, (s, a, values)) in self.rewards.into_iter().enumerate() {
            let field = format!("rewards[{}]", i);
            check_index(&field, "state", s, ns)?;
            check_index(&field, "action", a, na)?;
            if values.len() != nk {
                return Err(ModelError::invalid(
                    field,
                    format!("has {} values, expected {} objectives", values.len(), nk),
                ));
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(ModelError::invalid(field, "rewards must be finite"));
            }
            if !available[s].contains(&a) {
                return Err(ModelError::invalid(
                    field,
                    format!("action {} is not available in state {}", a, s),
                ));
            }
            let base = (s * na + a) * nk;
            for (k, v) in values.into_iter().enumerate() {
                rewards[base + k] += v;
            }
        }

        let initial_belief = match self.initial_belief {
            Some(probs) => {
                if probs.len() != ns {
                    return Err(ModelError::invalid(
                        "initial_belief",
                        format!("has {} entries, expected {}", probs.len(), ns),
                    ));
                }
                Some(
                    Belief::new(probs)
                        .map_err(|e| ModelError::invalid("initial_belief", e.to_string()))?,
                )
            }
            None => None,
        };

        Ok(ExplicitPomdp {
            name: self.name,
            num_states: ns,
            num_actions: na,
            num_observations: no,
            num_objectives: nk,
            discount: self.discount,
            available,
            successors,
            rewards,
            initial_belief,
        })
    }
}

fn check_index(field: &str, what: &str, value: usize, bound: usize) -> Result<(), ModelError> {
    if value >= bound {
        return Err(ModelError::invalid(
            field,
            format!("{} {} out of range (< {})", what, value, bound),
        ));
    }
    Ok(())
}

/// Sum repeated (next, obs) outcomes into one entry, sorted.
fn merge_duplicates(row: &mut Vec<Successor>) {
    row.sort_by_key(|x| (x.next, x.obs));
    row.dedup_by(|later, kept| {
        if later.next == kept.next && later.obs == kept.obs {
            kept.prob += later.prob;
            true
        } else {
            false
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coin() -> ExplicitPomdpBuilder {
        ExplicitPomdp::builder(2, 1, 2)
            .discount(0.9)
            .transition(0, 0, 0, 0, 0.5)
            .transition(0, 0, 1, 1, 0.5)
            .transition(1, 0, 1, 1, 1.0)
            .reward(0, 0, 1.0)
    }

    #[test]
    fn builds_valid_model() {
        let m = coin().build().unwrap();
        assert_eq!(m.num_states(), 2);
        assert_eq!(m.successors(0, 0).len(), 2);
        assert_eq!(m.reward(0, 0, 0), 1.0);
        assert_eq!(m.reward(1, 0, 0), 0.0);
        assert_eq!(m.available_actions(1), &[0]);
        assert_eq!(m.used_actions(), vec![0]);
    }

    #[test]
    fn rejects_bad_distribution() {
        let err = ExplicitPomdp::builder(1, 1, 1)
            .transition(0, 0, 0, 0, 0.7)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("sums to 0.7"));
    }

    #[test]
    fn rejects_out_of_range_obs() {
        let err = coin().transition(1, 0, 0, 5, 0.0).build().unwrap_err();
        assert!(matches!(err, ModelError::Invalid { .. }));
    }

    #[test]
    fn rejects_discount_outside_unit_interval() {
        assert!(coin().discount(0.0).build().is_err());
        assert!(coin().discount(1.5).build().is_err());
        assert!(coin().discount(1.0).build().is_ok());
    }

    #[test]
    fn merges_duplicate_outcomes() {
        let m = ExplicitPomdp::builder(1, 1, 1)
            .transition(0, 0, 0, 0, 0.25)
            .transition(0, 0, 0, 0, 0.75)
            .build()
            .unwrap();
        assert_eq!(m.successors(0, 0), &[Successor { next: 0, obs: 0, prob: 1.0 }]);
    }

    #[test]
    fn unavailable_action_has_no_successors() {
        let m = ExplicitPomdp::builder(2, 2, 1)
            .available(0, vec![0, 1])
            .available(1, vec![0])
            .transition(0, 0, 0, 0, 1.0)
            .transition(0, 1, 1, 0, 1.0)
            .transition(1, 0, 1, 0, 1.0)
            .build()
            .unwrap();
        assert!(m.successors(1, 1).is_empty());
        assert!(!m.is_available(1, 1));
        assert_eq!(m.used_actions(), vec![0, 1]);
    }

    #[test]
    fn transition_for_unavailable_action_is_rejected() {
        let err = ExplicitPomdp::builder(1, 2, 1)
            .available(0, vec![0])
            .transition(0, 0, 0, 0, 1.0)
            .transition(0, 1, 0, 0, 1.0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("not available"));
    }

    #[test]
    fn parses_json_with_vector_rewards() {
        let json = r#"{
            "states": 1, "actions": 1, "observations": 1, "objectives": 2,
            "discount": 0.5,
            "transitions": [{"state": 0, "action": 0, "next": 0, "obs": 0, "prob": 1.0}],
            "rewards": [{"state": 0, "action": 0, "reward": [1.0, -2.0]}],
            "initial_belief": [1.0]
        }"#;
        let file: ModelFile = serde_json::from_str(json).unwrap();
        let m = ExplicitPomdp::from_model_file(file).unwrap();
        assert_eq!(m.num_objectives(), 2);
        assert_eq!(m.reward(0, 0, 1), -2.0);
        assert!(m.initial_belief().is_some());
    }

    #[test]
    fn scalar_reward_needs_single_objective() {
        let err = coin().objectives(2).build().unwrap_err();
        assert!(err.to_string().contains("expected 2 objectives"));
    }
}
