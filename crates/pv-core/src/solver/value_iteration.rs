//! The value-iteration orchestrator.

use std::marker::PhantomData;
use std::time::{Duration, Instant};

use pv_config::SolverConfig;
use pv_math::{cross_sum, cross_sum_policy_graph, prune_pointwise, AlphaSet, Belief};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use super::backup::Backup;
use super::SolverError;
use crate::logging::{event_names, Stage};
use crate::model::Pomdp;

/// Why iteration stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    /// Residual fell to the configured tolerance.
    Converged,
    StageLimit,
    TimeLimit,
}

impl Termination {
    pub fn is_converged(self) -> bool {
        self == Termination::Converged
    }
}

impl std::fmt::Display for Termination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Termination::Converged => write!(f, "converged"),
            Termination::StageLimit => write!(f, "stage limit"),
            Termination::TimeLimit => write!(f, "time limit"),
        }
    }
}

/// Candidate counts for one action in one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ActionStats {
    pub action: usize,
    /// Elements produced by cross-sums before pruning, summed over folds.
    pub generated: usize,
    /// Elements left after the final prune.
    pub kept: usize,
}

/// Result of one Bellman backup.
#[derive(Debug, Clone)]
pub struct StageOutcome<E> {
    pub set: AlphaSet<E>,
    pub actions: Vec<ActionStats>,
}

/// Output of [`ValueIteration::solve`].
#[derive(Debug, Clone)]
pub struct Solution<'m, M: ?Sized, E> {
    pub(crate) model: &'m M,
    /// Final value-function set.
    pub values: AlphaSet<E>,
    /// Set the final one was backed up from; policy-graph successors
    /// point into it.
    pub previous: AlphaSet<E>,
    pub termination: Termination,
    pub stages: u32,
    /// Residual after each stage, in order.
    pub residuals: Vec<f64>,
    pub elapsed: Duration,
    pub policy_graph_tracked: bool,
}

impl<'m, M: Pomdp + ?Sized, E> Solution<'m, M, E> {
    pub fn model(&self) -> &'m M {
        self.model
    }

    /// Residual of the last stage.
    pub fn final_residual(&self) -> Option<f64> {
        self.residuals.last().copied()
    }
}

/// Point-based value iteration over element kind `E`.
pub struct ValueIteration<'m, M: ?Sized, E> {
    model: &'m M,
    config: SolverConfig,
    /// Beliefs at which successive sets are compared.
    probes: Vec<Vec<f64>>,
    _element: PhantomData<fn() -> E>,
}

impl<'m, M, E> ValueIteration<'m, M, E>
where
    M: Pomdp + ?Sized,
    E: Backup,
{
    /// Prepare a solver; configured probe beliefs must match the model.
    pub fn new(model: &'m M, config: SolverConfig) -> Result<Self, SolverError> {
        let ns = model.num_states();
        if model.used_actions().is_empty() {
            return Err(SolverError::NoActions);
        }
        for (index, probe) in config.probe_beliefs.iter().enumerate() {
            if probe.len() != ns {
                return Err(SolverError::ProbeDimension {
                    index,
                    expected: ns,
                    actual: probe.len(),
                });
            }
        }
        if config.prune_across_actions && !E::CROSS_ACTION_PRUNE_SAFE {
            warn!(
                stage = %Stage::Init,
                "prune_across_actions ignored: dominance does not survive negative objective weights"
            );
        }

        let mut probes: Vec<Vec<f64>> = (0..ns).map(|s| Belief::point(ns, s).into()).collect();
        probes.push(Belief::uniform(ns).into());
        probes.extend(config.probe_beliefs.iter().cloned());

        Ok(Self {
            model,
            config,
            probes,
            _element: PhantomData,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Beliefs used for the stage residual.
    pub fn probes(&self) -> &[Vec<f64>] {
        &self.probes
    }

    /// Terminal element for every action available somewhere.
    pub fn initial_set(&self) -> AlphaSet<E> {
        self.model
            .used_actions()
            .into_iter()
            .map(|a| E::zero(self.model, a))
            .collect()
    }

    /// One Bellman backup of `prev`.
    pub fn stage(&self, prev: &AlphaSet<E>) -> StageOutcome<E> {
        let actions = self.model.used_actions();
        let results: Vec<(AlphaSet<E>, ActionStats)> = if self.config.parallel {
            actions
                .par_iter()
                .map(|&a| self.backup_action(a, prev))
                .collect()
        } else {
            actions.iter().map(|&a| self.backup_action(a, prev)).collect()
        };

        let stats: Vec<ActionStats> = results.iter().map(|(_, s)| *s).collect();
        let union = AlphaSet::concat(results.into_iter().map(|(set, _)| set));
        let set = if self.config.prune_across_actions && E::CROSS_ACTION_PRUNE_SAFE {
            let pruned = prune_pointwise(&union);
            debug!(
                stage = %Stage::Union,
                before = union.len(),
                after = pruned.len(),
                "cross-action prune"
            );
            pruned
        } else {
            union
        };

        StageOutcome {
            set,
            actions: stats,
        }
    }

    /// Backproject, then fold the per-observation sets with a prune after
    /// every cross-sum.
    fn backup_action(&self, action: usize, prev: &AlphaSet<E>) -> (AlphaSet<E>, ActionStats) {
        let num_obs = self.model.num_observations();
        let track = self.config.track_policy_graph;
        let mut generated = 0;

        let folded = (0..num_obs)
            .map(|o| prune_pointwise(&E::backproject(self.model, action, o, prev)))
            .reduce(|partial, projected| {
                let summed = if track {
                    cross_sum_policy_graph(&partial, &projected, num_obs)
                } else {
                    cross_sum(&partial, &projected)
                };
                generated += summed.len();
                prune_pointwise(&summed)
            })
            .unwrap_or_else(AlphaSet::empty);

        let stats = ActionStats {
            action,
            generated,
            kept: folded.len(),
        };
        debug!(
            event = event_names::ACTION_BACKED_UP,
            stage = %Stage::CrossSum,
            action,
            generated,
            kept = stats.kept,
            "action backed up"
        );
        (folded, stats)
    }

    /// Per-probe, per-objective optimal values of `set`.
    fn probe_all(&self, set: &AlphaSet<E>) -> Result<Vec<Vec<Option<f64>>>, SolverError> {
        self.probes
            .iter()
            .map(|b| E::probe(self.model, b, set.as_slice()).map_err(SolverError::from))
            .collect()
    }

    /// Iterate stages until convergence or a budget runs out.
    pub fn solve(&self) -> Result<Solution<'m, M, E>, SolverError> {
        let started = Instant::now();
        let time_limit = self.config.time_limit();
        info!(
            event = event_names::SOLVE_STARTED,
            stage = %Stage::Init,
            states = self.model.num_states(),
            actions = self.model.num_actions(),
            observations = self.model.num_observations(),
            objectives = self.model.num_objectives(),
            "value iteration started"
        );

        let mut current = self.initial_set();
        let mut previous = current.clone();
        let mut current_probe = self.probe_all(&current)?;
        let mut residuals = Vec::new();
        let mut termination = Termination::StageLimit;
        let mut stages = 0;

        while stages < self.config.max_stages {
            stages += 1;
            let span = info_span!("stage", stage = stages);
            let _guard = span.enter();

            let outcome = self.stage(&current);
            let next_probe = self.probe_all(&outcome.set)?;
            let r = residual(&current_probe, &next_probe);
            residuals.push(r);
            info!(
                event = event_names::STAGE_FINISHED,
                stage = %Stage::Union,
                size = outcome.set.len(),
                residual = r,
                "stage finished"
            );

            previous = std::mem::replace(&mut current, outcome.set);
            current_probe = next_probe;

            if r <= self.config.tolerance {
                termination = Termination::Converged;
                break;
            }
            if time_limit.is_some_and(|limit| started.elapsed() >= limit) {
                termination = Termination::TimeLimit;
                break;
            }
        }

        let elapsed = started.elapsed();
        info!(
            event = event_names::SOLVE_FINISHED,
            stage = %Stage::Converged,
            termination = %termination,
            stages,
            size = current.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "value iteration finished"
        );

        Ok(Solution {
            model: self.model,
            values: current,
            previous,
            termination,
            stages,
            residuals,
            elapsed,
            policy_graph_tracked: self.config.track_policy_graph,
        })
    }
}

/// Largest change of any probed value between two stages.
///
/// A value that becomes feasible or infeasible counts as an infinite change.
fn residual(before: &[Vec<Option<f64>>], after: &[Vec<Option<f64>>]) -> f64 {
    before
        .iter()
        .zip(after)
        .flat_map(|(b, a)| b.iter().zip(a))
        .map(|pair| match pair {
            (Some(x), Some(y)) => (x - y).abs(),
            (None, None) => 0.0,
            _ => f64::INFINITY,
        })
        .fold(0.0, f64::max)
}
