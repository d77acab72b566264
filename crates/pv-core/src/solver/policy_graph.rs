//! Executable policy recovered from element provenance.
//!
//! Every element of the final set becomes a node. A node's successor for
//! observation `o` is the previous-stage element its backup used for `o`,
//! mapped back onto the final set: the strictly equal node when there is
//! one, otherwise the node nearest in max-abs entry difference.

use std::collections::HashMap;

use pv_math::{strictly_equal, AlphaElement, AlphaMatrix, AlphaVector, Belief, Direction, Provenance, SetIndex};
use serde::Serialize;

use super::backup::Backup;
use super::value_iteration::Solution;
use super::SolverError;
use crate::model::Pomdp;

/// One conditional plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyNode {
    pub action: usize,
    /// Next node per observation; `None` where the backup recorded no
    /// successor (the observation cannot follow this action).
    pub successors: Vec<Option<usize>>,
    /// False if any successor was resolved by nearest match.
    pub exact: bool,
}

/// Policy graph over the final value-function set of a solution.
#[derive(Debug, Clone)]
pub struct PolicyGraph<'a, M: ?Sized, E> {
    solution: &'a Solution<'a, M, E>,
    nodes: Vec<PolicyNode>,
}

impl<'a, M, E> PolicyGraph<'a, M, E>
where
    M: Pomdp + ?Sized,
    E: Backup,
{
    pub fn from_solution(solution: &'a Solution<'a, M, E>) -> Result<Self, SolverError> {
        if !solution.policy_graph_tracked {
            return Err(SolverError::PolicyGraphUnavailable);
        }
        let num_obs = solution.model().num_observations();
        let finals = solution.values.as_slice();
        let mut resolved: HashMap<usize, (usize, bool)> = HashMap::new();

        let mut nodes = Vec::with_capacity(finals.len());
        for (slot, element) in finals.iter().enumerate() {
            let action = element
                .action()
                .ok_or(SolverError::UntaggedElement { slot })?;
            let mut exact = true;
            let mut successors = Vec::with_capacity(num_obs);
            for handle in successor_handles(element.provenance(), num_obs) {
                let next = match handle {
                    Some(h) => {
                        let prev_slot = solution.previous.check(h)?;
                        let (node, hit) = *resolved.entry(prev_slot).or_insert_with(|| {
                            nearest_node(solution.previous.at(prev_slot), finals)
                        });
                        exact &= hit;
                        Some(node)
                    }
                    None => None,
                };
                successors.push(next);
            }
            nodes.push(PolicyNode {
                action,
                successors,
                exact,
            });
        }

        Ok(Self { solution, nodes })
    }

    pub fn nodes(&self) -> &[PolicyNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether every successor matched a final element exactly.
    pub fn is_exact(&self) -> bool {
        self.nodes.iter().all(|n| n.exact)
    }

    fn node(&self, node: usize) -> Result<&PolicyNode, SolverError> {
        self.nodes.get(node).ok_or(SolverError::UnknownNode { node })
    }

    pub fn action(&self, node: usize) -> Result<usize, SolverError> {
        Ok(self.node(node)?.action)
    }

    /// Node to follow after observing `obs` at `node`.
    pub fn next(&self, node: usize, obs: usize) -> Result<Option<usize>, SolverError> {
        let n = self.node(node)?;
        n.successors
            .get(obs)
            .copied()
            .ok_or(SolverError::UnknownObservation {
                obs,
                num: n.successors.len(),
            })
    }
}

impl<M: Pomdp + ?Sized> PolicyGraph<'_, M, AlphaVector> {
    /// Node whose plan is optimal at `belief`.
    pub fn start_node(&self, belief: &Belief) -> Result<usize, SolverError> {
        self.solution.best_index(belief, Direction::Maximize)
    }
}

impl<M: Pomdp + ?Sized> PolicyGraph<'_, M, AlphaMatrix> {
    /// Node whose plan is optimal at `belief` under `weights`.
    pub fn start_node(&self, belief: &Belief, weights: &[f64]) -> Result<usize, SolverError> {
        self.solution.best_index(belief, weights)
    }
}

/// Previous-stage handle per observation recorded in `provenance`.
///
/// A single-observation backup never cross-sums, so its elements are bare
/// leaves.
fn successor_handles(provenance: &Provenance, num_obs: usize) -> Vec<Option<SetIndex>> {
    match provenance {
        Provenance::Leaf { obs, index } => {
            let mut out = vec![None; num_obs];
            out[*obs] = Some(*index);
            out
        }
        Provenance::CrossSum {
            obs_source: Some(source),
            ..
        } => source.iter().map(|(_, h)| h).collect(),
        _ => vec![None; num_obs],
    }
}

/// Final-set node matching `target`, and whether the match is exact.
fn nearest_node<E: AlphaElement>(target: &E, finals: &[E]) -> (usize, bool) {
    if let Some(i) = finals.iter().position(|e| strictly_equal(e, target)) {
        return (i, true);
    }
    let distance = |e: &E| {
        e.values()
            .iter()
            .zip(target.values())
            .map(|(a, b)| if a == b { 0.0 } else { (a - b).abs() })
            .fold(0.0, f64::max)
    };
    let mut best = (0, f64::INFINITY);
    for (i, e) in finals.iter().enumerate() {
        let d = distance(e);
        if d < best.1 {
            best = (i, d);
        }
    }
    (best.0, false)
}
