//! Provenance of alpha elements, used to rebuild the policy graph.
//!
//! Provenance is fixed when an element is constructed and never changes.

use serde::{Deserialize, Serialize};

use super::arena::SetIndex;

/// How an alpha element came to exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
    /// Built directly (initial sets, plain sums, test fixtures).
    #[default]
    Fresh,
    /// Backprojection of `index` (previous-stage set) under observation `obs`.
    Leaf { obs: usize, index: SetIndex },
    /// Sum of `left` and `right` from the two operands of a cross-sum.
    ///
    /// `obs_source` is present only for policy-graph cross-sums.
    CrossSum {
        left: SetIndex,
        right: SetIndex,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        obs_source: Option<ObsSource>,
    },
}

impl Provenance {
    /// Operand handles of the cross-sum that produced the element.
    pub fn origin(&self) -> Option<(SetIndex, SetIndex)> {
        match self {
            Provenance::CrossSum { left, right, .. } => Some((*left, *right)),
            _ => None,
        }
    }

    /// Observation of a backprojection leaf.
    pub fn obs(&self) -> Option<usize> {
        match self {
            Provenance::Leaf { obs, .. } => Some(*obs),
            _ => None,
        }
    }

    /// Previous-stage element a backprojection leaf was built from.
    pub fn index(&self) -> Option<SetIndex> {
        match self {
            Provenance::Leaf { index, .. } => Some(*index),
            _ => None,
        }
    }

    pub fn obs_source(&self) -> Option<&ObsSource> {
        match self {
            Provenance::CrossSum { obs_source, .. } => obs_source.as_ref(),
            _ => None,
        }
    }
}

/// Per-observation successor handles of a policy-graph cross-sum.
///
/// A slot is `None` until an operand covering that observation has been
/// folded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObsSource {
    slots: Vec<Option<SetIndex>>,
}

impl ObsSource {
    /// All slots unset.
    pub fn new(num_observations: usize) -> Self {
        Self {
            slots: vec![None; num_observations],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, obs: usize) -> Option<SetIndex> {
        self.slots[obs]
    }

    /// True once every observation has a successor.
    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, Option<SetIndex>)> + '_ {
        self.slots.iter().copied().enumerate()
    }

    pub(crate) fn set(&mut self, obs: usize, index: SetIndex) {
        assert!(
            obs < self.slots.len(),
            "observation {} out of range for {} observations",
            obs,
            self.slots.len()
        );
        self.slots[obs] = Some(index);
    }

    /// Copy every defined slot of `other` over this one.
    pub(crate) fn merge_from(&mut self, other: &ObsSource) {
        assert_eq!(
            self.slots.len(),
            other.slots.len(),
            "observation count mismatch"
        );
        for (o, slot) in other.iter() {
            if let Some(index) = slot {
                self.slots[o] = Some(index);
            }
        }
    }
}
