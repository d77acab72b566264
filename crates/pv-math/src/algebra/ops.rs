//! Cross-sums, dominance and ordering over alpha sets.
//!
//! All operators are stateless and produce fresh sets; operands are never
//! modified. Every element produced by a cross-sum records the operand
//! handles it came from.

use std::cmp::Ordering;

use super::arena::{AlphaSet, SetIndex};
use super::element::AlphaElement;
use super::provenance::{ObsSource, Provenance};
use crate::error::Result;

/// Full Cartesian sum: `|l1| * |l2|` elements, `l1`-major.
pub fn cross_sum<E: AlphaElement>(l1: &AlphaSet<E>, l2: &AlphaSet<E>) -> AlphaSet<E> {
    let mut out = Vec::with_capacity(l1.len() * l2.len());
    for (u_idx, u) in l1.indices().zip(l1) {
        for (w_idx, w) in l2.indices().zip(l2) {
            out.push(u.combine(
                w,
                Provenance::CrossSum {
                    left: u_idx,
                    right: w_idx,
                    obs_source: None,
                },
            ));
        }
    }
    AlphaSet::new(out)
}

/// Sum of the single element `u` (from `u_set`) with every element of `w`
/// except `skip`.
///
/// Used to recompute a cross-sum incrementally when only one branch changed.
pub fn cross_sum_restricted<E: AlphaElement>(
    u_set: &AlphaSet<E>,
    u: SetIndex,
    w: &AlphaSet<E>,
    skip: SetIndex,
) -> Result<AlphaSet<E>> {
    let u_elem = u_set.get(u)?;
    let skip_slot = w.check(skip)?;
    let mut out = Vec::with_capacity(w.len().saturating_sub(1));
    for (w_idx, w_elem) in w.indices().zip(w) {
        if w_idx.slot() == skip_slot {
            continue;
        }
        out.push(u_elem.combine(
            w_elem,
            Provenance::CrossSum {
                left: u,
                right: w_idx,
                obs_source: None,
            },
        ));
    }
    Ok(AlphaSet::new(out))
}

/// Cross-sum that also carries per-observation successor handles.
///
/// An operand that is itself a policy-graph cross-sum contributes its
/// defined `obs_source` slots; a bare backprojection leaf contributes its
/// own `(obs, index)`. Panics on an operand that is neither.
pub fn cross_sum_policy_graph<E: AlphaElement>(
    l1: &AlphaSet<E>,
    l2: &AlphaSet<E>,
    num_observations: usize,
) -> AlphaSet<E> {
    let mut out = Vec::with_capacity(l1.len() * l2.len());
    for (u_idx, u) in l1.indices().zip(l1) {
        for (w_idx, w) in l2.indices().zip(l2) {
            let mut source = ObsSource::new(num_observations);
            absorb_obs_source(&mut source, u.provenance());
            absorb_obs_source(&mut source, w.provenance());
            out.push(u.combine(
                w,
                Provenance::CrossSum {
                    left: u_idx,
                    right: w_idx,
                    obs_source: Some(source),
                },
            ));
        }
    }
    AlphaSet::new(out)
}

fn absorb_obs_source(target: &mut ObsSource, provenance: &Provenance) {
    match provenance {
        Provenance::CrossSum {
            obs_source: Some(partial),
            ..
        } => target.merge_from(partial),
        Provenance::Leaf { obs, index } => target.set(*obs, *index),
        other => panic!(
            "policy-graph cross-sum operand is neither a backprojection nor a partial sum: {:?}",
            other
        ),
    }
}

/// Whether every entry of `v` is <= the matching entry of `u`.
fn dominated_by<E: AlphaElement>(v: &E, u: &E) -> bool {
    let (a, b) = (v.values(), u.values());
    assert_eq!(a.len(), b.len(), "dominance check on different lengths");
    a.iter().zip(b).all(|(x, y)| x <= y)
}

/// True if some element of `set` is entrywise >= `v`.
///
/// Equality counts, so an element is dominated by its own copy.
pub fn is_pointwise_dominated<E: AlphaElement>(v: &E, set: &[E]) -> bool {
    set.iter().any(|u| dominated_by(v, u))
}

/// Minimal pointwise-undominated subset, in original order.
///
/// Exact duplicates keep their first occurrence. Dominance is pointwise
/// only: elements beaten everywhere on the reachable simplex but not
/// entrywise are kept.
pub fn prune_pointwise<E: AlphaElement>(set: &AlphaSet<E>) -> AlphaSet<E> {
    let items = set.as_slice();
    let mut kept: Vec<E> = Vec::with_capacity(items.len());
    for (i, v) in items.iter().enumerate() {
        if is_pointwise_dominated(v, &kept) {
            continue;
        }
        let beaten_later = items[i + 1..]
            .iter()
            .any(|u| dominated_by(v, u) && !strictly_equal(v, u));
        if !beaten_later {
            kept.push(v.clone());
        }
    }
    AlphaSet::new(kept)
}

/// Lexicographic order on entries; the first differing entry decides.
pub fn lex_cmp<E: AlphaElement>(a: &E, b: &E) -> Ordering {
    let (x, y) = (a.values(), b.values());
    assert_eq!(x.len(), y.len(), "lexicographic compare on different lengths");
    for (p, q) in x.iter().zip(y) {
        if p != q {
            return if p > q {
                Ordering::Greater
            } else {
                Ordering::Less
            };
        }
    }
    Ordering::Equal
}

/// Exact entrywise equality, no tolerance.
pub fn strictly_equal<E: AlphaElement>(a: &E, b: &E) -> bool {
    a.values().len() == b.values().len() && a.values().iter().zip(b.values()).all(|(p, q)| p == q)
}

/// Exact membership test.
pub fn contains<E: AlphaElement>(set: &[E], e: &E) -> bool {
    set.iter().any(|u| strictly_equal(u, e))
}
