//! Immutable, generation-tagged collections of alpha elements.
//!
//! Every set gets a process-unique generation when it is built. Handles
//! (`SetIndex`) carry that generation, so a handle taken from one set can't
//! silently address an element of another set, e.g. after pruning produced
//! a smaller copy.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{MathError, Result};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Generation-checked handle to one element of an [`AlphaSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SetIndex {
    generation: u64,
    slot: usize,
}

impl SetIndex {
    /// Position of the element in its set.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Generation of the set that issued this handle.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl std::fmt::Display for SetIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.generation, self.slot)
    }
}

/// An ordered, immutable collection of alpha elements.
#[derive(Debug, Clone)]
pub struct AlphaSet<T> {
    generation: u64,
    items: Vec<T>,
}

impl<T> AlphaSet<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            generation: next_generation(),
            items,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Concatenate sets into a new one (fresh generation).
    pub fn concat<I>(sets: I) -> Self
    where
        I: IntoIterator<Item = AlphaSet<T>>,
    {
        let mut items = Vec::new();
        for set in sets {
            items.extend(set.items);
        }
        Self::new(items)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Handle for the element at `slot`.
    ///
    /// Panics if `slot` is out of range.
    pub fn index(&self, slot: usize) -> SetIndex {
        assert!(
            slot < self.items.len(),
            "slot {} out of range for set of {}",
            slot,
            self.items.len()
        );
        SetIndex {
            generation: self.generation,
            slot,
        }
    }

    /// Handles for every element, in order.
    pub fn indices(&self) -> impl Iterator<Item = SetIndex> + '_ {
        (0..self.items.len()).map(move |slot| SetIndex {
            generation: self.generation,
            slot,
        })
    }

    /// Check that a handle was issued by this set and is in range.
    pub fn check(&self, idx: SetIndex) -> Result<usize> {
        if idx.generation != self.generation {
            return Err(MathError::StaleIndex {
                handle: idx.generation,
                set: self.generation,
            });
        }
        if idx.slot >= self.items.len() {
            return Err(MathError::IndexOutOfRange {
                slot: idx.slot,
                len: self.items.len(),
            });
        }
        Ok(idx.slot)
    }

    pub fn get(&self, idx: SetIndex) -> Result<&T> {
        let slot = self.check(idx)?;
        Ok(&self.items[slot])
    }

    /// Positional access, for callers iterating the set directly.
    pub fn at(&self, slot: usize) -> &T {
        &self.items[slot]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> FromIterator<T> for AlphaSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a AlphaSet<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
