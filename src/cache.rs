//! Build-time interning of state sets and final-match descriptors.
//!
//! A `StateCache` is owned by a single automaton build. It assigns each
//! distinct state set a DFA state index and each distinct
//! `(pattern, found_offset)` pair a final-descriptor index. Index 0 of the
//! final table is reserved for "no match", so interned finals start at 1.

use crate::bitset::BitSet;
use std::collections::HashMap;

/// Set of live follow positions plus the best completed match carried along.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct StateSet {
    pub bits: BitSet,
    /// Pattern of the best completed match, if any.
    pub found_pattern: Option<usize>,
    /// Bytes consumed since that match started.
    pub found_offset: usize,
}

impl StateSet {
    pub fn new(positions: usize) -> Self {
        Self {
            bits: BitSet::new(positions),
            found_pattern: None,
            found_offset: 0,
        }
    }
}

/// A completed match waiting for its replacement descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct PendingFinal {
    pub pattern: usize,
    pub found_offset: usize,
}

#[derive(Debug, Default)]
pub(crate) struct StateCache {
    sets: Vec<StateSet>,
    set_index: HashMap<StateSet, usize>,
    finals: Vec<PendingFinal>,
    final_index: HashMap<PendingFinal, usize>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a seed set at the next index, even if an equal set exists.
    ///
    /// Seed indices are fixed (restart = 0, line start = 1), so they are
    /// never merged with each other.
    pub fn push_seed(&mut self, set: StateSet) -> usize {
        let index = self.sets.len();
        self.set_index.entry(set.clone()).or_insert(index);
        self.sets.push(set);
        index
    }

    /// Return the index of an equal set, or append `set` as a new state.
    pub fn intern_set(&mut self, set: StateSet) -> usize {
        if let Some(&index) = self.set_index.get(&set) {
            return index;
        }
        let index = self.sets.len();
        self.set_index.insert(set.clone(), index);
        self.sets.push(set);
        index
    }

    /// Return the final-descriptor index for `(pattern, found_offset)`.
    pub fn intern_final(&mut self, pattern: usize, found_offset: usize) -> usize {
        let key = PendingFinal {
            pattern,
            found_offset,
        };
        if let Some(&index) = self.final_index.get(&key) {
            return index;
        }
        self.finals.push(key);
        let index = self.finals.len();
        self.final_index.insert(key, index);
        index
    }

    pub fn set(&self, index: usize) -> Option<&StateSet> {
        self.sets.get(index)
    }

    pub fn set_count(&self) -> usize {
        self.sets.len()
    }

    /// Interned finals in index order, starting at index 1.
    pub fn into_finals(self) -> Vec<PendingFinal> {
        self.finals
    }
}
