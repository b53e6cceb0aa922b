//! Fixed-capacity bit set used for follow-position sets during automaton
//! construction.
//!
//! Bits are packed into `u64` words. Two sets are equal (and hash equally)
//! when they have the same capacity and the same bits, which makes a `BitSet`
//! usable directly as part of a cache key.

const WORD_BITS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    words: Vec<u64>,
    capacity: usize,
}

impl BitSet {
    /// Create an empty set able to hold bits `0..capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(WORD_BITS)],
            capacity,
        }
    }

    /// Set bit `pos`.
    ///
    /// Panics if `pos` is out of range: an out-of-range follow position is a
    /// construction bug and must not be silently dropped.
    pub fn set(&mut self, pos: usize) {
        assert!(
            pos < self.capacity,
            "bit {pos} out of range for set of capacity {}",
            self.capacity
        );
        self.words[pos / WORD_BITS] |= 1u64 << (pos % WORD_BITS);
    }

    pub fn clear(&mut self, pos: usize) {
        if pos < self.capacity {
            self.words[pos / WORD_BITS] &= !(1u64 << (pos % WORD_BITS));
        }
    }

    pub fn contains(&self, pos: usize) -> bool {
        pos < self.capacity && self.words[pos / WORD_BITS] & (1u64 << (pos % WORD_BITS)) != 0
    }

    /// Return the lowest set bit at or after `from`.
    pub fn next_set_bit(&self, from: usize) -> Option<usize> {
        if from >= self.capacity {
            return None;
        }

        let mut index = from / WORD_BITS;
        let mut word = self.words[index] & (u64::MAX << (from % WORD_BITS));

        loop {
            if word != 0 {
                let pos = index * WORD_BITS + word.trailing_zeros() as usize;
                return (pos < self.capacity).then_some(pos);
            }
            index += 1;
            if index >= self.words.len() {
                return None;
            }
            word = self.words[index];
        }
    }

    /// In-place union. Both sets must have the same capacity.
    pub fn union_with(&mut self, other: &BitSet) {
        debug_assert_eq!(self.capacity, other.capacity);
        for (dst, src) in self.words.iter_mut().zip(&other.words) {
            *dst |= *src;
        }
    }

    /// Iterate over set bits in ascending order.
    pub fn iter(&self) -> Iter<'_> {
        Iter { set: self, next: 0 }
    }
}

/// Ascending iterator over the set bits of a [`BitSet`].
pub struct Iter<'a> {
    set: &'a BitSet,
    next: usize,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let pos = self.set.next_set_bit(self.next)?;
        self.next = pos + 1;
        Some(pos)
    }
}

impl<'a> IntoIterator for &'a BitSet {
    type Item = usize;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}
