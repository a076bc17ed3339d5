//! Fixed-size open-addressed transposition table.

use crate::moves::types::Move;

/// What the stored score proves about the true value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    None = 0,
    Exact = 1,
    /// Score is a lower bound (the node failed high).
    Lower = 2,
    /// Score is an upper bound (the node failed low).
    Upper = 3,
}

#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub key: u64,
    pub best_move: Move,
    pub score: i16,
    pub depth: u8,
    pub flag: Bound,
    pub generation: u8,
}

impl TTEntry {
    const EMPTY: TTEntry = TTEntry {
        key: 0,
        best_move: Move::NULL,
        score: 0,
        depth: 0,
        flag: Bound::None,
        generation: 0,
    };
}

/// Power-of-two sized table indexed by the low key bits. Stale or
/// colliding entries are detected by key mismatch and ignored, so a
/// corrupted slot can cost time but never correctness.
pub struct TranspositionTable {
    entries: Vec<TTEntry>,
    pub generation: u8,
}

impl TranspositionTable {
    /// Allocate from a size budget in megabytes, rounded down to a power
    /// of two entries.
    pub fn new(size_mb: usize) -> Self {
        let entry_size = std::mem::size_of::<TTEntry>();
        let num_entries = (size_mb * 1024 * 1024) / entry_size;

        let mut capacity = 1;
        while capacity * 2 <= num_entries {
            capacity *= 2;
        }

        Self {
            entries: vec![TTEntry::EMPTY; capacity],
            generation: 0,
        }
    }

    #[inline(always)]
    fn index(&self, key: u64) -> usize {
        (key as usize) & (self.entries.len() - 1)
    }

    /// Bump the generation; called once per root search so entries from
    /// earlier searches lose their replacement priority.
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        for entry in self.entries.iter_mut() {
            *entry = TTEntry::EMPTY;
        }
        self.generation = 0;
    }

    /// Store under the replacement policy: empty slot, different key,
    /// deeper search, or stale generation.
    pub fn store(&mut self, key: u64, mv: Move, score: i32, depth: u8, flag: Bound) {
        let score_i16 = score.clamp(-32000, 32000) as i16;
        let generation = self.generation;
        let index = self.index(key);
        let entry = &mut self.entries[index];

        let replace = entry.flag == Bound::None
            || entry.key != key
            || depth >= entry.depth
            || entry.generation != generation;
        if !replace {
            return;
        }

        // Keep a known best move rather than overwriting it with null.
        let best_move = if mv.is_null() && entry.key == key {
            entry.best_move
        } else {
            mv
        };

        *entry = TTEntry {
            key,
            best_move,
            score: score_i16,
            depth,
            flag,
            generation,
        };
    }

    /// A hit requires the stored key to match and the entry to be real.
    pub fn probe(&self, key: u64) -> Option<TTEntry> {
        let entry = &self.entries[self.index(key)];
        if entry.key == key && entry.flag != Bound::None {
            Some(*entry)
        } else {
            None
        }
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_power_of_two() {
        let tt = TranspositionTable::new(4);
        assert!(tt.capacity().is_power_of_two());
    }

    #[test]
    fn miss_on_key_mismatch() {
        let mut tt = TranspositionTable::new(1);
        tt.store(0xABCD, Move::NULL, 17, 3, Bound::Exact);
        // A colliding key hashing to the same slot must read as a miss.
        let colliding = 0xABCD ^ ((tt.capacity() as u64) << 32);
        assert!(tt.probe(colliding).is_none());
        assert!(tt.probe(0xABCD).is_some());
    }

    #[test]
    fn shallow_store_does_not_evict_deeper_same_generation() {
        let mut tt = TranspositionTable::new(1);
        tt.store(42, Move::NULL, 100, 9, Bound::Exact);
        tt.store(42, Move::NULL, -5, 2, Bound::Upper);
        // Same key: policy keeps the deeper entry.
        let e = tt.probe(42).unwrap();
        assert_eq!(e.depth, 9);
        assert_eq!(e.score, 100);
    }

    #[test]
    fn stale_generation_is_replaced() {
        let mut tt = TranspositionTable::new(1);
        tt.store(42, Move::NULL, 100, 9, Bound::Exact);
        tt.new_search();
        tt.store(42, Move::NULL, -5, 2, Bound::Upper);
        let e = tt.probe(42).unwrap();
        assert_eq!(e.depth, 2);
    }
}
