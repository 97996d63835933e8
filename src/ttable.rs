/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use crate::{Move, Score, SearchBounds, ZobristKey};

/// Number of bytes in a megabyte
const BYTES_IN_MB: usize = 1024 * 1024;

/// How the score in a [`TTableEntry`] relates to the true score of its position.
///
/// See [CPW](https://www.chessprogramming.org/Node_Types) for more.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash)]
pub enum Bound {
    /// The score is exact (a PV node).
    Exact,

    /// The true score is at least this score (a beta cutoff, or Cut node).
    Lower,

    /// The true score is at most this score (no move raised alpha, an All node).
    Upper,
}

impl Bound {
    /// Classifies `score` against the window it was searched with:
    ///
    /// ```text
    /// if score <= alpha:
    ///     UPPER
    /// else if score >= beta:
    ///     LOWER
    /// else:
    ///     EXACT
    /// ```
    #[inline(always)]
    pub fn new(score: Score, bounds: SearchBounds) -> Self {
        if score <= bounds.alpha {
            Self::Upper
        } else if score >= bounds.beta {
            Self::Lower
        } else {
            Self::Exact
        }
    }
}

/// An entry into the transposition table.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct TTableEntry {
    /// Key of the position this entry represents.
    pub key: ZobristKey,

    /// Remaining depth of the search that produced this entry.
    pub depth: i32,

    /// Score of the position, with mate scores relative to the position itself (not the root).
    pub score: Score,

    /// Whether `score` is exact, or only an upper or lower bound on the true score.
    pub bound: Bound,

    /// Best move found for this position, if any.
    pub bestmove: Option<Move>,
}

impl TTableEntry {
    /// Creates a new [`TTableEntry`] for a node `ply` plies from the root.
    ///
    /// `score` is converted with [`Score::relative`] so that stored mate distances are
    /// independent of where the position was found.
    #[inline(always)]
    pub fn new(
        key: ZobristKey,
        bestmove: Option<Move>,
        score: Score,
        bound: Bound,
        depth: i32,
        ply: usize,
    ) -> Self {
        Self {
            key,
            depth,
            score: score.relative(ply),
            bound,
            bestmove,
        }
    }

    /// This entry's score, converted for a node `ply` plies from the root.
    #[inline(always)]
    pub fn score(&self, ply: usize) -> Score {
        self.score.absolute(ply)
    }

    /// Returns this entry's score if it is deep enough and its bound allows a cutoff at a node `ply` plies from the root.
    ///
    /// An entry's score can be used if and only if its depth is at least `depth`, and:
    ///     1. The entry is [`Bound::Exact`].
    ///     2. The entry is a [`Bound::Upper`] and its score is `<= alpha`.
    ///     3. The entry is a [`Bound::Lower`] and its score is `>= beta`.
    #[inline(always)]
    pub fn try_score(&self, bounds: SearchBounds, depth: i32, ply: usize) -> Option<Score> {
        if self.depth < depth {
            return None;
        }

        let score = self.score(ply);

        (self.bound == Bound::Exact
            || (self.bound == Bound::Upper && score <= bounds.alpha)
            || (self.bound == Bound::Lower && score >= bounds.beta))
            .then_some(score)
    }
}

/// Transposition Table.
///
/// Used during a search to keep track of previous search results on positions,
/// avoiding unnecessary re-computations.
/// Entries are replaced depth-preferred: a shallower result never overwrites a deeper one for the same position.
#[derive(Debug)]
pub struct TTable {
    /// Internal cache of the TTable. Its length is always a power of two.
    cache: Vec<Option<TTableEntry>>,

    /// Number of times an entry was overwritten by a different position since last clearing.
    pub(crate) collisions: usize,

    /// Number of probes since last clearing.
    pub(crate) accesses: usize,

    /// Number of probes that found a matching entry since last clearing.
    pub(crate) hits: usize,
}

impl TTable {
    /// Default size of the Transposition Table, in megabytes.
    pub const DEFAULT_SIZE: usize = 16;

    /// Minimum size of the Transposition Table, in megabytes.
    pub const MIN_SIZE: usize = 1;

    /// Maximum size of the Transposition Table, in megabytes.
    pub const MAX_SIZE: usize = 1_024;

    /// Create a new [`TTable`] that is at most `size` megabytes.
    #[inline(always)]
    pub fn new(size: usize) -> Self {
        Self::from_capacity((size * BYTES_IN_MB) / size_of::<Option<TTableEntry>>())
    }

    /// Create a new [`TTable`] that can hold `capacity` entries, rounded down to a power of two.
    ///
    /// # Example
    /// ```
    /// # use hopper::TTable;
    /// assert_eq!(TTable::from_capacity(100).capacity(), 64);
    /// assert_eq!(TTable::from_capacity(0).capacity(), 1);
    /// ```
    #[inline(always)]
    pub fn from_capacity(capacity: usize) -> Self {
        let capacity = match capacity {
            0 => 1,
            n if n.is_power_of_two() => n,
            n => n.next_power_of_two() / 2,
        };

        Self {
            cache: vec![None; capacity],
            collisions: 0,
            accesses: 0,
            hits: 0,
        }
    }

    /// Clears the entries of this [`TTable`].
    #[inline(always)]
    pub fn clear(&mut self) {
        self.cache.iter_mut().for_each(|entry| *entry = None);
        self.collisions = 0;
        self.accesses = 0;
        self.hits = 0;
    }

    /// Returns the number of entries that can fit within this [`TTable`]
    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.cache.len()
    }

    /// Returns the size of this [`TTable`], in megabytes.
    #[inline(always)]
    pub fn size(&self) -> usize {
        self.cache.len() * size_of::<Option<TTableEntry>>() / BYTES_IN_MB
    }

    /// Returns the number of `Some` entries in this [`TTable`].
    #[inline(always)]
    pub fn num_entries(&self) -> usize {
        self.cache.iter().filter(|entry| entry.is_some()).count()
    }

    /// Permille of the table in use, sampled from (at most) the first 1000 slots.
    ///
    /// Sent to the GUI as `info hashfull`.
    pub fn hashfull(&self) -> usize {
        let sample = self.capacity().min(1000);
        let used = self.cache[..sample]
            .iter()
            .filter(|entry| entry.is_some())
            .count();
        used * 1000 / sample
    }

    /// Map `key` to an index into this [`TTable`].
    #[inline(always)]
    pub fn index(&self, key: &ZobristKey) -> usize {
        key.inner() as usize & (self.capacity() - 1)
    }

    /// Get the entry if and only if it matches the provided key
    #[inline(always)]
    pub fn get(&self, key: &ZobristKey) -> Option<&TTableEntry> {
        self.entry(key).filter(|e| &e.key == key)
    }

    /// Like [`TTable::get`], but counts the access (and hit) for debug statistics.
    #[inline(always)]
    pub fn probe(&mut self, key: &ZobristKey) -> Option<TTableEntry> {
        self.accesses += 1;
        let entry = self.get(key).copied();
        if entry.is_some() {
            self.hits += 1;
        }
        entry
    }

    /// Get the entry, without regards for whether it matches the provided key
    #[inline(always)]
    fn entry(&self, key: &ZobristKey) -> Option<&TTableEntry> {
        self.cache[self.index(key)].as_ref()
    }

    /// Store `entry` in its slot unless the slot holds a deeper result for the same position.
    ///
    /// Returns whatever entry was evicted, if any.
    pub fn store(&mut self, entry: TTableEntry) -> Option<TTableEntry> {
        let index = self.index(&entry.key);

        if let Some(existing) = &self.cache[index] {
            if existing.key != entry.key {
                self.collisions += 1;
            } else if existing.depth > entry.depth {
                return None;
            }
        }

        self.cache[index].replace(entry)
    }

    /// Hit rate of probes since last clearing, in percent.
    pub fn hit_rate(&self) -> f32 {
        if self.accesses == 0 {
            0.0
        } else {
            self.hits as f32 / self.accesses as f32 * 100.0
        }
    }
}

impl Default for TTable {
    #[inline(always)]
    fn default() -> Self {
        Self::new(Self::DEFAULT_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::*;

    /// Two positions whose keys map to the same slot of a 2-entry table.
    fn colliding_positions() -> (Position, Position) {
        let pos1 = Position::default();
        let mut pos2 = Position::from_fen(FEN_KIWIPETE).unwrap();

        while pos1.key().inner() % 2 != pos2.key().inner() % 2 {
            let mv = pos2.legal_moves()[0];
            pos2.make_move(mv);
        }

        (pos1, pos2)
    }

    #[test]
    fn test_collisions_replace_entries() {
        let (pos1, pos2) = colliding_positions();
        let (key1, key2) = (pos1.key(), pos2.key());

        let entry1 = TTableEntry::new(key1, None, Score::DRAW, Bound::Exact, 5, 0);
        let entry2 = TTableEntry::new(key2, None, Score::new(40), Bound::Exact, 1, 0);

        let mut tt = TTable::from_capacity(2);
        assert_eq!(tt.num_entries(), 0, "TTable should initialize to being empty");

        tt.store(entry1);
        assert_eq!(tt.get(&key1), Some(&entry1));

        // A different position always replaces, even when shallower
        assert_eq!(tt.store(entry2), Some(entry1));
        assert_eq!(tt.num_entries(), 1);
        assert!(tt.get(&key1).is_none(), "Cannot get an entry that has been overridden");
        assert_eq!(tt.get(&key2), Some(&entry2));
        assert_eq!(tt.collisions, 1);
    }

    #[test]
    fn test_depth_preferred_for_same_position() {
        let key = Position::default().key();
        let deep = TTableEntry::new(key, None, Score::new(30), Bound::Exact, 6, 0);
        let shallow = TTableEntry::new(key, None, Score::new(-10), Bound::Lower, 2, 0);
        let deeper = TTableEntry::new(key, None, Score::new(15), Bound::Upper, 6, 0);

        let mut tt = TTable::from_capacity(16);
        tt.store(deep);
        assert_eq!(tt.store(shallow), None);
        assert_eq!(tt.get(&key), Some(&deep));

        // Equal depth replaces
        assert_eq!(tt.store(deeper), Some(deep));
        assert_eq!(tt.get(&key), Some(&deeper));
    }

    #[test]
    fn test_exact_entry_is_consistent() {
        let key = Position::default().key();
        let entry = TTableEntry::new(key, None, Score::new(123), Bound::Exact, 4, 3);

        let mut tt = TTable::default();
        tt.store(entry);

        let found = tt.probe(&key).unwrap();
        assert_eq!(found.score(3), Score::new(123));
        for bounds in [
            SearchBounds::default(),
            SearchBounds::new(Score::new(500), Score::new(501)),
            SearchBounds::new(Score::new(-501), Score::new(-500)),
        ] {
            assert_eq!(found.try_score(bounds, 4, 3), Some(Score::new(123)));
        }

        // Too shallow
        assert_eq!(found.try_score(SearchBounds::default(), 5, 3), None);
        assert_eq!((tt.accesses, tt.hits), (1, 1));
    }

    #[test]
    fn test_bounds_gate_cutoffs() {
        let key = Position::default().key();
        let lower = TTableEntry::new(key, None, Score::new(100), Bound::Lower, 3, 0);
        let upper = TTableEntry::new(key, None, Score::new(100), Bound::Upper, 3, 0);

        let below = SearchBounds::new(Score::new(0), Score::new(50));
        let above = SearchBounds::new(Score::new(150), Score::new(200));

        assert_eq!(lower.try_score(below, 3, 0), Some(Score::new(100)));
        assert_eq!(lower.try_score(above, 3, 0), None);
        assert_eq!(upper.try_score(above, 3, 0), Some(Score::new(100)));
        assert_eq!(upper.try_score(below, 3, 0), None);
    }

    #[test]
    fn test_mate_scores_are_stored_by_distance_from_node() {
        let key = Position::default().key();

        // Mate in 3 plies from the root, found at ply 1: 2 plies from the node itself
        let entry = TTableEntry::new(key, None, Score::MATE - 3, Bound::Exact, 2, 1);
        assert_eq!(entry.score, Score::MATE - 2);

        // Reached again at ply 4: 6 plies from the root
        assert_eq!(entry.score(4), Score::MATE - 6);
    }

    #[test]
    fn test_hashfull() {
        let key = Position::default().key();
        let mut tt = TTable::from_capacity(4);
        assert_eq!(tt.hashfull(), 0);
        tt.store(TTableEntry::new(key, None, Score::DRAW, Bound::Exact, 1, 0));
        assert_eq!(tt.hashfull(), 250);
        tt.clear();
        assert_eq!(tt.num_entries(), 0);
    }
}
