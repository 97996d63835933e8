/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Deref};

use crate::{Color, Move, Square, MAX_SEARCH_PLY};

/// Scores quiet moves by how often they caused beta cutoffs, indexed by `[color][from][to]`.
///
/// See the [History Heuristic](https://www.chessprogramming.org/History_Heuristic).
#[derive(Debug, Clone)]
pub struct HistoryTable(Box<[[[i32; Square::COUNT]; Square::COUNT]; Color::COUNT]>);

impl HistoryTable {
    /// Clear the history table, removing all scores.
    #[inline(always)]
    pub fn clear(&mut self) {
        self.0
            .iter_mut()
            .flatten()
            .for_each(|to_scores| to_scores.fill(0));
    }

    /// Rewards `color` for the quiet move `mv` that caused a cutoff at `depth`.
    ///
    /// Deeper cutoffs are worth quadratically more.
    #[inline(always)]
    pub fn update(&mut self, color: Color, mv: Move, depth: i32) {
        let entry = &mut self.0[color.index()][mv.from().index()][mv.to().index()];
        *entry = entry.saturating_add(depth * depth);
    }

    /// Current score of `mv` for `color`.
    #[inline(always)]
    pub fn get(&self, color: Color, mv: Move) -> i32 {
        self.0[color.index()][mv.from().index()][mv.to().index()]
    }
}

impl Default for HistoryTable {
    #[inline(always)]
    fn default() -> Self {
        Self(Box::new([[[0; Square::COUNT]; Square::COUNT]; Color::COUNT]))
    }
}

impl Deref for HistoryTable {
    type Target = [[[i32; Square::COUNT]; Square::COUNT]; Color::COUNT];
    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for HistoryTable {
    /// Lists every non-zero entry, highest first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for color in Color::all() {
            let mut entries = Square::iter()
                .flat_map(|from| Square::iter().map(move |to| (from, to)))
                .map(|(from, to)| (from, to, self.0[color.index()][from.index()][to.index()]))
                .filter(|&(_, _, score)| score != 0)
                .collect::<Vec<_>>();
            entries.sort_by(|a, b| b.2.cmp(&a.2));

            writeln!(f, "{} ({} entries):", color.name(), entries.len())?;
            for (from, to, score) in entries {
                writeln!(f, "\t{from}{to}\t{score}")?;
            }
        }

        Ok(())
    }
}

/// Two quiet moves per ply that recently caused beta cutoffs.
///
/// See the [Killer Heuristic](https://www.chessprogramming.org/Killer_Heuristic).
#[derive(Debug, Clone)]
pub struct KillerTable([[Option<Move>; 2]; MAX_SEARCH_PLY]);

impl KillerTable {
    /// Forget every killer move.
    #[inline(always)]
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Records `mv` as the primary killer at `ply`, demoting the previous primary to secondary.
    ///
    /// Nothing changes if `mv` already is the primary killer.
    #[inline(always)]
    pub fn update(&mut self, ply: usize, mv: Move) {
        let Some(slots) = self.0.get_mut(ply) else {
            return;
        };

        if slots[0] != Some(mv) {
            slots[1] = slots[0];
            slots[0] = Some(mv);
        }
    }

    /// The primary killer at `ply`.
    #[inline(always)]
    pub fn primary(&self, ply: usize) -> Option<Move> {
        self.0.get(ply).and_then(|slots| slots[0])
    }

    /// The secondary killer at `ply`.
    #[inline(always)]
    pub fn secondary(&self, ply: usize) -> Option<Move> {
        self.0.get(ply).and_then(|slots| slots[1])
    }
}

impl Default for KillerTable {
    #[inline(always)]
    fn default() -> Self {
        Self([[None; 2]; MAX_SEARCH_PLY])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_grows_with_depth_squared() {
        let mv = Move::new(Square::G1, "f3".parse().unwrap());
        let mut history = HistoryTable::default();

        history.update(Color::White, mv, 3);
        history.update(Color::White, mv, 2);
        assert_eq!(history.get(Color::White, mv), 13);
        assert_eq!(history.get(Color::Black, mv), 0);

        history.clear();
        assert_eq!(history.get(Color::White, mv), 0);
    }

    #[test]
    fn test_killers_shift() {
        let a = Move::new(Square::B1, "c3".parse().unwrap());
        let b = Move::new(Square::G1, "f3".parse().unwrap());
        let mut killers = KillerTable::default();

        killers.update(2, a);
        assert_eq!(killers.primary(2), Some(a));
        assert_eq!(killers.secondary(2), None);

        killers.update(2, b);
        assert_eq!(killers.primary(2), Some(b));
        assert_eq!(killers.secondary(2), Some(a));

        // Re-installing the primary does not clobber the secondary
        killers.update(2, b);
        assert_eq!(killers.secondary(2), Some(a));

        assert_eq!(killers.primary(3), None);
        killers.update(MAX_SEARCH_PLY, a); // Out of range is ignored
        assert_eq!(killers.primary(MAX_SEARCH_PLY), None);
    }
}
