/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use crate::{tune, HistoryTable, KillerTable, Move, MoveList, Position, MAX_NUM_MOVES};

/// Ordering score of the hash move: always searched first.
const TT_MOVE_SCORE: i32 = i32::MAX;

/// Ordering score of the move suggested by Internal Iterative Deepening: searched right after the hash move.
const IID_MOVE_SCORE: i32 = i32::MAX - 1;

/// Lazily yields moves from highest to lowest ordering score, using a selection sort.
///
/// Moves that are never reached (because of a cutoff) are never sorted.
pub struct MovePicker {
    moves: MoveList,
    scores: ArrayVec<i32, MAX_NUM_MOVES>,
    current: usize,
}

impl MovePicker {
    /// Scores every move in `moves` with `score_fn`.
    pub fn new(moves: MoveList, score_fn: impl Fn(&Move) -> i32) -> Self {
        let scores = moves.iter().map(score_fn).collect();

        Self {
            moves,
            scores,
            current: 0,
        }
    }
}

impl Iterator for MovePicker {
    type Item = (Move, i32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.moves.len() {
            return None;
        }

        // Find the index of the next highest score
        let mut best_index = self.current;
        for i in (self.current + 1)..self.moves.len() {
            if self.scores[i] > self.scores[best_index] {
                best_index = i;
            }
        }

        if best_index != self.current {
            self.moves.swap(self.current, best_index);
            self.scores.swap(self.current, best_index);
        }

        let item = (self.moves[self.current], self.scores[self.current]);
        self.current += 1;

        Some(item)
    }
}

/// [MVV-LVA](https://www.chessprogramming.org/MVV-LVA) score of a capture, plus the promotion bonus of a promotion.
///
/// Quiet moves score `0`.
#[inline(always)]
pub fn tactical_score(position: &Position, mv: &Move) -> i32 {
    let mut score = 0;

    if let Some(victim) = position.captured_kind(*mv) {
        let attacker = position
            .piece_at(mv.from())
            .map(|piece| piece.value())
            .unwrap_or_default();
        score += tune::capture_bonus!() + victim.value() * 100 - attacker;
    }

    if let Some(promotion) = mv.promotion() {
        score += tune::promotion_bonus!() + promotion.value();
    }

    score
}

/// Ordering score of `mv` at a node `ply` plies from the root.
///
/// From best to worst: the hash move, the IID move, captures by MVV-LVA and promotions,
/// the two killer moves, and finally quiets by their (capped) history score.
pub fn score_move(
    position: &Position,
    mv: &Move,
    tt_move: Option<Move>,
    iid_move: Option<Move>,
    killers: &KillerTable,
    history: &HistoryTable,
    ply: usize,
) -> i32 {
    if tt_move == Some(*mv) {
        return TT_MOVE_SCORE;
    }
    if iid_move == Some(*mv) {
        return IID_MOVE_SCORE;
    }

    let tactical = tactical_score(position, mv);
    if tactical != 0 {
        return tactical;
    }

    if killers.primary(ply) == Some(*mv) {
        tune::primary_killer_bonus!()
    } else if killers.secondary(ply) == Some(*mv) {
        tune::secondary_killer_bonus!()
    } else {
        history
            .get(position.side_to_move(), *mv)
            .min(tune::max_history_bonus!())
    }
}
