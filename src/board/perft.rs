/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use super::Position;

/// Counts the leaf nodes of the legal move tree rooted at `position`, `depth` plies deep.
///
/// This performs bulk counting: at depth 1 it returns the number of legal moves
/// instead of making each one.
/// If you do *not* want bulk counting, use [`perft_generic`].
///
/// # Example
/// ```
/// # use hopper::*;
/// let mut pos = Position::default();
/// assert_eq!(perft(&mut pos, 3), 8_902);
/// assert_eq!(pos, Position::default());
/// ```
#[inline(always)]
pub fn perft(position: &mut Position, depth: usize) -> u64 {
    perft_generic::<true, false>(position, depth)
}

/// Like [`perft`], but also prints the number of nodes reachable after each root move.
#[inline(always)]
pub fn splitperft(position: &mut Position, depth: usize) -> u64 {
    perft_generic::<true, true>(position, depth)
}

/// Generic perft, selecting bulk counting with `BULK` and per-root-move output with `SPLIT`.
///
/// Moves are made and undone in place, so `position` is unchanged afterwards.
pub fn perft_generic<const BULK: bool, const SPLIT: bool>(
    position: &mut Position,
    depth: usize,
) -> u64 {
    if BULK && !SPLIT && depth == 1 {
        return position.legal_moves().len() as u64;
    } else if depth == 0 {
        return 1;
    }

    let mut nodes = 0;
    for mv in position.pseudo_legal_moves() {
        position.make_move(mv);

        if !position.king_left_in_check() {
            let new_nodes = perft_generic::<BULK, false>(position, depth - 1);

            if SPLIT {
                println!("{mv}\t{new_nodes}");
            }

            nodes += new_nodes;
        }

        position.unmake();
    }

    nodes
}
