/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// FEN string for the starting position of chess.
pub const FEN_STARTPOS: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A popular FEN string for debugging move generation.
///
/// See <https://www.chessprogramming.org/Perft_Results#Position_2>
pub const FEN_KIWIPETE: &str =
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

/// Capacity of a [`MoveList`](super::MoveList).
///
/// No reachable position has more than 218 legal moves (see
/// [here](<https://www.chessprogramming.org/Chess_Position#cite_note-4>)), but move lists also hold
/// pseudo-legal moves, which can exceed that bound when pinned pieces or a King in check are involved.
pub const MAX_NUM_MOVES: usize = 256;

/// Number of combinations of the four castling rights.
pub const NUM_CASTLING_RIGHTS: usize = 16;
