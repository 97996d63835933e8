/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Moves and fixed-capacity move lists.
mod moves;
/// Perft, for validating move generation.
mod perft;
/// Colors, piece kinds, and pieces.
mod piece;
/// The mailbox board, its state, and reversible move application.
mod position;
/// Compile-time pseudo-random number generation.
mod prng;
/// Squares and the offsets pieces move by.
mod square;
/// Constants shared across the board layer.
mod utils;
/// Zobrist hashing of positions.
mod zobrist;

pub use moves::*;
pub use perft::*;
pub use piece::*;
pub use position::*;
pub use prng::*;
pub use square::*;
pub use utils::*;
pub use zobrist::*;
