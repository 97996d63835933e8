/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use super::{CastlingRights, Piece, Position, Square, XoShiRo};

/// Zobrist constants, generated at compile time so that they are identical between runs.
const ZOBRIST_TABLE: ZobristHashTable = ZobristHashTable::new();

/// A 64-bit fingerprint of a [`Position`], computed with [Zobrist hashing](https://www.chessprogramming.org/Zobrist_Hashing).
#[derive(Default, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy)]
pub struct ZobristKey(u64);

impl ZobristKey {
    /// Hashes the supplied [`Position`] from scratch.
    ///
    /// [`Position`] maintains its own key incrementally, which must always equal this.
    ///
    /// # Example
    /// ```
    /// # use hopper::*;
    /// let pos = Position::default();
    /// assert_eq!(ZobristKey::new(&pos), pos.key());
    /// assert_ne!(pos.key().inner(), 0);
    /// ```
    pub fn new(position: &Position) -> Self {
        let mut key = Self::default();

        for square in Square::iter() {
            if let Some(piece) = position.piece_at(square) {
                key.hash_piece(square, piece);
            }
        }

        key.hash_optional_ep_square(position.ep_square());
        key.hash_castling_rights(position.castling_rights());

        if position.side_to_move().is_black() {
            key.hash_side_to_move();
        }

        key
    }

    /// The raw `u64` of this key.
    #[inline(always)]
    pub const fn inner(&self) -> u64 {
        self.0
    }

    /// XORs `hash_key` into this key. Applying the same value twice removes it.
    #[inline(always)]
    fn hash(&mut self, hash_key: u64) {
        self.0 ^= hash_key;
    }

    /// Adds/removes `piece` standing on `square`.
    ///
    /// # Example
    /// ```
    /// # use hopper::*;
    /// let knight = Piece::new(Color::White, PieceKind::Knight);
    /// let mut key = ZobristKey::default();
    /// key.hash_piece(Square::G1, knight);
    /// assert_ne!(key, ZobristKey::default());
    ///
    /// key.hash_piece(Square::G1, knight);
    /// assert_eq!(key, ZobristKey::default());
    /// ```
    #[inline(always)]
    pub fn hash_piece(&mut self, square: Square, piece: Piece) {
        self.hash(ZOBRIST_TABLE.piece_keys[square.index()][piece.index()]);
    }

    /// Adds/removes the key of an en passant target on `file` (`0..8`).
    #[inline(always)]
    pub fn hash_ep_file(&mut self, file: u8) {
        self.hash(ZOBRIST_TABLE.ep_file_keys[file as usize]);
    }

    /// Adds/removes the en passant key for `ep_square`, if there is one.
    #[inline(always)]
    pub fn hash_optional_ep_square(&mut self, ep_square: Option<Square>) {
        if let Some(square) = ep_square {
            self.hash_ep_file(square.file());
        }
    }

    /// Adds/removes the key for the full set of `castling_rights`.
    ///
    /// There is one key for each of the sixteen combinations, so changing rights means
    /// removing the old combination and adding the new one.
    #[inline(always)]
    pub fn hash_castling_rights(&mut self, castling_rights: CastlingRights) {
        self.hash(ZOBRIST_TABLE.castling_keys[castling_rights.index()]);
    }

    /// Toggles the side-to-move key. It is present whenever Black is to move.
    #[inline(always)]
    pub fn hash_side_to_move(&mut self) {
        self.hash(ZOBRIST_TABLE.side_key);
    }
}

impl fmt::Display for ZobristKey {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}

/// All constants used for Zobrist hashing.
struct ZobristHashTable {
    piece_keys: [[u64; Piece::COUNT]; Square::COUNT],
    castling_keys: [u64; CastlingRights::COUNT],
    ep_file_keys: [u64; 8],
    side_key: u64,
}

impl ZobristHashTable {
    /// Generates every key from a fixed-seed [`XoShiRo`].
    const fn new() -> Self {
        let mut piece_keys = [[0; Piece::COUNT]; Square::COUNT];
        let mut castling_keys = [0; CastlingRights::COUNT];
        let mut ep_file_keys = [0; 8];
        let mut prng = XoShiRo::new();

        let mut square = 0;
        while square < Square::COUNT {
            let mut piece = 0;
            while piece < Piece::COUNT {
                let key;
                (key, prng) = prng.next_const();
                piece_keys[square][piece] = key;
                piece += 1;
            }
            square += 1;
        }

        // No rights at all hashes to nothing, so an empty board with White to move has key 0
        let mut i = 1;
        while i < CastlingRights::COUNT {
            let key;
            (key, prng) = prng.next_const();
            castling_keys[i] = key;
            i += 1;
        }

        i = 0;
        while i < ep_file_keys.len() {
            let key;
            (key, prng) = prng.next_const();
            ep_file_keys[i] = key;
            i += 1;
        }

        let (side_key, _) = prng.next_const();

        Self {
            piece_keys,
            castling_keys,
            ep_file_keys,
            side_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct() {
        let table = &ZOBRIST_TABLE;
        let mut all = Vec::new();
        for square in table.piece_keys.iter() {
            all.extend_from_slice(square);
        }
        all.extend_from_slice(&table.castling_keys[1..]);
        all.extend_from_slice(&table.ep_file_keys);
        all.push(table.side_key);

        let count = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), count);
        assert!(!all.contains(&0));
    }

    #[test]
    fn test_side_to_move_changes_key() {
        let white: Position = "4k3/8/8/8/8/8/8/4K3 w - - 0 1".parse().unwrap();
        let black: Position = "4k3/8/8/8/8/8/8/4K3 b - - 0 1".parse().unwrap();
        assert_ne!(white.key(), black.key());

        let mut key = white.key();
        key.hash_side_to_move();
        assert_eq!(key, black.key());
    }

    #[test]
    fn test_ep_square_changes_key() {
        let with_ep: Position = "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 2".parse().unwrap();
        let without: Position = "4k3/8/8/3pP3/8/8/8/4K3 w - - 0 2".parse().unwrap();
        assert_ne!(with_ep.key(), without.key());
    }
}
