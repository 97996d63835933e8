/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use crate::{Color, Piece, PieceKind, Square};

/// Phase of a full board: both sides with all their minor and major pieces.
pub const MAX_PHASE: i32 = 24;

/// Piece-Square tables of the [Simplified Evaluation Function](https://www.chessprogramming.org/Simplified_Evaluation_Function).
///
/// Written from White's perspective, with `a8` in the top left.
#[rustfmt::skip]
const PAWN: Psqt = Psqt::new([
     0,  0,  0,  0,  0,  0,  0,  0,
    50, 50, 50, 50, 50, 50, 50, 50,
    10, 10, 20, 30, 30, 20, 10, 10,
     5,  5, 10, 25, 25, 10,  5,  5,
     0,  0,  0, 20, 20,  0,  0,  0,
     5, -5,-10,  0,  0,-10, -5,  5,
     5, 10, 10,-20,-20, 10, 10,  5,
     0,  0,  0,  0,  0,  0,  0,  0,
]);

#[rustfmt::skip]
const KNIGHT: Psqt = Psqt::new([
    -50,-40,-30,-30,-30,-30,-40,-50,
    -40,-20,  0,  0,  0,  0,-20,-40,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 15, 20, 20, 15,  0,-30,
    -30,  5, 10, 15, 15, 10,  5,-30,
    -40,-20,  0,  5,  5,  0,-20,-40,
    -50,-40,-30,-30,-30,-30,-40,-50,
]);

#[rustfmt::skip]
const BISHOP: Psqt = Psqt::new([
    -20,-10,-10,-10,-10,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5, 10, 10,  5,  0,-10,
    -10,  5,  5, 10, 10,  5,  5,-10,
    -10,  0, 10, 10, 10, 10,  0,-10,
    -10, 10, 10, 10, 10, 10, 10,-10,
    -10,  5,  0,  0,  0,  0,  5,-10,
    -20,-10,-10,-10,-10,-10,-10,-20,
]);

#[rustfmt::skip]
const ROOK: Psqt = Psqt::new([
     0,  0,  0,  0,  0,  0,  0,  0,
     5, 10, 10, 10, 10, 10, 10,  5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
    -5,  0,  0,  0,  0,  0,  0, -5,
     0,  0,  0,  5,  5,  0,  0,  0,
]);

#[rustfmt::skip]
const QUEEN: Psqt = Psqt::new([
    -20,-10,-10, -5, -5,-10,-10,-20,
    -10,  0,  0,  0,  0,  0,  0,-10,
    -10,  0,  5,  5,  5,  5,  0,-10,
     -5,  0,  5,  5,  5,  5,  0, -5,
      0,  0,  5,  5,  5,  5,  0, -5,
    -10,  5,  5,  5,  5,  5,  0,-10,
    -10,  0,  5,  0,  0,  0,  0,-10,
    -20,-10,-10, -5, -5,-10,-10,-20,
]);

#[rustfmt::skip]
const KING_MG: Psqt = Psqt::new([
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -30,-40,-40,-50,-50,-40,-40,-30,
    -20,-30,-30,-40,-40,-30,-30,-20,
    -10,-20,-20,-20,-20,-20,-20,-10,
     20, 20,  0,  0,  0,  0, 20, 20,
     20, 30, 10,  0,  0, 10, 30, 20,
]);

#[rustfmt::skip]
const KING_EG: Psqt = Psqt::new([
    -50,-30,-30,-30,-30,-30,-30,-50,
    -30,-10,  0,  0,  0,  0,-10,-30,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  5, 15, 20, 20, 15,  5,-30,
    -30,  0, 10, 15, 15, 10,  0,-30,
    -30,-10,  0,  0,  0,  0,-10,-30,
    -50,-30,-30,-30,-30,-30,-30,-50,
]);

/// A [Piece-Square Table](https://www.chessprogramming.org/Piece-Square_Tables) for use in evaluation.
///
/// Stored with `a1` at index `0`, from White's perspective.
#[derive(Debug)]
pub struct Psqt([i32; Square::COUNT]);

impl Psqt {
    /// Positional bonus of `piece` standing on `square`.
    ///
    /// Only the King's value depends on `phase`, interpolating from the middle-game table (at [`MAX_PHASE`])
    /// to the endgame table (at `0`).
    #[inline(always)]
    pub fn eval(piece: Piece, square: Square, phase: i32) -> i32 {
        let square = square.relative_to(piece.color());

        match piece.kind() {
            PieceKind::Pawn => PAWN.get(square),
            PieceKind::Knight => KNIGHT.get(square),
            PieceKind::Bishop => BISHOP.get(square),
            PieceKind::Rook => ROOK.get(square),
            PieceKind::Queen => QUEEN.get(square),
            PieceKind::King => {
                let phase = phase.clamp(0, MAX_PHASE);
                (KING_MG.get(square) * phase + KING_EG.get(square) * (MAX_PHASE - phase))
                    / MAX_PHASE
            }
        }
    }

    /// Creates a new [`Psqt`] from a table written with `a8` first.
    const fn new(psqt: [i32; Square::COUNT]) -> Self {
        let mut flipped = psqt;

        let mut i = 0;
        while i < psqt.len() {
            // Flip the rank, not the file, so `a1` lands on index 0
            flipped[i] = psqt[i ^ 56];
            i += 1;
        }

        Self(flipped)
    }

    /// Get the value of this PSQT at the provided square, from White's perspective.
    #[inline(always)]
    pub const fn get(&self, square: Square) -> i32 {
        self.0[square.index()]
    }

    /// The table used for `kind`, choosing the middle-game table for the King.
    pub fn for_kind(kind: PieceKind) -> &'static Self {
        match kind {
            PieceKind::Pawn => &PAWN,
            PieceKind::Knight => &KNIGHT,
            PieceKind::Bishop => &BISHOP,
            PieceKind::Rook => &ROOK,
            PieceKind::Queen => &QUEEN,
            PieceKind::King => &KING_MG,
        }
    }
}

impl fmt::Display for Psqt {
    /// Printing a [`Psqt`] will display it in the same way it is written in the code (White's perspective).
    ///
    /// If the alternate formatter is used (`#`), it will print as if from Black's perspective.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let color = if f.alternate() {
            Color::Black
        } else {
            Color::White
        };

        for rank in (0..8).rev() {
            write!(f, "{}| ", rank + 1)?;
            for file in 0..8 {
                let value = self.get(Square::new(file, rank).relative_to(color));
                write!(f, "{value:3} ")?;
            }
            writeln!(f)?;
        }

        write!(f, " +")?;
        for _ in 0..8 {
            write!(f, "----")?;
        }
        write!(f, "\n   ")?;
        for file in 'a'..='h' {
            write!(f, "{file}   ")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_is_correct_for_colors() {
        for phase in 0..=MAX_PHASE {
            for square in Square::iter() {
                for kind in PieceKind::all() {
                    let white = Psqt::eval(Piece::new(Color::White, kind), square, phase);
                    let black = Psqt::eval(
                        Piece::new(Color::Black, kind),
                        square.relative_to(Color::Black),
                        phase,
                    );

                    assert_eq!(
                        white,
                        black,
                        "{} on {square} (phase := {phase}): {white} (white) != {black} (black)",
                        kind.name()
                    );
                }
            }
        }
    }

    #[test]
    fn test_tables_are_oriented() {
        // Pawns on the seventh rank are worth more than on the second
        let white_pawn = Piece::new(Color::White, PieceKind::Pawn);
        assert_eq!(Psqt::eval(white_pawn, "e7".parse().unwrap(), MAX_PHASE), 50);
        assert_eq!(Psqt::eval(white_pawn, "e2".parse().unwrap(), MAX_PHASE), -20);

        let black_pawn = Piece::new(Color::Black, PieceKind::Pawn);
        assert_eq!(Psqt::eval(black_pawn, "e2".parse().unwrap(), MAX_PHASE), 50);

        // A castled King is safe in the middle game and should centralize in the endgame
        let white_king = Piece::new(Color::White, PieceKind::King);
        assert_eq!(Psqt::eval(white_king, Square::G1, MAX_PHASE), 30);
        assert_eq!(Psqt::eval(white_king, Square::G1, 0), -30);
        assert_eq!(Psqt::eval(white_king, "e4".parse().unwrap(), 0), 20);
    }
}
