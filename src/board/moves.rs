/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use anyhow::{bail, Result};

use super::{PieceKind, Position, Square, MAX_NUM_MOVES};

/// An alias for an [`arrayvec::ArrayVec`] containing at most [`MAX_NUM_MOVES`] moves.
pub type MoveList = arrayvec::ArrayVec<Move, MAX_NUM_MOVES>;

/// A move made on a chess board.
///
/// Two moves are equal only if their source, destination, promotion and castling flag all match.
/// Castling is encoded as the King's movement (`e1g1`, `e8c8`, etc.), as in UCI.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    promotion: Option<PieceKind>,
    is_castle: bool,
}

impl Move {
    /// Creates a regular [`Move`] from `from` to `to`.
    ///
    /// # Example
    /// ```
    /// # use hopper::{Move, Square};
    /// let mv = Move::new("g1".parse().unwrap(), "f3".parse().unwrap());
    /// assert_eq!(mv.to_string(), "g1f3");
    /// ```
    #[inline(always)]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            is_castle: false,
        }
    }

    /// Creates a pawn [`Move`] that promotes to `promotion` upon arrival.
    #[inline(always)]
    pub const fn new_promotion(from: Square, to: Square, promotion: PieceKind) -> Self {
        Self {
            from,
            to,
            promotion: Some(promotion),
            is_castle: false,
        }
    }

    /// Creates a castling [`Move`], given by the King's source and destination.
    #[inline(always)]
    pub const fn new_castle(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            is_castle: true,
        }
    }

    /// Parses UCI move text (`e2e4`, `e7e8q`) in the context of `position`.
    ///
    /// The text must name one of the legal moves in `position`, otherwise an error is returned.
    ///
    /// # Example
    /// ```
    /// # use hopper::{Move, Position};
    /// let position = Position::default();
    /// let mv = Move::from_uci(&position, "e2e4").unwrap();
    /// assert_eq!(mv, "e2e4");
    ///
    /// assert!(Move::from_uci(&position, "e2e5").is_err());
    /// assert!(Move::from_uci(&position, "hello").is_err());
    /// ```
    pub fn from_uci(position: &Position, uci: &str) -> Result<Self> {
        let (from, to, promotion) = Self::parse_uci_parts(uci)?;

        let found = position
            .legal_moves()
            .into_iter()
            .find(|mv| mv.from == from && mv.to == to && mv.promotion == promotion);

        match found {
            Some(mv) => Ok(mv),
            None => bail!("Illegal move {uci:?} in position {position}"),
        }
    }

    /// Splits UCI move text into its source, destination, and promotion.
    fn parse_uci_parts(uci: &str) -> Result<(Square, Square, Option<PieceKind>)> {
        if !uci.is_ascii() || !(4..=5).contains(&uci.len()) {
            bail!("Invalid move text {uci:?}: Must be 4 or 5 chars, like \"e2e4\" or \"e7e8q\".");
        }

        let from = Square::from_uci(&uci[0..2])?;
        let to = Square::from_uci(&uci[2..4])?;

        let promotion = match uci.chars().nth(4) {
            None => None,
            Some(c) => {
                let kind = PieceKind::from_uci(c)?;
                if !PieceKind::PROMOTIONS.contains(&kind) || c.is_ascii_uppercase() {
                    bail!("Invalid promotion in move {uci:?}: Must be one of [qrbn]. Got {c:?}.");
                }
                Some(kind)
            }
        };

        Ok((from, to, promotion))
    }

    /// Source square of this move.
    #[inline(always)]
    pub const fn from(&self) -> Square {
        self.from
    }

    /// Destination square of this move.
    #[inline(always)]
    pub const fn to(&self) -> Square {
        self.to
    }

    /// The piece this move promotes to, if any.
    #[inline(always)]
    pub const fn promotion(&self) -> Option<PieceKind> {
        self.promotion
    }

    /// Returns `true` if this move promotes a pawn.
    #[inline(always)]
    pub const fn is_promotion(&self) -> bool {
        self.promotion.is_some()
    }

    /// Returns `true` if this move is castling.
    #[inline(always)]
    pub const fn is_castle(&self) -> bool {
        self.is_castle
    }

    /// UCI text for this move.
    #[inline(always)]
    pub fn to_uci(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(promotion) = self.promotion {
            write!(f, "{}{}{}", self.from, self.to, promotion)
        } else {
            write!(f, "{}{}", self.from, self.to)
        }
    }
}

impl fmt::Debug for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")?;
        if self.is_castle {
            write!(f, " (castle)")?;
        }
        Ok(())
    }
}

impl<T: AsRef<str>> PartialEq<T> for Move {
    #[inline(always)]
    fn eq(&self, other: &T) -> bool {
        self.to_string().eq(other.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FEN_KIWIPETE;

    #[test]
    fn test_move_text() {
        let e7e8n = Move::new_promotion(
            "e7".parse().unwrap(),
            "e8".parse().unwrap(),
            PieceKind::Knight,
        );
        assert_eq!(e7e8n.to_string(), "e7e8n");
        assert!(e7e8n.is_promotion());
        assert!(!e7e8n.is_castle());
    }

    #[test]
    fn test_castle_flag_distinguishes_moves() {
        let plain = Move::new(Square::E1, Square::G1);
        let castle = Move::new_castle(Square::E1, Square::G1);
        assert_ne!(plain, castle);
        assert_eq!(plain.to_string(), castle.to_string());
    }

    #[test]
    fn test_from_uci_finds_castling() {
        let position: Position = FEN_KIWIPETE.parse().unwrap();
        let mv = Move::from_uci(&position, "e1g1").unwrap();
        assert!(mv.is_castle());

        let mv = Move::from_uci(&position, "e1c1").unwrap();
        assert!(mv.is_castle());
    }

    #[test]
    fn test_from_uci_rejects_bad_text() {
        let position = Position::default();
        for bad in ["", "e2", "e2e4e", "e2e4Q", "e7e8k", "z2e4", "a1a1", "e2e3x"] {
            assert!(Move::from_uci(&position, bad).is_err(), "{bad:?} should fail");
        }
    }
}
