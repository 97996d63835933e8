/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Result};

/// The color of a player or a piece.
///
/// White moves first, so [`Color`] defaults to [`Color::White`].
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum Color {
    #[default]
    White,
    Black,
}

impl Color {
    /// Number of color variants.
    pub const COUNT: usize = 2;

    /// Both colors, starting with White.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [Self::White, Self::Black]
    }

    /// Returns `true` if this [`Color`] is White.
    #[inline(always)]
    pub const fn is_white(&self) -> bool {
        matches!(self, Self::White)
    }

    /// Returns `true` if this [`Color`] is Black.
    #[inline(always)]
    pub const fn is_black(&self) -> bool {
        matches!(self, Self::Black)
    }

    /// Returns this [`Color`]'s opponent.
    ///
    /// # Example
    /// ```
    /// # use hopper::Color;
    /// assert_eq!(Color::White.opponent(), Color::Black);
    /// assert_eq!(Color::Black.opponent(), Color::White);
    /// ```
    #[inline(always)]
    pub const fn opponent(&self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// `0` for White, `1` for Black. Used for indexing into tables.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Direction, in ranks, that this color's pawns advance.
    #[inline(always)]
    pub const fn forward(&self) -> i8 {
        match self {
            Self::White => 1,
            Self::Black => -1,
        }
    }

    /// Rank (`0..8`) on which this color's pawns begin the game.
    #[inline(always)]
    pub const fn pawn_rank(&self) -> u8 {
        match self {
            Self::White => 1,
            Self::Black => 6,
        }
    }

    /// Rank (`0..8`) on which this color's pawns promote.
    #[inline(always)]
    pub const fn promotion_rank(&self) -> u8 {
        match self {
            Self::White => 7,
            Self::Black => 0,
        }
    }

    /// Rank (`0..8`) on which this color's king and rooks begin the game.
    #[inline(always)]
    pub const fn back_rank(&self) -> u8 {
        match self {
            Self::White => 0,
            Self::Black => 7,
        }
    }

    /// Parses a [`Color`] from the side-to-move field of a FEN string.
    ///
    /// # Example
    /// ```
    /// # use hopper::Color;
    /// assert_eq!(Color::from_uci('b').unwrap(), Color::Black);
    /// assert!(Color::from_uci('x').is_err());
    /// ```
    #[inline(always)]
    pub fn from_uci(color: char) -> Result<Self> {
        match color {
            'w' | 'W' => Ok(Self::White),
            'b' | 'B' => Ok(Self::Black),
            _ => bail!("Invalid char for Color: Must be 'w' or 'b'. Got {color:?}."),
        }
    }

    /// Converts this [`Color`] into its FEN char.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::White => 'w',
            Self::Black => 'b',
        }
    }

    /// Human-readable name of this color.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::White => "White",
            Self::Black => "Black",
        }
    }
}

impl fmt::Display for Color {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// The kind of a piece, without regard for its color.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Number of piece kinds.
    pub const COUNT: usize = 6;

    /// Pieces that a pawn may promote to, in the order they are generated.
    pub const PROMOTIONS: [Self; 4] = [Self::Queen, Self::Rook, Self::Bishop, Self::Knight];

    /// All piece kinds, from least to most valuable.
    #[inline(always)]
    pub const fn all() -> [Self; Self::COUNT] {
        [
            Self::Pawn,
            Self::Knight,
            Self::Bishop,
            Self::Rook,
            Self::Queen,
            Self::King,
        ]
    }

    /// Index of this kind, `0..6`.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Material value of this piece kind, in centipawns.
    ///
    /// The King's value is large enough to dominate any exchange it takes part in.
    ///
    /// # Example
    /// ```
    /// # use hopper::PieceKind;
    /// assert_eq!(PieceKind::Pawn.value(), 100);
    /// assert_eq!(PieceKind::Queen.value(), 900);
    /// ```
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        match self {
            Self::Pawn => 100,
            Self::Knight => 320,
            Self::Bishop => 330,
            Self::Rook => 500,
            Self::Queen => 900,
            Self::King => 20_000,
        }
    }

    /// Contribution of this kind to the game phase (`24` at the start of the game, `0` with bare kings and pawns).
    #[inline(always)]
    pub const fn phase(&self) -> i32 {
        match self {
            Self::Knight | Self::Bishop => 1,
            Self::Rook => 2,
            Self::Queen => 4,
            Self::Pawn | Self::King => 0,
        }
    }

    /// Parses a (case-insensitive) piece letter.
    #[inline(always)]
    pub fn from_uci(kind: char) -> Result<Self> {
        match kind.to_ascii_lowercase() {
            'p' => Ok(Self::Pawn),
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            'k' => Ok(Self::King),
            _ => bail!("Invalid char for PieceKind: Must be one of [pnbrqk]. Got {kind:?}."),
        }
    }

    /// Lowercase letter of this kind.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        match self {
            Self::Pawn => 'p',
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
            Self::King => 'k',
        }
    }

    /// Human-readable name of this kind.
    #[inline(always)]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Pawn => "pawn",
            Self::Knight => "knight",
            Self::Bishop => "bishop",
            Self::Rook => "rook",
            Self::Queen => "queen",
            Self::King => "king",
        }
    }
}

impl fmt::Display for PieceKind {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

/// A piece on the board: a [`Color`] and a [`PieceKind`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Piece {
    color: Color,
    kind: PieceKind,
}

impl Piece {
    /// Number of distinct pieces (6 kinds, 2 colors).
    pub const COUNT: usize = PieceKind::COUNT * Color::COUNT;

    /// Creates a new [`Piece`].
    #[inline(always)]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// This piece's color.
    #[inline(always)]
    pub const fn color(&self) -> Color {
        self.color
    }

    /// This piece's kind.
    #[inline(always)]
    pub const fn kind(&self) -> PieceKind {
        self.kind
    }

    /// Returns `true` if this piece is of `kind`.
    #[inline(always)]
    pub const fn is(&self, color: Color, kind: PieceKind) -> bool {
        self.color as u8 == color as u8 && self.kind as u8 == kind as u8
    }

    /// Index of this piece, `0..12`. White pieces come first.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.color.index() * PieceKind::COUNT + self.kind.index()
    }

    /// Material value of this piece.
    #[inline(always)]
    pub const fn value(&self) -> i32 {
        self.kind.value()
    }

    /// Parses a FEN piece letter, where uppercase is White.
    ///
    /// # Example
    /// ```
    /// # use hopper::{Color, Piece, PieceKind};
    /// let piece = Piece::from_uci('n').unwrap();
    /// assert_eq!(piece, Piece::new(Color::Black, PieceKind::Knight));
    /// assert_eq!(piece.to_uci(), 'n');
    /// ```
    #[inline(always)]
    pub fn from_uci(piece: char) -> Result<Self> {
        let kind = PieceKind::from_uci(piece)?;
        let color = if piece.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };

        Ok(Self::new(color, kind))
    }

    /// FEN letter of this piece.
    #[inline(always)]
    pub const fn to_uci(&self) -> char {
        let c = self.kind.to_uci();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

impl FromStr for Piece {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_uci(c),
            _ => bail!("Invalid str for Piece: Must be a single char. Got {s:?}."),
        }
    }
}

impl fmt::Display for Piece {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_uci())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_indices_are_unique() {
        let mut seen = [false; Piece::COUNT];
        for color in Color::all() {
            for kind in PieceKind::all() {
                let index = Piece::new(color, kind).index();
                assert!(!seen[index], "duplicate index {index}");
                seen[index] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_piece_letters() {
        for c in "PNBRQKpnbrqk".chars() {
            let piece = Piece::from_uci(c).unwrap();
            assert_eq!(piece.to_uci(), c);
        }
        assert!(Piece::from_uci('x').is_err());
        assert!("Qq".parse::<Piece>().is_err());
    }
}
