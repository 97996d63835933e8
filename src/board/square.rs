/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Result};

use crate::Color;

/// A single square on an `8x8` board.
///
/// Squares are numbered with [Least Significant File Mapping](https://www.chessprogramming.org/Square_Mapping_Considerations#Deduction_on_Files_and_Ranks),
/// so `A1` is `0`, `H1` is `7`, and `H8` is `63`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct Square(u8);

/// Offsets of the eight squares a knight can jump to.
pub(crate) const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

/// Offsets of the eight squares surrounding a king.
pub(crate) const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
];

/// Directions that bishops (and queens) slide along.
pub(crate) const DIAGONAL_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, -1), (-1, 1)];

/// Directions that rooks (and queens) slide along.
pub(crate) const ORTHOGONAL_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

impl Square {
    /// Number of squares on the board.
    pub const COUNT: usize = 64;

    pub const A1: Self = Self(0);
    pub const B1: Self = Self(1);
    pub const C1: Self = Self(2);
    pub const D1: Self = Self(3);
    pub const E1: Self = Self(4);
    pub const F1: Self = Self(5);
    pub const G1: Self = Self(6);
    pub const H1: Self = Self(7);
    pub const A8: Self = Self(56);
    pub const B8: Self = Self(57);
    pub const C8: Self = Self(58);
    pub const D8: Self = Self(59);
    pub const E8: Self = Self(60);
    pub const F8: Self = Self(61);
    pub const G8: Self = Self(62);
    pub const H8: Self = Self(63);

    /// Creates a [`Square`] from a file and rank, each in `0..8`.
    ///
    /// # Example
    /// ```
    /// # use hopper::Square;
    /// assert_eq!(Square::new(4, 0), Square::E1);
    /// assert_eq!(Square::new(7, 7), Square::H8);
    /// ```
    #[inline(always)]
    pub const fn new(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Self(rank * 8 + file)
    }

    /// Creates a [`Square`] from an index in `0..64`, or `None` if the index is off the board.
    #[inline(always)]
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Every square on the board, from `A1` to `H8`.
    #[inline(always)]
    pub fn iter() -> impl Iterator<Item = Self> {
        (0..Self::COUNT as u8).map(Self)
    }

    /// Index of this square, `0..64`.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// File of this square, `0..8` for `a..h`.
    #[inline(always)]
    pub const fn file(&self) -> u8 {
        self.0 % 8
    }

    /// Rank of this square, `0..8` for `1..8`.
    #[inline(always)]
    pub const fn rank(&self) -> u8 {
        self.0 / 8
    }

    /// This square as seen by `color`: unchanged for White, mirrored across the horizontal axis for Black.
    ///
    /// # Example
    /// ```
    /// # use hopper::{Color, Square};
    /// assert_eq!(Square::E1.relative_to(Color::Black), "e8".parse().unwrap());
    /// ```
    #[inline(always)]
    pub const fn relative_to(&self, color: Color) -> Self {
        match color {
            Color::White => *self,
            Color::Black => Self(self.0 ^ 56),
        }
    }

    /// Shifts this square by `df` files and `dr` ranks, yielding `None` if the result is off the board.
    ///
    /// # Example
    /// ```
    /// # use hopper::Square;
    /// assert_eq!(Square::A1.offset(1, 2), Some("b3".parse().unwrap()));
    /// assert_eq!(Square::A1.offset(-1, 0), None);
    /// assert_eq!(Square::H8.offset(0, 1), None);
    /// ```
    #[inline(always)]
    pub const fn offset(&self, df: i8, dr: i8) -> Option<Self> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;

        if file < 0 || file > 7 || rank < 0 || rank > 7 {
            None
        } else {
            Some(Self::new(file as u8, rank as u8))
        }
    }

    /// Parses a square from its algebraic name, such as `e4`.
    pub fn from_uci(square: &str) -> Result<Self> {
        let mut chars = square.chars();
        let (Some(file), Some(rank), None) = (chars.next(), chars.next(), chars.next()) else {
            bail!("Invalid str for Square: Must be two chars, like \"e4\". Got {square:?}.");
        };

        if !('a'..='h').contains(&file) {
            bail!("Invalid file in Square {square:?}: Must be in [a,h]. Got {file:?}.");
        }
        let rank = rank
            .to_digit(10)
            .filter(|r| (1..=8).contains(r))
            .with_context(|| {
                format!("Invalid rank in Square {square:?}: Must be in [1,8]. Got {rank:?}.")
            })?;

        Ok(Self::new(file as u8 - b'a', rank as u8 - 1))
    }

    /// Algebraic name of this square, such as `e4`.
    pub fn to_uci(&self) -> String {
        format!("{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

impl FromStr for Square {
    type Err = anyhow::Error;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_uci(s)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.file()) as char, self.rank() + 1)
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self} ({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_names_round_trip() {
        for square in Square::iter() {
            let name = square.to_uci();
            assert_eq!(name.parse::<Square>().unwrap(), square);
        }
    }

    #[test]
    fn test_invalid_square_names() {
        for bad in ["", "e", "e9", "i1", "e0", "e44", "E4"] {
            assert!(Square::from_uci(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_knight_offsets_stay_on_board() {
        let corner_jumps = KNIGHT_OFFSETS
            .iter()
            .filter_map(|&(df, dr)| Square::A1.offset(df, dr))
            .count();
        assert_eq!(corner_jumps, 2);

        let center_jumps = KNIGHT_OFFSETS
            .iter()
            .filter_map(|&(df, dr)| Square::new(3, 3).offset(df, dr))
            .count();
        assert_eq!(center_jumps, 8);
    }
}
