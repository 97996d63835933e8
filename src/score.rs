/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::fmt;

use uci_parser::UciScore;

use crate::MAX_SEARCH_PLY;

pub type ScoreInternal = i32;

/// A numerical representation of the evaluation of a position / move, in units of ["centipawns"](https://www.chessprogramming.org/Score).
///
/// Scores are always from the perspective of the side to move.
#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Score(ScoreInternal);

impl Score {
    /// Bound that no real score ever reaches.
    pub const INF: Self = Self(2_000_000);

    /// Score of delivering mate on the current move.
    pub const MATE: Self = Self(1_000_000);

    /// Score of a draw.
    pub const DRAW: Self = Self(0);

    /// Initial value of alpha in alpha-beta pruning.
    pub const ALPHA: Self = Self(-Self::INF.0);

    /// Initial value of beta in alpha-beta pruning.
    pub const BETA: Self = Self::INF;

    /// Lowest possible score for mate.
    ///
    /// This is only obtainable if mate is found [`MAX_SEARCH_PLY`] plies from the root.
    pub const LOWEST_MATE: Self = Self(Self::MATE.0 - MAX_SEARCH_PLY as ScoreInternal);

    /// Constructs a new [`Score`] instance.
    #[inline(always)]
    pub const fn new(score: ScoreInternal) -> Self {
        Self(score)
    }

    /// Score of being checkmated `ply` plies from the root.
    ///
    /// # Example
    /// ```
    /// # use hopper::Score;
    /// assert_eq!(Score::mated_in(3), -Score::MATE + 3);
    /// assert!(Score::mated_in(3).is_mate());
    /// ```
    #[inline(always)]
    pub const fn mated_in(ply: usize) -> Self {
        Self(-Self::MATE.0 + ply as ScoreInternal)
    }

    /// The raw centipawn value of this score.
    #[inline(always)]
    pub const fn inner(&self) -> ScoreInternal {
        self.0
    }

    /// Returns `true` if the score is a mate score, for either side.
    #[inline(always)]
    pub const fn is_mate(&self) -> bool {
        self.0.abs() >= Self::LOWEST_MATE.0 && self.0.abs() <= Self::MATE.0
    }

    /// Converts this [`Score`] into a [`UciScore`],
    /// determining whether it is a centipawns score or a mate score.
    ///
    /// Used when sending the `info score` message.
    #[inline(always)]
    pub fn into_uci(self) -> UciScore {
        if self.is_mate() {
            UciScore::mate(self.moves_to_mate())
        } else {
            UciScore::cp(self.0)
        }
    }

    /// Returns the number of plies (half moves) this score is from mate.
    #[inline(always)]
    pub const fn plies_to_mate(&self) -> i32 {
        Self::MATE.0 - self.0.abs()
    }

    /// Returns the number of moves (full moves) this score is from mate.
    ///
    /// Negative if the side to move is the one being mated.
    ///
    /// # Example
    /// ```
    /// # use hopper::Score;
    /// assert_eq!((Score::MATE - 1).moves_to_mate(), 1);
    /// assert_eq!((Score::MATE - 3).moves_to_mate(), 2);
    /// assert_eq!((-Score::MATE + 2).moves_to_mate(), -1);
    /// ```
    #[inline(always)]
    pub const fn moves_to_mate(&self) -> i32 {
        let plies = self.plies_to_mate();

        // Our own mate needs our move to be made, so round up
        if self.0 > 0 {
            (plies + 1) / 2
        } else {
            -plies / 2
        }
    }

    /// Converts a mate score found `ply` plies from the root into one relative to the node at `ply`.
    ///
    /// This is how mate scores are stored in the transposition table, so that an entry
    /// means the same thing regardless of where in the tree it is probed.
    /// Non-mate scores are unchanged.
    #[inline(always)]
    pub fn relative(self, ply: usize) -> Self {
        if !self.is_mate() {
            self
        } else if self > Self::DRAW {
            self + ply as ScoreInternal
        } else {
            self - ply as ScoreInternal
        }
    }

    /// Inverse of [`Score::relative`]: converts a stored mate score back into one relative to the root,
    /// for a node `ply` plies from the root.
    #[inline(always)]
    pub fn absolute(self, ply: usize) -> Self {
        if !self.is_mate() {
            self
        } else if self > Self::DRAW {
            self - ply as ScoreInternal
        } else {
            self + ply as ScoreInternal
        }
    }

    /// Returns the absolute value of this [`Score`].
    #[inline(always)]
    pub const fn abs(self) -> Self {
        Self(self.0.abs())
    }

    /// Linear interpolation from `self` (at `t = 0`) to `other` (at `t = max`).
    #[inline(always)]
    pub const fn lerp(self, other: Self, t: ScoreInternal, max: ScoreInternal) -> Self {
        Self((self.0 * t + other.0 * (max - t)) / max)
    }
}

impl From<Score> for UciScore {
    #[inline(always)]
    fn from(value: Score) -> Self {
        value.into_uci()
    }
}

macro_rules! impl_binary_op {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: Self) -> Self::Output {
                Self(self.0.$fn(rhs.0))
            }
        }

        impl std::ops::$trait<ScoreInternal> for Score {
            type Output = Self;

            #[inline(always)]
            fn $fn(self, rhs: ScoreInternal) -> Self::Output {
                Self(self.0.$fn(rhs))
            }
        }
    };
}

macro_rules! impl_binary_op_assign {
    ($trait:tt, $fn:ident) => {
        impl std::ops::$trait for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: Self) {
                self.0.$fn(rhs.0);
            }
        }

        impl std::ops::$trait<ScoreInternal> for Score {
            #[inline(always)]
            fn $fn(&mut self, rhs: ScoreInternal) {
                self.0.$fn(rhs);
            }
        }
    };
}

impl_binary_op!(Add, add);
impl_binary_op!(Sub, sub);
impl_binary_op!(Mul, mul);
impl_binary_op!(Div, div);

impl_binary_op_assign!(AddAssign, add_assign);
impl_binary_op_assign!(SubAssign, sub_assign);

impl std::ops::Neg for Score {
    type Output = Self;

    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl std::iter::Sum for Score {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::DRAW, |acc, score| acc + score)
    }
}

impl fmt::Display for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for Score {
    #[inline(always)]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_mate() {
            write!(
                f,
                "{} (mate in {} plies, {} moves)",
                self.0,
                self.plies_to_mate(),
                self.moves_to_mate()
            )
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_absolute() {
        let ply = 3;

        let our_mate = Score::MATE - ply as ScoreInternal;
        assert_eq!(our_mate.plies_to_mate(), ply as i32);
        assert_eq!(our_mate.relative(ply), Score::MATE);
        assert_eq!(our_mate.relative(ply).absolute(ply), our_mate);

        let their_mate = Score::mated_in(ply);
        assert_eq!(their_mate.relative(ply), -Score::MATE);
        assert_eq!(their_mate.relative(ply).absolute(ply), their_mate);
    }

    #[test]
    fn test_stored_mate_probed_elsewhere() {
        // Mate found 5 plies from the root by a node at ply 2 ...
        let stored = (Score::MATE - 5).relative(2);
        // ... is mate 4 plies from the root when probed at ply 1.
        assert_eq!(stored.absolute(1), Score::MATE - 4);
    }

    #[test]
    fn test_non_mate_scores_unchanged() {
        let score = Score::new(250);
        assert!(!score.is_mate());
        assert_eq!(score.relative(10), score);
        assert_eq!(score.absolute(10), score);
        assert!(!Score::INF.is_mate());
        assert!(!Score::ALPHA.is_mate());
    }

    #[test]
    fn test_lerp() {
        let mg = Score::new(100);
        let eg = Score::new(-20);
        assert_eq!(mg.lerp(eg, 24, 24), mg);
        assert_eq!(mg.lerp(eg, 0, 24), eg);
        assert_eq!(mg.lerp(eg, 12, 24), Score::new(40));
    }
}
