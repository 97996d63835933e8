/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, ops::Range};

use crate::{
    tune, Color, Piece, PieceKind, Position, Psqt, Score, Square, DIAGONAL_DIRECTIONS,
    KING_OFFSETS, KNIGHT_OFFSETS, MAX_PHASE, ORTHOGONAL_DIRECTIONS,
};

/// Largest magnitude a static evaluation may have, keeping it well clear of mate scores.
const EVAL_CAP: i32 = Score::MATE.inner() / 2 - 1;

/// How much reaching each square is worth to a piece's mobility.
#[rustfmt::skip]
const MOBILITY_WEIGHTS: [i32; Square::COUNT] = [
    0, 1, 1, 1, 1, 1, 1, 0,
    1, 2, 2, 2, 2, 2, 2, 1,
    1, 2, 3, 3, 3, 3, 2, 1,
    1, 2, 3, 4, 4, 3, 2, 1,
    1, 2, 3, 4, 4, 3, 2, 1,
    1, 2, 3, 3, 3, 3, 2, 1,
    1, 2, 2, 2, 2, 2, 2, 1,
    0, 1, 1, 1, 1, 1, 1, 0,
];

/// Encapsulates the logic of scoring a chess position.
///
/// During a negamax search, positions must be evaluated from the side-to-move's perspective.
/// That is, if it is Black's turn, a "good" evaluation for Black will be a positive number.
pub trait Evaluator {
    /// Evaluate `position` from the side-to-move's perspective.
    fn evaluate(&self, position: &Position) -> Score;
}

/// A middle-game and an endgame value, blended according to the game phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tapered {
    pub mg: i32,
    pub eg: i32,
}

impl Tapered {
    #[inline(always)]
    pub const fn new(mg: i32, eg: i32) -> Self {
        Self { mg, eg }
    }

    /// Interpolates between the two values: `phase == MAX_PHASE` yields `mg` and `phase == 0` yields `eg`.
    ///
    /// # Example
    /// ```
    /// # use hopper::{Tapered, MAX_PHASE};
    /// let value = Tapered::new(20, 30);
    /// assert_eq!(value.taper(MAX_PHASE), 20);
    /// assert_eq!(value.taper(0), 30);
    /// assert_eq!(value.taper(MAX_PHASE / 2), 25);
    /// ```
    #[inline(always)]
    pub const fn taper(self, phase: i32) -> i32 {
        (self.mg * phase + self.eg * (MAX_PHASE - phase)) / MAX_PHASE
    }
}

/// The default [`Evaluator`].
///
/// Sums material, piece-square tables, pawn structure, passed pawns, pawn rams, Rook placement,
/// King safety, mobility, and material imbalances for both sides, then adds a tempo bonus.
/// Every positional term is [`Tapered`] by the game phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassicalEvaluator;

impl ClassicalEvaluator {
    /// Evaluate `position` from `color`'s perspective, without the tempo bonus.
    fn eval_for(&self, position: &Position, color: Color) -> i32 {
        let phase = game_phase(position);
        let pawns = PawnMap::new(position);

        EvalTerms::with_pawns(position, color, phase, &pawns).total()
            - EvalTerms::with_pawns(position, color.opponent(), phase, &pawns).total()
    }
}

impl Evaluator for ClassicalEvaluator {
    #[inline(always)]
    fn evaluate(&self, position: &Position) -> Score {
        let stm = position.side_to_move();
        let tempo = tune::tempo_bonus!().taper(game_phase(position));
        let score = self.eval_for(position, stm) + tempo;

        Score::new(score.clamp(-EVAL_CAP, EVAL_CAP))
    }
}

/// Current game phase, from [`MAX_PHASE`] with all minor and major pieces on the board down to `0`.
#[inline(always)]
pub fn game_phase(position: &Position) -> i32 {
    position
        .pieces()
        .map(|(_, piece)| piece.kind().phase())
        .sum::<i32>()
        .min(MAX_PHASE)
}

/// The value of every evaluation term for one side, from that side's perspective.
///
/// A [`ClassicalEvaluator`] score is the difference of both sides' [`EvalTerms::total`], plus tempo.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvalTerms {
    /// Material, excluding the King.
    pub material: i32,

    /// Piece-square tables.
    pub psqt: i32,

    /// Doubled, isolated, and backward Pawns.
    pub pawn_structure: i32,

    pub passed_pawns: i32,

    pub pawn_rams: i32,

    /// Rooks on open and semi-open files, and on the seventh rank.
    pub rooks: i32,

    /// Pawn shield and open files around the King.
    pub king_safety: i32,

    pub mobility: i32,

    /// Bishop pair, Rook pair, and Knight pair against Bishops.
    pub imbalance: i32,
}

impl EvalTerms {
    /// Evaluates every term of `position` for `color`.
    pub fn new(position: &Position, color: Color) -> Self {
        let pawns = PawnMap::new(position);
        Self::with_pawns(position, color, game_phase(position), &pawns)
    }

    fn with_pawns(position: &Position, color: Color, phase: i32, pawns: &PawnMap) -> Self {
        let mut terms = Self::default();
        let mut counts = [[0; PieceKind::COUNT]; Color::COUNT];

        for (square, piece) in position.pieces() {
            counts[piece.color().index()][piece.kind().index()] += 1;
            if piece.color() != color {
                continue;
            }

            terms.psqt += Psqt::eval(piece, square, phase);
            match piece.kind() {
                PieceKind::King => {
                    terms.king_safety += king_safety(square, color, phase, pawns);
                }
                PieceKind::Pawn => {
                    terms.material += piece.value();
                    terms.pawn_structure += pawn_structure(square, color, phase, pawns);
                    terms.passed_pawns += passed_pawn(square, color, phase, pawns);
                    terms.pawn_rams += pawn_ram(square, color, phase, pawns);
                }
                PieceKind::Rook => {
                    terms.material += piece.value();
                    terms.rooks += rook_placement(square, color, phase, pawns);
                    terms.mobility += mobility(position, square, piece, phase);
                }
                _ => {
                    terms.material += piece.value();
                    terms.mobility += mobility(position, square, piece, phase);
                }
            }
        }

        // Doubled Pawns are counted per file rather than per Pawn
        for file in 0..8 {
            let stacked = pawns.count_on_file(color, file);
            if stacked > 1 {
                terms.pawn_structure -= (stacked - 1) * tune::doubled_pawn_penalty!().taper(phase);
            }
        }

        let own = counts[color.index()];
        let theirs = counts[color.opponent().index()];
        if own[PieceKind::Bishop.index()] >= 2 {
            terms.imbalance += tune::bishop_pair_bonus!().taper(phase);
        }
        if own[PieceKind::Rook.index()] >= 2 {
            terms.imbalance += tune::rook_pair_bonus!().taper(phase);
        }
        if own[PieceKind::Knight.index()] >= 2 && theirs[PieceKind::Bishop.index()] >= 1 {
            terms.imbalance -= tune::knight_pair_penalty!().taper(phase);
        }

        terms
    }

    /// Sum of all terms.
    pub fn total(&self) -> i32 {
        self.named().iter().map(|(_, value)| value).sum()
    }

    /// Every term alongside a human-readable name.
    pub fn named(&self) -> [(&'static str, i32); 9] {
        [
            ("Material", self.material),
            ("Piece-square", self.psqt),
            ("Pawn structure", self.pawn_structure),
            ("Passed pawns", self.passed_pawns),
            ("Pawn rams", self.pawn_rams),
            ("Rooks", self.rooks),
            ("King safety", self.king_safety),
            ("Mobility", self.mobility),
            ("Imbalance", self.imbalance),
        ]
    }
}

/// Location of every Pawn, by color.
struct PawnMap([u64; Color::COUNT]);

impl PawnMap {
    fn new(position: &Position) -> Self {
        let mut pawns = [0; Color::COUNT];
        for (square, piece) in position.pieces() {
            if piece.kind() == PieceKind::Pawn {
                pawns[piece.color().index()] |= 1u64 << square.index();
            }
        }
        Self(pawns)
    }

    /// Whether `color` has a Pawn on `file` within `ranks`. Files off the board hold no Pawns.
    fn any(&self, color: Color, file: i8, ranks: Range<u8>) -> bool {
        (0..8).contains(&file)
            && ranks.into_iter().any(|rank| {
                self.0[color.index()] & (1u64 << Square::new(file as u8, rank).index()) != 0
            })
    }

    fn count_on_file(&self, color: Color, file: u8) -> i32 {
        (0..8)
            .filter(|&rank| self.0[color.index()] & (1u64 << Square::new(file, rank).index()) != 0)
            .count() as i32
    }
}

/// Ranks strictly in front of `rank`, as `color` moves.
#[inline(always)]
fn ranks_ahead(color: Color, rank: u8) -> Range<u8> {
    if color.is_white() {
        rank + 1..8
    } else {
        0..rank
    }
}

/// Ranks strictly behind `rank`, as `color` moves.
#[inline(always)]
fn ranks_behind(color: Color, rank: u8) -> Range<u8> {
    if color.is_white() {
        0..rank
    } else {
        rank + 1..8
    }
}

/// Isolated and backward Pawn penalties for the Pawn on `square`.
fn pawn_structure(square: Square, color: Color, phase: i32, pawns: &PawnMap) -> i32 {
    let file = square.file() as i8;
    let mut score = 0;

    if !pawns.any(color, file - 1, 0..8) && !pawns.any(color, file + 1, 0..8) {
        score -= tune::isolated_pawn_penalty!().taper(phase);
    }

    let behind = ranks_behind(color, square.rank());
    let supportable =
        pawns.any(color, file - 1, behind.clone()) || pawns.any(color, file + 1, behind);
    let blocked_by_own = pawns.any(color, file, ranks_ahead(color, square.rank()));
    if !supportable && !blocked_by_own {
        score -= tune::backward_pawn_penalty!().taper(phase);
    }

    score
}

/// Bonus for the Pawn on `square` if no enemy Pawn can stop or capture it on its way to promotion.
fn passed_pawn(square: Square, color: Color, phase: i32, pawns: &PawnMap) -> i32 {
    let file = square.file() as i8;
    let ahead = ranks_ahead(color, square.rank());
    let enemy = color.opponent();

    let blocked = (file - 1..=file + 1).any(|f| pawns.any(enemy, f, ahead.clone()));
    if blocked {
        return 0;
    }

    let rank = square.relative_to(color).rank() as usize;
    tune::passed_pawn_bonus!().taper(phase) + tune::passed_pawn_rank_bonus!()[rank].taper(phase)
}

/// Penalty for the Pawn on `square` if an enemy Pawn blocks it on its own half of the board.
fn pawn_ram(square: Square, color: Color, phase: i32, pawns: &PawnMap) -> i32 {
    if square.relative_to(color).rank() > 3 {
        return 0;
    }

    let forward = if color.is_white() { 1 } else { -1 };
    let Some(front) = square.offset(0, forward) else {
        return 0;
    };

    if pawns.any(color.opponent(), front.file() as i8, front.rank()..front.rank() + 1) {
        -tune::pawn_ram_penalty!().taper(phase)
    } else {
        0
    }
}

/// Open file, semi-open file, and seventh rank bonuses for the Rook on `square`.
fn rook_placement(square: Square, color: Color, phase: i32, pawns: &PawnMap) -> i32 {
    let file = square.file() as i8;
    let own = pawns.any(color, file, 0..8);
    let enemy = pawns.any(color.opponent(), file, 0..8);
    let mut score = 0;

    if !own && !enemy {
        score += tune::rook_open_file_bonus!().taper(phase);
    } else if !own {
        score += tune::rook_semi_open_file_bonus!().taper(phase);
    }

    if square.relative_to(color).rank() == 6 {
        score += tune::rook_on_seventh_bonus!().taper(phase);
    }

    score
}

/// Pawn shield bonus and open file penalties for the King on `square`.
fn king_safety(square: Square, color: Color, phase: i32, pawns: &PawnMap) -> i32 {
    let file = square.file() as i8;
    let mut score = 0;

    let forward = if color.is_white() { 1 } else { -1 };
    for df in -1..=1 {
        if let Some(shield) = square.offset(df, forward) {
            if pawns.any(color, shield.file() as i8, shield.rank()..shield.rank() + 1) {
                score += tune::king_shield_bonus!().taper(phase);
            }
        }
    }

    for f in (file - 1..=file + 1).filter(|f| (0..8).contains(f)) {
        let own = pawns.any(color, f, 0..8);
        let enemy = pawns.any(color.opponent(), f, 0..8);

        if !own && !enemy {
            score -= tune::king_open_file_penalty!().taper(phase);
        } else if !own {
            score -= tune::king_semi_open_file_penalty!().taper(phase);
        }
    }

    score
}

/// Weighted count of the squares `piece` on `square` attacks that are empty or hold an enemy.
fn mobility(position: &Position, square: Square, piece: Piece, phase: i32) -> i32 {
    let reachable = |target: Square| {
        position
            .piece_at(target)
            .map_or(true, |other| other.color() != piece.color())
    };

    let (reach, weight) = match piece.kind() {
        PieceKind::Knight => {
            let reach = KNIGHT_OFFSETS
                .iter()
                .filter_map(|&(df, dr)| square.offset(df, dr))
                .filter(|&target| reachable(target))
                .map(|target| MOBILITY_WEIGHTS[target.index()])
                .sum::<i32>();
            (reach, tune::knight_mobility_weight!())
        }
        PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
            let directions = match piece.kind() {
                PieceKind::Bishop => &DIAGONAL_DIRECTIONS[..],
                PieceKind::Rook => &ORTHOGONAL_DIRECTIONS[..],
                _ => &KING_OFFSETS[..],
            };

            let mut reach = 0;
            for &(df, dr) in directions {
                let mut current = square;
                while let Some(target) = current.offset(df, dr) {
                    if reachable(target) {
                        reach += MOBILITY_WEIGHTS[target.index()];
                    }
                    if position.piece_at(target).is_some() {
                        break;
                    }
                    current = target;
                }
            }
            (reach, tune::slider_mobility_weight!())
        }
        _ => return 0,
    };

    reach * weight.taper(phase)
}

/// Displays the contribution of every piece and every term to a [`ClassicalEvaluator`] evaluation.
pub struct EvalBreakdown<'a>(pub &'a Position);

impl fmt::Display for EvalBreakdown<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let position = self.0;
        let phase = game_phase(position);

        write!(f, "  +")?;
        for _ in 0..8 {
            write!(f, "-----+")?;
        }
        writeln!(f)?;

        for rank in (0..8).rev() {
            write!(f, "{} |", rank + 1)?;

            // Step 1: Write the piece char
            for file in 0..8 {
                let piece = position.piece_at(Square::new(file, rank));
                let piece_char = piece.map(|p| p.to_uci()).unwrap_or(' ');
                write!(f, "  {piece_char}  |")?;
            }
            writeln!(f)?;
            write!(f, "  |")?;

            // Step 2: Write the contribution of that piece, from White's perspective
            for file in 0..8 {
                let square = Square::new(file, rank);
                let cell = match position.piece_at(square) {
                    Some(piece) => {
                        let material = if piece.kind() == PieceKind::King {
                            0
                        } else {
                            piece.value()
                        };
                        let value = Psqt::eval(piece, square, phase) + material;
                        let value = if piece.color().is_white() { value } else { -value };
                        format!("{value:^+5}")
                    }
                    None => String::from("     "),
                };
                write!(f, "{cell}|")?;
            }
            writeln!(f)?;

            write!(f, "  +")?;
            for _ in 0..8 {
                write!(f, "-----+")?;
            }
            writeln!(f)?;
        }
        for file in 'a'..='h' {
            write!(f, "     {file}")?;
        }

        let white = EvalTerms::new(position, Color::White);
        let black = EvalTerms::new(position, Color::Black);
        writeln!(f, "\n\n{:<16}{:>8}{:>8}{:>8}", "Term", "White", "Black", "Total")?;
        for ((name, w), (_, b)) in white.named().into_iter().zip(black.named()) {
            writeln!(f, "{name:<16}{w:>8}{b:>8}{:>+8}", w - b)?;
        }
        let tempo = tune::tempo_bonus!().taper(phase);
        writeln!(f, "{:<16}{:>8}{:>8}{:>8}", "Tempo", "", "", tempo)?;

        let color = position.side_to_move();
        let score = ClassicalEvaluator.evaluate(position);

        let winning_side = if score > Score::DRAW {
            Some(color)
        } else if score < Score::DRAW {
            Some(color.opponent())
        } else {
            None
        };

        writeln!(f, "\nPhase: {phase}/{MAX_PHASE}")?;
        writeln!(
            f,
            "Winning side: {}",
            winning_side.map(|c| c.name()).unwrap_or("N/A")
        )?;
        writeln!(f, "Score: {score}")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FEN_KIWIPETE, FEN_STARTPOS};

    fn eval(fen: &str) -> Score {
        ClassicalEvaluator.evaluate(&Position::from_fen(fen).unwrap())
    }

    fn terms(fen: &str, color: Color) -> EvalTerms {
        EvalTerms::new(&Position::from_fen(fen).unwrap(), color)
    }

    /// Swaps the colors of `fen` and flips the board vertically.
    fn mirror(fen: &str) -> String {
        let swap_case = |s: &str| {
            s.chars()
                .map(|c| {
                    if c.is_ascii_uppercase() {
                        c.to_ascii_lowercase()
                    } else {
                        c.to_ascii_uppercase()
                    }
                })
                .collect::<String>()
        };

        let fields = fen.split_whitespace().collect::<Vec<_>>();
        let placements = fields[0].split('/').rev().map(swap_case).collect::<Vec<_>>();
        let stm = if fields[1] == "w" { "b" } else { "w" };
        let ep = match fields[3] {
            "-" => String::from("-"),
            ep => {
                let (file, rank) = ep.split_at(1);
                format!("{file}{}", if rank == "3" { "6" } else { "3" })
            }
        };

        format!(
            "{} {stm} {} {ep} {} {}",
            placements.join("/"),
            swap_case(fields[2]),
            fields[4],
            fields[5]
        )
    }

    #[test]
    fn test_startpos_is_only_tempo() {
        assert_eq!(eval(FEN_STARTPOS), Score::new(10));
        assert_eq!(game_phase(&Position::default()), MAX_PHASE);
    }

    #[test]
    fn test_eval_is_symmetric() {
        // Same position with colors swapped and the board mirrored
        let white = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let black = "rnbqkb1r/pppp1ppp/5n2/4p3/4P3/2N5/PPPP1PPP/R1BQKBNR b KQkq - 2 3";
        assert_eq!(eval(white), eval(black));

        for fen in [
            FEN_KIWIPETE,
            "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1",
            "2r3k1/1q1nbppp/r3p3/3pP3/pPpP4/P1Q2N2/2RN1PPP/2R4K b - b3 0 23",
        ] {
            assert_eq!(eval(fen), eval(&mirror(fen)), "{fen} vs {}", mirror(fen));
        }
    }

    #[test]
    fn test_material_advantage() {
        // White is up a Queen
        let fen = "4k3/8/8/8/8/8/8/3QK3 w - - 0 1";
        assert!(eval(fen) > Score::new(800));

        // ...which is bad news for Black
        let fen = "4k3/8/8/8/8/8/8/3QK3 b - - 0 1";
        assert!(eval(fen) < Score::new(-800));
    }

    #[test]
    fn test_imbalances() {
        // Two Bishops (phase 2)
        let pair = terms("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1", Color::White);
        assert_eq!(pair.imbalance, tune::bishop_pair_bonus!().taper(2));

        let rooks = terms("4k3/8/8/8/8/8/8/R3K2R w - - 0 1", Color::White);
        assert_eq!(rooks.imbalance, 15);

        // Two Knights facing a Bishop are penalized, a lone Bishop earns nothing
        let fen = "2b1k3/8/8/8/8/8/8/1N2KN2 w - - 0 1";
        assert_eq!(terms(fen, Color::White).imbalance, -15);
        assert_eq!(terms(fen, Color::Black).imbalance, 0);
    }

    #[test]
    fn test_king_table_tapers() {
        // Bare kings: phase 0, so kings use the endgame table
        let fen = "k7/8/8/8/8/8/8/4K3 w - - 0 1";
        assert_eq!(terms(fen, Color::White).psqt, -30);
        assert_eq!(terms(fen, Color::Black).psqt, -50);
    }

    #[test]
    fn test_pawn_structure() {
        // e2 and e3 are doubled and isolated, and e3 is also backward
        let fen = "4k3/8/8/8/8/4P3/4P3/4K3 w - - 0 1";
        assert_eq!(terms(fen, Color::White).pawn_structure, -10 - 2 * 15 - 8);

        // Nothing is isolated and b2 backs up c3, but nothing stands behind a2 or b2
        let fen = "4k3/8/8/8/8/2P5/PP6/4K3 w - - 0 1";
        assert_eq!(terms(fen, Color::White).pawn_structure, -2 * 8);
    }

    #[test]
    fn test_passed_pawns() {
        // d5 is passed: base bonus plus its rank bonus
        let fen = "4k3/8/8/3P4/8/8/8/4K3 w - - 0 1";
        assert_eq!(terms(fen, Color::White).passed_pawns, 30 + 50);

        // An enemy Pawn ahead on an adjacent file stops it from being passed
        let fen = "4k3/4p3/8/3P4/8/8/8/4K3 w - - 0 1";
        assert_eq!(terms(fen, Color::White).passed_pawns, 0);

        // Black's Pawns count from Black's side of the board
        let fen = "4k3/8/8/8/8/3p4/8/4K3 w - - 0 1";
        assert_eq!(terms(fen, Color::Black).passed_pawns, 30 + 75);
    }

    #[test]
    fn test_pawn_rams() {
        // White's e3 is rammed on its own half, Black's e4 has already crossed over
        let fen = "4k3/8/8/8/4p3/4P3/8/4K3 w - - 0 1";
        assert_eq!(terms(fen, Color::White).pawn_rams, -6);
        assert_eq!(terms(fen, Color::Black).pawn_rams, 0);

        // Rammed in the middle of the board: both sides pay
        let fen = "4k3/8/8/4p3/4P3/8/8/4K3 w - - 0 1";
        assert_eq!(terms(fen, Color::White).pawn_rams, -6);
        assert_eq!(terms(fen, Color::Black).pawn_rams, -6);
    }

    #[test]
    fn test_rook_placement() {
        let open = terms("4k3/8/8/8/8/8/8/R3K3 w - - 0 1", Color::White);
        assert_eq!(open.rooks, 20);

        let semi_open = terms("4k3/p7/8/8/8/8/8/R3K3 w - - 0 1", Color::White);
        assert_eq!(semi_open.rooks, tune::rook_semi_open_file_bonus!().taper(2));

        let closed = terms("4k3/8/8/8/8/8/P7/R3K3 w - - 0 1", Color::White);
        assert_eq!(closed.rooks, 0);

        let seventh = terms("4k3/R7/8/8/8/8/8/4K3 w - - 0 1", Color::White);
        assert_eq!(seventh.rooks, 20 + tune::rook_on_seventh_bonus!().taper(2));
    }

    #[test]
    fn test_king_safety() {
        // Full shield on g1, and every nearby file has a White Pawn
        let fen = "4k3/8/8/8/8/8/5PPP/6K1 w - - 0 1";
        assert_eq!(terms(fen, Color::White).king_safety, 3 * 4);

        // No Pawns at all: three open files
        let fen = "6k1/8/8/8/8/8/8/6K1 w - - 0 1";
        assert_eq!(terms(fen, Color::White).king_safety, -3 * 12);

        // Only Black Pawns around the White King: three semi-open files
        let fen = "6k1/5ppp/8/8/8/8/8/6K1 w - - 0 1";
        assert_eq!(terms(fen, Color::White).king_safety, -3 * 6);
    }

    #[test]
    fn test_mobility() {
        // Knight on a1 reaches b3 and c2, worth 2 each, doubled for Knights
        let corner = terms("4k3/8/8/8/8/8/8/N3K3 w - - 0 1", Color::White);
        assert_eq!(corner.mobility, 8);

        let center = terms("4k3/8/8/8/3N4/8/8/4K3 w - - 0 1", Color::White);
        assert!(center.mobility > corner.mobility);

        // A Bishop hemmed in by its own Pawns goes nowhere
        let blocked = terms("4k3/8/8/8/8/8/PP6/B3K3 w - - 0 1", Color::White);
        assert_eq!(blocked.mobility, 0);
    }

    #[test]
    fn test_terms_sum_to_evaluation() {
        let position = Position::from_fen(FEN_KIWIPETE).unwrap();
        let white = EvalTerms::new(&position, Color::White).total();
        let black = EvalTerms::new(&position, Color::Black).total();
        let tempo = tune::tempo_bonus!().taper(game_phase(&position));

        assert_eq!(ClassicalEvaluator.evaluate(&position), Score::new(white - black + tempo));
        assert!(EvalBreakdown(&position).to_string().contains("King safety"));
    }
}
