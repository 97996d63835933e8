/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{fmt, str::FromStr};

use anyhow::{bail, Context, Result};

use super::{
    Color, Move, MoveList, Piece, PieceKind, Square, ZobristKey, DIAGONAL_DIRECTIONS,
    FEN_STARTPOS, KING_OFFSETS, KNIGHT_OFFSETS, NUM_CASTLING_RIGHTS, ORTHOGONAL_DIRECTIONS,
};

/// The castling rights of both players, stored as a 4-bit mask.
///
/// | Bit | Right |
/// |-----|-------|
/// | `1` | White short (`K`) |
/// | `2` | White long (`Q`) |
/// | `4` | Black short (`k`) |
/// | `8` | Black long (`q`) |
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Debug)]
pub struct CastlingRights(u8);

impl CastlingRights {
    /// Number of possible combinations of castling rights.
    pub const COUNT: usize = NUM_CASTLING_RIGHTS;

    pub const NONE: Self = Self(0);
    pub const WHITE_SHORT: Self = Self(1);
    pub const WHITE_LONG: Self = Self(2);
    pub const BLACK_SHORT: Self = Self(4);
    pub const BLACK_LONG: Self = Self(8);
    pub const ALL: Self = Self(15);

    /// The short (King-side) right of `color`.
    #[inline(always)]
    pub const fn short(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_SHORT,
            Color::Black => Self::BLACK_SHORT,
        }
    }

    /// The long (Queen-side) right of `color`.
    #[inline(always)]
    pub const fn long(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_LONG,
            Color::Black => Self::BLACK_LONG,
        }
    }

    /// Index of this combination, `0..16`.
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    /// Returns `true` if every right in `rights` is held.
    #[inline(always)]
    pub const fn has(&self, rights: Self) -> bool {
        self.0 & rights.0 == rights.0 && rights.0 != 0
    }

    /// Revokes every right in `rights`.
    #[inline(always)]
    pub fn remove(&mut self, rights: Self) {
        self.0 &= !rights.0;
    }

    /// Rights lost when a piece leaves or arrives on `square`.
    ///
    /// Moving a King or a Rook off its home square, or capturing a Rook on its home square,
    /// revokes the corresponding rights.
    #[inline(always)]
    const fn revoked_by(square: Square) -> Self {
        match square.index() {
            0 => Self::WHITE_LONG,
            4 => Self(Self::WHITE_SHORT.0 | Self::WHITE_LONG.0),
            7 => Self::WHITE_SHORT,
            56 => Self::BLACK_LONG,
            60 => Self(Self::BLACK_SHORT.0 | Self::BLACK_LONG.0),
            63 => Self::BLACK_SHORT,
            _ => Self::NONE,
        }
    }

    /// Parses the castling field of a FEN string (`KQkq`, `Kq`, `-`, ...).
    ///
    /// # Example
    /// ```
    /// # use hopper::CastlingRights;
    /// let rights = CastlingRights::from_uci("Kq").unwrap();
    /// assert!(rights.has(CastlingRights::WHITE_SHORT));
    /// assert!(rights.has(CastlingRights::BLACK_LONG));
    /// assert!(!rights.has(CastlingRights::WHITE_LONG));
    /// assert_eq!(rights.to_string(), "Kq");
    /// ```
    pub fn from_uci(castling: &str) -> Result<Self> {
        if castling == "-" {
            return Ok(Self::NONE);
        }

        let mut rights = Self::NONE;
        for c in castling.chars() {
            let right = match c {
                'K' => Self::WHITE_SHORT,
                'Q' => Self::WHITE_LONG,
                'k' => Self::BLACK_SHORT,
                'q' => Self::BLACK_LONG,
                _ => bail!("Invalid castling rights {castling:?}: Must be '-' or a combination of [KQkq]. Got {c:?}."),
            };
            if rights.has(right) {
                bail!("Invalid castling rights {castling:?}: {c:?} appears more than once.");
            }
            rights.0 |= right.0;
        }

        if rights == Self::NONE {
            bail!("Invalid castling rights: Must not be empty.");
        }

        Ok(rights)
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "-");
        }

        for (right, c) in [
            (Self::WHITE_SHORT, 'K'),
            (Self::WHITE_LONG, 'Q'),
            (Self::BLACK_SHORT, 'k'),
            (Self::BLACK_LONG, 'q'),
        ] {
            if self.has(right) {
                write!(f, "{c}")?;
            }
        }

        Ok(())
    }
}

/// Everything needed to reverse a single call to [`Position::make_move`] or [`Position::make_null_move`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UndoRecord {
    /// The move that was made, or `None` for a null move.
    mv: Option<Move>,

    /// The piece that was removed from the board, and where it stood.
    ///
    /// For en passant, the square differs from the move's destination.
    captured: Option<(Piece, Square)>,

    /// Source and destination of the Rook when castling.
    rook_move: Option<(Square, Square)>,

    castling_rights: CastlingRights,
    ep_square: Option<Square>,
    halfmove: usize,
    key: ZobristKey,
}

impl UndoRecord {
    /// The move this record reverses, or `None` for a null move.
    #[inline(always)]
    pub const fn mv(&self) -> Option<Move> {
        self.mv
    }

    /// The piece captured by this record's move, if any.
    #[inline(always)]
    pub fn captured(&self) -> Option<Piece> {
        self.captured.map(|(piece, _)| piece)
    }
}

/// A chess position on an `8x8` mailbox board, with reversible move application.
///
/// The [`ZobristKey`] is updated incrementally by every mutating method,
/// and always equals [`ZobristKey::new`] of the current state.
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    board: [Option<Piece>; Square::COUNT],
    side_to_move: Color,
    castling_rights: CastlingRights,

    /// Square a pawn skipped over with a double push on the previous move.
    ep_square: Option<Square>,

    /// Plies since the last capture or pawn move. Used for the fifty-move rule.
    halfmove: usize,

    /// Starts at 1 and is incremented after Black moves.
    fullmove: usize,

    key: ZobristKey,

    /// Cached location of each King.
    kings: [Square; Color::COUNT],

    /// One record per move made since this position was created (or last committed).
    history: Vec<UndoRecord>,
}

impl Position {
    /// Creates a new [`Position`] from the provided FEN string.
    ///
    /// Missing trailing fields default to `w - - 0 1`.
    ///
    /// # Example
    /// ```
    /// # use hopper::*;
    /// let pos = Position::from_fen("4k3/8/8/8/8/8/8/4K2R").unwrap();
    /// assert_eq!(pos.to_fen(), "4k3/8/8/8/8/8/8/4K2R w - - 0 1");
    ///
    /// assert!(Position::from_fen("4k3/8/8/8/8/8/8/8 w - - 0 1").is_err()); // No White King
    /// ```
    pub fn from_fen(fen: &str) -> Result<Self> {
        let mut fields = fen.split_whitespace();

        let placements = fields
            .next()
            .context("FEN string must have piece placements.")?;
        let board = Self::parse_placements(placements)?;

        let side_to_move = match fields.next() {
            Some(color) if color.len() == 1 => Color::from_uci(color.chars().next().unwrap_or('?'))?,
            Some(color) => bail!("FEN side to move must be 'w' or 'b'. Got {color:?}."),
            None => Color::White,
        };

        let castling_rights = CastlingRights::from_uci(fields.next().unwrap_or("-"))?;

        let ep_square = match fields.next().unwrap_or("-") {
            "-" => None,
            square => Some(Square::from_uci(square)?),
        };

        let halfmove = fields.next().unwrap_or("0");
        let halfmove = halfmove.parse::<usize>().with_context(|| {
            format!("FEN string must have valid halfmove counter. Got {halfmove:?}")
        })?;

        let fullmove = fields.next().unwrap_or("1");
        let fullmove = fullmove.parse::<usize>().with_context(|| {
            format!("FEN string must have valid fullmove counter. Got {fullmove:?}")
        })?;

        if let Some(extra) = fields.next() {
            bail!("FEN string has unexpected trailing field {extra:?}.");
        }

        let mut kings = [None; Color::COUNT];
        for square in Square::iter() {
            if let Some(piece) = board[square.index()] {
                if piece.kind() == PieceKind::King {
                    if kings[piece.color().index()].is_some() {
                        bail!("FEN must have exactly one {} King.", piece.color().name());
                    }
                    kings[piece.color().index()] = Some(square);
                }
            }
        }
        let [Some(white_king), Some(black_king)] = kings else {
            bail!("FEN must have exactly one King of each color.");
        };

        Self::validate_material(&board)?;
        if let Some(ep_square) = ep_square {
            Self::validate_ep_square(&board, side_to_move, ep_square)?;
        }

        let mut pos = Self {
            board,
            side_to_move,
            castling_rights,
            ep_square,
            halfmove,
            fullmove,
            key: ZobristKey::default(),
            kings: [white_king, black_king],
            history: Vec::with_capacity(128),
        };
        pos.key = ZobristKey::new(&pos);

        if pos.is_square_attacked(pos.king_square(side_to_move.opponent()), side_to_move) {
            bail!(
                "FEN is illegal: {} is to move, but the {} King is already in check.",
                side_to_move.name(),
                side_to_move.opponent().name()
            );
        }

        Ok(pos)
    }

    /// Rejects piece counts that no game of chess can reach.
    ///
    /// Move lists are sized for reachable positions, so a board with, say, a dozen Queens must never be searched.
    fn validate_material(board: &[Option<Piece>; Square::COUNT]) -> Result<()> {
        let mut counts = [[0usize; PieceKind::COUNT]; Color::COUNT];
        for (index, piece) in board.iter().enumerate() {
            let Some(piece) = piece else {
                continue;
            };

            let rank = index / 8;
            if piece.kind() == PieceKind::Pawn && (rank == 0 || rank == 7) {
                bail!("FEN has a {} Pawn on its first or last rank.", piece.color().name());
            }
            counts[piece.color().index()][piece.kind().index()] += 1;
        }

        for color in Color::all() {
            let count = |kind: PieceKind| counts[color.index()][kind.index()];
            let pawns = count(PieceKind::Pawn);

            // Every piece beyond the starting set must have been a Pawn once
            let promoted = count(PieceKind::Knight).saturating_sub(2)
                + count(PieceKind::Bishop).saturating_sub(2)
                + count(PieceKind::Rook).saturating_sub(2)
                + count(PieceKind::Queen).saturating_sub(1);

            if pawns + promoted > 8 {
                bail!(
                    "FEN has too many {} pieces: {pawns} Pawns and {promoted} promoted pieces.",
                    color.name()
                );
            }
        }

        Ok(())
    }

    /// Rejects an en passant square that no double push could have left behind.
    ///
    /// The square must sit behind an enemy Pawn that just moved two squares, so it and the square the Pawn
    /// came from are both empty.
    fn validate_ep_square(
        board: &[Option<Piece>; Square::COUNT],
        side_to_move: Color,
        ep_square: Square,
    ) -> Result<()> {
        let (ep_rank, pawn_rank, origin_rank) = match side_to_move {
            Color::White => (5, 4, 6),
            Color::Black => (2, 3, 1),
        };
        let file = ep_square.file();
        let pusher = Piece::new(side_to_move.opponent(), PieceKind::Pawn);

        if ep_square.rank() != ep_rank {
            bail!(
                "FEN en passant square must be on rank {} when {} is to move. Got {ep_square}.",
                ep_rank + 1,
                side_to_move.name()
            );
        }
        if board[Square::new(file, pawn_rank).index()] != Some(pusher) {
            bail!("FEN en passant square {ep_square} has no {} Pawn in front of it.", pusher.color().name());
        }
        if board[ep_square.index()].is_some() || board[Square::new(file, origin_rank).index()].is_some() {
            bail!("FEN en passant square {ep_square} is not behind a Pawn that just moved two squares.");
        }

        Ok(())
    }

    /// Parses the first field of a FEN string.
    fn parse_placements(placements: &str) -> Result<[Option<Piece>; Square::COUNT]> {
        let mut board = [None; Square::COUNT];

        let ranks = placements.split('/').collect::<Vec<_>>();
        if ranks.len() != 8 {
            bail!(
                "FEN must have piece placements for all 8 ranks. Got {}.",
                ranks.len()
            );
        }

        // FEN lists rank 8 first
        for (rank, row) in ranks.iter().rev().enumerate() {
            let mut file = 0;

            for c in row.chars() {
                if let Some(empty) = c.to_digit(10) {
                    if !(1..=8).contains(&empty) {
                        bail!("FEN placements may only skip 1 to 8 squares. Got {c:?}.");
                    }
                    file += empty as u8;
                } else {
                    let piece = Piece::from_uci(c)?;
                    if file >= 8 {
                        bail!("FEN rank {row:?} describes more than 8 squares.");
                    }
                    board[Square::new(file, rank as u8).index()] = Some(piece);
                    file += 1;
                }
            }

            if file != 8 {
                bail!("FEN rank {row:?} must describe exactly 8 squares. Got {file}.");
            }
        }

        Ok(board)
    }

    /// Serializes this position to a FEN string.
    pub fn to_fen(&self) -> String {
        self.to_string()
    }

    /// The piece on `square`, if any.
    #[inline(always)]
    pub const fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board[square.index()]
    }

    /// The mailbox, indexed by [`Square::index`].
    #[inline(always)]
    pub const fn board(&self) -> &[Option<Piece>; Square::COUNT] {
        &self.board
    }

    /// Every occupied square and the piece on it, from `A1` to `H8`.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::iter().filter_map(|square| self.piece_at(square).map(|piece| (square, piece)))
    }

    #[inline(always)]
    pub const fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline(always)]
    pub const fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline(always)]
    pub const fn ep_square(&self) -> Option<Square> {
        self.ep_square
    }

    #[inline(always)]
    pub const fn halfmove(&self) -> usize {
        self.halfmove
    }

    #[inline(always)]
    pub const fn fullmove(&self) -> usize {
        self.fullmove
    }

    /// The incrementally-maintained Zobrist key of this position.
    #[inline(always)]
    pub const fn key(&self) -> ZobristKey {
        self.key
    }

    /// Location of `color`'s King.
    #[inline(always)]
    pub const fn king_square(&self, color: Color) -> Square {
        self.kings[color.index()]
    }

    /// Number of moves (including null moves) that can currently be undone.
    #[inline(always)]
    pub fn num_undoable(&self) -> usize {
        self.history.len()
    }

    /// The most recent [`UndoRecord`], if any.
    #[inline(always)]
    pub fn last_record(&self) -> Option<&UndoRecord> {
        self.history.last()
    }

    /// Returns `true` if the previous move was a null move.
    #[inline(always)]
    pub fn last_move_was_null(&self) -> bool {
        self.history.last().is_some_and(|record| record.mv.is_none())
    }

    /// Forgets every [`UndoRecord`], making all moves made so far permanent.
    #[inline(always)]
    pub fn commit(&mut self) {
        self.history.clear();
    }

    /// Total centipawn value of `color`'s Knights, Bishops, Rooks, and Queens.
    pub fn non_pawn_material(&self, color: Color) -> i32 {
        self.pieces()
            .filter(|(_, piece)| {
                piece.color() == color
                    && !matches!(piece.kind(), PieceKind::Pawn | PieceKind::King)
            })
            .map(|(_, piece)| piece.value())
            .sum()
    }

    /// Kind of the piece `mv` would capture, including en passant.
    pub fn captured_kind(&self, mv: Move) -> Option<PieceKind> {
        if let Some(victim) = self.piece_at(mv.to()) {
            return Some(victim.kind());
        }

        self.is_en_passant(mv).then_some(PieceKind::Pawn)
    }

    /// Returns `true` if `mv` is a pawn capturing en passant.
    #[inline(always)]
    pub fn is_en_passant(&self, mv: Move) -> bool {
        Some(mv.to()) == self.ep_square
            && mv.from().file() != mv.to().file()
            && self
                .piece_at(mv.from())
                .is_some_and(|piece| piece.kind() == PieceKind::Pawn)
    }

    /// Returns `true` if `mv` captures a piece (including en passant).
    #[inline(always)]
    pub fn is_capture(&self, mv: Move) -> bool {
        self.captured_kind(mv).is_some()
    }

    /// Returns `true` if `mv` neither captures nor promotes.
    #[inline(always)]
    pub fn is_quiet(&self, mv: Move) -> bool {
        !mv.is_promotion() && !self.is_capture(mv)
    }

    /*************************************************************************************
     * Attack detection
     *************************************************************************************/

    /// Returns `true` if any piece of color `by` attacks `square`.
    ///
    /// # Example
    /// ```
    /// # use hopper::*;
    /// let pos = Position::default();
    /// assert!(pos.is_square_attacked("f3".parse().unwrap(), Color::White));
    /// assert!(!pos.is_square_attacked("e4".parse().unwrap(), Color::White));
    /// assert!(pos.is_square_attacked("f6".parse().unwrap(), Color::Black));
    /// ```
    pub fn is_square_attacked(&self, square: Square, by: Color) -> bool {
        let is = |sq: Option<Square>, kind: PieceKind| {
            sq.and_then(|sq| self.piece_at(sq))
                .is_some_and(|piece| piece.is(by, kind))
        };

        // Pawns attack diagonally forward, so look diagonally backward from `square`
        let behind = -by.forward();
        if is(square.offset(-1, behind), PieceKind::Pawn)
            || is(square.offset(1, behind), PieceKind::Pawn)
        {
            return true;
        }

        if KNIGHT_OFFSETS
            .iter()
            .any(|&(df, dr)| is(square.offset(df, dr), PieceKind::Knight))
        {
            return true;
        }

        if KING_OFFSETS
            .iter()
            .any(|&(df, dr)| is(square.offset(df, dr), PieceKind::King))
        {
            return true;
        }

        self.is_attacked_along(square, by, &DIAGONAL_DIRECTIONS, PieceKind::Bishop)
            || self.is_attacked_along(square, by, &ORTHOGONAL_DIRECTIONS, PieceKind::Rook)
    }

    /// Casts rays from `square`; the first piece on each ray decides whether it is a `slider` (or Queen) of color `by`.
    fn is_attacked_along(
        &self,
        square: Square,
        by: Color,
        directions: &[(i8, i8)],
        slider: PieceKind,
    ) -> bool {
        directions.iter().any(|&(df, dr)| {
            let mut current = square;
            while let Some(next) = current.offset(df, dr) {
                if let Some(piece) = self.piece_at(next) {
                    return piece.color() == by
                        && (piece.kind() == slider || piece.kind() == PieceKind::Queen);
                }
                current = next;
            }
            false
        })
    }

    /// Returns `true` if the side to move is in check.
    #[inline(always)]
    pub fn is_in_check(&self) -> bool {
        let color = self.side_to_move;
        self.is_square_attacked(self.king_square(color), color.opponent())
    }

    /// Returns `true` if the side that just moved left its own King attacked.
    ///
    /// After [`Position::make_move`] with a pseudo-legal move, this decides whether that move was illegal.
    #[inline(always)]
    pub fn king_left_in_check(&self) -> bool {
        let mover = self.side_to_move.opponent();
        self.is_square_attacked(self.king_square(mover), self.side_to_move)
    }

    /// Returns `true` if the side to move is in check and has no legal moves.
    pub fn is_checkmate(&self) -> bool {
        self.is_in_check() && self.legal_moves().is_empty()
    }

    /// Returns `true` if the side to move is not in check and has no legal moves.
    pub fn is_stalemate(&self) -> bool {
        !self.is_in_check() && self.legal_moves().is_empty()
    }

    /*************************************************************************************
     * Move generation
     *************************************************************************************/

    /// All pseudo-legal moves for the side to move.
    ///
    /// Pseudo-legal moves obey how pieces move, but may leave the mover's King in check.
    #[inline(always)]
    pub fn pseudo_legal_moves(&self) -> MoveList {
        self.generate_pseudo_legal(self.side_to_move)
    }

    /// Pseudo-legal captures, promotions, and en passant captures for the side to move.
    #[inline(always)]
    pub fn pseudo_legal_tactical_moves(&self) -> MoveList {
        let mut moves = MoveList::new();
        self.generate(self.side_to_move, true, &mut moves);
        moves
    }

    /// All pseudo-legal moves for `color`.
    #[inline(always)]
    pub fn generate_pseudo_legal(&self, color: Color) -> MoveList {
        let mut moves = MoveList::new();
        self.generate(color, false, &mut moves);
        moves
    }

    /// All legal moves for the side to move.
    ///
    /// Each pseudo-legal move is made on a scratch copy, kept if the mover's King is not attacked, and undone.
    ///
    /// # Example
    /// ```
    /// # use hopper::*;
    /// assert_eq!(Position::default().legal_moves().len(), 20);
    ///
    /// let kiwipete = Position::from_fen(FEN_KIWIPETE).unwrap();
    /// assert_eq!(kiwipete.legal_moves().len(), 48);
    /// ```
    pub fn legal_moves(&self) -> MoveList {
        let mut scratch = self.scratch();
        let mut legal = MoveList::new();

        for mv in self.pseudo_legal_moves() {
            scratch.make_move(mv);
            if !scratch.king_left_in_check() {
                legal.push(mv);
            }
            scratch.unmake();
        }

        legal
    }

    /// Returns `true` if `mv` is a legal move in this position.
    pub fn is_legal(&self, mv: Move) -> bool {
        if !self.pseudo_legal_moves().contains(&mv) {
            return false;
        }

        let mut scratch = self.scratch();
        scratch.make_move(mv);
        !scratch.king_left_in_check()
    }

    /// A copy of this position without any [`UndoRecord`]s.
    #[inline(always)]
    fn scratch(&self) -> Self {
        Self {
            history: Vec::with_capacity(1),
            ..*self
        }
    }

    fn generate(&self, color: Color, tactical_only: bool, moves: &mut MoveList) {
        for square in Square::iter() {
            let Some(piece) = self.piece_at(square) else {
                continue;
            };
            if piece.color() != color {
                continue;
            }

            match piece.kind() {
                PieceKind::Pawn => self.generate_pawn_moves(square, color, tactical_only, moves),
                PieceKind::Knight => {
                    self.generate_stepper_moves(square, color, &KNIGHT_OFFSETS, tactical_only, moves)
                }
                PieceKind::Bishop => {
                    self.generate_slider_moves(square, color, &DIAGONAL_DIRECTIONS, tactical_only, moves)
                }
                PieceKind::Rook => {
                    self.generate_slider_moves(square, color, &ORTHOGONAL_DIRECTIONS, tactical_only, moves)
                }
                PieceKind::Queen => {
                    self.generate_slider_moves(square, color, &DIAGONAL_DIRECTIONS, tactical_only, moves);
                    self.generate_slider_moves(square, color, &ORTHOGONAL_DIRECTIONS, tactical_only, moves);
                }
                PieceKind::King => {
                    self.generate_stepper_moves(square, color, &KING_OFFSETS, tactical_only, moves);
                    if !tactical_only {
                        self.generate_castling_moves(square, color, moves);
                    }
                }
            }
        }
    }

    fn generate_pawn_moves(
        &self,
        from: Square,
        color: Color,
        tactical_only: bool,
        moves: &mut MoveList,
    ) {
        let forward = color.forward();

        let push = |to: Square, moves: &mut MoveList| {
            if to.rank() == color.promotion_rank() {
                for promotion in PieceKind::PROMOTIONS {
                    moves.push(Move::new_promotion(from, to, promotion));
                }
            } else {
                moves.push(Move::new(from, to));
            }
        };

        // Pushes
        if let Some(one) = from.offset(0, forward) {
            if self.piece_at(one).is_none() {
                if one.rank() == color.promotion_rank() {
                    push(one, moves);
                } else if !tactical_only {
                    push(one, moves);

                    if from.rank() == color.pawn_rank() {
                        if let Some(two) = one.offset(0, forward) {
                            if self.piece_at(two).is_none() {
                                push(two, moves);
                            }
                        }
                    }
                }
            }
        }

        // Captures, including en passant
        for df in [-1, 1] {
            let Some(to) = from.offset(df, forward) else {
                continue;
            };

            match self.piece_at(to) {
                Some(victim) if victim.color() != color => push(to, moves),
                None if Some(to) == self.ep_square && color == self.side_to_move => {
                    moves.push(Move::new(from, to))
                }
                _ => {}
            }
        }
    }

    fn generate_stepper_moves(
        &self,
        from: Square,
        color: Color,
        offsets: &[(i8, i8)],
        tactical_only: bool,
        moves: &mut MoveList,
    ) {
        for &(df, dr) in offsets {
            let Some(to) = from.offset(df, dr) else {
                continue;
            };

            match self.piece_at(to) {
                Some(occupant) if occupant.color() != color => moves.push(Move::new(from, to)),
                None if !tactical_only => moves.push(Move::new(from, to)),
                _ => {}
            }
        }
    }

    fn generate_slider_moves(
        &self,
        from: Square,
        color: Color,
        directions: &[(i8, i8)],
        tactical_only: bool,
        moves: &mut MoveList,
    ) {
        for &(df, dr) in directions {
            let mut current = from;
            while let Some(to) = current.offset(df, dr) {
                match self.piece_at(to) {
                    None => {
                        if !tactical_only {
                            moves.push(Move::new(from, to));
                        }
                    }
                    Some(occupant) => {
                        if occupant.color() != color {
                            moves.push(Move::new(from, to));
                        }
                        break;
                    }
                }
                current = to;
            }
        }
    }

    fn generate_castling_moves(&self, king: Square, color: Color, moves: &mut MoveList) {
        let home = Square::E1.relative_to(color);
        if king != home {
            return;
        }

        let opponent = color.opponent();
        let rank = color.back_rank();
        let rook = Piece::new(color, PieceKind::Rook);
        let empty = |files: &[u8]| {
            files
                .iter()
                .all(|&file| self.piece_at(Square::new(file, rank)).is_none())
        };
        let safe = |files: &[u8]| {
            files
                .iter()
                .all(|&file| !self.is_square_attacked(Square::new(file, rank), opponent))
        };

        let can_short = self.castling_rights.has(CastlingRights::short(color))
            && self.piece_at(Square::new(7, rank)) == Some(rook)
            && empty(&[5, 6]);
        let can_long = self.castling_rights.has(CastlingRights::long(color))
            && self.piece_at(Square::new(0, rank)) == Some(rook)
            && empty(&[1, 2, 3]);

        if !(can_short || can_long) || self.is_square_attacked(king, opponent) {
            return;
        }

        if can_short && safe(&[5, 6]) {
            moves.push(Move::new_castle(king, Square::new(6, rank)));
        }
        if can_long && safe(&[2, 3]) {
            moves.push(Move::new_castle(king, Square::new(2, rank)));
        }
    }

    /*************************************************************************************
     * Making and unmaking moves
     *************************************************************************************/

    /// Sets the contents of `square` without touching the key.
    #[inline(always)]
    fn set(&mut self, square: Square, piece: Option<Piece>) {
        if let Some(piece) = piece {
            if piece.kind() == PieceKind::King {
                self.kings[piece.color().index()] = square;
            }
        }
        self.board[square.index()] = piece;
    }

    /// Puts `piece` on the (empty) `square`, hashing it in.
    #[inline(always)]
    fn place(&mut self, piece: Piece, square: Square) {
        self.key.hash_piece(square, piece);
        self.set(square, Some(piece));
    }

    /// Removes and returns the piece on `square`, hashing it out.
    #[inline(always)]
    fn take(&mut self, square: Square) -> Option<Piece> {
        let piece = self.board[square.index()].take();
        if let Some(piece) = piece {
            self.key.hash_piece(square, piece);
        }
        piece
    }

    /// Applies `mv`, which must be pseudo-legal in this position, and pushes an [`UndoRecord`].
    ///
    /// Legality is not checked; use [`Position::king_left_in_check`] afterwards to detect a move that exposed the King.
    ///
    /// # Panics
    /// If there is no piece on the move's source square.
    ///
    /// # Example
    /// ```
    /// # use hopper::*;
    /// let mut pos = Position::default();
    /// let e2e4 = Move::from_uci(&pos, "e2e4").unwrap();
    /// pos.make_move(e2e4);
    /// assert_eq!(pos.to_fen(), "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1");
    ///
    /// pos.undo_move().unwrap();
    /// assert_eq!(pos.to_fen(), FEN_STARTPOS);
    /// ```
    pub fn make_move(&mut self, mv: Move) {
        let (from, to) = (mv.from(), mv.to());
        let color = self.side_to_move;

        let mut record = UndoRecord {
            mv: Some(mv),
            captured: None,
            rook_move: None,
            castling_rights: self.castling_rights,
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            key: self.key,
        };
        let is_en_passant = self.is_en_passant(mv);

        let Some(piece) = self.take(from) else {
            panic!("Attempted to make move {mv} from empty square in position {self}");
        };

        // Captures
        let victim_square = if is_en_passant {
            Square::new(to.file(), from.rank())
        } else {
            to
        };
        if let Some(victim) = self.take(victim_square) {
            record.captured = Some((victim, victim_square));
        }

        // Movement, with promotion
        let landed = match mv.promotion() {
            Some(promotion) => Piece::new(color, promotion),
            None => piece,
        };
        self.place(landed, to);

        // Castling moves the Rook too
        if mv.is_castle() {
            let rank = color.back_rank();
            let (rook_from, rook_to) = if to.file() == 6 {
                (Square::new(7, rank), Square::new(5, rank))
            } else {
                (Square::new(0, rank), Square::new(3, rank))
            };

            if let Some(rook) = self.take(rook_from) {
                self.place(rook, rook_to);
                record.rook_move = Some((rook_from, rook_to));
            }
        }

        // Castling rights
        let mut rights = self.castling_rights;
        rights.remove(CastlingRights::revoked_by(from));
        rights.remove(CastlingRights::revoked_by(to));
        if rights != self.castling_rights {
            self.key.hash_castling_rights(self.castling_rights);
            self.key.hash_castling_rights(rights);
            self.castling_rights = rights;
        }

        // En passant target
        self.key.hash_optional_ep_square(self.ep_square);
        self.ep_square = None;
        if piece.kind() == PieceKind::Pawn && from.rank().abs_diff(to.rank()) == 2 {
            self.ep_square = from.offset(0, color.forward());
            self.key.hash_optional_ep_square(self.ep_square);
        }

        // Clocks
        if piece.kind() == PieceKind::Pawn || record.captured.is_some() {
            self.halfmove = 0;
        } else {
            self.halfmove += 1;
        }
        if color.is_black() {
            self.fullmove += 1;
        }

        self.side_to_move = color.opponent();
        self.key.hash_side_to_move();

        self.history.push(record);

        debug_assert_eq!(
            self.key,
            ZobristKey::new(self),
            "Incremental key diverged after {mv}"
        );
    }

    /// Reverses the most recent [`Position::make_move`], returning the move that was undone.
    ///
    /// Fails without changing anything if there is nothing to undo, or if the last move was a null move.
    pub fn undo_move(&mut self) -> Result<Move> {
        let Some(record) = self.history.last() else {
            bail!("There are no moves to undo.");
        };
        let Some(mv) = record.mv else {
            bail!("The last move was a null move. Use `undo_null_move` instead.");
        };

        self.unmake();
        Ok(mv)
    }

    /// Passes the turn to the opponent without moving a piece.
    ///
    /// Used by [null move pruning](https://www.chessprogramming.org/Null_Move_Pruning).
    pub fn make_null_move(&mut self) {
        self.history.push(UndoRecord {
            mv: None,
            captured: None,
            rook_move: None,
            castling_rights: self.castling_rights,
            ep_square: self.ep_square,
            halfmove: self.halfmove,
            key: self.key,
        });

        self.key.hash_optional_ep_square(self.ep_square.take());
        self.halfmove += 1;
        if self.side_to_move.is_black() {
            self.fullmove += 1;
        }
        self.side_to_move = self.side_to_move.opponent();
        self.key.hash_side_to_move();
    }

    /// Reverses the most recent [`Position::make_null_move`].
    pub fn undo_null_move(&mut self) -> Result<()> {
        match self.history.last() {
            Some(record) if record.mv.is_none() => {
                self.unmake();
                Ok(())
            }
            Some(_) => bail!("The last move was not a null move. Use `undo_move` instead."),
            None => bail!("There are no moves to undo."),
        }
    }

    /// Pops the top [`UndoRecord`] (if any) and reverses every change it describes.
    pub(crate) fn unmake(&mut self) {
        let Some(record) = self.history.pop() else {
            return;
        };

        let mover = self.side_to_move.opponent();

        if let Some(mv) = record.mv {
            if let Some((rook_from, rook_to)) = record.rook_move {
                let rook = self.board[rook_to.index()].take();
                self.set(rook_from, rook);
            }

            let landed = self.board[mv.to().index()].take();
            let original = match (mv.promotion(), landed) {
                (Some(_), Some(_)) => Some(Piece::new(mover, PieceKind::Pawn)),
                _ => landed,
            };
            self.set(mv.from(), original);

            if let Some((victim, square)) = record.captured {
                self.set(square, Some(victim));
            }
        }

        if mover.is_black() {
            self.fullmove -= 1;
        }
        self.side_to_move = mover;
        self.castling_rights = record.castling_rights;
        self.ep_square = record.ep_square;
        self.halfmove = record.halfmove;
        self.key = record.key;
    }
}

impl FromStr for Position {
    type Err = anyhow::Error;

    #[inline(always)]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_fen(s)
    }
}

impl Default for Position {
    #[inline(always)]
    fn default() -> Self {
        match Self::from_fen(FEN_STARTPOS) {
            Ok(pos) => pos,
            Err(e) => unreachable!("The starting position FEN is always valid: {e}"),
        }
    }
}

impl fmt::Display for Position {
    /// Displays this position's FEN string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.piece_at(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty > 0 {
                            write!(f, "{empty}")?;
                            empty = 0;
                        }
                        write!(f, "{piece}")?;
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                write!(f, "{empty}")?;
            }
            if rank > 0 {
                write!(f, "/")?;
            }
        }

        let ep = self
            .ep_square
            .map(|square| square.to_string())
            .unwrap_or(String::from("-"));

        write!(
            f,
            " {} {} {ep} {} {}",
            self.side_to_move, self.castling_rights, self.halfmove, self.fullmove
        )
    }
}

impl fmt::Debug for Position {
    /// Draws the board with White at the bottom, alongside the state that isn't visible on the board.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8u8).rev() {
            write!(f, "{}|", rank + 1)?;
            for file in 0..8 {
                let c = self
                    .piece_at(Square::new(file, rank))
                    .map(|piece| piece.to_uci())
                    .unwrap_or('.');
                write!(f, " {c}")?;
            }

            match rank {
                6 => write!(f, "           FEN: {self}")?,
                5 => write!(f, "          Side: {}", self.side_to_move.name())?,
                4 => write!(f, "      Castling: {}", self.castling_rights)?,
                3 => {
                    let ep = self.ep_square.map(|sq| sq.to_uci()).unwrap_or("-".into());
                    write!(f, "            EP: {ep}")?
                }
                2 => write!(f, "     Half-move: {}", self.halfmove)?,
                1 => write!(f, "     Full-move: {}", self.fullmove)?,
                0 => write!(f, "           Key: {}", self.key)?,
                _ => {}
            }
            writeln!(f)?;
        }

        write!(f, " +----------------\n   a b c d e f g h")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FEN_KIWIPETE, MAX_NUM_MOVES};

    fn play(pos: &mut Position, moves: &[&str]) {
        for uci in moves {
            let mv = Move::from_uci(pos, uci).unwrap();
            pos.make_move(mv);
        }
    }

    #[test]
    fn test_fen_round_trip() {
        let fens = [
            FEN_STARTPOS,
            FEN_KIWIPETE,
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
            "rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3",
            "4k3/8/8/8/8/8/8/4K3 b - - 37 90",
        ];

        for fen in fens {
            let pos = Position::from_fen(fen).unwrap();
            assert_eq!(pos.to_fen(), fen);
        }
    }

    #[test]
    fn test_malformed_fens_are_rejected() {
        let bad = [
            "",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP w KQkq - 0 1",
            "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQxq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1 extra",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQQBNR w KQkq - 0 1",
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBKKBNR w KQkq - 0 1",
            // En passant squares no double push could have left
            "4k3/8/8/8/8/8/RP6/4K3 w - a3 0 1",
            "4k3/8/8/8/8/8/RP6/4K3 b - a3 0 1",
            "4k3/8/8/8/8/8/8/4K3 w - e6 0 1",
            "4k3/8/4p3/8/8/8/8/4K3 w - e6 0 1",
            "4k3/8/8/3pP3/8/8/8/4K3 w - e6 0 1",
            "4k3/8/4n3/4p3/8/8/8/4K3 w - e6 0 1",
            "4k3/8/8/8/4P3/8/8/4K3 w - e3 0 1",
            // Impossible material
            "3Q4/1Q4Q1/4Q3/2Q4Q/Q4Q2/3Q4/1Q4Q1/k3Q2K w - - 0 1",
            "4k3/pppppppp/p7/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/8/P3K3 w - - 0 1",
            "p3k3/8/8/8/8/8/8/4K3 w - - 0 1",
            "4k3/8/8/8/8/8/PPPPPPPP/NNN1K3 w - - 0 1",
            // The side that just moved left its King in check
            "4k3/8/8/8/8/8/8/4K2r b - - 0 1",
        ];

        for fen in bad {
            assert!(Position::from_fen(fen).is_err(), "{fen:?} should not parse");
        }
    }

    #[test]
    fn test_make_undo_restores_everything() {
        let mut pos = Position::from_fen(FEN_KIWIPETE).unwrap();
        let original = pos.clone();

        for mv in original.pseudo_legal_moves() {
            pos.make_move(mv);
            assert_eq!(pos.key(), ZobristKey::new(&pos), "key mismatch after {mv}");
            assert_eq!(pos.undo_move().unwrap(), mv);
            assert_eq!(pos, original, "state mismatch after undoing {mv}");
        }
    }

    #[test]
    fn test_undo_on_empty_history_fails() {
        let mut pos = Position::default();
        assert!(pos.undo_move().is_err());
        assert!(pos.undo_null_move().is_err());
        assert_eq!(pos, Position::default());
    }

    #[test]
    fn test_incremental_key_matches_full_hash() {
        let mut pos = Position::default();
        play(
            &mut pos,
            &["e2e4", "d7d5", "e4d5", "c7c5", "d5c6", "b8c6", "g1f3", "g8f6", "f1b5", "e7e6", "e1g1"],
        );
        assert_eq!(pos.key(), ZobristKey::new(&pos));
        assert_eq!(pos.castling_rights(), CastlingRights::from_uci("kq").unwrap());
    }

    #[test]
    fn test_transposition_has_same_key() {
        let mut a = Position::default();
        let mut b = Position::default();
        play(&mut a, &["g1f3", "g8f6", "b1c3", "b8c6"]);
        play(&mut b, &["b1c3", "b8c6", "g1f3", "g8f6"]);
        assert_eq!(a.key(), b.key());
        assert_eq!(a.to_fen(), b.to_fen());
    }

    #[test]
    fn test_en_passant() {
        let mut pos =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .unwrap();
        let exf6 = Move::from_uci(&pos, "e5f6").unwrap();
        assert!(pos.is_en_passant(exf6));
        assert_eq!(pos.captured_kind(exf6), Some(PieceKind::Pawn));

        pos.make_move(exf6);
        assert_eq!(pos.piece_at("f5".parse().unwrap()), None);
        assert_eq!(pos.ep_square(), None);
        assert_eq!(pos.halfmove(), 0);

        pos.undo_move().unwrap();
        assert!(pos.piece_at("f5".parse().unwrap()).is_some());
        assert_eq!(pos.ep_square(), Some("f6".parse().unwrap()));
    }

    #[test]
    fn test_castling_rights_updates() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        // Rook captures rook: both lose the corresponding side
        play(&mut pos, &["a1a8"]);
        assert_eq!(pos.castling_rights().to_string(), "Kk");

        // King move loses both sides
        play(&mut pos, &["e8d7"]);
        assert_eq!(pos.castling_rights().to_string(), "K");
    }

    #[test]
    fn test_castling_moves_the_rook() {
        let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1").unwrap();
        play(&mut pos, &["e8c8"]);
        assert_eq!(pos.to_fen(), "2kr3r/8/8/8/8/8/8/R3K2R w KQ - 1 2");

        pos.undo_move().unwrap();
        assert_eq!(pos.to_fen(), "r3k2r/8/8/8/8/8/8/R3K2R b KQkq - 0 1");
    }

    #[test]
    fn test_castling_through_check_is_illegal() {
        // Black rook on f8 covers f1
        let pos = Position::from_fen("5rk1/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let moves = pos.legal_moves();
        assert!(!moves.iter().any(|mv| *mv == "e1g1"));
        assert!(moves.iter().any(|mv| *mv == "e1c1"));
    }

    #[test]
    fn test_promotion_and_undo() {
        let mut pos = Position::from_fen("3q1n2/4P3/8/8/8/8/k7/7K w - - 0 1").unwrap();
        let promotions = pos
            .legal_moves()
            .into_iter()
            .filter(|mv| mv.is_promotion())
            .count();
        // e8 push (4) and captures on d8 and f8 (4 each)
        assert_eq!(promotions, 12);

        let original = pos.clone();
        play(&mut pos, &["e7d8n"]);
        assert_eq!(
            pos.piece_at("d8".parse().unwrap()),
            Some(Piece::new(Color::White, PieceKind::Knight))
        );
        pos.undo_move().unwrap();
        assert_eq!(pos, original);
    }

    #[test]
    fn test_null_move() {
        let mut pos =
            Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1")
                .unwrap();
        let original = pos.clone();

        pos.make_null_move();
        assert!(pos.last_move_was_null());
        assert_eq!(pos.side_to_move(), Color::White);
        assert_eq!(pos.ep_square(), None);
        assert_eq!(pos.key(), ZobristKey::new(&pos));
        assert!(pos.undo_move().is_err());

        pos.undo_null_move().unwrap();
        assert_eq!(pos, original);
    }

    #[test]
    fn test_checkmate_and_stalemate() {
        let mated = Position::from_fen("k7/1Q6/1K6/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(mated.is_in_check());
        assert!(mated.is_checkmate());
        assert!(!mated.is_stalemate());

        let stalemate = Position::from_fen("k7/8/KQ6/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(!stalemate.is_in_check());
        assert!(stalemate.is_stalemate());
        assert!(!stalemate.is_checkmate());
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        // The e2 knight is pinned by the e8 rook
        let pos = Position::from_fen("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        assert!(pos.legal_moves().iter().all(|mv| mv.from() != "e2".parse().unwrap()));
    }

    #[test]
    fn test_non_pawn_material() {
        let pos = Position::default();
        assert_eq!(pos.non_pawn_material(Color::White), 2 * 320 + 2 * 330 + 2 * 500 + 900);
        let bare = Position::from_fen("4k3/pppp4/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(bare.non_pawn_material(Color::Black), 0);
    }

    #[test]
    fn test_en_passant_square_must_follow_a_double_push() {
        // The a3 square sits behind White's own Pawn, so b2a3 would capture White's Rook
        assert!(Position::from_fen("4k3/8/8/8/8/8/RP6/4K3 w - a3 0 1").is_err());

        let mut pos = Position::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(pos.ep_square(), Some(Square::new(3, 5)));
        play(&mut pos, &["e5d6"]);
        assert_eq!(pos.to_fen(), "4k3/8/3P4/8/8/8/8/4K3 b - - 0 1");

        let black = Position::from_fen("4k3/8/8/8/3Pp3/8/8/4K3 b - d3 0 1").unwrap();
        assert!(black.legal_moves().iter().any(|mv| *mv == "e4d3"));
    }

    #[test]
    fn test_most_crowded_position_fits_in_a_move_list() {
        let pos = Position::from_fen("R6R/3Q4/1Q4Q1/4Q3/2Q4Q/Q4Q2/pp1Q4/kBNN1KB1 w - - 0 1").unwrap();
        assert_eq!(pos.legal_moves().len(), 218);
        assert!(pos.pseudo_legal_moves().len() <= MAX_NUM_MOVES);
    }
}
