/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use arrayvec::ArrayVec;

use crate::{
    Color, Move, Piece, PieceKind, Position, Score, Square, DIAGONAL_DIRECTIONS, KING_OFFSETS,
    KNIGHT_OFFSETS, ORTHOGONAL_DIRECTIONS,
};

/// A copy of the board that the exchange is played out on.
type Mailbox = [Option<Piece>; Square::COUNT];

/// [Static Exchange Evaluation](https://www.chessprogramming.org/Static_Exchange_Evaluation) of `mv`.
///
/// Plays out every capture on the destination square, each side always recapturing with its
/// least valuable attacker, and returns the material balance from the mover's perspective.
///
/// Non-captures score `0`, and capturing a King scores half of [`Score::MATE`].
///
/// # Example
/// ```
/// # use hopper::*;
/// // Queen takes a Knight defended by a pawn
/// let pos = Position::from_fen("k7/8/8/p7/1n6/8/Q7/K7 w - - 0 1").unwrap();
/// let mv = Move::from_uci(&pos, "a2b4").unwrap();
/// assert_eq!(see(&pos, mv), -580);
/// ```
pub fn see(position: &Position, mv: Move) -> i32 {
    let (from, to) = (mv.from(), mv.to());

    let Some(attacker) = position.piece_at(from) else {
        return 0;
    };
    let Some(victim) = position.captured_kind(mv) else {
        return 0;
    };
    if victim == PieceKind::King {
        return Score::MATE.inner() / 2;
    }

    let mut board: Mailbox = *position.board();

    // The first capture
    board[from.index()] = None;
    if position.is_en_passant(mv) {
        board[Square::new(to.file(), from.rank()).index()] = None;
    }
    board[to.index()] = Some(attacker);

    // `gains[i]` is the value of the piece captured by the i-th capture
    let mut gains = ArrayVec::<i32, 32>::new();
    gains.push(victim.value());

    let mut on_target = attacker;
    let mut side = attacker.color().opponent();

    while let Some(square) = least_valuable_attacker(&board, to, side) {
        if gains.is_full() {
            break;
        }

        gains.push(on_target.value());

        // The recapture; the attacker's departure may uncover x-rays behind it
        let Some(recapturer) = board[square.index()].take() else {
            break;
        };
        board[to.index()] = Some(recapturer);

        on_target = recapturer;
        side = side.opponent();
    }

    gains.iter().rev().fold(0, |next, &gain| gain - next)
}

/// Location of `color`'s cheapest piece attacking `target` on `board`.
///
/// Checked in order: pawns, knights, bishops and diagonal queens, rooks and straight queens, the King.
fn least_valuable_attacker(board: &Mailbox, target: Square, color: Color) -> Option<Square> {
    let is = |square: Option<Square>, kind: PieceKind| {
        square.filter(|sq| board[sq.index()].is_some_and(|piece| piece.is(color, kind)))
    };

    // Pawns
    let behind = -color.forward();
    if let Some(square) = [-1, 1]
        .into_iter()
        .find_map(|df| is(target.offset(df, behind), PieceKind::Pawn))
    {
        return Some(square);
    }

    // Knights
    if let Some(square) = KNIGHT_OFFSETS
        .iter()
        .find_map(|&(df, dr)| is(target.offset(df, dr), PieceKind::Knight))
    {
        return Some(square);
    }

    // Sliders, keeping the cheaper of the diagonal and straight candidates
    let diagonal = slider_attacker(board, target, color, &DIAGONAL_DIRECTIONS, PieceKind::Bishop);
    let straight = slider_attacker(board, target, color, &ORTHOGONAL_DIRECTIONS, PieceKind::Rook);
    let cheapest = [diagonal, straight]
        .into_iter()
        .flatten()
        .min_by_key(|&(_, kind)| kind.value());
    if let Some((square, _)) = cheapest {
        return Some(square);
    }

    KING_OFFSETS
        .iter()
        .find_map(|&(df, dr)| is(target.offset(df, dr), PieceKind::King))
}

/// The cheapest `slider` (or Queen) of `color` that is the first piece along one of `directions` from `target`.
fn slider_attacker(
    board: &Mailbox,
    target: Square,
    color: Color,
    directions: &[(i8, i8)],
    slider: PieceKind,
) -> Option<(Square, PieceKind)> {
    let mut best: Option<(Square, PieceKind)> = None;

    for &(df, dr) in directions {
        let mut current = target;
        while let Some(next) = current.offset(df, dr) {
            if let Some(piece) = board[next.index()] {
                let kind = piece.kind();
                if piece.color() == color
                    && (kind == slider || kind == PieceKind::Queen)
                    && best.map_or(true, |(_, b)| kind.value() < b.value())
                {
                    best = Some((next, kind));
                }
                break;
            }
            current = next;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn see_of(fen: &str, uci: &str) -> i32 {
        let pos = Position::from_fen(fen).unwrap();
        let mv = Move::from_uci(&pos, uci).unwrap();
        see(&pos, mv)
    }

    #[test]
    fn test_undefended_captures() {
        assert_eq!(see_of("k7/8/8/8/p7/8/Q7/K7 w - - 0 1", "a2a4"), 100);
        assert_eq!(see_of("k7/8/8/8/8/b7/R7/K7 w - - 0 1", "a2a3"), 330);
    }

    #[test]
    fn test_blocked_pawn_still_counts_victim() {
        // Not a legal move, but the exchange on a3 is still well-defined
        let pos = Position::from_fen("k7/8/8/8/8/p7/P7/K7 w - - 0 1").unwrap();
        let mv = Move::new(Square::from_uci("a2").unwrap(), Square::from_uci("a3").unwrap());
        assert_eq!(see(&pos, mv), 100);
    }

    #[test]
    fn test_defended_captures() {
        assert_eq!(see_of("k7/8/8/p7/1n6/8/Q7/K7 w - - 0 1", "a2b4"), -580);
        assert_eq!(see_of("k7/8/8/b7/1r6/8/Q7/K7 w - - 0 1", "a2b4"), -400);
        assert_eq!(see_of("k7/8/8/8/p7/1b6/P7/K7 w - - 0 1", "a2b3"), 230);
    }

    #[test]
    fn test_defending_king_too_far() {
        assert_eq!(see_of("8/1k6/8/8/8/8/p1K5/Q7 w - - 0 1", "a1a2"), 100);
    }

    #[test]
    fn test_en_passant_and_quiet_moves() {
        // Pawn takes en passant, then is recaptured by the c7 pawn and recaptures nothing
        let fen = "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        assert_eq!(see_of(fen, "e5d6"), 0);

        assert_eq!(see_of(crate::FEN_STARTPOS, "e2e4"), 0);
    }

    #[test]
    fn test_xray_recapture() {
        // Two white rooks stacked on the e-file against a pawn defended by a rook
        let fen = "4r1k1/8/8/4p3/8/8/4R3/4R1K1 w - - 0 1";
        // RxP (100), RxR (500), RxR (500): 100 - 500 + 500
        assert_eq!(see_of(fen, "e2e5"), 100);
    }
}
