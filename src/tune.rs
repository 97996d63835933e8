/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Number of moves assumed to remain in the game when the GUI doesn't send `movestogo`.
macro_rules! default_moves_to_go {
    () => {
        30
    };
}
pub(crate) use default_moves_to_go;

/// Percentage of the remaining clock time that a single move may never exceed.
macro_rules! max_time_percent {
    () => {
        20
    };
}
pub(crate) use max_time_percent;

/// Smallest time budget (in milliseconds) for a move made on the clock.
macro_rules! min_move_time_ms {
    () => {
        50
    };
}
pub(crate) use min_move_time_ms;

/// Percentage of the computed budget actually used, leaving room for communication overhead.
macro_rules! time_safety_percent {
    () => {
        90
    };
}
pub(crate) use time_safety_percent;

/// Percentage of a fixed `movetime` actually used.
macro_rules! movetime_safety_percent {
    () => {
        95
    };
}
pub(crate) use movetime_safety_percent;

/// Initial half-width of the Aspiration Window.
macro_rules! initial_aspiration_window_delta {
    () => {
        35
    };
}
pub(crate) use initial_aspiration_window_delta;

/// Growth of the Aspiration Window after each failed attempt, in percent.
macro_rules! aspiration_window_growth_percent {
    () => {
        180
    };
}
pub(crate) use aspiration_window_growth_percent;

/// Number of windowed searches attempted at one depth before the result is accepted as-is.
macro_rules! max_aspiration_attempts {
    () => {
        4
    };
}
pub(crate) use max_aspiration_attempts;

/// Minimum depth at which Null Move Pruning is attempted.
macro_rules! min_nmp_depth {
    () => {
        3
    };
}
pub(crate) use min_nmp_depth;

/// Extra plies removed from the null move search.
macro_rules! nmp_reduction {
    () => {
        2
    };
}
pub(crate) use nmp_reduction;

/// Non-pawn material the side to move must have for Null Move Pruning (a Knight and a Pawn).
macro_rules! min_nmp_material {
    () => {
        420
    };
}
pub(crate) use min_nmp_material;

/// Minimum depth at which Internal Iterative Deepening runs when there is no hash move.
macro_rules! min_iid_depth {
    () => {
        4
    };
}
pub(crate) use min_iid_depth;

/// Plies removed from the Internal Iterative Deepening pre-search.
macro_rules! iid_reduction {
    () => {
        2
    };
}
pub(crate) use iid_reduction;

/// Number of moves searched at full depth before Late Move Reductions apply.
macro_rules! min_lmr_moves {
    () => {
        4
    };
}
pub(crate) use min_lmr_moves;

/// Minimum depth at which Late Move Reductions apply.
macro_rules! min_lmr_depth {
    () => {
        3
    };
}
pub(crate) use min_lmr_depth;

/// Plies removed from a late quiet move's search.
macro_rules! lmr_reduction {
    () => {
        1
    };
}
pub(crate) use lmr_reduction;

/// Margin for Futility Pruning at frontier nodes.
macro_rules! futility_margin {
    () => {
        200
    };
}
pub(crate) use futility_margin;

/// Margin for Delta Pruning in quiescence.
macro_rules! delta_margin {
    () => {
        200
    };
}
pub(crate) use delta_margin;

/// Plies added to a move that gives check.
macro_rules! check_extension {
    () => {
        1
    };
}
pub(crate) use check_extension;

/// Minimum depth for a Singular Extension.
macro_rules! min_singular_depth {
    () => {
        6
    };
}
pub(crate) use min_singular_depth;

/// How far the best score must exceed the original alpha for a Singular Extension.
macro_rules! singular_alpha_margin {
    () => {
        50
    };
}
pub(crate) use singular_alpha_margin;

/// How far the best score must exceed the stored hash score for a Singular Extension.
macro_rules! singular_margin {
    () => {
        25
    };
}
pub(crate) use singular_margin;

/// How much shallower than the current node the hash entry may be for a Singular Extension.
macro_rules! singular_tt_depth_margin {
    () => {
        3
    };
}
pub(crate) use singular_tt_depth_margin;

/// Plies added when re-searching a singular move.
macro_rules! singular_extension {
    () => {
        1
    };
}
pub(crate) use singular_extension;

/// Base ordering score of any capture.
macro_rules! capture_bonus {
    () => {
        1_000_000
    };
}
pub(crate) use capture_bonus;

/// Ordering bonus of a promotion, added to the promoted piece's value.
macro_rules! promotion_bonus {
    () => {
        50_000
    };
}
pub(crate) use promotion_bonus;

/// Ordering score of the primary killer move.
macro_rules! primary_killer_bonus {
    () => {
        90_000
    };
}
pub(crate) use primary_killer_bonus;

/// Ordering score of the secondary killer move.
macro_rules! secondary_killer_bonus {
    () => {
        80_000
    };
}
pub(crate) use secondary_killer_bonus;

/// Maximum ordering score a quiet move can earn from the History Heuristic.
macro_rules! max_history_bonus {
    () => {
        70_000
    };
}
pub(crate) use max_history_bonus;

// Evaluation terms are (middle game, endgame) pairs

/// Bonus for owning both Bishops.
macro_rules! bishop_pair_bonus {
    () => {
        $crate::Tapered::new(60, 60)
    };
}
pub(crate) use bishop_pair_bonus;

/// Bonus for being the side to move.
macro_rules! tempo_bonus {
    () => {
        $crate::Tapered::new(10, 10)
    };
}
pub(crate) use tempo_bonus;

/// Penalty for every extra Pawn on a file.
macro_rules! doubled_pawn_penalty {
    () => {
        $crate::Tapered::new(10, 10)
    };
}
pub(crate) use doubled_pawn_penalty;

/// Penalty for a Pawn with no friendly Pawns on either adjacent file.
macro_rules! isolated_pawn_penalty {
    () => {
        $crate::Tapered::new(15, 15)
    };
}
pub(crate) use isolated_pawn_penalty;

/// Penalty for a Pawn that no friendly Pawn can support and that no friendly Pawn stands in front of.
macro_rules! backward_pawn_penalty {
    () => {
        $crate::Tapered::new(8, 8)
    };
}
pub(crate) use backward_pawn_penalty;

/// Bonus for any passed Pawn.
macro_rules! passed_pawn_bonus {
    () => {
        $crate::Tapered::new(20, 30)
    };
}
pub(crate) use passed_pawn_bonus;

/// Extra bonus for a passed Pawn, indexed by its rank relative to its owner.
macro_rules! passed_pawn_rank_bonus {
    () => {
        [
            $crate::Tapered::new(0, 0),
            $crate::Tapered::new(5, 5),
            $crate::Tapered::new(15, 15),
            $crate::Tapered::new(30, 30),
            $crate::Tapered::new(50, 50),
            $crate::Tapered::new(75, 75),
            $crate::Tapered::new(100, 100),
            $crate::Tapered::new(0, 0),
        ]
    };
}
pub(crate) use passed_pawn_rank_bonus;

/// Penalty for a Pawn blocked by an enemy Pawn before it crosses into the enemy half.
macro_rules! pawn_ram_penalty {
    () => {
        $crate::Tapered::new(6, 6)
    };
}
pub(crate) use pawn_ram_penalty;

/// Bonus for a Rook on a file without Pawns.
macro_rules! rook_open_file_bonus {
    () => {
        $crate::Tapered::new(20, 20)
    };
}
pub(crate) use rook_open_file_bonus;

/// Bonus for a Rook on a file with only enemy Pawns.
macro_rules! rook_semi_open_file_bonus {
    () => {
        $crate::Tapered::new(10, 8)
    };
}
pub(crate) use rook_semi_open_file_bonus;

/// Bonus for a Rook on its seventh rank.
macro_rules! rook_on_seventh_bonus {
    () => {
        $crate::Tapered::new(25, 30)
    };
}
pub(crate) use rook_on_seventh_bonus;

/// Bonus for each friendly Pawn directly in front of the King.
macro_rules! king_shield_bonus {
    () => {
        $crate::Tapered::new(8, 4)
    };
}
pub(crate) use king_shield_bonus;

/// Penalty for each file on or next to the King without Pawns.
macro_rules! king_open_file_penalty {
    () => {
        $crate::Tapered::new(12, 12)
    };
}
pub(crate) use king_open_file_penalty;

/// Penalty for each file on or next to the King with only enemy Pawns.
macro_rules! king_semi_open_file_penalty {
    () => {
        $crate::Tapered::new(6, 6)
    };
}
pub(crate) use king_semi_open_file_penalty;

/// Weight of a Knight's mobility.
macro_rules! knight_mobility_weight {
    () => {
        $crate::Tapered::new(2, 2)
    };
}
pub(crate) use knight_mobility_weight;

/// Weight of a Bishop's, Rook's, or Queen's mobility.
macro_rules! slider_mobility_weight {
    () => {
        $crate::Tapered::new(1, 1)
    };
}
pub(crate) use slider_mobility_weight;

/// Penalty for two Knights facing an enemy Bishop.
macro_rules! knight_pair_penalty {
    () => {
        $crate::Tapered::new(15, 15)
    };
}
pub(crate) use knight_pair_penalty;

/// Bonus for owning both Rooks.
macro_rules! rook_pair_bonus {
    () => {
        $crate::Tapered::new(15, 15)
    };
}
pub(crate) use rook_pair_bonus;
