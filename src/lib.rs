/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

/// Board representation, move generation, hashing, and perft.
mod board;

/// Commands the engine understands beyond UCI.
mod cli;

/// Code related to the engine's functionality, such as user input handling.
mod engine;

/// Evaluation of chess positions.
mod eval;

/// History and killer tables for move ordering.
mod history;

/// Staged move ordering.
mod movepicker;

/// Piece-Square tables.
mod psqt;

/// Search scores, including mate scores.
mod score;

/// Main engine logic; all search related code.
mod search;

/// Static Exchange Evaluation.
mod see;

/// Transposition table.
mod ttable;

/// Tunable search parameters.
mod tune;

/// Misc utility types.
mod utils;

pub use board::*;
pub use cli::*;
pub use engine::*;
pub use eval::*;
pub use history::*;
pub use movepicker::*;
pub use psqt::*;
pub use score::*;
pub use search::*;
pub use see::*;
pub use ttable::*;
pub use utils::*;
