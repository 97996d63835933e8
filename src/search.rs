/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    marker::PhantomData,
    ops::Neg,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use arrayvec::ArrayVec;
use uci_parser::{UciInfo, UciResponse, UciSearchOptions};

use crate::{
    score_move, see, tactical_score, tune, Bound, Evaluator, HistoryTable, KillerTable, LogLevel,
    Move, MovePicker, Position, Score, TTable, TTableEntry, ZobristKey,
};

/// Maximum number of plies from the root that the search will ever reach.
pub const MAX_SEARCH_PLY: usize = 64;

/// Represents the best sequence of moves found during a search.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PrincipalVariation(ArrayVec<Move, MAX_SEARCH_PLY>);

impl PrincipalVariation {
    /// The moves of this line, starting from the root.
    #[inline(always)]
    pub fn iter(&self) -> impl Iterator<Item = &Move> {
        self.0.iter()
    }

    /// Number of moves in this line.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if this line has no moves.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends `mv`, returning `false` if the line is already full.
    #[inline(always)]
    fn push(&mut self, mv: Move) -> bool {
        self.0.try_push(mv).is_ok()
    }
}

impl fmt::Display for PrincipalVariation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let moves = self.iter().map(Move::to_uci).collect::<Vec<_>>();
        write!(f, "{}", moves.join(" "))
    }
}

/// Bounds within an alpha-beta search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchBounds {
    /// Lower bound.
    ///
    /// We are guaranteed a score that is AT LEAST `alpha`.
    /// During search, if no move can raise `alpha`, we are said to have "failed low."
    pub alpha: Score,

    /// Upper bound.
    ///
    /// Our opponent is guaranteed a score that is AT MOST `beta`.
    /// During search, if a move scores at least `beta`, we are said to have "failed high,"
    /// and the rest of the node is pruned.
    pub beta: Score,
}

impl SearchBounds {
    /// Create a new [`SearchBounds`] from the provided `alpha` and `beta` values.
    #[inline(always)]
    pub const fn new(alpha: Score, beta: Score) -> Self {
        Self { alpha, beta }
    }

    /// Create a "null window" around `alpha`.
    #[inline(always)]
    pub fn null_alpha(self) -> Self {
        Self::new(self.alpha, self.alpha + 1)
    }

    /// Create a "null window" around `beta`.
    #[inline(always)]
    pub fn null_beta(self) -> Self {
        Self::new(self.beta - 1, self.beta)
    }
}

impl Neg for SearchBounds {
    type Output = Self;
    /// Negating a [`SearchBounds`] swaps the `alpha` and `beta` fields and negates them both.
    #[inline(always)]
    fn neg(self) -> Self::Output {
        Self {
            alpha: -self.beta,
            beta: -self.alpha,
        }
    }
}

impl Default for SearchBounds {
    /// Default [`SearchBounds`] are a `(-infinity, infinity)`.
    #[inline(always)]
    fn default() -> Self {
        Self::new(Score::ALPHA, Score::BETA)
    }
}

impl fmt::Display for SearchBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.alpha, self.beta)
    }
}

/// Represents a window around a search result to act as our a/b bounds.
#[derive(Debug)]
struct AspirationWindow {
    /// Bounds of this search window
    bounds: SearchBounds,

    /// Distance from the previous score to the window's far edge on a re-search.
    delta: Score,
}

impl AspirationWindow {
    /// Creates a new [`AspirationWindow`] centered around `score`.
    ///
    /// Without a previous score, or if it is mate, the window is infinite.
    #[inline(always)]
    fn new(score: Option<Score>, delta: Score) -> Self {
        let bounds = match score {
            Some(score) if !score.is_mate() => SearchBounds::new(
                (score - delta).max(Score::ALPHA),
                (score + delta).min(Score::BETA),
            ),
            _ => SearchBounds::default(),
        };

        Self { bounds, delta }
    }

    /// Opens the window's `alpha` bound entirely, keeping `beta` just above `score`.
    #[inline(always)]
    fn widen_down(&mut self, score: Score) {
        self.bounds = SearchBounds::new(Score::ALPHA, (score + self.delta).min(Score::BETA));
        self.grow();
    }

    /// Opens the window's `beta` bound entirely, keeping `alpha` just below `score`.
    #[inline(always)]
    fn widen_up(&mut self, score: Score) {
        self.bounds = SearchBounds::new((score - self.delta).max(Score::ALPHA), Score::BETA);
        self.grow();
    }

    /// Removes both bounds.
    #[inline(always)]
    fn open(&mut self) {
        self.bounds = SearchBounds::default();
    }

    /// Grows `delta` geometrically for the next re-search.
    #[inline(always)]
    fn grow(&mut self) {
        self.delta = self.delta * tune::aspiration_window_growth_percent!() / 100;
    }

    /// Returns `true` if `score` fails low, meaning it is below `alpha` and the window must be expanded downwards.
    #[inline(always)]
    fn fails_low(&self, score: Score) -> bool {
        self.bounds.alpha != Score::ALPHA && score <= self.bounds.alpha
    }

    /// Returns `true` if `score` fails high, meaning it is above `beta` and the window must be expanded upwards.
    #[inline(always)]
    fn fails_high(&self, score: Score) -> bool {
        self.bounds.beta != Score::BETA && score >= self.bounds.beta
    }
}

/// The result of a search, containing the best move found, score, and total nodes searched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchResult {
    /// Number of nodes searched.
    pub nodes: u64,

    /// Best move found during the search.
    pub bestmove: Option<Move>,

    /// Evaluation of the position after `bestmove` is made.
    pub score: Score,

    /// The depth of the last completed iteration.
    pub depth: u8,

    /// Principal variation of the last completed iteration.
    pub pv: PrincipalVariation,
}

impl Default for SearchResult {
    /// A default search result should initialize to a *very bad* value,
    /// since there isn't a move to play.
    #[inline(always)]
    fn default() -> Self {
        Self {
            nodes: 0,
            bestmove: None,
            score: Score::ALPHA,
            depth: 0,
            pv: PrincipalVariation::default(),
        }
    }
}

/// Configuration variables for executing a [`Search`].
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Maximum depth to execute the search.
    pub max_depth: u8,

    /// Node allowance.
    ///
    /// If the search exceeds this many nodes, it will exit as quickly as possible.
    pub max_nodes: u64,

    /// Start time of the search.
    pub starttime: Instant,

    /// Soft limit on search time.
    ///
    /// During iterative deepening, if a depth concludes and this timeout is exceeded,
    /// the entire search will exit, since there probably isn't enough time remaining
    /// to conduct a search at a deeper depth.
    pub soft_timeout: Duration,

    /// Hard limit on search time.
    ///
    /// During *any* point in the search, if this limit is exceeded, the search will cancel
    /// and the unfinished iteration is discarded.
    pub hard_timeout: Duration,
}

impl SearchConfig {
    /// Constructs a new [`SearchConfig`] from the provided UCI options and position.
    ///
    /// The [`Position`] is used to determine whose clock to budget from.
    pub fn new(options: UciSearchOptions, position: &Position) -> Self {
        let mut config = Self::default();

        // If supplied, set the max depth / node allowance
        if let Some(depth) = options.depth {
            config.max_depth = clamp_depth(depth as usize);
        }

        if let Some(nodes) = options.nodes {
            config.max_nodes = nodes as u64;
        }

        // If `movetime` was supplied, search (just under) that long.
        if let Some(movetime) = options.movetime {
            let budget = movetime * tune::movetime_safety_percent!() / 100;
            config.soft_timeout = budget;
            config.hard_timeout = budget;
        } else {
            // Otherwise, search based on time remaining and increment
            let (time, inc) = if position.side_to_move().is_white() {
                (options.wtime, options.winc)
            } else {
                (options.btime, options.binc)
            };

            // Only calculate timeouts if a time was provided
            if let Some(time) = time {
                let inc = inc.unwrap_or(Duration::ZERO);
                let budget = allocate_time(time, inc, options.movestogo.map(|n| n as u32));

                config.soft_timeout = budget;
                config.hard_timeout = budget;
            }
        }

        config
    }

    /// Constructs a new [`SearchConfig`] limited to `depth` plies and `time`, when supplied.
    pub fn with_limits(depth: Option<u8>, time: Option<Duration>) -> Self {
        let mut config = Self::default();

        if let Some(depth) = depth {
            config.max_depth = clamp_depth(depth as usize);
        }

        if let Some(time) = time {
            config.soft_timeout = time;
            config.hard_timeout = time;
        }

        config
    }
}

impl Default for SearchConfig {
    /// A default [`SearchConfig`] will permit an "infinite" search.
    ///
    /// The word "infinite" is quoted here because the actual defaults are [`MAX_SEARCH_PLY`] and the `::MAX` values for each other field.
    #[inline(always)]
    fn default() -> Self {
        Self {
            max_depth: MAX_SEARCH_PLY as u8,
            max_nodes: u64::MAX,
            starttime: Instant::now(),
            soft_timeout: Duration::MAX,
            hard_timeout: Duration::MAX,
        }
    }
}

/// Keeps a requested depth within `1..=MAX_SEARCH_PLY`.
#[inline(always)]
fn clamp_depth(depth: usize) -> u8 {
    depth.clamp(1, MAX_SEARCH_PLY) as u8
}

/// Computes how long to think about a move, given the time left on our clock, our increment, and the moves left until the next time control.
///
/// Without `movestogo`, the game is assumed to last another 30 moves.
/// The budget never exceeds 20% of `time`, never drops below 50ms, and 10% of it is kept as a safety margin.
///
/// # Example
/// ```
/// # use hopper::*;
/// # use std::time::Duration;
/// let budget = allocate_time(Duration::from_secs(60), Duration::ZERO, None);
/// assert_eq!(budget, Duration::from_millis(1_800));
/// ```
pub fn allocate_time(time: Duration, inc: Duration, movestogo: Option<u32>) -> Duration {
    let moves_to_go = movestogo
        .filter(|&n| n > 0)
        .unwrap_or(tune::default_moves_to_go!());

    let budget = (time / moves_to_go + inc)
        .min(time * tune::max_time_percent!() / 100)
        .max(Duration::from_millis(tune::min_move_time_ms!()));

    budget * tune::time_safety_percent!() / 100
}

/// Executes a search on a position.
pub struct Search<'a, Log, E> {
    /// Number of nodes searched.
    nodes: u64,

    /// An atomic flag to determine if the search should be cancelled at any time.
    ///
    /// If this is ever `false`, the search must exit as soon as possible.
    is_searching: Arc<AtomicBool>,

    /// Configuration variables for this instance of the search.
    config: SearchConfig,

    /// Set once the search has been cancelled. Every result computed afterwards is garbage.
    stopped: bool,

    /// Keys of every position before the one being searched, oldest first.
    prev_keys: Vec<ZobristKey>,

    /// Transposition table used to cache information during search.
    ttable: &'a mut TTable,

    /// Quiet moves that caused beta cutoffs, by color and squares.
    history: &'a mut HistoryTable,

    /// Quiet moves that caused beta cutoffs, by ply.
    killers: &'a mut KillerTable,

    /// Scores the leaves of the search.
    evaluator: E,

    /// Best move of the most recent search of the root node.
    root_bestmove: Option<Move>,

    /// Marker for the level of logging to print.
    log: PhantomData<&'a Log>,
}

impl<'a, Log: LogLevel, E: Evaluator> Search<'a, Log, E> {
    /// Construct a new [`Search`] instance to execute.
    #[inline(always)]
    pub fn new(
        is_searching: Arc<AtomicBool>,
        config: SearchConfig,
        prev_keys: Vec<ZobristKey>,
        ttable: &'a mut TTable,
        history: &'a mut HistoryTable,
        killers: &'a mut KillerTable,
        evaluator: E,
    ) -> Self {
        Self {
            nodes: 0,
            is_searching,
            config,
            stopped: false,
            prev_keys,
            ttable,
            history,
            killers,
            evaluator,
            root_bestmove: None,
            log: PhantomData,
        }
    }

    /// Start the search on the supplied [`Position`], returning a [`SearchResult`].
    ///
    /// This is the entrypoint of the search, and prints UCI info before starting iterative deepening,
    /// concluding by sending the `bestmove` message and exiting.
    pub fn start(mut self, position: &Position) -> SearchResult {
        let mut position = position.clone();
        position.commit();

        // Move ordering heuristics only describe the current search
        self.killers.clear();
        self.history.clear();

        if Log::DEBUG {
            self.send_string(format!("Starting search on {:?}", position.to_fen()));

            let soft = self.config.soft_timeout.as_millis();
            let hard = self.config.hard_timeout.as_millis();
            let nodes = self.config.max_nodes;
            let depth = self.config.max_depth;

            if soft < Duration::MAX.as_millis() {
                self.send_string(format!("Soft timeout := {soft}ms"));
            }
            if hard < Duration::MAX.as_millis() {
                self.send_string(format!("Hard timeout := {hard}ms"));
            }
            if nodes < u64::MAX {
                self.send_string(format!("Max nodes := {nodes} nodes"));
            }
            if (depth as usize) < MAX_SEARCH_PLY {
                self.send_string(format!("Max depth := {depth}"));
            }
        }

        let res = self.iterative_deepening(&mut position);

        if Log::DEBUG {
            let hits = self.ttable.hits;
            let accesses = self.ttable.accesses;
            let hit_rate = self.ttable.hit_rate();
            let collisions = self.ttable.collisions;
            let info = format!("TT stats: {hits} hits / {accesses} accesses ({hit_rate:.2}% hit rate), {collisions} collisions");
            self.send_string(info);
        }

        // Search has ended; send bestmove
        if Log::INFO {
            let bestmove = res
                .bestmove
                .map(|mv| mv.to_uci())
                .unwrap_or_else(|| String::from("0000"));

            self.send_response(UciResponse::BestMove {
                bestmove: Some(bestmove),
                ponder: None,
            });
        }

        // Search has concluded, alert other thread(s) that we are no longer searching
        self.is_searching.store(false, Ordering::Relaxed);

        res
    }

    /// Sends a [`UciResponse`] to `stdout`.
    #[inline(always)]
    fn send_response<T: fmt::Display>(&self, response: UciResponse<T>) {
        println!("{response}");
    }

    /// Sends a [`UciInfo`] to `stdout`.
    #[inline(always)]
    fn send_info(&self, info: UciInfo) {
        let resp = UciResponse::info(info);
        self.send_response(resp);
    }

    /// Sends UCI info about the conclusion of an iteration.
    #[inline(always)]
    fn send_end_of_search_info(&self, result: &SearchResult) {
        let elapsed = self.config.starttime.elapsed();

        self.send_info(
            UciInfo::new()
                .depth(result.depth)
                .nodes(self.nodes)
                .score(result.score)
                .nps((self.nodes as f32 / elapsed.as_secs_f32()).trunc())
                .time(elapsed.as_millis())
                .pv(result.pv.iter().map(|mv| mv.to_uci())),
        );
    }

    /// Helper to send a [`UciInfo`] containing only a `string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(&self, string: T) {
        self.send_response(UciResponse::info_string(string));
    }

    /// Performs [iterative deepening](https://www.chessprogramming.org/Iterative_Deepening) (ID) on `position`.
    ///
    /// Searches at depth `1`, then `2`, and so on, until the depth limit is reached, the soft timeout expires,
    /// or a mate is found.
    /// An iteration that is cancelled halfway is thrown away, so the result always comes from a completed depth.
    fn iterative_deepening(&mut self, position: &mut Position) -> SearchResult {
        // No legal moves means the game is already over
        let Some(&first) = position.legal_moves().first() else {
            let score = if position.is_in_check() {
                Score::mated_in(0)
            } else {
                Score::DRAW
            };

            return SearchResult {
                score,
                ..Default::default()
            };
        };

        // Initialize `bestmove` to the first move available, in case no iteration completes
        let mut result = SearchResult {
            bestmove: Some(first),
            ..Default::default()
        };
        let mut previous_score = None;

        /****************************************************************************************************
         * Iterative Deepening: https://www.chessprogramming.org/Iterative_Deepening
         ****************************************************************************************************/

        'iterative_deepening: for depth in 1..=self.config.max_depth {
            /****************************************************************************************************
             * Aspiration Windows: https://www.chessprogramming.org/Aspiration_Windows
             ****************************************************************************************************/

            let delta = Score::new(tune::initial_aspiration_window_delta!());
            let mut window = AspirationWindow::new(previous_score, delta);
            let mut attempts = 1;

            // Get a score from the a/b search while using aspiration windows
            let score = 'aspiration_window: loop {
                self.root_bestmove = None;
                let (score, _) = self.negamax(position, depth as i32, 0, window.bounds);

                // If we've ran out of time, this iteration was cut short and can't be trusted.
                // Instead, we break out of the ID loop, keeping the result from the previous iteration.
                if self.search_cancelled() {
                    if Log::DEBUG {
                        self.send_string(format!(
                            "Search cancelled during depth {depth}; keeping depth {}",
                            result.depth
                        ));
                    }
                    break 'iterative_deepening;
                }

                if !window.fails_low(score) && !window.fails_high(score) {
                    break 'aspiration_window score;
                }

                // Too many failures; fall back to an infinite window
                if attempts >= tune::max_aspiration_attempts!() {
                    window.open();
                } else if window.fails_low(score) {
                    window.widen_down(score);
                } else {
                    window.widen_up(score);
                }
                attempts += 1;

                if Log::DEBUG {
                    self.send_string(format!(
                        "Score {score} fell outside the aspiration window at depth {depth}; re-searching with {}",
                        window.bounds
                    ));
                }
            };

            /****************************************************************************************************
             * Update current best result
             ****************************************************************************************************/

            let Some(bestmove) = self.root_bestmove else {
                if Log::DEBUG {
                    self.send_string(format!("No best move found at depth {depth}"));
                }
                break 'iterative_deepening;
            };

            result.bestmove = Some(bestmove);
            result.score = score;
            result.depth = depth;
            result.pv = self.principal_variation(position, bestmove, depth);
            previous_score = Some(score);

            // Send search info to the GUI
            if Log::INFO {
                self.send_end_of_search_info(&result);
            }

            // Not enough time to start another depth, or nothing left to find
            if self.config.starttime.elapsed() >= self.config.soft_timeout || score.is_mate() {
                break 'iterative_deepening;
            }
        }

        if Log::DEBUG && result.depth == 0 {
            self.send_string("No depth completed; falling back to the first legal move");
        }

        // Transfer the node count
        result.nodes = self.nodes;

        result
    }

    /// Rebuilds the principal variation by following best moves through the TTable, starting with `bestmove`.
    ///
    /// Stops at the first missing or illegal move, or after `depth` moves.
    fn principal_variation(
        &self,
        position: &mut Position,
        bestmove: Move,
        depth: u8,
    ) -> PrincipalVariation {
        let mut pv = PrincipalVariation::default();
        let mut next = Some(bestmove);

        while let Some(mv) = next {
            if pv.len() >= depth as usize || !position.is_legal(mv) || !pv.push(mv) {
                break;
            }

            position.make_move(mv);
            next = self
                .ttable
                .get(&position.key())
                .and_then(|entry| entry.bestmove);
        }

        for _ in 0..pv.len() {
            position.unmake();
        }

        pv
    }

    /// Primary location of search logic.
    ///
    /// Uses the [negamax](https://www.chessprogramming.org/Negamax) algorithm in a fail-hard framework,
    /// returning the score of `position` and the best move found, if any.
    fn negamax(
        &mut self,
        position: &mut Position,
        depth: i32,
        ply: usize,
        mut bounds: SearchBounds,
    ) -> (Score, Option<Move>) {
        self.nodes += 1;

        // Too deep to keep going
        if ply >= MAX_SEARCH_PLY {
            return (self.evaluator.evaluate(position), None);
        }

        if ply > 0 && self.is_draw(position) {
            return (Score::DRAW, None);
        }

        let key = position.key();
        let original = bounds;
        let in_check = position.is_in_check();

        /****************************************************************************************************
         * TT Cutoffs: https://www.chessprogramming.org/Transposition_Table#Transposition_Table_Cutoffs
         *
         * If we've already evaluated this position before at a higher depth, we can avoid re-doing a lot of
         * work by just returning the evaluation stored in the transposition table.
         ****************************************************************************************************/
        let tt_entry = self.probe_tt(key);
        let tt_move = tt_entry.and_then(|entry| entry.bestmove);

        // The root must always produce a move of its own
        if ply > 0 {
            if let Some(score) = tt_entry.and_then(|entry| entry.try_score(bounds, depth, ply)) {
                return (score, tt_move);
            }
        }

        /****************************************************************************************************
         * Quiescence Search: https://www.chessprogramming.org/Quiescence_Search
         ****************************************************************************************************/
        if depth <= 0 {
            return (self.quiescence(position, ply, bounds), None);
        }

        /****************************************************************************************************
         * Internal Iterative Deepening: https://www.chessprogramming.org/Internal_Iterative_Deepening
         *
         * Without a hash move, a shallower search of this same node gives us a move to try first.
         ****************************************************************************************************/
        let mut iid_move = None;
        if tt_move.is_none() && depth >= tune::min_iid_depth!() {
            let (_, mv) = self.negamax(
                position,
                depth - tune::iid_reduction!(),
                ply,
                SearchBounds::default(),
            );

            if self.stopped {
                return (bounds.alpha, None);
            }
            iid_move = mv;
        }

        /****************************************************************************************************
         * Null Move Pruning: https://www.chessprogramming.org/Null_Move_Pruning
         *
         * If we can pass our turn and still beat beta, our position is strong enough to prune. Skipped
         * without enough material, where passing would be better than any move (zugzwang).
         ****************************************************************************************************/
        if ply > 0
            && !in_check
            && depth >= tune::min_nmp_depth!()
            && !position.last_move_was_null()
            && position.non_pawn_material(position.side_to_move()) >= tune::min_nmp_material!()
        {
            self.prev_keys.push(key);
            position.make_null_move();

            let (score, _) = self.negamax(
                position,
                depth - 1 - tune::nmp_reduction!(),
                ply + 1,
                -bounds.null_beta(),
            );

            position.unmake();
            self.prev_keys.pop();

            if self.stopped {
                return (bounds.alpha, None);
            }

            if -score >= bounds.beta {
                self.save_to_tt(key, None, bounds.beta, Bound::Lower, depth, ply);
                return (bounds.beta, None);
            }
        }

        // If there are no legal moves, it's either mate or a draw.
        let moves = position.legal_moves();
        if moves.is_empty() {
            let score = if in_check {
                // Offset by ply to prefer earlier mates
                Score::mated_in(ply)
            } else {
                Score::DRAW
            };

            // This node's result can never change, no matter how deep it is searched
            self.save_to_tt(key, None, score, Bound::Exact, MAX_SEARCH_PLY as i32, ply);
            return (score, None);
        }

        // Only needed for futility pruning
        let static_eval = (depth == 1 && !in_check).then(|| self.evaluator.evaluate(position));

        // Sort moves so that we look at "promising" ones first
        let picker = {
            let (killers, history) = (&*self.killers, &*self.history);
            let position = &*position;
            MovePicker::new(moves, |mv| {
                score_move(position, mv, tt_move, iid_move, killers, history, ply)
            })
        };

        let stm = position.side_to_move();
        let mut best = Score::ALPHA;
        let mut bestmove = None;

        /****************************************************************************************************
         * Primary move loop
         ****************************************************************************************************/

        for (i, (mv, _)) in picker.enumerate() {
            let quiet = position.is_quiet(mv);

            /****************************************************************************************************
             * Futility Pruning: https://www.chessprogramming.org/Futility_Pruning
             *
             * One ply from the horizon, a quiet move can't raise alpha if even a generous margin doesn't.
             ****************************************************************************************************/
            if let Some(static_eval) = static_eval {
                if quiet
                    && bounds.alpha.abs() < Score::LOWEST_MATE
                    && bounds.beta.abs() < Score::LOWEST_MATE
                    && static_eval + tune::futility_margin!() <= bounds.alpha
                {
                    continue;
                }
            }

            self.prev_keys.push(key);
            position.make_move(mv);

            /****************************************************************************************************
             * Check Extensions: https://www.chessprogramming.org/Check_Extensions
             ****************************************************************************************************/
            let extension = if position.is_in_check() {
                tune::check_extension!()
            } else {
                0
            };
            let new_depth = depth - 1 + extension;

            let mut score;
            if i == 0 {
                // The first move is expected to be the best, so it gets the full window
                score = -self.negamax(position, new_depth, ply + 1, -bounds).0;
            } else {
                /****************************************************************************************************
                 * Late Move Reductions: https://www.chessprogramming.org/Late_Move_Reductions
                 *
                 * Quiet moves ordered late are unlikely to be good, so they are searched shallower at first.
                 ****************************************************************************************************/
                let reduction = if extension == 0
                    && depth >= tune::min_lmr_depth!()
                    && i >= tune::min_lmr_moves!()
                    && quiet
                {
                    tune::lmr_reduction!()
                } else {
                    0
                };

                /****************************************************************************************************
                 * Principal Variation Search: https://www.chessprogramming.org/Principal_Variation_Search
                 *
                 * Every other move is searched with a null window, only proving it is worse than the best so
                 * far. If it turns out to be better, it is re-searched at full depth, then with the full window.
                 ****************************************************************************************************/
                score = -self
                    .negamax(
                        position,
                        (new_depth - reduction).max(0),
                        ply + 1,
                        -bounds.null_alpha(),
                    )
                    .0;

                if score > bounds.alpha && score < bounds.beta {
                    if reduction > 0 {
                        score = -self
                            .negamax(position, new_depth, ply + 1, -bounds.null_alpha())
                            .0;
                    }

                    if score > bounds.alpha {
                        score = -self.negamax(position, new_depth, ply + 1, -bounds).0;
                    }
                }
            }

            position.unmake();
            self.prev_keys.pop();

            // Whatever was computed after cancellation is meaningless
            if self.search_cancelled() {
                return (bounds.alpha, bestmove);
            }

            /****************************************************************************************************
             * Score evaluation & bounds adjustments
             ****************************************************************************************************/

            if score > best {
                best = score;
                bestmove = Some(mv);
            }

            if score > bounds.alpha {
                bounds.alpha = score;
            }

            // Fail high
            if bounds.alpha >= bounds.beta {
                /****************************************************************************************************
                 * Killer Moves & History Heuristic
                 *
                 * If a quiet move fails high, it is probably a good move, so it should be tried early on in
                 * sibling nodes and in future iterations.
                 ****************************************************************************************************/
                if quiet {
                    self.killers.update(ply, mv);
                    self.history.update(stm, mv, depth);
                }

                self.save_to_tt(key, Some(mv), bounds.beta, Bound::Lower, depth, ply);

                if ply == 0 {
                    self.root_bestmove = Some(mv);
                }
                return (bounds.beta, Some(mv));
            }
        }

        // Every move was pruned, so nothing can be said beyond alpha
        let Some(mut bestmove_found) = bestmove else {
            self.save_to_tt(key, None, original.alpha, Bound::Upper, depth, ply);
            return (original.alpha, None);
        };

        /****************************************************************************************************
         * Singular Extensions: https://www.chessprogramming.org/Singular_Extensions
         *
         * If the hash move is still the best move and clearly beats both the window and its own cached
         * score, it is verified with a search one ply deeper.
         ****************************************************************************************************/
        if let Some(entry) = tt_entry.filter(|entry| {
            ply > 0
                && !in_check
                && depth >= tune::min_singular_depth!()
                && best > original.alpha + tune::singular_alpha_margin!()
                && entry.bestmove == Some(bestmove_found)
                && entry.depth >= depth - tune::singular_tt_depth_margin!()
                && best >= entry.score(ply) + tune::singular_margin!()
        }) {
            if let Some(mv) = entry.bestmove {
                self.prev_keys.push(key);
                position.make_move(mv);

                let new_depth = depth - 1 + tune::singular_extension!();
                let score = -self.negamax(position, new_depth, ply + 1, -original).0;

                position.unmake();
                self.prev_keys.pop();

                if self.search_cancelled() {
                    return (bounds.alpha, bestmove);
                }

                best = score;
                bestmove_found = mv;
            }
        }

        let bound = Bound::new(best, original);
        self.save_to_tt(key, Some(bestmove_found), best, bound, depth, ply);

        if ply == 0 {
            self.root_bestmove = Some(bestmove_found);
        }

        (best, Some(bestmove_found))
    }

    /// Quiescence Search (QSearch)
    ///
    /// A search that looks at only captures, promotions, and en passant until the position is "quiet."
    /// This is called when [`Search::negamax`] reaches a depth of 0, and is bounded only by [`MAX_SEARCH_PLY`].
    fn quiescence(&mut self, position: &mut Position, ply: usize, mut bounds: SearchBounds) -> Score {
        self.nodes += 1;

        // Evaluate the current position, to serve as our baseline
        let stand_pat = self.evaluator.evaluate(position);

        if ply >= MAX_SEARCH_PLY {
            return stand_pat;
        }

        // Beta cutoff; this position is "too good" and our opponent would never let us get here
        if stand_pat >= bounds.beta {
            return bounds.beta;
        }
        bounds.alpha = bounds.alpha.max(stand_pat);

        let moves = position.pseudo_legal_tactical_moves();
        let picker = {
            let position = &*position;
            MovePicker::new(moves, |mv| tactical_score(position, mv))
        };

        for (mv, _) in picker {
            if let Some(victim) = position.captured_kind(mv) {
                /****************************************************************************************************
                 * Delta Pruning: https://www.chessprogramming.org/Delta_Pruning
                 ****************************************************************************************************/
                if stand_pat + victim.value() + tune::delta_margin!() < bounds.alpha {
                    continue;
                }

                // Losing captures aren't worth looking at
                if see(position, mv) < 0 {
                    continue;
                }
            }

            position.make_move(mv);
            if position.king_left_in_check() {
                position.unmake();
                continue;
            }

            let score = -self.quiescence(position, ply + 1, -bounds);
            position.unmake();

            if score >= bounds.beta {
                return bounds.beta;
            }
            bounds.alpha = bounds.alpha.max(score);
        }

        bounds.alpha
    }

    /// Checks if we've exceeded any conditions that would warrant the search to end.
    ///
    /// Once this returns `true`, it always returns `true`.
    #[inline(always)]
    fn search_cancelled(&mut self) -> bool {
        if !self.stopped {
            // Condition 1: We've exceeded the hard limit of our allotted search time
            self.stopped = self.config.starttime.elapsed() >= self.config.hard_timeout ||
            // Condition 2: The search was stopped by an external factor, like the `stop` command
            !self.is_searching.load(Ordering::Relaxed) ||
            // Condition 3: We've exceeded the maximum amount of nodes we're allowed to search
            self.nodes >= self.config.max_nodes;
        }

        self.stopped
    }

    /// Returns `true` if `position` is drawn by the fifty-move rule or by repetition.
    ///
    /// Only a position identical to the ones two and four plies ago counts as a repetition.
    #[inline(always)]
    fn is_draw(&self, position: &Position) -> bool {
        if position.halfmove() >= 100 {
            return true;
        }

        let n = self.prev_keys.len();
        let key = position.key();
        n >= 4 && self.prev_keys[n - 2] == key && self.prev_keys[n - 4] == key
    }

    /// Saves the provided data to an entry in the TTable.
    ///
    /// Nothing is saved once the search has been cancelled.
    #[inline(always)]
    fn save_to_tt(
        &mut self,
        key: ZobristKey,
        bestmove: Option<Move>,
        score: Score,
        bound: Bound,
        depth: i32,
        ply: usize,
    ) {
        if self.stopped {
            return;
        }

        let entry = TTableEntry::new(key, bestmove, score, bound, depth, ply);
        self.ttable.store(entry);
    }

    /// Gets the entry for the provided position from the TTable, if it exists.
    #[inline(always)]
    fn probe_tt(&mut self, key: ZobristKey) -> Option<TTableEntry> {
        self.ttable.probe(&key)
    }
}
