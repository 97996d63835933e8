/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt, io,
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{channel, Receiver, Sender},
        Arc, Mutex, MutexGuard,
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use anyhow::{bail, Context, Result};
use uci_parser::{UciCommand, UciOption, UciParseError, UciResponse};

use crate::{
    perft, splitperft, ClassicalEvaluator, EngineCommand, EvalBreakdown, Evaluator, HistoryTable,
    KillerTable, LogDebug, LogInfo, LogLevel, LogNone, Move, MoveList, Piece, Position, Psqt,
    Search, SearchConfig, SearchResult, Square, TTable, ZobristKey,
};

/// The Hopper chess engine.
///
/// An [`Engine`] can be driven over UCI with [`Engine::run`], or used directly as a library:
///
/// ```
/// # use hopper::*;
/// let mut engine = Engine::new();
/// engine.load_position("k7/8/KQ6/8/8/8/8/8 w - - 0 1").unwrap();
///
/// let res = engine.best_move(Some(3), None);
/// assert!(res.score.is_mate());
/// ```
#[derive(Debug)]
pub struct Engine {
    /// The position that searches and commands operate on.
    position: Position,

    /// Keys of every position that came before `self.position` in the current game, oldest first.
    ///
    /// Updated when a move is applied or the engine receives `position ... moves [move list]`.
    prev_keys: Vec<ZobristKey>,

    /// One half of a channel, responsible for sending commands to the engine to execute.
    sender: Sender<EngineCommand>,

    /// One half of a channel, responsible for receiving commands for the engine to execute.
    receiver: Receiver<EngineCommand>,

    /// Atomic flag to determine whether a search is currently running
    is_searching: Arc<AtomicBool>,

    /// Handle to the currently-running search thread, if one exists.
    search_thread: Option<JoinHandle<SearchResult>>,

    /// Transposition table used to cache information found during search.
    ttable: Arc<Mutex<TTable>>,

    /// History table for keeping track of good quiet moves during search.
    history: Arc<Mutex<HistoryTable>>,

    /// Killer moves, by ply.
    killers: Arc<Mutex<KillerTable>>,

    /// Whether to display extra information during execution.
    debug: bool,
}

impl Engine {
    /// Constructs a new [`Engine`] on the starting position.
    #[inline(always)]
    pub fn new() -> Self {
        let (sender, receiver) = channel();

        Self {
            position: Position::default(),
            prev_keys: Vec::with_capacity(512),
            sender,
            receiver,
            is_searching: Arc::default(),
            search_thread: None,
            ttable: Arc::default(),
            history: Arc::default(),
            killers: Arc::default(),
            debug: false,
        }
    }

    /// Returns a string of the engine's name and current version.
    #[inline(always)]
    pub fn name(&self) -> String {
        format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    /// Returns a string of all authors of this engine.
    #[inline(always)]
    pub fn authors(&self) -> String {
        env!("CARGO_PKG_AUTHORS").replace(':', ", ")
    }

    /// Sends an [`EngineCommand`] to the engine to be executed.
    #[inline(always)]
    pub fn send_command(&self, command: EngineCommand) {
        // The receiver lives as long as the engine does, so this cannot fail
        self.sender
            .send(command)
            .expect("Failed to send a command to the engine via channels.");
    }

    /// The position the engine is currently on.
    #[inline(always)]
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Replaces the current position with the one described by `fen`, starting a fresh game history.
    ///
    /// If `fen` is invalid, an error is returned and the engine is left unchanged.
    pub fn load_position(&mut self, fen: &str) -> Result<()> {
        let position = Position::from_fen(fen)?;

        self.position = position;
        self.prev_keys.clear();

        Ok(())
    }

    /// Plays the move described by `uci` on the current position.
    ///
    /// Malformed and illegal moves are rejected before anything changes.
    pub fn apply_move(&mut self, uci: &str) -> Result<()> {
        let mv = Move::from_uci(&self.position, uci)?;

        self.prev_keys.push(self.position.key());
        self.position.make_move(mv);
        self.position.commit();

        Ok(())
    }

    /// All legal moves in the current position.
    #[inline(always)]
    pub fn legal_moves(&self) -> MoveList {
        self.position.legal_moves()
    }

    /// Searches the current position to `depth` plies, or for `time`, whichever runs out first.
    ///
    /// With neither limit, the search runs to the maximum depth.
    /// This blocks until the search completes and prints nothing.
    /// Any search started over UCI is stopped first.
    pub fn best_move(&mut self, depth: Option<u8>, time: Option<Duration>) -> SearchResult {
        self.set_is_searching(false);
        self.stop_search();

        let config = SearchConfig::with_limits(depth, time);
        self.set_is_searching(true);

        let mut ttable = self.ttable();
        let mut history = self.history();
        let mut killers = self.killers();

        Search::<LogNone, _>::new(
            Arc::clone(&self.is_searching),
            config,
            self.prev_keys.clone(),
            &mut ttable,
            &mut history,
            &mut killers,
            ClassicalEvaluator,
        )
        .start(&self.position)
    }

    /// Counts the leaf nodes of the legal move tree `depth` plies below the current position.
    #[inline(always)]
    pub fn perft(&mut self, depth: usize) -> u64 {
        perft(&mut self.position, depth)
    }

    /// Like [`Engine::perft`], but prints the node count after each root move.
    #[inline(always)]
    pub fn splitperft(&mut self, depth: usize) -> u64 {
        splitperft(&mut self.position, depth)
    }

    /// Resets the engine to the starting position with empty history and tables.
    ///
    /// Any ongoing search is cancelled and its result ignored.
    pub fn new_game(&mut self) {
        self.set_is_searching(false);
        self.position = Position::default();
        self.prev_keys.clear();
        self.clear_hash_tables();
    }

    /// Entrypoint of the engine.
    ///
    /// This function first spawns a new thread that handles user input from `stdin`.
    /// It then loops on commands received by the engine, executing them in the order received,
    /// until an [`EngineCommand::Exit`] is received or every sender hangs up.
    pub fn run(&mut self) {
        // Spawn a separate thread for handling user input
        let sender = self.sender.clone();
        thread::spawn(|| {
            if let Err(err) = input_handler(sender) {
                eprintln!("Input handler thread stopping after fatal error: {err:#}");
            }
        });

        while let Ok(cmd) = self.receiver.recv() {
            match cmd {
                EngineCommand::Display => println!("{:?}", self.position),

                EngineCommand::Eval { pretty } => self.eval(pretty),

                EngineCommand::Exit { cleanup } => {
                    // If requested, await the completion of any ongoing search threads
                    if cleanup {
                        self.stop_search();
                    }

                    break;
                }

                EngineCommand::Fen => println!("{}", self.position.to_fen()),

                EngineCommand::HashInfo => self.hash_info(),

                EngineCommand::Moves { square, sort } => self.moves(square, sort),

                EngineCommand::Option { name } => {
                    let name = name.join(" ");
                    if let Some(value) = self.get_option(&name) {
                        println!("Option {name:?} := {value}");
                    } else {
                        println!("{} has no option {name:?}", self.name());
                    }
                }

                EngineCommand::Perft { depth } => println!("{}", self.perft(depth)),

                EngineCommand::Psqt { piece } => self.psqt(piece),

                EngineCommand::Splitperft { depth } => println!("\n{}", self.splitperft(depth)),

                EngineCommand::Uci { cmd } => {
                    // A bad command must not bring down the engine
                    if let Err(e) = self.handle_uci_command(cmd) {
                        eprintln!("Error: {e:#}");
                    }
                }

                EngineCommand::Wait => _ = self.stop_search(),
            }
        }
    }

    /// Handle the execution of a single [`UciCommand`].
    fn handle_uci_command(&mut self, uci: UciCommand) -> Result<()> {
        use UciCommand::*;
        match uci {
            Uci => self.uci(),

            Debug(status) => self.debug = status,

            IsReady => println!("{}", UciResponse::<&str>::ReadyOk),

            SetOption { name, value } => self.set_option(&name, value)?,

            Register { name: _, code: _ } => println!("{} requires no registration", self.name()),

            UciNewGame => self.new_game(),

            Go(options) => {
                if let Some(depth) = options.perft {
                    println!("\n{}", self.splitperft(depth as usize));
                    return Ok(());
                }

                let config = SearchConfig::new(options, &self.position);
                let handle = if self.debug {
                    self.start_search::<LogDebug>(config)
                } else {
                    self.start_search::<LogInfo>(config)
                };

                if handle.is_some() {
                    self.search_thread = handle;
                }
            }

            Position { fen, moves } => self.set_position(fen, moves)?,

            Stop => self.set_is_searching(false),

            Quit => self.send_command(EngineCommand::Exit { cleanup: false }),

            _ => bail!("{} does not support UCI command {uci:?}", self.name()),
        }

        Ok(())
    }

    /// Handles `position [startpos | fen <fen>] moves [move list]`.
    ///
    /// Every move is checked for legality, and nothing changes unless all of them are.
    fn set_position(&mut self, fen: Option<String>, moves: Vec<String>) -> Result<()> {
        let mut position = match fen {
            Some(fen) => Position::from_fen(&fen)?,
            None => Position::default(),
        };

        let mut prev_keys = Vec::with_capacity(moves.len().max(512));
        for mv_str in &moves {
            let mv = Move::from_uci(&position, mv_str)
                .with_context(|| format!("Cannot apply moves {moves:?}"))?;

            prev_keys.push(position.key());
            position.make_move(mv);
            position.commit();
        }

        self.position = position;
        self.prev_keys = prev_keys;

        Ok(())
    }

    /// Executes the `eval` command, printing an evaluation of the current position.
    fn eval(&self, pretty: bool) {
        if pretty {
            println!("{}", EvalBreakdown(&self.position));
        } else {
            println!("{}", ClassicalEvaluator.evaluate(&self.position));
        }
    }

    /// Display info about the internal hash table(s)
    fn hash_info(&self) {
        let ttable = self.ttable();

        let size = ttable.size();
        let num = ttable.num_entries();
        let cap = ttable.capacity();
        let percent = num as f32 / cap as f32 * 100.0;
        println!("TT info: {size}mb @ {num}/{cap} entries ({percent:.2}% full)");
        println!("TT hashfull: {}", ttable.hashfull());

        println!("History Tables:\n{}", self.history());
    }

    /// Executes the `moves` command, displaying all legal moves, or only those of the piece on `square`.
    fn moves(&self, square: Option<Square>, sort: bool) {
        let mut moves = self
            .position
            .legal_moves()
            .into_iter()
            .filter(|mv| square.map_or(true, |sq| mv.from() == sq))
            .map(|mv| mv.to_uci())
            .collect::<Vec<_>>();

        if sort {
            moves.sort();
        }

        if moves.is_empty() {
            println!("(none)");
        } else {
            println!("{}", moves.join(", "));
        }
    }

    /// Executes the `psqt` command, printing the piece-square table for `piece` from its owner's side of the board.
    fn psqt(&self, piece: Piece) {
        let table = Psqt::for_kind(piece.kind());
        let name = format!("{} {}", piece.color().name(), piece.kind().name());

        if piece.color().is_white() {
            println!("Piece-Square table for {name}:\n{table}");
        } else {
            println!("Piece-Square table for {name}:\n{table:#}");
        }
    }

    /// Clears all hash tables in the engine.
    #[inline(always)]
    fn clear_hash_tables(&mut self) {
        self.ttable().clear();
        self.history().clear();
        self.killers().clear();
    }

    /// Sets the search flag to signal that the engine is starting/stopping a search.
    #[inline(always)]
    fn set_is_searching(&mut self, status: bool) {
        self.is_searching.store(status, Ordering::Relaxed);
    }

    /// Returns `true` if the engine is currently executing a search.
    #[inline(always)]
    fn is_searching(&self) -> bool {
        self.is_searching.load(Ordering::Relaxed)
    }

    /// Starts a search on the current position in a new thread, given the parameters in `config`.
    fn start_search<Log: LogLevel>(
        &mut self,
        config: SearchConfig,
    ) -> Option<JoinHandle<SearchResult>> {
        // Cannot start a search if one is already running
        if self.is_searching() {
            Self::send_string("A search is already running");
            return None;
        }
        self.set_is_searching(true);

        // Clone the parameters that will be sent into the thread
        let is_searching = Arc::clone(&self.is_searching);
        let position = self.position.clone();
        let prev_keys = self.prev_keys.clone();
        let ttable = Arc::clone(&self.ttable);
        let history = Arc::clone(&self.history);
        let killers = Arc::clone(&self.killers);

        let handle = thread::spawn(move || {
            // Only the search thread may touch the tables while it runs
            let mut ttable = ttable
                .lock()
                .expect("Failed to acquire Transposition Table at the start of search.");
            let mut history = history
                .lock()
                .expect("Failed to acquire History Table at the start of search.");
            let mut killers = killers
                .lock()
                .expect("Failed to acquire Killer Table at the start of search.");

            Search::<Log, _>::new(
                is_searching,
                config,
                prev_keys,
                &mut ttable,
                &mut history,
                &mut killers,
                ClassicalEvaluator,
            )
            .start(&position)
        });

        Some(handle)
    }

    /// Awaits the current search thread, blocking until it finishes and returning its result.
    fn stop_search(&mut self) -> Option<SearchResult> {
        let handle = self.search_thread.take()?;

        let id = handle.thread().id();
        let Ok(res) = handle.join() else {
            Self::send_string(format!("Failed to join on thread {id:?}"));
            return None;
        };

        self.set_is_searching(false);

        Some(res)
    }

    /// Called when the engine receives the `uci` command.
    ///
    /// Prints engine's ID, version, and authors, and lists all UCI options.
    fn uci(&self) {
        println!("id name {}\nid author {}\n", self.name(), self.authors());

        let options: [UciOption<&str>; 3] = [
            UciOption::button("Clear Hash"),
            UciOption::spin(
                "Hash",
                TTable::DEFAULT_SIZE as i32,
                TTable::MIN_SIZE as i32,
                TTable::MAX_SIZE as i32,
            ),
            UciOption::spin("Threads", 1, 1, 1),
        ];
        for opt in options {
            println!("{}", UciResponse::Option(opt));
        }

        println!("{}", UciResponse::<&str>::UciOk)
    }

    /// Handles the `setoption` command, setting option `name` to `value`.
    ///
    /// Option names are matched case-insensitively.
    /// Will return an error if `name` isn't a valid option or `value` is not a valid value for that option.
    fn set_option(&mut self, name: &str, value: Option<String>) -> Result<()> {
        match name.to_ascii_lowercase().as_str() {
            "clear hash" => self.clear_hash_tables(),

            "hash" => {
                let Some(value) = value.as_ref() else {
                    bail!("usage: setoption name {name} value <value>");
                };

                let Ok(mb) = value.parse::<usize>() else {
                    bail!("expected integer. got {value:?}");
                };

                if mb < TTable::MIN_SIZE {
                    bail!("Minimum value for Hash is {}mb", TTable::MIN_SIZE);
                }
                if mb > TTable::MAX_SIZE {
                    bail!("Maximum value for Hash is {}mb", TTable::MAX_SIZE);
                }

                *self.ttable() = TTable::new(mb);
            }

            "threads" => {
                if value.as_deref().map(str::trim) != Some("1") {
                    bail!("{} currently supports only 1 thread", self.name());
                }
            }

            _ => {
                if let Some(value) = value.as_ref() {
                    bail!("Unrecognized option {name:?} with value {value:?}")
                } else {
                    bail!("Unrecognized option {name:?}")
                }
            }
        }

        if self.debug {
            let info = if let Some(value) = value.as_ref() {
                format!("Option {name} set to {value}")
            } else {
                format!("Option {name} toggled")
            };
            Self::send_string(info);
        }

        Ok(())
    }

    /// Returns the current value of the option `name`, if it exists on this engine.
    fn get_option(&self, name: &str) -> Option<String> {
        let value = match name.to_ascii_lowercase().as_str() {
            "clear hash" => String::default(),

            "hash" => format!("{}", self.ttable().size()),

            "threads" => String::from("1"),

            _ => return None,
        };

        Some(value)
    }

    /// Helper to send an `info string` message to `stdout`.
    #[inline(always)]
    fn send_string<T: fmt::Display>(info: T) {
        println!("{}", UciResponse::info_string(info));
    }

    /// Helper function to fetch the TTable, panicking if impossible.
    #[inline(always)]
    fn ttable(&self) -> MutexGuard<'_, TTable> {
        self.ttable
            .lock()
            .expect("A thread holding the TTable panicked")
    }

    /// Helper function to fetch the History table, panicking if impossible.
    #[inline(always)]
    fn history(&self) -> MutexGuard<'_, HistoryTable> {
        self.history
            .lock()
            .expect("A thread holding the History table panicked")
    }

    /// Helper function to fetch the Killer table, panicking if impossible.
    #[inline(always)]
    fn killers(&self) -> MutexGuard<'_, KillerTable> {
        self.killers
            .lock()
            .expect("A thread holding the Killer table panicked")
    }
}

impl Default for Engine {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// Reads `stdin` line by line, sending every command that parses through `sender`.
///
/// UCI is tried first. Lines that are not UCI at all are parsed as [`EngineCommand`]s,
/// and anything else is reported and skipped.
fn input_handler(sender: Sender<EngineCommand>) -> Result<()> {
    let mut buffer = String::with_capacity(2048);

    loop {
        buffer.clear();
        let bytes = io::stdin()
            .read_line(&mut buffer)
            .context("Failed to read line when parsing UCI commands")?;

        // EOF (ctrl + d) quits the engine
        if bytes == 0 {
            sender
                .send(EngineCommand::Exit { cleanup: false })
                .context("Failed to send 'exit' command after receiving empty input")?;

            bail!("Engine received input of 0 bytes and is quitting");
        }

        let line = buffer.trim();
        if line.is_empty() {
            continue;
        }

        let cmd = match UciCommand::new(line) {
            Ok(cmd) => EngineCommand::Uci { cmd },

            Err(UciParseError::UnrecognizedCommand { cmd: _ }) => {
                match line.parse::<EngineCommand>() {
                    Ok(cmd) => cmd,
                    Err(err) => {
                        err.print()?;
                        continue;
                    }
                }
            }

            // A known UCI command with bad arguments
            Err(uci_err) => {
                eprintln!("{uci_err:#}");
                continue;
            }
        };

        sender
            .send(cmd)
            .context("Failed to send command to engine")?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Score, FEN_KIWIPETE, FEN_STARTPOS};

    #[test]
    fn test_bad_fen_leaves_state_unchanged() {
        let mut engine = Engine::new();
        engine.apply_move("e2e4").unwrap();
        let before = engine.position().clone();

        assert!(engine.load_position("not a fen").is_err());
        assert!(engine
            .load_position("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1")
            .is_err());

        assert_eq!(engine.position(), &before);
        assert_eq!(engine.prev_keys.len(), 1);
    }

    #[test]
    fn test_apply_move_rejects_bad_moves() {
        let mut engine = Engine::new();
        let before = engine.position().clone();

        // Malformed
        assert!(engine.apply_move("e2").is_err());
        assert!(engine.apply_move("z9e4").is_err());
        // Illegal
        assert!(engine.apply_move("e2e5").is_err());
        assert!(engine.apply_move("e7e5").is_err());

        assert_eq!(engine.position(), &before);
        assert!(engine.prev_keys.is_empty());

        engine.apply_move("g1f3").unwrap();
        assert_eq!(
            engine.position().to_fen(),
            "rnbqkbnr/pppppppp/8/8/8/5N2/PPPPPPPP/RNBQKB1R b KQkq - 1 1"
        );
    }

    #[test]
    fn test_legal_moves() {
        let mut engine = Engine::new();
        assert_eq!(engine.legal_moves().len(), 20);

        engine.load_position(FEN_KIWIPETE).unwrap();
        assert_eq!(engine.legal_moves().len(), 48);
    }

    #[test]
    fn test_perft_restores_position() {
        let mut engine = Engine::new();
        assert_eq!(engine.perft(3), 8_902);
        assert_eq!(engine.position().to_fen(), FEN_STARTPOS);
    }

    #[test]
    fn test_best_move_finds_mate() {
        let mut engine = Engine::new();
        engine.load_position("k7/8/KQ6/8/8/8/8/8 w - - 0 1").unwrap();

        let res = engine.best_move(Some(4), None);
        assert_eq!(res.score.moves_to_mate(), 1);

        let bestmove = res.bestmove.unwrap();
        engine.apply_move(&bestmove.to_uci()).unwrap();
        assert!(engine.position().is_checkmate());
    }

    #[test]
    fn test_best_move_without_moves() {
        let mut engine = Engine::new();
        engine.load_position("k7/8/1Q6/8/8/8/8/7K b - - 0 1").unwrap();

        let res = engine.best_move(Some(3), None);
        assert!(res.bestmove.is_none());
        assert_eq!(res.score, Score::DRAW);
    }

    #[test]
    fn test_best_move_with_time_limit() {
        let mut engine = Engine::new();
        let res = engine.best_move(None, Some(Duration::from_millis(50)));
        assert!(res.bestmove.is_some());
        assert!(engine.legal_moves().contains(&res.bestmove.unwrap()));
    }

    #[test]
    fn test_new_game_resets() {
        let mut engine = Engine::new();
        engine.load_position(FEN_KIWIPETE).unwrap();
        engine.apply_move("e1g1").unwrap();
        engine.best_move(Some(2), None);
        assert!(engine.ttable().num_entries() > 0);

        engine.new_game();
        assert_eq!(engine.position(), &Position::default());
        assert!(engine.prev_keys.is_empty());
        assert_eq!(engine.ttable().num_entries(), 0);
    }

    #[test]
    fn test_set_position_is_atomic() {
        let mut engine = Engine::new();
        engine
            .set_position(None, vec!["e2e4".into(), "e7e5".into()])
            .unwrap();
        assert_eq!(engine.prev_keys.len(), 2);
        let before = engine.position().clone();

        // The third move is illegal, so none of them may be applied
        let moves = vec!["d2d4".into(), "d7d5".into(), "d4d5".into()];
        assert!(engine.set_position(None, moves).is_err());
        assert_eq!(engine.position(), &before);
        assert_eq!(engine.prev_keys.len(), 2);
    }

    #[test]
    fn test_options() {
        let mut engine = Engine::new();
        assert_eq!(
            engine.get_option("Hash"),
            Some(TTable::DEFAULT_SIZE.to_string())
        );

        engine.set_option("hash", Some("2".into())).unwrap();
        assert_eq!(engine.get_option("HASH"), Some(String::from("2")));

        assert!(engine.set_option("Hash", Some("0".into())).is_err());
        assert!(engine.set_option("Hash", Some("lots".into())).is_err());
        assert!(engine.set_option("Hash", None).is_err());
        assert!(engine.set_option("Threads", Some("4".into())).is_err());
        assert!(engine.set_option("Threads", Some("1".into())).is_ok());
        assert!(engine.set_option("Clear Hash", None).is_ok());
        assert!(engine.set_option("Ponder", Some("true".into())).is_err());
        assert_eq!(engine.get_option("Ponder"), None);
    }
}
