//! Session façade. One `Engine` owns the position, the transposition
//! table, the heuristic tables and the pawn cache; `analyze` runs a
//! blocking search on the caller's thread, emitting one `SearchInfo` per
//! completed iteration and returning the final `BestMove`. A cloned
//! `StopHandle` lets any other thread request cancellation.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::board::{Board, FenError};
use crate::moves::execute::{generate_legal, make_move};
use crate::moves::magic::{MagicTables, magic_tables};
use crate::moves::types::{Move, MoveList};
use crate::protocol::parse_uci_move;
use crate::search::context::SearchContext;
use crate::search::pawns::PawnHashTable;
use crate::search::search::{SearchOutcome, SearchReport, Searcher};
use crate::search::time::{SearchLimit, TimeManager};
use crate::search::tt::{MATE_SCORE, MATE_THRESHOLD, TranspositionTable};

pub const STARTPOS: &str = "startpos";

// A stopped search is not an error here: the searcher always settles on a
// legal move (or reports a terminal position), so `analyze` is infallible
// and only position/option setup can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("malformed FEN: {0}")]
    Fen(#[from] FenError),
    #[error("illegal move '{mv}' at index {index} in applied history")]
    IllegalMove { mv: String, index: usize },
    #[error("unsupported option: {0}")]
    UnsupportedOption(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub hash_size_mb: usize,
    pub threads: u32,
    pub multi_pv: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            hash_size_mb: 64,
            threads: 1,
            multi_pv: 1,
        }
    }
}

/// Score from the engine's point of view, ready for the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    Cp(i32),
    /// Plies to mate; negative when the engine is being mated.
    Mate(i32),
}

impl Score {
    pub fn from_internal(score: i32) -> Self {
        if score >= MATE_THRESHOLD {
            Score::Mate(MATE_SCORE - score)
        } else if score <= -MATE_THRESHOLD {
            Score::Mate(-(MATE_SCORE + score))
        } else {
            Score::Cp(score)
        }
    }
}

/// Per-iteration progress snapshot.
#[derive(Debug, Clone)]
pub struct SearchInfo {
    pub depth: u32,
    pub seldepth: u32,
    pub nodes: u64,
    pub nps: u64,
    pub time_ms: u64,
    pub score: Score,
    pub pv: Vec<Move>,
    pub hashfull: u32,
    pub tb_hits: u64,
    /// 1-based line index; always 1 outside multi-PV mode.
    pub multipv: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestMove {
    /// None only when the root position has no legal move.
    pub best: Option<Move>,
    pub ponder: Option<Move>,
    pub score: Score,
}

/// Cancellation token; clones share one flag with the engine's searches.
#[derive(Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[derive(Debug)]
pub struct Engine {
    board: Board,
    tables: &'static MagicTables,
    tt: TranspositionTable,
    ctx: SearchContext,
    pawn_cache: PawnHashTable,
    options: EngineOptions,
    stop: Arc<AtomicBool>,
}

impl Engine {
    pub fn new() -> Self {
        Engine::with_options(EngineOptions::default())
            .expect("default options are always valid")
    }

    pub fn with_options(options: EngineOptions) -> Result<Self, EngineError> {
        validate_options(&options)?;
        Ok(Engine {
            board: Board::new(),
            tables: magic_tables(),
            tt: TranspositionTable::new(options.hash_size_mb),
            ctx: SearchContext::new(),
            pawn_cache: PawnHashTable::new(),
            options,
            stop: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    pub fn set_options(&mut self, options: EngineOptions) -> Result<(), EngineError> {
        validate_options(&options)?;
        if options.hash_size_mb != self.options.hash_size_mb {
            self.tt.resize(options.hash_size_mb);
        }
        self.options = options;
        Ok(())
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    pub fn position(&self) -> &Board {
        &self.board
    }

    pub fn legal_moves(&mut self) -> Vec<Move> {
        let mut moves = MoveList::new();
        let mut scratch = MoveList::new();
        generate_legal(&mut self.board, self.tables, &mut moves, &mut scratch);
        moves.to_vec()
    }

    /// Terminal/draw classification of the current position.
    pub fn game_status(&mut self) -> crate::status::GameStatus {
        crate::status::position_status(&mut self.board, self.tables)
    }

    /// Load a position (FEN or "startpos") and replay a move history on
    /// top of it. Per-search heuristics reset; the TT survives.
    pub fn set_position(&mut self, fen: &str, moves: &[String]) -> Result<(), EngineError> {
        let mut board = if fen == STARTPOS {
            Board::new()
        } else {
            Board::from_str(fen)?
        };

        for (index, mv_str) in moves.iter().enumerate() {
            let Some(mv) = parse_uci_move(&mut board, self.tables, mv_str) else {
                return Err(EngineError::IllegalMove {
                    mv: mv_str.clone(),
                    index,
                });
            };
            make_move(&mut board, mv);
        }

        self.board = board;
        self.ctx.clear();
        Ok(())
    }

    /// Forget everything learned: table, heuristics, pawn cache.
    pub fn new_game(&mut self) {
        self.board = Board::new();
        self.tt.clear();
        self.ctx.clear();
        self.pawn_cache.clear();
        debug!("new game: caches cleared");
    }

    /// Blocking search. `emit` fires once per completed iteration in
    /// strictly increasing depth order; the returned `BestMove` is the
    /// final event of the analysis. A stop or timeout still yields the
    /// best move the search had settled on.
    pub fn analyze(&mut self, limit: SearchLimit, mut emit: impl FnMut(SearchInfo)) -> BestMove {
        self.stop.store(false, Ordering::Relaxed);

        let (outcome, ponder) = self.search_line(limit, 1, &[], &mut emit);
        let principal = BestMove {
            best: outcome.best_move,
            ponder,
            score: Score::from_internal(outcome.score),
        };

        // Multi-PV: rerun with the lines found so far banned at the root.
        let multi_pv = self.options.multi_pv.max(1);
        if let Some(first) = outcome.best_move {
            let mut excluded = vec![first];
            for line in 2..=multi_pv {
                if self.stop.load(Ordering::Relaxed) {
                    break;
                }
                let (extra, _) = self.search_line(limit, line, &excluded, &mut emit);
                match extra.best_move {
                    Some(mv) => excluded.push(mv),
                    None => break,
                }
            }
        }

        principal
    }

    /// One iterative-deepening run; returns its outcome and the ponder
    /// move (second entry of the deepest PV seen).
    fn search_line(
        &mut self,
        limit: SearchLimit,
        line: u32,
        excluded: &[Move],
        emit: &mut dyn FnMut(SearchInfo),
    ) -> (SearchOutcome, Option<Move>) {
        let mut searcher = Searcher::new(
            &mut self.board,
            self.tables,
            &mut self.tt,
            &mut self.ctx,
            &mut self.pawn_cache,
            TimeManager::new(limit),
            Arc::clone(&self.stop),
        );
        if !excluded.is_empty() {
            searcher.exclude_root_moves(excluded.to_vec());
        }

        let mut ponder = None;
        let outcome = searcher.run(&mut |report: SearchReport| {
            ponder = report.pv.get(1).copied();
            emit(to_info(&report, line));
        });
        (outcome, ponder)
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

fn validate_options(options: &EngineOptions) -> Result<(), EngineError> {
    if options.threads != 1 {
        return Err(EngineError::UnsupportedOption(format!(
            "threads = {} (single-threaded search only)",
            options.threads
        )));
    }
    if options.multi_pv == 0 {
        return Err(EngineError::UnsupportedOption("multiPV = 0".to_string()));
    }
    Ok(())
}

fn to_info(report: &SearchReport, multipv: u32) -> SearchInfo {
    let time_ms = report.elapsed.as_millis() as u64;
    let nps = if report.elapsed > Duration::ZERO {
        (report.nodes as f64 / report.elapsed.as_secs_f64()) as u64
    } else {
        0
    };
    SearchInfo {
        depth: report.depth,
        seldepth: report.seldepth,
        nodes: report.nodes,
        nps,
        time_ms,
        score: Score::from_internal(report.score),
        pv: report.pv.clone(),
        hashfull: report.hashfull,
        tb_hits: 0,
        multipv,
    }
}
