//! Iterative-deepening principal-variation search: negamax with alpha-beta,
//! transposition cutoffs, null-move and futility-family pruning, staged move
//! ordering, late-move reductions, and a capture-only quiescence at the
//! leaves. One `Searcher` drives one analysis on one thread; cancellation
//! arrives through an atomic flag polled on a coarse node cadence.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use arrayvec::ArrayVec;

use crate::MAX_PLY;
use crate::board::{Board, Piece};
use crate::moves::execute::{generate_legal, make_move, make_null, undo_move, undo_null};
use crate::moves::magic::MagicTables;
use crate::moves::square_control::in_check;
use crate::moves::types::{Move, MoveList};
use crate::search::context::{PrevMove, SearchContext};
use crate::search::eval::static_eval;
use crate::search::ordering::order_moves;
use crate::search::pawns::PawnHashTable;
use crate::search::picker::MovePicker;
use crate::search::see::SeeExt;
use crate::search::time::TimeManager;
use crate::search::tt::{Bound, MATE_SCORE, MATE_THRESHOLD, TranspositionTable};
use crate::status::is_insufficient_material;

pub const INF: i32 = 32_000;

// How often the stop flag, the clock and the node budget are polled.
const STOP_CHECK_MASK: u64 = 2047;

// Reverse futility pruning.
const RFP_MAX_DEPTH: i32 = 8;
const RFP_MARGIN_PER_DEPTH: i32 = 90;

// Razoring.
const RAZOR_MAX_DEPTH: i32 = 3;
const RAZOR_BASE: i32 = 200;
const RAZOR_PER_DEPTH: i32 = 150;

// Null move.
const NMP_MIN_DEPTH: i32 = 3;

// Late move pruning.
const LMP_MAX_DEPTH: i32 = 8;

// Futility.
const FUTILITY_MAX_DEPTH: i32 = 6;
const FUTILITY_BASE: i32 = 100;
const FUTILITY_PER_DEPTH: i32 = 120;

// SEE pruning of captures in the main tree.
const SEE_PRUNE_MAX_DEPTH: i32 = 6;
const SEE_PRUNE_PER_DEPTH: i32 = 80;

// Extensions along one root-to-leaf path are capped to stop explosions.
const MAX_EXTENSIONS: i32 = 16;

// Aspiration windows.
const ASPIRATION_MIN_DEPTH: u32 = 5;
const ASPIRATION_DELTA: i32 = 50;
const ASPIRATION_MAX_FAILS: u32 = 3;

// Delta pruning in quiescence.
const DELTA_MARGIN: i32 = 200;

/// One completed iteration, as handed to the façade's emit callback.
#[derive(Debug, Clone)]
pub struct SearchReport {
    pub depth: u32,
    pub seldepth: u32,
    pub score: i32,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: Vec<Move>,
    pub hashfull: u32,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u32,
    pub nodes: u64,
}

pub struct Searcher<'a> {
    board: &'a mut Board,
    tables: &'static MagicTables,
    tt: &'a mut TranspositionTable,
    ctx: &'a mut SearchContext,
    pawn_cache: &'a mut PawnHashTable,
    time: TimeManager,
    stop: Arc<AtomicBool>,

    nodes: u64,
    seldepth: u32,
    aborted: bool,
    /// Move that led to each ply, for countermove / continuation lookups.
    stack: Vec<Option<PrevMove>>,
    root_exclusions: Vec<Move>,
    /// Best root move of the iteration in flight, legal even when the very
    /// first depth is interrupted.
    partial_best: Option<Move>,
}

impl<'a> Searcher<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        board: &'a mut Board,
        tables: &'static MagicTables,
        tt: &'a mut TranspositionTable,
        ctx: &'a mut SearchContext,
        pawn_cache: &'a mut PawnHashTable,
        time: TimeManager,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Searcher {
            board,
            tables,
            tt,
            ctx,
            pawn_cache,
            time,
            stop,
            nodes: 0,
            seldepth: 0,
            aborted: false,
            stack: vec![None; MAX_PLY + 1],
            root_exclusions: Vec::new(),
            partial_best: None,
        }
    }

    /// Root moves to ignore; multi-PV re-searches pass the lines already
    /// found.
    pub fn exclude_root_moves(&mut self, moves: Vec<Move>) {
        self.root_exclusions = moves;
    }

    /// Iterative deepening. `emit` fires once per completed iteration, in
    /// strictly increasing depth order.
    pub fn run(&mut self, emit: &mut dyn FnMut(SearchReport)) -> SearchOutcome {
        self.tt.new_search();

        let mut root_moves = MoveList::new();
        let mut scratch = MoveList::new();
        generate_legal(self.board, self.tables, &mut root_moves, &mut scratch);
        root_moves.retain(|m| !self.root_exclusions.contains(m));

        let mut best_move: Option<Move> = root_moves.first().copied();
        let mut best_score = 0;
        let mut completed_depth = 0;

        if root_moves.is_empty() {
            // Checkmate or stalemate at the root (or every move excluded
            // by a multi-PV re-search, which reports nothing).
            let score = if in_check(self.board, self.board.side_to_move, self.tables) {
                -MATE_SCORE
            } else {
                0
            };
            if self.root_exclusions.is_empty() {
                emit(SearchReport {
                    depth: 0,
                    seldepth: 0,
                    score,
                    nodes: 0,
                    elapsed: self.time.elapsed(),
                    pv: Vec::new(),
                    hashfull: self.tt.hashfull(),
                });
            }
            return SearchOutcome {
                best_move: None,
                score,
                depth: 0,
                nodes: 0,
            };
        }

        for depth in 1..=self.time.depth_limit {
            let (score, mv) = self.aspiration(depth, best_score);
            if self.aborted {
                break;
            }

            completed_depth = depth;
            best_score = score;
            if mv.is_some() {
                best_move = mv;
            }

            emit(SearchReport {
                depth,
                seldepth: self.seldepth,
                score: best_score,
                nodes: self.nodes,
                elapsed: self.time.elapsed(),
                pv: self.extract_pv(depth, best_move),
                hashfull: self.tt.hashfull(),
            });

            // A forced mate will not improve with depth.
            if best_score.abs() >= MATE_THRESHOLD {
                break;
            }
            if depth >= 4 && self.time.should_stop_soft() {
                break;
            }
        }

        if best_move.is_none() {
            best_move = self.partial_best.or_else(|| root_moves.first().copied());
        }

        SearchOutcome {
            best_move,
            score: best_score,
            depth: completed_depth,
            nodes: self.nodes,
        }
    }

    /// Aspiration wrapper around the root search: a narrow window seeded by
    /// the previous iteration, widened on failure, full-width as a last
    /// resort.
    fn aspiration(&mut self, depth: u32, prev_score: i32) -> (i32, Option<Move>) {
        let mut alpha = -INF;
        let mut beta = INF;
        let mut delta = ASPIRATION_DELTA;
        let mut fails = 0;

        if depth >= ASPIRATION_MIN_DEPTH {
            alpha = prev_score - delta;
            beta = prev_score + delta;
        }

        loop {
            let (score, mv) = self.search_root(depth as i32, alpha, beta);
            if self.aborted {
                return (score, mv);
            }

            if score <= alpha {
                fails += 1;
                delta *= 2;
                alpha = if fails > ASPIRATION_MAX_FAILS { -INF } else { score - delta };
            } else if score >= beta {
                fails += 1;
                delta *= 2;
                beta = if fails > ASPIRATION_MAX_FAILS { INF } else { score + delta };
            } else {
                return (score, mv);
            }
        }
    }

    fn search_root(&mut self, depth: i32, mut alpha: i32, beta: i32) -> (i32, Option<Move>) {
        let mut moves = MoveList::new();
        let mut scratch = MoveList::new();
        generate_legal(self.board, self.tables, &mut moves, &mut scratch);
        moves.retain(|m| !self.root_exclusions.contains(m));

        let hash_move = self.tt.probe_move(self.board.zobrist);
        order_moves(
            &mut moves,
            self.board,
            self.tables,
            self.ctx,
            None,
            self.ctx.killers_at(0),
            hash_move,
        );

        let original_alpha = alpha;
        let mut best_score = -INF;
        let mut best_move = None;

        for (i, &mv) in moves.iter().enumerate() {
            let moved = self.board.piece_type_at(mv.from()).unwrap_or(Piece::Pawn);
            let undo = make_move(self.board, mv);
            self.stack[1] = Some(PrevMove { piece: moved, mv });

            let gives_check = in_check(self.board, self.board.side_to_move, self.tables);
            let ext = i32::from(gives_check);

            let score = if i == 0 {
                -self.negamax(depth - 1 + ext, -beta, -alpha, 1, true, true, ext)
            } else {
                let mut s =
                    -self.negamax(depth - 1 + ext, -alpha - 1, -alpha, 1, false, true, ext);
                if s > alpha && s < beta && !self.aborted {
                    s = -self.negamax(depth - 1 + ext, -beta, -alpha, 1, true, true, ext);
                }
                s
            };

            undo_move(self.board, mv, undo);
            if self.aborted {
                return (best_score, best_move);
            }

            if score > best_score {
                best_score = score;
                best_move = Some(mv);
                self.partial_best = Some(mv);
                if score > alpha {
                    alpha = score;
                }
            }
            if alpha >= beta {
                break;
            }
        }

        let bound = if best_score >= beta {
            Bound::Lower
        } else if best_score > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt
            .store(self.board.zobrist, best_move, best_score, depth as u8, bound, 0);

        (best_score, best_move)
    }

    #[allow(clippy::too_many_arguments)]
    fn negamax(
        &mut self,
        mut depth: i32,
        mut alpha: i32,
        mut beta: i32,
        ply: usize,
        is_pv: bool,
        allow_null: bool,
        ext_total: i32,
    ) -> i32 {
        self.nodes += 1;
        if self.nodes & STOP_CHECK_MASK == 0 {
            self.check_abort();
        }
        if self.aborted {
            return 0;
        }
        self.seldepth = self.seldepth.max(ply as u32);

        // Draws are recognized before anything is probed or generated.
        if self.board.halfmove_clock >= 100
            || self.board.is_repetition()
            || is_insufficient_material(self.board)
        {
            return 0;
        }
        if ply >= MAX_PLY - 1 {
            return static_eval(self.board, self.tables, self.pawn_cache, alpha, beta);
        }

        // Transposition probe; the stored move seeds ordering even when the
        // score cannot cut.
        let key = self.board.zobrist;
        let mut hash_move = None;
        if let Some(entry) = self.tt.probe(key, ply as i32) {
            hash_move = entry.best_move;
            if entry.depth as i32 >= depth {
                let score = entry.score as i32;
                match entry.bound {
                    Bound::Exact => return score,
                    Bound::Lower if score >= beta => return score,
                    Bound::Upper if score <= alpha => return score,
                    _ => {}
                }
            }
        }

        // Mate-distance pruning: even a forced mate from here cannot beat
        // a shorter one already found.
        alpha = alpha.max(-MATE_SCORE + ply as i32);
        beta = beta.min(MATE_SCORE - ply as i32);
        if alpha >= beta {
            return alpha;
        }

        let in_check_now = in_check(self.board, self.board.side_to_move, self.tables);

        if depth <= 0 && !in_check_now {
            return self.qsearch(alpha, beta, ply);
        }
        depth = depth.max(1);

        let eval = if in_check_now {
            -INF
        } else {
            static_eval(self.board, self.tables, self.pawn_cache, alpha, beta)
        };

        if !is_pv && !in_check_now {
            // Reverse futility: statically so far above beta that the
            // margin cannot be eroded at this depth.
            if depth <= RFP_MAX_DEPTH
                && beta.abs() < MATE_THRESHOLD
                && eval - RFP_MARGIN_PER_DEPTH * depth >= beta
            {
                return eval;
            }

            // Razoring: hopelessly below alpha, verify with quiescence.
            if depth <= RAZOR_MAX_DEPTH && eval + RAZOR_BASE + RAZOR_PER_DEPTH * depth < alpha {
                let score = self.qsearch(alpha, beta, ply);
                if score < alpha || self.aborted {
                    return score;
                }
            }
        }

        // Null move: hand over the turn; if the opponent still cannot reach
        // beta the real position is safely above it. Skipped without
        // non-pawn material (zugzwang) and on mate-bound windows.
        if !is_pv
            && allow_null
            && !in_check_now
            && depth >= NMP_MIN_DEPTH
            && beta.abs() < MATE_THRESHOLD
            && eval >= beta
            && self.board.has_nonpawn_material(self.board.side_to_move)
        {
            let r = if depth >= 6 { 3 } else { 2 };
            let undo = make_null(self.board);
            self.stack[ply + 1] = None;
            let score = -self.negamax(depth - 1 - r, -beta, -beta + 1, ply + 1, false, false, ext_total);
            undo_null(self.board, undo);
            if self.aborted {
                return 0;
            }
            if score >= beta && score < MATE_THRESHOLD {
                return beta;
            }
        }

        // Internal iterative deepening / reduction when ordering has no
        // seed from the table.
        if hash_move.is_none() && depth >= 4 {
            if is_pv {
                self.negamax(depth - 2, alpha, beta, ply, true, allow_null, ext_total);
                if self.aborted {
                    return 0;
                }
                hash_move = self.tt.probe_move(key);
            } else {
                depth -= 1;
            }
        }

        let prev = self.stack[ply];
        let countermove = prev.and_then(|p| self.ctx.countermove(p));
        let mut picker = MovePicker::new(hash_move, self.ctx.killers_at(ply), countermove, false);

        let original_alpha = alpha;
        let mut best_score = -INF;
        let mut best_move: Option<Move> = None;
        let mut move_count = 0usize;
        let mut tried_quiets: ArrayVec<(Piece, Move), 64> = ArrayVec::new();

        while let Some(mv) = picker.next(self.board, self.tables, self.ctx, prev) {
            let quiet = mv.is_quiet();

            // Shallow per-move pruning, never on the first move and never
            // while in check or chasing a mate bound.
            if !is_pv && !in_check_now && move_count > 0 && best_score > -MATE_THRESHOLD {
                if quiet && depth <= LMP_MAX_DEPTH {
                    let lmp_threshold = (3 + 6 * depth) as usize;
                    if move_count >= lmp_threshold {
                        picker.skip_remaining_quiets();
                        continue;
                    }
                }
                if quiet
                    && depth <= FUTILITY_MAX_DEPTH
                    && eval + FUTILITY_BASE + FUTILITY_PER_DEPTH * depth <= alpha
                {
                    continue;
                }
                if mv.is_capture()
                    && depth <= SEE_PRUNE_MAX_DEPTH
                    && !self
                        .board
                        .static_exchange_eval(mv, -SEE_PRUNE_PER_DEPTH * depth, self.tables)
                {
                    continue;
                }
            }

            let moved = self.board.piece_type_at(mv.from()).unwrap_or(Piece::Pawn);
            let undo = make_move(self.board, mv);
            self.stack[ply + 1] = Some(PrevMove { piece: moved, mv });

            let gives_check = in_check(self.board, self.board.side_to_move, self.tables);

            // Extensions: checks, recaptures on the parent's capture
            // square, and pawns reaching the seventh, under a path budget.
            let mut ext = 0;
            if ext_total < MAX_EXTENSIONS {
                if gives_check {
                    ext = 1;
                } else if mv.is_capture()
                    && prev.is_some_and(|p| p.mv.is_capture() && p.mv.to() == mv.to())
                {
                    ext = 1;
                } else if moved == Piece::Pawn {
                    let rel_rank = match undo.color {
                        crate::board::Color::White => mv.to().rank(),
                        crate::board::Color::Black => 7 - mv.to().rank(),
                    };
                    if rel_rank == 6 {
                        ext = 1;
                    }
                }
            }

            let is_killer = self.ctx.killers_at(ply).contains(&Some(mv));

            let score = if move_count == 0 {
                -self.negamax(
                    depth - 1 + ext,
                    -beta,
                    -alpha,
                    ply + 1,
                    is_pv,
                    true,
                    ext_total + ext,
                )
            } else {
                // Late-move reductions feed the null-window probe of PVS;
                // anything tactical or already extended runs full length.
                let mut r = 0;
                if ext == 0
                    && quiet
                    && !in_check_now
                    && !gives_check
                    && !is_killer
                    && depth >= 3
                    && move_count >= 3
                {
                    r = 1;
                    if move_count >= 6 && depth >= 6 {
                        r = 2;
                    }
                    if is_pv {
                        r -= 1;
                    }
                    r = r.clamp(0, depth - 2);
                }

                let mut s = -self.negamax(
                    depth - 1 - r + ext,
                    -alpha - 1,
                    -alpha,
                    ply + 1,
                    false,
                    true,
                    ext_total + ext,
                );
                if s > alpha && r > 0 && !self.aborted {
                    s = -self.negamax(
                        depth - 1 + ext,
                        -alpha - 1,
                        -alpha,
                        ply + 1,
                        false,
                        true,
                        ext_total + ext,
                    );
                }
                if s > alpha && s < beta && is_pv && !self.aborted {
                    s = -self.negamax(
                        depth - 1 + ext,
                        -beta,
                        -alpha,
                        ply + 1,
                        true,
                        true,
                        ext_total + ext,
                    );
                }
                s
            };

            undo_move(self.board, mv, undo);
            if self.aborted {
                return 0;
            }

            move_count += 1;

            if score > best_score {
                best_score = score;
                if score > alpha {
                    alpha = score;
                    best_move = Some(mv);
                }
                if score >= beta {
                    if quiet {
                        self.ctx
                            .on_quiet_cutoff(ply, depth, prev, moved, mv, &tried_quiets);
                    }
                    self.tt
                        .store(key, Some(mv), beta, depth as u8, Bound::Lower, ply as i32);
                    return beta;
                }
            }

            if quiet && !tried_quiets.is_full() {
                tried_quiets.push((moved, mv));
            }
        }

        if move_count == 0 {
            return if in_check_now {
                -MATE_SCORE + ply as i32
            } else {
                0
            };
        }

        let bound = if best_score > original_alpha {
            Bound::Exact
        } else {
            Bound::Upper
        };
        self.tt
            .store(key, best_move, best_score, depth as u8, bound, ply as i32);

        best_score
    }

    /// Captures-and-promotions horizon extension. In check every evasion is
    /// searched instead, so mates on the horizon are not missed.
    fn qsearch(&mut self, mut alpha: i32, beta: i32, ply: usize) -> i32 {
        self.nodes += 1;
        if self.nodes & STOP_CHECK_MASK == 0 {
            self.check_abort();
        }
        if self.aborted {
            return 0;
        }
        self.seldepth = self.seldepth.max(ply as u32);

        if ply >= MAX_PLY - 1 {
            return static_eval(self.board, self.tables, self.pawn_cache, alpha, beta);
        }

        let in_check_now = in_check(self.board, self.board.side_to_move, self.tables);

        if in_check_now {
            // Full evasion search; no stand-pat while the king hangs.
            let mut moves = MoveList::new();
            let mut scratch = MoveList::new();
            generate_legal(self.board, self.tables, &mut moves, &mut scratch);
            if moves.is_empty() {
                return -MATE_SCORE + ply as i32;
            }
            order_moves(
                &mut moves,
                self.board,
                self.tables,
                self.ctx,
                self.stack[ply],
                self.ctx.killers_at(ply),
                None,
            );

            for &mv in moves.iter() {
                let moved = self.board.piece_type_at(mv.from()).unwrap_or(Piece::Pawn);
                let undo = make_move(self.board, mv);
                self.stack[ply + 1] = Some(PrevMove { piece: moved, mv });
                let score = -self.qsearch(-beta, -alpha, ply + 1);
                undo_move(self.board, mv, undo);
                if self.aborted {
                    return 0;
                }
                if score >= beta {
                    return beta;
                }
                if score > alpha {
                    alpha = score;
                }
            }
            return alpha;
        }

        let stand_pat = static_eval(self.board, self.tables, self.pawn_cache, alpha, beta);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        // Whole-node delta pruning: even winning a queen cannot lift this.
        if stand_pat + Piece::Queen.value() + DELTA_MARGIN < alpha {
            return alpha;
        }

        let mut picker = MovePicker::new(None, [None, None], None, true);
        while let Some(mv) = picker.next(self.board, self.tables, self.ctx, self.stack[ply]) {
            // Per-capture delta pruning; promotions swing too much to prune.
            if !mv.is_promotion() {
                let victim = if mv.is_en_passant() {
                    Piece::Pawn.value()
                } else {
                    self.board
                        .piece_type_at(mv.to())
                        .map(|p| p.value())
                        .unwrap_or(0)
                };
                if stand_pat + victim + DELTA_MARGIN < alpha {
                    continue;
                }
            }

            let moved = self.board.piece_type_at(mv.from()).unwrap_or(Piece::Pawn);
            let undo = make_move(self.board, mv);
            self.stack[ply + 1] = Some(PrevMove { piece: moved, mv });
            let score = -self.qsearch(-beta, -alpha, ply + 1);
            undo_move(self.board, mv, undo);
            if self.aborted {
                return 0;
            }

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }

    fn check_abort(&mut self) {
        if self.stop.load(Ordering::Relaxed) {
            self.aborted = true;
            return;
        }
        if self.time.should_stop_hard() {
            self.aborted = true;
            return;
        }
        if let Some(limit) = self.time.node_limit
            && self.nodes >= limit
        {
            self.aborted = true;
        }
    }

    /// Walk TT best moves from the root to rebuild the principal
    /// variation. Each step is validated against the legal move list, so a
    /// corrupted or recycled entry can only truncate the line.
    fn extract_pv(&mut self, depth: u32, first: Option<Move>) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut undos = Vec::new();

        let mut next = first.or_else(|| self.tt.probe_move(self.board.zobrist));
        while let Some(mv) = next {
            if pv.len() >= depth as usize {
                break;
            }
            let mut legal = MoveList::new();
            let mut scratch = MoveList::new();
            generate_legal(self.board, self.tables, &mut legal, &mut scratch);
            if !legal.contains(&mv) {
                break;
            }
            undos.push((mv, make_move(self.board, mv)));
            pv.push(mv);
            next = self.tt.probe_move(self.board.zobrist);
        }

        while let Some((mv, undo)) = undos.pop() {
            undo_move(self.board, mv, undo);
        }
        pv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::magic_tables;
    use crate::search::time::SearchLimit;
    use std::str::FromStr;

    fn search_to_depth(fen: &str, depth: u32) -> (SearchOutcome, Vec<SearchReport>) {
        let mut board = Board::from_str(fen).unwrap();
        let mut tt = TranspositionTable::new(16);
        let mut ctx = SearchContext::new();
        let mut pawns = PawnHashTable::new();
        let mut searcher = Searcher::new(
            &mut board,
            magic_tables(),
            &mut tt,
            &mut ctx,
            &mut pawns,
            TimeManager::new(SearchLimit::Depth(depth)),
            Arc::new(AtomicBool::new(false)),
        );
        let mut reports = Vec::new();
        let outcome = searcher.run(&mut |r| reports.push(r));
        (outcome, reports)
    }

    #[test]
    fn finds_mate_in_one() {
        let (outcome, _) = search_to_depth("6k1/5ppp/8/8/8/8/5PPP/4Q1K1 w - - 0 1", 4);
        assert_eq!(outcome.best_move.unwrap().to_uci(), "e1e8");
        assert_eq!(outcome.score, MATE_SCORE - 1);
    }

    #[test]
    fn finds_mate_in_one_as_black() {
        let (outcome, _) = search_to_depth("4q1k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1", 4);
        assert_eq!(outcome.best_move.unwrap().to_uci(), "e8e1");
        assert_eq!(outcome.score, MATE_SCORE - 1);
    }

    #[test]
    fn stalemate_at_root_scores_zero() {
        let (outcome, reports) = search_to_depth("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", 4);
        assert_eq!(outcome.best_move, None);
        assert_eq!(outcome.score, 0);
        assert_eq!(reports.len(), 1);
    }

    #[test]
    fn reports_strictly_increasing_depths() {
        let (_, reports) = search_to_depth(
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
            5,
        );
        let depths: Vec<u32> = reports.iter().map(|r| r.depth).collect();
        for pair in depths.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        for report in &reports {
            assert!(!report.pv.is_empty());
        }
    }

    #[test]
    fn search_is_deterministic_from_clean_state() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";
        let (a, _) = search_to_depth(fen, 5);
        let (b, _) = search_to_depth(fen, 5);
        assert_eq!(a.best_move, b.best_move);
        assert_eq!(a.score, b.score);
        assert_eq!(a.nodes, b.nodes);
    }

    #[test]
    fn node_limit_aborts_early() {
        let mut board = Board::new();
        let mut tt = TranspositionTable::new(4);
        let mut ctx = SearchContext::new();
        let mut pawns = PawnHashTable::new();
        let mut searcher = Searcher::new(
            &mut board,
            magic_tables(),
            &mut tt,
            &mut ctx,
            &mut pawns,
            TimeManager::new(SearchLimit::Nodes(5_000)),
            Arc::new(AtomicBool::new(false)),
        );
        let outcome = searcher.run(&mut |_| {});
        assert!(outcome.best_move.is_some());
        assert!(outcome.nodes < 200_000);
    }
}
