//! Staged move picker: moves are generated and scored lazily so a node
//! that cuts off on the hash move or a capture never pays for quiet
//! generation.
//!
//! Stage order: HashMove -> GoodCaptures -> Killer1 -> Killer2 ->
//! Countermove -> Quiets -> BadCaptures.

use crate::board::{Board, Color, Piece};
use crate::moves::execute::is_legal_move;
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::MagicTables;
use crate::moves::movegen::{generate_pseudo_legal_captures, generate_pseudo_legal_quiets};
use crate::moves::pawn::{BLACK_PAWN_ATTACKS, WHITE_PAWN_ATTACKS};
use crate::moves::types::Move;
use crate::search::context::{PrevMove, SearchContext};
use crate::search::ordering::mvv_lva_score;
use crate::search::see::SeeExt;
use arrayvec::ArrayVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    HashMove,
    GenerateCaptures,
    GoodCaptures,
    Killer1,
    Killer2,
    Countermove,
    GenerateQuiets,
    Quiets,
    BadCaptures,
    Done,
}

pub struct MovePicker {
    stage: Stage,

    good_captures: ArrayVec<Move, 96>,
    good_capture_scores: ArrayVec<i32, 96>,
    bad_captures: ArrayVec<Move, 96>,
    quiets: ArrayVec<Move, 256>,
    quiet_scores: ArrayVec<i32, 256>,

    good_cap_idx: usize,
    quiet_idx: usize,
    bad_cap_idx: usize,

    hash_move: Option<Move>,
    killers: [Option<Move>; 2],
    countermove: Option<Move>,

    captures_only: bool,
}

impl MovePicker {
    pub fn new(
        hash_move: Option<Move>,
        killers: [Option<Move>; 2],
        countermove: Option<Move>,
        captures_only: bool,
    ) -> Self {
        MovePicker {
            stage: Stage::HashMove,
            good_captures: ArrayVec::new(),
            good_capture_scores: ArrayVec::new(),
            bad_captures: ArrayVec::new(),
            quiets: ArrayVec::new(),
            quiet_scores: ArrayVec::new(),
            good_cap_idx: 0,
            quiet_idx: 0,
            bad_cap_idx: 0,
            hash_move,
            killers,
            countermove,
            captures_only,
        }
    }

    /// Late-move pruning hook: stop serving quiet moves, keep the losing
    /// captures coming.
    pub fn skip_remaining_quiets(&mut self) {
        if matches!(self.stage, Stage::Killer1 | Stage::Killer2 | Stage::Countermove
            | Stage::GenerateQuiets | Stage::Quiets)
        {
            self.stage = Stage::BadCaptures;
        }
    }

    #[inline]
    fn is_hash_move(&self, mv: Move) -> bool {
        self.hash_move == Some(mv)
    }

    #[inline]
    fn already_served(&self, mv: Move) -> bool {
        self.is_hash_move(mv)
            || self.killers[0] == Some(mv)
            || self.killers[1] == Some(mv)
            || self.countermove == Some(mv)
    }

    fn generate_and_classify_captures(&mut self, board: &Board, tables: &MagicTables) {
        let mut captures: ArrayVec<Move, 128> = ArrayVec::new();
        generate_pseudo_legal_captures(board, tables, &mut captures);

        for mv in captures {
            if self.is_hash_move(mv) {
                continue;
            }
            let mvv = mvv_lva_score(mv, board);
            if board.static_exchange_eval(mv, 0, tables) {
                self.good_captures.push(mv);
                self.good_capture_scores.push(mvv);
            } else {
                self.bad_captures.push(mv);
            }
        }
    }

    fn generate_and_score_quiets(
        &mut self,
        board: &Board,
        tables: &MagicTables,
        ctx: &SearchContext,
        prev: Option<PrevMove>,
    ) {
        generate_pseudo_legal_quiets(board, tables, &mut self.quiets);
        for mv in &self.quiets {
            let piece = board.piece_type_at(mv.from()).unwrap_or(Piece::Pawn);
            self.quiet_scores.push(ctx.quiet_score(prev, piece, *mv));
        }
    }

    /// Selection-sort step over `moves[start..]` by `scores`.
    fn pick_best(
        moves: &mut [Move],
        scores: &mut [i32],
        start: &mut usize,
    ) -> Option<Move> {
        if *start >= moves.len() {
            return None;
        }
        let mut best = *start;
        for i in (*start + 1)..moves.len() {
            if scores[i] > scores[best] {
                best = i;
            }
        }
        moves.swap(*start, best);
        scores.swap(*start, best);
        let mv = moves[*start];
        *start += 1;
        Some(mv)
    }

    /// The next legal move, best-first, or None when exhausted.
    pub fn next(
        &mut self,
        board: &mut Board,
        tables: &MagicTables,
        ctx: &SearchContext,
        prev: Option<PrevMove>,
    ) -> Option<Move> {
        loop {
            match self.stage {
                Stage::HashMove => {
                    self.stage = Stage::GenerateCaptures;
                    if let Some(hm) = self.hash_move
                        && is_pseudo_legal(board, hm, tables)
                        && is_legal_move(board, hm, tables)
                    {
                        return Some(hm);
                    }
                }

                Stage::GenerateCaptures => {
                    self.generate_and_classify_captures(board, tables);
                    self.stage = Stage::GoodCaptures;
                }

                Stage::GoodCaptures => {
                    while let Some(mv) = Self::pick_best(
                        &mut self.good_captures,
                        &mut self.good_capture_scores,
                        &mut self.good_cap_idx,
                    ) {
                        if is_legal_move(board, mv, tables) {
                            return Some(mv);
                        }
                    }
                    // quiescence never looks at losing captures at all
                    self.stage = if self.captures_only {
                        Stage::Done
                    } else {
                        Stage::Killer1
                    };
                }

                Stage::Killer1 => {
                    self.stage = Stage::Killer2;
                    if let Some(k) = self.killers[0]
                        && !k.is_capture()
                        && !self.is_hash_move(k)
                        && is_pseudo_legal(board, k, tables)
                        && is_legal_move(board, k, tables)
                    {
                        return Some(k);
                    }
                }

                Stage::Killer2 => {
                    self.stage = Stage::Countermove;
                    if let Some(k) = self.killers[1]
                        && !k.is_capture()
                        && !self.is_hash_move(k)
                        && self.killers[0] != Some(k)
                        && is_pseudo_legal(board, k, tables)
                        && is_legal_move(board, k, tables)
                    {
                        return Some(k);
                    }
                }

                Stage::Countermove => {
                    self.stage = Stage::GenerateQuiets;
                    if let Some(cm) = self.countermove
                        && !cm.is_capture()
                        && !self.is_hash_move(cm)
                        && self.killers[0] != Some(cm)
                        && self.killers[1] != Some(cm)
                        && is_pseudo_legal(board, cm, tables)
                        && is_legal_move(board, cm, tables)
                    {
                        return Some(cm);
                    }
                }

                Stage::GenerateQuiets => {
                    self.generate_and_score_quiets(board, tables, ctx, prev);
                    self.stage = Stage::Quiets;
                }

                Stage::Quiets => {
                    while let Some(mv) = Self::pick_best(
                        &mut self.quiets,
                        &mut self.quiet_scores,
                        &mut self.quiet_idx,
                    ) {
                        if self.already_served(mv) {
                            continue;
                        }
                        if is_legal_move(board, mv, tables) {
                            return Some(mv);
                        }
                    }
                    self.stage = Stage::BadCaptures;
                }

                Stage::BadCaptures => {
                    while self.bad_cap_idx < self.bad_captures.len() {
                        let mv = self.bad_captures[self.bad_cap_idx];
                        self.bad_cap_idx += 1;
                        if is_legal_move(board, mv, tables) {
                            return Some(mv);
                        }
                    }
                    self.stage = Stage::Done;
                }

                Stage::Done => return None,
            }
        }
    }
}

/// Could the move generator have produced `mv` in this position? Table
/// moves (hash, killers, countermove) come from other positions and must
/// be re-validated before they are trusted.
pub fn is_pseudo_legal(board: &Board, mv: Move, tables: &MagicTables) -> bool {
    let color = board.side_to_move;
    let from_idx = mv.from().index() as usize;
    let to_idx = mv.to().index() as usize;
    let from_bb = 1u64 << from_idx;
    let to_bb = 1u64 << to_idx;

    let Some((piece_color, piece)) = board.piece_at(mv.from()) else {
        return false;
    };
    if piece_color != color {
        return false;
    }

    // Never onto a friendly piece or the enemy king.
    if board.occupancy(color) & to_bb != 0 {
        return false;
    }
    if board.pieces(Piece::King, color.opposite()) & to_bb != 0 {
        return false;
    }

    let enemy = board.opponent_occupancy(color);
    if mv.is_capture() && !mv.is_en_passant() && enemy & to_bb == 0 {
        return false;
    }
    if !mv.is_capture() && enemy & to_bb != 0 {
        return false;
    }

    match piece {
        Piece::Pawn => {
            let attacks = match color {
                Color::White => WHITE_PAWN_ATTACKS[from_idx],
                Color::Black => BLACK_PAWN_ATTACKS[from_idx],
            };

            if mv.is_en_passant() {
                match board.en_passant {
                    Some(ep) if ep.index() as usize == to_idx => attacks & to_bb != 0,
                    _ => false,
                }
            } else if mv.is_capture() {
                attacks & to_bb != 0 && promo_rank_consistent(mv, color)
            } else {
                let empty = !board.occupied();
                let (push, double_rank): (i32, u64) = match color {
                    Color::White => (8, crate::bitboard::RANK_2),
                    Color::Black => (-8, crate::bitboard::RANK_7),
                };
                if mv.is_double_pawn_push() {
                    let mid = (from_idx as i32 + push) as usize;
                    from_bb & double_rank != 0
                        && to_idx as i32 == from_idx as i32 + 2 * push
                        && empty & (1u64 << mid) != 0
                        && empty & to_bb != 0
                } else {
                    to_idx as i32 == from_idx as i32 + push
                        && empty & to_bb != 0
                        && promo_rank_consistent(mv, color)
                }
            }
        }
        Piece::Knight => KNIGHT_ATTACKS[from_idx] & to_bb != 0,
        Piece::Bishop => tables.bishop.get_attacks(from_idx, board.occupied()) & to_bb != 0,
        Piece::Rook => tables.rook.get_attacks(from_idx, board.occupied()) & to_bb != 0,
        Piece::Queen => tables.queen_attacks(from_idx, board.occupied()) & to_bb != 0,
        Piece::King => {
            if mv.is_castling() {
                let occ = board.occupied();
                let home = match color {
                    Color::White => 4usize,
                    Color::Black => 60,
                };
                if from_idx != home {
                    return false;
                }
                if mv.is_kingside_castle() {
                    let between = match color {
                        Color::White => 0x0000_0000_0000_0060u64,
                        Color::Black => 0x6000_0000_0000_0000,
                    };
                    board.has_kingside_castle(color) && occ & between == 0
                } else {
                    let between = match color {
                        Color::White => 0x0000_0000_0000_000Eu64,
                        Color::Black => 0x0E00_0000_0000_0000,
                    };
                    board.has_queenside_castle(color) && occ & between == 0
                }
            } else {
                KING_ATTACKS[from_idx] & to_bb != 0
            }
        }
    }
}

/// A pawn move to the last rank must carry a promotion flag and vice versa.
#[inline]
fn promo_rank_consistent(mv: Move, color: Color) -> bool {
    let last_rank = match color {
        Color::White => 7,
        Color::Black => 0,
    };
    (mv.to().rank() == last_rank) == mv.is_promotion()
}
