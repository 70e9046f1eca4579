//! Move-ordering scores. The staged picker realizes the same priority
//! ladder lazily; this module owns the scoring so both the picker and the
//! root sorter agree on it.

use crate::board::{Board, Piece};
use crate::moves::magic::MagicTables;
use crate::moves::types::Move;
use crate::search::context::{PrevMove, SearchContext};
use crate::search::see::SeeExt;

pub const TT_MOVE_SCORE: i32 = 10_000_000;
pub const GOOD_CAPTURE_BASE: i32 = 1_000_000;
pub const KILLER1_SCORE: i32 = 900_000;
pub const KILLER2_SCORE: i32 = 899_000;
pub const COUNTERMOVE_SCORE: i32 = 800_000;
pub const BAD_CAPTURE_BASE: i32 = -1_000_000;

/// Most-valuable-victim / least-valuable-attacker. Exchange-unit values
/// weighted so any victim difference dominates any attacker difference.
pub fn mvv_lva_score(mv: Move, board: &Board) -> i32 {
    if !mv.is_capture() {
        return 0;
    }
    if mv.is_en_passant() {
        // victim and attacker are both pawns
        return Piece::Pawn.value() * 10 - Piece::Pawn.attacker_value();
    }
    match board.piece_type_at(mv.to()) {
        Some(victim) => {
            let attacker = board
                .piece_type_at(mv.from())
                .map(|p| p.attacker_value())
                .unwrap_or(0);
            victim.value() * 10 - attacker
        }
        None => 0,
    }
}

/// Absolute score for one move, spec-tier layout: TT move, winning
/// captures, killers, countermove, quiet history, losing captures.
#[allow(clippy::too_many_arguments)]
pub fn score_move(
    board: &Board,
    tables: &MagicTables,
    ctx: &SearchContext,
    prev: Option<PrevMove>,
    killers: [Option<Move>; 2],
    hash_move: Option<Move>,
    mv: Move,
) -> i32 {
    if hash_move == Some(mv) {
        return TT_MOVE_SCORE;
    }

    if mv.is_capture() || mv.is_promotion() {
        let mvv = mvv_lva_score(mv, board);
        return if board.static_exchange_eval(mv, 0, tables) {
            GOOD_CAPTURE_BASE + mvv
        } else {
            BAD_CAPTURE_BASE + mvv
        };
    }

    if killers[0] == Some(mv) {
        return KILLER1_SCORE;
    }
    if killers[1] == Some(mv) {
        return KILLER2_SCORE;
    }
    if let Some(p) = prev
        && ctx.countermove(p) == Some(mv)
    {
        return COUNTERMOVE_SCORE;
    }

    let piece = board.piece_type_at(mv.from()).unwrap_or(Piece::Pawn);
    ctx.quiet_score(prev, piece, mv)
}

/// Sort a buffer best-first. Used at the root, where the whole list is in
/// hand anyway; the tree uses the staged picker instead.
#[allow(clippy::too_many_arguments)]
pub fn order_moves(
    moves: &mut [Move],
    board: &Board,
    tables: &MagicTables,
    ctx: &SearchContext,
    prev: Option<PrevMove>,
    killers: [Option<Move>; 2],
    hash_move: Option<Move>,
) {
    moves.sort_by_cached_key(|&mv| -score_move(board, tables, ctx, prev, killers, hash_move, mv));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::execute::generate_legal;
    use crate::moves::magic::magic_tables;
    use crate::moves::types::MoveList;
    use std::str::FromStr;

    #[test]
    fn mvv_lva_prefers_fat_victims_and_cheap_attackers() {
        let b = Board::from_str("4k3/8/3q4/2P5/8/3R4/8/4K3 w - - 0 1").unwrap();
        let mut moves = MoveList::new();
        let mut scratch = MoveList::new();
        let mut board = b.clone();
        generate_legal(&mut board, magic_tables(), &mut moves, &mut scratch);

        let pawn_takes_queen = *moves.iter().find(|m| m.to_uci() == "c5d6").unwrap();
        let rook_takes_queen = *moves.iter().find(|m| m.to_uci() == "d3d6").unwrap();
        assert!(mvv_lva_score(pawn_takes_queen, &b) > mvv_lva_score(rook_takes_queen, &b));
    }

    #[test]
    fn tt_move_outranks_everything() {
        let mut b = Board::from_str(
            "r1bqkbnr/pppp1ppp/2n5/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R w KQkq - 4 4",
        )
        .unwrap();
        let tables = magic_tables();
        let ctx = SearchContext::new();
        let mut moves = MoveList::new();
        let mut scratch = MoveList::new();
        generate_legal(&mut b, tables, &mut moves, &mut scratch);

        let quiet = *moves.iter().find(|m| m.to_uci() == "b1c3").unwrap();
        order_moves(&mut moves, &b, tables, &ctx, None, [None, None], Some(quiet));
        assert_eq!(moves[0], quiet);
    }

    #[test]
    fn winning_captures_beat_quiets_beat_losing_captures() {
        // exd5 trades pawns evenly; Qxd5 hangs the queen to c6xd5.
        let mut b =
            Board::from_str("4k3/8/2p5/3p4/4P3/8/8/3QK3 w - - 0 1").unwrap();
        let tables = magic_tables();
        let ctx = SearchContext::new();
        let mut moves = MoveList::new();
        let mut scratch = MoveList::new();
        generate_legal(&mut b, tables, &mut moves, &mut scratch);
        order_moves(&mut moves, &b, tables, &ctx, None, [None, None], None);

        let good_cap = moves.iter().position(|m| m.to_uci() == "e4d5").unwrap();
        let quiet = moves.iter().position(|m| m.to_uci() == "e1e2").unwrap();
        let bad_cap = moves.iter().position(|m| m.to_uci() == "d1d5").unwrap();
        assert!(good_cap < quiet);
        assert!(quiet < bad_cap);
    }
}
