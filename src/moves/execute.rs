//! Make / unmake. `make_move` mutates the board and returns the undo
//! record; `undo_move` restores every field bit-for-bit, including both
//! Zobrist digests (which the undo record carries outright rather than
//! re-deriving).

use crate::board::castle_bits::*;
use crate::board::{Board, Color, EMPTY_SQ, Piece};
use crate::hash::zobrist::{ep_file_to_hash, xor_castling_rights_delta, zobrist_keys};
use crate::moves::magic::MagicTables;
use crate::moves::movegen::generate_pseudo_legal;
use crate::moves::square_control::{in_check, is_legal_castling};
use crate::moves::types::{Move, MoveBuffer, NullUndo, Undo};
use crate::square::Square;

/// Castling rook displacement keyed by the king's destination.
#[inline(always)]
fn rook_castle_squares(king_to: u8) -> Option<(Square, Square)> {
    match king_to {
        6 => Some((Square::from_index(7), Square::from_index(5))), // white O-O
        2 => Some((Square::from_index(0), Square::from_index(3))), // white O-O-O
        62 => Some((Square::from_index(63), Square::from_index(61))), // black O-O
        58 => Some((Square::from_index(56), Square::from_index(59))), // black O-O-O
        _ => None,
    }
}

/// Right lost when a rook leaves (or is captured on) a home corner.
#[inline(always)]
fn rights_mask_for_rook_square(color: Color, rook_sq: u8) -> u8 {
    match (color, rook_sq) {
        (Color::White, 0) => CASTLE_WQ,
        (Color::White, 7) => CASTLE_WK,
        (Color::Black, 56) => CASTLE_BQ,
        (Color::Black, 63) => CASTLE_BK,
        _ => 0,
    }
}

#[inline(always)]
fn remove_piece(board: &mut Board, color: Color, piece: Piece, idx: usize) {
    let bb = board.bb(color, piece) & !(1u64 << idx);
    board.set_bb(color, piece, bb);
}

#[inline(always)]
fn place_piece(board: &mut Board, color: Color, piece: Piece, idx: usize) {
    let bb = board.bb(color, piece) | (1u64 << idx);
    board.set_bb(color, piece, bb);
}

pub fn make_move(board: &mut Board, mv: Move) -> Undo {
    let prev_zobrist = board.zobrist;
    let prev_pawn_key = board.pawn_key;
    let color = board.side_to_move;
    let from_idx = mv.from().index() as usize;
    let to_idx = mv.to().index() as usize;

    let occupant = board.piece_on_sq[from_idx];
    assert!(occupant != EMPTY_SQ, "make_move from an empty square");
    let moved = Piece::from_u8(occupant & 0b111);

    let prev_en_passant = board.en_passant;

    // Retire the old en-passant file from the hash before anything moves.
    if let Some(f) = ep_file_to_hash(board) {
        board.zobrist ^= zobrist_keys().ep_file[f as usize];
    }
    board.en_passant = None;

    // Capture removal. The en-passant victim sits behind the landing square.
    let capture = if mv.is_en_passant() {
        let cap_sq = match color {
            Color::White => to_idx - 8,
            Color::Black => to_idx + 8,
        };
        remove_piece(board, color.opposite(), Piece::Pawn, cap_sq);
        Some((color.opposite(), Piece::Pawn, Square::from_index(cap_sq as u8)))
    } else {
        let occupant = board.piece_on_sq[to_idx];
        if occupant != EMPTY_SQ {
            let cap_color = Color::from_u8(occupant >> 3);
            let cap_piece = Piece::from_u8(occupant & 0b111);
            remove_piece(board, cap_color, cap_piece, to_idx);
            Some((cap_color, cap_piece, mv.to()))
        } else {
            None
        }
    };

    let mut undo = Undo {
        moved,
        color,
        capture,
        castling_rook: None,
        prev_castling_rights: board.castling_rights,
        prev_en_passant,
        prev_halfmove_clock: board.halfmove_clock,
        prev_fullmove_number: board.fullmove_number,
        prev_zobrist,
        prev_pawn_key,
        prev_history: None,
    };

    if mv.is_castling() {
        undo.castling_rook = rook_castle_squares(to_idx as u8);
    }

    // New en-passant target, only on a double push.
    if mv.is_double_pawn_push() {
        let ep_sq = match color {
            Color::White => from_idx + 8,
            Color::Black => from_idx - 8,
        };
        board.en_passant = Some(Square::from_index(ep_sq as u8));
    }

    // Castling-rights updates: king move clears both for the mover, rook
    // moves and rook captures clear the matching side.
    let old_rights = board.castling_rights;
    let mut mask_to_clear = 0u8;
    if moved == Piece::King {
        mask_to_clear |= match color {
            Color::White => CASTLE_WK | CASTLE_WQ,
            Color::Black => CASTLE_BK | CASTLE_BQ,
        };
    }
    if moved == Piece::Rook {
        mask_to_clear |= rights_mask_for_rook_square(color, mv.from().index());
    }
    if let Some((cap_color, cap_piece, cap_sq)) = capture
        && cap_piece == Piece::Rook
    {
        mask_to_clear |= rights_mask_for_rook_square(cap_color, cap_sq.index());
    }
    let new_rights = old_rights & !mask_to_clear;
    if new_rights != old_rights {
        board.castling_rights = new_rights;
        xor_castling_rights_delta(&mut board.zobrist, zobrist_keys(), old_rights, new_rights);
    }

    // Move the piece, substituting on promotion.
    remove_piece(board, color, moved, from_idx);
    match mv.promotion() {
        Some(promo) => place_piece(board, color, promo, to_idx),
        None => place_piece(board, color, moved, to_idx),
    }

    if let Some((rook_from, rook_to)) = undo.castling_rook {
        remove_piece(board, color, Piece::Rook, rook_from.index() as usize);
        place_piece(board, color, Piece::Rook, rook_to.index() as usize);
    }

    // Clocks.
    if capture.is_some() || moved == Piece::Pawn {
        board.halfmove_clock = 0;
    } else {
        board.halfmove_clock += 1;
    }
    if color == Color::Black {
        board.fullmove_number += 1;
    }

    // Flip the side to move, then admit the new en-passant file if it is
    // actually capturable by the new mover.
    board.side_to_move = color.opposite();
    board.zobrist ^= zobrist_keys().side_to_move;
    if let Some(f) = ep_file_to_hash(board) {
        board.zobrist ^= zobrist_keys().ep_file[f as usize];
    }

    // Repetition history: irreversible moves start a fresh run; the undo
    // record keeps the old run so unmake can put it back.
    let irreversible = capture.is_some() || moved == Piece::Pawn;
    if irreversible {
        undo.prev_history = Some(std::mem::take(&mut board.history));
    }
    board.history.push(prev_zobrist);

    #[cfg(any(debug_assertions, feature = "paranoid_hash"))]
    board.assert_hash();

    undo
}

pub fn undo_move(board: &mut Board, mv: Move, undo: Undo) {
    board.side_to_move = undo.color;
    board.castling_rights = undo.prev_castling_rights;
    board.en_passant = undo.prev_en_passant;
    board.halfmove_clock = undo.prev_halfmove_clock;
    board.fullmove_number = undo.prev_fullmove_number;

    let from_idx = mv.from().index() as usize;
    let to_idx = mv.to().index() as usize;

    match mv.promotion() {
        Some(promo) => {
            remove_piece(board, undo.color, promo, to_idx);
            place_piece(board, undo.color, Piece::Pawn, from_idx);
        }
        None => {
            remove_piece(board, undo.color, undo.moved, to_idx);
            place_piece(board, undo.color, undo.moved, from_idx);
        }
    }

    if let Some((cap_color, cap_piece, cap_sq)) = undo.capture {
        place_piece(board, cap_color, cap_piece, cap_sq.index() as usize);
    }

    if let Some((rook_from, rook_to)) = undo.castling_rook {
        remove_piece(board, undo.color, Piece::Rook, rook_to.index() as usize);
        place_piece(board, undo.color, Piece::Rook, rook_from.index() as usize);
    }

    // The digests are restored wholesale; set_bb above scrambled them.
    board.zobrist = undo.prev_zobrist;
    board.pawn_key = undo.prev_pawn_key;

    board.history.pop();
    if let Some(prev) = undo.prev_history {
        board.history = prev;
    }

    #[cfg(any(debug_assertions, feature = "paranoid_hash"))]
    board.assert_hash();
}

/// Pass the turn. Illegal while in check; the caller (null-move pruning)
/// guarantees that.
pub fn make_null(board: &mut Board) -> NullUndo {
    let undo = NullUndo {
        prev_en_passant: board.en_passant,
        prev_zobrist: board.zobrist,
    };

    if let Some(f) = ep_file_to_hash(board) {
        board.zobrist ^= zobrist_keys().ep_file[f as usize];
    }
    board.en_passant = None;
    board.side_to_move = board.side_to_move.opposite();
    board.zobrist ^= zobrist_keys().side_to_move;

    undo
}

pub fn undo_null(board: &mut Board, undo: NullUndo) {
    board.side_to_move = board.side_to_move.opposite();
    board.en_passant = undo.prev_en_passant;
    board.zobrist = undo.prev_zobrist;
}

/// Pseudo-legal generation followed by the make/test/unmake legality
/// screen; castling additionally checks the king's path.
pub fn generate_legal(
    board: &mut Board,
    tables: &MagicTables,
    moves: &mut impl MoveBuffer,
    scratch: &mut impl MoveBuffer,
) {
    scratch.clear();
    generate_pseudo_legal(board, tables, scratch);
    moves.clear();

    for i in 0..scratch.len() {
        let mv = scratch[i];
        if is_legal_move(board, mv, tables) {
            moves.push(mv);
        }
    }
}

/// Whether a pseudo-legal move leaves its own king safe.
#[inline]
pub fn is_legal_move(board: &mut Board, mv: Move, tables: &MagicTables) -> bool {
    if mv.is_castling() && !is_legal_castling(board, mv, tables) {
        return false;
    }
    let mover = board.side_to_move;
    let undo = make_move(board, mv);
    let illegal = in_check(board, mover, tables);
    undo_move(board, mv, undo);
    !illegal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::magic_tables;
    use crate::moves::types::MoveList;
    use std::str::FromStr;

    fn find(board: &mut Board, uci: &str) -> Move {
        let tables = magic_tables();
        let mut moves = MoveList::new();
        let mut scratch = MoveList::new();
        generate_legal(board, tables, &mut moves, &mut scratch);
        *moves
            .iter()
            .find(|m| m.to_uci() == uci)
            .unwrap_or_else(|| panic!("move {} not legal here", uci))
    }

    #[test]
    fn make_undo_restores_everything() {
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut b = Board::from_str(fen).unwrap();
        let before = b.clone();

        for uci in ["e5g6", "e1g1", "e1c1", "d5e6", "a2a4"] {
            let mv = find(&mut b, uci);
            let undo = make_move(&mut b, mv);
            assert_ne!(b.zobrist, before.zobrist);
            undo_move(&mut b, mv, undo);
            assert_eq!(b, before, "state not restored after {}", uci);
        }
    }

    #[test]
    fn en_passant_removes_the_bypassed_pawn() {
        let mut b = Board::from_str("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let mv = find(&mut b, "e5d6");
        assert!(mv.is_en_passant());
        let undo = make_move(&mut b, mv);
        assert_eq!(b.pieces(Piece::Pawn, Color::Black), 0);
        assert!(b.piece_at(Square::from_str("d6").unwrap()).is_some());
        undo_move(&mut b, mv, undo);
        assert_eq!(b.to_fen(), "4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
    }

    #[test]
    fn castling_moves_the_rook_too() {
        let mut b = Board::from_str("4k3/8/8/8/8/8/8/4K2R w K - 0 1").unwrap();
        let mv = find(&mut b, "e1g1");
        let undo = make_move(&mut b, mv);
        assert_eq!(
            b.piece_at(Square::from_str("f1").unwrap()),
            Some((Color::White, Piece::Rook))
        );
        assert_eq!(b.castling_rights, 0);
        undo_move(&mut b, mv, undo);
        assert_eq!(b.castling_rights, CASTLE_WK);
    }

    #[test]
    fn rook_capture_clears_opponent_right() {
        let mut b = Board::from_str("r3k3/8/8/8/8/8/8/R3K3 w Qq - 0 1").unwrap();
        let mv = find(&mut b, "a1a8");
        let undo = make_move(&mut b, mv);
        assert_eq!(b.castling_rights, 0);
        undo_move(&mut b, mv, undo);
        assert_eq!(b.castling_rights, CASTLE_WQ | CASTLE_BQ);
    }

    #[test]
    fn clocks_reset_on_pawn_moves_and_captures() {
        let mut b = Board::from_str("4k3/8/8/3p4/4P3/8/8/3QK3 w - - 7 12").unwrap();
        let mv = find(&mut b, "e4d5");
        make_move(&mut b, mv);
        assert_eq!(b.halfmove_clock, 0);

        let mut b = Board::from_str("4k3/8/8/8/8/8/8/3QK3 w - - 7 12").unwrap();
        let mv = find(&mut b, "d1d2");
        make_move(&mut b, mv);
        assert_eq!(b.halfmove_clock, 8);
    }

    #[test]
    fn null_move_round_trips() {
        let mut b = Board::from_str("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let before = b.clone();
        let undo = make_null(&mut b);
        assert_eq!(b.side_to_move, Color::Black);
        assert_eq!(b.en_passant, None);
        assert_ne!(b.zobrist, before.zobrist);
        undo_null(&mut b, undo);
        assert_eq!(b, before);
    }

    #[test]
    fn history_truncates_on_irreversible_and_restores() {
        let mut b = Board::new();
        let m1 = find(&mut b, "g1f3");
        let u1 = make_move(&mut b, m1);
        assert_eq!(b.history.len(), 1);
        let m2 = find(&mut b, "g8f6");
        let _u2 = make_move(&mut b, m2);
        assert_eq!(b.history.len(), 2);

        // A pawn move wipes the run.
        let m3 = find(&mut b, "e2e4");
        let u3 = make_move(&mut b, m3);
        assert_eq!(b.history.len(), 1);

        undo_move(&mut b, m3, u3);
        assert_eq!(b.history.len(), 2);
        let _ = u1;
    }
}
