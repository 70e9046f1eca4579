//! Pseudo-legal move generation. Moves produced here may leave the mover's
//! king in check; `execute::generate_legal` (or the picker's per-move
//! filter) applies the make/test/unmake legality screen. Capture and quiet
//! generation are split so the staged picker only pays for what it consumes.

use crate::bitboard::{RANK_1, RANK_2, RANK_7, RANK_8};
use crate::board::{Board, Color, Piece};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::MagicTables;
use crate::moves::pawn::{BLACK_PAWN_ATTACKS, WHITE_PAWN_ATTACKS};
use crate::moves::types::{
    CAPTURE, DOUBLE_PAWN_PUSH, EN_PASSANT, KINGSIDE_CASTLE, Move, MoveBuffer, QUEENSIDE_CASTLE,
    QUIET_MOVE,
};
use crate::square::Square;
use crate::utils::pop_lsb;

// Squares that must be empty between king and rook.
const WHITE_KINGSIDE_BETWEEN: u64 = 0x0000_0000_0000_0060;
const WHITE_QUEENSIDE_BETWEEN: u64 = 0x0000_0000_0000_000E;
const BLACK_KINGSIDE_BETWEEN: u64 = 0x6000_0000_0000_0000;
const BLACK_QUEENSIDE_BETWEEN: u64 = 0x0E00_0000_0000_0000;

const PROMOS: [Piece; 4] = [Piece::Queen, Piece::Rook, Piece::Bishop, Piece::Knight];

#[inline(always)]
fn push_targets(from: u8, mut targets: u64, enemy: u64, move_list: &mut impl MoveBuffer) {
    while targets != 0 {
        let to = pop_lsb(&mut targets);
        let flags = if (enemy >> to) & 1 != 0 {
            CAPTURE
        } else {
            QUIET_MOVE
        };
        move_list.push(Move::new(
            Square::from_index(from),
            Square::from_index(to),
            flags,
        ));
    }
}

#[inline(always)]
fn piece_attacks(piece: Piece, from: u8, blockers: u64, tables: &MagicTables) -> u64 {
    match piece {
        Piece::Knight => KNIGHT_ATTACKS[from as usize],
        Piece::Bishop => tables.bishop.get_attacks(from as usize, blockers),
        Piece::Rook => tables.rook.get_attacks(from as usize, blockers),
        Piece::Queen => tables.queen_attacks(from as usize, blockers),
        Piece::King => KING_ATTACKS[from as usize],
        Piece::Pawn => unreachable!("pawns have their own generator"),
    }
}

/// Knight, bishop, rook, queen and plain king moves in one sweep.
fn generate_piece_moves(
    board: &Board,
    tables: &MagicTables,
    captures: bool,
    quiets: bool,
    move_list: &mut impl MoveBuffer,
) {
    let color = board.side_to_move;
    let friendly = board.occupancy(color);
    let enemy_king = board.pieces(Piece::King, color.opposite());
    let enemy = board.opponent_occupancy(color) & !enemy_king;
    let blockers = board.occupied();
    let empty = !blockers;

    for piece in [
        Piece::Knight,
        Piece::Bishop,
        Piece::Rook,
        Piece::Queen,
        Piece::King,
    ] {
        let mut bb = board.pieces(piece, color);
        while bb != 0 {
            let from = pop_lsb(&mut bb);
            // the enemy king is never a capture target
            let attacks = piece_attacks(piece, from, blockers, tables) & !friendly & !enemy_king;
            let mut targets = 0u64;
            if captures {
                targets |= attacks & enemy;
            }
            if quiets {
                targets |= attacks & empty;
            }
            push_targets(from, targets, enemy, move_list);
        }
    }
}

fn generate_castles(board: &Board, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let king_bb = board.pieces(Piece::King, color);
    if king_bb == 0 {
        return;
    }
    let from = king_bb.trailing_zeros() as u8;
    let occ = board.occupied();

    let (home, ks_between, qs_between) = match color {
        Color::White => (4, WHITE_KINGSIDE_BETWEEN, WHITE_QUEENSIDE_BETWEEN),
        Color::Black => (60, BLACK_KINGSIDE_BETWEEN, BLACK_QUEENSIDE_BETWEEN),
    };
    // stray rights in a hand-written FEN must not invent castles
    if from != home {
        return;
    }

    // Attack checks on the king's path are the legality filter's job; only
    // rights and emptiness are pseudo-legal requirements.
    if board.has_kingside_castle(color) && occ & ks_between == 0 {
        move_list.push(Move::new(
            Square::from_index(from),
            Square::from_index(from + 2),
            KINGSIDE_CASTLE,
        ));
    }
    if board.has_queenside_castle(color) && occ & qs_between == 0 {
        move_list.push(Move::new(
            Square::from_index(from),
            Square::from_index(from - 2),
            QUEENSIDE_CASTLE,
        ));
    }
}

fn generate_pawn_captures(board: &Board, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let pawns = board.pieces(Piece::Pawn, color);
    let enemy = board.opponent_occupancy(color) & !board.pieces(Piece::King, color.opposite());

    // Rank the pawn promotes FROM, and the rank it lands on.
    let (promo_from_rank, promo_rank) = match color {
        Color::White => (RANK_7, RANK_8),
        Color::Black => (RANK_2, RANK_1),
    };

    let pawn_attacks = |sq: usize| -> u64 {
        match color {
            Color::White => WHITE_PAWN_ATTACKS[sq],
            Color::Black => BLACK_PAWN_ATTACKS[sq],
        }
    };

    // Plain captures.
    let mut attackers = pawns & !promo_from_rank;
    while attackers != 0 {
        let from = pop_lsb(&mut attackers);
        let mut targets = pawn_attacks(from as usize) & enemy & !promo_rank;
        while targets != 0 {
            let to = pop_lsb(&mut targets);
            move_list.push(Move::new(
                Square::from_index(from),
                Square::from_index(to),
                CAPTURE,
            ));
        }
    }

    // Capture-promotions: four moves per landing square.
    let mut promo_attackers = pawns & promo_from_rank;
    while promo_attackers != 0 {
        let from = pop_lsb(&mut promo_attackers);
        let mut targets = pawn_attacks(from as usize) & enemy & promo_rank;
        while targets != 0 {
            let to = pop_lsb(&mut targets);
            for &promo in PROMOS.iter() {
                move_list.push(Move::new_promotion(
                    Square::from_index(from),
                    Square::from_index(to),
                    promo,
                    true,
                ));
            }
        }
    }

    // En passant. The target square sits behind the captured pawn.
    if let Some(ep_sq) = board.en_passant {
        let ep = ep_sq.index();
        let cap_sq = match color {
            Color::White => ep - 8,
            Color::Black => ep + 8,
        };
        let enemy_pawns = board.pieces(Piece::Pawn, color.opposite());
        if enemy_pawns & (1u64 << cap_sq) != 0 {
            let mut atk = pawns;
            while atk != 0 {
                let from = pop_lsb(&mut atk);
                if pawn_attacks(from as usize) & (1u64 << ep) != 0 {
                    move_list.push(Move::new(
                        Square::from_index(from),
                        Square::from_index(ep),
                        EN_PASSANT,
                    ));
                }
            }
        }
    }
}

fn generate_pawn_pushes(board: &Board, promotions: bool, quiets: bool, move_list: &mut impl MoveBuffer) {
    let color = board.side_to_move;
    let pawns = board.pieces(Piece::Pawn, color);
    let empty = !board.occupied();

    let promo_rank = match color {
        Color::White => RANK_8,
        Color::Black => RANK_1,
    };

    let single_pushes = match color {
        Color::White => (pawns << 8) & empty,
        Color::Black => (pawns >> 8) & empty,
    };

    if quiets {
        let mut bb = single_pushes & !promo_rank;
        while bb != 0 {
            let to = pop_lsb(&mut bb);
            let from = match color {
                Color::White => to - 8,
                Color::Black => to + 8,
            };
            move_list.push(Move::new(
                Square::from_index(from),
                Square::from_index(to),
                QUIET_MOVE,
            ));
        }

        // Double pushes: both the stop square and the landing square empty.
        let double_pushes = match color {
            Color::White => ((pawns & RANK_2) << 8 & empty) << 8 & empty,
            Color::Black => ((pawns & RANK_7) >> 8 & empty) >> 8 & empty,
        };
        let mut bb = double_pushes;
        while bb != 0 {
            let to = pop_lsb(&mut bb);
            let from = match color {
                Color::White => to - 16,
                Color::Black => to + 16,
            };
            move_list.push(Move::new(
                Square::from_index(from),
                Square::from_index(to),
                DOUBLE_PAWN_PUSH,
            ));
        }
    }

    if promotions {
        let mut bb = single_pushes & promo_rank;
        while bb != 0 {
            let to = pop_lsb(&mut bb);
            let from = match color {
                Color::White => to - 8,
                Color::Black => to + 8,
            };
            for &promo in PROMOS.iter() {
                move_list.push(Move::new_promotion(
                    Square::from_index(from),
                    Square::from_index(to),
                    promo,
                    false,
                ));
            }
        }
    }
}

/// All pseudo-legal moves for the side to move.
pub fn generate_pseudo_legal(board: &Board, tables: &MagicTables, moves: &mut impl MoveBuffer) {
    moves.clear();
    generate_pawn_captures(board, moves);
    generate_pawn_pushes(board, true, true, moves);
    generate_piece_moves(board, tables, true, true, moves);
    generate_castles(board, moves);
}

/// Captures, en passant, and promotions only (quiescence fodder).
pub fn generate_pseudo_legal_captures(
    board: &Board,
    tables: &MagicTables,
    moves: &mut impl MoveBuffer,
) {
    generate_pawn_captures(board, moves);
    generate_pawn_pushes(board, true, false, moves);
    generate_piece_moves(board, tables, true, false, moves);
}

/// Quiet moves only: pushes, piece moves to empty squares, castling.
pub fn generate_pseudo_legal_quiets(
    board: &Board,
    tables: &MagicTables,
    moves: &mut impl MoveBuffer,
) {
    generate_pawn_pushes(board, false, true, moves);
    generate_piece_moves(board, tables, false, true, moves);
    generate_castles(board, moves);
}
