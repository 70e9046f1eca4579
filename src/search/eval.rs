//! Static evaluation. Every term is accumulated white-minus-black into
//! separate middlegame/endgame tallies, interpolated once by game phase,
//! then flipped to the side-to-move's perspective. Keeping the whole
//! function antisymmetric (no tempo term) is what makes the mirror laws in
//! the test suite exact.

use crate::bitboard::FILE_A;
use crate::board::{Board, Color, Piece};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::MagicTables;
use crate::search::pawns::PawnHashTable;
use crate::search::pesto;
use crate::utils::pop_lsb;

// Phase weights; opening total 24 per the tapered-eval convention.
const KNIGHT_PHASE: i32 = 1;
const BISHOP_PHASE: i32 = 1;
const ROOK_PHASE: i32 = 2;
const QUEEN_PHASE: i32 = 4;
const TOTAL_PHASE: i32 = 24;

const BISHOP_PAIR: (i32, i32) = (30, 42);

// Per-destination mobility weights.
const MOBILITY_WEIGHT: [i32; 4] = [4, 4, 3, 2]; // N, B, R, Q

// King safety, middlegame-tally only so it fades with the pieces.
const KING_SHIELD_BONUS: i32 = 12;
const KING_ZONE_ATTACK_WEIGHT: i32 = 14;
const KING_ZONE_ATTACK_CLIP: i32 = 6;
const KING_HALF_OPEN_FILE_PENALTY: i32 = -11;
const KING_OPEN_FILE_PENALTY: i32 = -17;

const LAZY_EVAL_MARGIN: i32 = 250;

#[inline(always)]
pub fn mirror_vert(sq: u8) -> usize {
    (sq ^ 56) as usize
}

fn piece_value(kind: Piece) -> (i32, i32) {
    match kind {
        Piece::Pawn => pesto::PAWN_VAL,
        Piece::Knight => pesto::KNIGHT_VAL,
        Piece::Bishop => pesto::BISHOP_VAL,
        Piece::Rook => pesto::ROOK_VAL,
        Piece::Queen => pesto::QUEEN_VAL,
        Piece::King => pesto::KING_VAL,
    }
}

fn piece_tables(kind: Piece) -> (&'static [i32; 64], &'static [i32; 64]) {
    match kind {
        Piece::Pawn => (&pesto::PAWN_TABLE.0, &pesto::PAWN_TABLE.1),
        Piece::Knight => (&pesto::KNIGHT_TABLE.0, &pesto::KNIGHT_TABLE.1),
        Piece::Bishop => (&pesto::BISHOP_TABLE.0, &pesto::BISHOP_TABLE.1),
        Piece::Rook => (&pesto::ROOK_TABLE.0, &pesto::ROOK_TABLE.1),
        Piece::Queen => (&pesto::QUEEN_TABLE.0, &pesto::QUEEN_TABLE.1),
        Piece::King => (&pesto::KING_TABLE.0, &pesto::KING_TABLE.1),
    }
}

/// 0 = opening, 24 = bare endgame.
pub fn game_phase(board: &Board) -> i32 {
    let count = |p: Piece| {
        (board.pieces(p, Color::White).count_ones() + board.pieces(p, Color::Black).count_ones())
            as i32
    };
    let present = count(Piece::Knight) * KNIGHT_PHASE
        + count(Piece::Bishop) * BISHOP_PHASE
        + count(Piece::Rook) * ROOK_PHASE
        + count(Piece::Queen) * QUEEN_PHASE;
    (TOTAL_PHASE - present).clamp(0, TOTAL_PHASE)
}

#[inline]
fn interpolate(mg: i32, eg: i32, phase: i32) -> i32 {
    (mg * (TOTAL_PHASE - phase) + eg * phase) / TOTAL_PHASE
}

/// Material + piece-square tallies, white minus black.
fn material_psqt(board: &Board) -> (i32, i32) {
    let mut mg = 0;
    let mut eg = 0;

    for &piece in &crate::board::ALL_PIECES {
        let (mg_val, eg_val) = piece_value(piece);
        let (mg_table, eg_table) = piece_tables(piece);

        let mut w = board.pieces(piece, Color::White);
        while w != 0 {
            let sq = pop_lsb(&mut w);
            // tables are laid out rank 8 first, so white mirrors
            let i = mirror_vert(sq);
            mg += mg_val + mg_table[i];
            eg += eg_val + eg_table[i];
        }

        let mut b = board.pieces(piece, Color::Black);
        while b != 0 {
            let sq = pop_lsb(&mut b) as usize;
            mg -= mg_val + mg_table[sq];
            eg -= eg_val + eg_table[sq];
        }
    }

    (mg, eg)
}

fn bishop_pair(board: &Board, color: Color) -> (i32, i32) {
    if board.pieces(Piece::Bishop, color).count_ones() >= 2 {
        BISHOP_PAIR
    } else {
        (0, 0)
    }
}

/// Weighted count of pseudo-legal destinations for N/B/R/Q.
fn mobility(board: &Board, tables: &MagicTables, color: Color) -> i32 {
    let friendly = board.occupancy(color);
    let occupied = board.occupied();
    let mut score = 0;

    for (i, piece) in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen]
        .into_iter()
        .enumerate()
    {
        let mut bb = board.pieces(piece, color);
        while bb != 0 {
            let sq = pop_lsb(&mut bb) as usize;
            let attacks = match piece {
                Piece::Knight => KNIGHT_ATTACKS[sq],
                Piece::Bishop => tables.bishop.get_attacks(sq, occupied),
                Piece::Rook => tables.rook.get_attacks(sq, occupied),
                _ => tables.queen_attacks(sq, occupied),
            };
            score += (attacks & !friendly).count_ones() as i32 * MOBILITY_WEIGHT[i];
        }
    }
    score
}

#[inline]
fn king_zone(king_sq: u8) -> u64 {
    let b = 1u64 << king_sq;
    let mut zone = b | KING_ATTACKS[king_sq as usize];
    zone |= match king_sq / 8 {
        // stretch the zone one rank toward the enemy so approach squares count
        0..=3 => zone << 8,
        _ => zone >> 8,
    };
    zone
}

/// Middlegame king safety for `color`: pawn shield, files around the king,
/// and enemy pieces bearing on the 3x3 zone (clipped so a dogpile does not
/// overflow the term).
fn king_safety(board: &Board, tables: &MagicTables, color: Color) -> i32 {
    let king_sq = board.king_square(color).index();
    let king_rank = king_sq / 8;
    let king_file = king_sq % 8;
    let us_pawns = board.pieces(Piece::Pawn, color);
    let them_pawns = board.pieces(Piece::Pawn, color.opposite());
    let mut score = 0;

    // Shield: the three squares directly in front of the king.
    let shield_rank: i32 = match color {
        Color::White => king_rank as i32 + 1,
        Color::Black => king_rank as i32 - 1,
    };
    if (0..8).contains(&shield_rank) {
        let lo = king_file.saturating_sub(1);
        let hi = (king_file + 1).min(7);
        for f in lo..=hi {
            let sq = shield_rank as u8 * 8 + f;
            if us_pawns & (1u64 << sq) != 0 {
                score += KING_SHIELD_BONUS;
            }
        }
    }

    // Open and half-open files touching the king.
    let lo = king_file.saturating_sub(1);
    let hi = (king_file + 1).min(7);
    for f in lo..=hi {
        let file = FILE_A << f;
        if us_pawns & file == 0 {
            score += if them_pawns & file == 0 {
                KING_OPEN_FILE_PENALTY
            } else {
                KING_HALF_OPEN_FILE_PENALTY
            };
        }
    }

    // Enemy pieces attacking the king zone.
    let zone = king_zone(king_sq);
    let occupied = board.occupied();
    let enemy = color.opposite();
    let mut attackers = 0;
    for piece in [Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen] {
        let mut bb = board.pieces(piece, enemy);
        while bb != 0 {
            let sq = pop_lsb(&mut bb) as usize;
            let attacks = match piece {
                Piece::Knight => KNIGHT_ATTACKS[sq],
                Piece::Bishop => tables.bishop.get_attacks(sq, occupied),
                Piece::Rook => tables.rook.get_attacks(sq, occupied),
                _ => tables.queen_attacks(sq, occupied),
            };
            if attacks & zone != 0 {
                attackers += 1;
            }
        }
    }
    score -= attackers.min(KING_ZONE_ATTACK_CLIP) * KING_ZONE_ATTACK_WEIGHT;

    score
}

/// Centipawn score from the side-to-move's perspective. The (alpha, beta)
/// window enables the lazy cutoff: when material + piece placement already
/// sits far outside the window, the positional terms cannot pull it back.
pub fn static_eval(
    board: &Board,
    tables: &MagicTables,
    pawn_cache: &mut PawnHashTable,
    alpha: i32,
    beta: i32,
) -> i32 {
    let sign = match board.side_to_move {
        Color::White => 1,
        Color::Black => -1,
    };
    let phase = game_phase(board);

    let (mut mg, mut eg) = material_psqt(board);

    let lazy = sign * interpolate(mg, eg, phase);
    if lazy - LAZY_EVAL_MARGIN >= beta || lazy + LAZY_EVAL_MARGIN <= alpha {
        return lazy;
    }

    let (wbp_mg, wbp_eg) = bishop_pair(board, Color::White);
    let (bbp_mg, bbp_eg) = bishop_pair(board, Color::Black);
    mg += wbp_mg - bbp_mg;
    eg += wbp_eg - bbp_eg;

    let (pawn_mg, pawn_eg) = pawn_cache.probe_or_compute(board);
    mg += pawn_mg;
    eg += pawn_eg;

    let mob = mobility(board, tables, Color::White) - mobility(board, tables, Color::Black);
    mg += mob;
    eg += mob;

    mg += king_safety(board, tables, Color::White) - king_safety(board, tables, Color::Black);

    sign * interpolate(mg, eg, phase)
}

/// Evaluation with a full window; used by tests and the façade.
pub fn evaluate(board: &Board, tables: &MagicTables, pawn_cache: &mut PawnHashTable) -> i32 {
    static_eval(board, tables, pawn_cache, -i32::MAX, i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::magic::magic_tables;
    use std::str::FromStr;

    fn eval_str(fen: &str) -> i32 {
        let b = Board::from_str(fen).unwrap();
        evaluate(&b, magic_tables(), &mut PawnHashTable::new())
    }

    #[test]
    fn startpos_is_level() {
        assert_eq!(eval_str("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"), 0);
    }

    #[test]
    fn side_to_move_flip_negates() {
        let fen_w = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let fen_b = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 2 3";
        assert_eq!(eval_str(fen_w), -eval_str(fen_b));
    }

    #[test]
    fn material_edge_shows_up() {
        // White is a queen up
        let score = eval_str("4k3/8/8/8/8/8/8/3QK3 w - - 0 1");
        assert!(score > 600, "queen-up eval too small: {}", score);
    }

    #[test]
    fn lazy_cutoff_agrees_in_close_positions() {
        let b = Board::new();
        let mut cache = PawnHashTable::new();
        let lazy = static_eval(&b, magic_tables(), &mut cache, -1000, 1000);
        let full = static_eval(&b, magic_tables(), &mut cache, -i32::MAX, i32::MAX);
        assert_eq!(lazy, full);
    }

    #[test]
    fn shielded_king_beats_naked_king() {
        let safe = eval_str("rnbq1rk1/pppp1ppp/8/8/8/8/PPPP1PPP/RNBQ1RK1 w - - 0 1");
        let bare = eval_str("rnbq1rk1/pppp1ppp/8/8/8/8/PPPP4/RNBQ1RK1 b - - 0 1");
        // `bare` is from black's perspective and black kept its shield
        assert!(bare > -safe, "shield term missing: safe={} bare={}", safe, bare);
    }

    #[test]
    fn bishop_pair_counts() {
        let pair = eval_str("4k3/8/8/8/8/8/8/2B1KB2 w - - 0 1");
        let knight_bishop = eval_str("4k3/8/8/8/8/8/8/2B1KN2 w - - 0 1");
        assert!(pair > knight_bishop - 50);
    }
}
