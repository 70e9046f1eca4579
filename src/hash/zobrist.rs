//! Zobrist key tables. Keys are generated once from a fixed seed so hashes
//! are identical across runs and platforms; the search's determinism
//! guarantee depends on this.

use crate::bitboard::{FILE_A, FILE_H};
use crate::board::castle_bits::*;
use crate::board::{Board, Color, Piece};
use once_cell::sync::OnceCell;
use rand::{RngCore, SeedableRng, rngs::StdRng};

const ZOBRIST_SEED: u64 = 0xD1CE_BA11_5EED_2024;

pub struct ZobristKeys {
    /// [color][piece][square], {White=0, Black=1} x {P,N,B,R,Q,K}.
    pub piece: [[[u64; 64]; 6]; 2],
    pub side_to_move: u64,
    /// [0]=K, [1]=Q, [2]=k, [3]=q.
    pub castling: [u64; 4],
    /// En-passant file a..h.
    pub ep_file: [u64; 8],
}

pub fn zobrist_keys() -> &'static ZobristKeys {
    static KEYS: OnceCell<ZobristKeys> = OnceCell::new();
    KEYS.get_or_init(|| generate_keys(StdRng::seed_from_u64(ZOBRIST_SEED)))
}

fn generate_keys(mut rng: StdRng) -> ZobristKeys {
    #[inline]
    fn non_zero(r: &mut StdRng) -> u64 {
        // zero keys would make distinct states collide trivially
        let mut v = r.next_u64();
        while v == 0 {
            v = r.next_u64();
        }
        v
    }

    let mut keys = ZobristKeys {
        piece: [[[0u64; 64]; 6]; 2],
        side_to_move: 0,
        castling: [0u64; 4],
        ep_file: [0u64; 8],
    };

    for c in 0..2 {
        for p in 0..6 {
            for sq in 0..64 {
                keys.piece[c][p][sq] = non_zero(&mut rng);
            }
        }
    }
    for i in 0..4 {
        keys.castling[i] = non_zero(&mut rng);
    }
    for f in 0..8 {
        keys.ep_file[f] = non_zero(&mut rng);
    }
    keys.side_to_move = non_zero(&mut rng);

    keys
}

/// XOR the castling keys whose bits differ between `old` and `new_`.
#[inline]
pub fn xor_castling_rights_delta(hash: &mut u64, keys: &ZobristKeys, old: u8, new_: u8) {
    let d = old ^ new_;
    if d & CASTLE_WK != 0 {
        *hash ^= keys.castling[0];
    }
    if d & CASTLE_WQ != 0 {
        *hash ^= keys.castling[1];
    }
    if d & CASTLE_BK != 0 {
        *hash ^= keys.castling[2];
    }
    if d & CASTLE_BQ != 0 {
        *hash ^= keys.castling[3];
    }
}

/// Returns Some(file 0..7) when the en-passant square should contribute to
/// the hash this ply: only if the side to move actually has a pawn that
/// could capture onto it (pseudo-legally; pins are ignored). Positions that
/// differ only by an uncapturable ep target would otherwise hash apart.
pub fn ep_file_to_hash(board: &Board) -> Option<u8> {
    let ep = board.en_passant?;
    let s = ep.index();

    let r = s / 8;
    if r != 2 && r != 5 {
        return None;
    }

    let bb_s: u64 = 1u64 << s;
    let has_capturing_pawn = match board.side_to_move {
        Color::White => {
            let src_ne = (bb_s >> 9) & !FILE_H;
            let src_nw = (bb_s >> 7) & !FILE_A;
            ((src_ne | src_nw) & board.bb(Color::White, Piece::Pawn)) != 0
        }
        Color::Black => {
            let src_se = (bb_s << 7) & !FILE_A;
            let src_sw = (bb_s << 9) & !FILE_H;
            ((src_se | src_sw) & board.bb(Color::Black, Piece::Pawn)) != 0
        }
    };

    has_capturing_pawn.then_some(s % 8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn keys_are_deterministic() {
        let a = generate_keys(StdRng::seed_from_u64(ZOBRIST_SEED));
        let b = generate_keys(StdRng::seed_from_u64(ZOBRIST_SEED));
        assert_eq!(a.piece[0][0][0], b.piece[0][0][0]);
        assert_eq!(a.side_to_move, b.side_to_move);
        assert_eq!(a.ep_file, b.ep_file);
    }

    #[test]
    fn ep_contributes_only_when_capturable() {
        // Black pawn just double-pushed d5; white e5 pawn can take it.
        let capturable = Board::from_str("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(ep_file_to_hash(&capturable), Some(3));

        // Same target but no white pawn adjacent.
        let idle = Board::from_str("4k3/8/8/3p4/8/8/8/4K3 w - d6 0 1").unwrap();
        assert_eq!(ep_file_to_hash(&idle), None);
    }

    #[test]
    fn castling_delta_is_symmetric() {
        let keys = zobrist_keys();
        let mut h = 0u64;
        xor_castling_rights_delta(&mut h, keys, 0b1111, 0b0101);
        xor_castling_rights_delta(&mut h, keys, 0b0101, 0b1111);
        assert_eq!(h, 0);
    }
}
