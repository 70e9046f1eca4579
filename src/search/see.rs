//! Static exchange evaluation: resolve the capture sequence on a square
//! with both sides always committing their least valuable attacker, and
//! report whether the mover clears `threshold` centipawns.
//!
//! The sequence is recorded as a ladder of victim values and resolved
//! backwards; at each rung the side to move may decline the recapture, so
//! the concession passed down is never negative. X-ray attackers are
//! picked up by re-scanning the sliders after each capture removes a
//! piece from the occupancy.

use arrayvec::ArrayVec;

use crate::bitboard::BitboardExt;
use crate::board::{ALL_PIECES, Board, Color, Piece};
use crate::moves::king::KING_ATTACKS;
use crate::moves::knight::KNIGHT_ATTACKS;
use crate::moves::magic::MagicTables;
use crate::moves::pawn::pawn_attacks;
use crate::moves::types::Move;

// SEE works in classic exchange units, not the tapered eval values.
fn exchange_value(p: Piece) -> i32 {
    match p {
        Piece::Pawn => 100,
        Piece::Knight => 320,
        Piece::Bishop => 330,
        Piece::Rook => 500,
        Piece::Queen => 900,
        Piece::King => 20000,
    }
}

pub trait SeeExt {
    /// True when the exchange beginning with `m` nets at least `threshold`.
    fn static_exchange_eval(&self, m: Move, threshold: i32, tables: &MagicTables) -> bool;
    fn attackers_to_square(&self, square: u8, occupancy: u64, tables: &MagicTables) -> u64;
    fn least_valuable_attacker(&self, attackers: u64, side: Color) -> Option<(u8, Piece)>;
}

impl SeeExt for Board {
    /// Every piece of either color bearing on `square` under `occupancy`.
    fn attackers_to_square(&self, square: u8, occupancy: u64, tables: &MagicTables) -> u64 {
        let sq = square as usize;
        let both = |p: Piece| self.pieces(p, Color::White) | self.pieces(p, Color::Black);

        let mut attackers = 0u64;
        // a pawn attacks the square if a pawn of the *opposite* color
        // standing there would attack it back
        attackers |= pawn_attacks(square, Color::Black) & self.pieces(Piece::Pawn, Color::White);
        attackers |= pawn_attacks(square, Color::White) & self.pieces(Piece::Pawn, Color::Black);
        attackers |= KNIGHT_ATTACKS[sq] & both(Piece::Knight);
        attackers |= KING_ATTACKS[sq] & both(Piece::King);

        let queens = both(Piece::Queen);
        attackers |= tables.bishop.get_attacks(sq, occupancy) & (both(Piece::Bishop) | queens);
        attackers |= tables.rook.get_attacks(sq, occupancy) & (both(Piece::Rook) | queens);

        attackers & occupancy
    }

    fn least_valuable_attacker(&self, attackers: u64, side: Color) -> Option<(u8, Piece)> {
        let mine = attackers & self.occupancy(side);
        if mine == 0 {
            return None;
        }
        ALL_PIECES.into_iter().find_map(|piece| {
            let subset = mine & self.pieces(piece, side);
            (subset != 0).then(|| (subset.lsb(), piece))
        })
    }

    fn static_exchange_eval(&self, m: Move, threshold: i32, tables: &MagicTables) -> bool {
        let target = m.to().index();

        // What the move wins outright, before any reply.
        let mut lead = if m.is_en_passant() {
            exchange_value(Piece::Pawn)
        } else {
            match self.piece_type_at(m.to()) {
                Some(victim) => exchange_value(victim),
                // a quiet non-promotion never gains material, so only a
                // non-positive bar can be met
                None if m.promotion().is_none() => return threshold <= 0,
                None => 0,
            }
        };
        if let Some(p) = m.promotion() {
            lead += exchange_value(p) - exchange_value(Piece::Pawn);
        }
        // Even an uncontested capture falls short: done.
        if lead < threshold {
            return false;
        }

        // What is standing on the target square, waiting to be recaptured.
        let mut standing = match m.promotion() {
            Some(p) => exchange_value(p),
            None => match self.piece_type_at(m.from()) {
                Some(p) => exchange_value(p),
                None => return false,
            },
        };

        let mut occupancy = self.occupied() & !m.from().bb();
        if m.is_en_passant() {
            // the bypassed pawn leaves a hole in the occupancy too
            let bypass = match self.side_to_move {
                Color::White => target - 8,
                Color::Black => target + 8,
            };
            occupancy &= !(1u64 << bypass);
        }

        // Ladder of victim values: entry 0 is the forced opening capture,
        // every later entry is the piece standing when that side fires.
        let mut victims: ArrayVec<i32, 32> = ArrayVec::new();
        victims.push(lead);

        let mut hitters = self.attackers_to_square(target, occupancy, tables);
        let mut side = self.side_to_move.opposite();

        while let Some((attacker_sq, attacker)) = self.least_valuable_attacker(hitters, side) {
            if victims.is_full() {
                break;
            }
            victims.push(standing);
            standing = exchange_value(attacker);

            occupancy &= !(1u64 << attacker_sq);
            // the vacated square may reveal a slider lined up behind it
            hitters = self.attackers_to_square(target, occupancy, tables);
            side = side.opposite();
        }

        // Resolve from the tail: each recapture is optional, so a side
        // never concedes more than zero.
        let mut concession = 0;
        for &victim in victims.iter().skip(1).rev() {
            concession = (victim - concession).max(0);
        }

        victims[0] - concession >= threshold
    }
}
