//! Startup construction of the magic tables: relevant-occupancy masks,
//! exhaustive blocker enumeration per square, magic-number search, and the
//! final attack table fill.

use super::attacks::{bishop_attacks_per_square, rook_attacks_per_square};
use super::search::find_magic_number_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Rook relevant-occupancy mask: the rays without the board edges (an edge
/// square never shadows anything beyond it).
fn rook_mask(square: usize) -> u64 {
    let rank = square / 8;
    let file = square % 8;
    let mut mask = 0u64;

    for r in (rank + 1)..7 {
        mask |= 1u64 << (r * 8 + file);
    }
    for r in 1..rank {
        mask |= 1u64 << (r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= 1u64 << (rank * 8 + f);
    }
    for f in 1..file {
        mask |= 1u64 << (rank * 8 + f);
    }
    mask
}

fn bishop_mask(square: usize) -> u64 {
    let rank = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut mask = 0u64;

    for (dr, df) in [(1isize, 1isize), (1, -1), (-1, 1), (-1, -1)] {
        let mut r = rank + dr;
        let mut f = file + df;
        while r >= 1 && r <= 6 && f >= 1 && f <= 6 {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }
    mask
}

/// Every subset of `mask`, via the carry-rippler trick.
fn enumerate_blockers(mask: u64) -> Vec<u64> {
    let mut subsets = Vec::with_capacity(1 << mask.count_ones());
    let mut subset = 0u64;
    loop {
        subsets.push(subset);
        subset = subset.wrapping_sub(mask) & mask;
        if subset == 0 {
            break;
        }
    }
    subsets
}

fn build_entry<R: RngCore>(
    square: usize,
    mask: u64,
    attack_fn: fn(usize, u64) -> u64,
    rng: &mut R,
) -> MagicEntry {
    let blockers = enumerate_blockers(mask);
    let attacks: Vec<u64> = blockers.iter().map(|&b| attack_fn(square, b)).collect();
    let shift = 64 - mask.count_ones();

    let magic = find_magic_number_for_square(&blockers, &attacks, shift, rng)
        .expect("magic search exhausted its attempt budget");

    let mut table = vec![0u64; 1usize << mask.count_ones()];
    for (&blocker, &attack) in blockers.iter().zip(attacks.iter()) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        table[index] = attack;
    }

    MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    }
}

pub fn generate_magic_tables(seed: u64) -> MagicTables {
    let mut rng = StdRng::seed_from_u64(seed);

    let rook_entries = (0..64)
        .map(|sq| build_entry(sq, rook_mask(sq), rook_attacks_per_square, &mut rng))
        .collect();
    let bishop_entries = (0..64)
        .map(|sq| build_entry(sq, bishop_mask(sq), bishop_attacks_per_square, &mut rng))
        .collect();

    MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rook_mask_excludes_edges_and_self() {
        let mask = rook_mask(27); // d4
        assert_eq!(mask.count_ones(), 10);
        assert_eq!(mask & (1u64 << 27), 0);
        assert_eq!(mask & (1u64 << 3), 0); // d1 edge
        assert_eq!(mask & (1u64 << 31), 0); // h4 edge
    }

    #[test]
    fn bishop_corner_mask() {
        // a1: b2..g7 only
        let mask = bishop_mask(0);
        assert_eq!(mask.count_ones(), 6);
        assert_eq!(mask & (1u64 << 63), 0);
    }

    #[test]
    fn blocker_enumeration_covers_all_subsets() {
        let mask = 0b1011u64;
        let subsets = enumerate_blockers(mask);
        assert_eq!(subsets.len(), 8);
        assert!(subsets.contains(&0));
        assert!(subsets.contains(&mask));
    }
}
