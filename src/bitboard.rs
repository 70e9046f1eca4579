//! u64 bit-set primitives. Every "set of squares" in the engine is one of
//! these words; helpers here are the only place shift edge-masking lives.

use crate::utils::square_index;

pub const FILE_A: u64 = 0x0101_0101_0101_0101;
pub const FILE_H: u64 = 0x8080_8080_8080_8080;
pub const RANK_1: u64 = 0x0000_0000_0000_00FF;
pub const RANK_2: u64 = 0x0000_0000_0000_FF00;
pub const RANK_7: u64 = 0x00FF_0000_0000_0000;
pub const RANK_8: u64 = 0xFF00_0000_0000_0000;

/// Compass directions for ray tables, a1-origin (north = +8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum Direction {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

pub const ALL_DIRECTIONS: [Direction; 8] = [
    Direction::North,
    Direction::South,
    Direction::East,
    Direction::West,
    Direction::NorthEast,
    Direction::NorthWest,
    Direction::SouthEast,
    Direction::SouthWest,
];

pub trait BitboardExt {
    fn set_bit(&mut self, sq: u8);
    fn clear_bit(&mut self, sq: u8);
    fn toggle_bit(&mut self, sq: u8);
    fn test_bit(self, sq: u8) -> bool;
    fn lsb(self) -> u8;
    fn msb(self) -> u8;
    fn north(self) -> u64;
    fn south(self) -> u64;
    fn east(self) -> u64;
    fn west(self) -> u64;
    fn north_east(self) -> u64;
    fn north_west(self) -> u64;
    fn south_east(self) -> u64;
    fn south_west(self) -> u64;
    fn shift(self, dir: Direction) -> u64;
}

impl BitboardExt for u64 {
    #[inline(always)]
    fn set_bit(&mut self, sq: u8) {
        *self |= 1u64 << sq;
    }

    #[inline(always)]
    fn clear_bit(&mut self, sq: u8) {
        *self &= !(1u64 << sq);
    }

    #[inline(always)]
    fn toggle_bit(&mut self, sq: u8) {
        *self ^= 1u64 << sq;
    }

    #[inline(always)]
    fn test_bit(self, sq: u8) -> bool {
        self & (1u64 << sq) != 0
    }

    #[inline(always)]
    fn lsb(self) -> u8 {
        debug_assert!(self != 0);
        self.trailing_zeros() as u8
    }

    #[inline(always)]
    fn msb(self) -> u8 {
        debug_assert!(self != 0);
        63 - self.leading_zeros() as u8
    }

    #[inline(always)]
    fn north(self) -> u64 {
        self << 8
    }

    #[inline(always)]
    fn south(self) -> u64 {
        self >> 8
    }

    #[inline(always)]
    fn east(self) -> u64 {
        (self & !FILE_H) << 1
    }

    #[inline(always)]
    fn west(self) -> u64 {
        (self & !FILE_A) >> 1
    }

    #[inline(always)]
    fn north_east(self) -> u64 {
        (self & !FILE_H) << 9
    }

    #[inline(always)]
    fn north_west(self) -> u64 {
        (self & !FILE_A) << 7
    }

    #[inline(always)]
    fn south_east(self) -> u64 {
        (self & !FILE_H) >> 7
    }

    #[inline(always)]
    fn south_west(self) -> u64 {
        (self & !FILE_A) >> 9
    }

    #[inline(always)]
    fn shift(self, dir: Direction) -> u64 {
        match dir {
            Direction::North => self.north(),
            Direction::South => self.south(),
            Direction::East => self.east(),
            Direction::West => self.west(),
            Direction::NorthEast => self.north_east(),
            Direction::NorthWest => self.north_west(),
            Direction::SouthEast => self.south_east(),
            Direction::SouthWest => self.south_west(),
        }
    }
}

const fn ray_step(dir: usize) -> (isize, isize) {
    // (rank delta, file delta), indexed by Direction discriminant
    match dir {
        0 => (1, 0),
        1 => (-1, 0),
        2 => (0, 1),
        3 => (0, -1),
        4 => (1, 1),
        5 => (1, -1),
        6 => (-1, 1),
        _ => (-1, -1),
    }
}

const fn build_rays() -> [[u64; 64]; 8] {
    let mut rays = [[0u64; 64]; 8];
    let mut dir = 0;
    while dir < 8 {
        let (dr, df) = ray_step(dir);
        let mut sq = 0;
        while sq < 64 {
            let mut rank = (sq / 8) as isize + dr;
            let mut file = (sq % 8) as isize + df;
            let mut ray = 0u64;
            while rank >= 0 && rank <= 7 && file >= 0 && file <= 7 {
                ray |= 1u64 << square_index(rank as usize, file as usize);
                rank += dr;
                file += df;
            }
            rays[dir][sq] = ray;
            sq += 1;
        }
        dir += 1;
    }
    rays
}

/// Full-length rays (to the board edge) per (direction, square).
pub static RAYS: [[u64; 64]; 8] = build_rays();

/// Squares along `dir` from `sq`, stopping at (and including) the first
/// blocker in `occupied`.
#[inline]
pub fn ray_until_blocker(sq: usize, dir: Direction, occupied: u64) -> u64 {
    let full = RAYS[dir as usize][sq];
    let blockers = full & occupied;
    if blockers == 0 {
        return full;
    }
    let stop = match dir {
        Direction::North | Direction::East | Direction::NorthEast | Direction::NorthWest => {
            blockers.lsb()
        }
        _ => blockers.msb(),
    };
    full & !RAYS[dir as usize][stop as usize]
}
