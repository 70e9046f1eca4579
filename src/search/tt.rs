//! Transposition table: power-of-two bucket count sized from a megabyte
//! budget, two slots per bucket, generation-based aging. Mate scores are
//! converted between root-relative and node-relative at this boundary so
//! a stored "mate in N" stays truthful wherever it is probed from.

use crate::moves::types::Move;

pub const MATE_SCORE: i32 = 31_000;
pub const MATE_THRESHOLD: i32 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    Exact = 0,
    /// Score is a lower bound (the node failed high).
    Lower = 1,
    /// Score is an upper bound (the node failed low).
    Upper = 2,
}

/// Mate scores are stored relative to the probing node, not the root.
#[inline]
pub fn score_to_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score + ply
    } else if score <= -MATE_THRESHOLD {
        score - ply
    } else {
        score
    }
}

#[inline]
pub fn score_from_tt(score: i32, ply: i32) -> i32 {
    if score >= MATE_THRESHOLD {
        score - ply
    } else if score <= -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TTEntry {
    pub key: u64,
    pub best_move: Option<Move>,
    pub score: i16,
    pub depth: u8,
    pub bound: Bound,
    pub generation: u8,
}

impl TTEntry {
    const fn empty() -> Self {
        TTEntry {
            key: 0,
            best_move: None,
            score: 0,
            depth: 0,
            bound: Bound::Exact,
            generation: 0,
        }
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.key == 0 && self.best_move.is_none() && self.depth == 0
    }
}

const BUCKET_SLOTS: usize = 2;

#[derive(Debug, Clone, Copy)]
struct Bucket {
    slots: [TTEntry; BUCKET_SLOTS],
}

#[derive(Debug)]
pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    generation: u8,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> Self {
        let bucket_size = std::mem::size_of::<Bucket>();
        let wanted = (size_mb.max(1) * 1024 * 1024) / bucket_size;

        // round down to a power of two for mask indexing
        let mut capacity = 1;
        while capacity * 2 <= wanted {
            capacity *= 2;
        }

        TranspositionTable {
            buckets: vec![
                Bucket {
                    slots: [TTEntry::empty(); BUCKET_SLOTS],
                };
                capacity
            ],
            generation: 0,
        }
    }

    pub fn resize(&mut self, size_mb: usize) {
        *self = TranspositionTable::new(size_mb);
    }

    /// A new search begins: age every existing entry by one generation.
    pub fn new_search(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.slots = [TTEntry::empty(); BUCKET_SLOTS];
        }
        self.generation = 0;
    }

    #[inline]
    fn bucket_index(&self, key: u64) -> usize {
        (key as usize) & (self.buckets.len() - 1)
    }

    /// Key-matching entry with the score translated to `ply`-relative.
    pub fn probe(&self, key: u64, ply: i32) -> Option<TTEntry> {
        let bucket = &self.buckets[self.bucket_index(key)];
        for slot in &bucket.slots {
            if slot.key == key && !slot.is_empty() {
                let mut entry = *slot;
                entry.score = score_from_tt(entry.score as i32, ply).clamp(-32_000, 32_000) as i16;
                return Some(entry);
            }
        }
        None
    }

    /// Best move hint without any score translation.
    pub fn probe_move(&self, key: u64) -> Option<Move> {
        let bucket = &self.buckets[self.bucket_index(key)];
        bucket
            .slots
            .iter()
            .find(|s| s.key == key)
            .and_then(|s| s.best_move)
    }

    /// Replacement: an empty slot first, then a slot from an older
    /// generation, then a strictly shallower slot; otherwise keep what is
    /// there. A same-key slot is always updated in place.
    pub fn store(&mut self, key: u64, mv: Option<Move>, score: i32, depth: u8, bound: Bound, ply: i32) {
        let generation = self.generation;
        let index = self.bucket_index(key);
        let bucket = &mut self.buckets[index];

        let mut target: Option<usize> = None;
        for (i, slot) in bucket.slots.iter().enumerate() {
            if slot.key == key || slot.is_empty() {
                target = Some(i);
                break;
            }
        }
        if target.is_none() {
            for (i, slot) in bucket.slots.iter().enumerate() {
                if slot.generation != generation {
                    target = Some(i);
                    break;
                }
            }
        }
        if target.is_none() {
            target = bucket
                .slots
                .iter()
                .enumerate()
                .filter(|(_, s)| s.depth < depth)
                .min_by_key(|(_, s)| s.depth)
                .map(|(i, _)| i);
        }
        let Some(i) = target else {
            return; // both slots are current-generation and deeper
        };

        let slot = &mut bucket.slots[i];
        // keep an existing move hint if the new entry has none for this key
        let best_move = match mv {
            Some(m) => Some(m),
            None if slot.key == key => slot.best_move,
            None => None,
        };

        *slot = TTEntry {
            key,
            best_move,
            score: score_to_tt(score, ply).clamp(-32_000, 32_000) as i16,
            depth,
            bound,
            generation,
        };
    }

    /// Per-mille of slots written in the current generation, sampled over
    /// a fixed prefix of buckets.
    pub fn hashfull(&self) -> u32 {
        let sample = self.buckets.len().min(1000);
        let mut used = 0;
        for bucket in &self.buckets[..sample] {
            for slot in &bucket.slots {
                if !slot.is_empty() && slot.generation == self.generation {
                    used += 1;
                }
            }
        }
        (used * 1000 / (sample * BUCKET_SLOTS)) as u32
    }
}
