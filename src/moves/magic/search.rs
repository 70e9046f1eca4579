use rand::RngCore;

/// Sparse random candidate: AND of three draws keeps the popcount low,
/// which is what makes a multiplier likely to hash without collisions.
#[inline(always)]
pub fn random_sparse_u64<R: RngCore>(rng: &mut R) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

/// A candidate is valid when no two blocker sets with different attack
/// boards hash to the same index. Constructive collisions (same attacks)
/// are allowed.
pub fn is_magic_candidate_valid(blockers: &[u64], attacks: &[u64], magic: u64, shift: u32) -> bool {
    let table_size = 1usize << (64 - shift);
    let mut seen: Vec<u64> = vec![u64::MAX; table_size];

    for (&blocker, &attack) in blockers.iter().zip(attacks.iter()) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        if seen[index] == u64::MAX {
            seen[index] = attack;
        } else if seen[index] != attack {
            return false;
        }
    }
    true
}

pub fn find_magic_number_for_square<R: RngCore>(
    blockers: &[u64],
    attacks: &[u64],
    shift: u32,
    rng: &mut R,
) -> Option<u64> {
    // one scratch table reused across candidates
    let table_size = 1usize << (64 - shift);
    let mut seen: Vec<u64> = vec![u64::MAX; table_size];

    'candidates: for _attempt in 0..1_000_000 {
        let magic = random_sparse_u64(rng);
        seen.fill(u64::MAX);
        for (&blocker, &attack) in blockers.iter().zip(attacks.iter()) {
            let index = (blocker.wrapping_mul(magic) >> shift) as usize;
            if seen[index] == u64::MAX {
                seen[index] = attack;
            } else if seen[index] != attack {
                continue 'candidates;
            }
        }
        return Some(magic);
    }
    None
}
