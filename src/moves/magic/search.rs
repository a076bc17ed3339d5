//! Random search for magic multipliers.

use rand::RngCore;

/// Sparse 64-bit candidate: AND of three random draws keeps the popcount
/// low, which empirically collides far less in magic indexing.
#[inline(always)]
pub fn random_sparse_u64<R: RngCore>(rng: &mut R) -> u64 {
    rng.next_u64() & rng.next_u64() & rng.next_u64()
}

/// A candidate is valid when every blocker set maps to an index holding
/// either nothing yet or the identical attack set (constructive
/// collisions are allowed, destructive ones are not).
pub fn is_magic_candidate_valid(blockers: &[u64], attacks: &[u64], magic: u64, shift: u32) -> bool {
    let table_len = 1usize << (64 - shift);
    let mut seen: Vec<u64> = vec![0; table_len];
    let mut used: Vec<bool> = vec![false; table_len];

    for (&blocker, &attack) in blockers.iter().zip(attacks.iter()) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        if used[index] {
            if seen[index] != attack {
                return false;
            }
        } else {
            used[index] = true;
            seen[index] = attack;
        }
    }
    true
}

pub fn find_magic_for_square<R: RngCore>(
    blockers: &[u64],
    attacks: &[u64],
    shift: u32,
    rng: &mut R,
) -> Result<u64, String> {
    for _ in 0..1_000_000 {
        let magic = random_sparse_u64(rng);
        if is_magic_candidate_valid(blockers, attacks, magic, shift) {
            return Ok(magic);
        }
    }
    Err("no valid magic number after 1,000,000 attempts".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn trivial_single_blocker_set() {
        // One blocker pattern always maps collision-free.
        let blockers = [0u64];
        let attacks = [0xFFu64];
        let mut rng = StdRng::seed_from_u64(1);
        let magic = find_magic_for_square(&blockers, &attacks, 63, &mut rng).unwrap();
        assert!(is_magic_candidate_valid(&blockers, &attacks, magic, 63));
    }
}
