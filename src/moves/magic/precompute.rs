//! One-shot construction of the rook and bishop magic tables.
//!
//! Nothing here is persisted: the tables are rebuilt from a fixed seed at
//! first use and every per-square table is verified collision-free while
//! it is being filled. A square that cannot be populated is a hard error.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use super::attacks::{bishop_attacks_per_square, rook_attacks_per_square};
use super::search::find_magic_for_square;
use super::structs::{BishopMagicTables, MagicEntry, MagicTables, RookMagicTables};

/// Relevant-blocker mask for a rook: both rays in each direction minus
/// the edge square, since a piece on the edge cannot block anything
/// beyond it.
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

/// Relevant-blocker mask for a bishop: the four diagonals minus all edge
/// squares.
fn bishop_mask(square: usize) -> u64 {
    let rank = (square / 8) as isize;
    let file = (square % 8) as isize;
    let mut mask = 0u64;

    for (dr, df) in [(1, 1), (1, -1), (-1, 1), (-1, -1)] {
        let mut r = rank + dr;
        let mut f = file + df;
        while (1..7).contains(&r) && (1..7).contains(&f) {
            mask |= 1u64 << (r * 8 + f);
            r += dr;
            f += df;
        }
    }
    mask
}

/// All subsets of a mask via the carry-rippler trick.
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

fn build_entry(
    square: usize,
    mask: u64,
    attack_fn: fn(usize, u64) -> u64,
    rng: &mut StdRng,
) -> Result<MagicEntry, String> {
    let blockers = enumerate_blockers(mask);
    let attacks: Vec<u64> = blockers.iter().map(|&b| attack_fn(square, b)).collect();

    let bits = mask.count_ones();
    let shift = 64 - bits;
    let magic = find_magic_for_square(&blockers, &attacks, shift, rng)
        .map_err(|e| format!("square {}: {}", square, e))?;

    // Fill the table, re-checking that no slot gets two different attack
    // sets. This is the collision-freedom proof for this square.
    let mut table = vec![0u64; 1usize << bits];
    let mut filled = vec![false; table.len()];
    for (&blocker, &attack) in blockers.iter().zip(attacks.iter()) {
        let index = (blocker.wrapping_mul(magic) >> shift) as usize;
        if filled[index] && table[index] != attack {
            return Err(format!("square {}: destructive collision at fill", square));
        }
        table[index] = attack;
        filled[index] = true;
    }

    Ok(MagicEntry {
        magic,
        shift,
        mask,
        table: table.into_boxed_slice(),
    })
}

pub fn generate_magic_tables(seed: u64) -> Result<MagicTables, String> {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut rook_entries = Vec::with_capacity(64);
    let mut bishop_entries = Vec::with_capacity(64);

    for square in 0..64 {
        rook_entries.push(build_entry(
            square,
            rook_mask(square),
            rook_attacks_per_square,
            &mut rng,
        )?);
    }
    for square in 0..64 {
        bishop_entries.push(build_entry(
            square,
            bishop_mask(square),
            bishop_attacks_per_square,
            &mut rng,
        )?);
    }

    debug!(seed, "magic tables generated and verified");

    Ok(MagicTables {
        rook: RookMagicTables {
            entries: rook_entries,
        },
        bishop: BishopMagicTables {
            entries: bishop_entries,
        },
    })
}
