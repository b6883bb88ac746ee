//! Test-data generators for synchronization tests
//!
//! Builds base files and mutated copies of them. None of this is part of
//! the engine; it only produces byte streams to synchronize.

#![allow(dead_code)]

pub mod modifiers;

#[allow(unused_imports)]
pub use modifiers::{all_modifiers, Modifier};

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Sizes exercised against the default 2048-byte block size
pub const TEST_SIZES: &[usize] = &[
    1,
    1024 - 1,
    1024,
    1024 + 1,
    2 * 1024 - 1,
    2 * 1024,
    2 * 1024 + 1,
    32 * 1024 - 1,
    32 * 1024,
    32 * 1024 + 1,
    376461,
];

/// Seeded RNG so failures reproduce
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Generate `size` bytes in 1 KiB pieces; about 30% of the pieces repeat
/// an earlier piece so the base contains duplicate blocks
pub fn generate_file(size: usize, seed: u64) -> Vec<u8> {
    const PIECE: usize = 1024;

    let mut rng = rng(seed);
    let mut data = Vec::with_capacity(size);
    let mut piece = [0u8; PIECE];

    while data.len() < size {
        let pieces_written = data.len() / PIECE;
        if pieces_written == 0 || rng.gen_range(0..10) < 7 {
            rng.fill_bytes(&mut piece);
        } else {
            let from = rng.gen_range(0..pieces_written) * PIECE;
            piece.copy_from_slice(&data[from..from + PIECE]);
        }

        let take = PIECE.min(size - data.len());
        data.extend_from_slice(&piece[..take]);
    }

    data
}
