//! Mutations applied to a copy of the base to produce a source file

use rand::rngs::StdRng;
use rand::{Rng, RngCore};

/// A content mutation
#[derive(Debug, Clone)]
pub enum Modifier {
    /// Leave the content untouched
    NoChange,
    /// Drop everything
    DeleteAll,
    /// Overwrite `count` random spots with up to `max_len` random bytes
    RandomOverwrite { count: usize, max_len: usize },
    /// Insert `count` random runs of up to `max_len` bytes
    RandomInsert { count: usize, max_len: usize },
    /// Delete `count` random runs of up to `max_len` bytes
    RandomDelete { count: usize, max_len: usize },
    /// Remove up to `max_len` bytes from the end
    TruncateEnd { max_len: usize },
    /// Remove up to `max_len` bytes from the start
    TruncateStart { max_len: usize },
    /// Append a second copy of the whole content
    ReplicateWhole,
    /// Apply each modifier in turn
    Composite(Vec<Modifier>),
}

impl Modifier {
    pub fn apply(&self, data: &mut Vec<u8>, rng: &mut StdRng) {
        match self {
            Modifier::NoChange => {}
            Modifier::DeleteAll => data.clear(),
            Modifier::RandomOverwrite { count, max_len } => {
                if data.is_empty() {
                    return;
                }
                for _ in 0..*count {
                    let at = rng.gen_range(0..data.len());
                    let len = rng.gen_range(1..=*max_len).min(data.len() - at);
                    rng.fill_bytes(&mut data[at..at + len]);
                }
            }
            Modifier::RandomInsert { count, max_len } => {
                let mut inserts: Vec<(usize, Vec<u8>)> = (0..*count)
                    .map(|_| {
                        let at = rng.gen_range(0..=data.len());
                        let mut bytes = vec![0u8; rng.gen_range(1..=*max_len)];
                        rng.fill_bytes(&mut bytes);
                        (at, bytes)
                    })
                    .collect();
                // Back to front so earlier offsets stay valid
                inserts.sort_by(|a, b| b.0.cmp(&a.0));
                for (at, bytes) in inserts {
                    data.splice(at..at, bytes);
                }
            }
            Modifier::RandomDelete { count, max_len } => {
                if data.is_empty() {
                    return;
                }
                for _ in 0..*count {
                    if data.is_empty() {
                        break;
                    }
                    let at = rng.gen_range(0..data.len());
                    let len = rng.gen_range(1..=*max_len).min(data.len() - at);
                    data.drain(at..at + len);
                }
            }
            Modifier::TruncateEnd { max_len } => {
                let cut = rng.gen_range(1..=*max_len);
                data.truncate(data.len().saturating_sub(cut));
            }
            Modifier::TruncateStart { max_len } => {
                let cut = rng.gen_range(1..=*max_len).min(data.len());
                data.drain(..cut);
            }
            Modifier::ReplicateWhole => {
                let copy = data.clone();
                data.extend_from_slice(&copy);
            }
            Modifier::Composite(modifiers) => {
                for modifier in modifiers {
                    modifier.apply(data, rng);
                }
            }
        }
    }
}

/// The mutation set used by the round-trip suite
pub fn all_modifiers() -> Vec<Modifier> {
    vec![
        Modifier::NoChange,
        Modifier::DeleteAll,
        Modifier::RandomOverwrite {
            count: 32,
            max_len: 4,
        },
        Modifier::RandomInsert {
            count: 32,
            max_len: 128,
        },
        Modifier::RandomDelete {
            count: 32,
            max_len: 128,
        },
        Modifier::TruncateEnd { max_len: 64 },
        Modifier::TruncateStart { max_len: 64 },
        Modifier::TruncateEnd { max_len: 10 * 1024 },
        Modifier::TruncateStart { max_len: 10 * 1024 },
        Modifier::ReplicateWhole,
        Modifier::Composite(vec![
            Modifier::RandomInsert {
                count: 32,
                max_len: 128,
            },
            Modifier::RandomDelete {
                count: 32,
                max_len: 128,
            },
            Modifier::RandomOverwrite {
                count: 32,
                max_len: 4,
            },
            Modifier::TruncateEnd { max_len: 64 },
            Modifier::TruncateStart { max_len: 64 },
        ]),
    ]
}
