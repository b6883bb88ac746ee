//! In-memory signature index used during delta generation
//!
//! Maps each `(weak, strong)` signature to the queue of base blocks that
//! carry it. A block is handed out at most once: lookups pop the oldest
//! remaining index, so duplicate base blocks are consumed in file order.

use crate::sync::error::{Result, SyncError};
use crate::sync::signature::{next_block_index, read_full, BlockSignature};
use std::collections::{HashMap, VecDeque};
use std::io::Read;

#[derive(Debug, Default)]
pub struct SignatureIndex {
    /// Remaining block indices per signature, oldest first
    blocks: HashMap<BlockSignature, VecDeque<u32>>,
    /// Number of distinct signatures still present per weak hash
    weak: HashMap<u32, usize>,
    remaining: usize,
}

impl SignatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load an index from a signature stream of `weak || strong` records
    ///
    /// Block indices are assigned in read order. A trailing partial record
    /// fails with [`SyncError::InvalidSignatureFile`].
    pub fn load<R: Read>(reader: &mut R, digest_len: usize) -> Result<Self> {
        let record_width = BlockSignature::record_width(digest_len);
        let mut record = vec![0u8; record_width];
        let mut index = Self::new();
        let mut length = 0u64;
        let mut next = 0u32;

        loop {
            let n = read_full(reader, &mut record)?;
            length += n as u64;
            if n == 0 {
                break;
            }
            if n < record_width {
                return Err(SyncError::InvalidSignatureFile {
                    length,
                    record_width,
                });
            }

            let sig = BlockSignature::decode(next, &record)
                .ok_or(SyncError::InvalidSignatureFile { length, record_width })?;
            index.insert(sig);
            next = next_block_index(next)?;
        }

        tracing::debug!(
            blocks = index.remaining,
            distinct = index.blocks.len(),
            bytes = length,
            "Loaded signature index"
        );

        Ok(index)
    }

    /// Build an index from already decoded signatures
    pub fn from_signatures<I>(signatures: I) -> Self
    where
        I: IntoIterator<Item = BlockSignature>,
    {
        let mut index = Self::new();
        for sig in signatures {
            index.insert(sig);
        }
        index
    }

    /// Register a block under its signature, behind any earlier duplicates
    pub fn insert(&mut self, sig: BlockSignature) {
        let block = sig.index;
        let weak = sig.weak_hash;
        let queue = self.blocks.entry(sig).or_insert_with(|| {
            *self.weak.entry(weak).or_insert(0) += 1;
            VecDeque::new()
        });
        queue.push_back(block);
        self.remaining += 1;
    }

    /// Whether any unconsumed block has this weak hash
    pub fn contains_weak(&self, weak_hash: u32) -> bool {
        self.weak.contains_key(&weak_hash)
    }

    /// Pop the oldest block whose signature is exactly `(weak_hash, strong_hash)`
    pub fn lookup_and_consume(&mut self, weak_hash: u32, strong_hash: &[u8]) -> Option<u32> {
        if !self.contains_weak(weak_hash) {
            return None;
        }

        let key = BlockSignature::new(0, weak_hash, strong_hash.to_vec());
        let queue = self.blocks.get_mut(&key)?;
        let block = queue.pop_front()?;
        self.remaining -= 1;

        if queue.is_empty() {
            self.blocks.remove(&key);
            if let Some(count) = self.weak.get_mut(&weak_hash) {
                *count -= 1;
                if *count == 0 {
                    self.weak.remove(&weak_hash);
                }
            }
        }

        Some(block)
    }

    /// Number of blocks not yet consumed
    pub fn len(&self) -> usize {
        self.remaining
    }

    pub fn is_empty(&self) -> bool {
        self.remaining == 0
    }

    /// Number of distinct signatures still present
    pub fn distinct_signatures(&self) -> usize {
        self.blocks.len()
    }

    /// Number of distinct weak hashes still present
    pub fn weak_buckets(&self) -> usize {
        self.weak.len()
    }
}
