//! File signature generation for delta transfer
//!
//! A signature is the base file cut into fixed-size blocks, each summarised
//! by a weak rolling hash and a strong digest. On disk it is a flat run of
//! fixed-width records, `weak (4 bytes, big-endian) || strong`, in block order.

use crate::sync::error::{Result, SyncError};
use crate::sync::rolling_hash::{PolynomialRolling, RollingHash};
use crate::sync::strong_hash::StrongHash;
use std::hash::{Hash, Hasher};
use std::io::{ErrorKind, Read, Write};

/// Default block size for signatures
pub const DEFAULT_BLOCK_SIZE: usize = 2048;

/// Bytes taken by the weak hash in a signature record
pub const WEAK_HASH_LEN: usize = 4;

/// Signature for a single block
///
/// Two signatures are equal when their weak and strong hashes are; the block
/// index is carried along but is not part of the identity.
#[derive(Debug, Clone)]
pub struct BlockSignature {
    /// Block index in the base file
    pub index: u32,
    /// Weak rolling checksum
    pub weak_hash: u32,
    /// Strong digest of the exact block bytes
    pub strong_hash: Vec<u8>,
}

impl BlockSignature {
    /// Create a new block signature
    pub fn new(index: u32, weak_hash: u32, strong_hash: Vec<u8>) -> Self {
        Self {
            index,
            weak_hash,
            strong_hash,
        }
    }

    /// Compute the signature of a block of data
    pub fn compute(
        index: u32,
        data: &[u8],
        rolling: &mut PolynomialRolling,
        strong: &mut dyn StrongHash,
    ) -> Self {
        rolling.reset();
        rolling.absorb_slice(data);

        strong.reset();
        strong.update(data);

        Self::new(index, rolling.value(), strong.digest())
    }

    /// Width in bytes of one encoded record
    pub fn record_width(digest_len: usize) -> usize {
        WEAK_HASH_LEN + digest_len
    }

    /// Append the encoded record to `out`
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.weak_hash.to_be_bytes());
        out.extend_from_slice(&self.strong_hash);
    }

    /// Decode one record; everything after the weak hash is the strong hash
    ///
    /// Returns `None` if `record` is too short to hold a weak hash.
    pub fn decode(index: u32, record: &[u8]) -> Option<Self> {
        let weak = record.get(..WEAK_HASH_LEN)?;
        let weak_hash = u32::from_be_bytes(weak.try_into().ok()?);
        Some(Self::new(index, weak_hash, record[WEAK_HASH_LEN..].to_vec()))
    }

    /// Verify if data matches this signature
    pub fn matches(&self, data: &[u8], strong: &mut dyn StrongHash) -> bool {
        if PolynomialRolling::checksum(data) != self.weak_hash {
            return false;
        }

        strong.reset();
        strong.update(data);
        strong.digest() == self.strong_hash
    }
}

impl PartialEq for BlockSignature {
    fn eq(&self, other: &Self) -> bool {
        self.weak_hash == other.weak_hash && self.strong_hash == other.strong_hash
    }
}

impl Eq for BlockSignature {}

impl Hash for BlockSignature {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.weak_hash.hash(state);
        self.strong_hash.hash(state);
    }
}

/// Summary of a signature generation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureSummary {
    /// Number of records written
    pub blocks: u32,
    /// Bytes of base input consumed
    pub bytes_read: u64,
}

/// Generator for base-file signatures
pub struct SignatureGenerator {
    block_size: usize,
    rolling: PolynomialRolling,
    strong: Box<dyn StrongHash>,
}

impl SignatureGenerator {
    /// Create a generator for `block_size`-byte blocks
    pub fn new(block_size: usize, strong: Box<dyn StrongHash>) -> Self {
        Self {
            block_size,
            rolling: PolynomialRolling::new(block_size),
            strong,
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Width in bytes of each record this generator writes
    pub fn record_width(&self) -> usize {
        BlockSignature::record_width(self.strong.digest_len())
    }

    /// Compute all block signatures of `base`, in block order
    pub fn generate<R: Read>(&mut self, base: &mut R) -> Result<Vec<BlockSignature>> {
        let mut blocks = Vec::new();
        self.for_each_block(base, |sig| {
            blocks.push(sig);
            Ok(())
        })?;
        Ok(blocks)
    }

    /// Stream the signature records of `base` into `out`
    pub fn write_signature<R: Read, W: Write>(
        &mut self,
        base: &mut R,
        out: &mut W,
    ) -> Result<SignatureSummary> {
        let mut record = Vec::with_capacity(self.record_width());
        let summary = self.for_each_block(base, |sig| {
            record.clear();
            sig.encode_into(&mut record);
            out.write_all(&record)?;
            Ok(())
        })?;
        out.flush()?;

        tracing::debug!(
            blocks = summary.blocks,
            bytes = summary.bytes_read,
            block_size = self.block_size,
            "Generated signature"
        );

        Ok(summary)
    }

    fn for_each_block<R, F>(&mut self, base: &mut R, mut emit: F) -> Result<SignatureSummary>
    where
        R: Read,
        F: FnMut(BlockSignature) -> Result<()>,
    {
        let mut buffer = vec![0u8; self.block_size];
        let mut blocks = 0u32;
        let mut bytes_read = 0u64;

        loop {
            let len = read_full(base, &mut buffer)?;
            if len == 0 {
                break;
            }

            let sig = BlockSignature::compute(
                blocks,
                &buffer[..len],
                &mut self.rolling,
                &mut *self.strong,
            );
            emit(sig)?;

            bytes_read += len as u64;
            blocks = next_block_index(blocks)?;
            if len < self.block_size {
                break;
            }
        }

        Ok(SignatureSummary { blocks, bytes_read })
    }
}

/// Index after `index`; block indices must fit the 4-byte MATCH field
pub(crate) fn next_block_index(index: u32) -> Result<u32> {
    index.checked_add(1).ok_or(SyncError::BlockIndexOverflow)
}

/// Read until `buf` is full or the reader is exhausted; returns bytes read
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
