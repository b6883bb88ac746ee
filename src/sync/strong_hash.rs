//! Strong block digests
//!
//! The strong hash only runs after a weak-hash hit, to confirm that a
//! window really holds the same bytes as a base block.

use crate::sync::error::SyncError;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of every digest produced by the bundled implementations
pub const STRONG_HASH_LEN: usize = 16;

/// Streaming digest used to confirm weak-hash matches
pub trait StrongHash: Send {
    /// Discard any buffered input
    fn reset(&mut self);

    /// Feed bytes into the digest
    fn update(&mut self, data: &[u8]);

    /// Finish the digest and reset the state for the next block
    fn digest(&mut self) -> Vec<u8>;

    /// Number of bytes `digest` returns
    fn digest_len(&self) -> usize;
}

/// MD5 digest (128 bits)
#[derive(Debug, Clone, Default)]
pub struct Md5Hash {
    inner: Md5,
}

impl Md5Hash {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StrongHash for Md5Hash {
    fn reset(&mut self) {
        Digest::reset(&mut self.inner);
    }

    fn update(&mut self, data: &[u8]) {
        Digest::update(&mut self.inner, data);
    }

    fn digest(&mut self) -> Vec<u8> {
        self.inner.finalize_reset().to_vec()
    }

    fn digest_len(&self) -> usize {
        STRONG_HASH_LEN
    }
}

/// Blake3 digest, truncated to 128 bits
#[derive(Debug, Clone, Default)]
pub struct Blake3Hash {
    inner: blake3::Hasher,
}

impl Blake3Hash {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StrongHash for Blake3Hash {
    fn reset(&mut self) {
        self.inner.reset();
    }

    fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    fn digest(&mut self) -> Vec<u8> {
        let full = self.inner.finalize();
        self.inner.reset();
        full.as_bytes()[..STRONG_HASH_LEN].to_vec()
    }

    fn digest_len(&self) -> usize {
        STRONG_HASH_LEN
    }
}

/// Selectable strong hash algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrongHashKind {
    #[default]
    Md5,
    Blake3,
}

impl StrongHashKind {
    /// Instantiate a fresh hasher of this kind
    pub fn build(self) -> Box<dyn StrongHash> {
        match self {
            StrongHashKind::Md5 => Box::new(Md5Hash::new()),
            StrongHashKind::Blake3 => Box::new(Blake3Hash::new()),
        }
    }

    pub fn digest_len(self) -> usize {
        match self {
            StrongHashKind::Md5 | StrongHashKind::Blake3 => STRONG_HASH_LEN,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StrongHashKind::Md5 => "md5",
            StrongHashKind::Blake3 => "blake3",
        }
    }
}

impl fmt::Display for StrongHashKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrongHashKind {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "md5" => Ok(StrongHashKind::Md5),
            "blake3" => Ok(StrongHashKind::Blake3),
            other => Err(SyncError::UnsupportedDigest(other.to_string())),
        }
    }
}
