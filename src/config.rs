//! Synchronization settings shared by both ends of a transfer
//!
//! Signature, delta and target must all be produced with the same block
//! size and strong hash; nothing in the file formats records them.

use crate::sync::error::{Result, SyncError};
use crate::sync::generator::DEFAULT_IO_BUFFER_SIZE;
use crate::sync::signature::{BlockSignature, DEFAULT_BLOCK_SIZE};
use crate::sync::strong_hash::StrongHashKind;
use serde::{Deserialize, Serialize};

/// Configuration for a synchronization session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Nominal block size in bytes
    pub block_size: usize,
    /// Strong hash confirming weak-hash matches
    pub strong_hash: StrongHashKind,
    /// Buffer size for streaming reads and writes
    pub io_buffer_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            strong_hash: StrongHashKind::default(),
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE,
        }
    }
}

impl SyncConfig {
    /// Create a config with a custom block size
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            ..Default::default()
        }
    }

    pub fn with_strong_hash(mut self, kind: StrongHashKind) -> Self {
        self.strong_hash = kind;
        self
    }

    pub fn with_io_buffer_size(mut self, size: usize) -> Self {
        self.io_buffer_size = size;
        self
    }

    /// Parse a JSON config; omitted fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SyncError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(SyncError::InvalidConfig(
                "block size must be at least 1".to_string(),
            ));
        }
        if self.block_size as u64 > u32::MAX as u64 {
            return Err(SyncError::InvalidConfig(format!(
                "block size {} exceeds {}",
                self.block_size,
                u32::MAX
            )));
        }
        if self.io_buffer_size == 0 {
            return Err(SyncError::InvalidConfig(
                "I/O buffer size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Width of one signature record under this config
    pub fn record_width(&self) -> usize {
        BlockSignature::record_width(self.strong_hash.digest_len())
    }
}
