//! Delta stream format
//!
//! A delta is a flat sequence of records with no header or trailer:
//!
//! - MATCH: opcode `1`, then the base block index as a big-endian `u32`
//! - MISMATCH: opcode `0`, a big-endian `u32` length `L`, then `L` literal bytes

use crate::sync::error::{Result, SyncError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, ErrorKind, Read};

/// Opcode of a literal run
pub const MISMATCH: u8 = 0;
/// Opcode of a block reference
pub const MATCH: u8 = 1;

/// Size of an encoded MATCH record
pub const MATCH_RECORD_LEN: usize = 5;
/// Size of a MISMATCH record header, before its payload
pub const MISMATCH_HEADER_LEN: usize = 5;

/// Header of one delta record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeltaRecord {
    /// Copy a block of the base file
    Match { block_index: u32 },
    /// `length` literal bytes follow in the delta stream
    Mismatch { length: u32 },
}

impl DeltaRecord {
    /// Length of the payload that follows this header in the stream
    pub fn payload_len(&self) -> u64 {
        match self {
            DeltaRecord::Match { .. } => 0,
            DeltaRecord::Mismatch { length } => *length as u64,
        }
    }
}

/// Sequential reader of delta record headers
///
/// After a `Mismatch` header the caller must consume the literal payload,
/// through [`DeltaReader::literal`] or [`DeltaReader::skip_literal`], before
/// asking for the next record.
pub struct DeltaReader<R> {
    inner: R,
    offset: u64,
}

impl<R: Read> DeltaReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Byte offset of the next unread byte
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Read the next record header, or `None` at the end of the stream
    pub fn next_record(&mut self) -> Result<Option<DeltaRecord>> {
        let mut opcode = [0u8; 1];
        loop {
            match self.inner.read(&mut opcode) {
                Ok(0) => return Ok(None),
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }

        let record_offset = self.offset;
        self.offset += 1;

        let mut field = [0u8; 4];
        self.inner.read_exact(&mut field)?;
        self.offset += 4;
        let value = u32::from_be_bytes(field);

        match opcode[0] {
            MATCH => Ok(Some(DeltaRecord::Match { block_index: value })),
            MISMATCH => Ok(Some(DeltaRecord::Mismatch { length: value })),
            other => Err(SyncError::InvalidDelta {
                offset: record_offset,
                opcode: other,
            }),
        }
    }

    /// Reader over the next `length` literal bytes
    pub fn literal(&mut self, length: u32) -> io::Take<&mut R> {
        self.offset += length as u64;
        self.inner.by_ref().take(length as u64)
    }

    /// Discard the next `length` literal bytes
    pub fn skip_literal(&mut self, length: u32) -> Result<()> {
        let skipped = io::copy(&mut self.literal(length), &mut io::sink())?;
        if skipped < length as u64 {
            return Err(truncated_literal(length, skipped).into());
        }
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

pub(crate) fn truncated_literal(expected: u32, actual: u64) -> io::Error {
    io::Error::new(
        ErrorKind::UnexpectedEof,
        format!("literal run truncated: expected {} bytes, got {}", expected, actual),
    )
}

/// Statistics about a delta
///
/// `weak_hits`, `matches` and `source_bytes` are only known while
/// generating; [`DeltaStats::scan`] cannot recover them and leaves them at 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaStats {
    /// Windows whose weak hash had a bucket in the index
    pub weak_hits: u64,
    /// Weak hits confirmed by the strong hash
    pub matches: u64,
    pub match_records: u64,
    pub literal_runs: u64,
    pub literal_bytes: u64,
    pub source_bytes: u64,
    pub delta_bytes: u64,
}

impl DeltaStats {
    /// Recount records of a complete delta stream
    pub fn scan<R: Read>(delta: R) -> Result<Self> {
        let mut reader = DeltaReader::new(delta);
        let mut stats = DeltaStats::default();

        while let Some(record) = reader.next_record()? {
            match record {
                DeltaRecord::Match { .. } => stats.match_records += 1,
                DeltaRecord::Mismatch { length } => {
                    reader.skip_literal(length)?;
                    stats.literal_runs += 1;
                    stats.literal_bytes += length as u64;
                }
            }
        }

        stats.delta_bytes = reader.offset();
        Ok(stats)
    }

    /// Weak-hash hits that the strong hash rejected
    pub fn false_positives(&self) -> u64 {
        self.weak_hits.saturating_sub(self.matches)
    }

    /// Percentage of the source covered by block references
    pub fn match_ratio(&self) -> f64 {
        if self.source_bytes == 0 {
            return 0.0;
        }
        self.source_bytes.saturating_sub(self.literal_bytes) as f64 / self.source_bytes as f64 * 100.0
    }

    /// Bandwidth savings compared to sending the source whole
    pub fn savings_ratio(&self) -> f64 {
        if self.source_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.delta_bytes as f64 / self.source_bytes as f64) * 100.0
    }
}

impl fmt::Display for DeltaStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Delta: {} matched blocks ({:.1}%), {} literal bytes in {} runs, possible {} / found {}, {:.1}% savings",
            self.match_records,
            self.match_ratio(),
            self.literal_bytes,
            self.literal_runs,
            self.weak_hits,
            self.matches,
            self.savings_ratio()
        )
    }
}
