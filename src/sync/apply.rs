//! Delta application
//!
//! Replays a delta against the base file. MATCH records copy a block from
//! the base (short for the base's final block), MISMATCH records copy their
//! literal payload straight from the delta.

use crate::sync::delta::{truncated_literal, DeltaReader, DeltaRecord};
use crate::sync::error::{Result, SyncError};
use crate::sync::signature::read_full;
use std::io::{self, Read, Seek, SeekFrom, Write};

pub struct DeltaApplier {
    block_size: usize,
    buffer: Vec<u8>,
}

/// Summary of a delta application pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub blocks_copied: u64,
    pub literal_bytes: u64,
    pub bytes_written: u64,
}

impl DeltaApplier {
    /// Create an applier for deltas built against `block_size`-byte blocks
    pub fn new(block_size: usize) -> Self {
        Self {
            block_size,
            buffer: vec![0u8; block_size],
        }
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Rebuild the target from `base` and `delta`
    ///
    /// The delta is read in a single forward pass; only `base` is seeked.
    pub fn apply<B, D, W>(&mut self, base: &mut B, delta: D, target: &mut W) -> Result<ApplySummary>
    where
        B: Read + Seek,
        D: Read,
        W: Write,
    {
        let mut reader = DeltaReader::new(delta);
        let mut summary = ApplySummary::default();

        while let Some(record) = reader.next_record()? {
            match record {
                DeltaRecord::Match { block_index } => {
                    let copied = self.copy_block(base, target, block_index)?;
                    summary.blocks_copied += 1;
                    summary.bytes_written += copied as u64;
                }
                DeltaRecord::Mismatch { length } => {
                    let copied = io::copy(&mut reader.literal(length), target)?;
                    if copied < length as u64 {
                        return Err(truncated_literal(length, copied).into());
                    }
                    summary.literal_bytes += copied;
                    summary.bytes_written += copied;
                }
            }
        }
        target.flush()?;

        tracing::debug!(
            blocks = summary.blocks_copied,
            literal_bytes = summary.literal_bytes,
            bytes = summary.bytes_written,
            "Applied delta"
        );

        Ok(summary)
    }

    /// Copy one base block; the final block of the base may be short
    fn copy_block<B, W>(&mut self, base: &mut B, target: &mut W, block_index: u32) -> Result<usize>
    where
        B: Read + Seek,
        W: Write,
    {
        let offset = block_index as u64 * self.block_size as u64;
        base.seek(SeekFrom::Start(offset))?;

        let len = read_full(base, &mut self.buffer)?;
        if len == 0 {
            return Err(SyncError::BlockOutOfRange { block_index });
        }

        target.write_all(&self.buffer[..len])?;
        Ok(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::delta::{MATCH, MISMATCH};
    use std::io::Cursor;

    #[test]
    fn test_apply_records() {
        let base = b"AAAABBBBCC";
        let mut delta = vec![MATCH, 0, 0, 0, 1];
        delta.extend_from_slice(&[MISMATCH, 0, 0, 0, 2]);
        delta.extend_from_slice(b"xy");
        delta.extend_from_slice(&[MATCH, 0, 0, 0, 0]);

        let mut target = Vec::new();
        let summary = DeltaApplier::new(4)
            .apply(&mut Cursor::new(base), Cursor::new(&delta), &mut target)
            .unwrap();

        assert_eq!(target, b"BBBBxyAAAA");
        assert_eq!(summary.blocks_copied, 2);
        assert_eq!(summary.literal_bytes, 2);
        assert_eq!(summary.bytes_written, 10);
    }

    #[test]
    fn test_short_final_block() {
        let base = b"AAAABBBBCC";
        let delta = [MATCH, 0, 0, 0, 2, MATCH, 0, 0, 0, 2];

        let mut target = Vec::new();
        DeltaApplier::new(4)
            .apply(&mut Cursor::new(base), Cursor::new(&delta[..]), &mut target)
            .unwrap();

        assert_eq!(target, b"CCCC");
    }

    #[test]
    fn test_empty_delta() {
        let mut target = Vec::new();
        let summary = DeltaApplier::new(4)
            .apply(&mut Cursor::new(b"AAAA"), Cursor::new(Vec::<u8>::new()), &mut target)
            .unwrap();

        assert!(target.is_empty());
        assert_eq!(summary, ApplySummary::default());
    }

    #[test]
    fn test_block_out_of_range() {
        let delta = [MATCH, 0, 0, 0, 3];
        let mut target = Vec::new();
        let result = DeltaApplier::new(4).apply(
            &mut Cursor::new(b"AAAABBBB"),
            Cursor::new(&delta[..]),
            &mut target,
        );

        assert!(matches!(
            result,
            Err(SyncError::BlockOutOfRange { block_index: 3 })
        ));
    }

    #[test]
    fn test_truncated_literal() {
        let delta = [MISMATCH, 0, 0, 0, 5, b'a', b'b'];
        let mut target = Vec::new();
        let result = DeltaApplier::new(4).apply(
            &mut Cursor::new(b""),
            Cursor::new(&delta[..]),
            &mut target,
        );

        assert!(matches!(result, Err(SyncError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof));
    }
}
