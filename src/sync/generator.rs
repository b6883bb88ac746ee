//! Delta generation
//!
//! Streams the source through a window of `block_size` bytes. Whenever the
//! window is full (or the source ends) its rolling hash is looked up in the
//! signature index; a confirmed match emits a MATCH record and restarts the
//! window after the matched bytes, otherwise the window slides by one byte
//! and the evicted byte joins the current literal run.
//!
//! Literal run lengths are not known until the run ends, so each MISMATCH
//! header is written with a placeholder length that is patched once the
//! whole source has been consumed.

use crate::sync::delta::{DeltaStats, MATCH, MISMATCH};
use crate::sync::error::{Result, SyncError};
use crate::sync::index::SignatureIndex;
use crate::sync::rolling_hash::{PolynomialRolling, RollingHash};
use crate::sync::strong_hash::StrongHash;
use std::collections::VecDeque;
use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};

/// Default size of source reads and delta write buffering
pub const DEFAULT_IO_BUFFER_SIZE: usize = 64 * 1024;

pub struct DeltaGenerator {
    block_size: usize,
    io_buffer_size: usize,
    /// Longest literal run one MISMATCH record may carry
    pub(crate) max_run: u32,
    rolling: PolynomialRolling,
    strong: Box<dyn StrongHash>,
}

impl DeltaGenerator {
    /// Create a generator for signatures built with `block_size`
    pub fn new(block_size: usize, strong: Box<dyn StrongHash>) -> Self {
        Self {
            block_size,
            io_buffer_size: DEFAULT_IO_BUFFER_SIZE,
            max_run: u32::MAX,
            rolling: PolynomialRolling::new(block_size),
            strong,
        }
    }

    /// Set the buffer size used for source reads and delta writes
    pub fn with_io_buffer_size(mut self, size: usize) -> Self {
        self.io_buffer_size = size.max(1);
        self
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Write the delta of `source` against `index` into `out`
    ///
    /// Blocks matched here are consumed from `index`. `out` is written from
    /// its current position and left positioned at the end of the delta.
    pub fn generate<R, W>(
        &mut self,
        source: &mut R,
        index: &mut SignatureIndex,
        out: &mut W,
    ) -> Result<DeltaStats>
    where
        R: Read,
        W: Write + Seek,
    {
        if self.block_size == 0 {
            return Err(SyncError::InvalidConfig(
                "block size must be at least 1".to_string(),
            ));
        }

        let start = out.stream_position()?;
        self.rolling.reset();

        let mut pass = DeltaPass {
            block_size: self.block_size,
            max_run: self.max_run.max(1),
            window: VecDeque::with_capacity(self.block_size),
            rolling: &mut self.rolling,
            strong: &mut *self.strong,
            index,
            out: BufWriter::with_capacity(self.io_buffer_size, out),
            written: 0,
            run_open: false,
            run_len: 0,
            patches: Vec::new(),
            stats: DeltaStats::default(),
        };

        let mut buffer = vec![0u8; self.io_buffer_size];
        loop {
            let n = match source.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            pass.stats.source_bytes += n as u64;
            for &byte in &buffer[..n] {
                pass.push_byte(byte)?;
            }
        }

        let stats = pass.finish(start)?;

        tracing::debug!(
            source_bytes = stats.source_bytes,
            delta_bytes = stats.delta_bytes,
            possible = stats.weak_hits,
            found = stats.matches,
            literal_runs = stats.literal_runs,
            literal_bytes = stats.literal_bytes,
            "Generated delta"
        );

        Ok(stats)
    }
}

/// State of one delta generation pass
struct DeltaPass<'a, W: Write + Seek> {
    block_size: usize,
    max_run: u32,
    /// Bytes of the current candidate block, oldest first
    window: VecDeque<u8>,
    rolling: &'a mut PolynomialRolling,
    strong: &'a mut dyn StrongHash,
    index: &'a mut SignatureIndex,
    out: BufWriter<&'a mut W>,
    /// Bytes written so far, relative to the start of the delta
    written: u64,
    run_open: bool,
    run_len: u32,
    /// (offset of the length field, final length) per literal run
    patches: Vec<(u64, u32)>,
    stats: DeltaStats,
}

impl<W: Write + Seek> DeltaPass<'_, W> {
    fn push_byte(&mut self, byte: u8) -> Result<()> {
        if self.window.len() < self.block_size {
            self.window.push_back(byte);
            self.rolling.absorb(byte);
        } else if let Some(evicted) = self.window.pop_front() {
            self.window.push_back(byte);
            self.rolling.slide(byte, evicted);
            self.push_literal(evicted)?;
        }

        if self.window.len() == self.block_size {
            self.try_match()?;
        }
        Ok(())
    }

    /// Look the window up in the index and emit a MATCH or open a literal run
    fn try_match(&mut self) -> Result<()> {
        let weak = self.rolling.value();
        let mut matched = None;

        if self.index.contains_weak(weak) {
            self.stats.weak_hits += 1;

            self.strong.reset();
            let (front, back) = self.window.as_slices();
            self.strong.update(front);
            self.strong.update(back);
            let digest = self.strong.digest();

            matched = self.index.lookup_and_consume(weak, &digest);
        }

        match matched {
            Some(block_index) => {
                self.stats.matches += 1;
                if self.run_open {
                    self.close_run();
                }
                self.write(&[MATCH])?;
                self.write(&block_index.to_be_bytes())?;
                self.stats.match_records += 1;

                self.window.clear();
                self.rolling.reset();
            }
            None => {
                if !self.run_open {
                    self.open_run()?;
                }
            }
        }
        Ok(())
    }

    fn open_run(&mut self) -> Result<()> {
        self.write(&[MISMATCH])?;
        self.patches.push((self.written, 0));
        self.write(&0u32.to_be_bytes())?;
        self.run_open = true;
        self.run_len = 0;
        self.stats.literal_runs += 1;
        Ok(())
    }

    fn close_run(&mut self) {
        if let Some(patch) = self.patches.last_mut() {
            patch.1 = self.run_len;
        }
        self.run_open = false;
        self.run_len = 0;
    }

    fn push_literal(&mut self, byte: u8) -> Result<()> {
        debug_assert!(self.run_open, "literal byte outside of a run");
        if self.run_len == self.max_run {
            self.close_run();
            self.open_run()?;
        }
        self.write(&[byte])?;
        self.run_len += 1;
        self.stats.literal_bytes += 1;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Handle the tail of the source, then backpatch every run length
    fn finish(mut self, start: u64) -> Result<DeltaStats> {
        // A short final window never reached the full-window lookup; it may
        // still match the base's short final block.
        if !self.window.is_empty() && self.window.len() < self.block_size {
            self.try_match()?;
        }

        while let Some(byte) = self.window.pop_front() {
            self.push_literal(byte)?;
        }
        if self.run_open {
            self.close_run();
        }

        let end = start + self.written;
        for &(offset, length) in &self.patches {
            self.out.seek(SeekFrom::Start(start + offset))?;
            self.out.write_all(&length.to_be_bytes())?;
        }
        if !self.patches.is_empty() {
            self.out.seek(SeekFrom::Start(end))?;
        }
        self.out.flush()?;

        self.stats.delta_bytes = self.written;
        Ok(self.stats)
    }
}
