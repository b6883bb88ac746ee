//! Synchronization engine
//!
//! Ties the three passes together under one [`SyncConfig`]:
//! signature of the base, delta of the source against that signature, and
//! reconstruction of the source from base plus delta.

use crate::config::SyncConfig;
use crate::metrics::{self, OperationTimer};
use crate::sync::apply::{ApplySummary, DeltaApplier};
use crate::sync::delta::DeltaStats;
use crate::sync::error::Result;
use crate::sync::generator::DeltaGenerator;
use crate::sync::index::SignatureIndex;
use crate::sync::signature::{SignatureGenerator, SignatureSummary};
use std::io::{Cursor, Read, Seek, Write};

#[derive(Debug, Clone)]
pub struct SyncEngine {
    config: SyncConfig,
}

impl SyncEngine {
    /// Create an engine; fails if the config is invalid
    pub fn new(config: SyncConfig) -> Result<Self> {
        config.validate()?;
        metrics::init_metrics();
        Ok(Self { config })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Write the signature of `base` to `out`
    pub fn generate_signature<R, W>(&self, base: &mut R, out: &mut W) -> Result<SignatureSummary>
    where
        R: Read,
        W: Write,
    {
        let timer = OperationTimer::start("signature");
        let mut generator =
            SignatureGenerator::new(self.config.block_size, self.config.strong_hash.build());

        let summary = generator
            .write_signature(base, out)
            .inspect_err(|_| metrics::record_failure("signature"))?;

        metrics::record_signature_generated(&summary);
        timer.stop();
        Ok(summary)
    }

    /// Write the delta of `source` against the signature read from `signature`
    ///
    /// The signature is fully loaded and validated before anything is
    /// written to `out`.
    pub fn generate_delta<R, S, W>(&self, source: &mut R, signature: &mut S, out: &mut W) -> Result<DeltaStats>
    where
        R: Read,
        S: Read,
        W: Write + Seek,
    {
        let timer = OperationTimer::start("delta");

        let mut index = SignatureIndex::load(signature, self.config.strong_hash.digest_len())
            .inspect_err(|_| metrics::record_failure("delta"))?;

        let mut generator =
            DeltaGenerator::new(self.config.block_size, self.config.strong_hash.build())
                .with_io_buffer_size(self.config.io_buffer_size);

        let stats = generator
            .generate(source, &mut index, out)
            .inspect_err(|_| metrics::record_failure("delta"))?;

        tracing::info!(
            possible = stats.weak_hits,
            found = stats.matches,
            "{}",
            stats
        );

        metrics::record_delta_generated(&stats);
        timer.stop();
        Ok(stats)
    }

    /// Rebuild the source into `target` from `base` and `delta`
    pub fn apply_delta<B, D, W>(&self, base: &mut B, delta: &mut D, target: &mut W) -> Result<ApplySummary>
    where
        B: Read + Seek,
        D: Read,
        W: Write,
    {
        let timer = OperationTimer::start("apply");

        let summary = DeltaApplier::new(self.config.block_size)
            .apply(base, delta, target)
            .inspect_err(|_| metrics::record_failure("apply"))?;

        metrics::record_delta_applied(&summary);
        timer.stop();
        Ok(summary)
    }

    /// Signature of an in-memory base
    pub fn signature_bytes(&self, base: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.generate_signature(&mut Cursor::new(base), &mut out)?;
        Ok(out)
    }

    /// Delta of an in-memory source against an in-memory signature
    pub fn delta_bytes(&self, source: &[u8], signature: &[u8]) -> Result<Vec<u8>> {
        let mut out = Cursor::new(Vec::new());
        self.generate_delta(&mut Cursor::new(source), &mut Cursor::new(signature), &mut out)?;
        Ok(out.into_inner())
    }

    /// Reconstruct an in-memory target from base and delta
    pub fn patch_bytes(&self, base: &[u8], delta: &[u8]) -> Result<Vec<u8>> {
        let mut target = Vec::new();
        self.apply_delta(&mut Cursor::new(base), &mut Cursor::new(delta), &mut target)?;
        Ok(target)
    }
}
