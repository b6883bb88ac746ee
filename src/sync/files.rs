//! Path-level helpers around [`SyncEngine`]
//!
//! Outputs are always created fresh. When a pass fails, whatever it managed
//! to write is removed so a half-written signature, delta or target is never
//! left behind looking valid.

use crate::sync::apply::ApplySummary;
use crate::sync::delta::DeltaStats;
use crate::sync::engine::SyncEngine;
use crate::sync::error::{Result, SyncError};
use crate::sync::signature::SignatureSummary;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

impl SyncEngine {
    /// Write the signature of the file at `base` to `signature`
    pub fn generate_signature_file(&self, base: &Path, signature: &Path) -> Result<SignatureSummary> {
        let mut input = self.open_input(base)?;
        write_output(signature, |out| {
            let mut out = BufWriter::with_capacity(self.config().io_buffer_size, out);
            let summary = self.generate_signature(&mut input, &mut out)?;
            out.flush()?;
            Ok(summary)
        })
    }

    /// Write the delta of the file at `source` against `signature` to `delta`
    pub fn generate_delta_file(&self, source: &Path, signature: &Path, delta: &Path) -> Result<DeltaStats> {
        let mut input = self.open_input(source)?;
        let mut sig = self.open_input(signature)?;
        // The generator buffers its own writes and seeks back to patch lengths
        write_output(delta, |out| self.generate_delta(&mut input, &mut sig, out))
    }

    /// Rebuild the source into `target` from the files at `base` and `delta`
    pub fn apply_delta_file(&self, base: &Path, delta: &Path, target: &Path) -> Result<ApplySummary> {
        let mut base = self.open_input(base)?;
        let mut delta = self.open_input(delta)?;
        write_output(target, |out| {
            let mut out = BufWriter::with_capacity(self.config().io_buffer_size, out);
            let summary = self.apply_delta(&mut base, &mut delta, &mut out)?;
            out.flush()?;
            Ok(summary)
        })
    }

    /// Async variant of [`SyncEngine::generate_signature_file`]
    pub async fn generate_signature_file_async(
        &self,
        base: impl Into<PathBuf>,
        signature: impl Into<PathBuf>,
    ) -> Result<SignatureSummary> {
        let (base, signature) = (base.into(), signature.into());
        self.spawn(move |engine| engine.generate_signature_file(&base, &signature))
            .await
    }

    /// Async variant of [`SyncEngine::generate_delta_file`]
    pub async fn generate_delta_file_async(
        &self,
        source: impl Into<PathBuf>,
        signature: impl Into<PathBuf>,
        delta: impl Into<PathBuf>,
    ) -> Result<DeltaStats> {
        let (source, signature, delta) = (source.into(), signature.into(), delta.into());
        self.spawn(move |engine| engine.generate_delta_file(&source, &signature, &delta))
            .await
    }

    /// Async variant of [`SyncEngine::apply_delta_file`]
    pub async fn apply_delta_file_async(
        &self,
        base: impl Into<PathBuf>,
        delta: impl Into<PathBuf>,
        target: impl Into<PathBuf>,
    ) -> Result<ApplySummary> {
        let (base, delta, target) = (base.into(), delta.into(), target.into());
        self.spawn(move |engine| engine.apply_delta_file(&base, &delta, &target))
            .await
    }

    /// Run a blocking pass on the tokio blocking pool
    async fn spawn<T, F>(&self, pass: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&SyncEngine) -> Result<T> + Send + 'static,
    {
        let engine = self.clone();
        tokio::task::spawn_blocking(move || pass(&engine))
            .await
            .map_err(|e| SyncError::BackgroundTask(e.to_string()))?
    }

    fn open_input(&self, path: &Path) -> Result<BufReader<File>> {
        let file = File::open(path)?;
        Ok(BufReader::with_capacity(self.config().io_buffer_size, file))
    }
}

/// Create `path` afresh and run `write` on it, removing the file on failure
fn write_output<T, F>(path: &Path, write: F) -> Result<T>
where
    F: FnOnce(&mut File) -> Result<T>,
{
    let mut file = File::create(path)?;
    let result = write(&mut file).and_then(|value| {
        file.sync_all()?;
        Ok(value)
    });
    drop(file);

    if let Err(e) = &result {
        tracing::warn!("Discarding partial output {}: {}", path.display(), e);
        if let Err(remove_err) = fs::remove_file(path) {
            tracing::warn!(
                "Failed to remove partial output {}: {}",
                path.display(),
                remove_err
            );
        }
    }
    result
}
