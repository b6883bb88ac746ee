//! rsync-style delta synchronization
//!
//! A base file is summarised into a signature of per-block weak and strong
//! hashes. A source file is scanned against that signature with a rolling
//! window to produce a compact delta of block references and literal runs,
//! and the delta is replayed against the base to rebuild the source.

pub mod config;
pub mod integrity;
pub mod metrics;
pub mod sync;

pub use config::SyncConfig;
pub use sync::{
    DeltaApplier, DeltaGenerator, DeltaRecord, DeltaStats, SignatureGenerator, SignatureIndex,
    SyncEngine, SyncError,
};
