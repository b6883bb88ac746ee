//! Delta synchronization module
//!
//! Provides rsync-style delta transfer capabilities using rolling checksums
//! and strong hashes for block-level file synchronization.

pub mod apply;
pub mod delta;
pub mod engine;
pub mod error;
pub mod files;
pub mod generator;
pub mod index;
pub mod rolling_hash;
pub mod signature;
pub mod strong_hash;

pub use apply::{ApplySummary, DeltaApplier};
pub use delta::{DeltaReader, DeltaRecord, DeltaStats};
pub use engine::SyncEngine;
pub use error::{Result, SyncError};
pub use generator::DeltaGenerator;
pub use index::SignatureIndex;
pub use rolling_hash::{PolynomialRolling, RollingHash};
pub use signature::{BlockSignature, SignatureGenerator, SignatureSummary};
pub use strong_hash::{Blake3Hash, Md5Hash, StrongHash, StrongHashKind};
