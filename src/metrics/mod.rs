//! Metrics and observability module
//!
//! Key metrics exposed:
//! - Signature and delta pass counts
//! - Weak-hash hits versus confirmed block matches
//! - Literal bytes sent and bytes reconstructed
//! - Pass durations

pub mod recorder;

pub use recorder::{
    init_metrics, record_delta_applied, record_delta_generated, record_failure,
    record_signature_generated, OperationTimer,
};
