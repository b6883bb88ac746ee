//! Metrics recorder for synchronization passes
//!
//! Records counters and timings through the `metrics` facade. Nothing is
//! exported unless the host application installs a recorder.

use crate::sync::{ApplySummary, DeltaStats, SignatureSummary};
use ::metrics::{counter, describe_counter, describe_histogram, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    describe_counter!(
        "deltasync_signatures_generated_total",
        "Total number of signatures generated"
    );
    describe_counter!(
        "deltasync_signature_blocks_total",
        "Total number of base blocks summarised into signatures"
    );
    describe_counter!(
        "deltasync_deltas_generated_total",
        "Total number of deltas generated"
    );
    describe_counter!(
        "deltasync_weak_hits_total",
        "Windows whose weak hash matched a signature bucket"
    );
    describe_counter!(
        "deltasync_block_matches_total",
        "Weak hash hits confirmed by the strong hash"
    );
    describe_counter!(
        "deltasync_literal_bytes_total",
        "Source bytes sent as literals"
    );
    describe_counter!(
        "deltasync_deltas_applied_total",
        "Total number of deltas applied"
    );
    describe_counter!(
        "deltasync_bytes_reconstructed_total",
        "Total bytes written to reconstructed targets"
    );
    describe_counter!(
        "deltasync_failures_total",
        "Synchronization passes that failed"
    );

    describe_histogram!(
        "deltasync_pass_duration_seconds",
        "Duration of a single signature, delta or apply pass"
    );
}

/// Record a completed signature pass
pub fn record_signature_generated(summary: &SignatureSummary) {
    counter!("deltasync_signatures_generated_total").increment(1);
    counter!("deltasync_signature_blocks_total").increment(summary.blocks as u64);
}

/// Record a completed delta generation pass
pub fn record_delta_generated(stats: &DeltaStats) {
    counter!("deltasync_deltas_generated_total").increment(1);
    counter!("deltasync_weak_hits_total").increment(stats.weak_hits);
    counter!("deltasync_block_matches_total").increment(stats.matches);
    counter!("deltasync_literal_bytes_total").increment(stats.literal_bytes);
}

/// Record a completed delta application pass
pub fn record_delta_applied(summary: &ApplySummary) {
    counter!("deltasync_deltas_applied_total").increment(1);
    counter!("deltasync_bytes_reconstructed_total").increment(summary.bytes_written);
}

/// Record a failed pass
pub fn record_failure(pass: &'static str) {
    counter!("deltasync_failures_total", "pass" => pass).increment(1);
}

/// Record the duration of a pass
pub fn record_pass_duration(pass: &'static str, duration: Duration) {
    histogram!("deltasync_pass_duration_seconds", "pass" => pass).record(duration.as_secs_f64());
}

/// Helper struct to time a pass and record its duration
pub struct OperationTimer {
    pass: &'static str,
    start_time: Instant,
}

impl OperationTimer {
    /// Start timing a pass
    pub fn start(pass: &'static str) -> Self {
        Self {
            pass,
            start_time: Instant::now(),
        }
    }

    /// Get current duration
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Stop timing and record the duration
    pub fn stop(self) -> Duration {
        let duration = self.start_time.elapsed();
        record_pass_duration(self.pass, duration);
        duration
    }
}
