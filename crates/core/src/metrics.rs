//! Metrics definitions for the flattening pipeline.
//!
//! Metrics are collected using the `metrics` crate and can be exported
//! to Prometheus via `metrics-exporter-prometheus`.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Instant;

/// Initialize all metric descriptions.
/// Call this once at startup before any metrics are recorded.
pub fn init_metrics() {
    describe_counter!(
        "transactions_flattened_total",
        "Total number of transactions successfully flattened"
    );
    describe_counter!(
        "transactions_skipped_total",
        "Total number of transactions skipped, by reason"
    );
    describe_counter!(
        "flatten_fallbacks_total",
        "Total number of transactions flattened without event attribution"
    );
    describe_counter!(
        "calls_emitted_total",
        "Total number of call records emitted"
    );
    describe_histogram!(
        "flatten_duration_seconds",
        "Time taken to flatten a transaction in seconds"
    );
}

/// Record a successfully flattened transaction and its emitted calls.
pub fn record_transaction_flattened(calls: usize) {
    counter!("transactions_flattened_total").increment(1);
    counter!("calls_emitted_total").increment(calls as u64);
}

/// Record a skipped transaction.
///
/// # Arguments
/// * `reason` - Stable error label (e.g. "batch_too_large", "decode")
pub fn record_transaction_skipped(reason: &str) {
    counter!("transactions_skipped_total", "reason" => reason.to_string()).increment(1);
}

/// Record a fallback to basic (unattributed) flattening.
pub fn record_flatten_fallback() {
    counter!("flatten_fallbacks_total").increment(1);
}

/// Record flattening duration.
pub fn record_flatten_duration(duration_secs: f64) {
    histogram!("flatten_duration_seconds").record(duration_secs);
}

/// A timer that automatically records duration when dropped.
pub struct ProcessingTimer {
    start: Instant,
}

impl ProcessingTimer {
    /// Start a new processing timer.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for ProcessingTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ProcessingTimer {
    fn drop(&mut self) {
        record_flatten_duration(self.start.elapsed().as_secs_f64());
    }
}
