//! Pipeline service - drives transactions through the flattener.
//!
//! Transactions are processed strictly in arrival order. A transaction
//! that cannot be flattened is logged, counted and skipped; the pipeline
//! only stops on shutdown, end of input, or an output failure.

use std::sync::Arc;

use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{PipelineError, PipelineResult};
use crate::metrics::{
    ProcessingTimer, record_flatten_fallback, record_transaction_flattened,
    record_transaction_skipped,
};
use crate::models::Transaction;
use crate::ports::{Attribution, CallFlattener, CallSink, TransactionSource, is_skippable};

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the pipeline service.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Flush the sink after this many transactions (0 = only at the end).
    pub flush_every: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { flush_every: 100 }
    }
}

/// Counters reported when the pipeline stops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Transactions flattened and written.
    pub processed: u64,
    /// Transactions skipped (undecodable or rejected by the flattener).
    pub skipped: u64,
    /// Call records written.
    pub calls: u64,
    /// Transactions flattened without event attribution.
    pub fallbacks: u64,
}

// =============================================================================
// PipelineService
// =============================================================================

/// Reads transactions, flattens them, writes call records.
pub struct PipelineService<S: TransactionSource, K: CallSink, F: CallFlattener> {
    config: PipelineConfig,
    source: Arc<S>,
    sink: Arc<K>,
    flattener: Arc<F>,
}

impl<S: TransactionSource, K: CallSink, F: CallFlattener> PipelineService<S, K, F> {
    pub fn new(config: PipelineConfig, source: Arc<S>, sink: Arc<K>, flattener: Arc<F>) -> Self {
        Self {
            config,
            source,
            sink,
            flattener,
        }
    }

    /// Run until the source is exhausted or shutdown is requested.
    #[instrument(skip_all, fields(source = %self.source.describe()))]
    pub async fn run(
        &self,
        mut shutdown_rx: tokio::sync::watch::Receiver<bool>,
    ) -> PipelineResult<PipelineStats> {
        info!("🧵 Starting pipeline");

        let mut stream = self.source.open().await?;
        let mut stats = PipelineStats::default();
        let mut since_flush = 0usize;
        let mut watching = true;

        loop {
            if *shutdown_rx.borrow() {
                debug!("Shutdown requested");
                break;
            }

            let item = tokio::select! {
                biased;
                changed = shutdown_rx.changed(), if watching => {
                    // Sender dropped: nobody can request shutdown anymore.
                    watching = changed.is_ok();
                    continue;
                }
                item = stream.next() => item,
            };

            let Some(item) = item else {
                debug!("Source exhausted");
                break;
            };

            match item {
                Ok(transaction) => {
                    if self.process_transaction(&transaction, &mut stats).await? {
                        since_flush += 1;
                    }
                }
                Err(e) if is_skippable(&e) => {
                    warn!(error = %e, "⚠️  Skipping undecodable input");
                    record_transaction_skipped("decode");
                    stats.skipped += 1;
                }
                Err(e) => return Err(PipelineError::Source(e)),
            }

            if self.config.flush_every > 0 && since_flush >= self.config.flush_every {
                self.sink.flush().await?;
                since_flush = 0;
            }
        }

        self.sink.flush().await?;

        info!(
            processed = stats.processed,
            skipped = stats.skipped,
            calls = stats.calls,
            fallbacks = stats.fallbacks,
            "🏁 Pipeline finished"
        );

        Ok(stats)
    }

    /// Flatten and write one transaction.
    ///
    /// Returns `Ok(false)` when the transaction was skipped.
    async fn process_transaction(
        &self,
        transaction: &Transaction,
        stats: &mut PipelineStats,
    ) -> PipelineResult<bool> {
        let extrinsic = transaction.extrinsic_id();
        let _timer = ProcessingTimer::new();

        let output = match self.flattener.flatten(transaction) {
            Ok(output) => output,
            Err(e) => {
                warn!(extrinsic = %extrinsic, kind = e.kind(), error = %e, "⚠️  Skipping transaction");
                record_transaction_skipped(e.kind());
                stats.skipped += 1;
                return Ok(false);
            }
        };

        if output.attribution == Attribution::Basic {
            record_flatten_fallback();
            stats.fallbacks += 1;
        }

        self.sink.write(&output.calls).await?;

        trace!(extrinsic = %extrinsic, calls = output.calls.len(), "Transaction flattened");
        record_transaction_flattened(output.calls.len());
        stats.processed += 1;
        stats.calls += output.calls.len() as u64;

        Ok(true)
    }
}
