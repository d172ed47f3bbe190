//! Port trait for the decoded transaction source.
//!
//! Implementations live in the adapter layer (e.g., `unnest-io`).

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

use crate::error::{SourceError, SourceResult};
use crate::models::Transaction;

/// Stream of decoded transactions, in arrival order.
///
/// [`SourceError::Decode`] items are per-record failures; the stream
/// continues after them.
pub type TransactionStream = Pin<Box<dyn Stream<Item = SourceResult<Transaction>> + Send>>;

/// Port trait for decoded transaction input.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    /// Open the source and return its transaction stream.
    async fn open(&self) -> SourceResult<TransactionStream>;

    /// Human-readable description for logs (e.g., a file path).
    fn describe(&self) -> String;
}

/// Whether a stream item can be skipped without stopping the pipeline.
pub fn is_skippable(error: &SourceError) -> bool {
    matches!(error, SourceError::Decode { .. })
}
