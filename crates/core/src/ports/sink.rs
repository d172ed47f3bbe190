//! Port trait for flattened call record output.

use async_trait::async_trait;

use crate::error::SinkResult;
use crate::models::CallRecord;

/// Port trait for call record output.
///
/// Records of one transaction are written in a single call, in
/// flattening order.
#[async_trait]
pub trait CallSink: Send + Sync {
    /// Write the records of one transaction.
    async fn write(&self, records: &[CallRecord]) -> SinkResult<()>;

    /// Flush buffered output.
    async fn flush(&self) -> SinkResult<()>;
}
