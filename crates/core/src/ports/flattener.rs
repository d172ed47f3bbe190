//! Port trait for the call flattening engine.
//!
//! The engine itself lives in `unnest-flatten`; the pipeline only depends
//! on this interface.

use serde::{Deserialize, Serialize};

use crate::error::FlattenResult;
use crate::models::{CallRecord, Transaction};

/// How events were attached to the produced records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribution {
    /// Each event belongs to the call that caused it.
    Correlated,
    /// The whole event log is attached to the root call.
    Basic,
}

/// Result of flattening one transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenOutput {
    pub calls: Vec<CallRecord>,
    pub attribution: Attribution,
}

/// Port trait for transaction decomposition.
///
/// Implementations must build fresh per-transaction state on each call;
/// no state may leak from one transaction to the next.
pub trait CallFlattener: Send + Sync {
    fn flatten(&self, transaction: &Transaction) -> FlattenResult<FlattenOutput>;
}
