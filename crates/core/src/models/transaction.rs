//! Decoded transactions as delivered by the decoding layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::call::Call;
use super::{AccountId, BlockHash};

/// Chain-reported failure reason for a call's execution.
///
/// Kept as decoded JSON (e.g. `{"Module": {"index": 5, "error": "0x02000000"}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DispatchError(pub serde_json::Value);

/// Dispatch information (weight, class, fee payment) reported for an extrinsic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pays_fee: Option<String>,
}

/// Event emitted while applying an extrinsic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Index within the block (0-based).
    pub index: u32,
    /// Pallet name (e.g., "Utility").
    pub module: String,
    /// Event variant name (e.g., "ItemCompleted").
    pub method: String,
    /// Event data: a JSON object for named fields, an array for positional ones.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl EventRecord {
    /// "module.method" as written by the decoder.
    pub fn name(&self) -> String {
        format!("{}.{}", self.module, self.method)
    }
}

/// A decoded extrinsic with its event log and dispatch outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Block number containing this extrinsic.
    pub block_number: u64,
    /// Block hash containing this extrinsic.
    pub block_hash: BlockHash,
    /// Block timestamp (if available).
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    /// Index within the block (0-based).
    pub index: u32,
    /// Signer account (None for unsigned/inherent).
    #[serde(default)]
    pub signer: Option<AccountId>,
    /// The top-level call.
    pub call: Call,
    /// Events emitted by this extrinsic, in chronological order.
    #[serde(default)]
    pub events: Vec<EventRecord>,
    /// Error reported by `System.ExtrinsicFailed`, if any.
    #[serde(default)]
    pub dispatch_error: Option<DispatchError>,
    #[serde(default)]
    pub dispatch_info: Option<DispatchInfo>,
}

impl Transaction {
    /// Unique identifier: block_number-extrinsic_index.
    pub fn extrinsic_id(&self) -> String {
        format!("{}-{}", self.block_number, self.index)
    }

    /// Unique event identifier: extrinsic_id-event_index.
    pub fn event_id(&self, event: &EventRecord) -> String {
        format!("{}-{}", self.extrinsic_id(), event.index)
    }
}
