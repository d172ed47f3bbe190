//! Flattened call records produced by the flattener.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::call::CallArgs;
use super::transaction::{DispatchError, DispatchInfo, EventRecord};
use super::{AccountId, BlockHash};

// =============================================================================
// Level identifiers
// =============================================================================

/// Dot-separated position of a call in the decomposition tree.
///
/// The root is `"0"`; child `i` of `X` is `X.i`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LevelId(String);

impl LevelId {
    pub fn root() -> Self {
        Self("0".to_string())
    }

    pub fn child(&self, index: usize) -> Self {
        Self(format!("{}.{}", self.0, index))
    }

    /// Number of ancestors (the root has depth 0).
    pub fn depth(&self) -> usize {
        self.0.matches('.').count()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LevelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Delegation
// =============================================================================

/// How authority was handed off while unwrapping a composite call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelegationKind {
    /// `proxy.proxy` / `proxy.proxyAnnounced`: acting as the `real` account.
    Proxied,
    /// `multisig.*`: acting as the derived multisig account.
    Multisig,
}

/// One authority hand-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelegationLink {
    pub kind: DelegationKind,
    pub acting_address: AccountId,
}

impl DelegationLink {
    pub fn proxied(acting_address: AccountId) -> Self {
        Self {
            kind: DelegationKind::Proxied,
            acting_address,
        }
    }

    pub fn multisig(acting_address: AccountId) -> Self {
        Self {
            kind: DelegationKind::Multisig,
            acting_address,
        }
    }
}

// =============================================================================
// Call records
// =============================================================================

/// Event attributed to a call, with its stable identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallEvent {
    /// Unique identifier: extrinsic_id-event_index.
    pub id: String,
    #[serde(flatten)]
    pub event: EventRecord,
}

/// One atomic call of a flattened transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallRecord {
    /// Unique identifier of the enclosing extrinsic: block_number-extrinsic_index.
    pub extrinsic_id: String,
    pub block_number: u64,
    pub block_hash: BlockHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Position in the decomposition tree.
    pub level_id: LevelId,
    pub module: String,
    pub method: String,
    pub args: CallArgs,
    /// Signer of the enclosing extrinsic.
    pub signer: Option<AccountId>,
    /// This call's own failure, if any.
    pub dispatch_error: Option<DispatchError>,
    pub dispatch_info: Option<DispatchInfo>,
    /// Events caused by this call, in chronological order.
    pub events: Vec<CallEvent>,
    /// Authority hand-offs traversed to reach this call, outermost first.
    pub delegation: Vec<DelegationLink>,
}

impl CallRecord {
    /// "module.method" as written by the decoder.
    pub fn signature(&self) -> String {
        format!("{}.{}", self.module, self.method)
    }

    pub fn is_success(&self) -> bool {
        self.dispatch_error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_id_children() {
        let root = LevelId::root();
        let grandchild = root.child(1).child(0);
        assert_eq!(grandchild.as_str(), "0.1.0");
        assert_eq!(grandchild.depth(), 2);
        assert_eq!(root.depth(), 0);
    }

    #[test]
    fn test_delegation_kind_serialization() {
        let link = DelegationLink::proxied(AccountId([1; 32]));
        let json = serde_json::to_value(&link).unwrap();
        assert_eq!(json["kind"], "proxied");
        assert_eq!(json["acting_address"], format!("0x{}", "01".repeat(32)));
    }
}
