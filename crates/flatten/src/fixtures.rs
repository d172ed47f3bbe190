//! Test fixtures shared by the flattener modules.

use serde_json::json;
use unnest_core::models::{AccountId, BlockHash, Call, EventRecord, Transaction};

use crate::address::SubstrateMultisig;
use crate::config::FlattenerConfig;
use crate::extractors::ExtractContext;
use crate::registry::ExtractorRegistry;

pub fn account(byte: u8) -> AccountId {
    AccountId([byte; 32])
}

pub fn hex_account(byte: u8) -> serde_json::Value {
    json!(account(byte).to_hex())
}

pub fn event(module: &str, method: &str, data: serde_json::Value) -> EventRecord {
    EventRecord {
        index: 0,
        module: module.into(),
        method: method.into(),
        data,
    }
}

/// Number a list of events by position.
pub fn log(events: Vec<EventRecord>) -> Vec<EventRecord> {
    events
        .into_iter()
        .enumerate()
        .map(|(i, event)| EventRecord {
            index: i as u32,
            ..event
        })
        .collect()
}

pub fn ok() -> serde_json::Value {
    json!({ "result": { "Ok": null } })
}

pub fn err(error: &str) -> serde_json::Value {
    json!({ "result": { "Err": { error: null } } })
}

pub fn remark() -> Call {
    Call::new("system", "remark").with_arg("remark", json!("0x00"))
}

pub fn transfer() -> Call {
    Call::new("balances", "transfer_keep_alive")
        .with_arg("dest", hex_account(9))
        .with_arg("value", json!(1_000))
}

pub fn batch_call(method: &str, calls: Vec<Call>) -> Call {
    Call::new("utility", method).with_arg("calls", calls)
}

pub fn proxy_call(real: u8, call: Call) -> Call {
    Call::new("proxy", "proxy")
        .with_arg("real", json!({ "Id": account(real).to_hex() }))
        .with_arg("force_proxy_type", json!(null))
        .with_arg("call", call)
}

pub fn multisig_call(threshold: u16, others: &[u8], call: Call) -> Call {
    let others: Vec<String> = others.iter().map(|b| account(*b).to_hex()).collect();
    Call::new("multisig", "as_multi")
        .with_arg("threshold", json!(threshold))
        .with_arg("other_signatories", json!(others))
        .with_arg("maybe_timepoint", json!(null))
        .with_arg("call", call)
}

pub fn item_completed() -> EventRecord {
    event("utility", "ItemCompleted", json!({}))
}

pub fn item_failed(error: &str) -> EventRecord {
    event("utility", "ItemFailed", json!({ "error": { error: null } }))
}

pub fn batch_completed() -> EventRecord {
    event("utility", "BatchCompleted", json!({}))
}

pub fn batch_interrupted(index: u64, error: &str) -> EventRecord {
    event(
        "utility",
        "BatchInterrupted",
        json!({ "index": index, "error": { error: null } }),
    )
}

pub fn remarked() -> EventRecord {
    event("system", "Remarked", json!({}))
}

pub fn transferred() -> EventRecord {
    event("balances", "Transfer", json!({}))
}

pub fn extrinsic_success() -> EventRecord {
    event("system", "ExtrinsicSuccess", json!({ "dispatch_info": {} }))
}

pub fn transaction(call: Call, events: Vec<EventRecord>) -> Transaction {
    Transaction {
        block_number: 1_000,
        block_hash: BlockHash([0x11; 32]),
        timestamp: None,
        index: 2,
        signer: Some(account(1)),
        call,
        events: log(events),
        dispatch_error: None,
        dispatch_info: None,
    }
}

/// Owned configuration an [`ExtractContext`] can borrow from.
pub struct ExtractEnv {
    pub config: FlattenerConfig,
    pub registry: ExtractorRegistry,
}

impl ExtractEnv {
    pub fn new() -> Self {
        Self {
            config: FlattenerConfig::default(),
            registry: ExtractorRegistry::default(),
        }
    }

    pub fn ctx<'t>(&'t self, call: &'t Call, events: &'t [EventRecord]) -> ExtractContext<'t> {
        ExtractContext {
            call,
            origin: Some(account(1)),
            dispatch_error: None,
            events,
            config: &self.config,
            registry: &self.registry,
            deriver: &SubstrateMultisig,
        }
    }
}
