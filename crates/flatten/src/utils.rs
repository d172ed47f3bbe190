//! Shared utilities for extractors.
//!
//! Argument and event-field extraction, account parsing, dispatch result
//! decoding and event-name matching.

use std::fmt;

use unnest_core::error::{FlattenError, FlattenResult};
use unnest_core::models::{AccountId, ArgValue, Call, DispatchError, EventRecord};

// =============================================================================
// Name matching
// =============================================================================

/// Compare two identifiers ignoring ASCII case and underscores.
///
/// `batch_all`, `batchAll` and `BatchAll` all compare equal.
pub fn eq_normalized(a: &str, b: &str) -> bool {
    let mut a = a.bytes().filter(|c| *c != b'_');
    let mut b = b.bytes().filter(|c| *c != b'_');
    loop {
        match (a.next(), b.next()) {
            (None, None) => return true,
            (Some(x), Some(y)) if x.eq_ignore_ascii_case(&y) => continue,
            _ => return false,
        }
    }
}

/// Normalized identifier, used as registry key component.
pub fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// A well-known event, matched by module and method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventName {
    pub module: &'static str,
    pub method: &'static str,
}

impl EventName {
    pub const fn new(module: &'static str, method: &'static str) -> Self {
        Self { module, method }
    }

    pub fn matches(&self, event: &EventRecord) -> bool {
        eq_normalized(self.module, &event.module) && eq_normalized(self.method, &event.method)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.method)
    }
}

/// Boundary events emitted by composite calls.
pub mod events {
    use super::EventName;

    pub const PROXY_EXECUTED: EventName = EventName::new("proxy", "ProxyExecuted");
    pub const MULTISIG_EXECUTED: EventName = EventName::new("multisig", "MultisigExecuted");
    pub const ITEM_COMPLETED: EventName = EventName::new("utility", "ItemCompleted");
    pub const ITEM_FAILED: EventName = EventName::new("utility", "ItemFailed");
    pub const BATCH_COMPLETED: EventName = EventName::new("utility", "BatchCompleted");
    pub const BATCH_INTERRUPTED: EventName = EventName::new("utility", "BatchInterrupted");
    pub const BATCH_COMPLETED_WITH_ERRORS: EventName =
        EventName::new("utility", "BatchCompletedWithErrors");
    pub const DISPATCHED_AS: EventName = EventName::new("utility", "DispatchedAs");
}

/// Position of the first matching event.
pub fn find_event(events: &[EventRecord], name: EventName) -> Option<usize> {
    events.iter().position(|e| name.matches(e))
}

/// Position of the last matching event.
///
/// Wrapper calls emit their completion event after every event of the
/// wrapped call, so the outermost wrapper owns the last occurrence.
pub fn rfind_event(events: &[EventRecord], name: EventName) -> Option<usize> {
    events.iter().rposition(|e| name.matches(e))
}

// =============================================================================
// Call arguments
// =============================================================================

fn missing_argument(call: &Call, argument: impl Into<String>) -> FlattenError {
    FlattenError::MissingArgument {
        call: call.signature(),
        argument: argument.into(),
    }
}

fn invalid_argument(call: &Call, argument: &str, reason: &str) -> FlattenError {
    FlattenError::InvalidArgument {
        call: call.signature(),
        argument: argument.to_string(),
        reason: reason.to_string(),
    }
}

/// Named argument, or `MissingArgument`.
pub fn call_arg<'a>(call: &'a Call, name: &str) -> FlattenResult<&'a ArgValue> {
    call.args.get(name).ok_or_else(|| missing_argument(call, name))
}

/// Positional argument, or `MissingArgument`.
pub fn positional_arg(call: &Call, index: usize) -> FlattenResult<&ArgValue> {
    call.args
        .positional(index)
        .map(|arg| &arg.value)
        .ok_or_else(|| missing_argument(call, format!("#{}", index)))
}

/// Named argument holding a single wrapped call.
pub fn inner_call<'a>(call: &'a Call, name: &str) -> FlattenResult<&'a Call> {
    call_arg(call, name)?
        .as_call()
        .ok_or_else(|| invalid_argument(call, name, "expected a call"))
}

/// Positional argument holding a single wrapped call.
pub fn positional_call(call: &Call, index: usize) -> FlattenResult<&Call> {
    positional_arg(call, index)?
        .as_call()
        .ok_or_else(|| invalid_argument(call, &format!("#{}", index), "expected a call"))
}

/// Positional argument holding a list of calls.
pub fn positional_calls(call: &Call, index: usize) -> FlattenResult<&[Call]> {
    positional_arg(call, index)?
        .as_calls()
        .ok_or_else(|| invalid_argument(call, &format!("#{}", index), "expected a list of calls"))
}

/// Named argument holding an account (hex, `{"Id": ..}` or byte array).
pub fn account_arg(call: &Call, name: &str) -> FlattenResult<AccountId> {
    parse_account(&call_arg(call, name)?.to_json())
        .ok_or_else(|| invalid_argument(call, name, "expected an account"))
}

/// Named argument holding a list of accounts.
pub fn accounts_arg(call: &Call, name: &str) -> FlattenResult<Vec<AccountId>> {
    let value = call_arg(call, name)?.to_json();
    let serde_json::Value::Array(items) = value else {
        return Err(invalid_argument(call, name, "expected a list of accounts"));
    };
    items
        .iter()
        .map(|item| {
            parse_account(item).ok_or_else(|| invalid_argument(call, name, "expected an account"))
        })
        .collect()
}

/// Named argument holding a `u16` (e.g. a multisig threshold).
pub fn u16_arg(call: &Call, name: &str) -> FlattenResult<u16> {
    parse_u64(&call_arg(call, name)?.to_json())
        .and_then(|v| u16::try_from(v).ok())
        .ok_or_else(|| invalid_argument(call, name, "expected a u16"))
}

// =============================================================================
// Event fields
// =============================================================================

/// Named event field.
///
/// Fails with `NoNamedFields` when the decoder produced positional data.
pub fn event_field<'a>(event: &'a EventRecord, field: &str) -> FlattenResult<&'a serde_json::Value> {
    match &event.data {
        serde_json::Value::Object(fields) => {
            fields
                .get(field)
                .ok_or_else(|| FlattenError::MissingEventField {
                    event: event.name(),
                    field: field.to_string(),
                })
        }
        _ => Err(FlattenError::NoNamedFields(event.name())),
    }
}

/// Decode a `Result<(), DispatchError>` event field.
pub fn dispatch_result(event: &EventRecord, field: &str) -> FlattenResult<Option<DispatchError>> {
    Ok(parse_dispatch_result(event_field(event, field)?))
}

/// Interpret a decoded `Result` value.
///
/// Accepts `{"Err": e}` / `{"Ok": ..}` in any case. Anything else is
/// treated as success.
pub fn parse_dispatch_result(value: &serde_json::Value) -> Option<DispatchError> {
    let serde_json::Value::Object(obj) = value else {
        return None;
    };
    obj.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case("err"))
        .map(|(_, err)| DispatchError(err.clone()))
}

/// Decode a `DispatchError` event field (e.g. `ItemFailed.error`).
pub fn dispatch_error(event: &EventRecord, field: &str) -> FlattenResult<DispatchError> {
    Ok(DispatchError(event_field(event, field)?.clone()))
}

// =============================================================================
// Value parsing
// =============================================================================

/// Parse an account ID from various JSON representations.
///
/// Handles multiple formats that may be returned by Substrate decoders:
/// - Hex string: `"0x1234..."`
/// - Wrapped object: `{ "Id": "0x..." }`
/// - Array wrapper: `["0x..."]`
/// - Byte array: `[b0, b1, ..., b31]`
pub fn parse_account(value: &serde_json::Value) -> Option<AccountId> {
    match value {
        serde_json::Value::String(s) => AccountId::from_hex(s).ok(),
        serde_json::Value::Object(obj) => obj
            .get("Id")
            .or_else(|| obj.get("id"))
            .and_then(parse_account),
        serde_json::Value::Array(arr) => {
            if arr.len() == 1 {
                return parse_account(&arr[0]);
            }
            if arr.len() != 32 {
                return None;
            }
            let mut bytes = [0u8; 32];
            for (i, v) in arr.iter().enumerate() {
                bytes[i] = u8::try_from(v.as_u64()?).ok()?;
            }
            Some(AccountId(bytes))
        }
        _ => None,
    }
}

/// Parse a u64 from JSON (number or decimal string).
pub fn parse_u64(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================
