//! Decoded calls and their ordered, named arguments.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A decoded call: module, method and ordered named arguments.
///
/// Composite calls carry their inner calls as [`ArgValue::Call`] or
/// [`ArgValue::Calls`] arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Call {
    /// Module (pallet) name, e.g. "Proxy" or "proxy".
    pub module: String,
    /// Method (call) name, e.g. "proxy" or "batch_all".
    pub method: String,
    /// Ordered named arguments.
    #[serde(default)]
    pub args: CallArgs,
}

impl Call {
    pub fn new(module: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            method: method.into(),
            args: CallArgs::default(),
        }
    }

    /// Append an argument, keeping declaration order.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.args.push(name, value);
        self
    }

    /// "module.method" as written by the decoder.
    pub fn signature(&self) -> String {
        format!("{}.{}", self.module, self.method)
    }
}

/// One named call argument.
#[derive(Debug, Clone, PartialEq)]
pub struct CallArg {
    pub name: String,
    pub value: ArgValue,
}

/// Argument value: a nested call, a list of nested calls, or plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Call(Box<Call>),
    Calls(Vec<Call>),
    Value(serde_json::Value),
}

impl ArgValue {
    pub fn as_call(&self) -> Option<&Call> {
        match self {
            Self::Call(call) => Some(call),
            _ => None,
        }
    }

    pub fn as_calls(&self) -> Option<&[Call]> {
        match self {
            Self::Calls(calls) => Some(calls),
            Self::Value(serde_json::Value::Array(arr)) if arr.is_empty() => Some(&[]),
            _ => None,
        }
    }

    /// JSON view of the value, nested calls included.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Value(value) => value.clone(),
            other => serde_json::to_value(other).unwrap_or(serde_json::Value::Null),
        }
    }
}

impl From<Call> for ArgValue {
    fn from(call: Call) -> Self {
        Self::Call(Box::new(call))
    }
}

impl From<Vec<Call>> for ArgValue {
    fn from(calls: Vec<Call>) -> Self {
        Self::Calls(calls)
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for ArgValue {
    fn from(value: &str) -> Self {
        Self::Value(serde_json::Value::String(value.to_string()))
    }
}

// =============================================================================
// Ordered argument list
// =============================================================================

/// Ordered named arguments, serialized as a JSON object in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs(Vec<CallArg>);

impl CallArgs {
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<ArgValue>) {
        self.0.push(CallArg {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Look up an argument by name.
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.iter().find(|arg| arg.name == name).map(|arg| &arg.value)
    }

    /// Look up an argument by declaration position.
    pub fn positional(&self, index: usize) -> Option<&CallArg> {
        self.0.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CallArg> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for CallArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for arg in &self.0 {
            map.serialize_entry(&arg.name, &arg.value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CallArgs {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ArgsVisitor;

        impl<'de> Visitor<'de> for ArgsVisitor {
            type Value = CallArgs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of call arguments")
            }

            fn visit_map<M: MapAccess<'de>>(self, mut access: M) -> Result<CallArgs, M::Error> {
                let mut args = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, value)) = access.next_entry::<String, ArgValue>()? {
                    args.push(CallArg { name, value });
                }
                Ok(CallArgs(args))
            }
        }

        deserializer.deserialize_map(ArgsVisitor)
    }
}
