//! Flattener configuration.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How events are correlated with the produced calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlattenMode {
    /// Correlate events, falling back to basic mode above `max_events`.
    #[default]
    Auto,
    /// Always correlate; transactions above `max_events` are rejected.
    Correlated,
    /// Never correlate; the whole log is attached to the root call.
    Basic,
}

impl FromStr for FlattenMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "correlated" => Ok(Self::Correlated),
            "basic" => Ok(Self::Basic),
            _ => Err(format!(
                "Invalid flatten mode '{}'. Use 'auto', 'correlated' or 'basic'.",
                s
            )),
        }
    }
}

/// Event attribution for the items of a successful `utility.batchAll`.
///
/// Some runtime versions report no per-item events for a successful
/// batchAll; `None` reproduces that shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAllEvents {
    /// Split events per item, like `utility.batch`.
    #[default]
    Grouped,
    /// Items own no events; everything stays on the batchAll call.
    None,
}

impl FromStr for BatchAllEvents {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grouped" => Ok(Self::Grouped),
            "none" => Ok(Self::None),
            _ => Err(format!(
                "Invalid batchAll event mode '{}'. Use 'grouped' or 'none'.",
                s
            )),
        }
    }
}

/// Default ceiling on events scanned by correlation.
pub const DEFAULT_MAX_EVENTS: usize = 200;

/// Default ceiling on calls in a single batch.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 50;

/// Default ceiling on composite nesting depth.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Configuration for the flattener.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlattenerConfig {
    pub mode: FlattenMode,
    /// Event count above which correlation is refused.
    pub max_events: usize,
    /// Batch argument count above which the transaction is rejected.
    pub max_batch_size: usize,
    /// Maximum depth of a produced level id (root = 0).
    pub max_depth: usize,
    pub batch_all_events: BatchAllEvents,
}

impl Default for FlattenerConfig {
    fn default() -> Self {
        Self {
            mode: FlattenMode::Auto,
            max_events: DEFAULT_MAX_EVENTS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            batch_all_events: BatchAllEvents::Grouped,
        }
    }
}
