//! Call flattening engine for Unnest.
//!
//! Turns one decoded transaction into an ordered list of atomic call
//! records: composite calls (proxies, multisigs, batches, derivative and
//! dispatch-as wrappers) are unwrapped depth-first, and the transaction's
//! event log is partitioned between the produced records.
//!
//! # Usage
//!
//! ```ignore
//! use unnest_flatten::{Decomposer, FlattenerConfig};
//!
//! let decomposer = Decomposer::new(FlattenerConfig::default());
//!
//! let mut flattener = decomposer.flattener(&transaction);
//! for record in flattener.flatten()? {
//!     println!("{} {}", record.level_id, record.signature());
//! }
//! ```
//!
//! # Extending the registry
//!
//! Runtimes that expose a composite call under another name can register
//! an alias for an existing kind:
//!
//! ```ignore
//! let mut registry = ExtractorRegistry::with_defaults();
//! registry.register("utility", "batch_v2", CompositeKind::Batch);
//!
//! let decomposer = Decomposer::with_registry(config, registry);
//! ```
//!
//! # Modes
//!
//! - [`FlattenMode::Correlated`] attributes every event to the call that
//!   caused it and rejects transactions above `max_events`.
//! - [`FlattenMode::Basic`] skips attribution: the whole log stays on the
//!   root record.
//! - [`FlattenMode::Auto`] correlates and falls back to basic when the
//!   event limit is exceeded.

pub mod address;
pub mod config;
pub mod extractors;
pub mod flattener;
pub mod registry;
pub mod utils;
pub mod window;

#[cfg(test)]
mod fixtures;

pub use address::{MultisigDeriver, SubstrateMultisig};
pub use config::{BatchAllEvents, FlattenMode, FlattenerConfig};
pub use flattener::{Decomposer, Flattener};
pub use registry::{CallKind, CompositeKind, ExtractorRegistry};
pub use window::{Boundary, EventWindow};
