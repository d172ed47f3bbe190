//! JSON-lines adapters for Unnest.
//!
//! - [`JsonLinesSource`] implements [`unnest_core::ports::TransactionSource`]
//!   over a file or standard input, one decoded transaction per line.
//! - [`JsonLinesSink`] implements [`unnest_core::ports::CallSink`] over any
//!   async writer, one call record per line.

mod sink;
mod source;

pub use sink::{DynWriter, JsonLinesSink, Output};
pub use source::{Input, JsonLinesSource, transaction_stream};
