//! Core domain layer for the Unnest call flattener.
//!
//! This crate contains the domain models, port traits (interfaces), and
//! the pipeline service. It follows hexagonal architecture principles -
//! this is the innermost layer with no dependencies on infrastructure.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      unnest (binary)                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │        unnest-flatten          │         unnest-io          │
//! │  (registry, extractors, window)│   (JSON lines adapters)    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                     unnest-core  ← YOU ARE HERE             │
//! │               (models, ports, services)                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`models`] - Domain models (Transaction, Call, CallRecord, etc.)
//! - [`ports`] - Interface traits for adapters to implement
//! - [`services`] - Pipeline orchestration (PipelineService)
//! - [`error`] - Domain error types
//! - [`metrics`] - Prometheus metrics definitions
//!
//! # Ports
//!
//! - [`ports::TransactionSource`] - Stream decoded transactions
//! - [`ports::CallFlattener`] - Decompose one transaction into call records
//! - [`ports::CallSink`] - Persist call records
//!
//! # Pipeline Lifecycle
//!
//! 1. Open the transaction source
//! 2. Flatten each transaction with a fresh, per-transaction flattener
//! 3. Skip (and count) transactions the flattener rejects
//! 4. Write the produced call records in order
//! 5. Flush the sink on a fixed cadence and at the end

pub mod error;
pub mod metrics;
pub mod models;
pub mod ports;
pub mod services;
