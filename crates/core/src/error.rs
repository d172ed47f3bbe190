//! Error types for the flattening domain layer.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`FlattenError`] - Decomposition failures for a single transaction
//! - [`SourceError`] - Transaction input errors
//! - [`SinkError`] - Call record output errors
//! - [`PipelineError`] - Top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Flatten Errors
// =============================================================================

/// Failures raised while decomposing one transaction.
///
/// Every variant except [`FlattenError::EventLimitExceeded`] rejects the
/// whole transaction. The event limit is recoverable: the flattener falls
/// back to basic (unattributed) mode when running in auto mode.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlattenError {
    /// A composite call is missing a required argument.
    #[error("Missing argument '{argument}' in {call}")]
    MissingArgument {
        /// "module.method" of the call being unwrapped.
        call: String,
        /// Argument name (or positional index).
        argument: String,
    },

    /// A correlated event is missing a required data field.
    #[error("Missing field '{field}' in event {event}")]
    MissingEventField {
        /// "module.method" of the event.
        event: String,
        /// Field name.
        field: String,
    },

    /// A correlated event carries positional data only.
    #[error("Event {0} has no named fields")]
    NoNamedFields(String),

    /// An argument exists but has an unexpected shape.
    #[error("Invalid argument '{argument}' in {call}: {reason}")]
    InvalidArgument {
        call: String,
        argument: String,
        reason: String,
    },

    /// The transaction emitted more events than correlation is allowed to scan.
    #[error("Too many events: {count} exceeds limit of {limit}")]
    EventLimitExceeded { count: usize, limit: usize },

    /// A batch declares more inner calls than allowed.
    #[error("Batch too large: {count} calls exceeds limit of {limit}")]
    BatchTooLarge { count: usize, limit: usize },

    /// Composite calls are nested deeper than allowed.
    #[error("Nesting too deep at level {level_id}: limit is {limit}")]
    NestingTooDeep { level_id: String, limit: usize },
}

impl FlattenError {
    /// Short, stable label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingArgument { .. } => "missing_argument",
            Self::MissingEventField { .. } => "missing_event_field",
            Self::NoNamedFields(_) => "no_named_fields",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::EventLimitExceeded { .. } => "event_limit_exceeded",
            Self::BatchTooLarge { .. } => "batch_too_large",
            Self::NestingTooDeep { .. } => "nesting_too_deep",
        }
    }

    /// Whether the flattener may retry the transaction in basic mode.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::EventLimitExceeded { .. })
    }
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors produced while reading decoded transactions.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Underlying reader failed.
    #[error("Read error: {0}")]
    Io(#[from] std::io::Error),

    /// A single input record could not be decoded.
    ///
    /// The pipeline skips the record and continues.
    #[error("Decoding error at line {line}: {message}")]
    Decode { line: u64, message: String },
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors produced while writing call records.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Underlying writer failed.
    #[error("Write error: {0}")]
    Io(#[from] std::io::Error),

    /// Record serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// Pipeline Errors
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::services::PipelineService`].
/// Flattening errors never reach it: the pipeline skips the transaction.
/// Shutdown is a normal stop and returns the stats.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input error that cannot be skipped.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Output error.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for flattening operations.
pub type FlattenResult<T> = Result<T, FlattenError>;

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;
