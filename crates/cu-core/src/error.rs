//! Error type shared by reconstruction and aggregation.

use thiserror::Error;

/// Errors raised by the usage engine.
///
/// All variants are fatal for the call that produced them; nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// An event carried a type other than `STARTING` or `TERMINATING`.
    #[error("invalid event kind {kind:?} for resource {resource_id}")]
    InvalidEventKind { resource_id: String, kind: String },

    /// A grouping attribute name did not resolve to a contribution field.
    #[error("invalid group key: {0:?}")]
    InvalidGroupKey(String),

    /// Aggregation was requested with no grouping attributes.
    #[error("at least one group key is required")]
    EmptyGroupBy,

    /// A stage ran before the stage that produces its input.
    #[error("no data available: {0}")]
    NoDataAvailable(&'static str),
}
