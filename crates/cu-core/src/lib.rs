//! Core domain logic for cluster usage reporting.
//!
//! This crate contains:
//! - Events: typed cluster lifecycle events
//! - Reconstruction: turning per-cluster event logs into usage contributions
//! - Aggregation: summing contributions into an hours table by group keys

mod aggregate;
mod error;
pub mod event;
mod pipeline;
mod reconstruct;

pub use aggregate::{AggregatedRow, GroupKey, UsageTable, aggregate};
pub use error::UsageError;
pub use event::{Event, EventKind, INACTIVITY_USER, UnknownEventKind};
pub use pipeline::UsagePipeline;
pub use reconstruct::{Contribution, reconstruct, reconstruct_all};
