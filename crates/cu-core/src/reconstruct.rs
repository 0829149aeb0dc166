//! Session reconstruction.
//!
//! Turns one resource's lifecycle events into per-event usage contributions.
//!
//! # Algorithm Summary
//!
//! 1. Order events by timestamp (stable, so ties keep input order)
//! 2. Locate the resource's final event once, up front
//! 3. Walk the events pairing each with its predecessor:
//!    - `TERMINATING` charges the time since the previous event to the
//!      previous event's user
//!    - `STARTING` as the final event is an open session, charged up to `now`
//!    - any other `STARTING` contributes nothing on its own

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::UsageError;
use crate::event::{Event, EventKind};

const MS_PER_MINUTE: f64 = 60_000.0;

/// Usage time derived from a single event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contribution {
    pub resource_id: String,
    pub event_type: EventKind,
    /// The user charged for `minutes`.
    pub attributed_user: String,
    /// Elapsed usage, never negative.
    pub minutes: f64,
}

/// Reconstructs contributions for a single resource.
///
/// `events` must all belong to the same resource; they need not be sorted.
/// `now` is the evaluation instant in epoch milliseconds and closes a
/// trailing open session.
///
/// Fails with [`UsageError::InvalidEventKind`] on the first event whose type
/// is not a lifecycle kind. No contributions are returned in that case.
pub fn reconstruct(events: &[Event], now: i64) -> Result<Vec<Contribution>, UsageError> {
    reconstruct_partition(events.iter().collect(), now)
}

/// Reconstructs contributions for a mixed event list.
///
/// Events are partitioned by `resource_id` and each partition is reconstructed
/// independently on the rayon pool. Output is grouped by resource in
/// ascending resource order. If any resource fails, the error of the first
/// failing resource (in that order) is returned.
pub fn reconstruct_all(events: &[Event], now: i64) -> Result<Vec<Contribution>, UsageError> {
    let mut partitions: BTreeMap<&str, Vec<&Event>> = BTreeMap::new();
    for event in events {
        partitions
            .entry(event.resource_id.as_str())
            .or_default()
            .push(event);
    }
    tracing::debug!(
        events = events.len(),
        resources = partitions.len(),
        "reconstructing sessions"
    );

    let results: Vec<Result<Vec<Contribution>, UsageError>> = partitions
        .into_iter()
        .collect::<Vec<_>>()
        .into_par_iter()
        .map(|(_, partition)| reconstruct_partition(partition, now))
        .collect();

    let mut contributions = Vec::with_capacity(events.len());
    for result in results {
        contributions.extend(result?);
    }
    Ok(contributions)
}

fn reconstruct_partition(
    mut events: Vec<&Event>,
    now: i64,
) -> Result<Vec<Contribution>, UsageError> {
    events.sort_by_key(|event| event.timestamp);

    let Some(last_index) = events.len().checked_sub(1) else {
        return Ok(Vec::new());
    };

    let mut contributions = Vec::with_capacity(events.len());
    let mut previous: Option<&Event> = None;

    for (index, event) in events.iter().copied().enumerate() {
        let kind = event
            .kind()
            .map_err(|err| UsageError::InvalidEventKind {
                resource_id: event.resource_id.clone(),
                kind: err.0,
            })?;

        // Before the first event the resource is assumed to have existed since epoch.
        let previous_timestamp = previous.map_or(0, |p| p.timestamp);
        let previous_user = previous.map_or("", |p| p.user.as_str());

        let (elapsed_ms, attributed_user) = match kind {
            EventKind::Terminating => (
                event.timestamp.saturating_sub(previous_timestamp),
                previous_user,
            ),
            EventKind::Starting if index == last_index => {
                (now.saturating_sub(event.timestamp), event.user.as_str())
            }
            EventKind::Starting => (0, event.user.as_str()),
        };

        contributions.push(Contribution {
            resource_id: event.resource_id.clone(),
            event_type: kind,
            attributed_user: attributed_user.to_string(),
            minutes: ms_to_minutes(elapsed_ms),
        });
        previous = Some(event);
    }

    if let Some(first) = events.first() {
        tracing::trace!(
            resource = %first.resource_id,
            contributions = contributions.len(),
            "resource reconstructed"
        );
    }
    Ok(contributions)
}

#[expect(
    clippy::cast_precision_loss,
    reason = "sub-millisecond precision is irrelevant for minutes of usage"
)]
fn ms_to_minutes(ms: i64) -> f64 {
    (ms as f64 / MS_PER_MINUTE).max(0.0)
}
