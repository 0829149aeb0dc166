//! Cluster lifecycle events as consumed by the reconstructor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User recorded when a stop was not triggered by a person (e.g. auto-termination).
pub const INACTIVITY_USER: &str = "INACTIVITY";

/// Lifecycle event kinds that carry usage time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Starting,
    Terminating,
}

impl EventKind {
    /// Wire representation, as emitted by the cluster event API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starting => "STARTING",
            Self::Terminating => "TERMINATING",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "STARTING" => Ok(Self::Starting),
            "TERMINATING" => Ok(Self::Terminating),
            _ => Err(UnknownEventKind(s.to_string())),
        }
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

/// Error for event type strings that are not lifecycle kinds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

/// A single cluster lifecycle event.
///
/// `event_type` is kept as the raw string so that malformed logs reach the
/// reconstructor, which rejects them when computing durations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Cluster the event belongs to.
    #[serde(alias = "cluster_name")]
    pub resource_id: String,

    /// Epoch milliseconds.
    pub timestamp: i64,

    #[serde(rename = "type", alias = "event_type")]
    pub event_type: String,

    /// Who triggered the event, or [`INACTIVITY_USER`].
    #[serde(default = "default_user")]
    pub user: String,
}

fn default_user() -> String {
    INACTIVITY_USER.to_string()
}

impl Event {
    /// Creates an event. An empty `user` is recorded as [`INACTIVITY_USER`].
    pub fn new(
        resource_id: impl Into<String>,
        timestamp: i64,
        kind: impl fmt::Display,
        user: impl Into<String>,
    ) -> Self {
        let user = user.into();
        Self {
            resource_id: resource_id.into(),
            timestamp,
            event_type: kind.to_string(),
            user: if user.is_empty() { default_user() } else { user },
        }
    }

    /// Parses the raw event type.
    pub fn kind(&self) -> Result<EventKind, UnknownEventKind> {
        self.event_type.parse()
    }
}
