//! Loading and selecting events from an exported event log.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use cu_core::{Event, INACTIVITY_USER};

use crate::Config;
use crate::cli::InputArgs;
use crate::commands::util::{ReportWindow, parse_datetime};

/// Events selected for a report, with the window and instant they are evaluated at.
#[derive(Debug)]
pub struct LoadedInput {
    pub window: ReportWindow,
    pub events: Vec<Event>,
    /// Epoch milliseconds closing sessions still running.
    pub now_ms: i64,
}

/// Reads the event log named by `args` and keeps the events that count.
pub fn load(args: &InputArgs, config: &Config) -> Result<LoadedInput> {
    let today = Local::now().date_naive();
    let window = ReportWindow::resolve(args.start_date, args.end_date, today)?;
    let now = match args.now.as_deref() {
        Some(s) => parse_datetime(s).context("invalid --now")?,
        None => Utc::now(),
    };

    let events = read_events(&args.events)?;
    let selection = EventSelection {
        window_ms: window.bounds_ms(),
        clusters: &args.clusters,
        exclude_prefixes: &config.exclude_prefixes,
    };
    let events = selection.apply(events);

    tracing::debug!(
        start = %window.start,
        end = %window.end,
        now = %now,
        events = events.len(),
        "loaded events"
    );
    Ok(LoadedInput {
        window,
        events,
        now_ms: now.timestamp_millis(),
    })
}

/// Reads a JSONL event log from `path`, or stdin when `path` is `-`.
pub fn read_events(path: &Path) -> Result<Vec<Event>> {
    if path == Path::new("-") {
        let stdin = io::stdin();
        return parse_events(stdin.lock());
    }
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_events(BufReader::new(file))
        .with_context(|| format!("failed to read {}", path.display()))
}

/// Parses one event per line, skipping blank lines.
pub fn parse_events<R: BufRead>(reader: R) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut event: Event = serde_json::from_str(trimmed)
            .with_context(|| format!("invalid JSON on line {}", idx + 1))?;
        if event.resource_id.trim().is_empty() {
            anyhow::bail!("missing resource_id on line {}", idx + 1);
        }
        if event.user.trim().is_empty() {
            event.user = INACTIVITY_USER.to_string();
        }
        events.push(event);
    }
    Ok(events)
}

/// Which events of a log take part in a report.
#[derive(Debug, Clone, Default)]
pub struct EventSelection<'a> {
    /// Half-open window in epoch milliseconds.
    pub window_ms: (i64, i64),
    /// Explicit clusters to keep. Empty keeps every cluster not excluded.
    pub clusters: &'a [String],
    /// Cluster name prefixes dropped when `clusters` is empty.
    pub exclude_prefixes: &'a [String],
}

impl EventSelection<'_> {
    pub fn matches(&self, event: &Event) -> bool {
        let (start, end) = self.window_ms;
        if event.timestamp < start || event.timestamp >= end {
            return false;
        }
        if self.clusters.is_empty() {
            !self
                .exclude_prefixes
                .iter()
                .any(|prefix| event.resource_id.starts_with(prefix.as_str()))
        } else {
            self.clusters.iter().any(|c| *c == event.resource_id)
        }
    }

    /// Keeps the matching events, preserving their order.
    pub fn apply(&self, events: Vec<Event>) -> Vec<Event> {
        let total = events.len();
        let selected: Vec<Event> = events.into_iter().filter(|e| self.matches(e)).collect();
        tracing::debug!(total, selected = selected.len(), "selected events");
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Cursor;

    use cu_core::EventKind;

    #[test]
    fn parse_events_skips_blank_lines() {
        let input = r#"{"resource_id":"etl","timestamp":1,"type":"STARTING","user":"alice"}

{"cluster_name":"etl","timestamp":2,"type":"TERMINATING"}
"#;
        let events = parse_events(Cursor::new(input)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].resource_id, "etl");
        assert_eq!(events[1].user, INACTIVITY_USER);
    }

    #[test]
    fn parse_events_normalizes_blank_user() {
        let input = r#"{"resource_id":"etl","timestamp":1,"type":"TERMINATING","user":"  "}"#;
        let events = parse_events(Cursor::new(input)).unwrap();
        assert_eq!(events[0].user, INACTIVITY_USER);
    }

    #[test]
    fn parse_events_reports_line_number() {
        let input = "{\"resource_id\":\"etl\",\"timestamp\":1,\"type\":\"STARTING\"}\nnot json\n";
        let err = parse_events(Cursor::new(input)).unwrap_err();
        assert!(err.to_string().contains("invalid JSON on line 2"));
    }

    #[test]
    fn parse_events_rejects_missing_resource() {
        let input = r#"{"resource_id":"","timestamp":1,"type":"STARTING"}"#;
        let err = parse_events(Cursor::new(input)).unwrap_err();
        assert!(err.to_string().contains("missing resource_id on line 1"));
    }

    #[test]
    fn parse_events_keeps_unknown_types_for_reconstruction() {
        let input = r#"{"resource_id":"etl","timestamp":1,"type":"PAUSED","user":"alice"}"#;
        let events = parse_events(Cursor::new(input)).unwrap();
        assert!(events[0].kind().is_err());
    }

    fn event(resource: &str, ts: i64) -> Event {
        Event::new(resource, ts, EventKind::Starting, "alice")
    }

    #[test]
    fn selection_applies_half_open_window() {
        let selection = EventSelection {
            window_ms: (10, 20),
            ..EventSelection::default()
        };
        assert!(!selection.matches(&event("etl", 9)));
        assert!(selection.matches(&event("etl", 10)));
        assert!(selection.matches(&event("etl", 19)));
        assert!(!selection.matches(&event("etl", 20)));
    }

    #[test]
    fn selection_excludes_job_clusters_by_default() {
        let prefixes = vec!["job-".to_string()];
        let selection = EventSelection {
            window_ms: (0, 100),
            clusters: &[],
            exclude_prefixes: &prefixes,
        };
        let kept = selection.apply(vec![event("job-123-run-4", 1), event("etl", 1)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].resource_id, "etl");
    }

    #[test]
    fn explicit_clusters_override_exclusions() {
        let prefixes = vec!["job-".to_string()];
        let clusters = vec!["job-nightly".to_string()];
        let selection = EventSelection {
            window_ms: (0, 100),
            clusters: &clusters,
            exclude_prefixes: &prefixes,
        };
        assert!(selection.matches(&event("job-nightly", 1)));
        assert!(!selection.matches(&event("etl", 1)));
    }
}
