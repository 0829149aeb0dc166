//! Report command for printing usage tables.
//!
//! This module implements `cluster-usage report` with a date window, grouping
//! columns and output formats (psql, grid, plain, JSON).

use anyhow::{Context, Result};
use cu_core::{Event, GroupKey, UsagePipeline, UsageTable};
use serde::Serialize;

use crate::commands::util::ReportWindow;
use crate::input;
use crate::render::{TableFormat, render_table};
use crate::{Config, InputArgs};

/// Reconstructs sessions and aggregates them by `group_by`.
pub fn run_pipeline(
    events: Vec<Event>,
    now_ms: i64,
    group_by: &[GroupKey],
) -> Result<UsagePipeline> {
    let mut pipeline = UsagePipeline::new(events);
    let contributions = pipeline
        .reconstruct(now_ms)
        .context("failed to reconstruct sessions")?
        .len();
    tracing::debug!(contributions, "sessions reconstructed");
    pipeline
        .aggregate(group_by)
        .context("failed to aggregate usage")?;
    Ok(pipeline)
}

/// JSON report structure.
#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    start: String,
    end: String,
    group_by: Vec<&'static str>,
    rows: &'a UsageTable,
}

/// Formats the report for `window`, including its header.
pub fn format_report(
    window: &ReportWindow,
    table: &UsageTable,
    format: TableFormat,
) -> Result<String> {
    if format == TableFormat::Json {
        let report = JsonReport {
            start: window.start.format("%Y-%m-%d").to_string(),
            end: window.end.format("%Y-%m-%d").to_string(),
            group_by: table.group_by().iter().map(|k| k.as_str()).collect(),
            rows: table,
        };
        let mut output = serde_json::to_string_pretty(&report)?;
        output.push('\n');
        return Ok(output);
    }

    let body = render_table(table, format)?;
    Ok(format!(
        "Usage from {} to {}:\n\n{body}",
        window.start.format("%Y-%m-%d"),
        window.end.format("%Y-%m-%d")
    ))
}

/// Runs the report command.
pub fn run(
    input_args: &InputArgs,
    group_by: Option<&str>,
    format: Option<TableFormat>,
    config: &Config,
) -> Result<()> {
    let group_by = match group_by {
        Some(names) => GroupKey::parse_list(names),
        None => config.group_keys(),
    }
    .context("invalid --group-by")?;
    let format = format.unwrap_or(config.format);

    let loaded = input::load(input_args, config)?;
    let pipeline = run_pipeline(loaded.events, loaded.now_ms, &group_by)?;
    let table = pipeline.table().context("no aggregated result")?;

    print!("{}", format_report(&loaded.window, table, format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use cu_core::{EventKind, INACTIVITY_USER};
    use insta::assert_snapshot;

    const HOUR_MS: i64 = 3_600_000;

    fn window() -> ReportWindow {
        ReportWindow {
            start: NaiveDate::from_ymd_opt(2025, 1, 27).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 29).unwrap(),
        }
    }

    fn events() -> Vec<Event> {
        vec![
            Event::new("etl", 0, EventKind::Starting, "alice"),
            Event::new("etl", HOUR_MS, EventKind::Terminating, INACTIVITY_USER),
            Event::new("ml", 0, EventKind::Starting, "bob"),
        ]
    }

    #[test]
    fn test_report_by_user() {
        let pipeline = run_pipeline(events(), 3 * HOUR_MS, &[GroupKey::AttributedUser]).unwrap();
        let output = format_report(&window(), pipeline.table().unwrap(), TableFormat::Psql).unwrap();
        assert_snapshot!(output.trim_end(), @r"
        Usage from 2025-01-27 to 2025-01-29:

        +-----------------+-------+
        | attributed_user | hours |
        |-----------------+-------|
        | bob             |  3.00 |
        | alice           |  1.00 |
        +-----------------+-------+
        ");
    }

    #[test]
    fn test_report_json_includes_window() {
        let pipeline = run_pipeline(events(), 3 * HOUR_MS, &[GroupKey::ResourceId]).unwrap();
        let output = format_report(&window(), pipeline.table().unwrap(), TableFormat::Json).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["start"], "2025-01-27");
        assert_eq!(parsed["end"], "2025-01-29");
        assert_eq!(parsed["group_by"][0], "resource_id");
        assert_eq!(parsed["rows"][0]["resource_id"], "ml");
        assert_eq!(parsed["rows"][1]["hours"], 1.0);
    }

    #[test]
    fn test_unknown_event_kind_aborts_report() {
        let mut events = events();
        events.push(Event::new("ml", 2 * HOUR_MS, "PAUSED", "bob"));

        let err = run_pipeline(events, 3 * HOUR_MS, &[GroupKey::AttributedUser]).unwrap_err();

        assert!(err.to_string().contains("failed to reconstruct sessions"));
        assert!(format!("{err:#}").contains("PAUSED"));
    }

    #[test]
    fn test_empty_window_reports_no_usage() {
        let pipeline = run_pipeline(Vec::new(), 0, &[GroupKey::AttributedUser]).unwrap();
        let output = format_report(&window(), pipeline.table().unwrap(), TableFormat::Plain).unwrap();
        assert!(output.ends_with("(no usage in window)\n"));
    }
}
