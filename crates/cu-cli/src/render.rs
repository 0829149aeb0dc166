//! Text rendering of usage tables.

use std::fmt::Write;

use clap::ValueEnum;
use cu_core::UsageTable;
use serde::{Deserialize, Serialize};

/// Output format for the usage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Bordered table with a single rule under the header.
    #[default]
    Psql,
    /// Bordered table with a rule between every row.
    Grid,
    /// Space-aligned columns without borders.
    Plain,
    /// JSON array of row objects.
    Json,
}

const HOURS_HEADER: &str = "hours";

/// Rendered cells with per-column widths.
struct Layout {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
}

impl Layout {
    fn new(table: &UsageTable) -> Self {
        let headers: Vec<String> = table
            .group_by()
            .iter()
            .map(|key| key.as_str().to_string())
            .chain(std::iter::once(HOURS_HEADER.to_string()))
            .collect();
        let rows: Vec<Vec<String>> = table
            .rows()
            .iter()
            .map(|row| {
                row.values
                    .iter()
                    .cloned()
                    .chain(std::iter::once(format!("{:.2}", row.hours)))
                    .collect()
            })
            .collect();

        let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
        for row in &rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        Self {
            headers,
            rows,
            widths,
        }
    }

    /// Pads each cell; the trailing hours column is right-aligned.
    fn padded<'a>(&'a self, cells: &'a [String]) -> impl Iterator<Item = String> + 'a {
        let last = cells.len().saturating_sub(1);
        cells
            .iter()
            .zip(&self.widths)
            .enumerate()
            .map(move |(idx, (cell, &width))| {
                if idx == last {
                    format!("{cell:>width$}")
                } else {
                    format!("{cell:<width$}")
                }
            })
    }

    fn rule(&self, fill: char, edge: char) -> String {
        let segments: Vec<String> = self
            .widths
            .iter()
            .map(|w| fill.to_string().repeat(w + 2))
            .collect();
        format!("{edge}{}{edge}", segments.join("+"))
    }

    fn bordered_line(&self, cells: &[String]) -> String {
        let cells: Vec<String> = self.padded(cells).collect();
        format!("| {} |", cells.join(" | "))
    }

    fn plain_line(&self, cells: &[String]) -> String {
        let cells: Vec<String> = self.padded(cells).collect();
        cells.join("  ")
    }
}

/// Renders `table` in `format`. The result always ends with a newline.
pub fn render_table(table: &UsageTable, format: TableFormat) -> anyhow::Result<String> {
    if format == TableFormat::Json {
        let mut json = serde_json::to_string_pretty(table)?;
        json.push('\n');
        return Ok(json);
    }
    if table.is_empty() {
        return Ok("(no usage in window)\n".to_string());
    }

    let layout = Layout::new(table);
    let mut output = String::new();

    match format {
        TableFormat::Psql => {
            writeln!(output, "{}", layout.rule('-', '+'))?;
            writeln!(output, "{}", layout.bordered_line(&layout.headers))?;
            writeln!(output, "{}", layout.rule('-', '|'))?;
            for row in &layout.rows {
                writeln!(output, "{}", layout.bordered_line(row))?;
            }
            writeln!(output, "{}", layout.rule('-', '+'))?;
        }
        TableFormat::Grid => {
            writeln!(output, "{}", layout.rule('-', '+'))?;
            writeln!(output, "{}", layout.bordered_line(&layout.headers))?;
            writeln!(output, "{}", layout.rule('=', '+'))?;
            for row in &layout.rows {
                writeln!(output, "{}", layout.bordered_line(row))?;
                writeln!(output, "{}", layout.rule('-', '+'))?;
            }
        }
        TableFormat::Plain => {
            writeln!(output, "{}", layout.plain_line(&layout.headers))?;
            for row in &layout.rows {
                writeln!(output, "{}", layout.plain_line(row))?;
            }
        }
        TableFormat::Json => unreachable!("handled above"),
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cu_core::{Contribution, EventKind, GroupKey, aggregate};
    use insta::assert_snapshot;

    fn contribution(resource: &str, user: &str, minutes: f64) -> Contribution {
        Contribution {
            resource_id: resource.to_string(),
            event_type: EventKind::Terminating,
            attributed_user: user.to_string(),
            minutes,
        }
    }

    fn sample_table() -> UsageTable {
        aggregate(
            &[
                contribution("ml", "bob", 15.0),
                contribution("etl", "alice", 90.0),
            ],
            &[GroupKey::AttributedUser, GroupKey::ResourceId],
        )
        .unwrap()
    }

    #[test]
    fn test_render_psql() {
        let output = render_table(&sample_table(), TableFormat::Psql).unwrap();
        assert_snapshot!(output.trim_end(), @r"
        +-----------------+-------------+-------+
        | attributed_user | resource_id | hours |
        |-----------------+-------------+-------|
        | alice           | etl         |  1.50 |
        | bob             | ml          |  0.25 |
        +-----------------+-------------+-------+
        ");
    }

    #[test]
    fn test_render_grid() {
        let output = render_table(&sample_table(), TableFormat::Grid).unwrap();
        assert_snapshot!(output.trim_end(), @r"
        +-----------------+-------------+-------+
        | attributed_user | resource_id | hours |
        +=================+=============+=======+
        | alice           | etl         |  1.50 |
        +-----------------+-------------+-------+
        | bob             | ml          |  0.25 |
        +-----------------+-------------+-------+
        ");
    }

    #[test]
    fn test_render_plain() {
        let output = render_table(&sample_table(), TableFormat::Plain).unwrap();
        assert_snapshot!(output.trim_end(), @r"
        attributed_user  resource_id  hours
        alice            etl           1.50
        bob              ml            0.25
        ");
    }

    #[test]
    fn test_render_json() {
        let output = render_table(&sample_table(), TableFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed[0]["attributed_user"], "alice");
        assert_eq!(parsed[1]["resource_id"], "ml");
        assert_eq!(parsed[1]["hours"], 0.25);
    }

    #[test]
    fn test_render_empty_table() {
        let table = aggregate(&[], &[GroupKey::AttributedUser]).unwrap();
        assert_eq!(
            render_table(&table, TableFormat::Psql).unwrap(),
            "(no usage in window)\n"
        );
        assert_eq!(render_table(&table, TableFormat::Json).unwrap(), "[]\n");
    }

    #[test]
    fn test_format_deserializes_lowercase() {
        let format: TableFormat = serde_json::from_str("\"grid\"").unwrap();
        assert_eq!(format, TableFormat::Grid);
    }
}
