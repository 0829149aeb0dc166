//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::render::TableFormat;

/// Cluster usage reporter.
///
/// Reconstructs start/stop sessions from an exported cluster event log and
/// reports usage hours per user and cluster.
#[derive(Debug, Parser)]
#[command(name = "cluster-usage", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print a usage table for a date window.
    Report {
        #[command(flatten)]
        input: InputArgs,

        /// Columns to group by, comma separated (e.g. user,cluster_name).
        #[arg(long)]
        group_by: Option<String>,

        /// Output format.
        #[arg(long, value_enum)]
        format: Option<TableFormat>,
    },

    /// Print the users charged with usage in a date window.
    Recipients {
        #[command(flatten)]
        input: InputArgs,

        /// Separator placed between users.
        #[arg(long, default_value = ",")]
        separator: String,
    },
}

/// Where events come from and which of them count.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// JSONL event log, or `-` for stdin.
    #[arg(long, default_value = "-")]
    pub events: PathBuf,

    /// First day of the window (YYYY-MM-DD). Defaults to Monday of this week.
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the window, inclusive (YYYY-MM-DD). Defaults to today.
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Clusters to include, comma separated. Defaults to all non-job clusters.
    #[arg(long, value_delimiter = ',')]
    pub clusters: Vec<String>,

    /// Evaluation instant for sessions still running (ISO 8601 or e.g. "2 hours ago").
    #[arg(long)]
    pub now: Option<String>,
}
