//! CLI subcommand implementations.

pub mod recipients;
pub mod report;
pub mod util;
