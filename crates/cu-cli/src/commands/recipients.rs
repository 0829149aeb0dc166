//! Recipients command: the users a usage report would be sent to.

use anyhow::{Context, Result};
use cu_core::{GroupKey, INACTIVITY_USER, UsagePipeline};

use crate::commands::report::run_pipeline;
use crate::input;
use crate::{Config, InputArgs};

/// Distinct charged users of an aggregated pipeline, without placeholder users.
///
/// Stops that had no preceding start are charged to an empty user, and
/// unattended starts to [`INACTIVITY_USER`]; neither is a person.
pub fn recipients(pipeline: &UsagePipeline) -> Result<Vec<String>> {
    let users = pipeline
        .distinct_values(GroupKey::AttributedUser)
        .context("failed to collect users")?;
    let (people, placeholders): (Vec<String>, Vec<String>) = users
        .into_iter()
        .partition(|user| !user.is_empty() && user != INACTIVITY_USER);
    if !placeholders.is_empty() {
        tracing::debug!(?placeholders, "skipping placeholder users");
    }
    Ok(people)
}

/// Runs the recipients command.
pub fn run(input_args: &InputArgs, separator: &str, config: &Config) -> Result<()> {
    let loaded = input::load(input_args, config)?;
    let pipeline = run_pipeline(loaded.events, loaded.now_ms, &[GroupKey::AttributedUser])?;
    let users = recipients(&pipeline)?;

    if users.is_empty() {
        tracing::warn!("no users charged with usage in window");
    } else {
        println!("{}", users.join(separator));
    }
    Ok(())
}
