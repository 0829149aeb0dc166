//! Stateful reconstruct → aggregate chain.

use crate::aggregate::{GroupKey, UsageTable, aggregate};
use crate::error::UsageError;
use crate::event::Event;
use crate::reconstruct::{Contribution, reconstruct_all};

/// Holds an event list and the results of each stage run over it.
///
/// Stages must run in order; asking for a stage's output before the stage
/// has produced it fails with [`UsageError::NoDataAvailable`].
#[derive(Debug, Default)]
pub struct UsagePipeline {
    events: Vec<Event>,
    contributions: Option<Vec<Contribution>>,
    table: Option<UsageTable>,
}

impl UsagePipeline {
    pub const fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            contributions: None,
            table: None,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Reconstructs contributions for every resource as of `now`.
    ///
    /// Any previously aggregated table is discarded. On failure the pipeline
    /// holds no contributions.
    pub fn reconstruct(&mut self, now: i64) -> Result<&[Contribution], UsageError> {
        self.table = None;
        self.contributions = None;
        let contributions = reconstruct_all(&self.events, now)?;
        Ok(self.contributions.insert(contributions).as_slice())
    }

    pub fn contributions(&self) -> Option<&[Contribution]> {
        self.contributions.as_deref()
    }

    /// Aggregates the reconstructed contributions.
    pub fn aggregate(&mut self, group_by: &[GroupKey]) -> Result<&UsageTable, UsageError> {
        let contributions = self
            .contributions
            .as_deref()
            .ok_or(UsageError::NoDataAvailable("no reconstructed contributions"))?;
        let table = aggregate(contributions, group_by)?;
        Ok(&*self.table.insert(table))
    }

    pub fn table(&self) -> Option<&UsageTable> {
        self.table.as_ref()
    }

    /// Unique values of one column of the aggregated table.
    pub fn distinct_values(&self, key: GroupKey) -> Result<Vec<String>, UsageError> {
        self.table
            .as_ref()
            .ok_or(UsageError::NoDataAvailable("no aggregated result"))?
            .distinct_values(key)
    }
}
