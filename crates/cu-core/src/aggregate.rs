//! Grouping contributions into an hours table.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::error::UsageError;
use crate::reconstruct::Contribution;

/// A contribution attribute that rows can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    ResourceId,
    AttributedUser,
    EventType,
}

impl GroupKey {
    /// Canonical column name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ResourceId => "resource_id",
            Self::AttributedUser => "attributed_user",
            Self::EventType => "event_type",
        }
    }

    /// Parses a comma-separated list such as `"user,cluster_name"`.
    ///
    /// Whitespace around names is ignored. An empty list is an error.
    pub fn parse_list(s: &str) -> Result<Vec<Self>, UsageError> {
        let keys = s
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Self::from_str)
            .collect::<Result<Vec<Self>, UsageError>>()?;
        if keys.is_empty() {
            return Err(UsageError::EmptyGroupBy);
        }
        Ok(keys)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupKey {
    type Err = UsageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resource_id" | "cluster_name" | "cluster" => Ok(Self::ResourceId),
            "attributed_user" | "user" => Ok(Self::AttributedUser),
            "event_type" | "type" => Ok(Self::EventType),
            _ => Err(UsageError::InvalidGroupKey(s.to_string())),
        }
    }
}

impl Contribution {
    /// The value of one grouping attribute.
    pub fn value_of(&self, key: GroupKey) -> &str {
        match key {
            GroupKey::ResourceId => &self.resource_id,
            GroupKey::AttributedUser => &self.attributed_user,
            GroupKey::EventType => self.event_type.as_str(),
        }
    }
}

/// One group of the usage table.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRow {
    /// One value per group key, in `group_by` order.
    pub values: Vec<String>,
    /// Usage hours rounded to two decimals.
    pub hours: f64,
}

/// Aggregated usage, ranked by hours descending.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageTable {
    group_by: Vec<GroupKey>,
    rows: Vec<AggregatedRow>,
}

impl UsageTable {
    pub fn group_by(&self) -> &[GroupKey] {
        &self.group_by
    }

    pub fn rows(&self) -> &[AggregatedRow] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Unique values of one grouping column, sorted.
    ///
    /// Fails with [`UsageError::InvalidGroupKey`] if the table is not grouped by `key`.
    pub fn distinct_values(&self, key: GroupKey) -> Result<Vec<String>, UsageError> {
        let column = self
            .group_by
            .iter()
            .position(|k| *k == key)
            .ok_or_else(|| UsageError::InvalidGroupKey(key.to_string()))?;

        let unique: BTreeSet<&str> = self
            .rows
            .iter()
            .map(|row| row.values[column].as_str())
            .collect();
        Ok(unique.into_iter().map(str::to_string).collect())
    }
}

/// Serializes as an array of objects keyed by column name plus `hours`.
impl Serialize for UsageTable {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.rows.iter().map(|row| RowView {
            group_by: &self.group_by,
            row,
        }))
    }
}

struct RowView<'a> {
    group_by: &'a [GroupKey],
    row: &'a AggregatedRow,
}

impl Serialize for RowView<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.group_by.len() + 1))?;
        for (key, value) in self.group_by.iter().zip(&self.row.values) {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.serialize_entry("hours", &self.row.hours)?;
        map.end()
    }
}

/// Groups contributions by `group_by` and sums their minutes into hours.
///
/// Rows are sorted by hours descending; equal hours are ordered by their
/// group values ascending. An empty `contributions` slice yields an empty table.
pub fn aggregate(
    contributions: &[Contribution],
    group_by: &[GroupKey],
) -> Result<UsageTable, UsageError> {
    if group_by.is_empty() {
        return Err(UsageError::EmptyGroupBy);
    }

    let mut minutes_by_group: HashMap<Vec<&str>, f64> = HashMap::new();
    for contribution in contributions {
        let values = group_by
            .iter()
            .map(|key| contribution.value_of(*key))
            .collect();
        *minutes_by_group.entry(values).or_insert(0.0) += contribution.minutes;
    }

    let mut rows: Vec<AggregatedRow> = minutes_by_group
        .into_iter()
        .map(|(values, minutes)| AggregatedRow {
            values: values.into_iter().map(str::to_string).collect(),
            hours: round_hours(minutes / 60.0),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.hours
            .total_cmp(&a.hours)
            .then_with(|| a.values.cmp(&b.values))
    });

    tracing::debug!(
        contributions = contributions.len(),
        rows = rows.len(),
        "aggregated usage"
    );
    Ok(UsageTable {
        group_by: group_by.to_vec(),
        rows,
    })
}

fn round_hours(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}
