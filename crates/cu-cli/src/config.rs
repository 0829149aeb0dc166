//! Configuration loading and management.

use std::path::{Path, PathBuf};

use cu_core::{GroupKey, UsageError};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Deserializer, Serialize};

use crate::render::TableFormat;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default grouping columns, e.g. `["user", "cluster_name"]`.
    #[serde(deserialize_with = "string_or_list")]
    pub group_by: Vec<String>,

    /// Default output format.
    pub format: TableFormat,

    /// Clusters whose name starts with one of these are left out of reports
    /// unless requested explicitly.
    #[serde(deserialize_with = "string_or_list")]
    pub exclude_prefixes: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            group_by: vec!["user".to_string(), "cluster_name".to_string()],
            format: TableFormat::Psql,
            exclude_prefixes: vec!["job-".to_string()],
        }
    }
}

impl Config {
    /// Loads configuration from default locations, then `config_path` if given,
    /// then the environment.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Environment variables (CLUSTER_USAGE_*)
        figment = figment.merge(Env::prefixed("CLUSTER_USAGE_"));

        figment.extract()
    }

    /// Parses the configured grouping columns.
    pub fn group_keys(&self) -> Result<Vec<GroupKey>, UsageError> {
        GroupKey::parse_list(&self.group_by.join(","))
    }
}

/// Accepts a list or a comma-separated string, as set from the environment.
fn string_or_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrList {
        One(String),
        Many(Vec<String>),
    }

    Ok(match StringOrList::deserialize(deserializer)? {
        StringOrList::One(s) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(String::from)
            .collect(),
        StringOrList::Many(list) => list,
    })
}

/// Returns the platform-specific config directory.
///
/// On Linux: `~/.config/cluster-usage`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("cluster-usage"))
}
