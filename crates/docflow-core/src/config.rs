//! Configuration: execution limits, venue pages and watch preferences.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file)
//! is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocflowConfig {
    pub execution: ExecutionConfig,
    pub venues: VenueConfig,
    pub watch: WatchConfig,
}

impl DocflowConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Maximum number of graph tasks in flight at once (0 = unbounded).
    pub max_concurrent_tasks: usize,
    /// Automatic re-attempts after a version conflict (0 or 1; larger values act as 1).
    pub max_conflict_retries: u32,
}

impl ExecutionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::up_to(self.max_conflict_retries)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: 4,
            max_conflict_retries: 1,
        }
    }
}

/// Pages where each action kind records its work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VenueConfig {
    /// Discussions live at `{discussion_prefix}/{year}/{title}`.
    pub discussion_prefix: String,
    /// Shared index of open discussions.
    pub discussion_list: String,
    /// Anchor after which new list entries are inserted.
    pub list_anchor: String,
    /// Highest nomination ordinal tried before giving up.
    pub max_nominations: u32,
    /// User log of quick deletion requests; no logging when unset.
    pub quick_deletion_log: Option<String>,
    /// Criteria that are never logged.
    pub unlogged_criteria: Vec<String>,
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            discussion_prefix: "Wikipedia:Requests for deletion/Requests".to_string(),
            discussion_list: "Wikipedia:Requests for deletion".to_string(),
            list_anchor: "<!-- Add new entries to the TOP of the following list -->".to_string(),
            max_nominations: 10,
            quick_deletion_log: None,
            unlogged_criteria: Vec::new(),
        }
    }
}

/// Whether saved pages are added to the acting user's watch list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    pub tagged_page: bool,
    pub discussion: bool,
    pub list: bool,
}
