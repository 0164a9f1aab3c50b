//! Configuration file
//!
//! ```json
//! {
//!   "project_id": "demo",
//!   "namespace": "tenant-a",
//!   "history_limit": 20,
//!   "history_path": "./dsquery-state.json",
//!   "log_level": "info"
//! }
//! ```
//!
//! Only `project_id` is required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::Severity;
use crate::session::{QueryHistory, DEFAULT_HISTORY_LIMIT};

use super::errors::{CliError, CliResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Project keys are resolved against (required)
    pub project_id: String,

    /// Namespace queries run in; absent or empty is the default namespace
    #[serde(default)]
    pub namespace: Option<String>,

    /// Number of remembered queries (default 20)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// State file for drafts and history; no history is kept without one
    #[serde(default)]
    pub history_path: Option<PathBuf>,

    /// Minimum log severity (default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.project_id.trim().is_empty() {
            return Err(CliError::config_error("project_id must not be empty"));
        }

        if self.history_limit == 0 {
            return Err(CliError::config_error("history_limit must be > 0"));
        }

        self.severity()?;

        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> CliResult<Severity> {
        self.log_level.parse::<Severity>().map_err(CliError::config_error)
    }

    /// Namespace with the empty string folded into the default
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    pub fn history(&self) -> QueryHistory {
        QueryHistory::new(self.history_limit)
    }
}
