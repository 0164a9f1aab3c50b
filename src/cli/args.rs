//! CLI argument definitions using clap
//!
//! Commands:
//! - dsquery --config <path> build
//! - dsquery --config <path> join
//! - dsquery --config <path> aggregate
//! - dsquery --config <path> edit
//! - dsquery --config <path> history

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dsquery - query construction and join resolution for a document store
#[derive(Parser, Debug)]
#[command(name = "dsquery")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./dsquery.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

/// Every command reads one JSON request line from stdin
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Build the query variants for a kind and clause list
    Build,

    /// Merge fetched rows into result rows through key properties
    Join,

    /// Reduce rows to count/sum/avg/min/max of a field
    Aggregate,

    /// Convert between wire values and editable text
    Edit,

    /// Show or clear the recorded query history
    History,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Build => "build",
            Command::Join => "join",
            Command::Aggregate => "aggregate",
            Command::Edit => "edit",
            Command::History => "history",
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["dsquery", "build", "--config", "/tmp/x.json"]).unwrap();
        assert_eq!(cli.command, Command::Build);
        assert_eq!(cli.config, PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["dsquery", "edit"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("./dsquery.json"));
    }
}
