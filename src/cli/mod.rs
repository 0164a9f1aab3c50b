//! CLI module for dsquery
//!
//! Provides command-line interface for:
//! - build: Render query variants from structured clauses
//! - join: Resolve key references against fetched rows
//! - aggregate: Reduce rows to one number
//! - edit: Convert values to and from editable text
//! - history: Inspect recorded queries and drafts

mod args;
mod commands;
mod config;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{aggregate, build, edit, handle, history, join, run, run_command};
pub use config::Config;
pub use errors::{CliError, CliErrorCode, CliResult, RequestError, RequestResult};
pub use io::{error_response, ok_response, read_request, write_error, write_response};
