//! CLI command implementations
//!
//! Each command is one request/response exchange:
//! 1. Configuration load
//! 2. One JSON request from stdin
//! 3. One JSON response line on stdout
//!
//! Logs go to stderr so stdout carries nothing but the response. Requests that
//! fail are answered with an error line; only configuration and I/O failures
//! end the process with a non-zero status.

use std::path::Path;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::aggregate::{format_aggregate, Aggregation};
use crate::join::resolve_joins;
use crate::observability::{log_event_with_fields, Event, Logger};
use crate::query::{build_queries, ClauseList, QuerySpec};
use crate::session::{discard_draft, load_draft, save_draft, FileDraftStore, MemoryLookup};
use crate::value::wire::{entity_from_wire, entity_to_wire, value_from_wire, value_to_wire};
use crate::value::{from_edit_string, to_edit_string, Entity, ValueType};

use super::args::{Cli, Command};
use super::config::Config;
use super::errors::{CliResult, RequestError, RequestResult};
use super::io::{read_request, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(&cli.config, cli.command)
}

/// Run one command against the configuration at `config_path`
pub fn run_command(config_path: &Path, command: Command) -> CliResult<()> {
    let config = Config::load(config_path)?;

    Logger::set_stderr_only(true);
    Logger::set_min_severity(config.severity()?);
    let path = config_path.display().to_string();
    log_event_with_fields(
        Event::ConfigLoaded,
        &[
            ("command", command.as_str()),
            ("path", path.as_str()),
            ("project_id", config.project_id.as_str()),
        ],
    );

    let request = read_request()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    match runtime.block_on(handle(command, &config, request)) {
        Ok(data) => write_response(data),
        Err(err) => write_error(err.code(), err.message()),
    }
}

/// Serves one decoded request
pub async fn handle(command: Command, config: &Config, request: Value) -> RequestResult<Value> {
    match command {
        Command::Build => build(config, request),
        Command::Join => join(config, request).await,
        Command::Aggregate => aggregate(request),
        Command::Edit => edit(config, request),
        Command::History => history(config, request),
    }
}

/// `build`: `QuerySpec` in, `{"queries": [...]}` out
///
/// With a state file configured, the clauses are kept as the draft of the
/// kind and every built query is recorded in the history.
pub fn build(config: &Config, request: Value) -> RequestResult<Value> {
    let spec: QuerySpec = serde_json::from_value(request)?;
    let store = config.history_path.as_ref().map(FileDraftStore::new);

    if let Some(store) = &store {
        let draft = ClauseList::from(spec.clauses.clone());
        save_draft(store, &spec.kind, &draft)?;
    }

    let queries = build_queries(&spec)?;

    if let Some(store) = &store {
        let history = config.history();
        for query in &queries {
            history.record(store, query)?;
        }
    }

    Ok(json!({ "queries": queries }))
}

#[derive(Debug, Deserialize)]
struct JoinRequest {
    rows: Vec<Value>,
    #[serde(default)]
    fetched: Vec<Value>,
    #[serde(default)]
    properties: String,
}

/// `join`: merges `fetched` into `rows` through the listed key properties
pub async fn join(config: &Config, request: Value) -> RequestResult<Value> {
    let request: JoinRequest = serde_json::from_value(request)?;
    let rows = decode_rows(&request.rows)?;
    let lookup = MemoryLookup::with_rows(config.project_id.as_str(), decode_rows(&request.fetched)?);

    let report = resolve_joins(&lookup, rows, &request.properties, &config.project_id).await?;

    Ok(json!({
        "rows": report.rows.iter().map(entity_to_wire).collect::<Vec<_>>(),
        "requested": report.requested,
        "resolved": report.resolved,
        "unresolved": report.unresolved,
        "lookups": lookup.calls(),
    }))
}

#[derive(Debug, Deserialize)]
struct AggregateRequest {
    rows: Vec<Value>,
    op: String,
    #[serde(default)]
    field: String,
}

/// `aggregate`: `{"value": number|null, "display": ".."}`
pub fn aggregate(request: Value) -> RequestResult<Value> {
    let request: AggregateRequest = serde_json::from_value(request)?;
    let op: Aggregation = request.op.parse()?;
    let rows = decode_rows(&request.rows)?;

    let value = op.evaluate(&rows, &request.field);

    Ok(json!({
        "op": op.as_str(),
        "field": request.field,
        "value": value,
        "display": format_aggregate(value),
    }))
}

#[derive(Debug, Deserialize)]
struct EditRequest {
    #[serde(default)]
    value: Option<Value>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default, rename = "type")]
    value_type: Option<ValueType>,
}

/// `edit`: wire value to editable text, or text plus type back to a wire value
pub fn edit(config: &Config, request: Value) -> RequestResult<Value> {
    let request: EditRequest = serde_json::from_value(request)?;
    let project = config.project_id.as_str();
    let namespace = config.namespace();

    match request {
        EditRequest {
            value: Some(wire), ..
        } => {
            let value = value_from_wire(&wire)?;
            Ok(json!({
                "text": to_edit_string(&value, project, namespace),
                "type": value.value_type().as_str(),
            }))
        }
        EditRequest {
            text: Some(text),
            value_type: Some(value_type),
            ..
        } => {
            let value = from_edit_string(&text, value_type, project, namespace)?;
            Ok(json!({
                "value": value_to_wire(&value),
                "type": value_type.as_str(),
            }))
        }
        _ => Err(RequestError::invalid_request(
            "expected either 'value' or both 'text' and 'type'",
        )),
    }
}

#[derive(Debug, Default, Deserialize)]
struct HistoryRequest {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    clear: bool,
}

/// `history`: recorded queries, plus the clause draft of `kind` when given
pub fn history(config: &Config, request: Value) -> RequestResult<Value> {
    let request: HistoryRequest = serde_json::from_value(request)?;
    let path = config.history_path.as_ref().ok_or_else(|| {
        RequestError::new("DSQ_CLI_HISTORY_DISABLED", "history_path is not configured")
    })?;
    let store = FileDraftStore::new(path);
    let history = config.history();

    if request.clear {
        history.clear(&store)?;
        if let Some(kind) = &request.kind {
            discard_draft(&store, kind)?;
        }
    }

    let draft = match &request.kind {
        Some(kind) => load_draft(&store, kind)?,
        None => None,
    };

    Ok(json!({
        "queries": history.load(&store)?,
        "draft": draft,
    }))
}

fn decode_rows(rows: &[Value]) -> RequestResult<Vec<Entity>> {
    rows.iter()
        .map(|row| entity_from_wire(row).map_err(RequestError::from))
        .collect()
}
