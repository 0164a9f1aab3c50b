//! JSON I/O handling for CLI
//!
//! - Input: one JSON object on one stdin line
//! - Output: one JSON object on one stdout line
//! - UTF-8 only

use std::io::{self, BufRead, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Read a JSON request from stdin
pub fn read_request() -> CliResult<Value> {
    let stdin = io::stdin();
    parse_request(stdin.lock())
}

fn parse_request<R: BufRead>(mut reader: R) -> CliResult<Value> {
    let mut line = String::new();
    reader.read_line(&mut line)?;

    if line.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }

    let value: Value = serde_json::from_str(&line)?;
    Ok(value)
}

/// Success envelope
pub fn ok_response(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

/// Error envelope
pub fn error_response(code: &str, message: &str) -> Value {
    json!({
        "status": "error",
        "code": code,
        "message": message
    })
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&ok_response(data))
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    write_line(&error_response(code, message))
}

fn write_line(response: &Value) -> CliResult<()> {
    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_line() {
        let input = b"{\"kind\":\"Person\"}\n{\"ignored\":true}\n";
        let value = parse_request(&input[..]).unwrap();
        assert_eq!(value, json!({"kind": "Person"}));
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = parse_request(&b"\n"[..]).unwrap_err();
        assert_eq!(err.code_str(), "DSQ_CLI_IO_ERROR");
    }

    #[test]
    fn test_envelopes() {
        assert_eq!(ok_response(json!(1))["status"], "ok");
        let err = error_response("DSQ_QUERY_INVALID", "age: not an integer");
        assert_eq!(err["code"], "DSQ_QUERY_INVALID");
        assert_eq!(err["message"], "age: not an integer");
    }
}
