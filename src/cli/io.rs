//! JSON I/O handling for CLI
//!
//! - Input: a JSON object of field values, inline or via stdin
//! - Output: one JSON object per invocation on stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Resolve a JSON argument; `-` reads the whole of stdin.
pub fn read_json_arg(arg: &str) -> CliResult<Value> {
    let text = if arg == "-" {
        let mut buf = String::new();
        io::stdin().lock().read_to_string(&mut buf)?;
        buf
    } else {
        arg.to_string()
    };

    if text.trim().is_empty() {
        return Err(CliError::invalid_input("Empty input"));
    }

    Ok(serde_json::from_str(&text)?)
}

/// Convert a JSON object into field/value pairs.
///
/// Strings pass through; numbers and booleans are written as text; `null`
/// becomes the empty string. Nested values are rejected.
pub fn parse_fields(value: Value) -> CliResult<Vec<(String, String)>> {
    let object = match value {
        Value::Object(map) => map,
        other => {
            return Err(CliError::invalid_input(format!(
                "Expected a JSON object of fields, got {}",
                other
            )))
        }
    };

    object
        .into_iter()
        .map(|(field, value)| {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                nested => {
                    return Err(CliError::invalid_input(format!(
                        "Field {} must be a scalar, got {}",
                        field, nested
                    )))
                }
            };
            Ok((field, text))
        })
        .collect()
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}

/// Write an error response to stdout
pub fn write_error(code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    let mut stdout = io::stdout();
    serde_json::to_writer(&mut stdout, &response)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
