//! CLI module for flatdb
//!
//! Provides command-line access to a single store described by a JSON
//! configuration file. Every command prints one JSON response on stdout;
//! logs go to stderr.

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{parse_fields, read_json_arg, write_error, write_response};
