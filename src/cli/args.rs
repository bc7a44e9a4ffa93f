//! CLI argument definitions using clap
//!
//! Commands:
//! - flatdb init
//! - flatdb schema
//! - flatdb set <json>
//! - flatdb get <id>
//! - flatdb update <id> <json>
//! - flatdb delete <id>
//! - flatdb all
//! - flatdb filter <field> <query>
//!
//! A `<json>` argument of `-` is read from stdin.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// flatdb - fixed-length flat-file record store
#[derive(Parser, Debug)]
#[command(name = "flatdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "./flatdb.json")]
    pub config: PathBuf,

    /// Log every operation to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the data file if missing and report its layout
    Init,

    /// Print the field layout and record length
    Schema,

    /// Append a record given as a JSON object
    Set {
        /// JSON object of field values, or `-` for stdin
        record: String,
    },

    /// Read one record by id
    Get {
        /// Record id
        id: u64,
    },

    /// Overwrite fields of an existing record
    Update {
        /// Record id
        id: u64,
        /// JSON object of field values, or `-` for stdin
        fields: String,
    },

    /// Delete a record by id
    Delete {
        /// Record id
        id: u64,
    },

    /// List every live record
    All,

    /// Keyword search over an indexed field
    Filter {
        /// Indexed field name
        field: String,
        /// Whitespace-separated query words
        query: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
