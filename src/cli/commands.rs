//! CLI command implementations
//!
//! Each invocation loads the configuration, opens the store (which
//! rebuilds the index), runs one command and prints one JSON response.

use serde_json::{json, Value};

use crate::config::StoreConfig;
use crate::db::FlatDb;
use crate::observability::{Logger, Severity};
use crate::schema::Record;

use super::args::{Cli, Command};
use super::errors::CliResult;
use super::io::{parse_fields, read_json_arg, write_response};

/// Main CLI entry point
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();

    if cli.verbose {
        Logger::set_min_severity(Severity::Trace);
    }

    let config = StoreConfig::load(&cli.config)?;
    let mut db = FlatDb::open_with_config(&config)?;

    let data = run_command(&mut db, cli.command)?;
    write_response(data)
}

/// Execute one command against an open store and return its response data
pub fn run_command(db: &mut FlatDb, command: Command) -> CliResult<Value> {
    match command {
        Command::Init => Ok(json!({
            "path": db.path().display().to_string(),
            "record_length": db.schema().record_length(),
            "next_id": db.next_id()?,
            "records": db.count()?,
        })),
        Command::Schema => Ok(describe_schema(db)),
        Command::Set { record } => {
            let fields = parse_fields(read_json_arg(&record)?)?;
            let id = db.set(fields)?;
            Ok(json!({ "id": id }))
        }
        Command::Get { id } => match db.get(id)? {
            Some(record) => record_value(&record),
            None => Ok(Value::Null),
        },
        Command::Update { id, fields } => {
            let fields = parse_fields(read_json_arg(&fields)?)?;
            let record = db.update(id, fields)?;
            record_value(&record)
        }
        Command::Delete { id } => {
            db.delete(id)?;
            Ok(json!({ "id": id }))
        }
        Command::All => records_value(&db.all()?),
        Command::Filter { field, query } => records_value(&db.filter(&field, &query)?),
    }
}

fn describe_schema(db: &FlatDb) -> Value {
    let fields: Vec<Value> = db
        .schema()
        .fields()
        .iter()
        .map(|f| {
            json!({
                "name": f.name(),
                "length": f.length(),
                "default": f.default_value(),
                "index": f.is_indexed(),
            })
        })
        .collect();

    json!({
        "fields": fields,
        "record_length": db.schema().record_length(),
    })
}

fn record_value(record: &Record) -> CliResult<Value> {
    Ok(serde_json::to_value(record)?)
}

fn records_value(records: &[Record]) -> CliResult<Value> {
    Ok(serde_json::to_value(records)?)
}
