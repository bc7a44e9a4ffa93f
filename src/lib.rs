//! flatdb - a fixed-length flat-file record store
//!
//! Records live at fixed byte offsets (`id * record_length`) in a single
//! data file. Selected fields feed an in-memory inverted word index that
//! is rebuilt on open and answers ranked keyword queries.
//!
//! ```ignore
//! use flatdb::{FieldSpec, FlatDb};
//!
//! let mut db = FlatDb::create("library.fdb", vec![
//!     FieldSpec::new("title").with_length(100).indexed(),
//!     FieldSpec::new("year").with_length(4).indexed(),
//! ])?;
//! let id = db.set([("title", "Old Man and the Sea"), ("year", "1952")])?;
//! let hits = db.filter("title", "old sea")?;
//! ```

pub mod cli;
pub mod codec;
pub mod config;
mod db;
pub mod errors;
pub mod index;
pub mod observability;
pub mod query;
pub mod schema;
pub mod storage;

pub use config::StoreConfig;
pub use db::FlatDb;
pub use errors::{FlatDbError, FlatDbResult};
pub use schema::{FieldSpec, Record, Schema};
