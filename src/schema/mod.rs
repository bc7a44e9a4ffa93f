//! Schema subsystem for flatdb
//!
//! The schema fixes the field order, per-field byte budgets and the
//! aggregate record length for the lifetime of a store.
//!
//! # Design Principles
//!
//! - Built once, immutable afterwards
//! - `id` is implicit, always last, 10 bytes, never indexed
//! - Records outside the schema's field set cannot be constructed

mod record;
mod types;

pub use record::Record;
pub use types::{Field, FieldSpec, Schema, DEFAULT_FIELD_LENGTH, ID_FIELD, ID_FIELD_LENGTH};
