//! Error types for flatdb
//!
//! Error codes:
//! - FLATDB_SCHEMA_VIOLATION (REJECT)
//! - FLATDB_RECORD_NOT_FOUND (REJECT)
//! - FLATDB_FIELD_NOT_INDEXED (REJECT)
//! - FLATDB_INVALID_CONFIG (REJECT)
//! - FLATDB_IO_ERROR (ERROR)
//! - FLATDB_CORRUPT_RECORD (FATAL for targeted reads, skipped by scans)
//! - FLATDB_LAYOUT_MISMATCH (FATAL)

use std::fmt;
use std::io;

use thiserror::Error;

/// Severity levels for flatdb errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller request rejected, store state untouched
    Reject,
    /// Operation failed, store remains usable
    Error,
    /// On-disk state cannot be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

fn slot_suffix(slot: &Option<u64>) -> String {
    match slot {
        Some(id) => format!(" (slot: {})", id),
        None => String::new(),
    }
}

/// Errors raised by schema construction, encoding, storage and index lookups.
#[derive(Debug, Error)]
pub enum FlatDbError {
    /// A record or field specification does not fit the schema
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// Operation on an id that holds no live record
    #[error("Record with id {0} does not exist")]
    RecordNotFound(u64),

    /// Lookup on a field that has no inverted index
    #[error("Field {0} is not indexed")]
    FieldNotIndexed(String),

    /// Slot bytes are not a valid encoded record
    #[error("Corrupt record: {reason}{}", slot_suffix(.slot))]
    CorruptRecord {
        /// Slot id, when known
        slot: Option<u64>,
        /// What failed to parse
        reason: String,
    },

    /// File size, newline count or encoded length disagrees with the record length
    #[error("Layout mismatch: {0}")]
    LayoutMismatch(String),

    /// Configuration could not be read or is invalid
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Underlying file I/O failure
    #[error("{context}: {source}")]
    Io {
        /// What was being attempted
        context: String,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl FlatDbError {
    /// Create a schema violation error
    pub fn schema_violation(message: impl Into<String>) -> Self {
        Self::SchemaViolation(message.into())
    }

    /// Create a corrupt record error without slot context
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            slot: None,
            reason: reason.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Attach a slot id to a corrupt record error; other errors pass through.
    pub fn at_slot(self, id: u64) -> Self {
        match self {
            Self::CorruptRecord { reason, .. } => Self::CorruptRecord {
                slot: Some(id),
                reason,
            },
            other => other,
        }
    }

    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            Self::SchemaViolation(_) => "FLATDB_SCHEMA_VIOLATION",
            Self::RecordNotFound(_) => "FLATDB_RECORD_NOT_FOUND",
            Self::FieldNotIndexed(_) => "FLATDB_FIELD_NOT_INDEXED",
            Self::CorruptRecord { .. } => "FLATDB_CORRUPT_RECORD",
            Self::LayoutMismatch(_) => "FLATDB_LAYOUT_MISMATCH",
            Self::Config(_) => "FLATDB_INVALID_CONFIG",
            Self::Io { .. } => "FLATDB_IO_ERROR",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            Self::SchemaViolation(_)
            | Self::RecordNotFound(_)
            | Self::FieldNotIndexed(_)
            | Self::Config(_) => Severity::Reject,
            Self::Io { .. } => Severity::Error,
            Self::CorruptRecord { .. } | Self::LayoutMismatch(_) => Severity::Fatal,
        }
    }

    /// Returns whether this is a per-slot decode failure
    pub fn is_corrupt_record(&self) -> bool {
        matches!(self, Self::CorruptRecord { .. })
    }
}

/// Result type for flatdb operations
pub type FlatDbResult<T> = Result<T, FlatDbError>;
