//! Observability for flatdb
//!
//! Structured JSON logging only. Logging is read-only: it never changes
//! the outcome of an operation and never fails one.
//!
//! # Usage
//!
//! ```ignore
//! use flatdb::observability::{Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! Logger::info("STORE_OPENED", &[("path", "books.fdb")]);
//! ```

mod logger;

pub use logger::{Logger, Severity};
