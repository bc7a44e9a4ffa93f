//! Record storage subsystem for flatdb
//!
//! A single data file of fixed-length slots; slot `id` lives at byte
//! offset `id * record_length`.
//!
//! # Design Principles
//!
//! - Appends allocate ids; ids are never reused
//! - Updates and deletes rewrite a whole slot in place
//! - Deletes leave a tombstone; the file never shrinks
//! - Scans skip corrupt slots, targeted reads report them
//!
//! # Invariants Enforced
//!
//! - Every slot is exactly `record_length` bytes with one trailing `\n`
//! - Slot count from file size equals the newline count

mod record_store;
mod slot_file;

pub use record_store::{RecordStore, ScanAll};
pub use slot_file::SlotFile;
