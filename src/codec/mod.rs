//! Record codec for flatdb
//!
//! Converts records to and from fixed-length slot bytes.
//!
//! # Invariants
//!
//! - Every encoding is exactly `Schema::record_length()` bytes
//! - Exactly one `\n`, at the end of the slot
//! - Encoding is a pure function of (schema, record)
//! - Truncation never splits a UTF-8 sequence

mod normalize;
mod slot;

pub use normalize::{escaped_len, normalize_value, truncate_utf8};
pub use slot::{decode, encode, encode_blank, encode_fields};
