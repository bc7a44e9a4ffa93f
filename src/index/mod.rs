//! Inverted word index for flatdb
//!
//! Indexes are derived, in-memory-only state rebuilt from storage on open.
//!
//! # Design Principles
//!
//! - Derived state: the data file is the source of truth
//! - Updates occur after storage writes
//! - Symmetric maintenance: remove old record, then add new record

mod inverted;
mod tokenizer;

pub use inverted::InvertedIndex;
pub use tokenizer::tokenize;
