//! Keyword query scoring
//!
//! A query is tokenized like indexed text. Each query word found in the
//! field's index adds one point to every id listed under it. Ids are
//! ranked by descending score; equal scores keep the order in which ids
//! were first met.

mod scorer;

pub use scorer::{rank, ScoredId};
