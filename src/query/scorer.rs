use std::collections::HashMap;

use crate::errors::FlatDbResult;
use crate::index::{tokenize, InvertedIndex};

/// A candidate id and the number of query words that matched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoredId {
    /// Record id
    pub id: u64,
    /// Matched query words
    pub score: usize,
}

/// Rank ids in `field` against `query`.
///
/// Query words are not deduplicated: repeating a word counts it again.
///
/// # Errors
///
/// `FieldNotIndexed` if `field` has no index. Checked before anything else,
/// so an empty query on an unindexed field still fails.
pub fn rank(index: &InvertedIndex, field: &str, query: &str) -> FlatDbResult<Vec<ScoredId>> {
    index.word_count(field)?;

    let mut ranked: Vec<ScoredId> = Vec::new();
    let mut positions: HashMap<u64, usize> = HashMap::new();

    for word in tokenize(query) {
        for &id in index.lookup(field, &word)? {
            match positions.get(&id) {
                Some(&pos) => ranked[pos].score += 1,
                None => {
                    positions.insert(id, ranked.len());
                    ranked.push(ScoredId { id, score: 1 });
                }
            }
        }
    }

    // Stable: ties keep first-discovery order
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    Ok(ranked)
}
