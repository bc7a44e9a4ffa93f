//! Per-field inverted word index
//!
//! For every indexed field: lowercase word -> ids containing it, in
//! ascending id order. An id appears at most once per word.
//!
//! Keeping postings sorted makes the live index identical to one rebuilt
//! from the data file, whatever order the updates came in.
//!
//! Every change to a record goes through `remove(id, old)` followed by
//! `add(id, new)`; the index is never patched from a diff.

use std::collections::HashMap;

use super::tokenizer::tokenize;
use crate::errors::{FlatDbError, FlatDbResult};
use crate::schema::{Record, Schema};

/// Postings for one indexed field
#[derive(Debug, Clone, Default)]
struct FieldIndex {
    field: String,
    words: HashMap<String, Vec<u64>>,
}

/// Inverted index over a schema's indexed fields.
#[derive(Debug, Clone)]
pub struct InvertedIndex {
    fields: Vec<FieldIndex>,
}

impl InvertedIndex {
    /// Empty index for the schema's indexed fields.
    pub fn new(schema: &Schema) -> Self {
        Self {
            fields: schema
                .indexed_fields()
                .map(|f| FieldIndex {
                    field: f.name().to_string(),
                    words: HashMap::new(),
                })
                .collect(),
        }
    }

    /// Drop every posting, keeping the set of indexed fields.
    pub fn clear(&mut self) {
        for field in &mut self.fields {
            field.words.clear();
        }
    }

    /// Clear, then add every record yielded by `records`.
    ///
    /// Returns the number of records indexed. Stops at the first error.
    pub fn rebuild<I>(&mut self, records: I) -> FlatDbResult<usize>
    where
        I: IntoIterator<Item = FlatDbResult<(u64, Record)>>,
    {
        self.clear();
        let mut indexed = 0;
        for entry in records {
            let (id, record) = entry?;
            self.add(id, &record);
            indexed += 1;
        }
        Ok(indexed)
    }

    /// Add `id` under every word of every indexed field of `record`.
    pub fn add(&mut self, id: u64, record: &Record) {
        for field in &mut self.fields {
            let value = match record.get(&field.field) {
                Some(v) => v,
                None => continue,
            };
            for word in tokenize(value) {
                let ids = field.words.entry(word).or_default();
                if let Err(pos) = ids.binary_search(&id) {
                    ids.insert(pos, id);
                }
            }
        }
    }

    /// Remove `id` from every word of every indexed field of `record`.
    pub fn remove(&mut self, id: u64, record: &Record) {
        for field in &mut self.fields {
            let value = match record.get(&field.field) {
                Some(v) => v,
                None => continue,
            };
            for word in tokenize(value) {
                if let Some(ids) = field.words.get_mut(&word) {
                    if let Ok(pos) = ids.binary_search(&id) {
                        ids.remove(pos);
                    }
                    if ids.is_empty() {
                        field.words.remove(&word);
                    }
                }
            }
        }
    }

    /// Whether `field` is indexed
    pub fn is_indexed(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }

    /// Names of the indexed fields in schema order
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.as_str())
    }

    /// Ids recorded for `word` in `field`, ascending.
    ///
    /// # Errors
    ///
    /// `FieldNotIndexed` if `field` has no index.
    pub fn lookup(&self, field: &str, word: &str) -> FlatDbResult<&[u64]> {
        let words = self.words(field)?;
        Ok(words.get(word).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Number of distinct words indexed for `field`.
    pub fn word_count(&self, field: &str) -> FlatDbResult<usize> {
        Ok(self.words(field)?.len())
    }

    fn words(&self, field: &str) -> FlatDbResult<&HashMap<String, Vec<u64>>> {
        self.fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| &f.words)
            .ok_or_else(|| FlatDbError::FieldNotIndexed(field.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSpec;

    fn schema() -> Schema {
        Schema::build(vec![
            FieldSpec::new("title").with_length(40).indexed(),
            FieldSpec::new("year").with_length(4).indexed(),
            FieldSpec::new("status").with_length(1),
        ])
        .unwrap()
    }

    fn book(schema: &Schema, title: &str, year: &str) -> Record {
        Record::from_fields(schema, [("title", title), ("year", year)]).unwrap()
    }

    #[test]
    fn test_only_indexed_fields() {
        let schema = schema();
        let index = InvertedIndex::new(&schema);
        assert!(index.is_indexed("title"));
        assert!(index.is_indexed("year"));
        assert!(!index.is_indexed("status"));
        assert!(!index.is_indexed("id"));
        assert_eq!(index.fields().collect::<Vec<_>>(), vec!["title", "year"]);
    }

    #[test]
    fn test_add_lowercases_words() {
        let schema = schema();
        let mut index = InvertedIndex::new(&schema);
        index.add(0, &book(&schema, "Old Man and the Sea", "1952"));

        assert_eq!(index.lookup("title", "old").unwrap(), &[0]);
        assert_eq!(index.lookup("title", "sea").unwrap(), &[0]);
        assert_eq!(index.lookup("year", "1952").unwrap(), &[0]);
        assert!(index.lookup("title", "Old").unwrap().is_empty());
    }

    #[test]
    fn test_repeated_word_adds_id_once() {
        let schema = schema();
        let mut index = InvertedIndex::new(&schema);
        index.add(3, &book(&schema, "the sea the Sea THE", "1952"));

        assert_eq!(index.lookup("title", "the").unwrap(), &[3]);
        assert_eq!(index.lookup("title", "sea").unwrap(), &[3]);
    }

    #[test]
    fn test_ids_kept_in_ascending_order() {
        let schema = schema();
        let mut index = InvertedIndex::new(&schema);
        index.add(2, &book(&schema, "sea", ""));
        index.add(0, &book(&schema, "sea", ""));
        index.add(1, &book(&schema, "sea", ""));
        index.add(1, &book(&schema, "sea", ""));
        assert_eq!(index.lookup("title", "sea").unwrap(), &[0, 1, 2]);
    }

    #[test]
    fn test_remove_then_add_keeps_position() {
        let schema = schema();
        let mut index = InvertedIndex::new(&schema);
        let a = book(&schema, "sea", "");
        index.add(0, &a);
        index.add(1, &a);

        index.remove(0, &a);
        index.add(0, &a);
        assert_eq!(index.lookup("title", "sea").unwrap(), &[0, 1]);
    }

    #[test]
    fn test_remove_drops_empty_words() {
        let schema = schema();
        let mut index = InvertedIndex::new(&schema);
        let record = book(&schema, "Old Man", "1952");
        index.add(0, &record);
        assert_eq!(index.word_count("title").unwrap(), 2);

        index.remove(0, &record);
        assert_eq!(index.word_count("title").unwrap(), 0);
        assert_eq!(index.word_count("year").unwrap(), 0);
    }

    #[test]
    fn test_lookup_on_unindexed_field_fails() {
        let index = InvertedIndex::new(&schema());
        let err = index.lookup("status", "1").unwrap_err();
        assert_eq!(err.code(), "FLATDB_FIELD_NOT_INDEXED");
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let schema = schema();
        let mut index = InvertedIndex::new(&schema);
        index.add(9, &book(&schema, "stale", ""));

        let records = vec![
            Ok((0, book(&schema, "Emma", "1815"))),
            Ok((2, book(&schema, "Persuasion", "1817"))),
        ];
        assert_eq!(index.rebuild(records).unwrap(), 2);
        assert!(index.lookup("title", "stale").unwrap().is_empty());
        assert_eq!(index.lookup("title", "persuasion").unwrap(), &[2]);
    }
}
