//! Database handle: record storage plus its inverted index
//!
//! `FlatDb` owns both halves. Every mutating operation takes `&mut self`, so
//! a storage write and the index update that follows it can never
//! interleave with another operation.

use std::path::Path;

use crate::config::StoreConfig;
use crate::errors::{FlatDbError, FlatDbResult};
use crate::index::InvertedIndex;
use crate::observability::Logger;
use crate::query;
use crate::schema::{FieldSpec, Record, Schema};
use crate::storage::{RecordStore, ScanAll};

/// A flat-file record store with keyword search over indexed fields.
pub struct FlatDb {
    store: RecordStore,
    index: InvertedIndex,
}

impl FlatDb {
    /// Opens the data file at `path`, creating it if missing, and rebuilds
    /// the index from its contents.
    ///
    /// # Errors
    ///
    /// - `SchemaViolation` if the field specifications are invalid
    /// - `LayoutMismatch` if an existing file does not fit the schema's
    ///   record length
    pub fn create<I>(path: impl AsRef<Path>, specs: I) -> FlatDbResult<Self>
    where
        I: IntoIterator<Item = FieldSpec>,
    {
        let schema = Schema::build(specs)?;
        Self::open(path.as_ref(), schema, true)
    }

    /// Opens the store described by a configuration.
    pub fn open_with_config(config: &StoreConfig) -> FlatDbResult<Self> {
        let schema = config.validate()?;
        Self::open(&config.path, schema, config.sync_writes)
    }

    /// Opens the data file at `path` with an already built schema.
    pub fn open(path: &Path, schema: Schema, sync_writes: bool) -> FlatDbResult<Self> {
        let existed = path.exists();
        let store = RecordStore::open(path, schema, sync_writes)?;
        let index = InvertedIndex::new(store.schema());

        let mut db = Self { store, index };
        let indexed = db.rebuild_index()?;

        let path_str = path.display().to_string();
        let event = if existed { "STORE_OPENED" } else { "STORE_CREATED" };
        Logger::info(
            event,
            &[
                ("path", &path_str),
                ("record_length", &db.schema().record_length().to_string()),
                ("records", &indexed.to_string()),
            ],
        );

        Ok(db)
    }

    /// The store's schema
    pub fn schema(&self) -> &Schema {
        self.store.schema()
    }

    /// Path to the data file
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// The inverted index, read-only
    pub fn index(&self) -> &InvertedIndex {
        &self.index
    }

    /// Id the next `set` will receive. Counts tombstoned slots too.
    pub fn next_id(&self) -> FlatDbResult<u64> {
        self.store.next_id()
    }

    /// Number of live records.
    pub fn count(&self) -> FlatDbResult<usize> {
        let mut live = 0;
        for entry in self.scan()? {
            entry?;
            live += 1;
        }
        Ok(live)
    }

    /// Appends a new record and returns its id.
    ///
    /// Omitted fields take their defaults. A caller-supplied `id` is
    /// replaced by the assigned one.
    ///
    /// # Errors
    ///
    /// `SchemaViolation` if a field is not defined in the schema.
    pub fn set<I, K, V>(&mut self, fields: I) -> FlatDbResult<u64>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Record::from_fields(self.schema(), fields)?;
        let id = self.store.append(&mut record)?;
        self.index.add(id, &record);

        Logger::trace("RECORD_APPENDED", &[("id", &id.to_string())]);
        Ok(id)
    }

    /// Reads record `id`; `None` if it was deleted or never written.
    ///
    /// # Errors
    ///
    /// `CorruptRecord` if the slot cannot be decoded.
    pub fn get(&self, id: u64) -> FlatDbResult<Option<Record>> {
        self.store.read(id)
    }

    /// Overwrites the given fields of record `id` and returns the result.
    ///
    /// An `id` key in `fields` is ignored.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if `id` holds no live record
    /// - `SchemaViolation` if a field is not defined; nothing is changed
    pub fn update<I, K, V>(&mut self, id: u64, fields: I) -> FlatDbResult<Record>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let old = self
            .store
            .read(id)?
            .ok_or(FlatDbError::RecordNotFound(id))?;

        let mut new = old.clone();
        new.merge(self.schema(), fields)?;

        self.index.remove(id, &old);
        if let Err(e) = self.store.overwrite(id, &new) {
            self.index.add(id, &old);
            Logger::error(
                "RECORD_UPDATE_FAILED",
                &[("code", e.code()), ("id", &id.to_string())],
            );
            return Err(e);
        }
        self.index.add(id, &new);

        Logger::trace("RECORD_UPDATED", &[("id", &id.to_string())]);
        Ok(new)
    }

    /// Tombstones record `id`. The id is never reused.
    ///
    /// # Errors
    ///
    /// `RecordNotFound` if `id` holds no live record.
    pub fn delete(&mut self, id: u64) -> FlatDbResult<()> {
        let old = self
            .store
            .read(id)?
            .ok_or(FlatDbError::RecordNotFound(id))?;

        self.store.blank(id)?;
        self.index.remove(id, &old);

        Logger::trace("RECORD_DELETED", &[("id", &id.to_string())]);
        Ok(())
    }

    /// Lazily iterates live `(id, record)` pairs, skipping corrupt slots.
    pub fn scan(&self) -> FlatDbResult<ScanAll<'_>> {
        self.store.scan_all()
    }

    /// All live records in id order, skipping corrupt slots.
    pub fn all(&self) -> FlatDbResult<Vec<Record>> {
        self.scan()?
            .map(|entry| entry.map(|(_, record)| record))
            .collect()
    }

    /// Records whose `field` contains words of `query`, best matches first.
    ///
    /// # Errors
    ///
    /// `FieldNotIndexed` if `field` has no index; no file access happens.
    pub fn filter(&self, field: &str, query: &str) -> FlatDbResult<Vec<Record>> {
        let ranked = query::rank(&self.index, field, query)?;

        let mut results = Vec::with_capacity(ranked.len());
        for candidate in &ranked {
            if let Some(record) = self.store.read(candidate.id)? {
                results.push(record);
            }
        }

        Logger::trace(
            "FILTER_EXECUTED",
            &[
                ("candidates", &ranked.len().to_string()),
                ("field", field),
                ("results", &results.len().to_string()),
            ],
        );
        Ok(results)
    }

    /// Discards the index and rebuilds it from the data file.
    ///
    /// Returns the number of live records indexed.
    pub fn rebuild_index(&mut self) -> FlatDbResult<usize> {
        let scan = self.store.scan_all()?;
        let indexed = self.index.rebuild(scan)?;
        Logger::info("INDEX_REBUILT", &[("records", &indexed.to_string())]);
        Ok(indexed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn specs() -> Vec<FieldSpec> {
        vec![
            FieldSpec::new("title").with_length(20).indexed(),
            FieldSpec::new("year").with_length(4).indexed(),
        ]
    }

    fn titles(records: &[Record]) -> Vec<&str> {
        records.iter().filter_map(|r| r.get("title")).collect()
    }

    #[test]
    fn test_scenario_set_filter_update_delete() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = FlatDb::create(temp_dir.path().join("books.fdb"), specs()).unwrap();

        let id = db
            .set([("title", "Old Man and the Sea"), ("year", "1952")])
            .unwrap();
        assert_eq!(id, 0);

        let found = db.filter("title", "old sea").unwrap();
        assert_eq!(titles(&found), vec!["Old Man and the Sea"]);

        db.update(0, [("title", "The Sea")]).unwrap();
        assert!(db.filter("title", "old").unwrap().is_empty());
        assert_eq!(titles(&db.filter("title", "sea").unwrap()), vec!["The Sea"]);
        assert_eq!(db.get(0).unwrap().unwrap().get("year"), Some("1952"));

        db.delete(0).unwrap();
        assert!(db.get(0).unwrap().is_none());
        assert!(db.filter("title", "sea").unwrap().is_empty());
    }

    #[test]
    fn test_update_and_delete_missing_record() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = FlatDb::create(temp_dir.path().join("books.fdb"), specs()).unwrap();

        assert_eq!(
            db.update(5, [("title", "x")]).unwrap_err().code(),
            "FLATDB_RECORD_NOT_FOUND"
        );
        assert_eq!(db.delete(0).unwrap_err().code(), "FLATDB_RECORD_NOT_FOUND");

        db.set([("title", "Emma")]).unwrap();
        db.delete(0).unwrap();
        assert!(matches!(db.delete(0), Err(FlatDbError::RecordNotFound(0))));
        assert!(db.update(0, [("title", "x")]).is_err());
    }

    #[test]
    fn test_update_with_unknown_field_changes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = FlatDb::create(temp_dir.path().join("books.fdb"), specs()).unwrap();
        db.set([("title", "Emma"), ("year", "1815")]).unwrap();

        let err = db
            .update(0, [("title", "Dune"), ("author", "Herbert")])
            .unwrap_err();
        assert_eq!(err.code(), "FLATDB_SCHEMA_VIOLATION");

        assert_eq!(db.get(0).unwrap().unwrap().get("title"), Some("Emma"));
        assert_eq!(titles(&db.filter("title", "emma").unwrap()), vec!["Emma"]);
        assert!(db.filter("title", "dune").unwrap().is_empty());
    }

    #[test]
    fn test_failed_update_write_restores_postings() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("books.fdb");
        {
            let mut db = FlatDb::create(&path, specs()).unwrap();
            db.set([("title", "Emma"), ("year", "1815")]).unwrap();
        }

        // Slot 0 claims id 7, so the rewrite is refused after the old
        // postings have been removed
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::write(&path, contents.replace("\"id\": \"0", "\"id\": \"7")).unwrap();

        let mut db = FlatDb::create(&path, specs()).unwrap();
        assert_eq!(db.index().lookup("title", "emma").unwrap(), &[0]);

        let err = db.update(0, [("title", "Dune")]).unwrap_err();
        assert_eq!(err.code(), "FLATDB_SCHEMA_VIOLATION");

        assert_eq!(db.index().lookup("title", "emma").unwrap(), &[0]);
        assert_eq!(db.index().lookup("year", "1815").unwrap(), &[0]);
        assert!(db.index().lookup("title", "dune").unwrap().is_empty());
        assert_eq!(db.get(0).unwrap().unwrap().get("title"), Some("Emma"));
    }

    #[test]
    fn test_set_overrides_caller_id() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = FlatDb::create(temp_dir.path().join("books.fdb"), specs()).unwrap();
        let id = db.set([("title", "Emma"), ("id", "77")]).unwrap();
        assert_eq!(id, 0);
        assert_eq!(db.get(0).unwrap().unwrap().id(), Some(0));
    }

    #[test]
    fn test_filter_unindexed_field() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = FlatDb::create(
            temp_dir.path().join("books.fdb"),
            vec![
                FieldSpec::new("title").with_length(20).indexed(),
                FieldSpec::new("status").with_length(1).with_default("1"),
            ],
        )
        .unwrap();
        db.set([("title", "Emma")]).unwrap();

        assert_eq!(
            db.filter("status", "1").unwrap_err().code(),
            "FLATDB_FIELD_NOT_INDEXED"
        );
        assert!(db.filter("id", "0").is_err());
    }

    #[test]
    fn test_count_and_next_id_diverge_after_delete() {
        let temp_dir = TempDir::new().unwrap();
        let mut db = FlatDb::create(temp_dir.path().join("books.fdb"), specs()).unwrap();
        for title in ["a", "b", "c"] {
            db.set([("title", title)]).unwrap();
        }
        db.delete(1).unwrap();

        assert_eq!(db.next_id().unwrap(), 3);
        assert_eq!(db.count().unwrap(), 2);
        assert_eq!(titles(&db.all().unwrap()), vec!["a", "c"]);
        assert_eq!(db.set([("title", "d")]).unwrap(), 3);
    }
}
