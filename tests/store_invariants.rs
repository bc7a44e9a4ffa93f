//! Store Invariant Tests
//!
//! Tests for:
//! - Fixed length: every slot is exactly the schema's record length
//! - Offset addressing: record `n` lives at `n * record_length`
//! - Tombstoning: deletes blank a slot but never free its id
//! - Corruption: scans skip bad slots, targeted reads report them
//! - Layout: files that do not fit the record length are refused

use flatdb::codec;
use flatdb::{FieldSpec, FlatDb, Schema};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn book_specs() -> Vec<FieldSpec> {
    vec![
        FieldSpec::new("title").with_length(100).indexed(),
        FieldSpec::new("author").with_length(25).indexed(),
        FieldSpec::new("year").with_length(4).indexed(),
        FieldSpec::new("status").with_length(1).with_default("1"),
    ]
}

fn data_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("library.fdb")
}

fn open(path: &Path) -> FlatDb {
    FlatDb::create(path, book_specs()).expect("Failed to open store")
}

fn seed(db: &mut FlatDb) {
    db.set([
        ("title", "Приключения Тома Сойера"),
        ("author", "Марк Твен"),
        ("year", "1876"),
    ])
    .unwrap();
    db.set([
        ("title", "Adventures of Tom Sawyer"),
        ("author", "Mark Twain"),
        ("year", "1876"),
    ])
    .unwrap();
    db.set([
        ("title", "Приключения Незнайки"),
        ("author", "Николай Носов"),
        ("year", "1953"),
    ])
    .unwrap();
}

// =============================================================================
// Fixed Length
// =============================================================================

/// File size is always slot count times record length.
#[test]
fn test_file_size_is_whole_slots() {
    let temp_dir = TempDir::new().unwrap();
    let path = data_path(&temp_dir);
    let mut db = open(&path);
    seed(&mut db);
    db.update(1, [("title", "x".repeat(500))]).unwrap();
    db.delete(0).unwrap();

    let record_length = db.schema().record_length() as u64;
    assert_eq!(fs::metadata(&path).unwrap().len(), 3 * record_length);

    let contents = fs::read(&path).unwrap();
    for slot in contents.chunks(record_length as usize) {
        assert_eq!(slot.last(), Some(&b'\n'));
        assert_eq!(slot.iter().filter(|b| **b == b'\n').count(), 1);
    }
}

/// Oversized values are cut on a character boundary, never split.
#[test]
fn test_oversized_values_truncate_on_char_boundary() {
    let temp_dir = TempDir::new().unwrap();
    let mut db = open(&data_path(&temp_dir));

    // 13 two-byte characters = 26 bytes against a 25-byte budget
    let author = "ЖЖЖЖЖЖЖЖЖЖЖЖЖ";
    let id = db.set([("title", "t"), ("author", author)]).unwrap();

    let stored = db.get(id).unwrap().unwrap();
    assert_eq!(stored.get("author"), Some("ЖЖЖЖЖЖЖЖЖЖЖЖ"));
    assert_eq!(stored.get("author"), Some(codec::truncate_utf8(author, 25)));
}

/// Every encoding has the schema's length, whatever the values.
#[test]
fn test_encode_length_matches_schema() {
    let schema = Schema::build(book_specs()).unwrap();
    let samples = ["", "short", "\"quoted\" \\ path", "emoji 🦀 text", "ctrl\u{7}char"];
    for title in samples {
        for author in samples {
            let bytes =
                codec::encode_fields(&schema, [("title", title), ("author", author)]).unwrap();
            assert_eq!(bytes.len(), schema.record_length());
        }
    }
}

// =============================================================================
// Offset Addressing
// =============================================================================

/// After n sets, get(n-1) is the last record and get(n) is absent.
#[test]
fn test_offset_addressing() {
    let temp_dir = TempDir::new().unwrap();
    let mut db = open(&data_path(&temp_dir));

    for n in 0..5u64 {
        let id = db.set([("title", format!("book {}", n))]).unwrap();
        assert_eq!(id, n);
    }

    let last = db.get(4).unwrap().unwrap();
    assert_eq!(last.get("title"), Some("book 4"));
    assert_eq!(last.id(), Some(4));
    assert!(db.get(5).unwrap().is_none());
    assert!(db.get(u64::MAX).unwrap().is_none());
}

/// Records come back with defaults filled in.
#[test]
fn test_defaults_applied() {
    let temp_dir = TempDir::new().unwrap();
    let mut db = open(&data_path(&temp_dir));
    let id = db.set([("title", "Emma")]).unwrap();

    let record = db.get(id).unwrap().unwrap();
    assert_eq!(record.get("status"), Some("1"));
    assert_eq!(record.get("author"), Some(""));
}

// =============================================================================
// Tombstoning
// =============================================================================

/// Delete leaves the id allocated and other records untouched.
#[test]
fn test_delete_is_tombstoning() {
    let temp_dir = TempDir::new().unwrap();
    let mut db = open(&data_path(&temp_dir));
    seed(&mut db);

    let before_2 = db.get(2).unwrap();
    db.delete(1).unwrap();

    assert!(db.get(1).unwrap().is_none());
    assert_eq!(db.next_id().unwrap(), 3);
    assert_eq!(db.get(2).unwrap(), before_2);
    assert_eq!(db.all().unwrap().len(), 2);

    // Next set does not reuse the freed id
    assert_eq!(db.set([("title", "new")]).unwrap(), 3);
}

/// Tombstones survive a reopen.
#[test]
fn test_tombstone_persists() {
    let temp_dir = TempDir::new().unwrap();
    let path = data_path(&temp_dir);
    {
        let mut db = open(&path);
        seed(&mut db);
        db.delete(0).unwrap();
    }

    let db = open(&path);
    assert!(db.get(0).unwrap().is_none());
    assert_eq!(db.next_id().unwrap(), 3);
    assert_eq!(db.count().unwrap(), 2);
}

// =============================================================================
// Corruption
// =============================================================================

/// A garbled slot is skipped by scans and the index rebuild, but reported
/// by a direct read.
#[test]
fn test_corrupt_slot_skipped_by_scans() {
    let temp_dir = TempDir::new().unwrap();
    let path = data_path(&temp_dir);
    let record_length;
    {
        let mut db = open(&path);
        seed(&mut db);
        record_length = db.schema().record_length();
    }

    let mut contents = fs::read(&path).unwrap();
    contents[record_length + 1] = b'!';
    fs::write(&path, contents).unwrap();

    let db = open(&path);
    let titles: Vec<String> = db
        .all()
        .unwrap()
        .iter()
        .map(|r| r.get("title").unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Приключения Тома Сойера", "Приключения Незнайки"]);

    assert!(db.filter("author", "twain").unwrap().is_empty());
    assert_eq!(db.filter("author", "носов").unwrap().len(), 1);

    let err = db.get(1).unwrap_err();
    assert_eq!(err.code(), "FLATDB_CORRUPT_RECORD");
}

// =============================================================================
// Layout
// =============================================================================

/// Reopening with a schema of a different record length is refused.
#[test]
fn test_reopen_with_different_layout_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = data_path(&temp_dir);
    {
        let mut db = open(&path);
        seed(&mut db);
    }

    let result = FlatDb::create(&path, vec![FieldSpec::new("title").with_length(7)]);
    let err = result.err().expect("layout mismatch must fail");
    assert_eq!(err.code(), "FLATDB_LAYOUT_MISMATCH");
}

/// A torn trailing write is detected at open.
#[test]
fn test_partial_slot_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = data_path(&temp_dir);
    {
        let mut db = open(&path);
        seed(&mut db);
    }

    let mut contents = fs::read(&path).unwrap();
    contents.extend_from_slice(b"{\"title\": ");
    fs::write(&path, contents).unwrap();

    assert!(FlatDb::create(&path, book_specs()).is_err());
}
