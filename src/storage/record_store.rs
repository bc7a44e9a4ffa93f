//! Typed record storage on top of the slot file
//!
//! Slot states:
//! - Live: decodes to a record with at least one non-empty value
//! - Tombstoned: decodes to a blank record (or is all whitespace)
//!
//! Tombstoned slots read back as absent, exactly like ids never written.

use std::path::Path;

use super::slot_file::SlotFile;
use crate::codec;
use crate::errors::{FlatDbError, FlatDbResult};
use crate::observability::Logger;
use crate::schema::{Record, Schema};

/// Schema-aware store of fixed-length records.
pub struct RecordStore {
    schema: Schema,
    slots: SlotFile,
}

impl RecordStore {
    /// Opens or creates the data file for `schema`.
    pub fn open(path: &Path, schema: Schema, sync_writes: bool) -> FlatDbResult<Self> {
        let slots = SlotFile::open(path, schema.record_length(), sync_writes)?;
        Ok(Self { schema, slots })
    }

    /// The store's schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Path to the data file
    pub fn path(&self) -> &Path {
        self.slots.path()
    }

    /// Id the next append will receive; also the number of slots.
    pub fn next_id(&self) -> FlatDbResult<u64> {
        self.slots.slot_count()
    }

    /// Assigns the next id to `record`, encodes it and appends it.
    pub fn append(&mut self, record: &mut Record) -> FlatDbResult<u64> {
        let id = self.next_id()?;
        record.set_id(id);
        let bytes = codec::encode(&self.schema, record)?;
        let written = self.slots.append_slot(&bytes)?;
        debug_assert_eq!(written, id);
        Ok(written)
    }

    /// Reads the record in slot `id`.
    ///
    /// Returns `Ok(None)` for tombstones, blank slots and ids past the end.
    ///
    /// # Errors
    ///
    /// `CorruptRecord` (with the slot id) if the slot cannot be decoded.
    pub fn read(&self, id: u64) -> FlatDbResult<Option<Record>> {
        let bytes = match self.slots.read_slot(id)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };

        let record = codec::decode(&self.schema, &bytes).map_err(|e| e.at_slot(id))?;
        Ok(record.filter(|r| !r.is_blank()))
    }

    /// Rewrites slot `id` with the full encoding of `record`.
    ///
    /// The record must already carry `id`.
    pub fn overwrite(&mut self, id: u64, record: &Record) -> FlatDbResult<()> {
        if record.id() != Some(id) {
            return Err(FlatDbError::schema_violation(format!(
                "Record id {:?} does not match slot {}",
                record.get(crate::schema::ID_FIELD),
                id
            )));
        }
        let bytes = codec::encode(&self.schema, record)?;
        self.slots.write_slot(id, &bytes)
    }

    /// Overwrites slot `id` with the tombstone encoding.
    pub fn blank(&mut self, id: u64) -> FlatDbResult<()> {
        let bytes = codec::encode_blank(&self.schema)?;
        self.slots.write_slot(id, &bytes)
    }

    /// Lazily scans every slot present right now.
    ///
    /// Absent slots are skipped. Corrupt slots are logged and skipped; only
    /// I/O errors are yielded. Each call starts again from slot 0.
    pub fn scan_all(&self) -> FlatDbResult<ScanAll<'_>> {
        let end = self.next_id()?;
        Ok(ScanAll {
            store: self,
            next: 0,
            end,
        })
    }
}

/// Iterator over live `(id, record)` pairs, bounded by the slot count at
/// creation time.
pub struct ScanAll<'a> {
    store: &'a RecordStore,
    next: u64,
    end: u64,
}

impl Iterator for ScanAll<'_> {
    type Item = FlatDbResult<(u64, Record)>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.end {
            let id = self.next;
            self.next += 1;

            match self.store.read(id) {
                Ok(Some(record)) => return Some(Ok((id, record))),
                Ok(None) => continue,
                Err(e) if e.is_corrupt_record() => {
                    Logger::warn(
                        "SLOT_SKIPPED_CORRUPT",
                        &[("id", &id.to_string()), ("reason", &e.to_string())],
                    );
                    continue;
                }
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some((self.end - self.next) as usize))
    }
}
