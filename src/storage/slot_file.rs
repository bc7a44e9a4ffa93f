//! Fixed-offset slot file
//!
//! Slot `id` occupies bytes `[id * record_length, (id + 1) * record_length)`.
//! The slot count is derived from the file size and is also the id handed
//! to the next append.
//!
//! Layout invariant, checked at open and on every count:
//! - file size is a multiple of the record length
//! - the file holds exactly one `\n` per slot
//! - every slot ends with `\n`

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::errors::{FlatDbError, FlatDbResult};

/// Raw byte access to fixed-length slots.
///
/// Owns the file handle for its whole lifetime. Reads go through `&File`
/// so they only need a shared borrow; writes need `&mut self`.
pub struct SlotFile {
    /// Path to the data file
    path: PathBuf,
    /// Underlying file handle, opened read + write
    file: File,
    /// Bytes per slot
    record_length: u64,
    /// Call `sync_data` after every write
    sync_writes: bool,
}

impl SlotFile {
    /// Opens the data file, creating it (and missing parent directories) if
    /// it does not exist.
    ///
    /// # Errors
    ///
    /// - `Io` if the file cannot be created or opened
    /// - `LayoutMismatch` if existing content is not a whole number of
    ///   newline-terminated slots
    pub fn open(path: &Path, record_length: usize, sync_writes: bool) -> FlatDbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    FlatDbError::io(
                        format!("Failed to create data directory: {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                FlatDbError::io(format!("Failed to open data file: {}", path.display()), e)
            })?;

        let slot_file = Self {
            path: path.to_path_buf(),
            file,
            record_length: record_length as u64,
            sync_writes,
        };
        slot_file.verify_layout()?;

        Ok(slot_file)
    }

    /// Returns the path to the data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the fixed slot length in bytes.
    pub fn record_length(&self) -> u64 {
        self.record_length
    }

    /// Number of slots in the file, live and tombstoned.
    pub fn slot_count(&self) -> FlatDbResult<u64> {
        let len = self
            .file
            .metadata()
            .map_err(|e| FlatDbError::io("Failed to read file metadata", e))?
            .len();

        if len % self.record_length != 0 {
            return Err(FlatDbError::LayoutMismatch(format!(
                "file size {} is not a multiple of record length {}",
                len, self.record_length
            )));
        }

        Ok(len / self.record_length)
    }

    /// Check that the newline count agrees with the size-derived slot count.
    pub fn verify_layout(&self) -> FlatDbResult<u64> {
        let slots = self.slot_count()?;
        let lines = self.count_lines()?;
        if lines != slots {
            return Err(FlatDbError::LayoutMismatch(format!(
                "{} lines in a file sized for {} slots",
                lines, slots
            )));
        }
        Ok(slots)
    }

    fn count_lines(&self) -> FlatDbResult<u64> {
        let mut file = &self.file;
        file.seek(SeekFrom::Start(0))
            .map_err(|e| FlatDbError::io("Failed to seek to start of data file", e))?;

        let mut reader = BufReader::new(file);
        let mut lines = 0u64;
        loop {
            let buf = reader
                .fill_buf()
                .map_err(|e| FlatDbError::io("Failed to scan data file", e))?;
            if buf.is_empty() {
                break;
            }
            lines += buf.iter().filter(|b| **b == b'\n').count() as u64;
            let consumed = buf.len();
            reader.consume(consumed);
        }
        Ok(lines)
    }

    /// Reads slot `id`.
    ///
    /// Returns `Ok(None)` if `id` is at or beyond the slot count.
    ///
    /// # Errors
    ///
    /// `CorruptRecord` if the slot does not end with a newline.
    pub fn read_slot(&self, id: u64) -> FlatDbResult<Option<Vec<u8>>> {
        if id >= self.slot_count()? {
            return Ok(None);
        }

        let offset = id * self.record_length;
        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset)).map_err(|e| {
            FlatDbError::io(format!("Failed to seek to offset {}", offset), e)
        })?;

        let mut buf = vec![0u8; self.record_length as usize];
        file.read_exact(&mut buf)
            .map_err(|e| FlatDbError::io(format!("Failed to read slot {}", id), e))?;

        if buf.last() != Some(&b'\n') {
            return Err(FlatDbError::corrupt("slot does not end with a newline").at_slot(id));
        }

        Ok(Some(buf))
    }

    /// Appends a slot at the end of the file and returns its id.
    pub fn append_slot(&mut self, bytes: &[u8]) -> FlatDbResult<u64> {
        self.check_slot_bytes(bytes)?;
        let id = self.slot_count()?;
        self.write_at(id, bytes)?;
        Ok(id)
    }

    /// Overwrites an existing slot in place.
    ///
    /// # Errors
    ///
    /// `RecordNotFound` if the slot has never been allocated.
    pub fn write_slot(&mut self, id: u64, bytes: &[u8]) -> FlatDbResult<()> {
        self.check_slot_bytes(bytes)?;
        if id >= self.slot_count()? {
            return Err(FlatDbError::RecordNotFound(id));
        }
        self.write_at(id, bytes)
    }

    fn write_at(&mut self, id: u64, bytes: &[u8]) -> FlatDbResult<()> {
        let offset = id * self.record_length;
        self.file.seek(SeekFrom::Start(offset)).map_err(|e| {
            FlatDbError::io(format!("Failed to seek to offset {}", offset), e)
        })?;

        self.file
            .write_all(bytes)
            .map_err(|e| FlatDbError::io(format!("Failed to write slot {}", id), e))?;

        if self.sync_writes {
            self.file
                .sync_data()
                .map_err(|e| FlatDbError::io(format!("fsync failed after writing slot {}", id), e))?;
        }

        Ok(())
    }

    /// Slot bytes must be exactly one record length with a single trailing
    /// newline, or every later offset shifts.
    fn check_slot_bytes(&self, bytes: &[u8]) -> FlatDbResult<()> {
        if bytes.len() as u64 != self.record_length {
            return Err(FlatDbError::LayoutMismatch(format!(
                "slot write of {} bytes, record length is {}",
                bytes.len(),
                self.record_length
            )));
        }
        let newlines = bytes.iter().filter(|b| **b == b'\n').count();
        if newlines != 1 || bytes.last() != Some(&b'\n') {
            return Err(FlatDbError::LayoutMismatch(
                "slot must end with its only newline".into(),
            ));
        }
        Ok(())
    }
}
