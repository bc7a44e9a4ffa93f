//! Fixed-length slot encoding
//!
//! Slot format: one JSON object per line, `": "` after keys and `", "`
//! between pairs, every value padded to its field's budget, `\n` last.
//!
//! ```text
//! {"title": "Old Man and the Sea ", "year": "1952", "id": "0         "}\n
//! ```

use std::fmt;
use std::io;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::ser::Formatter;

use super::normalize::normalize_value;
use crate::errors::{FlatDbError, FlatDbResult};
use crate::schema::{Record, Schema};

/// serde_json formatter writing `": "` and `", "` separators.
struct SlotFormatter;

impl Formatter for SlotFormatter {
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Normalized pairs ready to be written as one object
struct SlotBody<'a> {
    pairs: Vec<(&'a str, String)>,
}

impl Serialize for SlotBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pairs.len()))?;
        for (k, v) in &self.pairs {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Decoded key/value pairs in slot order, duplicates kept.
struct SlotPairs(Vec<(String, String)>);

impl<'de> Deserialize<'de> for SlotPairs {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = SlotPairs;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object of string values")
            }

            fn visit_map<A>(self, mut map: A) -> Result<SlotPairs, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, String>()? {
                    pairs.push(entry);
                }
                Ok(SlotPairs(pairs))
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

/// Encode a record into exactly `schema.record_length()` bytes.
///
/// # Errors
///
/// - `SchemaViolation` if the record's fields do not match the schema
/// - `LayoutMismatch` if the encoded length differs from the record length
pub fn encode(schema: &Schema, record: &Record) -> FlatDbResult<Vec<u8>> {
    if record.len() != schema.fields().len() {
        return Err(FlatDbError::schema_violation(format!(
            "Record has {} fields, schema defines {}",
            record.len(),
            schema.fields().len()
        )));
    }

    let mut pairs = Vec::with_capacity(record.len());
    for (field, (name, value)) in schema.fields().iter().zip(record.iter()) {
        if field.name() != name {
            return Err(FlatDbError::schema_violation(format!(
                "Field {} is not defined in the model",
                name
            )));
        }
        pairs.push((field.name(), normalize_value(value, field.length())));
    }

    let mut buf = Vec::with_capacity(schema.record_length());
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SlotFormatter);
    SlotBody { pairs }
        .serialize(&mut serializer)
        .map_err(|e| FlatDbError::schema_violation(format!("Failed to encode record: {}", e)))?;
    buf.push(b'\n');

    if buf.len() != schema.record_length() {
        return Err(FlatDbError::LayoutMismatch(format!(
            "encoded record is {} bytes, record length is {}",
            buf.len(),
            schema.record_length()
        )));
    }

    Ok(buf)
}

/// Validate caller fields against the schema and encode them.
pub fn encode_fields<I, K, V>(schema: &Schema, fields: I) -> FlatDbResult<Vec<u8>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    let record = Record::from_fields(schema, fields)?;
    encode(schema, &record)
}

/// The tombstone written over deleted slots
pub fn encode_blank(schema: &Schema) -> FlatDbResult<Vec<u8>> {
    encode(schema, &Record::blank(schema))
}

/// Decode slot bytes into a record with padding trimmed from every value.
///
/// A slot of only whitespace decodes to `None`. Tombstones decode to a
/// blank record; telling the two apart is left to the caller.
///
/// # Errors
///
/// Returns `CorruptRecord` if the bytes are not UTF-8, not a JSON object of
/// strings, or do not carry exactly the schema's fields.
pub fn decode(schema: &Schema, bytes: &[u8]) -> FlatDbResult<Option<Record>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| FlatDbError::corrupt(format!("invalid UTF-8: {}", e)))?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let SlotPairs(pairs) = serde_json::from_str(trimmed)
        .map_err(|e| FlatDbError::corrupt(format!("invalid record structure: {}", e)))?;

    Record::from_decoded(schema, pairs).map(Some)
}
