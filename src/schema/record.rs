//! Records validated against a schema
//!
//! A `Record` always holds exactly the schema's fields, in schema order.
//! Building one is the only place unknown field names are rejected.

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::types::{Schema, ID_FIELD};
use crate::errors::{FlatDbError, FlatDbResult};

/// Field name to string value, restricted to a schema's field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    entries: Vec<(String, String)>,
}

impl Record {
    /// Build a record from caller fields, filling omitted fields with their
    /// defaults (or the empty string).
    ///
    /// # Errors
    ///
    /// Returns `SchemaViolation` if any field is not defined in the schema.
    pub fn from_fields<I, K, V>(schema: &Schema, fields: I) -> FlatDbResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut record = Self::with_defaults(schema);
        for (name, value) in validate_fields(schema, fields)? {
            record.entries[name].1 = value;
        }
        Ok(record)
    }

    /// All schema fields set to their defaults
    pub fn with_defaults(schema: &Schema) -> Self {
        Self {
            entries: schema
                .fields()
                .iter()
                .map(|f| (f.name().to_string(), f.default_value().to_string()))
                .collect(),
        }
    }

    /// All schema fields set to the empty string, defaults ignored.
    ///
    /// This is the tombstone written over deleted slots.
    pub fn blank(schema: &Schema) -> Self {
        Self {
            entries: schema
                .fields()
                .iter()
                .map(|f| (f.name().to_string(), String::new()))
                .collect(),
        }
    }

    /// Rebuild a record from decoded key/value pairs.
    ///
    /// Every schema field must be present exactly once and nothing else may
    /// appear; values are trimmed of their padding.
    pub(crate) fn from_decoded<I>(schema: &Schema, pairs: I) -> FlatDbResult<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut slots: Vec<Option<String>> = vec![None; schema.fields().len()];

        for (name, value) in pairs {
            let pos = schema
                .position(&name)
                .ok_or_else(|| FlatDbError::corrupt(format!("unexpected field {}", name)))?;
            if slots[pos].is_some() {
                return Err(FlatDbError::corrupt(format!("field {} appears twice", name)));
            }
            slots[pos] = Some(value.trim().to_string());
        }

        let entries = schema
            .fields()
            .iter()
            .zip(slots)
            .map(|(field, value)| {
                value
                    .map(|v| (field.name().to_string(), v))
                    .ok_or_else(|| FlatDbError::corrupt(format!("missing field {}", field.name())))
            })
            .collect::<FlatDbResult<Vec<_>>>()?;

        Ok(Self { entries })
    }

    /// Overwrite the given fields, leaving the rest untouched.
    ///
    /// An `id` key is ignored; ids never change after assignment. All names
    /// are validated before anything is modified.
    pub fn merge<I, K, V>(&mut self, schema: &Schema, fields: I) -> FlatDbResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let id_pos = schema.position(ID_FIELD);
        for (pos, value) in validate_fields(schema, fields)? {
            if Some(pos) != id_pos {
                self.entries[pos].1 = value;
            }
        }
        Ok(())
    }

    /// Value of a field
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Parsed value of the `id` field
    pub fn id(&self) -> Option<u64> {
        self.get(ID_FIELD).and_then(|v| v.trim().parse().ok())
    }

    pub(crate) fn set_id(&mut self, id: u64) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| k == ID_FIELD) {
            entry.1 = id.to_string();
        }
    }

    /// Field/value pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields, `id` included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether every value is empty, i.e. the record is a tombstone
    pub fn is_blank(&self) -> bool {
        self.entries.iter().all(|(_, v)| v.is_empty())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Resolve names to schema positions, rejecting the whole batch on the
/// first unknown name.
fn validate_fields<I, K, V>(schema: &Schema, fields: I) -> FlatDbResult<Vec<(usize, String)>>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Into<String>,
{
    fields
        .into_iter()
        .map(|(name, value)| {
            let name = name.as_ref();
            schema
                .position(name)
                .map(|pos| (pos, value.into()))
                .ok_or_else(|| {
                    FlatDbError::schema_violation(format!(
                        "Field {} is not defined in the model",
                        name
                    ))
                })
        })
        .collect()
}
